//! Error taxonomy of the registry client.

use crate::chain::RpcFailure;
use crate::contract::ContractKind;
use alloy::primitives::Address;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, RegistryError>;

/// Failures of the wallet connection lifecycle.
#[derive(Debug, Error)]
pub enum ConnectionError {
	/// No wallet could be detected.
	#[error("No wallet detected")]
	NoWallet,
	/// A write was attempted without a connected signer.
	#[error("Wallet is not connected")]
	NotConnected,
	/// The wallet refused to switch to the configured chain.
	#[error("Chain switch rejected: {0}")]
	ChainSwitchRejected(RpcFailure),
	/// The wallet refused to register the configured chain.
	#[error("Adding chain rejected: {0}")]
	AddChainRejected(RpcFailure),
	/// The wallet could not hand out a signer.
	#[error("Signer unavailable: {0}")]
	SignerUnavailable(RpcFailure),
}

/// Reasons a submitted transaction did not succeed.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransactionError {
	#[error("Transaction rejected by user")]
	UserRejected,
	#[error("Transaction rejected: {}", .0.as_deref().unwrap_or("reverted without reason"))]
	Reverted(Option<String>),
	#[error("Transaction error: {0}")]
	Unknown(String),
}

/// Top-level error of the registry client.
#[derive(Debug, Error)]
pub enum RegistryError {
	#[error("Configuration error: {0}")]
	Configuration(String),

	#[error(transparent)]
	Connection(#[from] ConnectionError),

	#[error("Contract at {address} does not implement the {expected} interface")]
	Verification {
		address: Address,
		expected: ContractKind,
	},

	#[error("No verified contract found at {0}")]
	NotFound(Address),

	#[error(transparent)]
	Transaction(#[from] TransactionError),

	#[error("Call to {function} failed: {failure}")]
	Call {
		function: &'static str,
		failure: RpcFailure,
	},

	#[error("Failed to decode {function} result: {message}")]
	Decode {
		function: &'static str,
		message: String,
	},
}

impl RegistryError {
	pub fn call(function: &'static str, failure: RpcFailure) -> Self {
		RegistryError::Call { function, failure }
	}

	pub fn decode(function: &'static str, err: impl std::fmt::Display) -> Self {
		RegistryError::Decode {
			function,
			message: err.to_string(),
		}
	}
}
