//! Chain access seams.
//!
//! Reads and writes against the ledger go through these traits so that the
//! resolver, search and executor never depend on a concrete transport.
//! Node and wallet failures are reduced to [`RpcFailure`] at this boundary.

use alloy::primitives::{Address, Bytes, TxHash};
use alloy::transports::{RpcError, TransportError};
use async_trait::async_trait;
use std::fmt;
use std::sync::Arc;

/// Failure reported by a node or wallet, reduced to its JSON-RPC parts.
///
/// `code` is `None` when the failure never reached the remote side
/// (connection refused, malformed response and the like).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RpcFailure {
	/// JSON-RPC or EIP-1193 error code.
	pub code: Option<i64>,
	/// Human readable message as reported by the remote side.
	pub message: String,
	/// Raw error data, typically ABI-encoded revert data.
	pub data: Option<Bytes>,
}

impl RpcFailure {
	/// Creates a failure carrying a remote error code.
	pub fn new(code: i64, message: impl Into<String>) -> Self {
		Self {
			code: Some(code),
			message: message.into(),
			data: None,
		}
	}

	/// Creates a failure that never produced a remote error code.
	pub fn transport(message: impl Into<String>) -> Self {
		Self {
			code: None,
			message: message.into(),
			data: None,
		}
	}

	/// Attaches raw error data.
	pub fn with_data(mut self, data: impl Into<Bytes>) -> Self {
		self.data = Some(data.into());
		self
	}

	/// Returns true if the failure carries exactly this code.
	pub fn is_code(&self, code: i64) -> bool {
		self.code == Some(code)
	}
}

impl fmt::Display for RpcFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self.code {
			Some(code) => write!(f, "{} (code {})", self.message, code),
			None => write!(f, "{}", self.message),
		}
	}
}

impl std::error::Error for RpcFailure {}

impl From<TransportError> for RpcFailure {
	fn from(err: TransportError) -> Self {
		match err {
			RpcError::ErrorResp(payload) => Self {
				code: Some(payload.code),
				data: payload.as_revert_data(),
				message: payload.message.to_string(),
			},
			other => Self::transport(other.to_string()),
		}
	}
}

/// A state-changing contract call, ready to be signed and broadcast.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContractCall {
	/// Target contract.
	pub to: Address,
	/// ABI-encoded calldata, selector included.
	pub input: Bytes,
	/// Name of the invoked contract function, for logs.
	pub function: &'static str,
}

impl ContractCall {
	pub fn new(to: Address, input: impl Into<Bytes>, function: &'static str) -> Self {
		Self {
			to,
			input: input.into(),
			function,
		}
	}
}

/// Receipt of a mined transaction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransactionReceipt {
	/// The hash of the transaction.
	pub hash: TxHash,
	/// The block number where the transaction was included.
	pub block_number: u64,
	/// Whether the transaction executed successfully.
	pub success: bool,
}

/// Read access to the ledger.
#[async_trait]
pub trait ChainReader: Send + Sync {
	/// Returns the deployed bytecode at `address`, empty for accounts without code.
	async fn get_code(&self, address: Address) -> Result<Bytes, RpcFailure>;

	/// Executes a read-only call and returns the raw return data.
	async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, RpcFailure>;

	/// Returns the latest block number.
	async fn block_number(&self) -> Result<u64, RpcFailure>;
}

/// Write access to the ledger through an account controlled by a wallet.
#[async_trait]
pub trait ChainSigner: Send + Sync {
	/// Address of the signing account.
	fn address(&self) -> Address;

	/// Read access routed through the same connection as the signer.
	fn reader(&self) -> Arc<dyn ChainReader>;

	/// Signs and broadcasts the call, returning the transaction hash.
	async fn send_transaction(&self, call: &ContractCall) -> Result<TxHash, RpcFailure>;

	/// Waits until the transaction is mined and returns its receipt.
	///
	/// There is no upper bound on the wait; callers own timeout policy.
	async fn wait_for_confirmation(&self, hash: TxHash) -> Result<TransactionReceipt, RpcFailure>;
}
