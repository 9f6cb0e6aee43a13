//! Configuration file types.

use crate::network::{Network, NetworkEndpoint};
use crate::ConfigError;
use alloy::primitives::Address;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;

/// Complete client configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct RegistryConfig {
	/// Environment name: `mainnet`, `testnet` or `fakenet`.
	pub network: String,
	/// Canonical organisation factory.
	pub factory_address: Address,
	/// Replaces the environment's default RPC endpoint.
	#[serde(default)]
	pub rpc_url: Option<String>,
	#[serde(default = "default_log_level")]
	pub log_level: String,
	/// Interval between receipt polls while waiting for confirmation.
	#[serde(default = "default_confirmation_poll_secs")]
	pub confirmation_poll_secs: u64,
	/// Wallet to detect on connect. Without one, connecting is a no-op.
	#[serde(default)]
	pub wallet: Option<WalletConfig>,
	#[serde(default)]
	pub tracer: TracerSettings,
}

impl RegistryConfig {
	pub fn network(&self) -> Result<Network, ConfigError> {
		self.network.parse()
	}

	pub fn endpoint(&self) -> Result<NetworkEndpoint, ConfigError> {
		let endpoint = NetworkEndpoint::for_network(self.network()?);
		Ok(match &self.rpc_url {
			Some(url) => endpoint.with_rpc_url(url.clone()),
			None => endpoint,
		})
	}

	pub fn confirmation_poll_interval(&self) -> Duration {
		Duration::from_secs(self.confirmation_poll_secs)
	}
}

/// Wallet backing the signer.
#[derive(Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum WalletConfig {
	/// A private key held by this process.
	Local { private_key: String },
	/// An external wallet exposing an EIP-1193 style JSON-RPC endpoint.
	Rpc { url: String },
}

impl fmt::Debug for WalletConfig {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			WalletConfig::Local { .. } => f
				.debug_struct("Local")
				.field("private_key", &"<redacted>")
				.finish(),
			WalletConfig::Rpc { url } => f.debug_struct("Rpc").field("url", url).finish(),
		}
	}
}

#[derive(Debug, Clone, Deserialize)]
pub struct TracerSettings {
	/// Number of blocks to look back when listing incoming transactions.
	#[serde(default = "default_tracer_blocks")]
	pub blocks: u64,
}

impl Default for TracerSettings {
	fn default() -> Self {
		Self {
			blocks: default_tracer_blocks(),
		}
	}
}

fn default_log_level() -> String {
	"info".to_string()
}

fn default_confirmation_poll_secs() -> u64 {
	2
}

fn default_tracer_blocks() -> u64 {
	10_000
}
