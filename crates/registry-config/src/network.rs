//! Named network environments.
//!
//! Resolving an environment is a pure lookup: no I/O happens here.

use crate::ConfigError;
use serde::{Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// One of the three supported environments.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Network {
	Mainnet,
	Testnet,
	Fakenet,
}

impl Network {
	pub fn as_str(&self) -> &'static str {
		match self {
			Network::Mainnet => "mainnet",
			Network::Testnet => "testnet",
			Network::Fakenet => "fakenet",
		}
	}

	pub fn chain_id(&self) -> u64 {
		match self {
			Network::Mainnet => 0xfa,
			Network::Testnet => 0xfa2,
			Network::Fakenet => 0xfa3,
		}
	}

	pub fn default_rpc_url(&self) -> &'static str {
		match self {
			Network::Mainnet => "https://rpc.ankr.com/fantom",
			Network::Testnet => "https://rpc.ankr.com/fantom_testnet",
			Network::Fakenet => "http://localhost:18545",
		}
	}

	/// Endpoint serving `trace_filter`, if the environment has one.
	pub fn tracer_url(&self) -> Option<&'static str> {
		match self {
			Network::Mainnet => Some("https://rpcapi-tracing.fantom.network/"),
			Network::Testnet => Some("https://rpcapi-tracing.testnet.fantom.network/"),
			Network::Fakenet => None,
		}
	}
}

impl FromStr for Network {
	type Err = ConfigError;

	fn from_str(s: &str) -> Result<Self, Self::Err> {
		match s.trim().to_ascii_lowercase().as_str() {
			"mainnet" => Ok(Network::Mainnet),
			"testnet" => Ok(Network::Testnet),
			"fakenet" => Ok(Network::Fakenet),
			_ => Err(ConfigError::UnknownNetwork(s.to_string())),
		}
	}
}

impl fmt::Display for Network {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// The chain the client talks to, fixed at startup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NetworkEndpoint {
	pub network: Network,
	pub chain_id: u64,
	pub rpc_url: String,
}

impl NetworkEndpoint {
	pub fn for_network(network: Network) -> Self {
		Self {
			network,
			chain_id: network.chain_id(),
			rpc_url: network.default_rpc_url().to_string(),
		}
	}

	/// Replaces the RPC URL; the chain id stays bound to the network.
	pub fn with_rpc_url(mut self, rpc_url: impl Into<String>) -> Self {
		self.rpc_url = rpc_url.into();
		self
	}

	/// Chain definition handed to a wallet that does not know the chain yet.
	pub fn chain_definition(&self) -> ChainDefinition {
		ChainDefinition {
			chain_id: self.chain_id,
			rpc_urls: vec![self.rpc_url.clone()],
			chain_name: format!("Fantom {}", self.network),
			native_currency: NativeCurrency {
				name: "FTM".to_string(),
				symbol: "FTM".to_string(),
				decimals: 18,
			},
			block_explorer_urls: None,
		}
	}
}

/// Parameters of a `wallet_addEthereumChain` request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ChainDefinition {
	#[serde(serialize_with = "serialize_hex_chain_id")]
	pub chain_id: u64,
	pub rpc_urls: Vec<String>,
	pub chain_name: String,
	pub native_currency: NativeCurrency,
	pub block_explorer_urls: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NativeCurrency {
	pub name: String,
	pub symbol: String,
	pub decimals: u8,
}

/// Formats a chain id the way wallets expect it: `0x` + lowercase hex.
pub fn hex_chain_id(chain_id: u64) -> String {
	format!("0x{:x}", chain_id)
}

fn serialize_hex_chain_id<S: Serializer>(chain_id: &u64, serializer: S) -> Result<S::Ok, S::Error> {
	serializer.serialize_str(&hex_chain_id(*chain_id))
}
