//! Local private key wallet.
//!
//! Behaves like a browser wallet from the client's point of view: it only
//! knows the chains that were added to it, answers a switch to an unknown
//! chain with the "unrecognized chain" code, and signs with a key held in
//! this process.

use crate::implementations::evm::{parse_url, AlloySigner};
use crate::{AccountError, WalletInterface, CHAIN_DISCONNECTED, UNRECOGNIZED_CHAIN};
use alloy::network::EthereumWallet;
use alloy::providers::{Provider, ProviderBuilder};
use alloy::signers::local::PrivateKeySigner;
use alloy::signers::Signer;
use async_trait::async_trait;
use registry_config::{hex_chain_id, ChainDefinition};
use registry_types::{ChainSigner, RpcFailure};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;

/// Local wallet implementation using Alloy's signer.
pub struct LocalWallet {
	/// The underlying Alloy signer that handles cryptographic operations.
	signer: PrivateKeySigner,
	/// Chains added to the wallet, by chain id, with their RPC URL.
	chains: RwLock<HashMap<u64, String>>,
	/// Chain selected by the last successful switch.
	active_chain: RwLock<Option<u64>>,
	poll_interval: Duration,
}

impl LocalWallet {
	/// Creates a new LocalWallet from a hex-encoded private key.
	///
	/// The private key should be provided as a hex string (with or without 0x prefix).
	pub fn new(private_key_hex: &str, poll_interval: Duration) -> Result<Self, AccountError> {
		let signer = private_key_hex
			.parse::<PrivateKeySigner>()
			.map_err(|e| AccountError::InvalidKey(format!("Invalid private key: {}", e)))?;

		Ok(Self {
			signer,
			chains: RwLock::new(HashMap::new()),
			active_chain: RwLock::new(None),
			poll_interval,
		})
	}

	/// Pre-registers a chain, as if it had been added earlier.
	pub async fn with_chain(self, chain_id: u64, rpc_url: impl Into<String>) -> Self {
		self.chains.write().await.insert(chain_id, rpc_url.into());
		self
	}
}

#[async_trait]
impl WalletInterface for LocalWallet {
	fn name(&self) -> &str {
		"local"
	}

	async fn switch_chain(&self, chain_id: u64) -> Result<(), RpcFailure> {
		if !self.chains.read().await.contains_key(&chain_id) {
			return Err(RpcFailure::new(
				UNRECOGNIZED_CHAIN,
				format!("Unrecognized chain ID \"{}\"", hex_chain_id(chain_id)),
			));
		}

		*self.active_chain.write().await = Some(chain_id);
		Ok(())
	}

	async fn add_chain(&self, chain: &ChainDefinition) -> Result<(), RpcFailure> {
		let rpc_url = chain
			.rpc_urls
			.first()
			.ok_or_else(|| RpcFailure::new(-32602, "rpcUrls must contain at least one URL"))?;

		parse_url(rpc_url).map_err(|e| RpcFailure::new(-32602, e.to_string()))?;

		tracing::debug!(chain = %chain.chain_name, "Adding chain to local wallet");
		self.chains
			.write()
			.await
			.insert(chain.chain_id, rpc_url.clone());
		Ok(())
	}

	async fn signer(&self) -> Result<Arc<dyn ChainSigner>, RpcFailure> {
		let chain_id = self
			.active_chain
			.read()
			.await
			.ok_or_else(|| RpcFailure::new(CHAIN_DISCONNECTED, "No chain selected"))?;

		let rpc_url = self
			.chains
			.read()
			.await
			.get(&chain_id)
			.cloned()
			.ok_or_else(|| RpcFailure::new(CHAIN_DISCONNECTED, "Selected chain was removed"))?;

		let url = parse_url(&rpc_url).map_err(|e| RpcFailure::transport(e.to_string()))?;
		let signer = self.signer.clone().with_chain_id(Some(chain_id));
		let address = signer.address();

		let provider = ProviderBuilder::new()
			.wallet(EthereumWallet::from(signer))
			.connect_http(url)
			.erased();

		// The node behind the URL must actually serve the selected chain
		let reported = provider.get_chain_id().await.map_err(RpcFailure::from)?;
		if reported != chain_id {
			return Err(RpcFailure::new(
				CHAIN_DISCONNECTED,
				format!(
					"RPC endpoint serves chain {} instead of {}",
					reported, chain_id
				),
			));
		}

		Ok(Arc::new(AlloySigner::new(
			provider,
			address,
			self.poll_interval,
		)))
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use registry_config::{Network, NetworkEndpoint};

	const KEY: &str = "0xac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80";

	fn wallet() -> LocalWallet {
		LocalWallet::new(KEY, Duration::from_millis(10)).unwrap()
	}

	#[test]
	fn test_invalid_key() {
		assert!(matches!(
			LocalWallet::new("0x1234", Duration::from_secs(1)),
			Err(AccountError::InvalidKey(_))
		));
	}

	#[tokio::test]
	async fn test_unknown_chain_reports_unrecognized() {
		let err = wallet().switch_chain(0xfa2).await.unwrap_err();
		assert!(err.is_code(UNRECOGNIZED_CHAIN));
		assert!(err.message.contains("0xfa2"));
	}

	#[tokio::test]
	async fn test_add_then_switch() {
		let wallet = wallet();
		let definition = NetworkEndpoint::for_network(Network::Fakenet).chain_definition();
		wallet.add_chain(&definition).await.unwrap();
		wallet.switch_chain(0xfa3).await.unwrap();
		assert_eq!(*wallet.active_chain.read().await, Some(0xfa3));
	}

	#[tokio::test]
	async fn test_add_chain_requires_url() {
		let mut definition = NetworkEndpoint::for_network(Network::Fakenet).chain_definition();
		definition.rpc_urls.clear();
		assert!(wallet().add_chain(&definition).await.is_err());
	}

	#[tokio::test]
	async fn test_signer_requires_selected_chain() {
		let wallet = wallet().with_chain(0xfa3, "http://localhost:18545").await;
		match wallet.signer().await {
			Err(err) => assert!(err.is_code(CHAIN_DISCONNECTED)),
			Ok(_) => panic!("signer handed out without a selected chain"),
		}
	}
}
