//! External wallet reached over JSON-RPC.
//!
//! Wallet daemons such as desktop signers expose the EIP-1193 request
//! surface on a local HTTP endpoint. Chain switching and registration are
//! forwarded as-is and transactions are sent unsigned through
//! `eth_sendTransaction`, leaving signing and user confirmation to the wallet.

use crate::implementations::evm::{parse_url, AlloySigner};
use crate::{AccountError, WalletInterface};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use async_trait::async_trait;
use registry_config::{hex_chain_id, ChainDefinition};
use registry_types::{ChainSigner, RpcFailure};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

/// EIP-1193 code for a request the wallet has not been authorized for.
const UNAUTHORIZED: i64 = 4100;

pub struct RpcWallet {
	url: String,
	provider: DynProvider,
	poll_interval: Duration,
}

impl RpcWallet {
	pub fn new(url: &str, poll_interval: Duration) -> Result<Self, AccountError> {
		let provider = ProviderBuilder::new().connect_http(parse_url(url)?).erased();
		Ok(Self {
			url: url.to_string(),
			provider,
			poll_interval,
		})
	}

	/// Returns true if the endpoint answers at all.
	pub async fn is_reachable(&self) -> bool {
		match self.provider.get_chain_id().await {
			Ok(_) => true,
			Err(e) => {
				tracing::debug!(url = %self.url, "Wallet endpoint unreachable: {}", e);
				false
			}
		}
	}
}

#[async_trait]
impl WalletInterface for RpcWallet {
	fn name(&self) -> &str {
		&self.url
	}

	async fn switch_chain(&self, chain_id: u64) -> Result<(), RpcFailure> {
		self.provider
			.raw_request::<_, Value>(
				"wallet_switchEthereumChain".into(),
				vec![json!({ "chainId": hex_chain_id(chain_id) })],
			)
			.await
			.map(|_| ())
			.map_err(RpcFailure::from)
	}

	async fn add_chain(&self, chain: &ChainDefinition) -> Result<(), RpcFailure> {
		self.provider
			.raw_request::<_, Value>("wallet_addEthereumChain".into(), vec![chain.clone()])
			.await
			.map(|_| ())
			.map_err(RpcFailure::from)
	}

	async fn signer(&self) -> Result<Arc<dyn ChainSigner>, RpcFailure> {
		let accounts = self.provider.get_accounts().await.map_err(RpcFailure::from)?;
		let from = accounts
			.first()
			.copied()
			.ok_or_else(|| RpcFailure::new(UNAUTHORIZED, "Wallet exposes no accounts"))?;

		Ok(Arc::new(AlloySigner::new(
			self.provider.clone(),
			from,
			self.poll_interval,
		)))
	}
}
