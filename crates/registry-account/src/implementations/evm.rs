//! Alloy-backed chain access.
//!
//! [`RpcChain`] answers reads over HTTP; [`AlloySigner`] submits
//! transactions through a provider whose wallet (local filler or remote
//! wallet endpoint) signs them.

use crate::AccountError;
use alloy::network::{ReceiptResponse, TransactionBuilder};
use alloy::primitives::{Address, Bytes, TxHash};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::rpc::types::TransactionRequest;
use alloy::transports::http::reqwest::Url;
use async_trait::async_trait;
use registry_types::{ChainReader, ChainSigner, ContractCall, RpcFailure, TransactionReceipt};
use std::sync::Arc;
use std::time::Duration;

/// Truncates a transaction hash for display.
pub(crate) fn truncate_hash(hash: &TxHash) -> String {
	let hash_str = hash.to_string();
	if hash_str.len() <= 10 {
		hash_str
	} else {
		format!("{}..", &hash_str[..10])
	}
}

pub(crate) fn parse_url(url: &str) -> Result<Url, AccountError> {
	url.parse()
		.map_err(|e| AccountError::InvalidUrl(format!("{}: {}", url, e)))
}

/// Read-only access over an alloy provider.
#[derive(Clone)]
pub struct RpcChain {
	provider: DynProvider,
}

impl RpcChain {
	pub fn new(provider: DynProvider) -> Self {
		Self { provider }
	}

	/// Connects to an HTTP JSON-RPC endpoint.
	pub fn connect_http(rpc_url: &str) -> Result<Self, AccountError> {
		let url = parse_url(rpc_url)?;
		let provider = ProviderBuilder::new().connect_http(url).erased();
		Ok(Self { provider })
	}
}

#[async_trait]
impl ChainReader for RpcChain {
	async fn get_code(&self, address: Address) -> Result<Bytes, RpcFailure> {
		self.provider
			.get_code_at(address)
			.await
			.map_err(RpcFailure::from)
	}

	async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, RpcFailure> {
		let request = TransactionRequest::default()
			.with_to(to)
			.with_input(input);
		self.provider.call(request).await.map_err(RpcFailure::from)
	}

	async fn block_number(&self) -> Result<u64, RpcFailure> {
		self.provider
			.get_block_number()
			.await
			.map_err(RpcFailure::from)
	}
}

/// Signer over a provider that can sign for `from`.
pub struct AlloySigner {
	provider: DynProvider,
	from: Address,
	poll_interval: Duration,
}

impl AlloySigner {
	pub fn new(provider: DynProvider, from: Address, poll_interval: Duration) -> Self {
		Self {
			provider,
			from,
			poll_interval,
		}
	}
}

#[async_trait]
impl ChainSigner for AlloySigner {
	fn address(&self) -> Address {
		self.from
	}

	fn reader(&self) -> Arc<dyn ChainReader> {
		Arc::new(RpcChain::new(self.provider.clone()))
	}

	async fn send_transaction(&self, call: &ContractCall) -> Result<TxHash, RpcFailure> {
		let request = TransactionRequest::default()
			.with_from(self.from)
			.with_to(call.to)
			.with_input(call.input.clone());

		let pending = self
			.provider
			.send_transaction(request)
			.await
			.map_err(RpcFailure::from)?;

		let tx_hash = *pending.tx_hash();
		tracing::info!(
			tx_hash = %truncate_hash(&tx_hash),
			function = call.function,
			"Submitted transaction"
		);

		Ok(tx_hash)
	}

	async fn wait_for_confirmation(&self, hash: TxHash) -> Result<TransactionReceipt, RpcFailure> {
		tracing::info!(tx_hash = %truncate_hash(&hash), "Waiting for confirmation");

		loop {
			let receipt = match self.provider.get_transaction_receipt(hash).await {
				Ok(Some(receipt)) => receipt,
				Ok(None) => {
					// Transaction not yet mined, wait and retry
					tokio::time::sleep(self.poll_interval).await;
					continue;
				}
				Err(e) => return Err(e.into()),
			};

			let block_number = receipt.block_number.unwrap_or(0);
			tracing::debug!(
				tx_hash = %truncate_hash(&hash),
				block_number,
				"Transaction mined"
			);

			return Ok(TransactionReceipt {
				hash: receipt.transaction_hash,
				block_number,
				success: receipt.status(),
			});
		}
	}
}
