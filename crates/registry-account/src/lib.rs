//! Provider and signer lifecycle for the registry client.
//!
//! [`ProviderManager`] owns a permanent read-only connection and, while a
//! wallet is connected, the wallet together with its signer. The pair is
//! stored as one value, so a wallet without a signer is never observable.

use alloy::primitives::Address;
use async_trait::async_trait;
use registry_config::{ChainDefinition, NetworkEndpoint};
use registry_types::{ChainReader, ChainSigner, ConnectionError, RpcFailure};
use std::sync::Arc;
use thiserror::Error;
use tracing::{info, warn};

pub mod implementations {
	pub mod detector;
	pub mod evm;
	pub mod local;
	pub mod rpc;
}

pub use implementations::detector::ConfiguredWalletDetector;
pub use implementations::evm::{AlloySigner, RpcChain};
pub use implementations::local::LocalWallet;
pub use implementations::rpc::RpcWallet;

/// EIP-1193 / MetaMask code: the requested chain has not been added to the wallet.
pub const UNRECOGNIZED_CHAIN: i64 = 4902;
/// EIP-1193 code: the wallet is not connected to the requested chain.
pub const CHAIN_DISCONNECTED: i64 = 4901;

#[derive(Debug, Error)]
pub enum AccountError {
	#[error("Invalid key: {0}")]
	InvalidKey(String),
	#[error("Invalid URL: {0}")]
	InvalidUrl(String),
}

/// A wallet able to switch chains and hand out a signer.
#[async_trait]
pub trait WalletInterface: Send + Sync {
	/// Short description for logs.
	fn name(&self) -> &str;

	/// Asks the wallet to switch to `chain_id`.
	///
	/// Fails with [`UNRECOGNIZED_CHAIN`] when the wallet does not know the chain.
	async fn switch_chain(&self, chain_id: u64) -> Result<(), RpcFailure>;

	/// Asks the wallet to register a chain definition.
	async fn add_chain(&self, chain: &ChainDefinition) -> Result<(), RpcFailure>;

	/// Returns a signer for the wallet's active account on the active chain.
	async fn signer(&self) -> Result<Arc<dyn ChainSigner>, RpcFailure>;
}

/// Finds the wallet available to this process, if any.
#[async_trait]
pub trait WalletDetector: Send + Sync {
	async fn detect(&self) -> Option<Box<dyn WalletInterface>>;
}

/// Result of a connect attempt that did not fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionStatus {
	/// No wallet was detected; the client stays read-only.
	NoWallet,
	/// Connected, signing as the given account.
	Connected(Address),
}

struct WalletConnection {
	wallet: Box<dyn WalletInterface>,
	signer: Arc<dyn ChainSigner>,
}

/// Holds the read-only connection and the optional wallet connection.
///
/// Lifecycle methods take `&mut self`; concurrent connect/disconnect calls
/// must be serialized by the owner.
pub struct ProviderManager {
	endpoint: NetworkEndpoint,
	read_only: Arc<dyn ChainReader>,
	detector: Box<dyn WalletDetector>,
	connection: Option<WalletConnection>,
}

impl ProviderManager {
	/// Creates the manager with an HTTP read-only connection to the endpoint.
	pub fn init(
		endpoint: NetworkEndpoint,
		detector: Box<dyn WalletDetector>,
	) -> Result<Self, AccountError> {
		let read_only = RpcChain::connect_http(&endpoint.rpc_url)?;
		info!(
			network = %endpoint.network,
			chain_id = endpoint.chain_id,
			"Read-only provider initialized"
		);
		Ok(Self::with_reader(endpoint, Arc::new(read_only), detector))
	}

	/// Creates the manager around an existing read-only connection.
	pub fn with_reader(
		endpoint: NetworkEndpoint,
		read_only: Arc<dyn ChainReader>,
		detector: Box<dyn WalletDetector>,
	) -> Self {
		Self {
			endpoint,
			read_only,
			detector,
			connection: None,
		}
	}

	pub fn endpoint(&self) -> &NetworkEndpoint {
		&self.endpoint
	}

	/// The permanent read-only connection.
	pub fn read_only(&self) -> Arc<dyn ChainReader> {
		self.read_only.clone()
	}

	/// Connection for reads: the signer's while connected, else read-only.
	pub fn reader(&self) -> Arc<dyn ChainReader> {
		match &self.connection {
			Some(connection) => connection.signer.reader(),
			None => self.read_only.clone(),
		}
	}

	/// Signer for writes; fails fast when no wallet is connected.
	pub fn signer(&self) -> Result<Arc<dyn ChainSigner>, ConnectionError> {
		self.connection
			.as_ref()
			.map(|connection| connection.signer.clone())
			.ok_or(ConnectionError::NotConnected)
	}

	pub fn wallet(&self) -> Option<&dyn WalletInterface> {
		self.connection
			.as_ref()
			.map(|connection| connection.wallet.as_ref())
	}

	pub fn is_connected(&self) -> bool {
		self.connection.is_some()
	}

	/// Runs the connect sequence: detect, switch (adding the chain once if
	/// the wallet does not know it), acquire a signer.
	///
	/// Any previous connection is dropped first, so a failed step always
	/// leaves the manager disconnected.
	pub async fn connect(&mut self) -> Result<ConnectionStatus, ConnectionError> {
		self.connection = None;

		let Some(wallet) = self.detector.detect().await else {
			info!("No wallet detected, staying read-only");
			return Ok(ConnectionStatus::NoWallet);
		};

		let chain_id = self.endpoint.chain_id;
		if let Err(failure) = wallet.switch_chain(chain_id).await {
			if !failure.is_code(UNRECOGNIZED_CHAIN) {
				warn!(wallet = wallet.name(), "Chain switch rejected: {}", failure);
				return Err(ConnectionError::ChainSwitchRejected(failure));
			}

			info!(wallet = wallet.name(), chain_id, "Wallet does not know the chain, adding it");
			wallet
				.add_chain(&self.endpoint.chain_definition())
				.await
				.map_err(|failure| {
					warn!(wallet = wallet.name(), "Adding chain rejected: {}", failure);
					ConnectionError::AddChainRejected(failure)
				})?;

			wallet.switch_chain(chain_id).await.map_err(|failure| {
				warn!(wallet = wallet.name(), "Chain switch rejected after adding: {}", failure);
				ConnectionError::ChainSwitchRejected(failure)
			})?;
		}

		let signer = wallet.signer().await.map_err(|failure| {
			warn!(wallet = wallet.name(), "Signer unavailable: {}", failure);
			ConnectionError::SignerUnavailable(failure)
		})?;

		let address = signer.address();
		info!(wallet = wallet.name(), account = %address, "Wallet connected");
		self.connection = Some(WalletConnection { wallet, signer });

		Ok(ConnectionStatus::Connected(address))
	}

	/// Drops the wallet and signer; the read-only connection is untouched.
	pub fn disconnect(&mut self) {
		if self.connection.take().is_some() {
			info!("Wallet disconnected");
		}
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::{address, Bytes, TxHash};
	use registry_config::Network;
	use registry_types::{ContractCall, TransactionReceipt};
	use std::collections::VecDeque;
	use std::sync::Mutex;

	const ACCOUNT: Address = address!("f39Fd6e51aad88F6F4ce6aB8827279cffFb92266");

	/// Reader whose block number identifies which connection answered.
	struct TaggedReader(u64);

	#[async_trait]
	impl ChainReader for TaggedReader {
		async fn get_code(&self, _address: Address) -> Result<Bytes, RpcFailure> {
			Ok(Bytes::new())
		}

		async fn call(&self, _to: Address, _input: Bytes) -> Result<Bytes, RpcFailure> {
			Ok(Bytes::new())
		}

		async fn block_number(&self) -> Result<u64, RpcFailure> {
			Ok(self.0)
		}
	}

	struct MockSigner;

	#[async_trait]
	impl ChainSigner for MockSigner {
		fn address(&self) -> Address {
			ACCOUNT
		}

		fn reader(&self) -> Arc<dyn ChainReader> {
			Arc::new(TaggedReader(2))
		}

		async fn send_transaction(&self, _call: &ContractCall) -> Result<TxHash, RpcFailure> {
			Ok(TxHash::ZERO)
		}

		async fn wait_for_confirmation(
			&self,
			hash: TxHash,
		) -> Result<TransactionReceipt, RpcFailure> {
			Ok(TransactionReceipt {
				hash,
				block_number: 1,
				success: true,
			})
		}
	}

	/// Scripted wallet recording every request it receives.
	#[derive(Clone, Default)]
	struct Script {
		switch: Arc<Mutex<VecDeque<Result<(), RpcFailure>>>>,
		add: Arc<Mutex<Option<RpcFailure>>>,
		signer: Arc<Mutex<Option<RpcFailure>>>,
		log: Arc<Mutex<Vec<String>>>,
	}

	impl Script {
		fn switch_results(self, results: Vec<Result<(), RpcFailure>>) -> Self {
			*self.switch.lock().unwrap() = results.into();
			self
		}

		fn fail_add(self, failure: RpcFailure) -> Self {
			*self.add.lock().unwrap() = Some(failure);
			self
		}

		fn fail_signer(self, failure: RpcFailure) -> Self {
			*self.signer.lock().unwrap() = Some(failure);
			self
		}

		fn log(&self) -> Vec<String> {
			self.log.lock().unwrap().clone()
		}
	}

	struct MockWallet(Script);

	#[async_trait]
	impl WalletInterface for MockWallet {
		fn name(&self) -> &str {
			"mock"
		}

		async fn switch_chain(&self, chain_id: u64) -> Result<(), RpcFailure> {
			self.0.log.lock().unwrap().push(format!("switch:{:#x}", chain_id));
			self.0.switch.lock().unwrap().pop_front().unwrap_or(Ok(()))
		}

		async fn add_chain(&self, chain: &ChainDefinition) -> Result<(), RpcFailure> {
			self.0.log.lock().unwrap().push(format!("add:{}", chain.chain_name));
			match self.0.add.lock().unwrap().clone() {
				Some(failure) => Err(failure),
				None => Ok(()),
			}
		}

		async fn signer(&self) -> Result<Arc<dyn ChainSigner>, RpcFailure> {
			self.0.log.lock().unwrap().push("signer".to_string());
			match self.0.signer.lock().unwrap().clone() {
				Some(failure) => Err(failure),
				None => Ok(Arc::new(MockSigner)),
			}
		}
	}

	struct MockDetector(Option<Script>);

	#[async_trait]
	impl WalletDetector for MockDetector {
		async fn detect(&self) -> Option<Box<dyn WalletInterface>> {
			self.0
				.clone()
				.map(|script| Box::new(MockWallet(script)) as Box<dyn WalletInterface>)
		}
	}

	fn manager(script: Option<Script>) -> ProviderManager {
		ProviderManager::with_reader(
			NetworkEndpoint::for_network(Network::Testnet),
			Arc::new(TaggedReader(1)),
			Box::new(MockDetector(script)),
		)
	}

	#[tokio::test]
	async fn test_no_wallet_is_a_noop() {
		let mut providers = manager(None);
		assert_eq!(providers.connect().await.unwrap(), ConnectionStatus::NoWallet);
		assert!(!providers.is_connected());
		assert!(providers.wallet().is_none());
		assert!(matches!(
			providers.signer(),
			Err(ConnectionError::NotConnected)
		));
		// Reads keep working through the read-only connection
		assert_eq!(providers.reader().block_number().await.unwrap(), 1);
		assert_eq!(providers.read_only().block_number().await.unwrap(), 1);
	}

	#[tokio::test]
	async fn test_connect_routes_reads_through_signer() {
		let script = Script::default();
		let mut providers = manager(Some(script.clone()));

		assert_eq!(
			providers.connect().await.unwrap(),
			ConnectionStatus::Connected(ACCOUNT)
		);
		assert!(providers.is_connected());
		assert_eq!(providers.signer().unwrap().address(), ACCOUNT);
		assert_eq!(providers.reader().block_number().await.unwrap(), 2);
		assert_eq!(providers.read_only().block_number().await.unwrap(), 1);
		assert_eq!(script.log(), vec!["switch:0xfa2", "signer"]);
	}

	#[tokio::test]
	async fn test_unrecognized_chain_is_added_then_switched_once() {
		let script = Script::default().switch_results(vec![Err(RpcFailure::new(
			UNRECOGNIZED_CHAIN,
			"Unrecognized chain ID",
		))]);
		let mut providers = manager(Some(script.clone()));

		assert!(matches!(
			providers.connect().await.unwrap(),
			ConnectionStatus::Connected(_)
		));
		assert_eq!(
			script.log(),
			vec!["switch:0xfa2", "add:Fantom testnet", "switch:0xfa2", "signer"]
		);
	}

	#[tokio::test]
	async fn test_failed_add_chain_leaves_disconnected() {
		let script = Script::default()
			.switch_results(vec![Err(RpcFailure::new(UNRECOGNIZED_CHAIN, "unknown"))])
			.fail_add(RpcFailure::new(4001, "User rejected the request"));
		let mut providers = manager(Some(script.clone()));

		let err = providers.connect().await.unwrap_err();
		assert!(matches!(err, ConnectionError::AddChainRejected(f) if f.is_code(4001)));
		assert!(!providers.is_connected());
		assert!(providers.wallet().is_none());
		assert!(providers.signer().is_err());
		// No second switch attempt after the add failed
		assert_eq!(script.log(), vec!["switch:0xfa2", "add:Fantom testnet"]);
	}

	#[tokio::test]
	async fn test_second_switch_failure_leaves_disconnected() {
		let script = Script::default().switch_results(vec![
			Err(RpcFailure::new(UNRECOGNIZED_CHAIN, "unknown")),
			Err(RpcFailure::new(4001, "User rejected the request")),
		]);
		let mut providers = manager(Some(script.clone()));

		assert!(matches!(
			providers.connect().await,
			Err(ConnectionError::ChainSwitchRejected(_))
		));
		assert!(!providers.is_connected());
		assert_eq!(script.log().len(), 3);
	}

	#[tokio::test]
	async fn test_declined_switch_does_not_add_chain() {
		let script = Script::default()
			.switch_results(vec![Err(RpcFailure::new(4001, "User rejected the request"))]);
		let mut providers = manager(Some(script.clone()));

		assert!(matches!(
			providers.connect().await,
			Err(ConnectionError::ChainSwitchRejected(f)) if f.is_code(4001)
		));
		assert_eq!(script.log(), vec!["switch:0xfa2"]);
	}

	#[tokio::test]
	async fn test_signer_failure_leaves_disconnected() {
		let script = Script::default().fail_signer(RpcFailure::new(4100, "Unauthorized"));
		let mut providers = manager(Some(script));

		assert!(matches!(
			providers.connect().await,
			Err(ConnectionError::SignerUnavailable(_))
		));
		assert!(!providers.is_connected());
		assert!(providers.wallet().is_none());
	}

	#[tokio::test]
	async fn test_failed_reconnect_clears_previous_connection() {
		let script = Script::default();
		let mut providers = manager(Some(script.clone()));
		providers.connect().await.unwrap();
		assert!(providers.is_connected());

		*script.switch.lock().unwrap() =
			vec![Err(RpcFailure::new(4001, "User rejected the request"))].into();
		assert!(providers.connect().await.is_err());
		assert!(!providers.is_connected());
		assert_eq!(providers.reader().block_number().await.unwrap(), 1);
	}

	#[tokio::test]
	async fn test_disconnect_keeps_read_only() {
		let mut providers = manager(Some(Script::default()));
		providers.connect().await.unwrap();
		providers.disconnect();

		assert!(!providers.is_connected());
		assert!(providers.signer().is_err());
		assert_eq!(providers.reader().block_number().await.unwrap(), 1);

		// Disconnecting twice is harmless
		providers.disconnect();
		assert!(!providers.is_connected());
	}
}
