use crate::error::CoreError;
use alloy::primitives::{Address, B256};
use registry_account::{
	ConfiguredWalletDetector, ConnectionStatus, ProviderManager, WalletDetector,
};
use registry_config::{ConfigLoader, RegistryConfig};
use registry_contracts::{
	ContractTypeResolver, FactoryContract, HierarchicalSearch, OrganisationContract,
	RegisterContract, SearchResult,
};
use registry_delivery::TransactionExecutor;
use registry_tracer::{IncomingTransaction, TracerClient, TracerError};
use registry_types::{
	document_hash, ChainReader, ChainSigner, ConnectionError, ContractCall, ContractKind,
	RegistryError, TxOutcome,
};
use std::path::Path;
use std::sync::Arc;
use tracing::info;

/// SHA-256 document hash of the file at `path`.
pub async fn hash_file(path: impl AsRef<Path>) -> Result<B256, CoreError> {
	let contents = tokio::fs::read(path).await?;
	Ok(document_hash(&contents))
}

pub struct RegistryClient {
	config: RegistryConfig,
	provider: ProviderManager,
	resolver: ContractTypeResolver,
	executor: TransactionExecutor,
	tracer: TracerClient,
}

impl RegistryClient {
	pub fn config(&self) -> &RegistryConfig {
		&self.config
	}

	pub fn provider(&self) -> &ProviderManager {
		&self.provider
	}

	/// Connects the configured wallet, if there is one.
	pub async fn connect(&mut self) -> Result<ConnectionStatus, ConnectionError> {
		self.provider.connect().await
	}

	pub fn disconnect(&mut self) {
		self.provider.disconnect();
	}

	pub fn is_connected(&self) -> bool {
		self.provider.is_connected()
	}

	/// Account of the connected signer.
	pub fn account(&self) -> Option<Address> {
		self.provider.signer().ok().map(|signer| signer.address())
	}

	pub fn read_only(&self) -> Arc<dyn ChainReader> {
		self.provider.read_only()
	}

	pub fn signer(&self) -> Result<Arc<dyn ChainSigner>, ConnectionError> {
		self.provider.signer()
	}

	/// Kind of the contract at `address`, judged by its bytecode only.
	pub async fn resolve(&self, address: Address) -> Option<ContractKind> {
		self.resolver.resolve(address).await
	}

	/// The configured canonical factory, verified by bytecode.
	pub async fn factory(&self) -> Result<FactoryContract, RegistryError> {
		let handle = self.resolver.factory(self.config.factory_address).await?;
		FactoryContract::new(handle, self.provider.reader())
	}

	fn hierarchical_search(&self) -> HierarchicalSearch {
		HierarchicalSearch::new(self.resolver.clone(), self.provider.reader())
	}

	/// Searches for an organisation or register at `address`.
	///
	/// With `official` set the canonical factory anchors the search;
	/// otherwise organisations are accepted on their bytecode alone.
	pub async fn search(&self, address: Address, official: bool) -> Result<SearchResult, RegistryError> {
		let search = self.hierarchical_search();
		if official {
			let factory = self.factory().await?;
			Ok(search.search(address, Some(&factory)).await)
		} else {
			Ok(search.search(address, None).await)
		}
	}

	/// Binds the official organisation at `address`.
	pub async fn organisation(&self, address: Address) -> Result<OrganisationContract, RegistryError> {
		let handle = self.search(address, true).await?.into_result(address)?;
		OrganisationContract::new(handle, self.provider.reader())
	}

	/// Binds the register at `address`, which must belong to an official
	/// organisation.
	pub async fn register(&self, address: Address) -> Result<RegisterContract, RegistryError> {
		let handle = self.search(address, true).await?.into_result(address)?;
		RegisterContract::new(handle, self.provider.reader())
	}

	/// Submits a prepared call through the connected wallet.
	pub async fn submit(&self, call: &ContractCall) -> Result<TxOutcome, ConnectionError> {
		self.executor.submit(&self.provider, call).await
	}

	/// Calls made to `to` over the configured look-back window, or over
	/// `blocks` blocks when given.
	pub async fn incoming_transactions(
		&self,
		to: &str,
		blocks: Option<u64>,
		from_block: Option<u64>,
	) -> Result<Vec<IncomingTransaction>, TracerError> {
		let blocks = blocks.unwrap_or(self.config.tracer.blocks);
		self.tracer.incoming_transactions(to, blocks, from_block).await
	}
}

/// Builder for creating a RegistryClient instance
#[derive(Default)]
pub struct RegistryClientBuilder {
	config: Option<RegistryConfig>,
	config_path: Option<String>,
	reader: Option<Arc<dyn ChainReader>>,
	detector: Option<Box<dyn WalletDetector>>,
}

impl RegistryClientBuilder {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn with_config(mut self, config: RegistryConfig) -> Self {
		self.config = Some(config);
		self
	}

	pub fn with_config_file(mut self, path: impl Into<String>) -> Self {
		self.config_path = Some(path.into());
		self
	}

	/// Uses `reader` instead of an HTTP connection to the configured endpoint.
	pub fn with_reader(mut self, reader: Arc<dyn ChainReader>) -> Self {
		self.reader = Some(reader);
		self
	}

	/// Uses `detector` instead of the one described by the `[wallet]` section.
	pub fn with_detector(mut self, detector: Box<dyn WalletDetector>) -> Self {
		self.detector = Some(detector);
		self
	}

	pub async fn build(self) -> Result<RegistryClient, CoreError> {
		let config = if let Some(config) = self.config {
			config
		} else if let Some(config_path) = self.config_path {
			ConfigLoader::new().with_file(&config_path).load().await?
		} else {
			return Err(CoreError::Configuration(
				"No configuration or config file path provided".to_string(),
			));
		};

		let endpoint = config.endpoint()?;
		let network = endpoint.network;

		let detector = self.detector.unwrap_or_else(|| {
			Box::new(ConfiguredWalletDetector::new(
				config.wallet.clone(),
				config.confirmation_poll_interval(),
			))
		});

		let provider = match self.reader {
			Some(reader) => ProviderManager::with_reader(endpoint, reader, detector),
			None => ProviderManager::init(endpoint, detector)
				.map_err(|e| CoreError::Configuration(e.to_string()))?,
		};

		let resolver = ContractTypeResolver::new(provider.read_only());
		let tracer = TracerClient::new(network, provider.read_only())?;

		info!(
			%network,
			factory = %config.factory_address,
			"Registry client ready"
		);

		Ok(RegistryClient {
			config,
			provider,
			resolver,
			executor: TransactionExecutor::new(),
			tracer,
		})
	}
}
