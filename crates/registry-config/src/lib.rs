//! Configuration for the document registry client.
//!
//! Loads a TOML file, substitutes `${VAR}` references from the environment,
//! applies `REGISTRY_`-prefixed overrides and validates the result. The
//! network name is resolved during validation, so an unknown environment
//! fails at startup rather than at first use.

use std::env;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::debug;

pub mod network;
pub mod types;

pub use network::{hex_chain_id, ChainDefinition, NativeCurrency, Network, NetworkEndpoint};
pub use types::{RegistryConfig, TracerSettings, WalletConfig};

#[derive(Error, Debug)]
pub enum ConfigError {
	#[error("File not found: {0}")]
	FileNotFound(String),

	#[error("Parse error: {0}")]
	ParseError(String),

	#[error("Unknown network: {0} (expected mainnet, testnet or fakenet)")]
	UnknownNetwork(String),

	#[error("Validation error: {0}")]
	ValidationError(String),

	#[error("Environment variable not found: {0}")]
	EnvVarNotFound(String),

	#[error("IO error: {0}")]
	IoError(#[from] std::io::Error),
}

/// Configuration loader with environment variable substitution
pub struct ConfigLoader {
	file_path: Option<PathBuf>,
	env_prefix: String,
}

impl Default for ConfigLoader {
	fn default() -> Self {
		Self::new()
	}
}

impl ConfigLoader {
	pub fn new() -> Self {
		Self {
			file_path: None,
			env_prefix: "REGISTRY_".to_string(),
		}
	}

	pub fn with_file<P: AsRef<Path>>(mut self, path: P) -> Self {
		self.file_path = Some(path.as_ref().to_path_buf());
		self
	}

	pub fn with_env_prefix(mut self, prefix: impl Into<String>) -> Self {
		self.env_prefix = prefix.into();
		self
	}

	pub async fn load(&self) -> Result<RegistryConfig, ConfigError> {
		let file_path = self.file_path.as_ref().ok_or_else(|| {
			ConfigError::FileNotFound("No configuration file specified".to_string())
		})?;

		if !tokio::fs::try_exists(file_path).await? {
			return Err(ConfigError::FileNotFound(file_path.display().to_string()));
		}

		let content = tokio::fs::read_to_string(file_path).await?;
		self.load_from_str(&content)
	}

	/// Runs the full pipeline on configuration text instead of a file.
	pub fn load_from_str(&self, content: &str) -> Result<RegistryConfig, ConfigError> {
		let substituted = self.substitute_env_vars(content)?;

		let mut config: RegistryConfig =
			toml::from_str(&substituted).map_err(|e| ConfigError::ParseError(e.to_string()))?;

		self.apply_env_overrides(&mut config)?;
		self.validate_config(&config)?;

		Ok(config)
	}

	fn substitute_env_vars(&self, content: &str) -> Result<String, ConfigError> {
		let mut result = content.to_string();

		// Find and replace ${VAR_NAME} patterns
		let re = regex::Regex::new(r"\$\{([^}]+)\}")
			.map_err(|e| ConfigError::ParseError(e.to_string()))?;

		for cap in re.captures_iter(content) {
			let full_match = &cap[0];
			let var_name = &cap[1];

			let env_value = env::var(var_name)
				.map_err(|_| ConfigError::EnvVarNotFound(var_name.to_string()))?;

			result = result.replace(full_match, &env_value);
		}

		Ok(result)
	}

	fn apply_env_overrides(&self, config: &mut RegistryConfig) -> Result<(), ConfigError> {
		if let Ok(network) = env::var(format!("{}NETWORK", self.env_prefix)) {
			debug!("Overriding network from environment");
			config.network = network;
		}

		if let Ok(rpc_url) = env::var(format!("{}RPC_URL", self.env_prefix)) {
			debug!("Overriding RPC URL from environment");
			config.rpc_url = Some(rpc_url);
		}

		if let Ok(log_level) = env::var(format!("{}LOG_LEVEL", self.env_prefix)) {
			config.log_level = log_level;
		}

		if let Ok(factory) = env::var(format!("{}FACTORY_ADDRESS", self.env_prefix)) {
			debug!("Overriding factory address from environment");
			config.factory_address = factory.parse().map_err(|e| {
				ConfigError::ValidationError(format!("Invalid factory address: {}", e))
			})?;
		}

		Ok(())
	}

	fn validate_config(&self, config: &RegistryConfig) -> Result<(), ConfigError> {
		// Resolves the network name, failing on unknown environments
		let endpoint = config.endpoint()?;

		if !is_http_url(&endpoint.rpc_url) {
			return Err(ConfigError::ValidationError(
				"RPC URL must start with http:// or https://".to_string(),
			));
		}

		if config.factory_address.is_zero() {
			return Err(ConfigError::ValidationError(
				"factory_address must not be the zero address".to_string(),
			));
		}

		if config.confirmation_poll_secs == 0 {
			return Err(ConfigError::ValidationError(
				"confirmation_poll_secs must be at least 1".to_string(),
			));
		}

		if config.tracer.blocks == 0 {
			return Err(ConfigError::ValidationError(
				"tracer.blocks must be at least 1".to_string(),
			));
		}

		match &config.wallet {
			Some(WalletConfig::Local { private_key }) => {
				let key = private_key.strip_prefix("0x").unwrap_or(private_key);
				if key.len() != 64 || !key.chars().all(|c| c.is_ascii_hexdigit()) {
					return Err(ConfigError::ValidationError(
						"Private key must be 64 hex characters (32 bytes)".to_string(),
					));
				}
			}
			Some(WalletConfig::Rpc { url }) if !is_http_url(url) => {
				return Err(ConfigError::ValidationError(
					"Wallet URL must start with http:// or https://".to_string(),
				));
			}
			_ => {}
		}

		Ok(())
	}
}

fn is_http_url(url: &str) -> bool {
	url.starts_with("http://") || url.starts_with("https://")
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::address;
	use std::io::Write;

	const MINIMAL: &str = r#"
network = "testnet"
factory_address = "0x5FbDB2315678afecb367f032d93F642f64180aa3"
"#;

	fn loader(prefix: &str) -> ConfigLoader {
		// Unique prefixes keep tests independent of each other's overrides
		ConfigLoader::new().with_env_prefix(prefix)
	}

	#[test]
	fn test_minimal_config_defaults() {
		let config = loader("REGISTRY_TEST_MINIMAL_")
			.load_from_str(MINIMAL)
			.unwrap();
		assert_eq!(config.network().unwrap(), Network::Testnet);
		assert_eq!(
			config.factory_address,
			address!("5FbDB2315678afecb367f032d93F642f64180aa3")
		);
		assert_eq!(config.log_level, "info");
		assert_eq!(config.confirmation_poll_secs, 2);
		assert_eq!(config.tracer.blocks, 10_000);
		assert!(config.wallet.is_none());

		let endpoint = config.endpoint().unwrap();
		assert_eq!(endpoint.chain_id, 0xfa2);
		assert_eq!(endpoint.rpc_url, "https://rpc.ankr.com/fantom_testnet");
	}

	#[test]
	fn test_unknown_network_fails_at_load() {
		let content = MINIMAL.replace("testnet", "ropsten");
		let err = loader("REGISTRY_TEST_UNKNOWN_")
			.load_from_str(&content)
			.unwrap_err();
		assert!(matches!(err, ConfigError::UnknownNetwork(name) if name == "ropsten"));
	}

	#[test]
	fn test_wallet_sections() {
		let content = format!(
			"{}\n[wallet]\nkind = \"local\"\nprivate_key = \"0x{}\"\n",
			MINIMAL,
			"ab".repeat(32)
		);
		let config = loader("REGISTRY_TEST_LOCAL_")
			.load_from_str(&content)
			.unwrap();
		assert!(matches!(config.wallet, Some(WalletConfig::Local { .. })));
		assert!(!format!("{:?}", config.wallet).contains("abab"));

		let content = format!(
			"{}\n[wallet]\nkind = \"rpc\"\nurl = \"http://127.0.0.1:1248\"\n",
			MINIMAL
		);
		let config = loader("REGISTRY_TEST_RPC_")
			.load_from_str(&content)
			.unwrap();
		assert!(
			matches!(config.wallet, Some(WalletConfig::Rpc { ref url }) if url == "http://127.0.0.1:1248")
		);
	}

	#[test]
	fn test_invalid_private_key_rejected() {
		let content = format!(
			"{}\n[wallet]\nkind = \"local\"\nprivate_key = \"0x1234\"\n",
			MINIMAL
		);
		let err = loader("REGISTRY_TEST_BADKEY_")
			.load_from_str(&content)
			.unwrap_err();
		assert!(matches!(err, ConfigError::ValidationError(_)));
	}

	#[test]
	fn test_env_substitution_and_overrides() {
		env::set_var("REGISTRY_TEST_SUBST_VALUE", "fakenet");
		env::set_var("REGISTRY_TEST_OVR_RPC_URL", "http://127.0.0.1:9545");
		let content = MINIMAL.replace("testnet", "${REGISTRY_TEST_SUBST_VALUE}");
		let config = loader("REGISTRY_TEST_OVR_")
			.load_from_str(&content)
			.unwrap();
		let endpoint = config.endpoint().unwrap();
		assert_eq!(endpoint.network, Network::Fakenet);
		assert_eq!(endpoint.chain_id, 0xfa3);
		assert_eq!(endpoint.rpc_url, "http://127.0.0.1:9545");
	}

	#[test]
	fn test_missing_env_var() {
		let content = MINIMAL.replace("testnet", "${REGISTRY_TEST_DEFINITELY_UNSET}");
		let err = loader("REGISTRY_TEST_MISSING_")
			.load_from_str(&content)
			.unwrap_err();
		assert!(
			matches!(err, ConfigError::EnvVarNotFound(name) if name == "REGISTRY_TEST_DEFINITELY_UNSET")
		);
	}

	#[tokio::test]
	async fn test_load_from_file() {
		let mut file = tempfile::NamedTempFile::new().unwrap();
		file.write_all(MINIMAL.as_bytes()).unwrap();

		let config = loader("REGISTRY_TEST_FILE_")
			.with_file(file.path())
			.load()
			.await
			.unwrap();
		assert_eq!(config.network().unwrap(), Network::Testnet);

		let err = loader("REGISTRY_TEST_FILE_")
			.with_file("/nonexistent/registry.toml")
			.load()
			.await
			.unwrap_err();
		assert!(matches!(err, ConfigError::FileNotFound(_)));
	}
}
