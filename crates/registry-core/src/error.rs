use registry_config::ConfigError;
use registry_types::{ConnectionError, RegistryError};
use registry_tracer::TracerError;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
	#[error("Configuration error: {0}")]
	Configuration(String),

	#[error(transparent)]
	Registry(#[from] RegistryError),

	#[error(transparent)]
	Tracer(#[from] TracerError),

	#[error("IO error: {0}")]
	Io(#[from] std::io::Error),
}

impl From<ConfigError> for CoreError {
	fn from(err: ConfigError) -> Self {
		match err {
			ConfigError::FileNotFound(msg) => {
				CoreError::Configuration(format!("Config file not found: {}", msg))
			}
			ConfigError::ParseError(msg) => {
				CoreError::Configuration(format!("Config parse error: {}", msg))
			}
			ConfigError::UnknownNetwork(name) => {
				CoreError::Configuration(format!("Unknown network: {}", name))
			}
			ConfigError::ValidationError(msg) => {
				CoreError::Configuration(format!("Config validation error: {}", msg))
			}
			ConfigError::EnvVarNotFound(var) => {
				CoreError::Configuration(format!("Environment variable not found: {}", var))
			}
			ConfigError::IoError(e) => {
				CoreError::Configuration(format!("IO error reading config: {}", e))
			}
		}
	}
}

impl From<ConnectionError> for CoreError {
	fn from(err: ConnectionError) -> Self {
		CoreError::Registry(err.into())
	}
}
