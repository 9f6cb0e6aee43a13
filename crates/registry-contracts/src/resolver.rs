//! Contract kind resolution from deployed bytecode.

use crate::handle::ContractHandle;
use crate::selectors;
use alloy::primitives::{Address, Bytes};
use registry_types::{ChainReader, ContractKind, RegistryError};
use std::sync::Arc;

/// Order in which interfaces are tried; the first match wins.
const PROBE_ORDER: [ContractKind; 3] = [
	ContractKind::Organisation,
	ContractKind::Register,
	ContractKind::Factory,
];

/// Classifies addresses by the selectors present in their bytecode.
///
/// Bytecode is always fetched over the read-only connection. Resolution
/// never fails: a node error or an account without code resolves to
/// nothing.
#[derive(Clone)]
pub struct ContractTypeResolver {
	read_only: Arc<dyn ChainReader>,
}

impl ContractTypeResolver {
	pub fn new(read_only: Arc<dyn ChainReader>) -> Self {
		Self { read_only }
	}

	async fn fetch_code(&self, address: Address) -> Option<Bytes> {
		match self.read_only.get_code(address).await {
			Ok(code) if code.is_empty() => {
				tracing::debug!(%address, "No bytecode at address");
				None
			}
			Ok(code) => Some(code),
			Err(e) => {
				tracing::debug!(%address, "Failed to fetch bytecode: {}", e);
				None
			}
		}
	}

	/// Returns the first interface, in probe order, that `address` implements.
	pub async fn resolve(&self, address: Address) -> Option<ContractKind> {
		let code = self.fetch_code(address).await?;
		let kind = PROBE_ORDER
			.into_iter()
			.find(|kind| selectors::implements(&code, *kind));
		tracing::debug!(%address, kind = ?kind, "Resolved contract kind");
		kind
	}

	/// Returns true if the bytecode at `address` implements `kind`.
	pub async fn implements(&self, address: Address, kind: ContractKind) -> bool {
		match self.fetch_code(address).await {
			Some(code) => selectors::implements(&code, kind),
			None => false,
		}
	}

	/// Verifies `address` as a factory.
	pub async fn factory(&self, address: Address) -> Result<ContractHandle, RegistryError> {
		self.verify(address, ContractKind::Factory).await
	}

	/// Verifies `address` as an organisation.
	///
	/// Only the interface is checked; whether the organisation is official
	/// is for the hierarchical search to decide.
	pub async fn organisation(&self, address: Address) -> Result<ContractHandle, RegistryError> {
		self.verify(address, ContractKind::Organisation).await
	}

	async fn verify(
		&self,
		address: Address,
		expected: ContractKind,
	) -> Result<ContractHandle, RegistryError> {
		if self.implements(address, expected).await {
			Ok(ContractHandle::verified(address, expected))
		} else {
			Err(RegistryError::Verification { address, expected })
		}
	}
}
