//! Trust-rooted lookup of organisations and registers.
//!
//! Bytecode alone says nothing about provenance: anyone can deploy a
//! contract with the right selectors. The search anchors every result in
//! the hierarchy instead. An organisation is accepted when the factory lists
//! it; a register is accepted when its claimed parent is an accepted
//! organisation that lists the register among its own.

use crate::abi::IRegister;
use crate::bindings::{read, FactoryContract, OrganisationContract};
use crate::handle::ContractHandle;
use crate::resolver::ContractTypeResolver;
use alloy::primitives::Address;
use futures::StreamExt;
use registry_types::{ChainReader, ContractKind, RegistryError};
use std::sync::Arc;

/// Outcome of a hierarchical search.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SearchResult {
	Found(ContractHandle),
	NotFound,
}

impl SearchResult {
	pub fn handle(&self) -> Option<ContractHandle> {
		match self {
			SearchResult::Found(handle) => Some(*handle),
			SearchResult::NotFound => None,
		}
	}

	pub fn into_result(self, address: Address) -> Result<ContractHandle, RegistryError> {
		self.handle().ok_or(RegistryError::NotFound(address))
	}
}

impl From<Option<ContractHandle>> for SearchResult {
	fn from(handle: Option<ContractHandle>) -> Self {
		handle.map_or(SearchResult::NotFound, SearchResult::Found)
	}
}

pub struct HierarchicalSearch {
	resolver: ContractTypeResolver,
	reader: Arc<dyn ChainReader>,
}

impl HierarchicalSearch {
	/// `reader` serves the membership reads; bytecode checks go through the
	/// resolver's own read-only connection.
	pub fn new(resolver: ContractTypeResolver, reader: Arc<dyn ChainReader>) -> Self {
		Self { resolver, reader }
	}

	/// Finds the organisation or register at `address`.
	///
	/// With a factory, organisations must be listed by it; without one, any
	/// contract implementing the organisation interface is accepted at the
	/// organisation level. Registers always need an accepted parent that
	/// lists them. Every failure along the way, including node errors,
	/// yields [`SearchResult::NotFound`].
	pub async fn search(&self, address: Address, factory: Option<&FactoryContract>) -> SearchResult {
		let result = match self.resolver.resolve(address).await {
			Some(ContractKind::Organisation) => self.accept_organisation(address, factory).await,
			Some(ContractKind::Register) => self.accept_register(address, factory).await,
			Some(ContractKind::Factory) | None => None,
		};

		tracing::debug!(%address, found = result.is_some(), "Hierarchical search finished");
		result.into()
	}

	async fn accept_organisation(
		&self,
		address: Address,
		factory: Option<&FactoryContract>,
	) -> Option<ContractHandle> {
		let Some(factory) = factory else {
			return Some(ContractHandle::verified(address, ContractKind::Organisation));
		};

		match factory.is_organisation(address).await {
			Ok(true) => Some(ContractHandle::verified(address, ContractKind::Organisation)),
			Ok(false) => {
				tracing::debug!(%address, factory = %factory.address(), "Organisation not listed by factory");
				None
			}
			Err(e) => {
				tracing::warn!(%address, "Failed to query factory: {}", e);
				None
			}
		}
	}

	async fn accept_register(
		&self,
		address: Address,
		factory: Option<&FactoryContract>,
	) -> Option<ContractHandle> {
		let parent = match read(self.reader.as_ref(), address, IRegister::organisationCall {}).await {
			Ok(parent) => parent,
			Err(e) => {
				tracing::warn!(%address, "Failed to read parent organisation: {}", e);
				return None;
			}
		};

		if !self
			.resolver
			.implements(parent, ContractKind::Organisation)
			.await
		{
			tracing::debug!(%address, %parent, "Claimed parent is not an organisation");
			return None;
		}

		let parent = self.accept_organisation(parent, factory).await?;
		let organisation = OrganisationContract::new(parent, self.reader.clone()).ok()?;

		let mut registers = organisation.registers();
		while let Some(candidate) = registers.next().await {
			if candidate == address {
				return Some(ContractHandle::verified(address, ContractKind::Register));
			}
		}

		tracing::debug!(%address, parent = %parent.address(), "Register not listed by its organisation");
		None
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::testing::SimulatedChain;
	use alloy::primitives::address;

	const FACTORY: Address = address!("00000000000000000000000000000000000000fa");
	const OFFICIAL_ORG: Address = address!("0000000000000000000000000000000000000001");
	const ROGUE_ORG: Address = address!("0000000000000000000000000000000000000002");
	const LISTED: Address = address!("0000000000000000000000000000000000000011");
	const UNLISTED: Address = address!("0000000000000000000000000000000000000012");
	const ROGUE_REGISTER: Address = address!("0000000000000000000000000000000000000021");
	const EOA: Address = address!("00000000000000000000000000000000000000ee");

	struct Fixture {
		chain: Arc<SimulatedChain>,
		search: HierarchicalSearch,
		factory: FactoryContract,
	}

	fn fixture() -> Fixture {
		let chain = SimulatedChain::new();
		chain.deploy_factory(FACTORY);
		chain.deploy_organisation(OFFICIAL_ORG, EOA, Some(FACTORY));
		chain.deploy_organisation(ROGUE_ORG, EOA, None);
		chain.deploy_register(LISTED, OFFICIAL_ORG, true);
		chain.deploy_register(UNLISTED, OFFICIAL_ORG, false);
		chain.deploy_register(ROGUE_REGISTER, ROGUE_ORG, true);
		let chain = Arc::new(chain);

		let search = HierarchicalSearch::new(
			ContractTypeResolver::new(chain.clone()),
			chain.clone(),
		);
		let factory = FactoryContract::new(
			ContractHandle::verified(FACTORY, ContractKind::Factory),
			chain.clone(),
		)
		.unwrap();

		Fixture {
			chain,
			search,
			factory,
		}
	}

	#[tokio::test]
	async fn test_official_organisation_found() {
		let f = fixture();
		let handle = f
			.search
			.search(OFFICIAL_ORG, Some(&f.factory))
			.await
			.into_result(OFFICIAL_ORG)
			.unwrap();
		assert_eq!(handle.kind(), ContractKind::Organisation);
		assert_eq!(handle.address(), OFFICIAL_ORG);
	}

	#[tokio::test]
	async fn test_unofficial_organisation_needs_no_factory() {
		let f = fixture();
		assert_eq!(
			f.search.search(ROGUE_ORG, Some(&f.factory)).await,
			SearchResult::NotFound
		);
		assert!(matches!(
			f.search.search(ROGUE_ORG, None).await,
			SearchResult::Found(handle) if handle.kind() == ContractKind::Organisation
		));
	}

	#[tokio::test]
	async fn test_listed_register_found() {
		let f = fixture();
		let result = f.search.search(LISTED, Some(&f.factory)).await;
		assert_eq!(
			result.handle().map(|h| (h.address(), h.kind())),
			Some((LISTED, ContractKind::Register))
		);
	}

	#[tokio::test]
	async fn test_unlisted_register_not_found() {
		let f = fixture();
		assert_eq!(
			f.search.search(UNLISTED, Some(&f.factory)).await,
			SearchResult::NotFound
		);
		assert_eq!(f.search.search(UNLISTED, None).await, SearchResult::NotFound);
	}

	#[tokio::test]
	async fn test_register_of_unofficial_organisation() {
		let f = fixture();
		assert_eq!(
			f.search.search(ROGUE_REGISTER, Some(&f.factory)).await,
			SearchResult::NotFound
		);
		// Accepted once the factory check is waived
		assert!(f.search.search(ROGUE_REGISTER, None).await.handle().is_some());
	}

	#[tokio::test]
	async fn test_register_claiming_non_organisation_parent() {
		let f = fixture();
		let orphan = address!("0000000000000000000000000000000000000031");
		f.chain.deploy_register(orphan, EOA, true);
		assert_eq!(f.search.search(orphan, None).await, SearchResult::NotFound);
	}

	#[tokio::test]
	async fn test_account_without_code_not_found() {
		let f = fixture();
		let result = f.search.search(EOA, Some(&f.factory)).await;
		assert_eq!(result, SearchResult::NotFound);
		assert!(matches!(
			result.into_result(EOA),
			Err(RegistryError::NotFound(address)) if address == EOA
		));
	}

	#[tokio::test]
	async fn test_factory_is_not_a_search_result() {
		let f = fixture();
		assert_eq!(f.search.search(FACTORY, None).await, SearchResult::NotFound);
	}

	#[tokio::test]
	async fn test_parent_failure_not_found() {
		let f = fixture();
		f.chain.fail_address(OFFICIAL_ORG);
		assert_eq!(
			f.search.search(LISTED, Some(&f.factory)).await,
			SearchResult::NotFound
		);
	}
}
