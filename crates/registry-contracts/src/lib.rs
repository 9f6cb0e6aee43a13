//! Contract layer of the document registry client.
//!
//! This crate turns raw addresses into verified [`ContractHandle`]s and
//! exposes typed bindings over them. Two routes lead to a handle:
//!
//! - [`ContractTypeResolver`] classifies an address by the function
//!   selectors present in its bytecode.
//! - [`HierarchicalSearch`] additionally anchors the contract in the
//!   factory / organisation / register hierarchy and is the only way to
//!   obtain a register handle.

pub mod abi;
pub mod bindings;
pub mod handle;
pub mod pagination;
pub mod resolver;
pub mod search;
pub mod selectors;

#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use bindings::{
	DeploymentFees, FactoryContract, NewRecord, OrganisationContract, RegisterContract,
	RegisterPermissions,
};
pub use handle::ContractHandle;
pub use pagination::{enumerate, PaginatedEnumerator};
pub use resolver::ContractTypeResolver;
pub use search::{HierarchicalSearch, SearchResult};
