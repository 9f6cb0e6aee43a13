//! Verified contract handles.

use alloy::primitives::Address;
use registry_types::ContractKind;
use serde::Serialize;
use std::fmt;

/// A contract address paired with the interface it was verified to implement.
///
/// Handles cannot be built outside this crate. Factory and organisation
/// handles come out of the resolver after a bytecode check; register handles
/// only come out of the hierarchical search, so holding one means the
/// register was found in its organisation's list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct ContractHandle {
	address: Address,
	kind: ContractKind,
}

impl ContractHandle {
	pub(crate) fn verified(address: Address, kind: ContractKind) -> Self {
		Self { address, kind }
	}

	pub fn address(&self) -> Address {
		self.address
	}

	pub fn kind(&self) -> ContractKind {
		self.kind
	}
}

impl fmt::Display for ContractHandle {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{} {}", self.kind, self.address)
	}
}
