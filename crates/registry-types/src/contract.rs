//! Contract kinds and register roles.

use alloy::primitives::{keccak256, B256};
use serde::Serialize;
use std::fmt;

/// The three contract interfaces of the registry hierarchy.
///
/// A kind is only ever assigned by bytecode inspection, never taken from
/// the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ContractKind {
	/// The organisation factory at the root of the hierarchy.
	Factory,
	/// An organisation deployed by the factory.
	Organisation,
	/// A register deployed by an organisation.
	Register,
}

impl ContractKind {
	pub fn as_str(&self) -> &'static str {
		match self {
			ContractKind::Factory => "factory",
			ContractKind::Organisation => "organisation",
			ContractKind::Register => "register",
		}
	}
}

impl fmt::Display for ContractKind {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.as_str())
	}
}

/// Permission roles enforced by a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Role {
	RecordCreator,
	RecordInvalidator,
	RegisterEditor,
}

impl Role {
	pub const ALL: [Role; 3] = [
		Role::RecordCreator,
		Role::RecordInvalidator,
		Role::RegisterEditor,
	];

	/// ASCII source string of the role identifier.
	pub fn name(&self) -> &'static str {
		match self {
			Role::RecordCreator => "RECORD_CREATOR",
			Role::RecordInvalidator => "RECORD_INVALIDATOR",
			Role::RegisterEditor => "REGISTER_EDITOR",
		}
	}

	/// On-chain role identifier: keccak256 of the role name.
	pub fn id(&self) -> B256 {
		keccak256(self.name().as_bytes())
	}
}

impl fmt::Display for Role {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.name())
	}
}
