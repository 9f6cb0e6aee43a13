//! Document records held by a register.

use alloy::primitives::{Address, B256, U256};
use serde::Serialize;
use sha2::{Digest, Sha256};

/// Raw return tuple of `records(bytes32)`, in on-chain field order.
pub type RecordTuple = (
	B256,
	Address,
	Address,
	String,
	String,
	U256,
	U256,
	U256,
	U256,
	B256,
	B256,
);

/// Snapshot of a register record as of the query that produced it.
///
/// Records are never cached; every read goes back to the chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
	pub document_hash: B256,
	pub creator: Address,
	pub updater: Address,
	pub source_document: String,
	pub reference_document: String,
	pub created_at: U256,
	pub updated_at: U256,
	pub starts_at: U256,
	pub expires_at: U256,
	pub past_document_hash: B256,
	pub next_document_hash: B256,
}

impl Record {
	/// A register answers unknown hashes with a zeroed record.
	pub fn exists(&self) -> bool {
		!self.created_at.is_zero()
	}
}

impl From<RecordTuple> for Record {
	fn from(raw: RecordTuple) -> Self {
		let (
			document_hash,
			creator,
			updater,
			source_document,
			reference_document,
			created_at,
			updated_at,
			starts_at,
			expires_at,
			past_document_hash,
			next_document_hash,
		) = raw;

		Self {
			document_hash,
			creator,
			updater,
			source_document,
			reference_document,
			created_at,
			updated_at,
			starts_at,
			expires_at,
			past_document_hash,
			next_document_hash,
		}
	}
}

/// Hash identifying a document in a register: SHA-256 of its contents.
pub fn document_hash(contents: &[u8]) -> B256 {
	B256::from_slice(&Sha256::digest(contents))
}
