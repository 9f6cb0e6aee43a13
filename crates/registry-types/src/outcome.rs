//! Classified outcome of a transaction submission.

use crate::errors::TransactionError;
use alloy::primitives::TxHash;
use std::fmt;

/// Every submission ends in exactly one of these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TxOutcome {
	/// Mined with a successful status.
	Success(TxHash),
	/// The wallet user declined to sign.
	UserRejected,
	/// The contract reverted, with the reason when the node supplied one.
	Reverted(Option<String>),
	/// Any other failure.
	Unknown(String),
}

impl TxOutcome {
	pub fn is_success(&self) -> bool {
		matches!(self, TxOutcome::Success(_))
	}

	/// Splits the outcome into the hash of a successful transaction or the
	/// transaction error describing why it did not succeed.
	pub fn into_result(self) -> Result<TxHash, TransactionError> {
		match self {
			TxOutcome::Success(hash) => Ok(hash),
			TxOutcome::UserRejected => Err(TransactionError::UserRejected),
			TxOutcome::Reverted(reason) => Err(TransactionError::Reverted(reason)),
			TxOutcome::Unknown(detail) => Err(TransactionError::Unknown(detail)),
		}
	}
}

impl From<TransactionError> for TxOutcome {
	fn from(err: TransactionError) -> Self {
		match err {
			TransactionError::UserRejected => TxOutcome::UserRejected,
			TransactionError::Reverted(reason) => TxOutcome::Reverted(reason),
			TransactionError::Unknown(detail) => TxOutcome::Unknown(detail),
		}
	}
}

impl fmt::Display for TxOutcome {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			TxOutcome::Success(hash) => write!(f, "Transaction {} confirmed", hash),
			TxOutcome::UserRejected => write!(f, "{}", TransactionError::UserRejected),
			TxOutcome::Reverted(reason) => {
				write!(f, "{}", TransactionError::Reverted(reason.clone()))
			}
			TxOutcome::Unknown(detail) => {
				write!(f, "{}", TransactionError::Unknown(detail.clone()))
			}
		}
	}
}
