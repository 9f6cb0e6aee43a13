//! Transaction submission and outcome classification.
//!
//! The executor sends a prepared [`ContractCall`] through the connected
//! signer, waits for it to be mined and reduces everything that can happen
//! along the way to a [`TxOutcome`]. Failures are classified, logged and
//! returned; nothing is retried.

use alloy::sol_types::{decode_revert_reason, Revert, SolError};
use registry_account::ProviderManager;
use registry_types::{ChainSigner, ConnectionError, ContractCall, RpcFailure, TxOutcome};
use tracing::{info, warn};

/// EIP-1193 code for a request the user declined.
pub const USER_REJECTED: i64 = 4001;

/// JSON-RPC code nodes use for reverted execution.
pub const EXECUTION_REVERTED: i64 = 3;

const ACTION_REJECTED: &str = "ACTION_REJECTED";
const REVERTED_MESSAGE: &str = "execution reverted";

/// Maps a wallet or node failure to a transaction outcome.
///
/// - user rejection (code 4001 or an `ACTION_REJECTED` marker) is
///   [`TxOutcome::UserRejected`];
/// - reverted execution is [`TxOutcome::Reverted`] with the decoded reason
///   when one is available;
/// - anything else is [`TxOutcome::Unknown`] carrying the raw message.
pub fn classify(failure: &RpcFailure) -> TxOutcome {
	if failure.is_code(USER_REJECTED) || failure.message.contains(ACTION_REJECTED) {
		return TxOutcome::UserRejected;
	}

	if failure.is_code(EXECUTION_REVERTED) || failure.message.contains(REVERTED_MESSAGE) {
		return TxOutcome::Reverted(revert_reason(failure));
	}

	TxOutcome::Unknown(failure.message.clone())
}

fn revert_reason(failure: &RpcFailure) -> Option<String> {
	if let Some(data) = failure.data.as_ref().filter(|data| !data.is_empty()) {
		if let Ok(revert) = Revert::abi_decode(data) {
			return Some(revert.reason);
		}
		if let Some(reason) = decode_revert_reason(data) {
			return Some(reason);
		}
	}

	// Nodes without error data put the reason after the marker
	let (_, rest) = failure.message.split_once(REVERTED_MESSAGE)?;
	let reason = rest.trim_start_matches(':').trim();
	(!reason.is_empty()).then(|| reason.to_string())
}

/// Submits contract calls and reports their outcome.
#[derive(Debug, Default, Clone, Copy)]
pub struct TransactionExecutor;

impl TransactionExecutor {
	pub fn new() -> Self {
		Self
	}

	/// Submits `call` through the provider's connected signer.
	///
	/// Fails only if no wallet is connected; every other failure is part of
	/// the returned outcome.
	pub async fn submit(
		&self,
		provider: &ProviderManager,
		call: &ContractCall,
	) -> Result<TxOutcome, ConnectionError> {
		let signer = provider.signer()?;
		Ok(self.submit_with(signer.as_ref(), call).await)
	}

	/// Submits `call` through `signer` and waits for confirmation.
	pub async fn submit_with(&self, signer: &dyn ChainSigner, call: &ContractCall) -> TxOutcome {
		let outcome = match signer.send_transaction(call).await {
			Ok(hash) => match signer.wait_for_confirmation(hash).await {
				Ok(receipt) if receipt.success => TxOutcome::Success(receipt.hash),
				Ok(_) => TxOutcome::Reverted(None),
				Err(failure) => classify(&failure),
			},
			Err(failure) => classify(&failure),
		};

		match &outcome {
			TxOutcome::Success(hash) => {
				info!(function = call.function, to = %call.to, tx_hash = %hash, "Transaction confirmed")
			}
			other => warn!(function = call.function, to = %call.to, "{}", other),
		}

		outcome
	}
}
