//! Incoming transaction history from a tracing node.
//!
//! Fantom operates separate RPC endpoints with the `trace_filter` method
//! enabled. The client asks one of them for the calls made to an address
//! over a window of blocks and keeps only plain `call` frames.

use alloy::primitives::{Address, Bytes};
use registry_config::Network;
use registry_contracts::selectors::{function_name, Selector};
use registry_types::{ChainReader, RpcFailure};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

/// Look-back window used when the caller has no preference.
pub const DEFAULT_BLOCKS: u64 = 10_000;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Debug, Error)]
pub enum TracerError {
	#[error("Block window must cover at least one block")]
	InvalidBlocks,
	#[error("No tracing endpoint for network {0}")]
	Unavailable(Network),
	#[error("No address given")]
	EmptyAddress,
	#[error("Invalid address {0}")]
	InvalidAddress(String),
	#[error("Failed to read latest block: {0}")]
	Chain(RpcFailure),
	#[error("HTTP request failed: {0}")]
	Http(#[from] reqwest::Error),
	#[error("Tracer error {code}: {message}")]
	Rpc { code: i64, message: String },
	#[error("Malformed tracer response: {0}")]
	Malformed(String),
}

/// A call made to the traced address.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct IncomingTransaction {
	pub from: Address,
	pub to: Address,
	/// First four bytes of the calldata, absent for plain transfers.
	#[serde(with = "selector_hex")]
	pub function_selector: Option<Selector>,
	/// Registry function matching the selector, if any.
	pub function: Option<&'static str>,
}

mod selector_hex {
	use super::Selector;
	use serde::Serializer;

	pub fn serialize<S: Serializer>(selector: &Option<Selector>, s: S) -> Result<S::Ok, S::Error> {
		match selector {
			Some(selector) => s.serialize_str(&hex::encode(selector)),
			None => s.serialize_none(),
		}
	}
}

#[derive(Debug, Deserialize)]
struct TraceResponse {
	result: Option<Vec<Trace>>,
	error: Option<TraceErrorBody>,
}

#[derive(Debug, Deserialize)]
struct TraceErrorBody {
	code: Option<i64>,
	message: Option<String>,
}

#[derive(Debug, Deserialize)]
struct Trace {
	action: Option<TraceAction>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct TraceAction {
	call_type: Option<String>,
	from: Option<Address>,
	to: Option<Address>,
	input: Option<Bytes>,
}

/// Normalizes a user-supplied address to `0x`-prefixed lower case.
pub fn normalize_address(address: &str) -> Result<String, TracerError> {
	let trimmed = address.trim();
	if trimmed.is_empty() {
		return Err(TracerError::EmptyAddress);
	}

	let prefixed = if trimmed.starts_with("0x") {
		trimmed.to_lowercase()
	} else {
		format!("0x{}", trimmed.to_lowercase())
	};

	prefixed
		.parse::<Address>()
		.map_err(|_| TracerError::InvalidAddress(address.to_string()))?;
	Ok(prefixed)
}

/// Extracts the plain calls from a `trace_filter` response body.
pub fn parse_trace_response(body: serde_json::Value) -> Result<Vec<IncomingTransaction>, TracerError> {
	let response: TraceResponse =
		serde_json::from_value(body).map_err(|e| TracerError::Malformed(e.to_string()))?;

	if let Some(error) = response.error {
		return match (error.code, error.message) {
			(Some(code), Some(message)) => Err(TracerError::Rpc { code, message }),
			_ => Err(TracerError::Malformed("error without code or message".to_string())),
		};
	}

	let traces = response
		.result
		.ok_or_else(|| TracerError::Malformed("neither result nor error".to_string()))?;

	Ok(traces
		.into_iter()
		.filter_map(|trace| trace.action)
		.filter(|action| action.call_type.as_deref() == Some("call"))
		.filter_map(|action| {
			let function_selector = action
				.input
				.as_ref()
				.and_then(|input| input.get(..4))
				.map(|bytes| [bytes[0], bytes[1], bytes[2], bytes[3]]);
			Some(IncomingTransaction {
				from: action.from?,
				to: action.to?,
				function: function_selector.as_ref().and_then(function_name),
				function_selector,
			})
		})
		.collect())
}

/// Client for a network's tracing endpoint.
pub struct TracerClient {
	network: Network,
	url: Option<String>,
	http: reqwest::Client,
	read_only: Arc<dyn ChainReader>,
	request_id: AtomicU64,
}

impl TracerClient {
	/// Creates a client for the network's tracing endpoint.
	///
	/// `read_only` supplies the latest block when no start block is given.
	pub fn new(network: Network, read_only: Arc<dyn ChainReader>) -> Result<Self, TracerError> {
		let http = reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build()?;
		Ok(Self {
			network,
			url: network.tracer_url().map(str::to_string),
			http,
			read_only,
			request_id: AtomicU64::new(1),
		})
	}

	/// Points the client at another tracing endpoint.
	pub fn with_url(mut self, url: impl Into<String>) -> Self {
		self.url = Some(url.into());
		self
	}

	/// Returns the calls made to `to` in `blocks` blocks starting at
	/// `from_block`, or ending at the latest block when no start is given.
	pub async fn incoming_transactions(
		&self,
		to: &str,
		blocks: u64,
		from_block: Option<u64>,
	) -> Result<Vec<IncomingTransaction>, TracerError> {
		if blocks < 1 {
			return Err(TracerError::InvalidBlocks);
		}
		let url = self
			.url
			.as_deref()
			.ok_or(TracerError::Unavailable(self.network))?;
		let to = normalize_address(to)?;

		let from_block = match from_block {
			Some(block) => block,
			None => self
				.read_only
				.block_number()
				.await
				.map_err(TracerError::Chain)?
				.saturating_sub(blocks),
		};
		let to_block = from_block.saturating_add(blocks);

		let id = self.request_id.fetch_add(1, Ordering::SeqCst);
		let request = json!({
			"method": "trace_filter",
			"params": [{
				"fromBlock": format!("0x{:x}", from_block),
				"toBlock": format!("0x{:x}", to_block),
				"toAddress": [to],
			}],
			"id": id,
			"jsonrpc": "2.0",
		});

		tracing::debug!(%to, from_block, to_block, "Querying tracer");
		let response = self.http.post(url).json(&request).send().await?;
		let body: serde_json::Value = response.json().await?;

		let transactions = parse_trace_response(body)?;
		tracing::debug!(count = transactions.len(), "Tracer returned incoming calls");
		Ok(transactions)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use alloy::primitives::address;
	use async_trait::async_trait;

	struct FixedBlock(u64);

	#[async_trait]
	impl ChainReader for FixedBlock {
		async fn get_code(&self, _address: Address) -> Result<Bytes, RpcFailure> {
			Ok(Bytes::new())
		}

		async fn call(&self, _to: Address, _input: Bytes) -> Result<Bytes, RpcFailure> {
			Ok(Bytes::new())
		}

		async fn block_number(&self) -> Result<u64, RpcFailure> {
			Ok(self.0)
		}
	}

	fn client(network: Network) -> TracerClient {
		TracerClient::new(network, Arc::new(FixedBlock(50_000))).unwrap()
	}

	#[test]
	fn test_normalize_address() {
		assert_eq!(
			normalize_address("ABCDEF0123456789abcdef0123456789ABCDEF01").unwrap(),
			"0xabcdef0123456789abcdef0123456789abcdef01"
		);
		assert!(matches!(normalize_address("  "), Err(TracerError::EmptyAddress)));
		assert!(matches!(
			normalize_address("0x1234"),
			Err(TracerError::InvalidAddress(_))
		));
	}

	#[test]
	fn test_parse_keeps_plain_calls() {
		let body = json!({
			"jsonrpc": "2.0",
			"id": 1,
			"result": [
				{
					"action": {
						"callType": "call",
						"from": "0x00000000000000000000000000000000000000aa",
						"to": "0x00000000000000000000000000000000000000bb",
						"input": "0xb6a46b3b0000000000000000000000000000000000000000000000000000000000000020",
						"value": "0x0"
					},
					"type": "call"
				},
				{
					"action": {
						"callType": "delegatecall",
						"from": "0x00000000000000000000000000000000000000aa",
						"to": "0x00000000000000000000000000000000000000bb",
						"input": "0x"
					},
					"type": "call"
				},
				{
					"action": {
						"from": "0x00000000000000000000000000000000000000aa",
						"init": "0x6080",
						"value": "0x0"
					},
					"type": "create"
				},
				{
					"action": {
						"callType": "call",
						"from": "0x00000000000000000000000000000000000000cc",
						"to": "0x00000000000000000000000000000000000000bb",
						"input": "0x"
					},
					"type": "call"
				}
			]
		});

		let transactions = parse_trace_response(body).unwrap();
		assert_eq!(transactions.len(), 2);
		assert_eq!(transactions[0].from, address!("00000000000000000000000000000000000000aa"));
		assert_eq!(transactions[0].to, address!("00000000000000000000000000000000000000bb"));
		assert_eq!(transactions[0].function_selector, Some([0xb6, 0xa4, 0x6b, 0x3b]));
		assert_eq!(transactions[1].from, address!("00000000000000000000000000000000000000cc"));
		assert_eq!(transactions[1].function_selector, None);
		assert_eq!(transactions[1].function, None);
	}

	#[test]
	fn test_parse_labels_registry_functions() {
		let selector = registry_contracts::selectors::selector("invalidateRecord(bytes32)");
		let body = json!({
			"result": [{
				"action": {
					"callType": "call",
					"from": "0x00000000000000000000000000000000000000aa",
					"to": "0x00000000000000000000000000000000000000bb",
					"input": format!("0x{}{}", hex::encode(selector), "00".repeat(32))
				}
			}]
		});

		let transactions = parse_trace_response(body).unwrap();
		assert_eq!(transactions[0].function, Some("invalidateRecord(bytes32)"));
		let serialized = serde_json::to_value(&transactions[0]).unwrap();
		assert_eq!(serialized["functionSelector"], hex::encode(selector));
	}

	#[test]
	fn test_parse_rpc_error() {
		let body = json!({
			"jsonrpc": "2.0",
			"id": 3,
			"error": { "code": -32000, "message": "block range too large" }
		});
		match parse_trace_response(body) {
			Err(TracerError::Rpc { code, message }) => {
				assert_eq!(code, -32000);
				assert_eq!(message, "block range too large");
			}
			other => panic!("unexpected: {:?}", other),
		}
	}

	#[test]
	fn test_parse_incomplete_responses() {
		assert!(matches!(
			parse_trace_response(json!({ "error": { "message": "no code" } })),
			Err(TracerError::Malformed(_))
		));
		assert!(matches!(
			parse_trace_response(json!({ "jsonrpc": "2.0", "id": 1 })),
			Err(TracerError::Malformed(_))
		));
	}

	#[tokio::test]
	async fn test_zero_blocks_rejected() {
		let result = client(Network::Testnet)
			.incoming_transactions("0x00000000000000000000000000000000000000bb", 0, None)
			.await;
		assert!(matches!(result, Err(TracerError::InvalidBlocks)));
	}

	#[tokio::test]
	async fn test_fakenet_has_no_tracer() {
		let result = client(Network::Fakenet)
			.incoming_transactions("0x00000000000000000000000000000000000000bb", DEFAULT_BLOCKS, None)
			.await;
		assert!(matches!(result, Err(TracerError::Unavailable(Network::Fakenet))));
	}

	#[tokio::test]
	async fn test_empty_address_rejected() {
		let result = client(Network::Mainnet)
			.incoming_transactions("", DEFAULT_BLOCKS, None)
			.await;
		assert!(matches!(result, Err(TracerError::EmptyAddress)));
	}
}
