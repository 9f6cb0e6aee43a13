use alloy::primitives::{Address, B256, U256};
use anyhow::{bail, Context, Result};
use clap::Parser;
use futures::StreamExt;
use registry_account::ConnectionStatus;
use registry_contracts::{DeploymentFees, NewRecord, SearchResult};
use registry_core::{hash_file, RegistryClient, RegistryClientBuilder};
use registry_types::{ContractCall, Record};
use serde_json::{json, Value};
use std::path::Path;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod cli;

use cli::{Args, Command, DocumentArg};

/// Result of a command, rendered as text or JSON.
struct Report {
	json: Value,
	text: String,
}

impl Report {
	fn new(json: Value, text: impl Into<String>) -> Self {
		Self {
			json,
			text: text.into(),
		}
	}

	fn print(&self, as_json: bool) -> Result<()> {
		if as_json {
			println!("{}", serde_json::to_string_pretty(&self.json)?);
		} else {
			println!("{}", self.text);
		}
		Ok(())
	}
}

#[tokio::main]
async fn main() -> Result<()> {
	let args = Args::parse();

	setup_tracing(&args.log_level)?;

	// Hashing needs neither configuration nor a node
	if let Command::HashFile { path } = &args.command {
		return hash_report(path).await?.print(args.json);
	}

	info!("Loading configuration from: {:?}", args.config);
	let mut client = RegistryClientBuilder::new()
		.with_config_file(args.config.to_string_lossy())
		.build()
		.await
		.context("Failed to build registry client")?;

	let report = run(&mut client, args.command).await?;
	report.print(args.json)
}

fn setup_tracing(log_level: &str) -> Result<()> {
	let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
		.unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(log_level));

	tracing_subscriber::registry()
		.with(env_filter)
		.with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
		.init();

	Ok(())
}

async fn run(client: &mut RegistryClient, command: Command) -> Result<Report> {
	match command {
		Command::Resolve { address } => {
			let kind = client.resolve(address).await;
			let text = match kind {
				Some(kind) => format!("{} is a {}", address, kind),
				None => format!("{} is not a registry contract", address),
			};
			Ok(Report::new(json!({ "address": address, "kind": kind }), text))
		}

		Command::Search {
			address,
			unofficial,
		} => {
			let result = client.search(address, !unofficial).await?;
			Ok(match result {
				SearchResult::Found(handle) => Report::new(
					json!({ "found": true, "address": address, "kind": handle.kind() }),
					format!("Found {}", handle),
				),
				SearchResult::NotFound => Report::new(
					json!({ "found": false, "address": address }),
					format!("No verified organisation or register at {}", address),
				),
			})
		}

		Command::Registers { organisation } => {
			let organisation = client.organisation(organisation).await?;
			let registers: Vec<Address> = organisation.registers().collect().await;
			let text = lines(&registers, "No registers");
			Ok(Report::new(json!(registers), text))
		}

		Command::Organisations { owner } => {
			let factory = client.factory().await?;
			let organisations: Vec<Address> = factory
				.organisations_of_owner(owner)
				.map(|handle| handle.address())
				.collect()
				.await;
			let text = lines(&organisations, "No organisations");
			Ok(Report::new(json!(organisations), text))
		}

		Command::Record { register, document } => {
			let hash = document_hash(&document).await?;
			let record = client.register(register).await?.record(hash).await?;
			if !record.exists() {
				return Ok(Report::new(
					Value::Null,
					format!("No record for {} in {}", hash, register),
				));
			}
			Ok(Report::new(serde_json::to_value(&record)?, describe_record(&record)))
		}

		Command::Permissions { register, account } => {
			let account = match account {
				Some(account) => account,
				None => connected_account(client).await?,
			};
			let permissions = client.register(register).await?.permissions(account).await?;
			let text = format!(
				"{} on {}\n  record creator:     {}\n  record invalidator: {}\n  register editor:    {}",
				account,
				register,
				permissions.record_creator,
				permissions.record_invalidator,
				permissions.register_editor
			);
			Ok(Report::new(serde_json::to_value(permissions)?, text))
		}

		Command::Fees => {
			let fees = client.factory().await?.deployment_fees().await?;
			let text = format!(
				"organisation: {} wei\nregister:     {} wei\nrecord:       {} wei",
				fees.organisation_deployment_fee,
				fees.register_deployment_fee,
				fees.record_deployment_fee
			);
			Ok(Report::new(serde_json::to_value(fees)?, text))
		}

		Command::HashFile { path } => hash_report(&path).await,

		Command::History {
			address,
			blocks,
			from_block,
		} => {
			let transactions = client
				.incoming_transactions(&address, blocks, from_block)
				.await?;
			let text = if transactions.is_empty() {
				"No incoming transactions".to_string()
			} else {
				transactions
					.iter()
					.map(|tx| {
						format!(
							"{} -> {} {}",
							tx.from,
							tx.to,
							tx.function.unwrap_or("(unknown function)")
						)
					})
					.collect::<Vec<_>>()
					.join("\n")
			};
			Ok(Report::new(serde_json::to_value(&transactions)?, text))
		}

		Command::DeployOrganisation { metadata, owner } => {
			let signer = connected_account(client).await?;
			let call = client
				.factory()
				.await?
				.deploy_organisation(metadata, owner.unwrap_or(signer));
			submit(client, call).await
		}

		Command::DeployRegister {
			organisation,
			metadata,
		} => {
			connected_account(client).await?;
			let call = client.organisation(organisation).await?.deploy_register(metadata);
			submit(client, call).await
		}

		Command::CreateRecord {
			register,
			document,
			source,
			reference,
			starts_at,
			expires_at,
			past_hash,
		} => {
			connected_account(client).await?;
			let document_hash = document_hash(&document).await?;
			let starts_at = starts_at.unwrap_or_else(|| chrono::Utc::now().timestamp().max(0) as u64);
			let call = client.register(register).await?.create_record(NewRecord {
				document_hash,
				source_document: source,
				reference_document: reference,
				starts_at: U256::from(starts_at),
				expires_at: U256::from(expires_at),
				past_document_hash: past_hash.unwrap_or(B256::ZERO),
			});
			submit(client, call).await
		}

		Command::InvalidateRecord { register, document } => {
			connected_account(client).await?;
			let hash = document_hash(&document).await?;
			let call = client.register(register).await?.invalidate_record(hash);
			submit(client, call).await
		}

		Command::EditOrganisation {
			organisation,
			metadata,
		} => {
			connected_account(client).await?;
			let call = client.organisation(organisation).await?.edit_metadata(metadata);
			submit(client, call).await
		}

		Command::EditRegister { register, metadata } => {
			connected_account(client).await?;
			let call = client.register(register).await?.edit_metadata(metadata);
			submit(client, call).await
		}

		Command::SetFees {
			organisation_fee,
			register_fee,
			record_fee,
		} => {
			connected_account(client).await?;
			let call = client.factory().await?.set_fees(DeploymentFees {
				organisation_deployment_fee: organisation_fee,
				register_deployment_fee: register_fee,
				record_deployment_fee: record_fee,
			});
			submit(client, call).await
		}
	}
}

/// Connects the configured wallet and returns its account.
async fn connected_account(client: &mut RegistryClient) -> Result<Address> {
	match client.connect().await.context("Failed to connect wallet")? {
		ConnectionStatus::Connected(account) => Ok(account),
		ConnectionStatus::NoWallet => bail!("No wallet configured; add a [wallet] section to the configuration"),
	}
}

async fn submit(client: &RegistryClient, call: ContractCall) -> Result<Report> {
	let function = call.function;
	let outcome = client.submit(&call).await?;
	let hash = outcome
		.into_result()
		.with_context(|| format!("{} failed", function))?;
	Ok(Report::new(
		json!({ "function": function, "to": call.to, "transactionHash": hash }),
		format!("{} confirmed in {}", function, hash),
	))
}

async fn hash_report(path: &Path) -> Result<Report> {
	let hash = hash_file(path)
		.await
		.with_context(|| format!("Failed to hash {}", path.display()))?;
	Ok(Report::new(json!({ "documentHash": hash }), hash.to_string()))
}

async fn document_hash(document: &DocumentArg) -> Result<B256> {
	match (&document.hash, &document.file) {
		(Some(hash), _) => Ok(*hash),
		(None, Some(path)) => hash_file(path)
			.await
			.with_context(|| format!("Failed to hash {}", path.display())),
		(None, None) => bail!("Either --hash or --file is required"),
	}
}

fn lines(addresses: &[Address], empty: &str) -> String {
	if addresses.is_empty() {
		empty.to_string()
	} else {
		addresses
			.iter()
			.map(Address::to_string)
			.collect::<Vec<_>>()
			.join("\n")
	}
}

fn format_timestamp(timestamp: U256) -> String {
	if timestamp.is_zero() {
		return "-".to_string();
	}
	u64::try_from(timestamp)
		.ok()
		.and_then(|secs| i64::try_from(secs).ok())
		.and_then(|secs| chrono::DateTime::from_timestamp(secs, 0))
		.map(|time| time.to_rfc3339())
		.unwrap_or_else(|| timestamp.to_string())
}

fn describe_record(record: &Record) -> String {
	let mut text = format!(
		"document:   {}\ncreator:    {}\nupdater:    {}\nsource:     {}\nreference:  {}\ncreated:    {}\nupdated:    {}\nvalid from: {}\nexpires:    {}",
		record.document_hash,
		record.creator,
		record.updater,
		record.source_document,
		record.reference_document,
		format_timestamp(record.created_at),
		format_timestamp(record.updated_at),
		format_timestamp(record.starts_at),
		format_timestamp(record.expires_at),
	);
	if !record.past_document_hash.is_zero() {
		text.push_str(&format!("\nsupersedes: {}", record.past_document_hash));
	}
	if !record.next_document_hash.is_zero() {
		text.push_str(&format!("\nsuperseded by: {}", record.next_document_hash));
	}
	text
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_format_timestamp() {
		assert_eq!(format_timestamp(U256::ZERO), "-");
		assert_eq!(
			format_timestamp(U256::from(1_700_000_000u64)),
			"2023-11-14T22:13:20+00:00"
		);
		assert_eq!(format_timestamp(U256::MAX), U256::MAX.to_string());
	}

	#[test]
	fn test_cli_parses_document_argument() {
		let args = Args::try_parse_from([
			"registry-cli",
			"record",
			"0x0000000000000000000000000000000000000011",
			"--hash",
			"0xba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
		])
		.unwrap();
		assert!(matches!(args.command, Command::Record { .. }));

		// Hash and file are mutually exclusive, and one is required
		assert!(Args::try_parse_from([
			"registry-cli",
			"record",
			"0x0000000000000000000000000000000000000011",
		])
		.is_err());
		assert!(Args::try_parse_from([
			"registry-cli",
			"invalidate-record",
			"0x0000000000000000000000000000000000000011",
			"--hash",
			"0xba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad",
			"--file",
			"doc.pdf",
		])
		.is_err());
	}

	#[test]
	fn test_cli_search_flags() {
		let args = Args::try_parse_from([
			"registry-cli",
			"--json",
			"search",
			"0x0000000000000000000000000000000000000011",
			"--unofficial",
		])
		.unwrap();
		assert!(args.json);
		assert!(matches!(args.command, Command::Search { unofficial: true, .. }));
	}
}
