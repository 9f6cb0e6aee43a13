//! Command-line interface definitions.

use alloy::primitives::{Address, B256, U256};
use clap::{Args as ClapArgs, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "registry-cli")]
#[command(about = "Client for the on-chain document registry", long_about = None)]
#[command(version = env!("CARGO_PKG_VERSION"))]
pub struct Args {
	/// Path to configuration file
	#[arg(short, long, env = "REGISTRY_CONFIG", default_value = "config/registry.toml")]
	pub config: PathBuf,

	/// Log level (trace, debug, info, warn, error)
	#[arg(short, long, env = "REGISTRY_LOG_LEVEL", default_value = "info")]
	pub log_level: String,

	/// Print results as JSON
	#[arg(long, global = true)]
	pub json: bool,

	#[command(subcommand)]
	pub command: Command,
}

/// A document, given by its hash or by the file to hash.
#[derive(ClapArgs, Debug)]
#[group(required = true, multiple = false)]
pub struct DocumentArg {
	/// SHA-256 hash of the document
	#[arg(long)]
	pub hash: Option<B256>,

	/// Document file; its SHA-256 hash is used
	#[arg(long)]
	pub file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Classify the contract at an address by its bytecode
	Resolve { address: Address },

	/// Find an organisation or register anchored in the factory
	Search {
		address: Address,

		/// Accept organisations not deployed by the configured factory
		#[arg(long)]
		unofficial: bool,
	},

	/// List the registers of an official organisation
	Registers { organisation: Address },

	/// List the organisations deployed for an owner
	Organisations {
		#[arg(long)]
		owner: Address,
	},

	/// Show the record of a document in a register
	Record {
		register: Address,

		#[command(flatten)]
		document: DocumentArg,
	},

	/// Show the roles an account holds on a register
	Permissions {
		register: Address,

		/// Account to check; defaults to the connected wallet
		#[arg(long)]
		account: Option<Address>,
	},

	/// Show the factory's deployment fees
	Fees,

	/// Print the document hash of a file
	HashFile { path: PathBuf },

	/// List recent calls made to an address
	History {
		address: String,

		/// Number of blocks to scan
		#[arg(long)]
		blocks: Option<u64>,

		/// First block to scan; defaults to the latest block minus the window
		#[arg(long)]
		from_block: Option<u64>,
	},

	/// Deploy an organisation through the factory
	DeployOrganisation {
		metadata: String,

		/// Owner of the new organisation; defaults to the connected wallet
		#[arg(long)]
		owner: Option<Address>,
	},

	/// Deploy a register under an organisation
	DeployRegister { organisation: Address, metadata: String },

	/// Create a record in a register
	CreateRecord {
		register: Address,

		#[command(flatten)]
		document: DocumentArg,

		/// Location of the source document
		#[arg(long, default_value = "")]
		source: String,

		/// Location of a reference document
		#[arg(long, default_value = "")]
		reference: String,

		/// Validity start as a unix timestamp; defaults to now
		#[arg(long)]
		starts_at: Option<u64>,

		/// Validity end as a unix timestamp; 0 for none
		#[arg(long, default_value_t = 0)]
		expires_at: u64,

		/// Hash of the record this one supersedes
		#[arg(long)]
		past_hash: Option<B256>,
	},

	/// Invalidate a record in a register
	InvalidateRecord {
		register: Address,

		#[command(flatten)]
		document: DocumentArg,
	},

	/// Replace an organisation's metadata
	EditOrganisation { organisation: Address, metadata: String },

	/// Replace a register's metadata
	EditRegister { register: Address, metadata: String },

	/// Set the factory's deployment fees, in wei
	SetFees {
		organisation_fee: U256,
		register_fee: U256,
		record_fee: U256,
	},
}
