//! In-memory chain answering the registry interfaces, for tests.

use crate::abi::{IOrganisation, IOrganisationFactory, IRegister};
use crate::selectors::probe_selectors;
use alloy::primitives::{Address, Bytes, B256, U256};
use alloy::sol_types::{SolCall, SolValue};
use async_trait::async_trait;
use registry_types::{ChainReader, ContractKind, Record, RpcFailure, Role};
use std::collections::{HashMap, HashSet};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

#[derive(Default)]
struct FactoryState {
	organisations: HashSet<Address>,
	by_owner: HashMap<Address, Vec<Address>>,
	fees: [U256; 3],
}

struct OrganisationState {
	owner: Address,
	metadata: String,
	registers: Vec<Address>,
}

struct RegisterState {
	organisation: Address,
	metadata: String,
	records: HashMap<B256, Record>,
	roles: HashSet<(B256, Address)>,
}

#[derive(Default)]
struct ChainState {
	code: HashMap<Address, Bytes>,
	factories: HashMap<Address, FactoryState>,
	organisations: HashMap<Address, OrganisationState>,
	registers: HashMap<Address, RegisterState>,
	failing: HashSet<Address>,
}

#[derive(Default)]
pub struct SimulatedChain {
	state: Mutex<ChainState>,
	calls: AtomicUsize,
}

fn revert() -> RpcFailure {
	RpcFailure::new(3, "execution reverted")
}

impl SimulatedChain {
	pub fn new() -> Self {
		Self::default()
	}

	/// Builds contract-like bytecode embedding the probe selectors of `kinds`.
	pub fn bytecode(kinds: &[ContractKind]) -> Bytes {
		let mut code = vec![0x60, 0x80, 0x60, 0x40, 0x52];
		for kind in kinds {
			for selector in probe_selectors(*kind) {
				code.push(0x63);
				code.extend_from_slice(selector);
				code.extend_from_slice(&[0x14, 0x61, 0x00, 0x00, 0x57]);
			}
		}
		code.push(0xfe);
		code.into()
	}

	pub fn set_code(&self, address: Address, code: Bytes) {
		self.state.lock().unwrap().code.insert(address, code);
	}

	pub fn deploy_factory(&self, address: Address) {
		let mut state = self.state.lock().unwrap();
		state
			.code
			.insert(address, Self::bytecode(&[ContractKind::Factory]));
		state.factories.insert(address, FactoryState::default());
	}

	/// Deploys an organisation, registered with `factory` when given.
	pub fn deploy_organisation(&self, address: Address, owner: Address, factory: Option<Address>) {
		let mut state = self.state.lock().unwrap();
		state
			.code
			.insert(address, Self::bytecode(&[ContractKind::Organisation]));
		state.organisations.insert(
			address,
			OrganisationState {
				owner,
				metadata: format!("organisation {}", address),
				registers: Vec::new(),
			},
		);
		if let Some(factory) = factory.and_then(|f| state.factories.get_mut(&f)) {
			factory.organisations.insert(address);
			factory.by_owner.entry(owner).or_default().push(address);
		}
	}

	/// Deploys a register claiming `organisation` as parent; `listed` controls
	/// whether the parent actually lists it.
	pub fn deploy_register(&self, address: Address, organisation: Address, listed: bool) {
		let mut state = self.state.lock().unwrap();
		state
			.code
			.insert(address, Self::bytecode(&[ContractKind::Register]));
		state.registers.insert(
			address,
			RegisterState {
				organisation,
				metadata: format!("register {}", address),
				records: HashMap::new(),
				roles: HashSet::new(),
			},
		);
		if listed {
			if let Some(org) = state.organisations.get_mut(&organisation) {
				org.registers.push(address);
			}
		}
	}

	pub fn set_fees(&self, factory: Address, fees: [U256; 3]) {
		if let Some(state) = self.state.lock().unwrap().factories.get_mut(&factory) {
			state.fees = fees;
		}
	}

	pub fn add_record(&self, register: Address, record: Record) {
		if let Some(state) = self.state.lock().unwrap().registers.get_mut(&register) {
			state.records.insert(record.document_hash, record);
		}
	}

	pub fn grant_role(&self, register: Address, role: Role, account: Address) {
		if let Some(state) = self.state.lock().unwrap().registers.get_mut(&register) {
			state.roles.insert((role.id(), account));
		}
	}

	/// Makes every request touching `address` fail at the transport level.
	pub fn fail_address(&self, address: Address) {
		self.state.lock().unwrap().failing.insert(address);
	}

	/// Number of `eth_call` requests served so far.
	pub fn call_count(&self) -> usize {
		self.calls.load(Ordering::SeqCst)
	}

	fn dispatch(state: &ChainState, to: Address, input: &[u8]) -> Result<Vec<u8>, RpcFailure> {
		if input.len() < 4 {
			return Err(revert());
		}
		let selector: [u8; 4] = [input[0], input[1], input[2], input[3]];

		if let Some(factory) = state.factories.get(&to) {
			return match selector {
				s if s == IOrganisationFactory::organisationsCall::SELECTOR => {
					let call = IOrganisationFactory::organisationsCall::abi_decode(input)
						.map_err(|_| revert())?;
					Ok((factory.organisations.contains(&call.organisation),).abi_encode_params())
				}
				s if s == IOrganisationFactory::organisationsOfOwnerCall::SELECTOR => {
					let call = IOrganisationFactory::organisationsOfOwnerCall::abi_decode(input)
						.map_err(|_| revert())?;
					let index = usize::try_from(call.id).map_err(|_| revert())?;
					factory
						.by_owner
						.get(&call.owner)
						.and_then(|list| list.get(index))
						.map(|org| (*org,).abi_encode_params())
						.ok_or_else(revert)
				}
				s if s == IOrganisationFactory::organisationDeploymentFeeCall::SELECTOR => {
					Ok((factory.fees[0],).abi_encode_params())
				}
				s if s == IOrganisationFactory::registerDeploymentFeeCall::SELECTOR => {
					Ok((factory.fees[1],).abi_encode_params())
				}
				s if s == IOrganisationFactory::recordDeploymentFeeCall::SELECTOR => {
					Ok((factory.fees[2],).abi_encode_params())
				}
				_ => Err(revert()),
			};
		}

		if let Some(org) = state.organisations.get(&to) {
			return match selector {
				s if s == IOrganisation::registersCall::SELECTOR => {
					let call = IOrganisation::registersCall::abi_decode(input).map_err(|_| revert())?;
					let index = usize::try_from(call.id).map_err(|_| revert())?;
					org.registers
						.get(index)
						.map(|register| (*register,).abi_encode_params())
						.ok_or_else(revert)
				}
				s if s == IOrganisation::metadataCall::SELECTOR => Ok((org.metadata.clone(),).abi_encode_params()),
				s if s == IOrganisation::ownerCall::SELECTOR => Ok((org.owner,).abi_encode_params()),
				_ => Err(revert()),
			};
		}

		if let Some(register) = state.registers.get(&to) {
			return match selector {
				s if s == IRegister::organisationCall::SELECTOR => {
					Ok((register.organisation,).abi_encode_params())
				}
				s if s == IRegister::metadataCall::SELECTOR => {
					Ok((register.metadata.clone(),).abi_encode_params())
				}
				s if s == IRegister::recordsCall::SELECTOR => {
					let call = IRegister::recordsCall::abi_decode(input).map_err(|_| revert())?;
					let record = register.records.get(&call.id).cloned().unwrap_or(Record {
						document_hash: B256::ZERO,
						creator: Address::ZERO,
						updater: Address::ZERO,
						source_document: String::new(),
						reference_document: String::new(),
						created_at: U256::ZERO,
						updated_at: U256::ZERO,
						starts_at: U256::ZERO,
						expires_at: U256::ZERO,
						past_document_hash: B256::ZERO,
						next_document_hash: B256::ZERO,
					});
					Ok((
						record.document_hash,
						record.creator,
						record.updater,
						record.source_document,
						record.reference_document,
						record.created_at,
						record.updated_at,
						record.starts_at,
						record.expires_at,
						record.past_document_hash,
						record.next_document_hash,
					)
						.abi_encode_params())
				}
				s if s == IRegister::hasRoleCall::SELECTOR => {
					let call = IRegister::hasRoleCall::abi_decode(input).map_err(|_| revert())?;
					Ok((register.roles.contains(&(call.role, call.account)),).abi_encode_params())
				}
				_ => Err(revert()),
			};
		}

		// Calls to accounts without code succeed with empty output
		Ok(Vec::new())
	}
}

#[async_trait]
impl ChainReader for SimulatedChain {
	async fn get_code(&self, address: Address) -> Result<Bytes, RpcFailure> {
		let state = self.state.lock().unwrap();
		if state.failing.contains(&address) {
			return Err(RpcFailure::transport("connection reset"));
		}
		Ok(state.code.get(&address).cloned().unwrap_or_default())
	}

	async fn call(&self, to: Address, input: Bytes) -> Result<Bytes, RpcFailure> {
		self.calls.fetch_add(1, Ordering::SeqCst);
		let state = self.state.lock().unwrap();
		if state.failing.contains(&to) {
			return Err(RpcFailure::transport("connection reset"));
		}
		Self::dispatch(&state, to, &input).map(Bytes::from)
	}

	async fn block_number(&self) -> Result<u64, RpcFailure> {
		Ok(1)
	}
}
