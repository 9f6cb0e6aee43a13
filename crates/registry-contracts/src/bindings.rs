//! Typed bindings over verified contract handles.
//!
//! Reads go through whichever [`ChainReader`] the binding was created with
//! (normally the provider manager's routing policy). Writes are not sent
//! from here: they are returned as [`ContractCall`]s for the transaction
//! executor to submit.

use crate::abi::{IOrganisation, IOrganisationFactory, IRegister};
use crate::handle::ContractHandle;
use crate::pagination::enumerate;
use alloy::primitives::{Address, B256, U256};
use alloy::sol_types::SolCall;
use futures::stream::{BoxStream, StreamExt};
use registry_types::{ChainReader, ContractCall, ContractKind, Record, RegistryError, Role};
use serde::Serialize;
use std::sync::Arc;

/// Performs a read-only call and decodes its return value.
pub(crate) async fn read<C: SolCall>(
	reader: &dyn ChainReader,
	to: Address,
	call: C,
) -> Result<C::Return, RegistryError> {
	let output = reader
		.call(to, call.abi_encode().into())
		.await
		.map_err(|failure| RegistryError::call(C::SIGNATURE, failure))?;
	C::abi_decode_returns(&output).map_err(|e| RegistryError::decode(C::SIGNATURE, e))
}

fn write<C: SolCall>(to: Address, call: C) -> ContractCall {
	ContractCall::new(to, call.abi_encode(), C::SIGNATURE)
}

fn expect_kind(handle: ContractHandle, expected: ContractKind) -> Result<ContractHandle, RegistryError> {
	if handle.kind() == expected {
		Ok(handle)
	} else {
		Err(RegistryError::Verification {
			address: handle.address(),
			expected,
		})
	}
}

/// Fees charged by the factory, in wei.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DeploymentFees {
	pub organisation_deployment_fee: U256,
	pub register_deployment_fee: U256,
	pub record_deployment_fee: U256,
}

/// Roles an account holds on a register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterPermissions {
	pub record_creator: bool,
	pub record_invalidator: bool,
	pub register_editor: bool,
}

impl RegisterPermissions {
	pub fn has(&self, role: Role) -> bool {
		match role {
			Role::RecordCreator => self.record_creator,
			Role::RecordInvalidator => self.record_invalidator,
			Role::RegisterEditor => self.register_editor,
		}
	}
}

/// Arguments of `createRecord`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewRecord {
	pub document_hash: B256,
	pub source_document: String,
	pub reference_document: String,
	pub starts_at: U256,
	pub expires_at: U256,
	/// Hash of the record this one supersedes, zero for none.
	pub past_document_hash: B256,
}

pub struct FactoryContract {
	handle: ContractHandle,
	reader: Arc<dyn ChainReader>,
}

impl FactoryContract {
	pub fn new(handle: ContractHandle, reader: Arc<dyn ChainReader>) -> Result<Self, RegistryError> {
		Ok(Self {
			handle: expect_kind(handle, ContractKind::Factory)?,
			reader,
		})
	}

	pub fn handle(&self) -> ContractHandle {
		self.handle
	}

	pub fn address(&self) -> Address {
		self.handle.address()
	}

	/// Returns true if the factory lists `organisation` as one of its own.
	pub async fn is_organisation(&self, organisation: Address) -> Result<bool, RegistryError> {
		read(
			self.reader.as_ref(),
			self.address(),
			IOrganisationFactory::organisationsCall { organisation },
		)
		.await
	}

	/// Organisations deployed for `owner`, in deployment order.
	///
	/// They are listed by this factory, so they come out as organisation
	/// handles without a bytecode check.
	pub fn organisations_of_owner(&self, owner: Address) -> BoxStream<'static, ContractHandle> {
		let reader = self.reader.clone();
		let factory = self.address();
		enumerate(move |index| {
			let reader = reader.clone();
			async move {
				read(
					reader.as_ref(),
					factory,
					IOrganisationFactory::organisationsOfOwnerCall {
						owner,
						id: U256::from(index),
					},
				)
				.await
			}
		})
		.map(|organisation| ContractHandle::verified(organisation, ContractKind::Organisation))
		.boxed()
	}

	pub async fn deployment_fees(&self) -> Result<DeploymentFees, RegistryError> {
		let reader = self.reader.as_ref();
		let (organisation_deployment_fee, register_deployment_fee, record_deployment_fee) = futures::try_join!(
			read(reader, self.address(), IOrganisationFactory::organisationDeploymentFeeCall {}),
			read(reader, self.address(), IOrganisationFactory::registerDeploymentFeeCall {}),
			read(reader, self.address(), IOrganisationFactory::recordDeploymentFeeCall {}),
		)?;

		Ok(DeploymentFees {
			organisation_deployment_fee,
			register_deployment_fee,
			record_deployment_fee,
		})
	}

	pub fn deploy_organisation(&self, metadata: impl Into<String>, owner: Address) -> ContractCall {
		write(
			self.address(),
			IOrganisationFactory::deployOrganisationCall {
				organisationMetadata: metadata.into(),
				organisationOwner: owner,
			},
		)
	}

	pub fn set_fees(&self, fees: DeploymentFees) -> ContractCall {
		write(
			self.address(),
			IOrganisationFactory::setFeesCall {
				organisationDeploymentFee: fees.organisation_deployment_fee,
				registerDeploymentFee: fees.register_deployment_fee,
				recordDeploymentFee: fees.record_deployment_fee,
			},
		)
	}
}

pub struct OrganisationContract {
	handle: ContractHandle,
	reader: Arc<dyn ChainReader>,
}

impl OrganisationContract {
	pub fn new(handle: ContractHandle, reader: Arc<dyn ChainReader>) -> Result<Self, RegistryError> {
		Ok(Self {
			handle: expect_kind(handle, ContractKind::Organisation)?,
			reader,
		})
	}

	pub fn handle(&self) -> ContractHandle {
		self.handle
	}

	pub fn address(&self) -> Address {
		self.handle.address()
	}

	/// Addresses of the registers deployed by this organisation.
	///
	/// These are plain addresses: a register handle is only obtained through
	/// the hierarchical search.
	pub fn registers(&self) -> BoxStream<'static, Address> {
		let reader = self.reader.clone();
		let organisation = self.address();
		enumerate(move |index| {
			let reader = reader.clone();
			async move {
				read(
					reader.as_ref(),
					organisation,
					IOrganisation::registersCall {
						id: U256::from(index),
					},
				)
				.await
			}
		})
		.boxed()
	}

	pub async fn metadata(&self) -> Result<String, RegistryError> {
		read(self.reader.as_ref(), self.address(), IOrganisation::metadataCall {}).await
	}

	pub async fn owner(&self) -> Result<Address, RegistryError> {
		read(self.reader.as_ref(), self.address(), IOrganisation::ownerCall {}).await
	}

	pub async fn is_owner(&self, account: Address) -> Result<bool, RegistryError> {
		Ok(self.owner().await? == account)
	}

	pub fn deploy_register(&self, metadata: impl Into<String>) -> ContractCall {
		write(
			self.address(),
			IOrganisation::deployRegisterCall {
				registerMetadata: metadata.into(),
			},
		)
	}

	pub fn edit_metadata(&self, metadata: impl Into<String>) -> ContractCall {
		write(
			self.address(),
			IOrganisation::editOrganisationMetadataCall {
				metadata: metadata.into(),
			},
		)
	}
}

pub struct RegisterContract {
	handle: ContractHandle,
	reader: Arc<dyn ChainReader>,
}

impl RegisterContract {
	pub fn new(handle: ContractHandle, reader: Arc<dyn ChainReader>) -> Result<Self, RegistryError> {
		Ok(Self {
			handle: expect_kind(handle, ContractKind::Register)?,
			reader,
		})
	}

	pub fn handle(&self) -> ContractHandle {
		self.handle
	}

	pub fn address(&self) -> Address {
		self.handle.address()
	}

	/// Organisation the register claims as its parent.
	pub async fn organisation(&self) -> Result<Address, RegistryError> {
		read(self.reader.as_ref(), self.address(), IRegister::organisationCall {}).await
	}

	pub async fn metadata(&self) -> Result<String, RegistryError> {
		read(self.reader.as_ref(), self.address(), IRegister::metadataCall {}).await
	}

	/// Looks up the record stored under `document_hash`.
	///
	/// Unknown hashes yield a zeroed record; see [`Record::exists`].
	pub async fn record(&self, document_hash: B256) -> Result<Record, RegistryError> {
		let raw = read(
			self.reader.as_ref(),
			self.address(),
			IRegister::recordsCall { id: document_hash },
		)
		.await?;

		Ok(Record::from((
			raw._0, raw._1, raw._2, raw._3, raw._4, raw._5, raw._6, raw._7, raw._8, raw._9, raw._10,
		)))
	}

	pub async fn has_role(&self, role: Role, account: Address) -> Result<bool, RegistryError> {
		read(
			self.reader.as_ref(),
			self.address(),
			IRegister::hasRoleCall {
				role: role.id(),
				account,
			},
		)
		.await
	}

	pub async fn permissions(&self, account: Address) -> Result<RegisterPermissions, RegistryError> {
		let (record_creator, record_invalidator, register_editor) = futures::try_join!(
			self.has_role(Role::RecordCreator, account),
			self.has_role(Role::RecordInvalidator, account),
			self.has_role(Role::RegisterEditor, account),
		)?;

		Ok(RegisterPermissions {
			record_creator,
			record_invalidator,
			register_editor,
		})
	}

	pub fn create_record(&self, record: NewRecord) -> ContractCall {
		write(
			self.address(),
			IRegister::createRecordCall {
				documentHash: record.document_hash,
				sourceDocument: record.source_document,
				referenceDocument: record.reference_document,
				startsAt: record.starts_at,
				expiresAt: record.expires_at,
				pastDocumentHash: record.past_document_hash,
			},
		)
	}

	pub fn invalidate_record(&self, document_hash: B256) -> ContractCall {
		write(
			self.address(),
			IRegister::invalidateRecordCall {
				documentHash: document_hash,
			},
		)
	}

	pub fn edit_metadata(&self, metadata: impl Into<String>) -> ContractCall {
		write(
			self.address(),
			IRegister::editRegisterMetadataCall {
				metadata: metadata.into(),
			},
		)
	}
}
