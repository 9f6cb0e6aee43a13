//! Solidity interfaces of the three registry contracts.
//!
//! Only the functions the client calls are declared. Their canonical
//! signatures are the compatibility surface: selectors derived from them
//! are what the resolver looks for in deployed bytecode.

use alloy::sol;

sol! {
	/// Root of the hierarchy; deploys organisations and keeps the list of
	/// official ones.
	interface IOrganisationFactory {
		function deployOrganisation(string organisationMetadata, address organisationOwner) external;
		function setFees(uint256 organisationDeploymentFee, uint256 registerDeploymentFee, uint256 recordDeploymentFee) external;
		function organisations(address organisation) external view returns (bool);
		function organisationsOfOwner(address owner, uint256 id) external view returns (address);
		function organisationDeploymentFee() external view returns (uint256);
		function registerDeploymentFee() external view returns (uint256);
		function recordDeploymentFee() external view returns (uint256);
	}

	/// An organisation; deploys registers and lists them by index.
	interface IOrganisation {
		function editOrganisationMetadata(string metadata) external;
		function deployRegister(string registerMetadata) external;
		function registers(uint256 id) external view returns (address);
		function metadata() external view returns (string);
		function owner() external view returns (address);
	}

	/// A register of timestamped document records.
	interface IRegister {
		function createRecord(bytes32 documentHash, string sourceDocument, string referenceDocument, uint256 startsAt, uint256 expiresAt, bytes32 pastDocumentHash) external;
		function invalidateRecord(bytes32 documentHash) external;
		function editRegisterMetadata(string metadata) external;
		function organisation() external view returns (address);
		function metadata() external view returns (string);
		function records(bytes32 id) external view returns (bytes32, address, address, string, string, uint256, uint256, uint256, uint256, bytes32, bytes32);
		function hasRole(bytes32 role, address account) external view returns (bool);
	}
}
