//! Interface detection by function selector.
//!
//! A contract is taken to implement an interface when every probe selector
//! of that interface occurs somewhere in its deployed bytecode. The search
//! is a plain byte scan; no disassembly is attempted, so a selector that
//! only appears inside push data of another instruction still counts.

use crate::abi::{IOrganisation, IOrganisationFactory, IRegister};
use alloy::primitives::keccak256;
use alloy::sol_types::SolCall;
use registry_types::ContractKind;

/// First four bytes of the keccak-256 hash of a canonical signature.
pub type Selector = [u8; 4];

const FACTORY_PROBE: [Selector; 1] = [IOrganisationFactory::deployOrganisationCall::SELECTOR];

const ORGANISATION_PROBE: [Selector; 2] = [
	IOrganisation::editOrganisationMetadataCall::SELECTOR,
	IOrganisation::deployRegisterCall::SELECTOR,
];

const REGISTER_PROBE: [Selector; 1] = [IRegister::editRegisterMetadataCall::SELECTOR];

macro_rules! known {
	($($call:ty),* $(,)?) => {
		[$((<$call as SolCall>::SELECTOR, <$call as SolCall>::SIGNATURE)),*]
	};
}

/// State-changing registry functions, for labelling traced transactions.
const KNOWN_FUNCTIONS: [(Selector, &str); 7] = known![
	IOrganisationFactory::deployOrganisationCall,
	IOrganisationFactory::setFeesCall,
	IOrganisation::deployRegisterCall,
	IOrganisation::editOrganisationMetadataCall,
	IRegister::createRecordCall,
	IRegister::invalidateRecordCall,
	IRegister::editRegisterMetadataCall,
];

/// Computes the selector of a canonical function signature such as
/// `"deployRegister(string)"`.
pub fn selector(signature: &str) -> Selector {
	let hash = keccak256(signature.as_bytes());
	[hash[0], hash[1], hash[2], hash[3]]
}

/// Selectors whose presence identifies `kind`.
pub fn probe_selectors(kind: ContractKind) -> &'static [Selector] {
	match kind {
		ContractKind::Factory => &FACTORY_PROBE,
		ContractKind::Organisation => &ORGANISATION_PROBE,
		ContractKind::Register => &REGISTER_PROBE,
	}
}

/// Canonical signature of the registry function with this selector.
pub fn function_name(selector: &Selector) -> Option<&'static str> {
	KNOWN_FUNCTIONS
		.iter()
		.find(|(known, _)| known == selector)
		.map(|(_, signature)| *signature)
}

pub fn contains_selector(code: &[u8], selector: &Selector) -> bool {
	code.windows(4).any(|window| window == selector)
}

/// Returns true if `code` carries every probe selector of `kind`.
///
/// Empty code (an externally owned account or a destroyed contract)
/// implements nothing.
pub fn implements(code: &[u8], kind: ContractKind) -> bool {
	!code.is_empty()
		&& probe_selectors(kind)
			.iter()
			.all(|selector| contains_selector(code, selector))
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn test_selector_of_known_signature() {
		assert_eq!(selector("transfer(address,uint256)"), [0xa9, 0x05, 0x9c, 0xbb]);
	}

	#[test]
	fn test_probe_selectors_match_signatures() {
		assert_eq!(
			probe_selectors(ContractKind::Organisation),
			&[
				selector("editOrganisationMetadata(string)"),
				selector("deployRegister(string)"),
			]
		);
		assert_eq!(
			probe_selectors(ContractKind::Register),
			&[selector("editRegisterMetadata(string)")]
		);
		assert_eq!(
			probe_selectors(ContractKind::Factory),
			&[selector("deployOrganisation(string,address)")]
		);
	}

	#[test]
	fn test_function_name_lookup() {
		assert_eq!(
			function_name(&selector("createRecord(bytes32,string,string,uint256,uint256,bytes32)")),
			Some("createRecord(bytes32,string,string,uint256,uint256,bytes32)")
		);
		assert_eq!(function_name(&[0xa9, 0x05, 0x9c, 0xbb]), None);
	}

	#[test]
	fn test_selector_found_at_any_offset() {
		let sel = selector("editRegisterMetadata(string)");
		let mut code = vec![0x60, 0x80, 0x60, 0x40, 0x52, 0x63];
		code.extend_from_slice(&sel);
		assert!(contains_selector(&code, &sel));
		assert!(contains_selector(&code[5..], &sel));
		assert!(!contains_selector(&code[..8], &sel));
	}

	#[test]
	fn test_organisation_needs_both_selectors() {
		let mut code = vec![0x63];
		code.extend_from_slice(&selector("editOrganisationMetadata(string)"));
		assert!(!implements(&code, ContractKind::Organisation));

		code.push(0x63);
		code.extend_from_slice(&selector("deployRegister(string)"));
		assert!(implements(&code, ContractKind::Organisation));
		assert!(!implements(&code, ContractKind::Register));
	}

	#[test]
	fn test_empty_code_implements_nothing() {
		for kind in [
			ContractKind::Factory,
			ContractKind::Organisation,
			ContractKind::Register,
		] {
			assert!(!implements(&[], kind));
		}
	}
}
