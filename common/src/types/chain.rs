//! Chain primitives: block heights and contract addresses

use std::{fmt::Display, str::FromStr};

use serde::{Deserialize, Deserializer, Serialize, Serializer, de::Error as DeError};
use starknet::core::types::FieldElement;
use util::raw_err_str;

/// A block height on the chain
///
/// Block numbers are unsigned, so a negative range bound can never reach the
/// query service
pub type BlockNumber = u64;

/// The address of a deployed contract
///
/// Backed by a field element, so differently padded renderings of one address
/// compare equal and values outside the field are unrepresentable
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ContractAddress(FieldElement);

impl ContractAddress {
    /// The address as a field element
    pub fn felt(&self) -> FieldElement {
        self.0
    }
}

impl From<FieldElement> for ContractAddress {
    fn from(felt: FieldElement) -> Self {
        Self(felt)
    }
}

impl Display for ContractAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:#x}", self.0)
    }
}

impl FromStr for ContractAddress {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let digits = s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")).unwrap_or(s);
        if digits.is_empty() {
            return Err(format!("invalid contract address {s:?}: no hex digits"));
        }

        FieldElement::from_hex_be(&digits.to_ascii_lowercase())
            .map(ContractAddress)
            .map_err(raw_err_str!("invalid contract address {s:?}: {}"))
    }
}

impl Serialize for ContractAddress {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_string())
    }
}

impl<'de> Deserialize<'de> for ContractAddress {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        ContractAddress::from_str(&s).map_err(D::Error::custom)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// The workshop's counter contract, as written in its deployment notes
    const COUNTER_CONTRACT: &str =
        "0x07de06e0b46751e0361993838c4741c162dc5f7ebe50dcaf9863f94bc93573f7";
    /// The Stark field modulus `P = 2^251 + 17 * 2^192 + 1`
    const STARK_PRIME: &str = "0x800000000000011000000000000000000000000000000000000000000000001";

    /// Tests that padding does not affect address equality
    #[test]
    fn test_address_equality() {
        let padded: ContractAddress = COUNTER_CONTRACT.parse().unwrap();
        let unpadded: ContractAddress =
            COUNTER_CONTRACT.replacen("0x0", "0x", 1).parse().unwrap();

        assert_eq!(padded, unpadded);
        assert_eq!(padded.to_string(), COUNTER_CONTRACT.replacen("0x0", "0x", 1));
        assert_eq!("0X07DE".parse::<ContractAddress>().unwrap().to_string(), "0x7de");
    }

    /// Tests that malformed addresses are rejected
    #[test]
    fn test_invalid_address() {
        assert!("counter".parse::<ContractAddress>().is_err());
        assert!("".parse::<ContractAddress>().is_err());
        assert!("0x".parse::<ContractAddress>().is_err());
    }

    /// Tests that values at or above the field modulus are rejected rather
    /// than reduced into another address
    #[test]
    fn test_out_of_field_address() {
        assert!(STARK_PRIME.parse::<ContractAddress>().is_err());
        assert!(
            "0x800000000000011000000000000000000000000000000000000000000000002"
                .parse::<ContractAddress>()
                .is_err()
        );

        let max = "0x800000000000011000000000000000000000000000000000000000000000000";
        assert_eq!(max.parse::<ContractAddress>().unwrap().to_string(), max);
    }

    /// Tests that deserialization normalizes the address
    #[test]
    fn test_deserialize_normalizes() {
        let addr: ContractAddress = serde_json::from_str("\"0x000abc\"").unwrap();
        assert_eq!(addr.to_string(), "0xabc");
        assert_eq!(serde_json::to_string(&addr).unwrap(), "\"0xabc\"");
        assert!(serde_json::from_str::<ContractAddress>("\"0xzz\"").is_err());
    }
}
