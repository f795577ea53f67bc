pub use alloy_primitives::Address;
use std::fmt;

pub const ADDRESS_LEN: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AddressError {
    MissingPrefix,
    InvalidLength(usize),
    InvalidHex,
}

impl fmt::Display for AddressError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AddressError::MissingPrefix => write!(f, "address must start with 0x"),
            AddressError::InvalidLength(len) => {
                write!(f, "address must have 40 hex digits, got {len}")
            }
            AddressError::InvalidHex => write!(f, "address contains non-hex characters"),
        }
    }
}

impl std::error::Error for AddressError {}

/// Parses user input as an address. Unlike `Address::from_str` the `0x` prefix
/// is required; casing is free and the checksum is not enforced.
pub fn parse_address(raw: &str) -> Result<Address, AddressError> {
    let digits = raw
        .strip_prefix("0x")
        .or_else(|| raw.strip_prefix("0X"))
        .ok_or(AddressError::MissingPrefix)?;
    if digits.len() != ADDRESS_LEN * 2 {
        return Err(AddressError::InvalidLength(digits.len()));
    }
    let mut bytes = [0u8; ADDRESS_LEN];
    hex::decode_to_slice(digits, &mut bytes).map_err(|_| AddressError::InvalidHex)?;
    Ok(Address::new(bytes))
}

/// `0x1234…abcd`
pub fn short_address(address: &Address) -> String {
    let full = address.to_string();
    format!("{}…{}", &full[..6], &full[full.len() - 4..])
}
