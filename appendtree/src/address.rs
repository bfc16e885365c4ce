//! Leaf value validation.

use crate::{Error, Result};

/// Length in bytes of a decoded address.
pub const ADDRESS_LEN: usize = 20;

/// Decode a `0x`-prefixed, 40-hex-digit address into its raw bytes.
///
/// Either letter case is accepted.
pub fn parse_address(value: &str) -> Result<[u8; ADDRESS_LEN]> {
    let digits = value
        .strip_prefix("0x")
        .ok_or_else(|| Error::InvalidInput(format!("{value:?} is missing the 0x prefix")))?;
    let mut bytes = [0u8; ADDRESS_LEN];
    hex::decode_to_slice(digits, &mut bytes)
        .map_err(|e| Error::InvalidInput(format!("{value:?} is not an address: {e}")))?;
    Ok(bytes)
}

/// Whether `value` is a well-formed address.
pub fn is_address(value: &str) -> bool {
    parse_address(value).is_ok()
}
