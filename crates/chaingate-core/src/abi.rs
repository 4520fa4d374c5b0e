//! Contract ABI encoding for permission-registry calls.
//!
//! Covers exactly what the registry needs: 4-byte Keccak selectors,
//! `address` and `string` arguments, and a single `bool` return word.

use sha3::{Digest, Keccak256};
use thiserror::Error;

use crate::identity::Identity;

/// Identity-only permission check.
pub const HAS_ACCESS_SIGNATURE: &str = "hasAccess(address)";

/// Path-scoped permission check.
pub const CHECK_ACCESS_FOR_ADDRESS_SIGNATURE: &str = "checkAccessForAddress(string,address)";

/// ABI word size in bytes.
pub const WORD: usize = 32;

/// Hex digits in a 160-bit address.
const ADDRESS_HEX_DIGITS: usize = 40;

/// ABI encoding/decoding errors.
#[derive(Debug, Error, PartialEq)]
pub enum AbiError {
    #[error("address has no hex digits")]
    EmptyAddress,

    #[error("invalid hex digit {0:?} in address")]
    InvalidHexDigit(char),

    #[error("address value is {0} hex digits wide, maximum is 40")]
    AddressTooWide(usize),

    #[error("invalid hex data: {0}")]
    Hex(#[from] hex::FromHexError),
}

/// Function selector: the leading 4 bytes of `keccak256(signature)`.
pub fn selector(signature: &str) -> [u8; 4] {
    let digest = Keccak256::digest(signature.as_bytes());
    let mut out = [0u8; 4];
    out.copy_from_slice(&digest[..4]);
    out
}

/// Encode an address as a left-zero-padded 32-byte word.
///
/// Accepts an optional `0x` prefix, odd digit counts and leading zeros. The
/// numeric value must fit in 160 bits.
pub fn encode_address(text: &str) -> Result<[u8; WORD], AbiError> {
    let digits = strip_hex_prefix(text);
    if digits.is_empty() {
        return Err(AbiError::EmptyAddress);
    }
    if let Some(c) = digits.chars().find(|c| !c.is_ascii_hexdigit()) {
        return Err(AbiError::InvalidHexDigit(c));
    }

    let significant = digits.trim_start_matches('0');
    if significant.len() > ADDRESS_HEX_DIGITS {
        return Err(AbiError::AddressTooWide(significant.len()));
    }

    let padded = format!("{significant:0>64}");
    let mut word = [0u8; WORD];
    hex::decode_to_slice(padded, &mut word)?;
    Ok(word)
}

/// Call data for `hasAccess(address)`.
pub fn encode_has_access(identity: &Identity) -> Result<Vec<u8>, AbiError> {
    let address = encode_address(identity.as_str())?;
    let mut data = Vec::with_capacity(4 + WORD);
    data.extend_from_slice(&selector(HAS_ACCESS_SIGNATURE));
    data.extend_from_slice(&address);
    Ok(data)
}

/// Call data for `checkAccessForAddress(string,address)`.
///
/// Layout: selector, head (offset of the string tail, address word), tail
/// (length word, UTF-8 bytes right-padded to a word boundary).
pub fn encode_check_access_for_address(
    path: &str,
    identity: &Identity,
) -> Result<Vec<u8>, AbiError> {
    let address = encode_address(identity.as_str())?;
    let bytes = path.as_bytes();
    let padded_len = bytes.len().div_ceil(WORD) * WORD;

    let mut data = Vec::with_capacity(4 + 3 * WORD + padded_len);
    data.extend_from_slice(&selector(CHECK_ACCESS_FOR_ADDRESS_SIGNATURE));
    data.extend_from_slice(&uint_word(2 * WORD));
    data.extend_from_slice(&address);
    data.extend_from_slice(&uint_word(bytes.len()));
    data.extend_from_slice(bytes);
    data.resize(4 + 3 * WORD + padded_len, 0);
    Ok(data)
}

/// Decode a single `bool` return value.
///
/// Returns `None` for an empty or short reply. Otherwise the least
/// significant byte of the first word decides; nonzero is `true`.
pub fn decode_bool(bytes: &[u8]) -> Option<bool> {
    bytes.get(..WORD).map(|word| word[WORD - 1] != 0)
}

/// Render bytes as `0x`-prefixed lowercase hex.
pub fn to_hex_data(bytes: &[u8]) -> String {
    format!("0x{}", hex::encode(bytes))
}

/// Parse `0x`-prefixed (or bare) hex data. `"0x"` alone is empty.
pub fn from_hex_data(text: &str) -> Result<Vec<u8>, AbiError> {
    Ok(hex::decode(strip_hex_prefix(text))?)
}

fn strip_hex_prefix(text: &str) -> &str {
    text.strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text)
}

fn uint_word(value: usize) -> [u8; WORD] {
    let mut word = [0u8; WORD];
    word[WORD - 8..].copy_from_slice(&(value as u64).to_be_bytes());
    word
}
