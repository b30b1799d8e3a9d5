//! Integer and address payloads

use crate::error::CodecError;
use ethers_core::types::{I256, U256};
use types::Address;

/// Widest integer the VM produces
pub const MAX_INTEGER_BYTES: usize = 32;

/// Decode a VM integer: little-endian two's complement, empty is zero
pub fn decode_integer(bytes: &[u8], context: &str) -> Result<I256, CodecError> {
    if bytes.is_empty() {
        return Ok(I256::zero());
    }
    if bytes.len() > MAX_INTEGER_BYTES {
        return Err(CodecError::IntegerTooLong {
            len: bytes.len(),
            max: MAX_INTEGER_BYTES,
            context: context.to_string(),
        });
    }

    let negative = bytes[bytes.len() - 1] & 0x80 != 0;
    let mut buf = if negative {
        [0xffu8; MAX_INTEGER_BYTES]
    } else {
        [0u8; MAX_INTEGER_BYTES]
    };
    buf[..bytes.len()].copy_from_slice(bytes);
    Ok(I256::from_raw(U256::from_little_endian(&buf)))
}

/// Encode a VM integer in its minimal form; zero encodes as no bytes
pub fn encode_integer(value: I256) -> Vec<u8> {
    if value.is_zero() {
        return Vec::new();
    }

    let mut buf = [0u8; MAX_INTEGER_BYTES];
    value.into_raw().to_little_endian(&mut buf);

    let negative = value.is_negative();
    let fill = if negative { 0xff } else { 0x00 };
    let mut len = MAX_INTEGER_BYTES;
    // Drop redundant sign-extension bytes while the sign bit survives
    while len > 1 && buf[len - 1] == fill && ((buf[len - 2] & 0x80 != 0) == negative) {
        len -= 1;
    }
    buf[..len].to_vec()
}

/// Decode a storage-order address payload
pub fn decode_address(bytes: &[u8], context: &str) -> Result<Address, CodecError> {
    Address::from_slice(bytes).map_err(|_| CodecError::InvalidAddress {
        len: bytes.len(),
        context: context.to_string(),
        bytes_hex: hex::encode(bytes),
    })
}
