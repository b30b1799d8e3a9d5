//! 20-byte ledger addresses
//!
//! Addresses are held in storage order. The ledger displays contract hashes
//! byte-reversed, so [`Address::from_hex`] and the `Display` impl both use the
//! reversed order, and [`Address::reversed`] produces the form that contract
//! calls expect for "contract" arguments.

use crate::errors::TypesError;
use std::fmt;

pub const ADDRESS_LEN: usize = 20;

#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default)]
pub struct Address([u8; ADDRESS_LEN]);

impl Address {
    pub const fn new(bytes: [u8; ADDRESS_LEN]) -> Self {
        Self(bytes)
    }

    /// Build from a storage-order byte slice
    pub fn from_slice(bytes: &[u8]) -> Result<Self, TypesError> {
        let array: [u8; ADDRESS_LEN] = bytes
            .try_into()
            .map_err(|_| TypesError::InvalidAddressLength { len: bytes.len() })?;
        Ok(Self(array))
    }

    /// Parse the display form (byte-reversed hex, optional `0x` prefix)
    pub fn from_hex(input: &str) -> Result<Self, TypesError> {
        let trimmed = input.trim();
        let digits = trimmed
            .strip_prefix("0x")
            .or_else(|| trimmed.strip_prefix("0X"))
            .unwrap_or(trimmed);
        let mut bytes = hex::decode(digits).map_err(|e| TypesError::InvalidHex {
            input: input.to_string(),
            reason: e.to_string(),
        })?;
        bytes.reverse();
        Self::from_slice(&bytes)
    }

    /// Display form: byte-reversed lowercase hex without prefix
    pub fn to_hex(&self) -> String {
        hex::encode(self.reversed())
    }

    pub fn as_bytes(&self) -> &[u8; ADDRESS_LEN] {
        &self.0
    }

    /// Contract-argument byte order
    pub fn reversed(&self) -> [u8; ADDRESS_LEN] {
        let mut bytes = self.0;
        bytes.reverse();
        bytes
    }
}

impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({})", self.to_hex())
    }
}

impl std::str::FromStr for Address {
    type Err = TypesError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}
