//! Error types for identity parsing

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TypesError {
    /// Address payload is not exactly 20 bytes
    #[error("Address must be 20 bytes, got {len}")]
    InvalidAddressLength { len: usize },

    /// Address string is not valid hex
    #[error("Invalid address hex '{input}': {reason}")]
    InvalidHex { input: String, reason: String },
}
