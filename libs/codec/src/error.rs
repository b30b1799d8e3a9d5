//! Decode errors for remote VM payloads
//!
//! A decode error means the remote returned bytes that cannot be the value we
//! asked for. Retrying the same read will not fix it.

use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CodecError {
    /// Integer payload wider than the VM's 256-bit limit
    #[error("Integer payload too long: {len} bytes (max {max}, context: {context})")]
    IntegerTooLong {
        len: usize,
        max: usize,
        context: String,
    },

    /// Address payload with the wrong length
    #[error("Address payload must be 20 bytes, got {len} (context: {context}, bytes: {bytes_hex})")]
    InvalidAddress {
        len: usize,
        context: String,
        bytes_hex: String,
    },

    /// Argument list does not fit the method it was passed to
    #[error("Bad argument {index} for {method}: {reason}")]
    BadArgument {
        method: String,
        index: usize,
        reason: String,
    },
}
