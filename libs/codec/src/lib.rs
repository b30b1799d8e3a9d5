//! # Remote VM Codec
//!
//! ## Purpose
//!
//! The "rules" layer between raw gateway payloads and mirrored entities:
//! - Integer payloads: little-endian two's complement, minimal length, empty
//!   means zero, at most 32 bytes
//! - Address payloads: exactly 20 bytes in storage order
//! - Call arguments: typed [`CallArg`] values and their wire bytes, including the
//!   byte-reversed form the contracts expect for contract-hash arguments
//! - Method names for every read-only query and contract operation
//!
//! ## Architecture Role
//!
//! ```text
//! libs/types → [codec] → services/mirror
//!     ↑           ↓            ↓
//! Ledger data  VM bytes    Gateway calls
//! ```

pub mod args;
pub mod error;
pub mod methods;
pub mod vm;

pub use args::{ArgReader, CallArg};
pub use error::CodecError;
pub use vm::{decode_address, decode_integer, encode_integer, MAX_INTEGER_BYTES};
