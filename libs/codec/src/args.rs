//! Positional contract call arguments

use crate::error::CodecError;
use crate::vm::encode_integer;
use ethers_core::types::I256;
use std::fmt;
use types::Address;

/// One positional argument of a contract call
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CallArg {
    Integer(I256),
    /// Account address, passed in storage order
    Account(Address),
    /// Contract hash, passed byte-reversed
    Contract(Address),
}

impl CallArg {
    pub fn integer(value: impl Into<I256>) -> Self {
        CallArg::Integer(value.into())
    }

    /// Wire bytes of this argument
    pub fn to_vm_bytes(&self) -> Vec<u8> {
        match self {
            CallArg::Integer(v) => encode_integer(*v),
            CallArg::Account(a) => a.as_bytes().to_vec(),
            CallArg::Contract(a) => a.reversed().to_vec(),
        }
    }

    pub fn as_integer(&self) -> Option<I256> {
        match self {
            CallArg::Integer(v) => Some(*v),
            _ => None,
        }
    }

    /// Address carried by either address form, normalised to storage order
    pub fn as_address(&self) -> Option<Address> {
        match self {
            CallArg::Account(a) | CallArg::Contract(a) => Some(*a),
            CallArg::Integer(_) => None,
        }
    }
}

impl fmt::Display for CallArg {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CallArg::Integer(v) => write!(f, "{v}"),
            CallArg::Account(a) => write!(f, "account:{a}"),
            CallArg::Contract(a) => write!(f, "contract:{a}"),
        }
    }
}

/// Typed access to a positional argument list
pub struct ArgReader<'a> {
    method: &'a str,
    args: &'a [CallArg],
}

impl<'a> ArgReader<'a> {
    pub fn new(method: &'a str, args: &'a [CallArg]) -> Self {
        Self { method, args }
    }

    /// Fails unless exactly `count` arguments were passed
    pub fn expect_len(&self, count: usize) -> Result<(), CodecError> {
        if self.args.len() != count {
            return Err(CodecError::BadArgument {
                method: self.method.to_string(),
                index: self.args.len(),
                reason: format!("expected {count} arguments, got {}", self.args.len()),
            });
        }
        Ok(())
    }

    pub fn integer(&self, index: usize) -> Result<I256, CodecError> {
        self.get(index)?
            .as_integer()
            .ok_or_else(|| self.bad(index, "expected integer"))
    }

    pub fn address(&self, index: usize) -> Result<Address, CodecError> {
        self.get(index)?
            .as_address()
            .ok_or_else(|| self.bad(index, "expected address"))
    }

    fn get(&self, index: usize) -> Result<&CallArg, CodecError> {
        self.args
            .get(index)
            .ok_or_else(|| self.bad(index, "missing"))
    }

    fn bad(&self, index: usize, reason: &str) -> CodecError {
        CodecError::BadArgument {
            method: self.method.to_string(),
            index,
            reason: reason.to_string(),
        }
    }
}
