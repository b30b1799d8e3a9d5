//! Remote ledger gateway interface
//!
//! Everything the core knows about the remote ledger goes through this trait.
//! Implementations are expected to be slow and fallible; the mirror owns retry.

use async_trait::async_trait;
use codec::{CallArg, CodecError};
use std::fmt;
use std::time::Duration;
use thiserror::Error;
use types::{Address, Signer, I256};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum GatewayError {
    /// Transport or node failure; retry with backoff
    #[error("Gateway unavailable: {0}")]
    Unavailable(String),

    /// Response bytes do not parse; never retried
    #[error("Decode error: {0}")]
    Decode(#[from] CodecError),

    /// The remote refused to accept a submission
    #[error("Submission refused: {0}")]
    Refused(String),
}

impl GatewayError {
    pub fn is_transient(&self) -> bool {
        matches!(self, GatewayError::Unavailable(_))
    }
}

/// Handle for a submitted operation (transaction hash on the remote ledger)
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct OperationId(pub String);

impl fmt::Display for OperationId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Result of waiting for a submitted operation
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConfirmationOutcome {
    Confirmed,
    /// Not confirmed in time; the operation may still land later
    TimedOut,
    /// Executed and failed on the remote side
    Rejected(String),
}

#[async_trait]
pub trait RemoteLedgerGateway: Send + Sync {
    /// Base-asset balance of `account`
    async fn get_balance(&self, account: Address, asset: Address) -> Result<I256, GatewayError>;

    /// Base-asset allowance granted by `owner` to `spender`
    async fn get_allowance(
        &self,
        asset: Address,
        owner: Address,
        spender: Address,
    ) -> Result<I256, GatewayError>;

    /// Pre-executed contract call returning the raw result payload
    async fn call_read_only(
        &self,
        contract: Address,
        method: &str,
        args: &[CallArg],
    ) -> Result<Vec<u8>, GatewayError>;

    /// Sign and broadcast a contract invocation
    async fn submit(
        &self,
        contract: Address,
        method: &str,
        args: Vec<CallArg>,
        signer: &Signer,
    ) -> Result<OperationId, GatewayError>;

    /// Wait up to `timeout` for `operation` to be included
    async fn await_confirmation(
        &self,
        operation: &OperationId,
        timeout: Duration,
    ) -> Result<ConfirmationOutcome, GatewayError>;
}
