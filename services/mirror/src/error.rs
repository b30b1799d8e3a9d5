//! Mirror error types
//!
//! Every variant here is fatal for the run: either the configured identities
//! do not match the deployment, or the mirror could not obtain a complete view.

use crate::gateway::GatewayError;
use crate::reads::Read;
use std::fmt;
use thiserror::Error;
use types::Address;

/// A read that still failed after its retry budget
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReadFailure {
    pub read: Read,
    pub error: GatewayError,
}

impl fmt::Display for ReadFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.read, self.error)
    }
}

fn first(failures: &[ReadFailure]) -> String {
    failures
        .first()
        .map(ToString::to_string)
        .unwrap_or_else(|| "none".to_string())
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MirrorError {
    #[error("Registry mismatch: {query}({subject}) returned {actual}, configured {expected}")]
    RegistryMismatch {
        query: &'static str,
        subject: Address,
        expected: Address,
        actual: Address,
    },

    #[error("Factory registry must be refreshed before exchanges")]
    FactoryNotRefreshed,

    #[error(
        "Refresh of {scope} failed: {} of {total} reads failed (first: {})",
        .failures.len(),
        first(.failures)
    )]
    RefreshFailed {
        scope: &'static str,
        total: usize,
        failures: Vec<ReadFailure>,
    },

    #[error("Exchange {0} is not configured")]
    UnknownExchange(Address),
}

impl MirrorError {
    /// True if any failed read was a malformed response
    pub fn has_decode_failure(&self) -> bool {
        match self {
            MirrorError::RefreshFailed { failures, .. } => failures
                .iter()
                .any(|f| matches!(f.error, GatewayError::Decode(_))),
            _ => false,
        }
    }
}
