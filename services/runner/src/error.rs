//! Fatal runner errors
//!
//! Operation-local failures never appear here; they are reported as
//! [`Outcome::Violated`](crate::report::Outcome::Violated). These variants end
//! the lane and the run.

use mirror_config::ValidationError;
use state_mirror::{MirrorError, ScopeKey};
use thiserror::Error;
use types::Address;

#[derive(Debug, Error)]
pub enum RunnerError {
    #[error(transparent)]
    Mirror(#[from] MirrorError),

    #[error("Invalid configuration: {0}")]
    Config(#[from] ValidationError),

    #[error("Exchange {0} is not configured")]
    UnknownExchange(Address),

    #[error("No configured exchange trades token {0}")]
    UnknownToken(Address),

    #[error("Lanes '{first}' and '{second}' both target {scope}")]
    OverlappingLanes {
        scope: ScopeKey,
        first: String,
        second: String,
    },

    #[error("Lane task failed: {0}")]
    LaneAborted(String),
}

impl RunnerError {
    /// The configured identities disagree with the deployment
    pub fn is_registry_mismatch(&self) -> bool {
        matches!(self, RunnerError::Mirror(MirrorError::RegistryMismatch { .. }))
    }
}
