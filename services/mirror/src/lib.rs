//! # State Mirror
//!
//! Off-chain copy of the AMM network's economic state, refreshed through a
//! [`RemoteLedgerGateway`].
//!
//! ## Architecture
//!
//! - [`gateway`]: the narrow async interface to the remote ledger
//! - [`retry`]: bounded exponential backoff for transient gateway failures
//! - [`reads`]: every individual read the mirror issues and how it is decoded
//! - [`mirror`]: [`StateMirror`], which batches reads with bounded fan-out and
//!   overwrites the mirrored entities only once every read of a refresh joined
//! - [`testing`]: [`SimulatedLedger`](testing::SimulatedLedger), an in-memory
//!   gateway with fault injection
//!
//! ## Refresh ordering
//!
//! `refresh_factory` must succeed before any exchange refresh, since exchange
//! refreshes cross-check the self-reported token and factory addresses against
//! the registry. Account and exchange refreshes are independent of each other.

pub mod error;
pub mod gateway;
pub mod mirror;
pub mod reads;
pub mod retry;
pub mod scope;
pub mod testing;

pub use error::{MirrorError, ReadFailure};
pub use gateway::{ConfirmationOutcome, GatewayError, OperationId, RemoteLedgerGateway};
pub use mirror::{MirrorOptions, RefreshStats, StateMirror};
pub use reads::{Read, ReadValue};
pub use retry::RetryPolicy;
pub use scope::ScopeKey;
