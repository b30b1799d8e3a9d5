//! # Operation Runner
//!
//! Drives trading and liquidity operations against the remote AMM deployment
//! and checks each one against the exact pricing model.
//!
//! ## Flow
//!
//! ```text
//! Operation ──▶ OperationRunner ──▶ RemoteLedgerGateway
//!                   │      ▲
//!                   ▼      │ refresh_scope (before / after)
//!               Expectations ◀── StateMirror
//!                   │
//!                   ▼
//!            OperationReport ──▶ LaneReport ──▶ RunReport
//! ```
//!
//! - [`operation`]: operation descriptors and the 16 swap methods
//! - [`expectations`]: predicted deltas and their reconciliation
//! - [`runner`]: the per-operation state machine
//! - [`supervisor`]: parallel lanes over disjoint scopes
//! - [`report`]: structured outcomes
//!
//! An operation that fails on its own (precondition, rejection, timeout,
//! invariant violation) is reported and the lane moves on. Registry mismatches
//! and refresh failures surface as [`RunnerError`] and stop the run.

pub mod error;
pub mod expectations;
pub mod logging;
pub mod operation;
pub mod report;
pub mod runner;
pub mod supervisor;

pub use error::RunnerError;
pub use expectations::{Expectations, Observed};
pub use logging::init_tracing;
pub use operation::{
    method_name, AmountKind, AmountMode, Operation, OperationKind, RecipientMode, SwapCall,
    SwapFamily, SwapOrder, SwapRoute,
};
pub use report::{
    LaneReport, Outcome, OperationReport, Phase, PhaseStep, RunReport, ViolationReason,
};
pub use runner::OperationRunner;
pub use supervisor::{Lane, Supervisor};
