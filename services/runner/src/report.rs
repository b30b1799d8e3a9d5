//! Structured operation and run reports

use crate::operation::OperationKind;
use chrono::{DateTime, Utc};
use state_mirror::OperationId;
use std::fmt;
use std::time::Instant;
use types::{DeltaCheck, InvariantViolation};

/// States of one operation, in order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Phase {
    Preflight,
    Submitted,
    AwaitingConfirmation,
    Reconciling,
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Phase::Preflight => "preflight",
            Phase::Submitted => "submitted",
            Phase::AwaitingConfirmation => "awaiting confirmation",
            Phase::Reconciling => "reconciling",
        })
    }
}

/// Timing and success of one phase
#[derive(Debug, Clone)]
pub struct PhaseStep {
    pub phase: Phase,
    pub duration_ms: u64,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViolationReason {
    /// Balance or allowance insufficient, or a bound the quote cannot meet;
    /// nothing was submitted
    PreconditionFailed(String),
    /// The gateway would not accept the submission
    SubmissionFailed(String),
    /// Outcome unknown; the next refresh shows what the ledger did
    ConfirmationTimeout { indeterminate: bool },
    /// Executed remotely and failed
    Rejected(String),
    /// Confirmed, but observed deltas disagree with the prediction
    InvariantViolation,
}

impl fmt::Display for ViolationReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ViolationReason::PreconditionFailed(reason) => {
                write!(f, "precondition failed: {reason}")
            }
            ViolationReason::SubmissionFailed(reason) => write!(f, "submission failed: {reason}"),
            ViolationReason::ConfirmationTimeout { indeterminate } => {
                write!(f, "confirmation timeout (indeterminate: {indeterminate})")
            }
            ViolationReason::Rejected(reason) => write!(f, "rejected: {reason}"),
            ViolationReason::InvariantViolation => f.write_str("invariant violation"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Satisfied,
    Violated(ViolationReason),
}

/// Everything one operation did and found
#[derive(Debug, Clone)]
pub struct OperationReport {
    pub label: String,
    pub kind: OperationKind,
    pub method: Option<&'static str>,
    pub operation_id: Option<OperationId>,
    pub outcome: Outcome,
    pub checks: Vec<DeltaCheck>,
    pub violations: Vec<InvariantViolation>,
    /// Approval sub-operations run during preflight
    pub nested: Vec<OperationReport>,
    pub steps: Vec<PhaseStep>,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl OperationReport {
    pub fn new(label: impl Into<String>, kind: OperationKind) -> Self {
        Self {
            label: label.into(),
            kind,
            method: None,
            operation_id: None,
            outcome: Outcome::Satisfied,
            checks: Vec::new(),
            violations: Vec::new(),
            nested: Vec::new(),
            steps: Vec::new(),
            started_at: Utc::now(),
            finished_at: None,
        }
    }

    pub fn is_satisfied(&self) -> bool {
        self.outcome == Outcome::Satisfied
    }

    /// Timed out, so the remote effect is unknown
    pub fn is_indeterminate(&self) -> bool {
        matches!(
            self.outcome,
            Outcome::Violated(ViolationReason::ConfirmationTimeout {
                indeterminate: true
            })
        )
    }

    pub fn reason(&self) -> Option<&ViolationReason> {
        match &self.outcome {
            Outcome::Satisfied => None,
            Outcome::Violated(reason) => Some(reason),
        }
    }

    pub(crate) fn step(&mut self, phase: Phase, started: Instant, success: bool) {
        self.steps.push(PhaseStep {
            phase,
            duration_ms: started.elapsed().as_millis() as u64,
            success,
        });
    }

    pub(crate) fn violate(mut self, reason: ViolationReason) -> Self {
        self.outcome = Outcome::Violated(reason);
        self.finish()
    }

    pub(crate) fn finish(mut self) -> Self {
        self.finished_at = Some(Utc::now());
        self
    }
}

/// Reports of one lane, in execution order
#[derive(Debug, Clone)]
pub struct LaneReport {
    pub name: String,
    pub reports: Vec<OperationReport>,
}

/// Output of a supervised run
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub lanes: Vec<LaneReport>,
    /// Invariant violations the mirror recorded during refreshes
    pub mirror_violations: Vec<InvariantViolation>,
}

impl RunReport {
    pub fn operations(&self) -> impl Iterator<Item = &OperationReport> {
        self.lanes.iter().flat_map(|l| l.reports.iter())
    }

    pub fn satisfied(&self) -> usize {
        self.operations().filter(|r| r.is_satisfied()).count()
    }

    pub fn violated(&self) -> impl Iterator<Item = &OperationReport> {
        self.operations().filter(|r| !r.is_satisfied())
    }

    /// Every invariant violation, operation and mirror alike
    pub fn all_violations(&self) -> Vec<&InvariantViolation> {
        self.operations()
            .flat_map(|r| r.violations.iter())
            .chain(self.mirror_violations.iter())
            .collect()
    }

    pub fn is_clean(&self) -> bool {
        self.violated().next().is_none() && self.mirror_violations.is_empty()
    }
}
