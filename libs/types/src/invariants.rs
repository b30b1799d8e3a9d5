//! Invariant checks and the structured records they produce
//!
//! A failed check is data, not an error: callers collect [`DeltaCheck`]s and
//! turn the failing ones into [`InvariantViolation`]s for the run report.

use crate::address::Address;
use crate::ledger::{ExchangeState, TokenState};
use chrono::{DateTime, Utc};
use ethers_core::types::{I256, U512};
use std::cmp::Ordering;
use std::fmt;

/// `ShareSupply == sum(ShareBalance)`
pub fn check_share_conservation(exchange: &ExchangeState) -> bool {
    share_conservation_check(exchange).passed
}

/// Both reserves are `>= 0`
pub fn check_non_negative_reserves(exchange: &ExchangeState) -> bool {
    reserve_checks(exchange).iter().all(|c| c.passed)
}

pub fn share_conservation_check(exchange: &ExchangeState) -> DeltaCheck {
    DeltaCheck::exact(
        Subject::ShareConservation {
            exchange: exchange.address,
        },
        exchange.share_supply,
        exchange.share_balance_sum(),
    )
}

pub fn reserve_checks(exchange: &ExchangeState) -> [DeltaCheck; 2] {
    [
        DeltaCheck::at_least(
            Subject::BaseReserve {
                exchange: exchange.address,
            },
            I256::zero(),
            exchange.base_liquid,
        ),
        DeltaCheck::at_least(
            Subject::TokenReserve {
                exchange: exchange.address,
            },
            I256::zero(),
            exchange.token_liquid,
        ),
    ]
}

/// Tracked holders can never own more than the total supply
pub fn tracked_supply_check(token: &TokenState) -> DeltaCheck {
    DeltaCheck::at_most(
        Subject::TrackedSupply {
            token: token.address,
        },
        token.total_supply,
        token.tracked_balance_sum(),
    )
}

/// What a check was about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Balance { account: Address, asset: Address },
    Allowance { asset: Address, owner: Address, spender: Address },
    BaseReserve { exchange: Address },
    TokenReserve { exchange: Address },
    ShareSupply { exchange: Address },
    ShareBalance { exchange: Address, provider: Address },
    ShareConservation { exchange: Address },
    ConstantProduct { exchange: Address },
    TrackedSupply { token: Address },
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Balance { account, asset } => write!(f, "balance[{account}] of {asset}"),
            Subject::Allowance {
                asset,
                owner,
                spender,
            } => write!(f, "allowance[{owner} -> {spender}] of {asset}"),
            Subject::BaseReserve { exchange } => write!(f, "base reserve of {exchange}"),
            Subject::TokenReserve { exchange } => write!(f, "token reserve of {exchange}"),
            Subject::ShareSupply { exchange } => write!(f, "share supply of {exchange}"),
            Subject::ShareBalance { exchange, provider } => {
                write!(f, "shares[{provider}] of {exchange}")
            }
            Subject::ShareConservation { exchange } => {
                write!(f, "share conservation of {exchange}")
            }
            Subject::ConstantProduct { exchange } => write!(f, "constant product of {exchange}"),
            Subject::TrackedSupply { token } => write!(f, "tracked supply of {token}"),
        }
    }
}

/// A compared value: a signed amount or an exact reserve product
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Quantity {
    Amount(I256),
    Product(U512),
}

impl Quantity {
    fn compare(&self, other: &Quantity) -> Option<Ordering> {
        match (self, other) {
            (Quantity::Amount(a), Quantity::Amount(b)) => Some(a.cmp(b)),
            (Quantity::Product(a), Quantity::Product(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }
}

impl fmt::Display for Quantity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Quantity::Amount(v) => write!(f, "{v}"),
            Quantity::Product(v) => write!(f, "{v}"),
        }
    }
}

/// How `actual` must relate to `expected`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comparison {
    Exact,
    AtLeast,
    AtMost,
}

impl Comparison {
    fn holds(self, actual_vs_expected: Ordering) -> bool {
        match self {
            Comparison::Exact => actual_vs_expected == Ordering::Equal,
            Comparison::AtLeast => actual_vs_expected != Ordering::Less,
            Comparison::AtMost => actual_vs_expected != Ordering::Greater,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparison::Exact => "==",
            Comparison::AtLeast => ">=",
            Comparison::AtMost => "<=",
        })
    }
}

/// One expected-vs-actual comparison
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DeltaCheck {
    pub subject: Subject,
    pub comparison: Comparison,
    pub expected: Quantity,
    pub actual: Quantity,
    pub passed: bool,
}

impl DeltaCheck {
    pub fn new(
        subject: Subject,
        comparison: Comparison,
        expected: Quantity,
        actual: Quantity,
    ) -> Self {
        let passed = actual
            .compare(&expected)
            .map(|ord| comparison.holds(ord))
            .unwrap_or(false);
        Self {
            subject,
            comparison,
            expected,
            actual,
            passed,
        }
    }

    pub fn exact(subject: Subject, expected: I256, actual: I256) -> Self {
        Self::new(
            subject,
            Comparison::Exact,
            Quantity::Amount(expected),
            Quantity::Amount(actual),
        )
    }

    pub fn at_least(subject: Subject, expected: I256, actual: I256) -> Self {
        Self::new(
            subject,
            Comparison::AtLeast,
            Quantity::Amount(expected),
            Quantity::Amount(actual),
        )
    }

    pub fn at_most(subject: Subject, expected: I256, actual: I256) -> Self {
        Self::new(
            subject,
            Comparison::AtMost,
            Quantity::Amount(expected),
            Quantity::Amount(actual),
        )
    }

    /// Reserve product must not shrink
    pub fn product_non_decreasing(exchange: Address, before: U512, after: U512) -> Self {
        Self::new(
            Subject::ConstantProduct { exchange },
            Comparison::AtLeast,
            Quantity::Product(before),
            Quantity::Product(after),
        )
    }
}

impl fmt::Display for DeltaCheck {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: actual {} {} expected {} ({})",
            self.subject,
            self.actual,
            self.comparison,
            self.expected,
            if self.passed { "ok" } else { "FAILED" }
        )
    }
}

/// A failed check, stamped with the operation it was observed under
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvariantViolation {
    pub operation: String,
    pub subject: Subject,
    pub comparison: Comparison,
    pub expected: Quantity,
    pub actual: Quantity,
    pub at: DateTime<Utc>,
}

impl InvariantViolation {
    pub fn from_check(operation: impl Into<String>, check: &DeltaCheck) -> Self {
        Self {
            operation: operation.into(),
            subject: check.subject,
            comparison: check.comparison,
            expected: check.expected,
            actual: check.actual,
            at: Utc::now(),
        }
    }
}

impl fmt::Display for InvariantViolation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}] {}: {}: expected {} {}, actual {}",
            self.at.to_rfc3339(),
            self.operation,
            self.subject,
            self.comparison,
            self.expected,
            self.actual
        )
    }
}
