//! # AMM Library - Exact Constant-Product Mathematics
//!
//! ## Purpose
//!
//! Pure integer pricing for exchange pairs that hold a single token against the
//! shared base asset. Every quote is floor/ceil exact over 256-bit quantities,
//! widened to 512 bits for intermediate products, so a mirrored expectation can
//! be compared for strict equality with what the remote contract actually did.
//!
//! ## Integration Points
//!
//! - **Input Sources**: Reserve snapshots taken by the state mirror
//! - **Output Destinations**: Operation runner expectations, simulated ledger
//! - **Fee**: 0.25% charged on the input side (`9975 / 10000`)
//!
//! ## Architecture Role
//!
//! The runner quotes every operation here before submission and again derives
//! the expected balance deltas from those quotes during reconciliation. The
//! functions are deterministic and side-effect free; nothing here touches the
//! network.

pub mod error;
pub mod liquidity;
pub mod pricing;
pub mod reserves;
pub mod routing;

pub use error::{AmmError, AmmResult};
pub use liquidity::{Deposit, LiquidityPool, Withdrawal};
pub use pricing::{ConstantProduct, FEE_DENOMINATOR, FEE_NUMERATOR};
pub use reserves::PairReserves;
pub use routing::{route_token_to_token, route_token_to_token_output, RouteQuote};

/// Unsigned quantity type used throughout the pricing model
pub use ethers_core::types::U256;
