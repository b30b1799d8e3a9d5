//! # Ledger Types
//!
//! Data model for the mirrored AMM network: one factory registry, one
//! [`ExchangeState`] per token/base pair, one [`TokenState`] per traded token,
//! and the base-asset [`AccountLedger`]. Everything here is passive data plus
//! the invariant helpers the runner applies after each refresh.
//!
//! ## Design Philosophy
//!
//! - **Cache, not truth**: entities are overwritten wholesale by the state
//!   mirror and never updated incrementally
//! - **Signed quantities**: the remote VM encodes integers as signed values, so
//!   balances are [`I256`] and a negative reserve is observable as a violation
//! - **Typed identities**: [`Address`] is a fixed 20-byte value in ledger
//!   storage order; the byte-reversed display form is only used at the edges

pub mod address;
pub mod errors;
pub mod identities;
pub mod invariants;
pub mod ledger;

pub use address::Address;
pub use errors::TypesError;
pub use identities::{GasSettings, MirrorIdentities, PairIdentity, Participant, Signer};
pub use invariants::{
    check_non_negative_reserves, check_share_conservation, reserve_checks,
    share_conservation_check, tracked_supply_check, Comparison, DeltaCheck, InvariantViolation,
    Quantity, Subject,
};
pub use ledger::{AccountLedger, ExchangeState, FactoryState, LedgerSnapshot, TokenState};

pub use ethers_core::types::{I256, U256, U512};
