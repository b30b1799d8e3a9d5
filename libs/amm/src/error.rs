//! Pricing and liquidity error types

use ethers_core::types::U256;
use thiserror::Error;

pub type AmmResult<T> = Result<T, AmmError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AmmError {
    #[error("Reserves must be positive: reserve_in={reserve_in}, reserve_out={reserve_out}")]
    ZeroReserve { reserve_in: U256, reserve_out: U256 },

    #[error("Insufficient liquidity: requested {amount_out} against reserve {reserve_out}")]
    InsufficientLiquidity { amount_out: U256, reserve_out: U256 },

    #[error("Arithmetic overflow in {context}")]
    Overflow { context: &'static str },

    #[error("Amount must be positive for {context}")]
    ZeroAmount { context: &'static str },

    #[error("Pool has no outstanding shares")]
    EmptyPool,

    #[error("Share amount {requested} exceeds outstanding supply {supply}")]
    ExceedsSupply { requested: U256, supply: U256 },
}
