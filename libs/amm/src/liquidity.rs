//! Liquidity provision math for exchange shares

use crate::error::{AmmError, AmmResult};
use crate::pricing::mul_div_floor;
use crate::reserves::PairReserves;
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};

/// Exchange reserves together with outstanding share supply
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LiquidityPool {
    pub reserves: PairReserves,
    pub share_supply: U256,
}

/// Result of adding liquidity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Deposit {
    pub base_amount: U256,
    pub token_amount: U256,
    pub shares_minted: U256,
}

/// Result of removing liquidity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Withdrawal {
    pub shares_burned: U256,
    pub base_amount: U256,
    pub token_amount: U256,
}

impl LiquidityPool {
    pub fn new(reserves: PairReserves, share_supply: U256) -> Self {
        Self {
            reserves,
            share_supply,
        }
    }

    /// Deposit `base_amount` with at most `max_tokens`
    ///
    /// An empty pool takes `max_tokens` verbatim and mints shares equal to the
    /// base deposit. Otherwise tokens are taken in proportion plus one and
    /// shares are minted in proportion, both rounded down.
    pub fn deposit(&self, base_amount: U256, max_tokens: U256) -> AmmResult<Deposit> {
        if base_amount.is_zero() {
            return Err(AmmError::ZeroAmount {
                context: "deposit base amount",
            });
        }

        if self.share_supply.is_zero() {
            return Ok(Deposit {
                base_amount,
                token_amount: max_tokens,
                shares_minted: base_amount,
            });
        }

        if self.reserves.base.is_zero() {
            return Err(AmmError::ZeroReserve {
                reserve_in: self.reserves.base,
                reserve_out: self.reserves.token,
            });
        }

        let token_amount = mul_div_floor(
            base_amount,
            self.reserves.token,
            self.reserves.base,
            "deposit token amount",
        )?
        .checked_add(U256::one())
        .ok_or(AmmError::Overflow {
            context: "deposit token amount",
        })?;
        let shares_minted = mul_div_floor(
            base_amount,
            self.share_supply,
            self.reserves.base,
            "deposit shares minted",
        )?;

        Ok(Deposit {
            base_amount,
            token_amount,
            shares_minted,
        })
    }

    /// Burn `shares` for a pro-rata slice of both reserves, rounded down
    pub fn withdraw(&self, shares: U256) -> AmmResult<Withdrawal> {
        if shares.is_zero() {
            return Err(AmmError::ZeroAmount {
                context: "withdraw shares",
            });
        }
        if self.share_supply.is_zero() {
            return Err(AmmError::EmptyPool);
        }
        if shares > self.share_supply {
            return Err(AmmError::ExceedsSupply {
                requested: shares,
                supply: self.share_supply,
            });
        }

        Ok(Withdrawal {
            shares_burned: shares,
            base_amount: mul_div_floor(
                shares,
                self.reserves.base,
                self.share_supply,
                "withdraw base amount",
            )?,
            token_amount: mul_div_floor(
                shares,
                self.reserves.token,
                self.share_supply,
                "withdraw token amount",
            )?,
        })
    }
}
