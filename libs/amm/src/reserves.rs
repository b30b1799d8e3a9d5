//! Reserve pair for a single token/base exchange

use crate::error::{AmmError, AmmResult};
use crate::pricing::ConstantProduct;
use ethers_core::types::{U256, U512};
use serde::{Deserialize, Serialize};

/// Reserves held by one exchange: base asset on one side, its token on the other
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PairReserves {
    pub base: U256,
    pub token: U256,
}

impl PairReserves {
    pub fn new(base: U256, token: U256) -> Self {
        Self { base, token }
    }

    /// Tokens received for `base_in`
    pub fn base_to_token_input(&self, base_in: U256) -> AmmResult<U256> {
        ConstantProduct::input_price(base_in, self.base, self.token)
    }

    /// Base asset required to receive `tokens_out`
    pub fn base_to_token_output(&self, tokens_out: U256) -> AmmResult<U256> {
        ConstantProduct::output_price(tokens_out, self.base, self.token)
    }

    /// Base asset received for `tokens_in`
    pub fn token_to_base_input(&self, tokens_in: U256) -> AmmResult<U256> {
        ConstantProduct::input_price(tokens_in, self.token, self.base)
    }

    /// Tokens required to receive `base_out`
    pub fn token_to_base_output(&self, base_out: U256) -> AmmResult<U256> {
        ConstantProduct::output_price(base_out, self.token, self.base)
    }

    /// `base * token`, exact
    pub fn product(&self) -> U512 {
        self.base.full_mul(self.token)
    }

    /// Reserves after the pair received `base_in` and paid out `tokens_out`
    pub fn after_base_in(&self, base_in: U256, tokens_out: U256) -> AmmResult<Self> {
        Ok(Self {
            base: self.base.checked_add(base_in).ok_or(AmmError::Overflow {
                context: "base reserve",
            })?,
            token: self
                .token
                .checked_sub(tokens_out)
                .ok_or(AmmError::InsufficientLiquidity {
                    amount_out: tokens_out,
                    reserve_out: self.token,
                })?,
        })
    }

    /// Reserves after the pair received `tokens_in` and paid out `base_out`
    pub fn after_token_in(&self, tokens_in: U256, base_out: U256) -> AmmResult<Self> {
        Ok(Self {
            base: self
                .base
                .checked_sub(base_out)
                .ok_or(AmmError::InsufficientLiquidity {
                    amount_out: base_out,
                    reserve_out: self.base,
                })?,
            token: self.token.checked_add(tokens_in).ok_or(AmmError::Overflow {
                context: "token reserve",
            })?,
        })
    }
}
