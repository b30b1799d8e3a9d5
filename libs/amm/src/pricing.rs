//! Constant-product pricing with a 25 basis point input fee
//!
//! All intermediate products are widened to 512 bits so that a quote is either
//! exact or an explicit [`AmmError::Overflow`], never a wrapped value.

use crate::error::{AmmError, AmmResult};
use ethers_core::types::{U256, U512};

/// Fee-adjusted multiplier applied to the input amount
pub const FEE_NUMERATOR: u64 = 9975;
/// Scale of [`FEE_NUMERATOR`]
pub const FEE_DENOMINATOR: u64 = 10_000;

/// Exact constant-product quotes
pub struct ConstantProduct;

impl ConstantProduct {
    /// Amount received for selling `amount_in` into a pair, rounded down
    ///
    /// `amount_out = floor(a*9975*reserve_out / (reserve_in*10000 + a*9975))`
    pub fn input_price(amount_in: U256, reserve_in: U256, reserve_out: U256) -> AmmResult<U256> {
        ensure_reserves(reserve_in, reserve_out)?;

        let amount_in_with_fee = amount_in.full_mul(U256::from(FEE_NUMERATOR));
        let numerator = amount_in_with_fee
            .checked_mul(U512::from(reserve_out))
            .ok_or(AmmError::Overflow {
                context: "input_price numerator",
            })?;
        let denominator = reserve_in
            .full_mul(U256::from(FEE_DENOMINATOR))
            .checked_add(amount_in_with_fee)
            .ok_or(AmmError::Overflow {
                context: "input_price denominator",
            })?;

        narrow(numerator / denominator, "input_price")
    }

    /// Amount that must be paid to receive exactly `amount_out`, rounded up
    ///
    /// Requires `0 < amount_out < reserve_out`; anything else is
    /// [`AmmError::InsufficientLiquidity`].
    pub fn output_price(amount_out: U256, reserve_in: U256, reserve_out: U256) -> AmmResult<U256> {
        ensure_reserves(reserve_in, reserve_out)?;
        if amount_out.is_zero() || amount_out >= reserve_out {
            return Err(AmmError::InsufficientLiquidity {
                amount_out,
                reserve_out,
            });
        }

        let numerator = reserve_in
            .full_mul(amount_out)
            .checked_mul(U512::from(FEE_DENOMINATOR))
            .ok_or(AmmError::Overflow {
                context: "output_price numerator",
            })?;
        let denominator = (reserve_out - amount_out).full_mul(U256::from(FEE_NUMERATOR));

        let quotient = numerator / denominator;
        let rounded = if (numerator % denominator).is_zero() {
            quotient
        } else {
            quotient + U512::one()
        };

        narrow(rounded, "output_price")
    }
}

/// `floor(a * b / c)` without intermediate overflow
pub fn mul_div_floor(a: U256, b: U256, c: U256, context: &'static str) -> AmmResult<U256> {
    if c.is_zero() {
        return Err(AmmError::ZeroAmount { context });
    }
    narrow(a.full_mul(b) / U512::from(c), context)
}

fn ensure_reserves(reserve_in: U256, reserve_out: U256) -> AmmResult<()> {
    if reserve_in.is_zero() || reserve_out.is_zero() {
        return Err(AmmError::ZeroReserve {
            reserve_in,
            reserve_out,
        });
    }
    Ok(())
}

fn narrow(value: U512, context: &'static str) -> AmmResult<U256> {
    U256::try_from(value).map_err(|_| AmmError::Overflow { context })
}
