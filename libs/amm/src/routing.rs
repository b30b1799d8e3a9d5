//! Two-hop token-to-token routing through the base asset
//!
//! Both hops are quoted against reserves captured before the operation. The
//! contract prices the second hop against pair B's reserves, which the first
//! hop never touches, so the composed quote is the amount the contract will
//! actually deliver.

use crate::error::AmmResult;
use crate::reserves::PairReserves;
use ethers_core::types::U256;
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Composed two-hop quote
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteQuote {
    /// Tokens of pair A sold
    pub amount_in: U256,
    /// Base asset moved from pair A to pair B
    pub base_amount: U256,
    /// Tokens of pair B bought
    pub amount_out: U256,
}

/// Sell exactly `amount_in` of A's token, buy B's token
pub fn route_token_to_token(
    amount_in: U256,
    sell: &PairReserves,
    buy: &PairReserves,
) -> AmmResult<RouteQuote> {
    let base_amount = sell.token_to_base_input(amount_in)?;
    let amount_out = buy.base_to_token_input(base_amount)?;
    debug!(
        "route {} -> base {} -> {}",
        amount_in, base_amount, amount_out
    );
    Ok(RouteQuote {
        amount_in,
        base_amount,
        amount_out,
    })
}

/// Buy exactly `amount_out` of B's token; hops are inverted in reverse order
pub fn route_token_to_token_output(
    amount_out: U256,
    sell: &PairReserves,
    buy: &PairReserves,
) -> AmmResult<RouteQuote> {
    let base_amount = buy.base_to_token_output(amount_out)?;
    let amount_in = sell.token_to_base_output(base_amount)?;
    debug!(
        "route (exact out) {} <- base {} <- {}",
        amount_out, base_amount, amount_in
    );
    Ok(RouteQuote {
        amount_in,
        base_amount,
        amount_out,
    })
}
