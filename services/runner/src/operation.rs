//! Operation descriptors and the contract call surface
//!
//! Every trading operation is one [`SwapOrder`]: a route, an amount mode and a
//! recipient. The on-chain method name is looked up from
//! (family, recipient mode, amount mode); the argument layout follows the
//! exchange contract's positional order.

use crate::error::RunnerError;
use amm::U256;
use codec::{methods, CallArg};
use std::fmt;
use types::{Address, MirrorIdentities, Participant, I256};

/// One operation executed by the runner
#[derive(Debug, Clone)]
pub struct Operation {
    pub label: String,
    pub invoker: Participant,
    pub kind: OperationKind,
}

impl Operation {
    pub fn new(label: impl Into<String>, invoker: Participant, kind: OperationKind) -> Self {
        Self {
            label: label.into(),
            invoker,
            kind,
        }
    }

    pub fn invoker_address(&self) -> Address {
        self.invoker.address()
    }

    /// Accounts whose balances the operation moves
    pub fn accounts(&self) -> Vec<Address> {
        let mut accounts = vec![self.invoker_address()];
        if let OperationKind::Swap(order) = &self.kind {
            if order.recipient != self.invoker_address() {
                accounts.push(order.recipient);
            }
        }
        accounts
    }

    /// Exchanges the operation touches, resolved against the registry identities
    pub fn exchanges(&self, identities: &MirrorIdentities) -> Result<Vec<Address>, RunnerError> {
        let known = |exchange: Address| {
            identities
                .pair_for_exchange(&exchange)
                .map(|p| p.exchange)
                .ok_or(RunnerError::UnknownExchange(exchange))
        };

        match &self.kind {
            OperationKind::AddLiquidity { exchange, .. }
            | OperationKind::RemoveLiquidity { exchange, .. } => Ok(vec![known(*exchange)?]),
            // Only allowances toward a tracked exchange are ever refreshed
            OperationKind::Approve { asset, spender, .. } => {
                if !identities.is_base_asset(asset) && identities.pair_for_token(asset).is_none() {
                    return Err(RunnerError::UnknownToken(*asset));
                }
                Ok(vec![known(*spender)?])
            }
            OperationKind::Swap(order) => match order.route {
                SwapRoute::BaseToToken { exchange } | SwapRoute::TokenToBase { exchange } => {
                    Ok(vec![known(exchange)?])
                }
                SwapRoute::TokenToToken {
                    sell_exchange,
                    buy_token,
                } => {
                    let buy = identities
                        .pair_for_token(&buy_token)
                        .ok_or(RunnerError::UnknownToken(buy_token))?;
                    Ok(vec![known(sell_exchange)?, buy.exchange])
                }
                SwapRoute::TokenToExchange {
                    sell_exchange,
                    target_exchange,
                } => Ok(vec![known(sell_exchange)?, known(target_exchange)?]),
            },
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OperationKind {
    AddLiquidity {
        exchange: Address,
        base_amount: U256,
        max_tokens: U256,
        /// Defaults to the shares the mirrored pool would mint
        min_liquidity: Option<U256>,
    },
    RemoveLiquidity {
        exchange: Address,
        shares: U256,
        min_base: Option<U256>,
        min_tokens: Option<U256>,
    },
    /// `approve(owner, spender, amount)` on an asset contract
    Approve {
        asset: Address,
        spender: Address,
        amount: U256,
    },
    Swap(SwapOrder),
}

impl fmt::Display for OperationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            OperationKind::AddLiquidity {
                exchange,
                base_amount,
                ..
            } => write!(f, "add {base_amount} base to {exchange}"),
            OperationKind::RemoveLiquidity {
                exchange, shares, ..
            } => write!(f, "remove {shares} shares from {exchange}"),
            OperationKind::Approve {
                asset,
                spender,
                amount,
            } => write!(f, "approve {amount} of {asset} to {spender}"),
            OperationKind::Swap(order) => write!(f, "{order}"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SwapOrder {
    pub route: SwapRoute,
    pub amount: AmountMode,
    pub recipient: Address,
}

impl fmt::Display for SwapOrder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?} {:?} to {}", self.route.family(), self.amount, self.recipient)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapRoute {
    BaseToToken {
        exchange: Address,
    },
    TokenToBase {
        exchange: Address,
    },
    /// Sell the sell exchange's token for `buy_token` through the base asset
    TokenToToken {
        sell_exchange: Address,
        buy_token: Address,
    },
    /// Same two hops, with the second pair named by its exchange
    TokenToExchange {
        sell_exchange: Address,
        target_exchange: Address,
    },
}

impl SwapRoute {
    pub fn family(&self) -> SwapFamily {
        match self {
            SwapRoute::BaseToToken { .. } => SwapFamily::BaseToToken,
            SwapRoute::TokenToBase { .. } => SwapFamily::TokenToBase,
            SwapRoute::TokenToToken { .. } => SwapFamily::TokenToToken,
            SwapRoute::TokenToExchange { .. } => SwapFamily::TokenToExchange,
        }
    }

    /// Exchange the operation is submitted to
    pub fn entry_exchange(&self) -> Address {
        match *self {
            SwapRoute::BaseToToken { exchange } | SwapRoute::TokenToBase { exchange } => exchange,
            SwapRoute::TokenToToken { sell_exchange, .. }
            | SwapRoute::TokenToExchange { sell_exchange, .. } => sell_exchange,
        }
    }
}

/// Fix the amount sold or the amount bought
///
/// A `None` bound is filled from the preflight quote, which makes the
/// submitted call exact.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AmountMode {
    ExactInput {
        amount_in: U256,
        min_out: Option<U256>,
    },
    ExactOutput {
        amount_out: U256,
        max_in: Option<U256>,
    },
}

impl AmountMode {
    pub fn kind(&self) -> AmountKind {
        match self {
            AmountMode::ExactInput { .. } => AmountKind::ExactInput,
            AmountMode::ExactOutput { .. } => AmountKind::ExactOutput,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SwapFamily {
    BaseToToken,
    TokenToBase,
    TokenToToken,
    TokenToExchange,
}

impl SwapFamily {
    pub fn is_two_hop(self) -> bool {
        matches!(self, SwapFamily::TokenToToken | SwapFamily::TokenToExchange)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecipientMode {
    /// Invoker receives the output
    Swap,
    /// Output goes to an explicit recipient argument
    Transfer,
}

impl RecipientMode {
    pub fn for_recipient(invoker: Address, recipient: Address) -> Self {
        if invoker == recipient {
            RecipientMode::Swap
        } else {
            RecipientMode::Transfer
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AmountKind {
    ExactInput,
    ExactOutput,
}

/// On-chain method for every (family, recipient mode, amount mode)
pub fn method_name(family: SwapFamily, recipient: RecipientMode, amount: AmountKind) -> &'static str {
    use AmountKind::*;
    use RecipientMode::*;
    use SwapFamily::*;

    match (family, recipient, amount) {
        (BaseToToken, Swap, ExactInput) => methods::BASE_TO_TOKEN_SWAP_INPUT,
        (BaseToToken, Transfer, ExactInput) => methods::BASE_TO_TOKEN_TRANSFER_INPUT,
        (BaseToToken, Swap, ExactOutput) => methods::BASE_TO_TOKEN_SWAP_OUTPUT,
        (BaseToToken, Transfer, ExactOutput) => methods::BASE_TO_TOKEN_TRANSFER_OUTPUT,

        (TokenToBase, Swap, ExactInput) => methods::TOKEN_TO_BASE_SWAP_INPUT,
        (TokenToBase, Transfer, ExactInput) => methods::TOKEN_TO_BASE_TRANSFER_INPUT,
        (TokenToBase, Swap, ExactOutput) => methods::TOKEN_TO_BASE_SWAP_OUTPUT,
        (TokenToBase, Transfer, ExactOutput) => methods::TOKEN_TO_BASE_TRANSFER_OUTPUT,

        (TokenToToken, Swap, ExactInput) => methods::TOKEN_TO_TOKEN_SWAP_INPUT,
        (TokenToToken, Transfer, ExactInput) => methods::TOKEN_TO_TOKEN_TRANSFER_INPUT,
        (TokenToToken, Swap, ExactOutput) => methods::TOKEN_TO_TOKEN_SWAP_OUTPUT,
        (TokenToToken, Transfer, ExactOutput) => methods::TOKEN_TO_TOKEN_TRANSFER_OUTPUT,

        (TokenToExchange, Swap, ExactInput) => methods::TOKEN_TO_EXCHANGE_SWAP_INPUT,
        (TokenToExchange, Transfer, ExactInput) => methods::TOKEN_TO_EXCHANGE_TRANSFER_INPUT,
        (TokenToExchange, Swap, ExactOutput) => methods::TOKEN_TO_EXCHANGE_SWAP_OUTPUT,
        (TokenToExchange, Transfer, ExactOutput) => methods::TOKEN_TO_EXCHANGE_TRANSFER_OUTPUT,
    }
}

/// Resolved numeric arguments of one swap call
#[derive(Debug, Clone, Copy)]
pub struct SwapCall {
    pub family: SwapFamily,
    pub amount_kind: AmountKind,
    /// Exact amount: sold for exact input, bought for exact output
    pub amount: I256,
    /// Single-hop bound, or the token bound of a two-hop route
    pub bound: I256,
    /// Base-asset bound of a two-hop route
    pub base_bound: I256,
    pub deadline: I256,
    pub invoker: Address,
    pub recipient: Address,
    /// Buy token (token-to-token) or buy exchange (token-to-exchange)
    pub target: Address,
}

impl SwapCall {
    pub fn recipient_mode(&self) -> RecipientMode {
        RecipientMode::for_recipient(self.invoker, self.recipient)
    }

    pub fn method(&self) -> &'static str {
        method_name(self.family, self.recipient_mode(), self.amount_kind)
    }

    /// Positional arguments in contract order
    pub fn args(&self) -> Vec<CallArg> {
        let transfer = self.recipient_mode() == RecipientMode::Transfer;
        let invoker = CallArg::Account(self.invoker);
        let recipient = CallArg::Account(self.recipient);
        let amount = CallArg::Integer(self.amount);
        let bound = CallArg::Integer(self.bound);
        let deadline = CallArg::Integer(self.deadline);

        let mut args = Vec::with_capacity(7);
        match (self.family, self.amount_kind) {
            // (bound|amount, deadline, [recipient], invoker, amount|bound)
            (SwapFamily::BaseToToken, kind) => {
                let (first, last) = match kind {
                    AmountKind::ExactInput => (bound, amount),
                    AmountKind::ExactOutput => (amount, bound),
                };
                args.push(first);
                args.push(deadline);
                if transfer {
                    args.push(recipient);
                }
                args.push(invoker);
                args.push(last);
            }
            // (tokensSold, minBase, deadline, invoker, [recipient])
            (SwapFamily::TokenToBase, AmountKind::ExactInput) => {
                args.extend([amount, bound, deadline, invoker]);
                if transfer {
                    args.push(recipient);
                }
            }
            // (baseBought, maxTokens, deadline, [recipient], invoker)
            (SwapFamily::TokenToBase, AmountKind::ExactOutput) => {
                args.extend([amount, bound, deadline]);
                if transfer {
                    args.push(recipient);
                }
                args.push(invoker);
            }
            // (amount, tokenBound, baseBound, deadline, [recipient], target*, invoker)
            (SwapFamily::TokenToToken | SwapFamily::TokenToExchange, _) => {
                args.extend([amount, bound, CallArg::Integer(self.base_bound), deadline]);
                if transfer {
                    args.push(recipient);
                }
                args.push(CallArg::Contract(self.target));
                args.push(invoker);
            }
        }
        args
    }
}

/// `addLiquidity(minLiquidity, maxTokens, deadline, provider, baseAmount)`
pub fn add_liquidity_args(
    min_liquidity: I256,
    max_tokens: I256,
    deadline: I256,
    provider: Address,
    base_amount: I256,
) -> Vec<CallArg> {
    vec![
        CallArg::Integer(min_liquidity),
        CallArg::Integer(max_tokens),
        CallArg::Integer(deadline),
        CallArg::Account(provider),
        CallArg::Integer(base_amount),
    ]
}

/// `removeLiquidity(shares, minBase, minTokens, deadline, withdrawer)`
pub fn remove_liquidity_args(
    shares: I256,
    min_base: I256,
    min_tokens: I256,
    deadline: I256,
    withdrawer: Address,
) -> Vec<CallArg> {
    vec![
        CallArg::Integer(shares),
        CallArg::Integer(min_base),
        CallArg::Integer(min_tokens),
        CallArg::Integer(deadline),
        CallArg::Account(withdrawer),
    ]
}

/// `approve(owner, spender, amount)`
pub fn approve_args(owner: Address, spender: Address, amount: I256) -> Vec<CallArg> {
    vec![
        CallArg::Account(owner),
        CallArg::Account(spender),
        CallArg::Integer(amount),
    ]
}
