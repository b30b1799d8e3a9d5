//! Mirrored ledger entities
//!
//! These structs are overwritten field-by-field by the state mirror after each
//! refresh. Lookups of unknown keys read as zero, matching the remote ledger
//! where an absent storage slot is a zero balance.

use crate::address::Address;
use crate::identities::MirrorIdentities;
use amm::{LiquidityPool, PairReserves};
use ethers_core::types::{I256, U256};
use std::collections::BTreeMap;

/// Bidirectional token <-> exchange registry held by the factory
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FactoryState {
    pub address: Address,
    exchange_by_token: BTreeMap<Address, Address>,
    token_by_exchange: BTreeMap<Address, Address>,
    refreshed: bool,
}

impl FactoryState {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            ..Default::default()
        }
    }

    pub fn register(&mut self, token: Address, exchange: Address) {
        self.exchange_by_token.insert(token, exchange);
        self.token_by_exchange.insert(exchange, token);
    }

    pub fn exchange_for(&self, token: &Address) -> Option<Address> {
        self.exchange_by_token.get(token).copied()
    }

    pub fn token_for(&self, exchange: &Address) -> Option<Address> {
        self.token_by_exchange.get(exchange).copied()
    }

    /// Every forward entry has a matching reverse entry and vice versa
    pub fn is_consistent(&self) -> bool {
        self.exchange_by_token.len() == self.token_by_exchange.len()
            && self
                .exchange_by_token
                .iter()
                .all(|(token, exchange)| self.token_by_exchange.get(exchange) == Some(token))
    }

    pub fn is_refreshed(&self) -> bool {
        self.refreshed
    }

    pub fn mark_refreshed(&mut self) {
        self.refreshed = true;
    }

    pub fn len(&self) -> usize {
        self.exchange_by_token.len()
    }

    pub fn is_empty(&self) -> bool {
        self.exchange_by_token.is_empty()
    }
}

/// One non-base token contract
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenState {
    pub address: Address,
    pub total_supply: I256,
    pub balances: BTreeMap<Address, I256>,
    /// Keyed by (owner, spender)
    pub allowances: BTreeMap<(Address, Address), I256>,
}

impl TokenState {
    pub fn new(address: Address) -> Self {
        Self {
            address,
            total_supply: I256::zero(),
            balances: BTreeMap::new(),
            allowances: BTreeMap::new(),
        }
    }

    pub fn balance_of(&self, account: &Address) -> I256 {
        self.balances.get(account).copied().unwrap_or_else(I256::zero)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> I256 {
        self.allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_else(I256::zero)
    }

    /// Sum of every balance the mirror tracks for this token
    pub fn tracked_balance_sum(&self) -> I256 {
        self.balances
            .values()
            .fold(I256::zero(), |acc, v| acc.saturating_add(*v))
    }
}

/// One token/base exchange pair
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExchangeState {
    pub address: Address,
    pub token: Address,
    /// `tokenAddress()` as reported by the exchange itself
    pub reported_token: Option<Address>,
    /// `factoryAddress()` as reported by the exchange itself
    pub reported_factory: Option<Address>,
    pub base_liquid: I256,
    pub token_liquid: I256,
    pub share_supply: I256,
    pub share_balances: BTreeMap<Address, I256>,
}

impl ExchangeState {
    pub fn new(address: Address, token: Address) -> Self {
        Self {
            address,
            token,
            reported_token: None,
            reported_factory: None,
            base_liquid: I256::zero(),
            token_liquid: I256::zero(),
            share_supply: I256::zero(),
            share_balances: BTreeMap::new(),
        }
    }

    pub fn share_balance(&self, provider: &Address) -> I256 {
        self.share_balances
            .get(provider)
            .copied()
            .unwrap_or_else(I256::zero)
    }

    pub fn share_balance_sum(&self) -> I256 {
        self.share_balances
            .values()
            .fold(I256::zero(), |acc, v| acc.saturating_add(*v))
    }

    /// Reserves as unsigned pricing inputs; `None` if either is negative
    pub fn reserves(&self) -> Option<PairReserves> {
        Some(PairReserves::new(
            to_unsigned(self.base_liquid)?,
            to_unsigned(self.token_liquid)?,
        ))
    }

    /// Reserves plus share supply; `None` if any is negative
    pub fn pool(&self) -> Option<LiquidityPool> {
        Some(LiquidityPool::new(
            self.reserves()?,
            to_unsigned(self.share_supply)?,
        ))
    }
}

/// Base-asset balances and allowances, refreshed separately from token state
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccountLedger {
    pub base_balances: BTreeMap<Address, I256>,
    /// Keyed by (owner, exchange)
    pub base_allowances: BTreeMap<(Address, Address), I256>,
}

impl AccountLedger {
    pub fn balance_of(&self, account: &Address) -> I256 {
        self.base_balances
            .get(account)
            .copied()
            .unwrap_or_else(I256::zero)
    }

    pub fn allowance(&self, owner: &Address, spender: &Address) -> I256 {
        self.base_allowances
            .get(&(*owner, *spender))
            .copied()
            .unwrap_or_else(I256::zero)
    }
}

/// Immutable copy of the whole mirrored state at one point in time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LedgerSnapshot {
    pub base_asset: Address,
    pub factory: FactoryState,
    pub tokens: BTreeMap<Address, TokenState>,
    pub exchanges: BTreeMap<Address, ExchangeState>,
    pub accounts: AccountLedger,
}

impl LedgerSnapshot {
    /// Empty entities for every configured token and exchange
    pub fn new(identities: &MirrorIdentities) -> Self {
        Self {
            base_asset: identities.base_asset,
            factory: FactoryState::new(identities.factory),
            tokens: identities
                .pairs
                .iter()
                .map(|p| (p.token, TokenState::new(p.token)))
                .collect(),
            exchanges: identities
                .pairs
                .iter()
                .map(|p| (p.exchange, ExchangeState::new(p.exchange, p.token)))
                .collect(),
            accounts: AccountLedger::default(),
        }
    }

    /// Balance of `account` in `asset`, base asset included
    pub fn balance(&self, account: &Address, asset: &Address) -> I256 {
        if asset == &self.base_asset {
            return self.accounts.balance_of(account);
        }
        self.tokens
            .get(asset)
            .map(|t| t.balance_of(account))
            .unwrap_or_else(I256::zero)
    }

    /// Allowance granted by `owner` to `spender` in `asset`
    pub fn allowance(&self, asset: &Address, owner: &Address, spender: &Address) -> I256 {
        if asset == &self.base_asset {
            return self.accounts.allowance(owner, spender);
        }
        self.tokens
            .get(asset)
            .map(|t| t.allowance(owner, spender))
            .unwrap_or_else(I256::zero)
    }

    pub fn exchange(&self, address: &Address) -> Option<&ExchangeState> {
        self.exchanges.get(address)
    }

    pub fn token(&self, address: &Address) -> Option<&TokenState> {
        self.tokens.get(address)
    }
}

fn to_unsigned(value: I256) -> Option<U256> {
    if value.is_negative() {
        None
    } else {
        Some(value.into_raw())
    }
}
