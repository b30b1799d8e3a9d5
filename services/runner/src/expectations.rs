//! Expected deltas and their reconciliation against mirrored snapshots

use std::collections::BTreeMap;
use types::{Address, Comparison, DeltaCheck, LedgerSnapshot, Quantity, Subject, I256};

/// A single mirrored quantity an operation is expected to move
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Observed {
    Balance { account: Address, asset: Address },
    Allowance { asset: Address, owner: Address, spender: Address },
    BaseReserve(Address),
    TokenReserve(Address),
    ShareSupply(Address),
    ShareBalance { exchange: Address, provider: Address },
}

impl Observed {
    pub fn read(&self, snapshot: &LedgerSnapshot) -> I256 {
        let exchange = |address: &Address| snapshot.exchange(address);
        match self {
            Observed::Balance { account, asset } => snapshot.balance(account, asset),
            Observed::Allowance {
                asset,
                owner,
                spender,
            } => snapshot.allowance(asset, owner, spender),
            Observed::BaseReserve(e) => exchange(e).map(|x| x.base_liquid).unwrap_or_else(I256::zero),
            Observed::TokenReserve(e) => exchange(e).map(|x| x.token_liquid).unwrap_or_else(I256::zero),
            Observed::ShareSupply(e) => exchange(e).map(|x| x.share_supply).unwrap_or_else(I256::zero),
            Observed::ShareBalance { exchange: e, provider } => exchange(e)
                .map(|x| x.share_balance(provider))
                .unwrap_or_else(I256::zero),
        }
    }

    pub fn subject(&self) -> Subject {
        match *self {
            Observed::Balance { account, asset } => Subject::Balance { account, asset },
            Observed::Allowance {
                asset,
                owner,
                spender,
            } => Subject::Allowance {
                asset,
                owner,
                spender,
            },
            Observed::BaseReserve(exchange) => Subject::BaseReserve { exchange },
            Observed::TokenReserve(exchange) => Subject::TokenReserve { exchange },
            Observed::ShareSupply(exchange) => Subject::ShareSupply { exchange },
            Observed::ShareBalance { exchange, provider } => {
                Subject::ShareBalance { exchange, provider }
            }
        }
    }
}

/// Everything an operation predicts about the post-state
#[derive(Debug, Clone, Default)]
pub struct Expectations {
    deltas: BTreeMap<Observed, I256>,
    absolutes: BTreeMap<Observed, I256>,
    product_exchanges: Vec<Address>,
    /// Account whose base balance also pays network fees
    fee_payer: Option<(Address, Address)>,
}

impl Expectations {
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate `delta` on `observed`
    pub fn delta(&mut self, observed: Observed, delta: I256) -> &mut Self {
        let entry = self.deltas.entry(observed).or_insert_with(I256::zero);
        *entry = entry.saturating_add(delta);
        self
    }

    /// Expect `observed` to end at exactly `value`
    pub fn absolute(&mut self, observed: Observed, value: I256) -> &mut Self {
        self.absolutes.insert(observed, value);
        self
    }

    /// Moves `amount` of `asset` between two accounts
    pub fn transfer(&mut self, asset: Address, from: Address, to: Address, amount: I256) -> &mut Self {
        self.delta(Observed::Balance { account: from, asset }, -amount);
        self.delta(Observed::Balance { account: to, asset }, amount)
    }

    /// The constant product of `exchange` must not decrease
    pub fn product_non_decreasing(&mut self, exchange: Address) -> &mut Self {
        if !self.product_exchanges.contains(&exchange) {
            self.product_exchanges.push(exchange);
        }
        self
    }

    /// `account`'s base balance is compared as an upper bound on its delta
    pub fn fees_paid_by(&mut self, account: Address, base_asset: Address) -> &mut Self {
        self.fee_payer = Some((account, base_asset));
        self
    }

    pub fn expected_delta(&self, observed: &Observed) -> Option<I256> {
        self.deltas.get(observed).copied()
    }

    pub fn is_empty(&self) -> bool {
        self.deltas.is_empty() && self.absolutes.is_empty() && self.product_exchanges.is_empty()
    }

    /// Compare every expectation against the pre/post snapshots
    pub fn reconcile(&self, before: &LedgerSnapshot, after: &LedgerSnapshot) -> Vec<DeltaCheck> {
        let mut checks = Vec::with_capacity(self.deltas.len() + self.absolutes.len() + 2);

        for (observed, expected) in &self.deltas {
            let actual = observed.read(after).saturating_sub(observed.read(before));
            let comparison = match (observed, self.fee_payer) {
                (Observed::Balance { account, asset }, Some((payer, base)))
                    if *account == payer && *asset == base =>
                {
                    Comparison::AtMost
                }
                _ => Comparison::Exact,
            };
            checks.push(DeltaCheck::new(
                observed.subject(),
                comparison,
                Quantity::Amount(*expected),
                Quantity::Amount(actual),
            ));
        }

        for (observed, expected) in &self.absolutes {
            checks.push(DeltaCheck::exact(
                observed.subject(),
                *expected,
                observed.read(after),
            ));
        }

        for exchange in &self.product_exchanges {
            let product = |snapshot: &LedgerSnapshot| {
                snapshot
                    .exchange(exchange)
                    .and_then(|e| e.reserves())
                    .map(|r| r.product())
                    .unwrap_or_default()
            };
            checks.push(DeltaCheck::product_non_decreasing(
                *exchange,
                product(before),
                product(after),
            ));
        }

        checks
    }
}
