//! State mirror: batched refresh of the mirrored ledger entities
//!
//! Each refresh builds its full read plan, dispatches it with bounded fan-out,
//! joins every read, and only then overwrites the affected entities inside one
//! short write section. A refresh with any failed read applies nothing.

use crate::error::{MirrorError, ReadFailure};
use crate::gateway::{GatewayError, RemoteLedgerGateway};
use crate::reads::{Read, ReadValue};
use crate::retry::RetryPolicy;
use crate::scope::{ScopeKey, ScopeLocks};
use futures::stream::{self, StreamExt};
use parking_lot::{Mutex, RwLock};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, error, info, warn};
use types::invariants::{reserve_checks, share_conservation_check, tracked_supply_check};
use types::{
    Address, DeltaCheck, FactoryState, InvariantViolation, LedgerSnapshot, MirrorIdentities,
    TokenState,
};

/// Label recorded on violations found by a refresh rather than an operation
pub const REFRESH_LABEL: &str = "refresh";

#[derive(Debug, Clone)]
pub struct MirrorOptions {
    /// Concurrent gateway reads per refresh
    pub max_concurrent_reads: usize,
    pub retry: RetryPolicy,
}

impl Default for MirrorOptions {
    fn default() -> Self {
        Self {
            max_concurrent_reads: 16,
            retry: RetryPolicy::default(),
        }
    }
}

/// What one refresh did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RefreshStats {
    pub reads: usize,
    pub violations: usize,
}

impl RefreshStats {
    fn merge(self, other: RefreshStats) -> RefreshStats {
        RefreshStats {
            reads: self.reads + other.reads,
            violations: self.violations + other.violations,
        }
    }
}

pub struct StateMirror {
    gateway: Arc<dyn RemoteLedgerGateway>,
    identities: Arc<MirrorIdentities>,
    options: MirrorOptions,
    state: RwLock<LedgerSnapshot>,
    scopes: ScopeLocks,
    violations: Mutex<Vec<InvariantViolation>>,
}

impl StateMirror {
    pub fn new(
        gateway: Arc<dyn RemoteLedgerGateway>,
        identities: MirrorIdentities,
        options: MirrorOptions,
    ) -> Self {
        let state = LedgerSnapshot::new(&identities);
        Self {
            gateway,
            identities: Arc::new(identities),
            options,
            state: RwLock::new(state),
            scopes: ScopeLocks::new(),
            violations: Mutex::new(Vec::new()),
        }
    }

    pub fn identities(&self) -> &MirrorIdentities {
        &self.identities
    }

    /// Gateway shared with operation submission
    pub fn gateway(&self) -> Arc<dyn RemoteLedgerGateway> {
        Arc::clone(&self.gateway)
    }

    /// Owned copy of the current mirrored state
    pub fn snapshot(&self) -> LedgerSnapshot {
        self.state.read().clone()
    }

    pub fn is_factory_refreshed(&self) -> bool {
        self.state.read().factory.is_refreshed()
    }

    /// Every violation recorded so far, oldest first
    pub fn violations(&self) -> Vec<InvariantViolation> {
        self.violations.lock().clone()
    }

    /// Drain the violation log
    pub fn take_violations(&self) -> Vec<InvariantViolation> {
        std::mem::take(&mut *self.violations.lock())
    }

    /// Verify the factory registry against the configured pairs
    ///
    /// Any disagreement is [`MirrorError::RegistryMismatch`] and leaves the
    /// factory unrefreshed.
    pub async fn refresh_factory(&self) -> Result<RefreshStats, MirrorError> {
        let _guard = self.scopes.acquire([ScopeKey::Factory]).await;

        let reads: Vec<Read> = self
            .identities
            .pairs
            .iter()
            .flat_map(|p| {
                [
                    Read::RegisteredExchange { token: p.token },
                    Read::RegisteredToken {
                        exchange: p.exchange,
                    },
                ]
            })
            .collect();
        let total = reads.len();
        let values: HashMap<Read, ReadValue> =
            self.execute_reads("factory", reads).await?.into_iter().collect();

        let mut factory = FactoryState::new(self.identities.factory);
        for pair in &self.identities.pairs {
            let registered_exchange = address_value(&values, Read::RegisteredExchange { token: pair.token });
            if registered_exchange != pair.exchange {
                return Err(self.mismatch("getExchange", pair.token, pair.exchange, registered_exchange));
            }

            let registered_token = address_value(
                &values,
                Read::RegisteredToken {
                    exchange: pair.exchange,
                },
            );
            if registered_token != pair.token {
                return Err(self.mismatch("getToken", pair.exchange, pair.token, registered_token));
            }

            factory.register(pair.token, pair.exchange);
        }
        factory.mark_refreshed();
        self.state.write().factory = factory;

        info!(
            "✅ Factory registry verified: {} pairs",
            self.identities.pairs.len()
        );
        Ok(RefreshStats {
            reads: total,
            violations: 0,
        })
    }

    /// Balances and allowances of every tracked account
    pub async fn refresh_accounts(&self) -> Result<RefreshStats, MirrorError> {
        let accounts = self.identities.tracked_accounts();
        let exchanges = self.identities.exchanges();
        self.refresh("accounts", &accounts, &exchanges, &[]).await
    }

    /// Accounts restricted to `accounts`, with allowances toward `exchanges`
    pub async fn refresh_accounts_for(
        &self,
        accounts: &[Address],
        exchanges: &[Address],
    ) -> Result<RefreshStats, MirrorError> {
        self.refresh("accounts", accounts, exchanges, &[]).await
    }

    /// Reserves, shares and self-reported identities of every exchange
    pub async fn refresh_exchanges(&self) -> Result<RefreshStats, MirrorError> {
        let exchanges = self.identities.exchanges();
        self.refresh("exchanges", &[], &[], &exchanges).await
    }

    /// Exchanges restricted to `exchanges`
    pub async fn refresh_exchanges_for(
        &self,
        exchanges: &[Address],
    ) -> Result<RefreshStats, MirrorError> {
        self.refresh("exchanges", &[], &[], exchanges).await
    }

    /// Accounts and exchanges affected by one operation, applied together
    pub async fn refresh_scope(
        &self,
        accounts: &[Address],
        exchanges: &[Address],
    ) -> Result<RefreshStats, MirrorError> {
        self.refresh("scope", accounts, exchanges, exchanges).await
    }

    /// Factory first, then every account and exchange
    pub async fn refresh_all(&self) -> Result<RefreshStats, MirrorError> {
        let factory = self.refresh_factory().await?;
        let accounts = self.identities.tracked_accounts();
        let exchanges = self.identities.exchanges();
        let rest = self.refresh("all", &accounts, &exchanges, &exchanges).await?;
        Ok(factory.merge(rest))
    }

    async fn refresh(
        &self,
        scope: &'static str,
        accounts: &[Address],
        allowance_exchanges: &[Address],
        exchanges: &[Address],
    ) -> Result<RefreshStats, MirrorError> {
        for exchange in allowance_exchanges.iter().chain(exchanges) {
            if self.identities.pair_for_exchange(exchange).is_none() {
                return Err(MirrorError::UnknownExchange(*exchange));
            }
        }
        let factory_refreshed = self.state.read().factory.is_refreshed();
        if !exchanges.is_empty() && !factory_refreshed {
            return Err(MirrorError::FactoryNotRefreshed);
        }

        let keys = accounts
            .iter()
            .map(|a| ScopeKey::Account(*a))
            .chain(exchanges.iter().map(|e| ScopeKey::Exchange(*e)));
        let _guard = self.scopes.acquire(keys).await;

        let account_reads = self.account_reads(accounts, allowance_exchanges);
        let exchange_reads = self.exchange_reads(exchanges);
        let total = account_reads.len() + exchange_reads.len();

        let (account_values, exchange_values) = tokio::try_join!(
            self.execute_reads("accounts", account_reads),
            self.execute_reads("exchanges", exchange_reads)
        )?;

        self.cross_check_exchanges(&exchange_values)?;

        let checks = {
            let mut state = self.state.write();
            for (read, value) in account_values.into_iter().chain(exchange_values) {
                apply(&mut state, read, value);
            }
            let every_holder_read = self
                .identities
                .tracked_accounts()
                .iter()
                .all(|a| accounts.contains(a));
            self.post_refresh_checks(&state, every_holder_read, exchanges)
        };

        let violations = self.record(checks);
        debug!(
            "{} refresh complete: {} reads, {} violations",
            scope, total, violations
        );
        Ok(RefreshStats {
            reads: total,
            violations,
        })
    }

    fn account_reads(&self, accounts: &[Address], exchanges: &[Address]) -> Vec<Read> {
        if accounts.is_empty() {
            return Vec::new();
        }
        let tokens: BTreeSet<Address> = exchanges
            .iter()
            .filter_map(|e| self.identities.pair_for_exchange(e))
            .map(|p| p.token)
            .collect();

        let mut reads = Vec::new();
        for &account in accounts {
            reads.push(Read::BaseBalance { account });
            for &token in &tokens {
                reads.push(Read::TokenBalance { token, account });
            }
            for pair in exchanges
                .iter()
                .filter_map(|e| self.identities.pair_for_exchange(e))
            {
                reads.push(Read::BaseAllowance {
                    owner: account,
                    spender: pair.exchange,
                });
                reads.push(Read::TokenAllowance {
                    token: pair.token,
                    owner: account,
                    spender: pair.exchange,
                });
            }
        }
        reads.extend(tokens.into_iter().map(|token| Read::TokenSupply { token }));
        reads
    }

    fn exchange_reads(&self, exchanges: &[Address]) -> Vec<Read> {
        let providers = self.identities.tracked_accounts();
        let mut reads = Vec::new();
        for pair in exchanges
            .iter()
            .filter_map(|e| self.identities.pair_for_exchange(e))
        {
            let exchange = pair.exchange;
            reads.push(Read::BaseBalance { account: exchange });
            reads.push(Read::TokenBalance {
                token: pair.token,
                account: exchange,
            });
            reads.push(Read::TokenSupply { token: pair.token });
            reads.push(Read::ExchangeToken { exchange });
            reads.push(Read::ExchangeFactory { exchange });
            reads.push(Read::ShareSupply { exchange });
            for &provider in &providers {
                reads.push(Read::ShareBalance { exchange, provider });
            }
        }
        reads
    }

    /// Dispatch reads with bounded fan-out; fail if any read failed after retries
    async fn execute_reads(
        &self,
        scope: &'static str,
        reads: Vec<Read>,
    ) -> Result<Vec<(Read, ReadValue)>, MirrorError> {
        if reads.is_empty() {
            return Ok(Vec::new());
        }

        let total = reads.len();
        let gateway: &dyn RemoteLedgerGateway = self.gateway.as_ref();
        let retry = &self.options.retry;
        let base_asset = self.identities.base_asset;
        let factory = self.identities.factory;

        let outcomes: Vec<(Read, Result<ReadValue, GatewayError>)> = stream::iter(reads)
            .map(move |read| async move {
                let label = read.to_string();
                let result = retry
                    .run(&label, move || async move {
                        read.execute(gateway, base_asset, factory).await
                    })
                    .await;
                (read, result)
            })
            .buffer_unordered(self.options.max_concurrent_reads.max(1))
            .collect()
            .await;

        let mut values = Vec::with_capacity(total);
        let mut failures = Vec::new();
        for (read, result) in outcomes {
            match result {
                Ok(value) => values.push((read, value)),
                Err(error) => failures.push(ReadFailure { read, error }),
            }
        }

        if !failures.is_empty() {
            error!(
                "❌ {} refresh failed: {} of {} reads failed, nothing applied",
                scope,
                failures.len(),
                total
            );
            return Err(MirrorError::RefreshFailed {
                scope,
                total,
                failures,
            });
        }

        debug!("{} reads joined for {} refresh", total, scope);
        Ok(values)
    }

    /// Exchanges must report the token and factory the registry says they have
    fn cross_check_exchanges(&self, values: &[(Read, ReadValue)]) -> Result<(), MirrorError> {
        let factory = self.state.read().factory.clone();
        for (read, value) in values {
            let ReadValue::Address(actual) = *value else {
                continue;
            };
            match *read {
                Read::ExchangeToken { exchange } => {
                    let expected = factory
                        .token_for(&exchange)
                        .or_else(|| self.identities.pair_for_exchange(&exchange).map(|p| p.token))
                        .unwrap_or_default();
                    if actual != expected {
                        return Err(self.mismatch("tokenAddress", exchange, expected, actual));
                    }
                }
                Read::ExchangeFactory { exchange } => {
                    if actual != self.identities.factory {
                        return Err(self.mismatch(
                            "factoryAddress",
                            exchange,
                            self.identities.factory,
                            actual,
                        ));
                    }
                }
                _ => {}
            }
        }
        Ok(())
    }

    fn post_refresh_checks(
        &self,
        state: &LedgerSnapshot,
        every_holder_read: bool,
        exchanges: &[Address],
    ) -> Vec<DeltaCheck> {
        let mut checks = Vec::new();
        for exchange in exchanges.iter().filter_map(|e| state.exchange(e)) {
            checks.push(share_conservation_check(exchange));
            checks.extend(reserve_checks(exchange));

            // Cached balances from earlier refreshes may predate this reserve
            if every_holder_read {
                if let Some(token) = state.token(&exchange.token) {
                    checks.push(tracked_supply_check(token));
                }
            }
        }
        checks
    }

    fn record(&self, checks: Vec<DeltaCheck>) -> usize {
        let failed: Vec<InvariantViolation> = checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| InvariantViolation::from_check(REFRESH_LABEL, c))
            .collect();
        for violation in &failed {
            warn!("⚠️ Invariant violation: {}", violation);
        }
        let count = failed.len();
        self.violations.lock().extend(failed);
        count
    }

    fn mismatch(
        &self,
        query: &'static str,
        subject: Address,
        expected: Address,
        actual: Address,
    ) -> MirrorError {
        error!(
            "❌ Registry mismatch: {}({}) = {}, configured {}",
            query, subject, actual, expected
        );
        MirrorError::RegistryMismatch {
            query,
            subject,
            expected,
            actual,
        }
    }
}

fn address_value(values: &HashMap<Read, ReadValue>, read: Read) -> Address {
    match values.get(&read) {
        Some(ReadValue::Address(address)) => *address,
        _ => Address::default(),
    }
}

/// Overwrite the entity field a read refers to
fn apply(state: &mut LedgerSnapshot, read: Read, value: ReadValue) {
    match (read, value) {
        (Read::BaseBalance { account }, ReadValue::Amount(amount)) => {
            state.accounts.base_balances.insert(account, amount);
            if let Some(ex) = state.exchanges.get_mut(&account) {
                ex.base_liquid = amount;
            }
        }
        (Read::BaseAllowance { owner, spender }, ReadValue::Amount(amount)) => {
            state
                .accounts
                .base_allowances
                .insert((owner, spender), amount);
        }
        (Read::TokenBalance { token, account }, ReadValue::Amount(amount)) => {
            token_entry(state, token).balances.insert(account, amount);
            if let Some(ex) = state.exchanges.get_mut(&account) {
                if ex.token == token {
                    ex.token_liquid = amount;
                }
            }
        }
        (
            Read::TokenAllowance {
                token,
                owner,
                spender,
            },
            ReadValue::Amount(amount),
        ) => {
            token_entry(state, token)
                .allowances
                .insert((owner, spender), amount);
        }
        (Read::TokenSupply { token }, ReadValue::Amount(amount)) => {
            token_entry(state, token).total_supply = amount;
        }
        (Read::ShareBalance { exchange, provider }, ReadValue::Amount(amount)) => {
            if let Some(ex) = state.exchanges.get_mut(&exchange) {
                ex.share_balances.insert(provider, amount);
            }
        }
        (Read::ShareSupply { exchange }, ReadValue::Amount(amount)) => {
            if let Some(ex) = state.exchanges.get_mut(&exchange) {
                ex.share_supply = amount;
            }
        }
        (Read::ExchangeToken { exchange }, ReadValue::Address(address)) => {
            if let Some(ex) = state.exchanges.get_mut(&exchange) {
                ex.reported_token = Some(address);
            }
        }
        (Read::ExchangeFactory { exchange }, ReadValue::Address(address)) => {
            if let Some(ex) = state.exchanges.get_mut(&exchange) {
                ex.reported_factory = Some(address);
            }
        }
        _ => {}
    }
}

fn token_entry(state: &mut LedgerSnapshot, token: Address) -> &mut TokenState {
    state
        .tokens
        .entry(token)
        .or_insert_with(|| TokenState::new(token))
}
