//! # Operation Runner
//!
//! Executes one operation end to end against the remote ledger and reconciles
//! what happened with what the pricing model predicted.
//!
//! ## State machine
//!
//! ```text
//! Preflight ──▶ Submitted ──▶ AwaitingConfirmation ──▶ Reconciling ──▶ Satisfied
//!     │             │                 │                     │
//!     ▼             ▼                 ▼                     ▼
//! Violated      Violated          Violated              Violated
//! (precondition) (submission)   (timeout / rejected)   (invariant)
//! ```
//!
//! Preflight refreshes the affected scope, quotes the operation against the
//! pre-state and checks balances and allowances. A short allowance runs a
//! nested approval through the same skeleton before the parent re-checks.
//! The quote taken in preflight is the one reconciled against: two-hop routes
//! are never re-quoted from post-trade reserves.
//!
//! Only [`RunnerError`]s (registry mismatch, exhausted refresh retries) escape;
//! every operation-local failure is a [`ViolationReason`] in the report.

use crate::error::RunnerError;
use crate::expectations::{Expectations, Observed};
use crate::operation::{
    add_liquidity_args, approve_args, remove_liquidity_args, AmountMode, Operation,
    OperationKind, SwapCall, SwapOrder, SwapRoute,
};
use crate::report::{OperationReport, Outcome, Phase, ViolationReason};
use crate::{log_error, log_execution, log_search, log_success, log_warning};
use amm::{PairReserves, U256};
use chrono::Utc;
use codec::{methods, CallArg};
use mirror_config::MirrorConfig;
use state_mirror::{
    ConfirmationOutcome, MirrorOptions, RemoteLedgerGateway, RetryPolicy, StateMirror,
};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;
use types::{Address, InvariantViolation, LedgerSnapshot, I256};

/// Asset the invoker must hold, and approve to `spender` when set
#[derive(Debug, Clone, Copy)]
struct Requirement {
    asset: Address,
    spender: Option<Address>,
    amount: I256,
}

/// A fully quoted call, ready to submit
#[derive(Debug)]
struct Plan {
    contract: Address,
    method: &'static str,
    args: Vec<CallArg>,
    expectations: Expectations,
    requirements: Vec<Requirement>,
}

impl Plan {
    fn short_allowances(&self, snapshot: &LedgerSnapshot, owner: Address) -> Vec<Requirement> {
        self.requirements
            .iter()
            .filter(|r| match r.spender {
                Some(spender) => snapshot.allowance(&r.asset, &owner, &spender) < r.amount,
                None => false,
            })
            .copied()
            .collect()
    }

    fn check_balances(&self, snapshot: &LedgerSnapshot, owner: Address) -> Result<(), String> {
        for r in &self.requirements {
            let held = snapshot.balance(&owner, &r.asset);
            if held < r.amount {
                return Err(format!("{owner} holds {held} of {}, needs {}", r.asset, r.amount));
            }
        }
        Ok(())
    }
}

pub struct OperationRunner {
    mirror: Arc<StateMirror>,
    gateway: Arc<dyn RemoteLedgerGateway>,
    confirmation_timeout: Duration,
    base_asset_is_fee_asset: bool,
}

impl OperationRunner {
    pub fn new(mirror: Arc<StateMirror>) -> Self {
        let identities = mirror.identities();
        let confirmation_timeout = identities.confirmation_timeout;
        let base_asset_is_fee_asset = identities.base_asset_is_fee_asset;
        Self {
            gateway: mirror.gateway(),
            mirror,
            confirmation_timeout,
            base_asset_is_fee_asset,
        }
    }

    /// Validate the configuration and build the mirror and runner over `gateway`
    pub fn from_config(
        config: &MirrorConfig,
        gateway: Arc<dyn RemoteLedgerGateway>,
    ) -> Result<Self, RunnerError> {
        let identities = config.identities()?;
        let options = MirrorOptions {
            max_concurrent_reads: config.mirror.max_concurrent_reads,
            retry: RetryPolicy {
                max_retries: config.mirror.max_retries,
                initial_backoff: Duration::from_millis(config.mirror.initial_backoff_ms),
                max_backoff: Duration::from_millis(config.mirror.max_backoff_ms),
            },
        };
        let mirror = Arc::new(StateMirror::new(gateway, identities, options));
        Ok(Self::new(mirror))
    }

    pub fn with_confirmation_timeout(mut self, confirmation_timeout: Duration) -> Self {
        self.confirmation_timeout = confirmation_timeout;
        self
    }

    pub fn mirror(&self) -> &Arc<StateMirror> {
        &self.mirror
    }

    /// Run `operations` in order; stops only on a fatal error
    pub async fn run_lane(
        &self,
        operations: &[Operation],
    ) -> Result<Vec<OperationReport>, RunnerError> {
        let mut reports = Vec::with_capacity(operations.len());
        for operation in operations {
            reports.push(self.run(operation).await?);
        }
        Ok(reports)
    }

    pub async fn run(&self, op: &Operation) -> Result<OperationReport, RunnerError> {
        let started = Instant::now();
        let mut report = OperationReport::new(op.label.clone(), op.kind.clone());
        let invoker = op.invoker_address();
        let accounts = op.accounts();
        let exchanges = op.exchanges(self.mirror.identities())?;
        log_execution!(&op.kind, "Running '{}': {}", op.label, op.kind);

        if !self.mirror.is_factory_refreshed() {
            self.mirror.refresh_factory().await?;
        }
        self.mirror.refresh_scope(&accounts, &exchanges).await?;
        let mut before = self.mirror.snapshot();
        let mut plan = match self.preflight(op, &before) {
            Ok(plan) => plan,
            Err(reason) => return Ok(self.fail_preflight(report, started, reason)),
        };
        // Unaffordable operations never trigger an approval
        if let Err(reason) = plan.check_balances(&before, invoker) {
            return Ok(self.fail_preflight(report, started, reason));
        }

        let short = plan.short_allowances(&before, invoker);
        if !short.is_empty() {
            for requirement in &short {
                let Some(spender) = requirement.spender else {
                    continue;
                };
                let nested = self
                    .approve(op, requirement.asset, spender, requirement.amount)
                    .await?;
                report.nested.push(nested);
            }

            self.mirror.refresh_scope(&accounts, &exchanges).await?;
            before = self.mirror.snapshot();
            plan = match self.preflight(op, &before) {
                Ok(plan) => plan,
                Err(reason) => return Ok(self.fail_preflight(report, started, reason)),
            };
            if let Some(still_short) = plan.short_allowances(&before, invoker).first() {
                let reason = format!(
                    "allowance of {} still below {} after approval",
                    still_short.asset, still_short.amount
                );
                return Ok(self.fail_preflight(report, started, reason));
            }
            if let Err(reason) = plan.check_balances(&before, invoker) {
                return Ok(self.fail_preflight(report, started, reason));
            }
        }

        report.step(Phase::Preflight, started, true);
        self.execute(op, plan, before, report).await
    }

    /// Approval sub-operation: the same skeleton without its own preflight refresh
    async fn approve(
        &self,
        parent: &Operation,
        asset: Address,
        spender: Address,
        amount: I256,
    ) -> Result<OperationReport, RunnerError> {
        let started = Instant::now();
        let op = Operation::new(
            format!("{}/approve", parent.label),
            parent.invoker.clone(),
            OperationKind::Approve {
                asset,
                spender,
                amount: amount.into_raw(),
            },
        );
        let mut report = OperationReport::new(op.label.clone(), op.kind.clone());
        log_search!("Allowance short, approving {} of {} to {}", amount, asset, spender);

        let before = self.mirror.snapshot();
        let plan = match self.preflight(&op, &before) {
            Ok(plan) => plan,
            Err(reason) => return Ok(self.fail_preflight(report, started, reason)),
        };
        report.step(Phase::Preflight, started, true);
        self.execute(&op, plan, before, report).await
    }

    async fn execute(
        &self,
        op: &Operation,
        plan: Plan,
        before: LedgerSnapshot,
        mut report: OperationReport,
    ) -> Result<OperationReport, RunnerError> {
        report.method = Some(plan.method);

        let started = Instant::now();
        let submitted = self
            .gateway
            .submit(plan.contract, plan.method, plan.args, &op.invoker.signer)
            .await;
        let id = match submitted {
            Ok(id) => id,
            Err(e) => {
                report.step(Phase::Submitted, started, false);
                return Ok(self.conclude(report.violate(ViolationReason::SubmissionFailed(e.to_string()))));
            }
        };
        report.step(Phase::Submitted, started, true);
        report.operation_id = Some(id.clone());
        debug!("{} submitted as {}", plan.method, id);

        // No retry past this point: the operation may still land
        let started = Instant::now();
        let confirmation = timeout(
            self.confirmation_timeout,
            self.gateway
                .await_confirmation(&id, self.confirmation_timeout),
        )
        .await;
        match confirmation {
            Ok(Ok(ConfirmationOutcome::Confirmed)) => {
                report.step(Phase::AwaitingConfirmation, started, true);
            }
            Ok(Ok(ConfirmationOutcome::Rejected(reason))) => {
                report.step(Phase::AwaitingConfirmation, started, false);
                return Ok(self.conclude(report.violate(ViolationReason::Rejected(reason))));
            }
            Ok(Ok(ConfirmationOutcome::TimedOut)) | Err(_) => {
                log_warning!(
                    "{} not confirmed within {}ms, outcome unknown",
                    id,
                    self.confirmation_timeout.as_millis()
                );
                report.step(Phase::AwaitingConfirmation, started, false);
                return Ok(self.conclude(report.violate(ViolationReason::ConfirmationTimeout {
                    indeterminate: true,
                })));
            }
            Ok(Err(e)) => {
                log_warning!("Lost track of {} while awaiting confirmation: {}", id, e);
                report.step(Phase::AwaitingConfirmation, started, false);
                return Ok(self.conclude(report.violate(ViolationReason::ConfirmationTimeout {
                    indeterminate: true,
                })));
            }
        }

        let started = Instant::now();
        let accounts = op.accounts();
        let exchanges = op.exchanges(self.mirror.identities())?;
        self.mirror.refresh_scope(&accounts, &exchanges).await?;
        let after = self.mirror.snapshot();

        let checks = plan.expectations.reconcile(&before, &after);
        let violations: Vec<InvariantViolation> = checks
            .iter()
            .filter(|c| !c.passed)
            .map(|c| InvariantViolation::from_check(op.label.clone(), c))
            .collect();
        for violation in &violations {
            log_warning!("Invariant violation: {}", violation);
        }
        report.step(Phase::Reconciling, started, violations.is_empty());
        report.checks = checks;
        report.violations = violations;

        if report.violations.is_empty() {
            Ok(self.conclude(report.finish()))
        } else {
            Ok(self.conclude(report.violate(ViolationReason::InvariantViolation)))
        }
    }

    fn fail_preflight(
        &self,
        mut report: OperationReport,
        started: Instant,
        reason: String,
    ) -> OperationReport {
        report.step(Phase::Preflight, started, false);
        self.conclude(report.violate(ViolationReason::PreconditionFailed(reason)))
    }

    fn conclude(&self, report: OperationReport) -> OperationReport {
        match &report.outcome {
            Outcome::Satisfied => log_success!(
                "'{}' satisfied: {} checks passed",
                report.label,
                report.checks.len()
            ),
            Outcome::Violated(reason) => log_error!("'{}' violated: {}", report.label, reason),
        }
        report
    }

    /// Quote `op` against `snapshot` and build the call plus its expectations
    fn preflight(&self, op: &Operation, snapshot: &LedgerSnapshot) -> Result<Plan, String> {
        let invoker = op.invoker_address();
        let base = self.mirror.identities().base_asset;
        let deadline = I256::from(
            Utc::now().timestamp() + self.confirmation_timeout.as_secs().max(1) as i64,
        );

        let mut expectations = Expectations::new();
        expectations.delta(
            Observed::Balance {
                account: invoker,
                asset: base,
            },
            I256::zero(),
        );
        if self.base_asset_is_fee_asset {
            expectations.fees_paid_by(invoker, base);
        }

        let mut plan = match &op.kind {
            OperationKind::Approve {
                asset,
                spender,
                amount,
            } => {
                let amount = signed(*amount)?;
                expectations.absolute(
                    Observed::Allowance {
                        asset: *asset,
                        owner: invoker,
                        spender: *spender,
                    },
                    amount,
                );
                Plan {
                    contract: *asset,
                    method: methods::APPROVE,
                    args: approve_args(invoker, *spender, amount),
                    expectations,
                    requirements: Vec::new(),
                }
            }
            OperationKind::AddLiquidity {
                exchange,
                base_amount,
                max_tokens,
                min_liquidity,
            } => self.plan_add_liquidity(
                snapshot,
                invoker,
                *exchange,
                *base_amount,
                *max_tokens,
                *min_liquidity,
                deadline,
                expectations,
            )?,
            OperationKind::RemoveLiquidity {
                exchange,
                shares,
                min_base,
                min_tokens,
            } => self.plan_remove_liquidity(
                snapshot,
                invoker,
                *exchange,
                *shares,
                (*min_base, *min_tokens),
                deadline,
                expectations,
            )?,
            OperationKind::Swap(order) => {
                self.plan_swap(snapshot, invoker, order, deadline, expectations)?
            }
        };

        plan.requirements.retain(|r| !r.amount.is_zero());
        Ok(plan)
    }

    #[allow(clippy::too_many_arguments)]
    fn plan_add_liquidity(
        &self,
        snapshot: &LedgerSnapshot,
        provider: Address,
        exchange: Address,
        base_amount: U256,
        max_tokens: U256,
        min_liquidity: Option<U256>,
        deadline: I256,
        mut expectations: Expectations,
    ) -> Result<Plan, String> {
        let base = self.mirror.identities().base_asset;
        let token = self.token_of(exchange)?;
        let pool = snapshot
            .exchange(&exchange)
            .and_then(|e| e.pool())
            .ok_or_else(|| format!("exchange {exchange} has a negative reserve or supply"))?;
        let deposit = pool
            .deposit(base_amount, max_tokens)
            .map_err(|e| e.to_string())?;

        if !pool.share_supply.is_zero() {
            if deposit.token_amount > max_tokens {
                return Err(format!(
                    "deposit needs {} tokens, max {}",
                    deposit.token_amount, max_tokens
                ));
            }
            if let Some(min) = min_liquidity {
                if deposit.shares_minted < min {
                    return Err(format!(
                        "deposit mints {} shares, min {}",
                        deposit.shares_minted, min
                    ));
                }
            }
        }

        let base_in = signed(deposit.base_amount)?;
        let tokens_in = signed(deposit.token_amount)?;
        let minted = signed(deposit.shares_minted)?;
        let min_liquidity = signed(min_liquidity.unwrap_or(deposit.shares_minted))?;

        expectations
            .delta(Observed::Balance { account: provider, asset: base }, -base_in)
            .delta(Observed::Balance { account: provider, asset: token }, -tokens_in)
            .delta(Observed::BaseReserve(exchange), base_in)
            .delta(Observed::TokenReserve(exchange), tokens_in)
            .delta(Observed::ShareSupply(exchange), minted)
            .delta(Observed::ShareBalance { exchange, provider }, minted)
            .delta(
                Observed::Allowance {
                    asset: base,
                    owner: provider,
                    spender: exchange,
                },
                -base_in,
            )
            .delta(
                Observed::Allowance {
                    asset: token,
                    owner: provider,
                    spender: exchange,
                },
                -tokens_in,
            );

        Ok(Plan {
            contract: exchange,
            method: methods::ADD_LIQUIDITY,
            args: add_liquidity_args(
                min_liquidity,
                signed(max_tokens)?,
                deadline,
                provider,
                base_in,
            ),
            expectations,
            requirements: vec![
                Requirement {
                    asset: base,
                    spender: Some(exchange),
                    amount: base_in,
                },
                Requirement {
                    asset: token,
                    spender: Some(exchange),
                    amount: tokens_in,
                },
            ],
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn plan_remove_liquidity(
        &self,
        snapshot: &LedgerSnapshot,
        provider: Address,
        exchange: Address,
        shares: U256,
        (min_base, min_tokens): (Option<U256>, Option<U256>),
        deadline: I256,
        mut expectations: Expectations,
    ) -> Result<Plan, String> {
        let base = self.mirror.identities().base_asset;
        let token = self.token_of(exchange)?;
        let state = snapshot
            .exchange(&exchange)
            .ok_or_else(|| format!("exchange {exchange} is not mirrored"))?;
        let held = state.share_balance(&provider);
        let burned = signed(shares)?;
        if burned.is_zero() || burned > held {
            return Err(format!("cannot burn {burned} shares, {provider} holds {held}"));
        }

        let pool = state
            .pool()
            .ok_or_else(|| format!("exchange {exchange} has a negative reserve or supply"))?;
        let withdrawal = pool.withdraw(shares).map_err(|e| e.to_string())?;
        if min_base.is_some_and(|m| withdrawal.base_amount < m)
            || min_tokens.is_some_and(|m| withdrawal.token_amount < m)
        {
            return Err(format!(
                "withdrawal of {} base and {} tokens is below the minimums",
                withdrawal.base_amount, withdrawal.token_amount
            ));
        }

        let base_out = signed(withdrawal.base_amount)?;
        let tokens_out = signed(withdrawal.token_amount)?;
        expectations
            .delta(Observed::ShareBalance { exchange, provider }, -burned)
            .delta(Observed::ShareSupply(exchange), -burned)
            .delta(Observed::BaseReserve(exchange), -base_out)
            .delta(Observed::TokenReserve(exchange), -tokens_out)
            .delta(Observed::Balance { account: provider, asset: base }, base_out)
            .delta(Observed::Balance { account: provider, asset: token }, tokens_out);

        Ok(Plan {
            contract: exchange,
            method: methods::REMOVE_LIQUIDITY,
            args: remove_liquidity_args(
                burned,
                signed(min_base.unwrap_or(withdrawal.base_amount))?,
                signed(min_tokens.unwrap_or(withdrawal.token_amount))?,
                deadline,
                provider,
            ),
            expectations,
            requirements: Vec::new(),
        })
    }

    fn plan_swap(
        &self,
        snapshot: &LedgerSnapshot,
        invoker: Address,
        order: &SwapOrder,
        deadline: I256,
        mut expectations: Expectations,
    ) -> Result<Plan, String> {
        let base = self.mirror.identities().base_asset;
        let entry = order.route.entry_exchange();
        let entry_token = self.token_of(entry)?;
        let entry_reserves = reserves(snapshot, entry)?;

        let mut call = SwapCall {
            family: order.route.family(),
            amount_kind: order.amount.kind(),
            amount: I256::zero(),
            bound: I256::zero(),
            base_bound: I256::zero(),
            deadline,
            invoker,
            recipient: order.recipient,
            target: Address::default(),
        };

        // (asset paid, amount paid, asset received, amount received)
        let (paid_asset, paid, received_asset, received) = match order.route {
            SwapRoute::BaseToToken { exchange } => {
                let (paid, received) = quote_single_hop(
                    order.amount,
                    |a| entry_reserves.base_to_token_input(a),
                    |a| entry_reserves.base_to_token_output(a),
                    &mut call,
                )?;
                expectations
                    .delta(Observed::BaseReserve(exchange), paid)
                    .delta(Observed::TokenReserve(exchange), -received)
                    .product_non_decreasing(exchange);
                (base, paid, entry_token, received)
            }
            SwapRoute::TokenToBase { exchange } => {
                let (paid, received) = quote_single_hop(
                    order.amount,
                    |a| entry_reserves.token_to_base_input(a),
                    |a| entry_reserves.token_to_base_output(a),
                    &mut call,
                )?;
                expectations
                    .delta(Observed::TokenReserve(exchange), paid)
                    .delta(Observed::BaseReserve(exchange), -received)
                    .product_non_decreasing(exchange);
                (entry_token, paid, base, received)
            }
            SwapRoute::TokenToToken {
                sell_exchange,
                buy_token,
            } => {
                let buy = self
                    .mirror
                    .identities()
                    .pair_for_token(&buy_token)
                    .ok_or_else(|| format!("no exchange trades {buy_token}"))?;
                call.target = buy_token;
                let (paid, received) = self.quote_two_hop(
                    snapshot,
                    order.amount,
                    (sell_exchange, &entry_reserves),
                    buy.exchange,
                    &mut call,
                    &mut expectations,
                )?;
                (entry_token, paid, buy.token, received)
            }
            SwapRoute::TokenToExchange {
                sell_exchange,
                target_exchange,
            } => {
                let buy_token = self.token_of(target_exchange)?;
                call.target = target_exchange;
                let (paid, received) = self.quote_two_hop(
                    snapshot,
                    order.amount,
                    (sell_exchange, &entry_reserves),
                    target_exchange,
                    &mut call,
                    &mut expectations,
                )?;
                (entry_token, paid, buy_token, received)
            }
        };

        expectations
            .delta(Observed::Balance { account: invoker, asset: paid_asset }, -paid)
            .delta(
                Observed::Balance {
                    account: order.recipient,
                    asset: received_asset,
                },
                received,
            )
            .delta(
                Observed::Allowance {
                    asset: paid_asset,
                    owner: invoker,
                    spender: entry,
                },
                -paid,
            );

        Ok(Plan {
            contract: entry,
            method: call.method(),
            args: call.args(),
            expectations,
            requirements: vec![Requirement {
                asset: paid_asset,
                spender: Some(entry),
                amount: paid,
            }],
        })
    }

    /// Compose both hops from pre-trade reserves; returns (tokens paid, tokens received)
    fn quote_two_hop(
        &self,
        snapshot: &LedgerSnapshot,
        amount: AmountMode,
        (sell, sell_reserves): (Address, &PairReserves),
        buy: Address,
        call: &mut SwapCall,
        expectations: &mut Expectations,
    ) -> Result<(I256, I256), String> {
        if sell == buy {
            return Err(format!("route sells into and buys from {sell}"));
        }
        let buy_reserves = reserves(snapshot, buy)?;

        let quote = match amount {
            AmountMode::ExactInput { amount_in, min_out } => {
                let quote = amm::route_token_to_token(amount_in, sell_reserves, &buy_reserves)
                    .map_err(|e| e.to_string())?;
                if min_out.is_some_and(|m| quote.amount_out < m) {
                    return Err(format!("route yields {}, below the minimum", quote.amount_out));
                }
                call.amount = signed(amount_in)?;
                call.bound = signed(min_out.unwrap_or(quote.amount_out))?;
                quote
            }
            AmountMode::ExactOutput { amount_out, max_in } => {
                let quote =
                    amm::route_token_to_token_output(amount_out, sell_reserves, &buy_reserves)
                        .map_err(|e| e.to_string())?;
                if max_in.is_some_and(|m| quote.amount_in > m) {
                    return Err(format!("route costs {}, above the maximum", quote.amount_in));
                }
                call.amount = signed(amount_out)?;
                call.bound = signed(max_in.unwrap_or(quote.amount_in))?;
                quote
            }
        };
        call.base_bound = signed(quote.base_amount)?;

        let paid = signed(quote.amount_in)?;
        let moved = signed(quote.base_amount)?;
        let received = signed(quote.amount_out)?;
        expectations
            .delta(Observed::TokenReserve(sell), paid)
            .delta(Observed::BaseReserve(sell), -moved)
            .delta(Observed::BaseReserve(buy), moved)
            .delta(Observed::TokenReserve(buy), -received)
            .product_non_decreasing(sell)
            .product_non_decreasing(buy);
        Ok((paid, received))
    }

    fn token_of(&self, exchange: Address) -> Result<Address, String> {
        self.mirror
            .identities()
            .pair_for_exchange(&exchange)
            .map(|p| p.token)
            .ok_or_else(|| format!("exchange {exchange} is not configured"))
    }
}

/// Quote one hop and fill the call's amount and bound; returns (paid, received)
fn quote_single_hop<I, O>(
    amount: AmountMode,
    input_price: I,
    output_price: O,
    call: &mut SwapCall,
) -> Result<(I256, I256), String>
where
    I: Fn(U256) -> amm::AmmResult<U256>,
    O: Fn(U256) -> amm::AmmResult<U256>,
{
    match amount {
        AmountMode::ExactInput { amount_in, min_out } => {
            let out = input_price(amount_in).map_err(|e| e.to_string())?;
            if min_out.is_some_and(|m| out < m) {
                return Err(format!("quote {out} is below the minimum"));
            }
            call.amount = signed(amount_in)?;
            call.bound = signed(min_out.unwrap_or(out))?;
            Ok((call.amount, signed(out)?))
        }
        AmountMode::ExactOutput { amount_out, max_in } => {
            let cost = output_price(amount_out).map_err(|e| e.to_string())?;
            if max_in.is_some_and(|m| cost > m) {
                return Err(format!("quote {cost} is above the maximum"));
            }
            call.amount = signed(amount_out)?;
            call.bound = signed(max_in.unwrap_or(cost))?;
            Ok((signed(cost)?, call.amount))
        }
    }
}

fn reserves(snapshot: &LedgerSnapshot, exchange: Address) -> Result<PairReserves, String> {
    snapshot
        .exchange(&exchange)
        .and_then(|e| e.reserves())
        .ok_or_else(|| format!("exchange {exchange} has a negative or unknown reserve"))
}

fn signed(value: U256) -> Result<I256, String> {
    I256::try_from(value).map_err(|_| format!("amount {value} exceeds the ledger integer range"))
}
