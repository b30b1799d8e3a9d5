//! In-memory remote ledger for tests
//!
//! [`SimulatedLedger`] executes the factory, exchange and token contracts
//! against plain balance maps using the same pricing as the real contracts.
//! Submissions are queued and only executed when confirmation is awaited, so a
//! rejected operation leaves every balance untouched.
//!
//! Fault injection covers the failure modes the mirror and runner must
//! survive: transient read outages, malformed payloads, confirmation timeouts,
//! a mispricing exchange, a lying registry and broken share accounting.

use crate::gateway::{ConfirmationOutcome, GatewayError, OperationId, RemoteLedgerGateway};
use amm::{AmmError, LiquidityPool, PairReserves, U256};
use async_trait::async_trait;
use codec::{encode_integer, methods, ArgReader, CallArg, CodecError};
use parking_lot::Mutex;
use std::collections::{BTreeMap, HashMap};
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;
use types::{Address, Signer, I256};

/// One submission as the gateway received it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SubmittedCall {
    pub id: OperationId,
    pub contract: Address,
    pub method: String,
    pub args: Vec<CallArg>,
    pub signer: Address,
}

#[derive(Debug, Clone, Default)]
struct Book {
    /// Keyed by (asset, account); the base asset, tokens and exchange shares
    /// all live here
    balances: HashMap<(Address, Address), I256>,
    /// Keyed by (asset, owner, spender)
    allowances: HashMap<(Address, Address, Address), I256>,
    supplies: HashMap<Address, I256>,
}

#[derive(Debug, Default)]
struct Faults {
    failing_reads: u32,
    corrupt_methods: Vec<String>,
    timed_out_confirmations: u32,
    confirmation_delay: Option<Duration>,
    skims: HashMap<Address, I256>,
    refuse_submissions: bool,
}

#[derive(Debug, Default)]
struct Inner {
    book: Book,
    /// exchange -> token
    pairs: BTreeMap<Address, Address>,
    registry_overrides: HashMap<Address, Address>,
    reported_token_overrides: HashMap<Address, Address>,
    pending: HashMap<OperationId, SubmittedCall>,
    submitted: Vec<SubmittedCall>,
    next_id: u64,
    reads: u64,
    network_fee: I256,
    faults: Faults,
}

pub struct SimulatedLedger {
    base_asset: Address,
    factory: Address,
    inner: Mutex<Inner>,
}

impl SimulatedLedger {
    pub fn new(base_asset: Address, factory: Address) -> Self {
        Self {
            base_asset,
            factory,
            inner: Mutex::new(Inner::default()),
        }
    }

    pub fn base_asset(&self) -> Address {
        self.base_asset
    }

    pub fn factory(&self) -> Address {
        self.factory
    }

    /// Deploy an exchange for `token` and register it with the factory
    pub fn register_pair(&self, token: Address, exchange: Address) {
        self.inner.lock().pairs.insert(exchange, token);
    }

    /// Credit `amount` of `asset` to `account`, growing its supply
    pub fn mint(&self, asset: Address, account: Address, amount: I256) {
        let mut inner = self.inner.lock();
        let book = &mut inner.book;
        let balance = book.balance(asset, account);
        book.balances.insert((asset, account), balance.saturating_add(amount));
        let supply = book.supply(asset);
        book.supplies.insert(asset, supply.saturating_add(amount));
    }

    /// Fund an exchange directly and mint `base` shares to `provider`
    pub fn seed_liquidity(&self, exchange: Address, provider: Address, base: I256, tokens: I256) {
        let token = match self.inner.lock().pairs.get(&exchange) {
            Some(token) => *token,
            None => return,
        };
        self.mint(self.base_asset, exchange, base);
        self.mint(token, exchange, tokens);
        self.mint(exchange, provider, base);
    }

    pub fn set_allowance(&self, asset: Address, owner: Address, spender: Address, amount: I256) {
        self.inner
            .lock()
            .book
            .allowances
            .insert((asset, owner, spender), amount);
    }

    pub fn balance(&self, asset: Address, account: Address) -> I256 {
        self.inner.lock().book.balance(asset, account)
    }

    pub fn allowance(&self, asset: Address, owner: Address, spender: Address) -> I256 {
        self.inner.lock().book.allowance(asset, owner, spender)
    }

    pub fn total_supply(&self, asset: Address) -> I256 {
        self.inner.lock().book.supply(asset)
    }

    /// Every submission so far, in order
    pub fn submitted_calls(&self) -> Vec<SubmittedCall> {
        self.inner.lock().submitted.clone()
    }

    /// Number of read calls served or failed
    pub fn read_count(&self) -> u64 {
        self.inner.lock().reads
    }

    /// Charge every confirmed operation a base-asset fee
    pub fn set_network_fee(&self, fee: I256) {
        self.inner.lock().network_fee = fee;
    }

    /// Fail the next `count` reads with a transient outage
    pub fn fail_next_reads(&self, count: u32) {
        self.inner.lock().faults.failing_reads = count;
    }

    /// Answer every read of `method` with an oversized payload
    pub fn corrupt_responses(&self, method: &str) {
        self.inner
            .lock()
            .faults
            .corrupt_methods
            .push(method.to_string());
    }

    /// The next `count` confirmations execute but report a timeout
    pub fn time_out_next_confirmations(&self, count: u32) {
        self.inner.lock().faults.timed_out_confirmations = count;
    }

    /// Hold every confirmation for `delay` before executing it
    pub fn delay_confirmations(&self, delay: Duration) {
        self.inner.lock().faults.confirmation_delay = Some(delay);
    }

    /// `exchange` keeps back `amount` from every delivery it makes
    pub fn skim_output(&self, exchange: Address, amount: I256) {
        self.inner.lock().faults.skims.insert(exchange, amount);
    }

    pub fn refuse_submissions(&self, refuse: bool) {
        self.inner.lock().faults.refuse_submissions = refuse;
    }

    /// Factory answers `getExchange(token)` with `exchange`
    pub fn override_registry(&self, token: Address, exchange: Address) {
        self.inner.lock().registry_overrides.insert(token, exchange);
    }

    /// Exchange answers `tokenAddress()` with `token`
    pub fn override_reported_token(&self, exchange: Address, token: Address) {
        self.inner
            .lock()
            .reported_token_overrides
            .insert(exchange, token);
    }

    /// Grow an exchange's share supply without crediting any holder
    pub fn skew_share_supply(&self, exchange: Address, delta: I256) {
        let mut inner = self.inner.lock();
        let supply = inner.book.supply(exchange);
        inner
            .book
            .supplies
            .insert(exchange, supply.saturating_add(delta));
    }

    fn begin_read(&self, method: &str) -> Result<bool, GatewayError> {
        let mut inner = self.inner.lock();
        inner.reads += 1;
        if inner.faults.failing_reads > 0 {
            inner.faults.failing_reads -= 1;
            return Err(GatewayError::Unavailable(format!(
                "simulated outage reading {method}"
            )));
        }
        Ok(inner.faults.corrupt_methods.iter().any(|m| m == method))
    }

    fn read_contract(
        &self,
        inner: &Inner,
        contract: Address,
        method: &str,
        args: &[CallArg],
    ) -> Result<Vec<u8>, GatewayError> {
        let reader = ArgReader::new(method, args);

        if contract == self.factory {
            return match method {
                methods::GET_EXCHANGE => {
                    let token = reader.address(0)?;
                    let exchange = inner
                        .registry_overrides
                        .get(&token)
                        .copied()
                        .or_else(|| {
                            inner
                                .pairs
                                .iter()
                                .find(|(_, t)| **t == token)
                                .map(|(e, _)| *e)
                        })
                        .unwrap_or_default();
                    Ok(exchange.as_bytes().to_vec())
                }
                methods::GET_TOKEN => {
                    let exchange = reader.address(0)?;
                    let token = inner.pairs.get(&exchange).copied().unwrap_or_default();
                    Ok(token.as_bytes().to_vec())
                }
                _ => Err(unknown_method(contract, method)),
            };
        }

        match method {
            methods::TOKEN_ADDRESS => {
                let token = inner
                    .reported_token_overrides
                    .get(&contract)
                    .or_else(|| inner.pairs.get(&contract))
                    .copied()
                    .unwrap_or_default();
                Ok(token.as_bytes().to_vec())
            }
            methods::FACTORY_ADDRESS => Ok(self.factory.as_bytes().to_vec()),
            methods::BALANCE_OF => {
                let account = reader.address(0)?;
                Ok(encode_integer(inner.book.balance(contract, account)))
            }
            methods::ALLOWANCE => {
                let owner = reader.address(0)?;
                let spender = reader.address(1)?;
                Ok(encode_integer(inner.book.allowance(contract, owner, spender)))
            }
            methods::TOTAL_SUPPLY => Ok(encode_integer(inner.book.supply(contract))),
            _ => Err(unknown_method(contract, method)),
        }
    }
}

fn unknown_method(contract: Address, method: &str) -> GatewayError {
    GatewayError::Refused(format!("{contract} has no read-only method {method}"))
}

#[async_trait]
impl RemoteLedgerGateway for SimulatedLedger {
    async fn get_balance(&self, account: Address, asset: Address) -> Result<I256, GatewayError> {
        self.begin_read("getBalance")?;
        Ok(self.inner.lock().book.balance(asset, account))
    }

    async fn get_allowance(
        &self,
        asset: Address,
        owner: Address,
        spender: Address,
    ) -> Result<I256, GatewayError> {
        self.begin_read("getAllowance")?;
        Ok(self.inner.lock().book.allowance(asset, owner, spender))
    }

    async fn call_read_only(
        &self,
        contract: Address,
        method: &str,
        args: &[CallArg],
    ) -> Result<Vec<u8>, GatewayError> {
        if self.begin_read(method)? {
            return Ok(vec![0xab; 33]);
        }
        let inner = self.inner.lock();
        self.read_contract(&inner, contract, method, args)
    }

    async fn submit(
        &self,
        contract: Address,
        method: &str,
        args: Vec<CallArg>,
        signer: &Signer,
    ) -> Result<OperationId, GatewayError> {
        let mut inner = self.inner.lock();
        if inner.faults.refuse_submissions {
            return Err(GatewayError::Refused("simulated node refused submission".into()));
        }

        inner.next_id += 1;
        let mut hash = [0u8; 32];
        hash[24..].copy_from_slice(&inner.next_id.to_be_bytes());
        let id = OperationId(hex::encode(hash));
        let call = SubmittedCall {
            id: id.clone(),
            contract,
            method: method.to_string(),
            args,
            signer: signer.address,
        };
        debug!("Queued {} on {} as {}", method, contract, id);
        inner.submitted.push(call.clone());
        inner.pending.insert(id.clone(), call);
        Ok(id)
    }

    async fn await_confirmation(
        &self,
        operation: &OperationId,
        _timeout: Duration,
    ) -> Result<ConfirmationOutcome, GatewayError> {
        let delay = self.inner.lock().faults.confirmation_delay;
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let mut inner = self.inner.lock();
        let call = inner
            .pending
            .remove(operation)
            .ok_or_else(|| GatewayError::Refused(format!("unknown operation {operation}")))?;

        let mut book = inner.book.clone();
        let outcome = Execution {
            base_asset: self.base_asset,
            pairs: &inner.pairs,
            skims: &inner.faults.skims,
            book: &mut book,
        }
        .run(&call, inner.network_fee);

        let timed_out = inner.faults.timed_out_confirmations > 0;
        if timed_out {
            inner.faults.timed_out_confirmations -= 1;
        }

        match outcome {
            Ok(()) => {
                inner.book = book;
                if timed_out {
                    return Ok(ConfirmationOutcome::TimedOut);
                }
                Ok(ConfirmationOutcome::Confirmed)
            }
            Err(Reject(reason)) => {
                debug!("{} rejected: {}", call.method, reason);
                if timed_out {
                    return Ok(ConfirmationOutcome::TimedOut);
                }
                Ok(ConfirmationOutcome::Rejected(reason))
            }
        }
    }
}

/// Reason a contract call failed on the simulated ledger
#[derive(Debug)]
struct Reject(String);

impl From<String> for Reject {
    fn from(reason: String) -> Self {
        Reject(reason)
    }
}

impl From<&str> for Reject {
    fn from(reason: &str) -> Self {
        Reject(reason.to_string())
    }
}

impl From<CodecError> for Reject {
    fn from(e: CodecError) -> Self {
        Reject(e.to_string())
    }
}

impl From<AmmError> for Reject {
    fn from(e: AmmError) -> Self {
        Reject(e.to_string())
    }
}

type Exec<T> = Result<T, Reject>;

fn reject<T>(reason: String) -> Exec<T> {
    Err(Reject(reason))
}

/// One operation executing against a working copy of the book
struct Execution<'a> {
    base_asset: Address,
    pairs: &'a BTreeMap<Address, Address>,
    skims: &'a HashMap<Address, I256>,
    book: &'a mut Book,
}

impl Execution<'_> {
    fn run(mut self, call: &SubmittedCall, fee: I256) -> Exec<()> {
        let r = ArgReader::new(&call.method, &call.args);
        let m = call.method.as_str();

        match m {
            methods::APPROVE => self.approve(call, &r)?,
            methods::ADD_LIQUIDITY => self.add_liquidity(call, &r)?,
            methods::REMOVE_LIQUIDITY => self.remove_liquidity(call, &r)?,

            methods::BASE_TO_TOKEN_SWAP_INPUT | methods::BASE_TO_TOKEN_TRANSFER_INPUT => {
                self.base_to_token(call, &r, m == methods::BASE_TO_TOKEN_TRANSFER_INPUT, true)?
            }
            methods::BASE_TO_TOKEN_SWAP_OUTPUT | methods::BASE_TO_TOKEN_TRANSFER_OUTPUT => {
                self.base_to_token(call, &r, m == methods::BASE_TO_TOKEN_TRANSFER_OUTPUT, false)?
            }
            methods::TOKEN_TO_BASE_SWAP_INPUT | methods::TOKEN_TO_BASE_TRANSFER_INPUT => {
                self.token_to_base_input(call, &r, m == methods::TOKEN_TO_BASE_TRANSFER_INPUT)?
            }
            methods::TOKEN_TO_BASE_SWAP_OUTPUT | methods::TOKEN_TO_BASE_TRANSFER_OUTPUT => {
                self.token_to_base_output(call, &r, m == methods::TOKEN_TO_BASE_TRANSFER_OUTPUT)?
            }

            methods::TOKEN_TO_TOKEN_SWAP_INPUT | methods::TOKEN_TO_TOKEN_TRANSFER_INPUT => {
                let transfer = m == methods::TOKEN_TO_TOKEN_TRANSFER_INPUT;
                self.two_hop(call, &r, transfer, true, Target::Token)?
            }
            methods::TOKEN_TO_TOKEN_SWAP_OUTPUT | methods::TOKEN_TO_TOKEN_TRANSFER_OUTPUT => {
                let transfer = m == methods::TOKEN_TO_TOKEN_TRANSFER_OUTPUT;
                self.two_hop(call, &r, transfer, false, Target::Token)?
            }
            methods::TOKEN_TO_EXCHANGE_SWAP_INPUT | methods::TOKEN_TO_EXCHANGE_TRANSFER_INPUT => {
                let transfer = m == methods::TOKEN_TO_EXCHANGE_TRANSFER_INPUT;
                self.two_hop(call, &r, transfer, true, Target::Exchange)?
            }
            methods::TOKEN_TO_EXCHANGE_SWAP_OUTPUT | methods::TOKEN_TO_EXCHANGE_TRANSFER_OUTPUT => {
                let transfer = m == methods::TOKEN_TO_EXCHANGE_TRANSFER_OUTPUT;
                self.two_hop(call, &r, transfer, false, Target::Exchange)?
            }

            other => return reject(format!("{} has no method {}", call.contract, other)),
        }

        if !fee.is_zero() {
            self.book.debit(self.base_asset, call.signer, fee)?;
        }
        Ok(())
    }

    fn approve(&mut self, call: &SubmittedCall, r: &ArgReader<'_>) -> Exec<()> {
        r.expect_len(3)?;
        let owner = r.address(0)?;
        let spender = r.address(1)?;
        let amount = r.integer(2)?;
        authorize(call, owner)?;
        if amount.is_negative() {
            return Err("negative allowance".into());
        }
        self.book
            .allowances
            .insert((call.contract, owner, spender), amount);
        Ok(())
    }

    fn add_liquidity(&mut self, call: &SubmittedCall, r: &ArgReader<'_>) -> Exec<()> {
        r.expect_len(5)?;
        let min_liquidity = r.integer(0)?;
        let max_tokens = unsigned(r.integer(1)?)?;
        check_deadline(r.integer(2)?)?;
        let provider = r.address(3)?;
        let base_amount = unsigned(r.integer(4)?)?;
        authorize(call, provider)?;

        let exchange = call.contract;
        let token = self.token_of(exchange)?;
        let pool = LiquidityPool::new(self.reserves(exchange, token)?, unsigned(self.book.supply(exchange))?);
        let deposit = pool.deposit(base_amount, max_tokens)?;

        if !pool.share_supply.is_zero() {
            if deposit.token_amount > max_tokens {
                return reject(format!(
                    "deposit needs {} tokens, max {}",
                    deposit.token_amount, max_tokens
                ));
            }
            if signed(deposit.shares_minted)? < min_liquidity {
                return reject(format!(
                    "deposit mints {} shares, min {}",
                    deposit.shares_minted, min_liquidity
                ));
            }
        }

        self.pull(self.base_asset, provider, exchange, signed(deposit.base_amount)?)?;
        self.pull(token, provider, exchange, signed(deposit.token_amount)?)?;
        let minted = signed(deposit.shares_minted)?;
        self.book.credit(exchange, provider, minted)?;
        let supply = self.book.supply(exchange);
        self.book.supplies.insert(exchange, checked_add(supply, minted)?);
        Ok(())
    }

    fn remove_liquidity(&mut self, call: &SubmittedCall, r: &ArgReader<'_>) -> Exec<()> {
        r.expect_len(5)?;
        let shares = unsigned(r.integer(0)?)?;
        let min_base = r.integer(1)?;
        let min_tokens = r.integer(2)?;
        check_deadline(r.integer(3)?)?;
        let withdrawer = r.address(4)?;
        authorize(call, withdrawer)?;

        let exchange = call.contract;
        let token = self.token_of(exchange)?;
        let pool = LiquidityPool::new(self.reserves(exchange, token)?, unsigned(self.book.supply(exchange))?);
        let withdrawal = pool.withdraw(shares)?;

        let base_out = signed(withdrawal.base_amount)?;
        let tokens_out = signed(withdrawal.token_amount)?;
        if base_out < min_base || tokens_out < min_tokens {
            return reject(format!(
                "withdrawal of {base_out} base and {tokens_out} tokens below minimums"
            ));
        }

        let burned = signed(withdrawal.shares_burned)?;
        self.book.debit(exchange, withdrawer, burned)?;
        let supply = self.book.supply(exchange);
        self.book.supplies.insert(exchange, checked_sub(supply, burned)?);
        self.book.transfer(self.base_asset, exchange, withdrawer, base_out)?;
        self.book.transfer(token, exchange, withdrawer, tokens_out)?;
        Ok(())
    }

    /// `(amount_or_bound, deadline, [recipient], invoker, amount_or_bound)`
    fn base_to_token(
        &mut self,
        call: &SubmittedCall,
        r: &ArgReader<'_>,
        transfer: bool,
        exact_input: bool,
    ) -> Exec<()> {
        let off = usize::from(transfer);
        r.expect_len(4 + off)?;
        let first = r.integer(0)?;
        check_deadline(r.integer(1)?)?;
        let invoker = r.address(2 + off)?;
        let recipient = if transfer { r.address(2)? } else { invoker };
        let last = r.integer(3 + off)?;
        authorize(call, invoker)?;

        let exchange = call.contract;
        let token = self.token_of(exchange)?;
        let reserves = self.reserves(exchange, token)?;

        let (base_in, tokens_out) = if exact_input {
            let base_in = unsigned(last)?;
            let tokens_out = signed(reserves.base_to_token_input(base_in)?)?;
            if tokens_out < first || tokens_out.is_zero() {
                return reject(format!("bought {tokens_out} tokens, min {first}"));
            }
            (signed(base_in)?, tokens_out)
        } else {
            let tokens_out = unsigned(first)?;
            let base_in = signed(reserves.base_to_token_output(tokens_out)?)?;
            if base_in > last {
                return reject(format!("costs {base_in} base, max {last}"));
            }
            (base_in, signed(tokens_out)?)
        };

        self.pull(self.base_asset, invoker, exchange, base_in)?;
        self.deliver(token, exchange, recipient, tokens_out)
    }

    /// `(tokensSold, minBase, deadline, invoker, [recipient])`
    fn token_to_base_input(&mut self, call: &SubmittedCall, r: &ArgReader<'_>, transfer: bool) -> Exec<()> {
        r.expect_len(4 + usize::from(transfer))?;
        let tokens_in = r.integer(0)?;
        let min_base = r.integer(1)?;
        check_deadline(r.integer(2)?)?;
        let invoker = r.address(3)?;
        let recipient = if transfer { r.address(4)? } else { invoker };
        authorize(call, invoker)?;

        let exchange = call.contract;
        let token = self.token_of(exchange)?;
        let reserves = self.reserves(exchange, token)?;
        let base_out = signed(
            reserves
                .token_to_base_input(unsigned(tokens_in)?)
                ?,
        )?;
        if base_out < min_base || base_out.is_zero() {
            return reject(format!("bought {base_out} base, min {min_base}"));
        }

        self.pull(token, invoker, exchange, tokens_in)?;
        self.deliver(self.base_asset, exchange, recipient, base_out)
    }

    /// `(baseBought, maxTokens, deadline, [recipient], invoker)`
    fn token_to_base_output(&mut self, call: &SubmittedCall, r: &ArgReader<'_>, transfer: bool) -> Exec<()> {
        let off = usize::from(transfer);
        r.expect_len(4 + off)?;
        let base_out = r.integer(0)?;
        let max_tokens = r.integer(1)?;
        check_deadline(r.integer(2)?)?;
        let invoker = r.address(3 + off)?;
        let recipient = if transfer { r.address(3)? } else { invoker };
        authorize(call, invoker)?;

        let exchange = call.contract;
        let token = self.token_of(exchange)?;
        let reserves = self.reserves(exchange, token)?;
        let tokens_in = signed(
            reserves
                .token_to_base_output(unsigned(base_out)?)
                ?,
        )?;
        if tokens_in > max_tokens {
            return reject(format!("costs {tokens_in} tokens, max {max_tokens}"));
        }

        self.pull(token, invoker, exchange, tokens_in)?;
        self.deliver(self.base_asset, exchange, recipient, base_out)
    }

    /// `(amount, tokenBound, baseBound, deadline, [recipient], target, invoker)`
    fn two_hop(
        &mut self,
        call: &SubmittedCall,
        r: &ArgReader<'_>,
        transfer: bool,
        exact_input: bool,
        target: Target,
    ) -> Exec<()> {
        let off = usize::from(transfer);
        r.expect_len(6 + off)?;
        let amount = r.integer(0)?;
        let token_bound = r.integer(1)?;
        let base_bound = r.integer(2)?;
        check_deadline(r.integer(3)?)?;
        let recipient_arg = if transfer { Some(r.address(4)?) } else { None };
        let target_addr = r.address(4 + off)?;
        let invoker = r.address(5 + off)?;
        let recipient = recipient_arg.unwrap_or(invoker);
        authorize(call, invoker)?;

        let sell = call.contract;
        let sell_token = self.token_of(sell)?;
        let buy = match target {
            Target::Exchange => target_addr,
            Target::Token => self
                .pairs
                .iter()
                .find(|(_, t)| **t == target_addr)
                .map(|(e, _)| *e)
                .ok_or_else(|| format!("no exchange for token {target_addr}"))?,
        };
        if buy == sell {
            return Err("cannot route through the same exchange".into());
        }
        let buy_token = self.token_of(buy)?;
        let sell_reserves = self.reserves(sell, sell_token)?;
        let buy_reserves = self.reserves(buy, buy_token)?;

        let (tokens_in, base_moved, tokens_out) = if exact_input {
            let quote = amm::route_token_to_token(unsigned(amount)?, &sell_reserves, &buy_reserves)
                ?;
            let base_moved = signed(quote.base_amount)?;
            let tokens_out = signed(quote.amount_out)?;
            if base_moved < base_bound || tokens_out < token_bound || tokens_out.is_zero() {
                return reject(format!(
                    "route yields {base_moved} base and {tokens_out} tokens below minimums"
                ));
            }
            (amount, base_moved, tokens_out)
        } else {
            let quote = amm::route_token_to_token_output(unsigned(amount)?, &sell_reserves, &buy_reserves)
                ?;
            let base_moved = signed(quote.base_amount)?;
            let tokens_in = signed(quote.amount_in)?;
            if base_moved > base_bound || tokens_in > token_bound {
                return reject(format!(
                    "route costs {tokens_in} tokens via {base_moved} base above maximums"
                ));
            }
            (tokens_in, base_moved, amount)
        };

        self.pull(sell_token, invoker, sell, tokens_in)?;
        self.book.transfer(self.base_asset, sell, buy, base_moved)?;
        self.deliver(buy_token, buy, recipient, tokens_out)
    }

    fn token_of(&self, exchange: Address) -> Exec<Address> {
        self.pairs
            .get(&exchange)
            .copied()
            .ok_or_else(|| Reject::from(format!("{exchange} is not an exchange")))
    }

    fn reserves(&self, exchange: Address, token: Address) -> Exec<PairReserves> {
        Ok(PairReserves::new(
            unsigned(self.book.balance(self.base_asset, exchange))?,
            unsigned(self.book.balance(token, exchange))?,
        ))
    }

    /// Exchange takes `amount` of `asset` from `owner` under its allowance
    fn pull(&mut self, asset: Address, owner: Address, exchange: Address, amount: I256) -> Exec<()> {
        let allowance = self.book.allowance(asset, owner, exchange);
        if allowance < amount {
            return reject(format!(
                "allowance {allowance} of {asset} to {exchange} below {amount}"
            ));
        }
        self.book
            .allowances
            .insert((asset, owner, exchange), checked_sub(allowance, amount)?);
        self.book.transfer(asset, owner, exchange, amount)
    }

    fn deliver(&mut self, asset: Address, exchange: Address, recipient: Address, amount: I256) -> Exec<()> {
        let skim = self.skims.get(&exchange).copied().unwrap_or_else(I256::zero);
        let delivered = checked_sub(amount, skim.min(amount))?;
        self.book.transfer(asset, exchange, recipient, delivered)
    }
}

#[derive(Debug, Clone, Copy)]
enum Target {
    Token,
    Exchange,
}

impl Book {
    fn balance(&self, asset: Address, account: Address) -> I256 {
        self.balances
            .get(&(asset, account))
            .copied()
            .unwrap_or_else(I256::zero)
    }

    fn allowance(&self, asset: Address, owner: Address, spender: Address) -> I256 {
        self.allowances
            .get(&(asset, owner, spender))
            .copied()
            .unwrap_or_else(I256::zero)
    }

    fn supply(&self, asset: Address) -> I256 {
        self.supplies.get(&asset).copied().unwrap_or_else(I256::zero)
    }

    fn credit(&mut self, asset: Address, account: Address, amount: I256) -> Exec<()> {
        let balance = checked_add(self.balance(asset, account), amount)?;
        self.balances.insert((asset, account), balance);
        Ok(())
    }

    fn debit(&mut self, asset: Address, account: Address, amount: I256) -> Exec<()> {
        let balance = self.balance(asset, account);
        if balance < amount {
            return reject(format!("{account} holds {balance} of {asset}, needs {amount}"));
        }
        self.balances
            .insert((asset, account), checked_sub(balance, amount)?);
        Ok(())
    }

    fn transfer(&mut self, asset: Address, from: Address, to: Address, amount: I256) -> Exec<()> {
        if amount.is_negative() {
            return reject(format!("negative transfer of {amount}"));
        }
        self.debit(asset, from, amount)?;
        self.credit(asset, to, amount)
    }
}

fn authorize(call: &SubmittedCall, account: Address) -> Exec<()> {
    if call.signer != account {
        return reject(format!(
            "{} not signed by {}",
            call.method, account
        ));
    }
    Ok(())
}

fn check_deadline(deadline: I256) -> Exec<()> {
    let now = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default();
    if deadline < I256::from(now as i64) {
        return reject(format!("deadline {deadline} passed"));
    }
    Ok(())
}

fn unsigned(value: I256) -> Exec<U256> {
    if value.is_negative() {
        return reject(format!("negative amount {value}"));
    }
    Ok(value.into_raw())
}

fn signed(value: U256) -> Exec<I256> {
    I256::try_from(value).map_err(|_| Reject::from(format!("amount {value} out of range")))
}

fn checked_add(a: I256, b: I256) -> Exec<I256> {
    a.checked_add(b)
        .ok_or_else(|| Reject::from(format!("overflow adding {a} and {b}")))
}

fn checked_sub(a: I256, b: I256) -> Exec<I256> {
    a.checked_sub(b)
        .ok_or_else(|| Reject::from(format!("overflow subtracting {b} from {a}")))
}
