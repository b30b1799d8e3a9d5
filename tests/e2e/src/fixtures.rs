//! Deployments: a simulated ledger plus a runner built from a real config file

use anyhow::{Context, Result};
use operation_runner::{
    AmountMode, Operation, OperationKind, OperationRunner, Supervisor, SwapOrder, SwapRoute,
};
use state_mirror::testing::SimulatedLedger;
use std::fmt::Write as _;
use std::sync::Arc;
use tempfile::TempDir;
use tracing::debug;
use types::{Address, Participant, I256};

pub const BASE: u8 = 0x01;
pub const FACTORY: u8 = 0x02;
pub const PROVIDER: u8 = 0x05;
pub const TRADER: u8 = 0x06;
pub const COUNTERPARTY: u8 = 0x07;
pub const OBSERVER: u8 = 0x08;

/// (token, exchange) byte pairs deployed by default
pub const PAIRS: [(u8, u8); 3] = [(0x10, 0x20), (0x11, 0x21), (0x12, 0x22)];

pub fn addr(b: u8) -> Address {
    Address::new([b; 20])
}

pub fn amount(v: i64) -> I256 {
    I256::from(v)
}

fn hex_of(b: u8) -> String {
    format!("{b:02x}").repeat(20)
}

/// Builds a deployment configuration and renders it as the TOML file the
/// runner loads
#[derive(Debug, Clone)]
pub struct DeploymentBuilder {
    pairs: Vec<(u8, u8)>,
    participants: Vec<(&'static str, u8)>,
    observers: Vec<u8>,
    confirmation_timeout_secs: u64,
    max_retries: u32,
    base_asset_is_fee_asset: bool,
}

impl Default for DeploymentBuilder {
    fn default() -> Self {
        Self {
            pairs: PAIRS.to_vec(),
            participants: vec![
                ("provider-0", PROVIDER),
                ("trader-0", TRADER),
                ("trader-1", COUNTERPARTY),
            ],
            observers: vec![OBSERVER],
            confirmation_timeout_secs: 5,
            max_retries: 2,
            base_asset_is_fee_asset: false,
        }
    }
}

impl DeploymentBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fee_asset(mut self, enabled: bool) -> Self {
        self.base_asset_is_fee_asset = enabled;
        self
    }

    pub fn confirmation_timeout_secs(mut self, secs: u64) -> Self {
        self.confirmation_timeout_secs = secs;
        self
    }

    pub fn max_retries(mut self, retries: u32) -> Self {
        self.max_retries = retries;
        self
    }

    pub fn render_toml(&self) -> String {
        let mut out = String::new();
        let observers: Vec<String> = self
            .observers
            .iter()
            .map(|b| format!("\"{}\"", hex_of(*b)))
            .collect();
        let _ = writeln!(out, "observers = [{}]", observers.join(", "));

        let _ = writeln!(out, "\n[network]");
        let _ = writeln!(out, "rpc_address = \"http://127.0.0.1:20336\"");
        let _ = writeln!(out, "gas_price = 0");
        let _ = writeln!(
            out,
            "confirmation_timeout_secs = {}",
            self.confirmation_timeout_secs
        );

        let _ = writeln!(out, "\n[contracts]");
        let _ = writeln!(out, "base_asset = \"{}\"", hex_of(BASE));
        let _ = writeln!(out, "factory = \"0x{}\"", hex_of(FACTORY));
        for (token, exchange) in &self.pairs {
            let _ = writeln!(out, "\n[[contracts.pairs]]");
            let _ = writeln!(out, "token = \"{}\"", hex_of(*token));
            let _ = writeln!(out, "exchange = \"{}\"", hex_of(*exchange));
        }

        for (index, (label, b)) in self.participants.iter().enumerate() {
            let _ = writeln!(out, "\n[[participants]]");
            let _ = writeln!(out, "label = \"{label}\"");
            let _ = writeln!(out, "address = \"{}\"", hex_of(*b));
            let _ = writeln!(out, "key_ref = \"wallet:{index}\"");
        }

        let _ = writeln!(out, "\n[mirror]");
        let _ = writeln!(out, "max_concurrent_reads = 8");
        let _ = writeln!(out, "max_retries = {}", self.max_retries);
        let _ = writeln!(out, "initial_backoff_ms = 1");
        let _ = writeln!(out, "max_backoff_ms = 4");
        let _ = writeln!(
            out,
            "base_asset_is_fee_asset = {}",
            self.base_asset_is_fee_asset
        );

        let _ = writeln!(out, "\n[logging]");
        let _ = writeln!(out, "level = \"debug\"");
        out
    }

    /// Write the config to a scratch directory, load it back and wire the
    /// runner to a fresh simulated ledger with every pair registered
    pub fn build(self) -> Result<Deployment> {
        let dir = tempfile::tempdir().context("creating deployment directory")?;
        let path = dir.path().join("mirror.toml");
        std::fs::write(&path, self.render_toml()).context("writing deployment config")?;

        let config = mirror_config::load_config(&path)?;
        let ledger = Arc::new(SimulatedLedger::new(addr(BASE), addr(FACTORY)));
        for (token, exchange) in &self.pairs {
            ledger.register_pair(addr(*token), addr(*exchange));
        }

        let runner = OperationRunner::from_config(&config, ledger.clone())
            .context("building runner from config")?;
        debug!("Deployment loaded from {}", path.display());

        Ok(Deployment {
            ledger,
            runner: Arc::new(runner),
            _dir: dir,
        })
    }
}

/// One simulated deployment under test
pub struct Deployment {
    pub ledger: Arc<SimulatedLedger>,
    pub runner: Arc<OperationRunner>,
    _dir: TempDir,
}

impl Deployment {
    pub fn supervisor(&self) -> Supervisor {
        Supervisor::new(Arc::clone(&self.runner))
    }

    pub fn participant(&self, label: &str) -> Result<Participant> {
        self.runner
            .mirror()
            .identities()
            .participant(label)
            .cloned()
            .with_context(|| format!("no participant labelled {label}"))
    }

    /// Exchange `exchange` holds `base`/`tokens`, all shares owned by `provider`
    pub fn seed_pool(&self, exchange: u8, provider: u8, base: i64, tokens: i64) {
        self.ledger
            .seed_liquidity(addr(exchange), addr(provider), amount(base), amount(tokens));
    }

    pub fn fund(&self, asset: u8, account: u8, value: i64) {
        self.ledger.mint(addr(asset), addr(account), amount(value));
    }

    pub fn balance(&self, asset: u8, account: u8) -> I256 {
        self.ledger.balance(addr(asset), addr(account))
    }

    pub fn swap(
        &self,
        label: &str,
        invoker: &str,
        route: SwapRoute,
        amount: AmountMode,
        recipient: u8,
    ) -> Result<Operation> {
        Ok(Operation::new(
            label,
            self.participant(invoker)?,
            OperationKind::Swap(SwapOrder {
                route,
                amount,
                recipient: addr(recipient),
            }),
        ))
    }
}
