//! A token-to-token route is reconciled against the quote composed from
//! pre-trade reserves, which a post-trade recomputation cannot reproduce

use crate::fixtures::{addr, Deployment, DeploymentBuilder, PROVIDER, TRADER};
use crate::framework::{TestFramework, TestMetrics, TestResult, TestScenario};
use crate::validation::ReportValidator;
use amm::{route_token_to_token, U256};
use anyhow::{Context, Result};
use async_trait::async_trait;
use operation_runner::{AmountMode, SwapRoute};
use types::{LedgerSnapshot, I256};

const SELL_EXCHANGE: u8 = 0x20;
const SELL_TOKEN: u8 = 0x10;
const BUY_EXCHANGE: u8 = 0x21;
const BUY_TOKEN: u8 = 0x11;
const SOLD: u64 = 50;

pub struct TwoHopQuoteTest;

fn reserves(snapshot: &LedgerSnapshot, exchange: u8) -> Result<amm::PairReserves> {
    snapshot
        .exchange(&addr(exchange))
        .and_then(|e| e.reserves())
        .with_context(|| format!("no reserves mirrored for exchange {exchange:#x}"))
}

#[async_trait]
impl TestScenario for TwoHopQuoteTest {
    async fn setup(&self, _framework: &TestFramework) -> Result<Deployment> {
        let deployment = DeploymentBuilder::new().build()?;
        deployment.seed_pool(SELL_EXCHANGE, PROVIDER, 1_000, 1_000);
        deployment.seed_pool(BUY_EXCHANGE, PROVIDER, 1_000, 1_000);
        deployment.fund(SELL_TOKEN, TRADER, 1_000);
        Ok(deployment)
    }

    async fn execute(&self, deployment: &Deployment) -> Result<TestResult> {
        let mirror = deployment.runner.mirror();
        mirror.refresh_all().await?;
        let before = mirror.snapshot();
        let sell_before = reserves(&before, SELL_EXCHANGE)?;
        let buy_before = reserves(&before, BUY_EXCHANGE)?;
        let quote = route_token_to_token(U256::from(SOLD), &sell_before, &buy_before)?;

        let op = deployment.swap(
            "route-50",
            "trader-0",
            SwapRoute::TokenToToken {
                sell_exchange: addr(SELL_EXCHANGE),
                buy_token: addr(BUY_TOKEN),
            },
            AmountMode::ExactInput {
                amount_in: U256::from(SOLD),
                min_out: None,
            },
            TRADER,
        )?;
        let report = deployment.runner.run(&op).await?;
        let after = mirror.snapshot();

        let mut validator = ReportValidator::new();
        validator.expect_satisfied(&report);

        // The composed quote is two single-hop input prices on pre-trade reserves
        let first_hop = sell_before.token_to_base_input(U256::from(SOLD))?;
        let second_hop = buy_before.base_to_token_input(first_hop)?;
        validator.expect_eq("quote:first-hop", first_hop, quote.base_amount);
        validator.expect_eq("quote:second-hop", second_hop, quote.amount_out);

        let received = I256::from_raw(quote.amount_out);
        validator.expect_amount(
            "recipient:received",
            received,
            deployment.balance(BUY_TOKEN, TRADER),
        );

        let naive = reserves(&after, SELL_EXCHANGE)?.token_to_base_input(U256::from(SOLD))?;
        validator.check(
            "quote:post-trade-differs",
            naive != quote.base_amount,
            format!(
                "post-trade recomputation gives {naive}, pre-trade quote {}",
                quote.base_amount
            ),
        );

        let mut metrics = TestMetrics::default();
        metrics.operations_run = 1;
        metrics.operations_satisfied = usize::from(report.is_satisfied());
        metrics.invariant_violations = report.violations.len();
        metrics.record_ledger(deployment);
        Ok(TestResult::from_validations(self.name(), validator.finish(), metrics))
    }

    fn name(&self) -> &str {
        "two_hop_quote"
    }

    fn description(&self) -> &str {
        "Route 50 tokens through the base asset and reconcile against the pre-trade quote"
    }
}
