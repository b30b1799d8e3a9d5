//! Network fees paid in the base asset only loosen the invoker's own base check

use crate::fixtures::{addr, amount, Deployment, DeploymentBuilder, BASE, PROVIDER, TRADER};
use crate::framework::{TestFramework, TestMetrics, TestResult, TestScenario};
use crate::validation::ReportValidator;
use amm::{PairReserves, U256};
use anyhow::Result;
use async_trait::async_trait;
use operation_runner::{AmountMode, Lane, SwapRoute};
use types::I256;

const EXCHANGE: u8 = 0x20;
const TOKEN: u8 = 0x10;
const FEE: i64 = 5;

pub struct FeeAccountingTest;

#[async_trait]
impl TestScenario for FeeAccountingTest {
    async fn setup(&self, _framework: &TestFramework) -> Result<Deployment> {
        let deployment = DeploymentBuilder::new().fee_asset(true).build()?;
        deployment.seed_pool(EXCHANGE, PROVIDER, 10_000, 10_000);
        deployment.fund(BASE, TRADER, 5_000);
        deployment.fund(TOKEN, TRADER, 1_000);
        deployment
            .ledger
            .set_allowance(addr(BASE), addr(TRADER), addr(EXCHANGE), amount(1_000));
        deployment.ledger.set_network_fee(amount(FEE));
        Ok(deployment)
    }

    async fn execute(&self, deployment: &Deployment) -> Result<TestResult> {
        let buy = deployment.swap(
            "buy-with-fee",
            "trader-0",
            SwapRoute::BaseToToken {
                exchange: addr(EXCHANGE),
            },
            AmountMode::ExactInput {
                amount_in: U256::from(1_000u64),
                min_out: None,
            },
            TRADER,
        )?;
        // Needs an approval, which pays its own fee
        let sell = deployment.swap(
            "sell-with-fee",
            "trader-0",
            SwapRoute::TokenToBase {
                exchange: addr(EXCHANGE),
            },
            AmountMode::ExactInput {
                amount_in: U256::from(500u64),
                min_out: None,
            },
            TRADER,
        )?;

        let run = deployment
            .supervisor()
            .run(vec![Lane::new("fees", vec![buy, sell])])
            .await?;

        let mut validator = ReportValidator::new();
        for report in run.operations() {
            validator.expect_satisfied(report);
            for nested in &report.nested {
                validator.expect_satisfied(nested);
            }
        }
        // Buy 1000 base -> 907 tokens, leaving 11000/9093 for the sell
        let base_out = PairReserves::new(U256::from(11_000u64), U256::from(9_093u64))
            .token_to_base_input(U256::from(500u64))?;
        let calls = deployment.ledger.submitted_calls().len() as i64;
        validator.expect_eq("fees:calls", 3, calls);
        validator.expect_amount(
            "fees:invoker-base",
            amount(5_000 - 1_000 - calls * FEE) + I256::from_raw(base_out),
            deployment.balance(BASE, TRADER),
        );
        validator.expect_clean(&run);

        let mut metrics = TestMetrics::default();
        metrics.record_run(&run);
        metrics.record_ledger(deployment);
        Ok(TestResult::from_validations(self.name(), validator.finish(), metrics))
    }

    fn name(&self) -> &str {
        "fee_accounting"
    }

    fn description(&self) -> &str {
        "Base-asset fees on swaps and approvals stay within the invoker's debit bound"
    }
}
