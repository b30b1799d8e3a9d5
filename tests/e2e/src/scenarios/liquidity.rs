//! Liquidity round trips: deposit into an empty pair and withdraw everything,
//! then burn half of an existing position

use crate::fixtures::{addr, amount, Deployment, DeploymentBuilder, BASE, PROVIDER};
use crate::framework::{TestFramework, TestMetrics, TestResult, TestScenario};
use crate::validation::ReportValidator;
use amm::U256;
use anyhow::Result;
use async_trait::async_trait;
use operation_runner::{Lane, Operation, OperationKind};
use std::time::Duration;

const EMPTY_EXCHANGE: u8 = 0x20;
const EMPTY_TOKEN: u8 = 0x10;
const SEEDED_EXCHANGE: u8 = 0x21;
const SEEDED_TOKEN: u8 = 0x11;

pub struct LiquidityRoundTripTest;

#[async_trait]
impl TestScenario for LiquidityRoundTripTest {
    async fn setup(&self, _framework: &TestFramework) -> Result<Deployment> {
        let deployment = DeploymentBuilder::new().build()?;
        deployment.fund(BASE, PROVIDER, 200_000);
        deployment.fund(EMPTY_TOKEN, PROVIDER, 400_000);
        deployment.seed_pool(SEEDED_EXCHANGE, PROVIDER, 2_000, 2_000);
        Ok(deployment)
    }

    async fn execute(&self, deployment: &Deployment) -> Result<TestResult> {
        let provider = deployment.participant("provider-0")?;
        let add = Operation::new(
            "add-200000",
            provider.clone(),
            OperationKind::AddLiquidity {
                exchange: addr(EMPTY_EXCHANGE),
                base_amount: U256::from(200_000u64),
                max_tokens: U256::from(400_000u64),
                min_liquidity: None,
            },
        );
        let remove_all = Operation::new(
            "remove-all",
            provider.clone(),
            OperationKind::RemoveLiquidity {
                exchange: addr(EMPTY_EXCHANGE),
                shares: U256::from(200_000u64),
                min_base: None,
                min_tokens: None,
            },
        );
        let remove_half = Operation::new(
            "remove-half",
            provider,
            OperationKind::RemoveLiquidity {
                exchange: addr(SEEDED_EXCHANGE),
                shares: U256::from(1_000u64),
                min_base: None,
                min_tokens: None,
            },
        );

        let run = deployment
            .supervisor()
            .run(vec![Lane::new(
                "provider",
                vec![add, remove_all, remove_half],
            )])
            .await?;

        let mut validator = ReportValidator::new();
        for report in run.operations() {
            validator.expect_satisfied(report);
        }
        if let Some(add) = run.operations().next() {
            validator.expect_eq("add:approvals", 2, add.nested.len());
        }

        validator.expect_amount(
            "empty-pair:provider-shares",
            amount(0),
            deployment.balance(EMPTY_EXCHANGE, PROVIDER),
        );
        validator.expect_amount(
            "empty-pair:share-supply",
            amount(0),
            deployment.ledger.total_supply(addr(EMPTY_EXCHANGE)),
        );
        // The full deposit comes back, plus half of the seeded pair's 2000 base
        validator.expect_amount(
            "provider:base-returned",
            amount(200_000 + 1_000),
            deployment.balance(BASE, PROVIDER),
        );
        validator.expect_amount(
            "empty-pair:tokens-returned",
            amount(400_000),
            deployment.balance(EMPTY_TOKEN, PROVIDER),
        );
        validator.expect_amount(
            "seeded-pair:tokens-returned",
            amount(1_000),
            deployment.balance(SEEDED_TOKEN, PROVIDER),
        );
        validator.expect_amount(
            "seeded-pair:remaining-shares",
            amount(1_000),
            deployment.balance(SEEDED_EXCHANGE, PROVIDER),
        );

        let mirrored = deployment
            .runner
            .mirror()
            .snapshot()
            .exchange(&addr(SEEDED_EXCHANGE))
            .map(|e| e.share_balance(&addr(PROVIDER)))
            .unwrap_or_else(|| amount(-1));
        validator.expect_amount("seeded-pair:mirrored-shares", amount(1_000), mirrored);
        validator.expect_clean(&run);

        let mut metrics = TestMetrics::default();
        metrics.record_run(&run);
        metrics.record_ledger(deployment);
        Ok(TestResult::from_validations(self.name(), validator.finish(), metrics))
    }

    fn name(&self) -> &str {
        "liquidity_round_trip"
    }

    fn description(&self) -> &str {
        "Add then remove all liquidity from an empty pair; remove half of a 2000-share position"
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(20)
    }
}
