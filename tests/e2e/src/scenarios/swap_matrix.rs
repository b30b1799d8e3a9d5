//! Every swap family in both amount modes, to self and to a counterparty

use crate::fixtures::{
    addr, Deployment, DeploymentBuilder, BASE, COUNTERPARTY, PROVIDER, TRADER,
};
use crate::framework::{TestFramework, TestMetrics, TestResult, TestScenario};
use crate::validation::ReportValidator;
use amm::U256;
use anyhow::Result;
use async_trait::async_trait;
use codec::methods;
use operation_runner::{method_name, AmountMode, Lane, RecipientMode, SwapRoute};
use std::collections::BTreeSet;
use std::time::Duration;

pub struct SwapMatrixTest;

fn routes() -> [SwapRoute; 4] {
    [
        SwapRoute::BaseToToken {
            exchange: addr(0x20),
        },
        SwapRoute::TokenToBase {
            exchange: addr(0x20),
        },
        SwapRoute::TokenToToken {
            sell_exchange: addr(0x20),
            buy_token: addr(0x11),
        },
        SwapRoute::TokenToExchange {
            sell_exchange: addr(0x20),
            target_exchange: addr(0x21),
        },
    ]
}

fn amounts() -> [AmountMode; 2] {
    [
        AmountMode::ExactInput {
            amount_in: U256::from(1_000u64),
            min_out: None,
        },
        AmountMode::ExactOutput {
            amount_out: U256::from(500u64),
            max_in: None,
        },
    ]
}

#[async_trait]
impl TestScenario for SwapMatrixTest {
    async fn setup(&self, _framework: &TestFramework) -> Result<Deployment> {
        let deployment = DeploymentBuilder::new().build()?;
        deployment.seed_pool(0x20, PROVIDER, 1_000_000, 1_000_000);
        deployment.seed_pool(0x21, PROVIDER, 1_000_000, 1_000_000);
        deployment.fund(BASE, TRADER, 100_000);
        deployment.fund(0x10, TRADER, 100_000);
        Ok(deployment)
    }

    async fn execute(&self, deployment: &Deployment) -> Result<TestResult> {
        let mut operations = Vec::new();
        let mut expected_methods = Vec::new();
        for route in routes() {
            for amount in amounts() {
                for recipient in [TRADER, COUNTERPARTY] {
                    let mode = RecipientMode::for_recipient(addr(TRADER), addr(recipient));
                    let label = format!("{:?}-{:?}-{:?}", route.family(), amount.kind(), mode);
                    expected_methods.push(method_name(route.family(), mode, amount.kind()));
                    operations.push(deployment.swap(&label, "trader-0", route, amount, recipient)?);
                }
            }
        }

        let run = deployment
            .supervisor()
            .run(vec![Lane::new("matrix", operations)])
            .await?;

        let mut validator = ReportValidator::new();
        for (report, method) in run.operations().zip(&expected_methods) {
            validator.expect_satisfied(report);
            validator.expect_method(report, method);
        }

        let submitted: BTreeSet<String> = deployment
            .ledger
            .submitted_calls()
            .into_iter()
            .map(|call| call.method)
            .filter(|m| m != methods::APPROVE)
            .collect();
        validator.expect_eq("distinct-swap-methods", 16, submitted.len());
        validator.expect_clean(&run);

        let mut metrics = TestMetrics::default();
        metrics.record_run(&run);
        metrics.record_ledger(deployment);
        Ok(TestResult::from_validations(self.name(), validator.finish(), metrics))
    }

    fn name(&self) -> &str {
        "swap_matrix"
    }

    fn description(&self) -> &str {
        "4 swap families x exact input/output x swap/transfer, each reconciled exactly"
    }

    fn timeout(&self) -> Duration {
        Duration::from_secs(30)
    }
}
