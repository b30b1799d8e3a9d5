//! Lane supervision: disjoint lanes in parallel, overlap refused, registry
//! mismatch fatal

use crate::fixtures::{
    addr, amount, Deployment, DeploymentBuilder, BASE, COUNTERPARTY, PROVIDER, TRADER,
};
use crate::framework::{TestFramework, TestMetrics, TestResult, TestScenario};
use crate::validation::ReportValidator;
use amm::U256;
use anyhow::Result;
use async_trait::async_trait;
use operation_runner::{AmountMode, Lane, Operation, RunnerError, SwapRoute};

fn buy(deployment: &Deployment, label: &str, invoker: &str, exchange: u8, recipient: u8) -> Result<Operation> {
    deployment.swap(
        label,
        invoker,
        SwapRoute::BaseToToken {
            exchange: addr(exchange),
        },
        AmountMode::ExactInput {
            amount_in: U256::from(100u64),
            min_out: None,
        },
        recipient,
    )
}

pub struct ConcurrentLanesTest;

#[async_trait]
impl TestScenario for ConcurrentLanesTest {
    async fn setup(&self, _framework: &TestFramework) -> Result<Deployment> {
        let deployment = DeploymentBuilder::new().build()?;
        deployment.seed_pool(0x20, PROVIDER, 50_000, 50_000);
        deployment.seed_pool(0x21, PROVIDER, 50_000, 50_000);
        deployment.fund(BASE, TRADER, 1_000);
        deployment.fund(BASE, COUNTERPARTY, 1_000);
        Ok(deployment)
    }

    async fn execute(&self, deployment: &Deployment) -> Result<TestResult> {
        let supervisor = deployment.supervisor();
        let mut validator = ReportValidator::new();

        let overlapping = vec![
            Lane::new("left", vec![buy(deployment, "left-0", "trader-0", 0x20, TRADER)?]),
            Lane::new("right", vec![buy(deployment, "right-0", "trader-1", 0x20, COUNTERPARTY)?]),
        ];
        let refused = supervisor.run(overlapping).await;
        validator.check(
            "overlap:refused",
            matches!(refused, Err(RunnerError::OverlappingLanes { .. })),
            format!("overlapping lanes returned {:?}", refused.as_ref().err()),
        );
        validator.expect_eq("overlap:no-calls", 0, deployment.ledger.submitted_calls().len());

        let mut disjoint = Vec::new();
        for (lane, invoker, exchange, account) in
            [("pair-20", "trader-0", 0x20, TRADER), ("pair-21", "trader-1", 0x21, COUNTERPARTY)]
        {
            let operations = (0..3)
                .map(|n| buy(deployment, &format!("{lane}-{n}"), invoker, exchange, account))
                .collect::<Result<Vec<_>>>()?;
            disjoint.push(Lane::new(lane, operations));
        }
        let run = supervisor.run(disjoint).await?;

        validator.expect_eq("lanes:count", 2, run.lanes.len());
        validator.expect_eq("lanes:satisfied", 6, run.satisfied());
        validator.expect_clean(&run);
        validator.expect_eq(
            "lanes:order",
            "pair-20,pair-21".to_string(),
            run.lanes.iter().map(|l| l.name.as_str()).collect::<Vec<_>>().join(","),
        );

        let mut metrics = TestMetrics::default();
        metrics.record_run(&run);
        metrics.record_ledger(deployment);
        Ok(TestResult::from_validations(self.name(), validator.finish(), metrics))
    }

    fn name(&self) -> &str {
        "concurrent_lanes"
    }

    fn description(&self) -> &str {
        "Overlapping lanes are refused up front; disjoint lanes run in parallel and reconcile cleanly"
    }
}

pub struct RegistryMismatchTest;

#[async_trait]
impl TestScenario for RegistryMismatchTest {
    async fn setup(&self, _framework: &TestFramework) -> Result<Deployment> {
        let deployment = DeploymentBuilder::new().build()?;
        deployment.seed_pool(0x20, PROVIDER, 10_000, 10_000);
        deployment.fund(BASE, TRADER, 1_000);
        // The deployed factory maps the third token somewhere else
        deployment.ledger.override_registry(addr(0x12), addr(0x99));
        deployment
            .ledger
            .set_allowance(addr(BASE), addr(TRADER), addr(0x20), amount(1_000));
        Ok(deployment)
    }

    async fn execute(&self, deployment: &Deployment) -> Result<TestResult> {
        let lanes = vec![Lane::new(
            "doomed",
            vec![buy(deployment, "doomed-0", "trader-0", 0x20, TRADER)?],
        )];
        let outcome = deployment.supervisor().run(lanes).await;

        let mut validator = ReportValidator::new();
        validator.check(
            "registry:fatal",
            outcome.as_ref().err().is_some_and(|e| e.is_registry_mismatch()),
            format!("run returned {:?}", outcome.as_ref().err()),
        );
        validator.expect_eq("registry:no-calls", 0, deployment.ledger.submitted_calls().len());
        validator.expect_amount(
            "registry:ledger-untouched",
            amount(1_000),
            deployment.balance(BASE, TRADER),
        );

        let mut metrics = TestMetrics::default();
        metrics.record_ledger(deployment);
        Ok(TestResult::from_validations(self.name(), validator.finish(), metrics))
    }

    fn name(&self) -> &str {
        "registry_mismatch"
    }

    fn description(&self) -> &str {
        "A factory registry that disagrees with the configuration aborts the run"
    }
}
