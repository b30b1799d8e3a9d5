//! Misbehaving ledger: lost confirmations, a skimming exchange, skewed share supply

use crate::fixtures::{addr, amount, Deployment, DeploymentBuilder, BASE, PROVIDER, TRADER};
use crate::framework::{TestFramework, TestMetrics, TestResult, TestScenario};
use crate::validation::ReportValidator;
use amm::U256;
use anyhow::Result;
use async_trait::async_trait;
use operation_runner::{AmountMode, Operation, SwapRoute, ViolationReason};
use types::{Quantity, Subject};

const EXCHANGE: u8 = 0x20;
const TOKEN: u8 = 0x10;
const SKIM: i64 = 7;

pub struct FaultInjectionTest;

fn buy(deployment: &Deployment, label: &str) -> Result<Operation> {
    deployment.swap(
        label,
        "trader-0",
        SwapRoute::BaseToToken {
            exchange: addr(EXCHANGE),
        },
        AmountMode::ExactInput {
            amount_in: U256::from(1_000u64),
            min_out: None,
        },
        TRADER,
    )
}

#[async_trait]
impl TestScenario for FaultInjectionTest {
    async fn setup(&self, _framework: &TestFramework) -> Result<Deployment> {
        let deployment = DeploymentBuilder::new().build()?;
        deployment.seed_pool(EXCHANGE, PROVIDER, 10_000, 10_000);
        deployment.fund(BASE, TRADER, 5_000);
        deployment
            .ledger
            .set_allowance(addr(BASE), addr(TRADER), addr(EXCHANGE), amount(5_000));
        Ok(deployment)
    }

    async fn execute(&self, deployment: &Deployment) -> Result<TestResult> {
        let mut validator = ReportValidator::new();
        let mut metrics = TestMetrics::default();
        let mirror = deployment.runner.mirror();

        // Lost confirmation: indeterminate, and only a refresh reveals the effect
        deployment.ledger.time_out_next_confirmations(1);
        let lost = deployment.runner.run(&buy(deployment, "lost-confirmation")?).await?;
        validator.check(
            "timeout:indeterminate",
            lost.is_indeterminate(),
            format!("outcome {:?}", lost.outcome),
        );
        validator.expect_eq("timeout:not-resubmitted", 1, deployment.ledger.submitted_calls().len());
        mirror
            .refresh_scope(&[addr(TRADER)], &[addr(EXCHANGE)])
            .await?;
        validator.expect_amount(
            "timeout:refresh-shows-ledger",
            deployment.balance(TOKEN, TRADER),
            mirror.snapshot().balance(&addr(TRADER), &addr(TOKEN)),
        );

        // Skimming exchange: the recipient is short by exactly the skim
        deployment.ledger.skim_output(addr(EXCHANGE), amount(SKIM));
        let skimmed = deployment.runner.run(&buy(deployment, "skimmed")?).await?;
        validator.expect_reason(&skimmed, "invariant violation", |r| {
            *r == ViolationReason::InvariantViolation
        });
        let shortfall = skimmed
            .violations
            .iter()
            .find(|v| {
                v.subject
                    == Subject::Balance {
                        account: addr(TRADER),
                        asset: addr(TOKEN),
                    }
            })
            .and_then(|v| match (v.expected, v.actual) {
                (Quantity::Amount(expected), Quantity::Amount(actual)) => Some(expected - actual),
                _ => None,
            });
        validator.check(
            "skim:shortfall",
            shortfall == Some(amount(SKIM)),
            format!("recipient shortfall {shortfall:?}"),
        );
        deployment.ledger.skim_output(addr(EXCHANGE), amount(0));

        // Share supply no longer equals the tracked holders' sum
        deployment.ledger.skew_share_supply(addr(EXCHANGE), amount(1));
        let stats = mirror.refresh_exchanges_for(&[addr(EXCHANGE)]).await?;
        validator.expect_eq("conservation:recorded", 1, stats.violations);
        let recorded = mirror.violations().iter().any(|v| {
            v.subject
                == Subject::ShareConservation {
                    exchange: addr(EXCHANGE),
                }
        });
        validator.check("conservation:logged", recorded, "share conservation violation in mirror log");

        metrics.operations_run = 2;
        metrics.invariant_violations = skimmed.violations.len() + mirror.violations().len();
        metrics.record_ledger(deployment);
        Ok(TestResult::from_validations(self.name(), validator.finish(), metrics))
    }

    fn name(&self) -> &str {
        "fault_injection"
    }

    fn description(&self) -> &str {
        "Lost confirmation, output skimming and share supply skew are each detected"
    }
}
