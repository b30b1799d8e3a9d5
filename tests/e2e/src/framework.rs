//! Core E2E testing framework

use crate::fixtures::Deployment;
use crate::validation::ValidationResult;
use anyhow::Result;
use operation_runner::RunReport;
use std::time::{Duration, Instant};
use tracing::{error, info, warn};

/// Main test framework coordinator
pub struct TestFramework {
    config: TestConfig,
}

#[derive(Debug, Clone)]
pub struct TestConfig {
    /// Upper bound for any scenario that does not set its own
    pub timeout_secs: u64,

    /// Run scenario cleanup hooks
    pub cleanup: bool,
}

impl Default for TestConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 60,
            cleanup: true,
        }
    }
}

/// Test scenario trait
#[async_trait::async_trait]
pub trait TestScenario: Send + Sync {
    /// Build and seed the deployment the scenario runs against
    async fn setup(&self, framework: &TestFramework) -> Result<Deployment>;
    async fn execute(&self, deployment: &Deployment) -> Result<TestResult>;
    async fn cleanup(&self, _deployment: &Deployment) -> Result<()> {
        Ok(())
    }

    fn name(&self) -> &str;
    fn description(&self) -> &str;
    fn timeout(&self) -> Duration {
        Duration::from_secs(30)
    }
}

#[derive(Debug, Clone)]
pub struct TestResult {
    pub scenario_name: String,
    pub success: bool,
    pub duration: Duration,
    pub error_message: Option<String>,
    pub metrics: TestMetrics,
    pub validation_results: Vec<ValidationResult>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TestMetrics {
    pub operations_run: usize,
    pub operations_satisfied: usize,
    pub invariant_violations: usize,
    pub submitted_calls: usize,
    pub remote_reads: u64,
}

impl TestMetrics {
    /// Merge a supervised run into the counters
    pub fn record_run(&mut self, report: &RunReport) {
        self.operations_run += report.operations().count();
        self.operations_satisfied += report.satisfied();
        self.invariant_violations += report.all_violations().len();
    }

    pub fn record_ledger(&mut self, deployment: &Deployment) {
        self.submitted_calls = deployment.ledger.submitted_calls().len();
        self.remote_reads = deployment.ledger.read_count();
    }
}

impl TestResult {
    /// Successful exactly when every validation passed
    pub fn from_validations(
        scenario_name: &str,
        validation_results: Vec<ValidationResult>,
        metrics: TestMetrics,
    ) -> Self {
        let failed: Vec<&ValidationResult> =
            validation_results.iter().filter(|r| !r.passed).collect();
        let error_message = if failed.is_empty() {
            None
        } else {
            Some(
                failed
                    .iter()
                    .map(|r| format!("{}: {}", r.validator, r.message))
                    .collect::<Vec<_>>()
                    .join("; "),
            )
        };
        Self {
            scenario_name: scenario_name.to_string(),
            success: failed.is_empty(),
            duration: Duration::ZERO,
            error_message,
            metrics,
            validation_results,
        }
    }

    fn failed(scenario_name: &str, message: String, duration: Duration) -> Self {
        Self {
            scenario_name: scenario_name.to_string(),
            success: false,
            duration,
            error_message: Some(message),
            metrics: TestMetrics::default(),
            validation_results: Vec::new(),
        }
    }
}

impl TestFramework {
    pub fn new(config: TestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TestConfig {
        &self.config
    }

    /// Run a complete test scenario
    pub async fn run_scenario<S: TestScenario + ?Sized>(&self, scenario: &S) -> TestResult {
        info!("Starting test scenario: {}", scenario.name());
        info!("Description: {}", scenario.description());
        let start_time = Instant::now();

        let deployment = match scenario.setup(self).await {
            Ok(deployment) => deployment,
            Err(e) => {
                error!("Setup failed: {:#}", e);
                return TestResult::failed(
                    scenario.name(),
                    format!("Setup failed: {e:#}"),
                    start_time.elapsed(),
                );
            }
        };

        let limit = scenario
            .timeout()
            .min(Duration::from_secs(self.config.timeout_secs));
        let mut test_result = match tokio::time::timeout(limit, scenario.execute(&deployment)).await
        {
            Ok(Ok(result)) => result,
            Ok(Err(e)) => {
                error!("Test execution failed: {:#}", e);
                TestResult::failed(
                    scenario.name(),
                    format!("Execution failed: {e:#}"),
                    start_time.elapsed(),
                )
            }
            Err(_) => {
                error!("Test execution timed out");
                TestResult::failed(
                    scenario.name(),
                    "Test execution timed out".to_string(),
                    start_time.elapsed(),
                )
            }
        };
        test_result.duration = start_time.elapsed();

        if self.config.cleanup {
            if let Err(e) = scenario.cleanup(&deployment).await {
                warn!("Cleanup failed: {}", e);
            }
        }

        info!(
            "Test scenario completed: {} (success: {})",
            scenario.name(),
            test_result.success
        );
        test_result
    }
}
