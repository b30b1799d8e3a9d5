//! Runs every end-to-end scenario and exits non-zero on any failure

use mirror_config::LoggingSettings;
use mirror_e2e_tests::{scenarios, TestConfig, TestFramework};
use operation_runner::init_tracing;
use tracing::{error, info};

#[tokio::main]
async fn main() {
    init_tracing(&LoggingSettings::default());

    let framework = TestFramework::new(TestConfig::default());
    let mut failures = 0usize;
    for scenario in scenarios::all() {
        let result = framework.run_scenario(scenario.as_ref()).await;
        if result.success {
            info!(
                "✅ {} passed in {}ms ({} operations, {} submitted calls)",
                result.scenario_name,
                result.duration.as_millis(),
                result.metrics.operations_run,
                result.metrics.submitted_calls
            );
        } else {
            failures += 1;
            error!(
                "❌ {} failed: {}",
                result.scenario_name,
                result.error_message.as_deref().unwrap_or("unknown error")
            );
        }
    }

    info!("📊 {} scenarios failed", failures);
    if failures > 0 {
        std::process::exit(1);
    }
}
