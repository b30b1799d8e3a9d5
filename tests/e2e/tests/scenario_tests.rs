//! Every scenario through the framework, one test each

use mirror_e2e_tests::scenarios::{
    ConcurrentLanesTest, FaultInjectionTest, FeeAccountingTest, LiquidityRoundTripTest,
    RegistryMismatchTest, SwapMatrixTest, TwoHopQuoteTest,
};
use mirror_e2e_tests::{DeploymentBuilder, TestConfig, TestFramework, TestResult, TestScenario};

async fn run(scenario: impl TestScenario) -> TestResult {
    let framework = TestFramework::new(TestConfig::default());
    framework.run_scenario(&scenario).await
}

fn assert_passed(result: &TestResult) {
    let failed: Vec<_> = result
        .validation_results
        .iter()
        .filter(|r| !r.passed)
        .map(|r| format!("{}: {}", r.validator, r.message))
        .collect();
    assert!(
        result.success,
        "{} failed: {:?} {:?}",
        result.scenario_name, result.error_message, failed
    );
    assert!(!result.validation_results.is_empty());
}

#[tokio::test]
async fn test_liquidity_round_trip() {
    let result = run(LiquidityRoundTripTest).await;
    assert_passed(&result);
    assert_eq!(result.metrics.operations_run, 3);
}

#[tokio::test]
async fn test_swap_matrix() {
    let result = run(SwapMatrixTest).await;
    assert_passed(&result);
    assert_eq!(result.metrics.operations_satisfied, 16);
}

#[tokio::test]
async fn test_two_hop_quote() {
    assert_passed(&run(TwoHopQuoteTest).await);
}

#[tokio::test]
async fn test_fault_injection() {
    let result = run(FaultInjectionTest).await;
    assert_passed(&result);
    assert!(result.metrics.invariant_violations >= 2);
}

#[tokio::test]
async fn test_fee_accounting() {
    assert_passed(&run(FeeAccountingTest).await);
}

#[tokio::test]
async fn test_concurrent_lanes() {
    assert_passed(&run(ConcurrentLanesTest).await);
}

#[tokio::test]
async fn test_registry_mismatch() {
    let result = run(RegistryMismatchTest).await;
    assert_passed(&result);
    assert_eq!(result.metrics.submitted_calls, 0);
}

#[test]
fn test_rendered_config_round_trips_through_loader() {
    let toml = DeploymentBuilder::new()
        .fee_asset(true)
        .confirmation_timeout_secs(9)
        .max_retries(4)
        .render_toml();
    let config = mirror_config::MirrorConfig::from_toml_str(&toml).unwrap();

    assert_eq!(config.contracts.pairs.len(), 3);
    assert_eq!(config.participants.len(), 3);
    assert_eq!(config.mirror.max_retries, 4);
    assert!(config.mirror.base_asset_is_fee_asset);
    assert_eq!(config.confirmation_timeout(), std::time::Duration::from_secs(9));

    let identities = config.identities().unwrap();
    assert_eq!(identities.observers.len(), 1);
    assert!(identities.base_asset_is_fee_asset);
}

#[test]
fn test_deployment_exposes_configured_participants() {
    let deployment = DeploymentBuilder::new().build().unwrap();
    let trader = deployment.participant("trader-0").unwrap();
    assert_eq!(trader.signer.key_ref, "wallet:1");
    assert!(deployment.participant("nobody").is_err());
}
