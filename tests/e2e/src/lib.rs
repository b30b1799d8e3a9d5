//! End-to-End Test Framework for the AMM state mirror
//!
//! Each scenario builds a deployment from a rendered config file, seeds a
//! simulated ledger, drives operations through the supervisor and validates
//! the resulting reports and ledger state.

pub mod fixtures;
pub mod framework;
pub mod validation;

pub use fixtures::{Deployment, DeploymentBuilder};
pub use framework::{TestConfig, TestFramework, TestMetrics, TestResult, TestScenario};
pub use validation::{ReportValidator, ValidationResult, ValidationSeverity};
