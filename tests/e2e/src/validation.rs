//! Assertions over operation and run reports, collected rather than panicking

use operation_runner::{OperationReport, RunReport, ViolationReason};
use std::fmt::Display;
use types::I256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationSeverity {
    Info,
    Error,
}

#[derive(Debug, Clone)]
pub struct ValidationResult {
    pub validator: String,
    pub passed: bool,
    pub message: String,
    pub severity: ValidationSeverity,
}

#[derive(Debug, Default)]
pub struct ReportValidator {
    results: Vec<ValidationResult>,
}

impl ReportValidator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn check(&mut self, validator: impl Into<String>, passed: bool, message: impl Into<String>) {
        self.results.push(ValidationResult {
            validator: validator.into(),
            passed,
            message: message.into(),
            severity: if passed {
                ValidationSeverity::Info
            } else {
                ValidationSeverity::Error
            },
        });
    }

    pub fn expect_satisfied(&mut self, report: &OperationReport) {
        let message = match report.reason() {
            None => format!("{} satisfied", report.label),
            Some(reason) => format!("{} violated: {}", report.label, reason),
        };
        self.check(format!("satisfied:{}", report.label), report.is_satisfied(), message);
    }

    pub fn expect_reason(
        &mut self,
        report: &OperationReport,
        what: &str,
        matches: impl Fn(&ViolationReason) -> bool,
    ) {
        let (passed, message) = match report.reason() {
            Some(reason) if matches(reason) => (true, format!("{} failed as expected: {reason}", report.label)),
            Some(reason) => (false, format!("{} failed with {reason}, wanted {what}", report.label)),
            None => (false, format!("{} was satisfied, wanted {what}", report.label)),
        };
        self.check(format!("reason:{}", report.label), passed, message);
    }

    pub fn expect_method(&mut self, report: &OperationReport, method: &str) {
        let actual = report.method.unwrap_or("<none>");
        self.check(
            format!("method:{}", report.label),
            actual == method,
            format!("{} called {actual}, expected {method}", report.label),
        );
    }

    pub fn expect_amount(&mut self, name: &str, expected: I256, actual: I256) {
        self.expect_eq(name, expected, actual);
    }

    pub fn expect_eq<T: PartialEq + Display>(&mut self, name: &str, expected: T, actual: T) {
        let passed = expected == actual;
        self.check(name, passed, format!("expected {expected}, actual {actual}"));
    }

    pub fn expect_clean(&mut self, report: &RunReport) {
        let violations = report.all_violations();
        let message = match violations.first() {
            None => format!("{} operations, no violations", report.operations().count()),
            Some(first) => format!("{} violations, first: {first}", violations.len()),
        };
        self.check("run:clean", report.is_clean(), message);
    }

    pub fn finish(self) -> Vec<ValidationResult> {
        self.results
    }
}
