//! Concurrent lanes over disjoint scopes
//!
//! Each lane runs its operations sequentially; lanes run in parallel. Two lanes
//! may not touch the same exchange or account, so that every reconciliation
//! sees only its own operation's effect. Overlap is refused before anything is
//! sent to the ledger.

use crate::error::RunnerError;
use crate::log_metrics;
use crate::operation::Operation;
use crate::report::{LaneReport, RunReport};
use crate::runner::OperationRunner;
use state_mirror::ScopeKey;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::task::JoinSet;
use tracing::{error, info};

/// A named sequence of operations
#[derive(Debug, Clone)]
pub struct Lane {
    pub name: String,
    pub operations: Vec<Operation>,
}

impl Lane {
    pub fn new(name: impl Into<String>, operations: Vec<Operation>) -> Self {
        Self {
            name: name.into(),
            operations,
        }
    }
}

pub struct Supervisor {
    runner: Arc<OperationRunner>,
}

impl Supervisor {
    pub fn new(runner: Arc<OperationRunner>) -> Self {
        Self { runner }
    }

    pub fn runner(&self) -> &Arc<OperationRunner> {
        &self.runner
    }

    /// Reject lanes whose exchange or account scopes intersect
    pub fn check_disjoint(&self, lanes: &[Lane]) -> Result<(), RunnerError> {
        let identities = self.runner.mirror().identities();
        let mut owners: HashMap<ScopeKey, &str> = HashMap::new();

        for lane in lanes {
            let mut scopes = Vec::new();
            for op in &lane.operations {
                scopes.extend(op.exchanges(identities)?.into_iter().map(ScopeKey::Exchange));
                scopes.extend(op.accounts().into_iter().map(ScopeKey::Account));
            }
            scopes.sort();
            scopes.dedup();

            for scope in scopes {
                if let Some(first) = owners.insert(scope, &lane.name) {
                    if first != lane.name {
                        return Err(RunnerError::OverlappingLanes {
                            scope,
                            first: first.to_string(),
                            second: lane.name.clone(),
                        });
                    }
                }
            }
        }
        Ok(())
    }

    /// Run every lane to completion; the first fatal error aborts the rest
    pub async fn run(&self, lanes: Vec<Lane>) -> Result<RunReport, RunnerError> {
        self.check_disjoint(&lanes)?;
        info!("Supervising {} lanes", lanes.len());

        let mirror = self.runner.mirror();
        if !mirror.is_factory_refreshed() {
            mirror.refresh_factory().await?;
        }

        let mut tasks = JoinSet::new();
        for (index, lane) in lanes.into_iter().enumerate() {
            let runner = Arc::clone(&self.runner);
            tasks.spawn(async move {
                let reports = runner.run_lane(&lane.operations).await;
                (index, lane.name, reports)
            });
        }

        let mut finished = Vec::new();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((index, name, Ok(reports))) => finished.push((index, LaneReport { name, reports })),
                Ok((_, name, Err(e))) => {
                    error!("❌ Lane '{}' failed: {}", name, e);
                    tasks.abort_all();
                    return Err(e);
                }
                Err(e) => {
                    tasks.abort_all();
                    return Err(RunnerError::LaneAborted(e.to_string()));
                }
            }
        }
        finished.sort_by_key(|(index, _)| *index);

        let report = RunReport {
            lanes: finished.into_iter().map(|(_, lane)| lane).collect(),
            mirror_violations: self.runner.mirror().take_violations(),
        };
        log_metrics!(
            "Run finished: {} operations, {} satisfied, {} invariant violations",
            report.operations().count(),
            report.satisfied(),
            report.all_violations().len()
        );
        Ok(report)
    }
}
