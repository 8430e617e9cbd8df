use supersede_core::models::RunId;
use thiserror::Error;

/// A superseded run that could not be retired.
#[derive(Debug, Error)]
#[error("workflow run {run_id}: {error:#}")]
pub struct RunFailure {
    pub run_id: RunId,
    pub error: anyhow::Error,
}

/// Every retirement failure of one invocation. Raised after all superseded runs were attempted.
#[derive(Debug, Error)]
#[error("Failed to retire {} workflow run(s): {}", .0.len(), summarize(.0))]
pub struct RetirementFailures(pub Vec<RunFailure>);

fn summarize(failures: &[RunFailure]) -> String {
    failures.iter().map(ToString::to_string).collect::<Vec<_>>().join("; ")
}
