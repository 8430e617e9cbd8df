use std::fmt;

use anyhow::Result;
use serde::Serialize;
use supersede_core::{
    config::SupersedeConfig,
    models::{DeploymentReview, ReviewState, WorkflowRun},
    platform::Platform,
};

use crate::error::RunFailure;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Cancel,
    Reject,
}

impl Action {
    pub fn from_config(config: &SupersedeConfig) -> Self {
        if config.reject { Self::Reject } else { Self::Cancel }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Cancel => "cancel",
            Self::Reject => "reject",
        })
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum Outcome {
    /// No pending deployment approval; the run was left alone.
    Skipped,
    Cancelled,
    Rejected,
    DryRun { action: Action },
}

#[derive(Debug, Clone, Serialize)]
pub struct Retirement {
    pub run: WorkflowRun,
    /// Environments the run was waiting on.
    pub environments: Vec<String>,
    pub outcome: Outcome,
}

impl Retirement {
    pub fn had_pending_approval(&self) -> bool { !self.environments.is_empty() }
}

/// Retire each superseded run in turn.
///
/// Only runs blocked on a pending deployment approval are touched: their approvals are rejected
/// when `config.reject` is set, otherwise the run is cancelled. A failure for one run is recorded
/// and the remaining runs are still processed.
pub async fn retire_runs<P: Platform>(
    platform: &P,
    runs: &[WorkflowRun],
    current: &WorkflowRun,
    config: &SupersedeConfig,
) -> (Vec<Retirement>, Vec<RunFailure>) {
    let mut retirements = Vec::with_capacity(runs.len());
    let mut failures = Vec::new();
    for run in runs {
        match retire_run(platform, run, current, config).await {
            Ok(retirement) => retirements.push(retirement),
            Err(error) => {
                tracing::error!(
                    "Error while cancelling workflow run {} (workflow_id {}): {:?}",
                    run.id,
                    run.workflow_id,
                    error
                );
                failures.push(RunFailure { run_id: run.id, error });
            }
        }
    }
    (retirements, failures)
}

async fn retire_run<P: Platform>(
    platform: &P,
    run: &WorkflowRun,
    current: &WorkflowRun,
    config: &SupersedeConfig,
) -> Result<Retirement> {
    let deployments = platform.pending_deployments(run.id).await?;
    let environments =
        deployments.iter().map(|d| d.environment_name().to_string()).collect::<Vec<_>>();
    tracing::info!(
        "Will try to cancel workflow run: {} waiting on {}",
        run.id,
        environments.join(",")
    );

    let action = Action::from_config(config);
    let outcome = if deployments.is_empty() {
        tracing::info!("Workflow run {} has no pending deployments, leaving it", run.id);
        Outcome::Skipped
    } else if config.dry_run {
        tracing::info!("Dry run: would {} workflow run {}", action, run.id);
        Outcome::DryRun { action }
    } else {
        match action {
            Action::Reject => {
                let review = DeploymentReview {
                    state: ReviewState::Rejected,
                    environment_ids: deployments.iter().filter_map(|d| d.environment.id).collect(),
                    comment: format!("Superseded by workflow run {}", current.html_url),
                };
                platform.review_pending_deployments(run.id, &review).await?;
                tracing::info!("Rejected pending deployments of workflow run {}", run.id);
                Outcome::Rejected
            }
            Action::Cancel => {
                platform.cancel_run(run.id).await?;
                tracing::info!("Cancelled workflow run {}", run.id);
                Outcome::Cancelled
            }
        }
    };
    Ok(Retirement { run: run.clone(), environments, outcome })
}
