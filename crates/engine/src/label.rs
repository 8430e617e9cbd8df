use serde::Serialize;
use supersede_core::{
    models::{RunId, WorkflowRun},
    platform::Platform,
};

use crate::retire::Retirement;

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum LabelOutcome {
    Labeled,
    AlreadyLabeled,
    DryRun,
    Failed { message: String },
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct Labeling {
    pub run_id: RunId,
    pub pull_request: Option<u64>,
    pub outcome: LabelOutcome,
}

/// Tag the pull request of every retired run that was waiting on a deployment approval.
///
/// Labeling is best effort: failures are logged and reported, never returned as errors.
pub async fn label_pull_requests<P: Platform>(
    platform: &P,
    retirements: &[Retirement],
    label: &str,
    dry_run: bool,
) -> Vec<Labeling> {
    let mut labelings = Vec::new();
    for retirement in retirements.iter().filter(|r| r.had_pending_approval()) {
        if let Some(labeling) = label_run(platform, &retirement.run, label, dry_run).await {
            labelings.push(labeling);
        }
    }
    labelings
}

async fn label_run<P: Platform>(
    platform: &P,
    run: &WorkflowRun,
    label: &str,
    dry_run: bool,
) -> Option<Labeling> {
    let Some(sha) = run.head_commit.as_deref() else {
        tracing::warn!("Workflow run {} has no head commit, not tagging its pull request", run.id);
        return None;
    };
    let pull_request = match platform.pull_requests_for_commit(sha).await {
        Ok(pull_requests) => pull_requests.into_iter().next()?,
        Err(e) => {
            tracing::warn!("Failed to find pull request for workflow run {}: {:#}", run.id, e);
            return Some(Labeling {
                run_id: run.id,
                pull_request: None,
                outcome: LabelOutcome::Failed { message: format!("{e:#}") },
            });
        }
    };

    let url = pull_request.display_url();
    let outcome = if pull_request.labels.iter().any(|l| l == label) {
        tracing::info!("Pull request {} is already tagged with {}", url, label);
        LabelOutcome::AlreadyLabeled
    } else if dry_run {
        tracing::info!("Dry run: tagged pull request {} with {}", url, label);
        LabelOutcome::DryRun
    } else {
        let mut labels = pull_request.labels.clone();
        labels.push(label.to_string());
        match platform.set_labels(pull_request.number, &labels).await {
            Ok(()) => {
                tracing::info!("Successfully tagged pull request {} with {}", url, label);
                LabelOutcome::Labeled
            }
            Err(e) => {
                tracing::warn!("Failed to update pull request {} with the new tag: {:#}", url, e);
                LabelOutcome::Failed { message: format!("{e:#}") }
            }
        }
    };
    Some(Labeling { run_id: run.id, pull_request: Some(pull_request.number), outcome })
}
