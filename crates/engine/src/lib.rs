//! Detection and retirement of workflow runs superseded by a newer run on the same branch.
//!
//! The pipeline runs strictly in order, one platform call at a time:
//! resolve the current run, collect candidate runs, resolve the baseline commit, walk the commit
//! ancestry, select superseded runs, retire them, then label their pull requests.

pub mod ancestry;
pub mod baseline;
pub mod candidates;
pub mod context;
pub mod error;
pub mod label;
pub mod report;
pub mod retire;
pub mod select;
#[cfg(test)]
mod testing;

use anyhow::Result;
use supersede_core::{
    config::SupersedeConfig,
    models::{RunId, WorkflowRun},
    platform::Platform,
};

pub use crate::{error::RetirementFailures, report::Report};
use crate::{
    ancestry::walk_ancestry,
    baseline::resolve_baseline,
    candidates::collect_candidates,
    context::{RunContext, resolve_run_context},
    label::label_pull_requests,
    retire::retire_runs,
    select::{CommitWindow, select_superseded},
};

/// Retire the runs superseded by run `run_id`.
pub async fn run<P: Platform>(
    platform: &P,
    run_id: RunId,
    config: &SupersedeConfig,
) -> Result<Report> {
    let RunContext { run: current, branch } = resolve_run_context(platform, run_id).await?;
    let result = supersede(platform, &current, &branch, config).await;
    if let Err(e) = &result {
        tracing::error!("Error while cancelling workflow_id {}: {:#}", current.workflow_id, e);
    }
    result
}

async fn supersede<P: Platform>(
    platform: &P,
    current: &WorkflowRun,
    branch: &str,
    config: &SupersedeConfig,
) -> Result<Report> {
    let mut report = Report::new(current.id, branch);

    let candidates =
        collect_candidates(platform, current.workflow_id, branch, config.status).await?;
    report.candidates = candidates.len();
    tracing::info!("Found {} candidate workflow runs on {}", candidates.len(), branch);

    if config.limit_to_previous_success {
        report.baseline =
            resolve_baseline(platform, current, branch, config.last_successful_run_id).await?;
    }

    if candidates.is_empty() {
        tracing::info!("Completed cancellations for {}", current.id);
        return Ok(report);
    }

    let superseded = if config.limit_to_previous_success {
        let commits =
            walk_ancestry(platform, &current.head_sha, report.baseline.as_deref()).await?;
        report.walked_commits = Some(commits.len());
        select_superseded(&candidates, CommitWindow::Bounded(&commits), current.id)
    } else {
        tracing::warn!(
            "Not limited to the previous successful run, considering every candidate on {}",
            branch
        );
        select_superseded(&candidates, CommitWindow::Unbounded, current.id)
    };
    tracing::info!("Found {} superseded workflow runs", superseded.len());

    let (retirements, failures) = retire_runs(platform, &superseded, current, config).await;
    report.retirements = retirements;

    if let Some(label) = config.label.as_deref() {
        report.labels =
            label_pull_requests(platform, &report.retirements, label, config.dry_run).await;
    }

    if !failures.is_empty() {
        return Err(RetirementFailures(failures).into());
    }
    tracing::info!("Completed cancellations for {}", current.id);
    Ok(report)
}
