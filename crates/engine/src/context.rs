use anyhow::{Context, Result};
use supersede_core::{
    models::{RunId, WorkflowRun},
    platform::Platform,
};

/// The run performing the check and the branch it belongs to.
#[derive(Debug, Clone)]
pub struct RunContext {
    pub run: WorkflowRun,
    pub branch: String,
}

/// Fetch the current run and resolve its branch, falling back to the repository's default branch
/// when the run carries none.
pub async fn resolve_run_context<P: Platform>(platform: &P, run_id: RunId) -> Result<RunContext> {
    let default_branch =
        platform.default_branch().await.context("Failed to fetch repository default branch")?;
    let run = platform
        .get_run(run_id)
        .await
        .with_context(|| format!("Failed to resolve current workflow run {run_id}"))?;
    let branch = run.head_branch.clone().unwrap_or(default_branch);
    tracing::info!("Resolved run {} to branch: {}", run_id, branch);
    Ok(RunContext { run, branch })
}
