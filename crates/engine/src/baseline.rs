use anyhow::{Context, Result};
use supersede_core::{
    models::{RunId, RunStatus, WorkflowRun},
    platform::{Platform, RunQuery},
};

pub const BASELINE_PAGE_SIZE: u8 = 10;

/// Resolve the head commit of the last successful run, the exclusive lower bound of the ancestry
/// walk.
///
/// An explicit `last_successful` run is fetched directly. Otherwise the most recent successful run
/// of the same workflow and branch is used, skipping the current run (it may already be reported
/// as successful when invoked from a dispatched workflow). Returns `None` when no such run exists.
pub async fn resolve_baseline<P: Platform>(
    platform: &P,
    current: &WorkflowRun,
    branch: &str,
    last_successful: Option<RunId>,
) -> Result<Option<String>> {
    if let Some(run_id) = last_successful {
        let run = platform
            .get_run(run_id)
            .await
            .with_context(|| format!("Failed to fetch last successful workflow run {run_id}"))?;
        tracing::info!(
            "Last successfully completed workflow run: {} for commit: {}",
            run.id,
            run.head_sha
        );
        return Ok(Some(run.head_sha));
    }

    let query = RunQuery {
        workflow_id: current.workflow_id,
        branch: branch.to_string(),
        status: Some(RunStatus::Success),
        per_page: BASELINE_PAGE_SIZE,
    };
    let page = platform
        .list_runs(&query, 1)
        .await
        .context("Failed to fetch successful workflow runs")?;
    match page.items.into_iter().find(|run| run.id != current.id) {
        Some(run) => {
            tracing::info!(
                "Last successfully completed workflow run: {} for commit: {}",
                run.id,
                run.head_sha
            );
            Ok(Some(run.head_sha))
        }
        None => {
            tracing::info!("No previous successful run found on {}", branch);
            Ok(None)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Call, FakePlatform, run};

    #[tokio::test]
    async fn test_explicit_run() {
        let current = run(10, "c5", RunStatus::InProgress);
        let platform = FakePlatform::new().with_run(run(3, "c2", RunStatus::Completed));
        let baseline =
            resolve_baseline(&platform, &current, "main", Some(RunId(3))).await.unwrap();
        assert_eq!(baseline.as_deref(), Some("c2"));
        assert_eq!(platform.calls(), vec![Call::GetRun(RunId(3))]);
    }

    #[tokio::test]
    async fn test_explicit_run_missing_is_fatal() {
        let current = run(10, "c5", RunStatus::InProgress);
        let platform = FakePlatform::new();
        let err = resolve_baseline(&platform, &current, "main", Some(RunId(3))).await.unwrap_err();
        assert_eq!(err.to_string(), "Failed to fetch last successful workflow run 3");
    }

    #[tokio::test]
    async fn test_implicit_skips_current_run() {
        let current = run(10, "c5", RunStatus::Completed);
        let mut platform = FakePlatform::new();
        platform.success_runs =
            vec![run(10, "c5", RunStatus::Completed), run(7, "c2", RunStatus::Completed)];
        let baseline = resolve_baseline(&platform, &current, "main", None).await.unwrap();
        assert_eq!(baseline.as_deref(), Some("c2"));
        assert_eq!(platform.calls(), vec![Call::ListRuns {
            branch: "main".to_string(),
            status: Some(RunStatus::Success),
            per_page: BASELINE_PAGE_SIZE,
            page: 1,
        }]);
    }

    #[tokio::test]
    async fn test_implicit_without_success_is_unset() {
        let current = run(10, "c5", RunStatus::InProgress);
        let mut platform = FakePlatform::new();
        platform.success_runs = vec![run(10, "c5", RunStatus::Completed)];
        let baseline = resolve_baseline(&platform, &current, "main", None).await.unwrap();
        assert_eq!(baseline, None);
    }
}
