use std::{collections::HashMap, pin::pin};

use anyhow::Result;
use futures_util::TryStreamExt;
use supersede_core::{
    models::{RunStatus, WorkflowId, WorkflowRun},
    paging::pages,
    platform::{Platform, RunQuery},
};

pub const RUNS_PAGE_SIZE: u8 = 100;

/// Runs that may be superseded, keyed by head commit.
///
/// When several runs share a head commit, the first one seen (the newest) is kept.
#[derive(Debug, Clone, Default)]
pub struct Candidates {
    runs: Vec<WorkflowRun>,
    by_sha: HashMap<String, usize>,
}

impl Candidates {
    pub fn from_runs(runs: impl IntoIterator<Item = WorkflowRun>) -> Self {
        runs.into_iter().fold(Self::default(), |mut candidates, run| {
            if !candidates.by_sha.contains_key(&run.head_sha) {
                candidates.by_sha.insert(run.head_sha.clone(), candidates.runs.len());
                candidates.runs.push(run);
            }
            candidates
        })
    }

    pub fn get(&self, sha: &str) -> Option<&WorkflowRun> {
        self.by_sha.get(sha).map(|&index| &self.runs[index])
    }

    pub fn iter(&self) -> impl Iterator<Item = &WorkflowRun> { self.runs.iter() }

    pub fn len(&self) -> usize { self.runs.len() }

    pub fn is_empty(&self) -> bool { self.runs.is_empty() }
}

/// Collect the runs of `workflow_id` on `branch`, newest first.
///
/// With a `status` filter, pages are filtered as they arrive and collection stops at the first page
/// containing a match: only that page's matches are returned, and later pages are never requested.
/// Without a filter every page is collected.
pub async fn collect_candidates<P: Platform>(
    platform: &P,
    workflow_id: WorkflowId,
    branch: &str,
    status: Option<RunStatus>,
) -> Result<Candidates> {
    let query = &RunQuery {
        workflow_id,
        branch: branch.to_string(),
        status: None,
        per_page: RUNS_PAGE_SIZE,
    };
    let mut stream = pin!(pages(move |page| platform.list_runs(query, page)));
    let mut runs = Vec::new();
    let mut page_number = 0;
    while let Some(page) = stream.try_next().await? {
        page_number += 1;
        let Some(status) = status else {
            runs.extend(page.items);
            continue;
        };
        let matched =
            page.items.into_iter().filter(|run| run.status == status).collect::<Vec<_>>();
        if !matched.is_empty() {
            tracing::debug!(
                "Found {} runs with status {} on page {}, not fetching further pages",
                matched.len(),
                status,
                page_number
            );
            runs = matched;
            break;
        }
    }
    Ok(Candidates::from_runs(runs))
}
