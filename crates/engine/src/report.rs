use serde::Serialize;
use supersede_core::models::RunId;

use crate::{
    label::Labeling,
    retire::{Outcome, Retirement},
};

/// What one invocation found and did.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub current_run: RunId,
    pub branch: String,
    pub baseline: Option<String>,
    pub candidates: usize,
    /// `None` when the ancestry walk was skipped.
    pub walked_commits: Option<usize>,
    pub retirements: Vec<Retirement>,
    pub labels: Vec<Labeling>,
}

impl Report {
    pub fn new(current_run: RunId, branch: impl Into<String>) -> Self {
        Self {
            current_run,
            branch: branch.into(),
            baseline: None,
            candidates: 0,
            walked_commits: None,
            retirements: Vec::new(),
            labels: Vec::new(),
        }
    }

    /// Runs that were cancelled or rejected, or would have been in a dry run.
    pub fn superseded_run_ids(&self) -> Vec<RunId> {
        self.retirements
            .iter()
            .filter(|r| r.outcome != Outcome::Skipped)
            .map(|r| r.run.id)
            .collect()
    }
}
