//! The capability surface the supersession pipeline needs from the hosting platform.
//!
//! Every implementation is scoped to a single repository, so no method takes owner/repo.

use std::future::Future;

use anyhow::Result;

use crate::{
    models::{
        Commit, DeploymentReview, PendingDeployment, PullRequest, RunId, RunStatus, WorkflowId,
        WorkflowRun,
    },
    paging::Page,
};

/// Filter for listing a workflow's runs on one branch.
#[derive(Debug, Clone, Eq, PartialEq)]
pub struct RunQuery {
    pub workflow_id: WorkflowId,
    pub branch: String,
    pub status: Option<RunStatus>,
    pub per_page: u8,
}

pub trait Platform {
    /// The repository's configured default branch.
    fn default_branch(&self) -> impl Future<Output = Result<String>> + Send;

    fn get_run(&self, id: RunId) -> impl Future<Output = Result<WorkflowRun>> + Send;

    /// One page of runs matching `query`, newest first.
    fn list_runs(
        &self,
        query: &RunQuery,
        page: u32,
    ) -> impl Future<Output = Result<Page<WorkflowRun>>> + Send;

    /// One page of the commits reachable from `sha`, newest first.
    fn list_commits(
        &self,
        sha: &str,
        per_page: u8,
        page: u32,
    ) -> impl Future<Output = Result<Page<Commit>>> + Send;

    fn pending_deployments(
        &self,
        run: RunId,
    ) -> impl Future<Output = Result<Vec<PendingDeployment>>> + Send;

    fn cancel_run(&self, run: RunId) -> impl Future<Output = Result<()>> + Send;

    fn review_pending_deployments(
        &self,
        run: RunId,
        review: &DeploymentReview,
    ) -> impl Future<Output = Result<()>> + Send;

    fn pull_requests_for_commit(
        &self,
        sha: &str,
    ) -> impl Future<Output = Result<Vec<PullRequest>>> + Send;

    /// Replace the label set of pull request `number`.
    fn set_labels(&self, number: u64, labels: &[String])
    -> impl Future<Output = Result<()>> + Send;
}
