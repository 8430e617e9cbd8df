//! In-memory [`Platform`] used by the engine tests.

use std::{
    collections::{HashMap, HashSet},
    sync::Mutex,
};

use anyhow::{Result, anyhow, bail};
use supersede_core::{
    models::{
        Commit, DeploymentReview, Environment, PendingDeployment, PullRequest, RunId, RunStatus,
        WorkflowId, WorkflowRun,
    },
    paging::Page,
    platform::{Platform, RunQuery},
};
use url::Url;

pub const WORKFLOW: WorkflowId = WorkflowId(159038);

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    DefaultBranch,
    GetRun(RunId),
    ListRuns { branch: String, status: Option<RunStatus>, per_page: u8, page: u32 },
    ListCommits { sha: String, page: u32 },
    PendingDeployments(RunId),
    Cancel(RunId),
    Review(RunId, DeploymentReview),
    PullRequests(String),
    SetLabels(u64, Vec<String>),
}

impl Call {
    pub fn is_mutation(&self) -> bool {
        matches!(self, Call::Cancel(_) | Call::Review(..) | Call::SetLabels(..))
    }
}

#[derive(Default)]
pub struct FakePlatform {
    pub default_branch: String,
    /// Runs resolvable by ID.
    pub runs: HashMap<RunId, WorkflowRun>,
    /// Pages returned when listing runs without a status filter.
    pub run_pages: Vec<Vec<WorkflowRun>>,
    /// Page returned when listing runs with `status=success`.
    pub success_runs: Vec<WorkflowRun>,
    /// Commit pages reachable from any head, newest first.
    pub commit_pages: Vec<Vec<Commit>>,
    pub pending: HashMap<RunId, Vec<PendingDeployment>>,
    pub pull_requests: HashMap<String, Vec<PullRequest>>,
    pub fail_pending: HashSet<RunId>,
    pub fail_cancel: HashSet<RunId>,
    pub fail_commits_page: Option<u32>,
    pub fail_pull_requests: bool,
    pub fail_labels: bool,
    calls: Mutex<Vec<Call>>,
}

impl FakePlatform {
    pub fn new() -> Self { Self { default_branch: "main".to_string(), ..Default::default() } }

    pub fn with_run(mut self, run: WorkflowRun) -> Self {
        self.runs.insert(run.id, run);
        self
    }

    pub fn with_pending(mut self, run: RunId, environments: &[(u64, &str)]) -> Self {
        let deployments = environments.iter().map(|&(id, name)| deployment(id, name)).collect();
        self.pending.insert(run, deployments);
        self
    }

    pub fn calls(&self) -> Vec<Call> { self.calls.lock().unwrap().clone() }

    pub fn mutations(&self) -> Vec<Call> {
        self.calls().into_iter().filter(Call::is_mutation).collect()
    }

    fn record(&self, call: Call) { self.calls.lock().unwrap().push(call); }
}

fn paged<T: Clone>(pages: &[Vec<T>], page: u32) -> Page<T> {
    let index = page as usize - 1;
    Page { items: pages.get(index).cloned().unwrap_or_default(), has_next: index + 1 < pages.len() }
}

impl Platform for FakePlatform {
    async fn default_branch(&self) -> Result<String> {
        self.record(Call::DefaultBranch);
        Ok(self.default_branch.clone())
    }

    async fn get_run(&self, id: RunId) -> Result<WorkflowRun> {
        self.record(Call::GetRun(id));
        self.runs.get(&id).cloned().ok_or_else(|| anyhow!("Workflow run {id} not found"))
    }

    async fn list_runs(&self, query: &RunQuery, page: u32) -> Result<Page<WorkflowRun>> {
        self.record(Call::ListRuns {
            branch: query.branch.clone(),
            status: query.status,
            per_page: query.per_page,
            page,
        });
        match query.status {
            Some(RunStatus::Success) => Ok(Page::last(self.success_runs.clone())),
            Some(status) => bail!("Unexpected status filter {status}"),
            None => Ok(paged(&self.run_pages, page)),
        }
    }

    async fn list_commits(&self, sha: &str, _per_page: u8, page: u32) -> Result<Page<Commit>> {
        self.record(Call::ListCommits { sha: sha.to_string(), page });
        if self.fail_commits_page == Some(page) {
            bail!("Failed to fetch commits page {page} from {sha}");
        }
        Ok(paged(&self.commit_pages, page))
    }

    async fn pending_deployments(&self, run: RunId) -> Result<Vec<PendingDeployment>> {
        self.record(Call::PendingDeployments(run));
        if self.fail_pending.contains(&run) {
            bail!("Failed to fetch pending deployments for workflow run {run}");
        }
        Ok(self.pending.get(&run).cloned().unwrap_or_default())
    }

    async fn cancel_run(&self, run: RunId) -> Result<()> {
        self.record(Call::Cancel(run));
        if self.fail_cancel.contains(&run) {
            bail!("Cannot cancel a workflow run that is completed");
        }
        Ok(())
    }

    async fn review_pending_deployments(
        &self,
        run: RunId,
        review: &DeploymentReview,
    ) -> Result<()> {
        self.record(Call::Review(run, review.clone()));
        Ok(())
    }

    async fn pull_requests_for_commit(&self, sha: &str) -> Result<Vec<PullRequest>> {
        self.record(Call::PullRequests(sha.to_string()));
        if self.fail_pull_requests {
            bail!("Failed to fetch pull requests for commit {sha}");
        }
        Ok(self.pull_requests.get(sha).cloned().unwrap_or_default())
    }

    async fn set_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        self.record(Call::SetLabels(number, labels.to_vec()));
        if self.fail_labels {
            bail!("Validation Failed");
        }
        Ok(())
    }
}

pub fn run(id: u64, sha: &str, status: RunStatus) -> WorkflowRun {
    WorkflowRun {
        id: RunId(id),
        workflow_id: WORKFLOW,
        head_branch: Some("main".to_string()),
        head_sha: sha.to_string(),
        head_commit: Some(sha.to_string()),
        status,
        conclusion: None,
        html_url: Url::parse(&format!("https://github.com/octo/hello/actions/runs/{id}")).unwrap(),
    }
}

pub fn commits(shas: &[&str]) -> Vec<Commit> {
    shas.iter().map(|sha| Commit { sha: sha.to_string() }).collect()
}

pub fn deployment(id: u64, name: &str) -> PendingDeployment {
    PendingDeployment { environment: Environment { id: Some(id), name: Some(name.to_string()) } }
}

pub fn pull_request(number: u64, labels: &[&str]) -> PullRequest {
    PullRequest {
        number,
        html_url: Url::parse(&format!("https://github.com/octo/hello/pull/{number}")).ok(),
        labels: labels.iter().map(|l| l.to_string()).collect(),
    }
}
