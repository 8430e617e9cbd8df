use anyhow::{Context, Result};
use http::StatusCode;
use octocrab::{GitHubError, Octocrab, Page};
use serde::{Deserialize, Serialize};
use supersede_core::{
    config::GitHubConfig,
    models::{
        Commit, DeploymentReview, PendingDeployment, PullRequest, RepoRef, RunId, WorkflowId,
        WorkflowRun,
    },
    paging,
    platform::{Platform, RunQuery},
};
use url::Url;

/// GitHub REST client scoped to a single repository.
#[derive(Clone)]
pub struct GitHub {
    pub client: Octocrab,
    pub repo: RepoRef,
}

impl std::fmt::Debug for GitHub {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHub").field("repo", &self.repo).finish_non_exhaustive()
    }
}

#[derive(Serialize)]
struct ListRunsParams<'a> {
    branch: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
    per_page: u8,
    page: u32,
}

#[derive(Serialize)]
struct ReviewBody<'a> {
    environment_ids: &'a [u64],
    state: supersede_core::models::ReviewState,
    comment: &'a str,
}

#[derive(Deserialize)]
struct RawHeadCommit {
    id: String,
}

/// Workflow run as returned by the REST API, with the fields we rely on.
#[derive(Deserialize)]
struct RawRun {
    id: u64,
    workflow_id: u64,
    head_branch: Option<String>,
    head_sha: String,
    head_commit: Option<RawHeadCommit>,
    status: String,
    conclusion: Option<String>,
    html_url: Url,
}

impl TryFrom<RawRun> for WorkflowRun {
    type Error = anyhow::Error;

    fn try_from(run: RawRun) -> Result<Self> {
        let status = run
            .status
            .parse()
            .with_context(|| format!("Failed to parse status of workflow run {}", run.id))?;
        Ok(Self {
            id: RunId(run.id),
            workflow_id: WorkflowId(run.workflow_id),
            head_branch: run.head_branch.filter(|b| !b.is_empty()),
            head_sha: run.head_sha,
            head_commit: run.head_commit.map(|c| c.id),
            status,
            conclusion: run.conclusion,
            html_url: run.html_url,
        })
    }
}

#[derive(Deserialize)]
struct RawLabel {
    name: String,
}

#[derive(Deserialize)]
struct RawPullRequest {
    number: u64,
    html_url: Option<Url>,
    #[serde(default)]
    labels: Vec<RawLabel>,
}

impl From<RawPullRequest> for PullRequest {
    fn from(value: RawPullRequest) -> Self {
        Self {
            number: value.number,
            html_url: value.html_url,
            labels: value.labels.into_iter().map(|l| l.name).collect(),
        }
    }
}

fn is_not_found(err: &octocrab::Error) -> bool {
    matches!(err, octocrab::Error::GitHub { source, .. }
        if matches!(**source, GitHubError { status_code: StatusCode::NOT_FOUND, .. }))
}

impl GitHub {
    pub fn new(config: &GitHubConfig, repo: RepoRef) -> Result<Self> {
        let client = Octocrab::builder()
            .base_uri(config.api_url.as_str())
            .context("Invalid GitHub API URL")?
            .personal_token(config.token.clone())
            .build()
            .context("Failed to create GitHub client")?;
        Ok(Self { client, repo })
    }

    fn route(&self, path: &str) -> String {
        format!("/repos/{}/{}{}", self.repo.owner, self.repo.repo, path)
    }
}

impl Platform for GitHub {
    async fn default_branch(&self) -> Result<String> {
        let repository = self
            .client
            .repos(&self.repo.owner, &self.repo.repo)
            .get()
            .await
            .with_context(|| format!("Failed to fetch repository {}", self.repo))?;
        Ok(repository.default_branch.unwrap_or_else(|| "main".to_string()))
    }

    async fn get_run(&self, id: RunId) -> Result<WorkflowRun> {
        let route = self.route(&format!("/actions/runs/{id}"));
        let run: RawRun = match self.client.get(route, None::<&()>).await {
            Ok(run) => run,
            Err(e) if is_not_found(&e) => {
                return Err(e).with_context(|| format!("Workflow run {id} not found"));
            }
            Err(e) => return Err(e).with_context(|| format!("Failed to fetch workflow run {id}")),
        };
        run.try_into()
    }

    async fn list_runs(&self, query: &RunQuery, page: u32) -> Result<paging::Page<WorkflowRun>> {
        let params = ListRunsParams {
            branch: &query.branch,
            status: query.status.as_ref().map(|s| s.as_str()),
            per_page: query.per_page,
            page,
        };
        let route = self.route(&format!("/actions/workflows/{}/runs", query.workflow_id));
        let result: Page<RawRun> = self
            .client
            .get(route, Some(&params))
            .await
            .with_context(|| {
                format!("Failed to fetch runs page {page} for workflow {}", query.workflow_id)
            })?;
        let has_next = result.next.is_some();
        let items =
            result.items.into_iter().map(WorkflowRun::try_from).collect::<Result<Vec<_>>>()?;
        tracing::debug!(
            "Fetched runs page {} for workflow {} on {} ({} runs)",
            page,
            query.workflow_id,
            query.branch,
            items.len()
        );
        Ok(paging::Page { items, has_next })
    }

    async fn list_commits(
        &self,
        sha: &str,
        per_page: u8,
        page: u32,
    ) -> Result<paging::Page<Commit>> {
        let result = self
            .client
            .repos(&self.repo.owner, &self.repo.repo)
            .list_commits()
            .sha(sha)
            .per_page(per_page)
            .page(page)
            .send()
            .await
            .with_context(|| format!("Failed to fetch commits page {page} from {sha}"))?;
        let has_next = result.next.is_some();
        let items = result.items.into_iter().map(|c| Commit { sha: c.sha }).collect::<Vec<_>>();
        tracing::debug!("Fetched commits page {} from {} ({} commits)", page, sha, items.len());
        Ok(paging::Page { items, has_next })
    }

    async fn pending_deployments(&self, run: RunId) -> Result<Vec<PendingDeployment>> {
        self.client
            .get(self.route(&format!("/actions/runs/{run}/pending_deployments")), None::<&()>)
            .await
            .with_context(|| format!("Failed to fetch pending deployments for workflow run {run}"))
    }

    async fn cancel_run(&self, run: RunId) -> Result<()> {
        self.client
            .actions()
            .cancel_workflow_run(&self.repo.owner, &self.repo.repo, octocrab::models::RunId(run.0))
            .await
            .with_context(|| format!("Failed to cancel workflow run {run}"))
    }

    async fn review_pending_deployments(
        &self,
        run: RunId,
        review: &DeploymentReview,
    ) -> Result<()> {
        let body = ReviewBody {
            environment_ids: &review.environment_ids,
            state: review.state,
            comment: &review.comment,
        };
        let route = self.route(&format!("/actions/runs/{run}/pending_deployments"));
        let _: serde_json::Value = self.client.post(route, Some(&body)).await.with_context(|| {
            format!("Failed to review pending deployments for workflow run {run}")
        })?;
        Ok(())
    }

    async fn pull_requests_for_commit(&self, sha: &str) -> Result<Vec<PullRequest>> {
        let pull_requests: Vec<RawPullRequest> = self
            .client
            .get(self.route(&format!("/commits/{sha}/pulls")), None::<&()>)
            .await
            .with_context(|| format!("Failed to fetch pull requests for commit {sha}"))?;
        Ok(pull_requests.into_iter().map(PullRequest::from).collect())
    }

    async fn set_labels(&self, number: u64, labels: &[String]) -> Result<()> {
        self.client
            .issues(&self.repo.owner, &self.repo.repo)
            .update(number)
            .labels(labels)
            .send()
            .await
            .with_context(|| format!("Failed to update labels of pull request #{number}"))?;
        Ok(())
    }
}
