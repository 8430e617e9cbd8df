use std::{fmt, str::FromStr};

use anyhow::{Context, bail};
use serde::{Deserialize, Serialize};
use url::Url;

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Ord, PartialOrd, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub u64);

impl fmt::Display for RunId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

impl FromStr for RunId {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim().parse().map(Self).with_context(|| format!("Invalid workflow run ID '{s}'"))
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct WorkflowId(pub u64);

impl fmt::Display for WorkflowId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { fmt::Display::fmt(&self.0, f) }
}

/// Workflow run status, as accepted by the runs listing `status` filter.
///
/// The platform reports lifecycle values (`queued`, `in_progress`, `completed`, ...) in a run's
/// `status` field, but the listing filter also accepts conclusion values such as `success`.
#[derive(Debug, Clone, Copy, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    Requested,
    Queued,
    Pending,
    InProgress,
    Waiting,
    ActionRequired,
    Completed,
    Cancelled,
    Failure,
    Neutral,
    Skipped,
    Stale,
    Success,
    TimedOut,
}

impl RunStatus {
    pub const fn variants() -> &'static [Self] {
        &[
            Self::Requested,
            Self::Queued,
            Self::Pending,
            Self::InProgress,
            Self::Waiting,
            Self::ActionRequired,
            Self::Completed,
            Self::Cancelled,
            Self::Failure,
            Self::Neutral,
            Self::Skipped,
            Self::Stale,
            Self::Success,
            Self::TimedOut,
        ]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Requested => "requested",
            Self::Queued => "queued",
            Self::Pending => "pending",
            Self::InProgress => "in_progress",
            Self::Waiting => "waiting",
            Self::ActionRequired => "action_required",
            Self::Completed => "completed",
            Self::Cancelled => "cancelled",
            Self::Failure => "failure",
            Self::Neutral => "neutral",
            Self::Skipped => "skipped",
            Self::Stale => "stale",
            Self::Success => "success",
            Self::TimedOut => "timed_out",
        }
    }
}

impl FromStr for RunStatus {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match Self::variants().iter().find(|v| v.as_str() == s) {
            Some(status) => Ok(*status),
            None => bail!("Unknown workflow run status '{s}'"),
        }
    }
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result { f.write_str(self.as_str()) }
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct WorkflowRun {
    pub id: RunId,
    pub workflow_id: WorkflowId,
    /// `None` when the platform reports no branch (e.g. runs triggered from a tag).
    pub head_branch: Option<String>,
    pub head_sha: String,
    /// Commit ID of the run's head commit, when the platform includes one.
    pub head_commit: Option<String>,
    pub status: RunStatus,
    pub conclusion: Option<String>,
    pub html_url: Url,
}

impl WorkflowRun {
    pub fn is_completed(&self) -> bool { self.status == RunStatus::Completed }
}

#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize)]
pub struct Commit {
    pub sha: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    pub id: Option<u64>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize, Deserialize)]
pub struct PendingDeployment {
    pub environment: Environment,
}

impl PendingDeployment {
    pub fn environment_name(&self) -> &str {
        self.environment.name.as_deref().unwrap_or("[unknown]")
    }
}

#[derive(Debug, Clone, Copy, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewState {
    Approved,
    Rejected,
}

/// Body of a pending deployment review.
#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct DeploymentReview {
    pub state: ReviewState,
    pub environment_ids: Vec<u64>,
    pub comment: String,
}

#[derive(Debug, Clone, Eq, PartialEq, Serialize)]
pub struct PullRequest {
    pub number: u64,
    pub html_url: Option<Url>,
    pub labels: Vec<String>,
}

impl PullRequest {
    pub fn display_url(&self) -> String {
        match &self.html_url {
            Some(url) => url.to_string(),
            None => format!("#{}", self.number),
        }
    }
}

/// An `owner/repo` pair.
#[derive(Debug, Clone, Eq, PartialEq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct RepoRef {
    pub owner: String,
    pub repo: String,
}

impl FromStr for RepoRef {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().split_once('/') {
            Some((owner, repo)) if !owner.is_empty() && !repo.is_empty() && !repo.contains('/') => {
                Ok(Self { owner: owner.to_string(), repo: repo.to_string() })
            }
            _ => bail!("Invalid repository '{s}', expected 'owner/repo'"),
        }
    }
}

impl TryFrom<String> for RepoRef {
    type Error = anyhow::Error;

    fn try_from(value: String) -> Result<Self, Self::Error> { value.parse() }
}

impl From<RepoRef> for String {
    fn from(value: RepoRef) -> Self { value.to_string() }
}

impl fmt::Display for RepoRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}
