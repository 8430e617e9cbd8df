use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use url::Url;

use crate::models::{RepoRef, RunId, RunStatus};

pub const DEFAULT_API_URL: &str = "https://api.github.com";

/// Fully resolved invocation configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub github: GitHubConfig,
    pub repository: RepoRef,
    /// The run performing the check.
    pub run_id: RunId,
    pub supersede: SupersedeConfig,
}

#[derive(Clone, Deserialize, Serialize)]
pub struct GitHubConfig {
    pub token: String,
    pub api_url: Url,
}

impl std::fmt::Debug for GitHubConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GitHubConfig").field("api_url", &self.api_url).finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct SupersedeConfig {
    /// Only consider commits newer than the last successful run's commit.
    #[serde(default)]
    pub limit_to_previous_success: bool,
    /// Explicit last successful run; looked up automatically when unset.
    #[serde(default)]
    pub last_successful_run_id: Option<RunId>,
    /// Only runs with this status are supersession candidates.
    #[serde(default)]
    pub status: Option<RunStatus>,
    #[serde(default)]
    pub dry_run: bool,
    /// Reject pending deployment approvals instead of cancelling the run.
    #[serde(default)]
    pub reject: bool,
    /// Label added to the pull request of each superseded run.
    #[serde(default)]
    pub label: Option<String>,
}

/// One source of configuration values. Layers are merged and then resolved into a [`Config`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
    pub github: GitHubLayer,
    pub repository: Option<RepoRef>,
    pub run_id: Option<RunId>,
    pub limit_to_previous_success: Option<bool>,
    pub last_successful_run_id: Option<RunId>,
    pub status: Option<RunStatus>,
    pub dry_run: Option<bool>,
    pub reject: Option<bool>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GitHubLayer {
    pub token: Option<String>,
    pub api_url: Option<Url>,
}

impl ConfigLayer {
    /// Overlay `other` on top of `self`; values set in `other` win.
    pub fn merge(self, other: ConfigLayer) -> ConfigLayer {
        ConfigLayer {
            github: GitHubLayer {
                token: other.github.token.or(self.github.token),
                api_url: other.github.api_url.or(self.github.api_url),
            },
            repository: other.repository.or(self.repository),
            run_id: other.run_id.or(self.run_id),
            limit_to_previous_success: other
                .limit_to_previous_success
                .or(self.limit_to_previous_success),
            last_successful_run_id: other.last_successful_run_id.or(self.last_successful_run_id),
            status: other.status.or(self.status),
            dry_run: other.dry_run.or(self.dry_run),
            reject: other.reject.or(self.reject),
            label: other.label.or(self.label),
        }
    }

    pub fn resolve(self) -> Result<Config> {
        let api_url = match self.github.api_url {
            Some(url) => url,
            None => Url::parse(DEFAULT_API_URL).context("Invalid default API URL")?,
        };
        Ok(Config {
            github: GitHubConfig {
                token: self
                    .github
                    .token
                    .filter(|t| !t.is_empty())
                    .context("Missing GitHub access token")?,
                api_url,
            },
            repository: self.repository.context("Missing repository")?,
            run_id: self.run_id.context("Missing workflow run ID")?,
            supersede: SupersedeConfig {
                limit_to_previous_success: self.limit_to_previous_success.unwrap_or(false),
                last_successful_run_id: self.last_successful_run_id,
                status: self.status,
                dry_run: self.dry_run.unwrap_or(false),
                reject: self.reject.unwrap_or(false),
                label: self.label.filter(|l| !l.is_empty()),
            },
        })
    }
}
