use std::{
    fs::{File, OpenOptions},
    io::{BufReader, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use argp::FromArgs;
use supersede_core::config::{Config, ConfigLayer, GitHubLayer};
use supersede_engine::Report;
use supersede_github::GitHub;

use crate::util::{first_var, parse_bool};

#[derive(FromArgs, PartialEq, Eq, Debug, Default)]
/// Cancel or reject workflow runs superseded by the current run.
#[argp(subcommand, name = "run")]
pub struct Args {
    #[argp(option, short = 'c')]
    /// YAML configuration file
    pub config: Option<PathBuf>,
    #[argp(option)]
    /// GitHub access token (default: $GITHUB_TOKEN)
    pub token: Option<String>,
    #[argp(option)]
    /// GitHub API URL (default: $GITHUB_API_URL)
    pub api_url: Option<String>,
    #[argp(option, short = 'r')]
    /// repository as owner/repo (default: $GITHUB_REPOSITORY)
    pub repository: Option<String>,
    #[argp(option)]
    /// ID of the workflow run performing the check (default: $GITHUB_RUN_ID)
    pub run_id: Option<String>,
    #[argp(switch)]
    /// only consider commits newer than the last successful run
    pub limit_to_previous_success: bool,
    #[argp(option)]
    /// ID of the last successful run (looked up when omitted)
    pub last_successful_run_id: Option<String>,
    #[argp(option)]
    /// only consider runs with this status, e.g. waiting
    pub status: Option<String>,
    #[argp(switch)]
    /// log what would be done without cancelling, rejecting or labeling
    pub dry_run: bool,
    #[argp(switch)]
    /// reject pending deployments instead of cancelling runs
    pub reject: bool,
    #[argp(option)]
    /// label to add to pull requests of superseded runs
    pub label: Option<String>,
}

pub async fn run(args: Args) -> Result<()> {
    let config = load_config(&args, &|name: &str| std::env::var(name).ok())?;
    let github = GitHub::new(&config.github, config.repository.clone())?;
    tracing::info!("Checking workflow run {} in {}", config.run_id, config.repository);
    let report = supersede_engine::run(&github, config.run_id, &config.supersede).await?;
    tracing::info!(
        "Superseded runs: {:?}",
        report.superseded_run_ids().iter().map(|id| id.0).collect::<Vec<_>>()
    );
    if let Some(path) = std::env::var_os("GITHUB_OUTPUT") {
        write_output(Path::new(&path), &report)?;
    }
    Ok(())
}

/// Merge the config file, environment and command line, in increasing precedence.
fn load_config(args: &Args, env: &impl Fn(&str) -> Option<String>) -> Result<Config> {
    let file = match &args.config {
        Some(path) => {
            let file = BufReader::new(
                File::open(path)
                    .with_context(|| format!("Failed to open config file {}", path.display()))?,
            );
            serde_yaml::from_reader(file)
                .with_context(|| format!("Failed to parse config file {}", path.display()))?
        }
        None => ConfigLayer::default(),
    };
    file.merge(env_layer(env)?).merge(args_layer(args)?).resolve()
}

fn env_layer(env: &impl Fn(&str) -> Option<String>) -> Result<ConfigLayer> {
    let bool_var = |names: &[&str]| -> Result<Option<bool>> {
        first_var(env, names).map(|value| parse_bool(names[0], &value)).transpose()
    };
    Ok(ConfigLayer {
        github: GitHubLayer {
            token: first_var(env, &["GITHUB_TOKEN", "INPUT_ACCESS-TOKEN"]),
            api_url: first_var(env, &["GITHUB_API_URL"])
                .map(|url| url.parse().context("Invalid GITHUB_API_URL"))
                .transpose()?,
        },
        repository: first_var(env, &["GITHUB_REPOSITORY"]).map(|r| r.parse()).transpose()?,
        run_id: first_var(env, &["GITHUB_RUN_ID", "INPUT_WORKFLOW-RUN-ID"])
            .map(|id| id.parse())
            .transpose()?,
        limit_to_previous_success: bool_var(&["INPUT_LIMIT-TO-PREVIOUS-SUCCESSFUL-RUN-COMMIT"])?,
        last_successful_run_id: first_var(env, &["INPUT_LAST-SUCCESSFUL-RUN-ID"])
            .map(|id| id.parse())
            .transpose()?,
        status: first_var(env, &["INPUT_STATUS-OF-WORKFLOWS-TO-CANCEL"])
            .map(|s| s.parse())
            .transpose()?,
        dry_run: bool_var(&["INPUT_DRY-RUN"])?,
        reject: bool_var(&["INPUT_REJECT-WORKFLOW-RUNS"])?,
        label: first_var(env, &["INPUT_TAG-SUPERSEDED-WORKFLOWS-WITH"]),
    })
}

fn args_layer(args: &Args) -> Result<ConfigLayer> {
    let non_empty = |value: &Option<String>| value.clone().filter(|v| !v.is_empty());
    Ok(ConfigLayer {
        github: GitHubLayer {
            token: non_empty(&args.token),
            api_url: non_empty(&args.api_url)
                .map(|url| url.parse().context("Invalid --api-url"))
                .transpose()?,
        },
        repository: non_empty(&args.repository).map(|r| r.parse()).transpose()?,
        run_id: non_empty(&args.run_id).map(|id| id.parse()).transpose()?,
        limit_to_previous_success: args.limit_to_previous_success.then_some(true),
        last_successful_run_id: non_empty(&args.last_successful_run_id)
            .map(|id| id.parse())
            .transpose()?,
        status: non_empty(&args.status).map(|s| s.parse()).transpose()?,
        dry_run: args.dry_run.then_some(true),
        reject: args.reject.then_some(true),
        label: non_empty(&args.label),
    })
}

fn write_output(path: &Path, report: &Report) -> Result<()> {
    let ids = report.superseded_run_ids().iter().map(ToString::to_string).collect::<Vec<_>>();
    let mut file = OpenOptions::new()
        .append(true)
        .create(true)
        .open(path)
        .with_context(|| format!("Failed to open {}", path.display()))?;
    writeln!(file, "superseded-run-ids={}", ids.join(","))
        .with_context(|| format!("Failed to write {}", path.display()))
}
