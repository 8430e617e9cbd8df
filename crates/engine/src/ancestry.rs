use std::pin::pin;

use anyhow::{Context, Result};
use futures_util::TryStreamExt;
use supersede_core::{models::Commit, paging::pages, platform::Platform};

pub const COMMITS_PAGE_SIZE: u8 = 100;

/// Walk the history reachable from `head`, newest first, up to but excluding `baseline`.
///
/// Without a baseline (or if it is never found) the walk continues until the platform runs out of
/// pages.
pub async fn walk_ancestry<P: Platform>(
    platform: &P,
    head: &str,
    baseline: Option<&str>,
) -> Result<Vec<Commit>> {
    let mut stream =
        pin!(pages(move |page| platform.list_commits(head, COMMITS_PAGE_SIZE, page)));
    let mut commits = Vec::new();
    while let Some(page) = stream.try_next().await.context("Failed to walk commit history")? {
        let boundary =
            baseline.and_then(|sha| page.items.iter().position(|commit| commit.sha == sha));
        match boundary {
            Some(index) => {
                commits.extend(page.items.into_iter().take(index));
                tracing::debug!("Reached baseline commit after {} commits", commits.len());
                break;
            }
            None => commits.extend(page.items),
        }
    }
    tracing::info!("Walked {} commits from {}", commits.len(), head);
    Ok(commits)
}
