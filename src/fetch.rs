//! Remote data fetching
//!
//! [`RepoFetcher`] is the seam between the sync engine and the hosting
//! provider. A failure in one category is logged and recorded on the snapshot
//! rather than aborting the run.

use anyhow::Result;
use async_trait::async_trait;
use std::future::Future;
use tracing::{debug, warn};

use crate::snapshot::{FetchCategory, FetchOutcome, RepositorySnapshot};
use crate::snapshot::{Issue, Milestone, PullRequest};

/// Source of issues, pull requests and milestones for one repository.
/// Implementations return every page; callers never see pagination.
#[async_trait]
pub trait RepoFetcher: Send + Sync {
    async fn fetch_issues(&self, owner: &str, repo: &str) -> Result<Vec<Issue>>;

    async fn fetch_pull_requests(&self, owner: &str, repo: &str) -> Result<Vec<PullRequest>>;

    async fn fetch_milestones(&self, owner: &str, repo: &str) -> Result<Vec<Milestone>>;
}

/// Await one category fetch and turn any error into a tagged failure
pub async fn fetch_category<T, F>(repo: &str, category: FetchCategory, fetch: F) -> FetchOutcome<T>
where
    F: Future<Output = Result<Vec<T>>>,
{
    match fetch.await {
        Ok(items) => {
            debug!("Fetched {} {} for {}", items.len(), category, repo);
            FetchOutcome::Fetched(items)
        }
        Err(e) => {
            warn!("Error fetching {} for {}: {:#}", category, repo, e);
            FetchOutcome::Failed {
                reason: format!("{:#}", e),
            }
        }
    }
}

/// Fetch all three categories for one repository, one after another
pub async fn fetch_snapshot(fetcher: &dyn RepoFetcher, owner: &str, repo: &str) -> RepositorySnapshot {
    let issues = fetch_category(repo, FetchCategory::Issues, fetcher.fetch_issues(owner, repo)).await;
    let pull_requests = fetch_category(
        repo,
        FetchCategory::PullRequests,
        fetcher.fetch_pull_requests(owner, repo),
    )
    .await;
    let milestones = fetch_category(
        repo,
        FetchCategory::Milestones,
        fetcher.fetch_milestones(owner, repo),
    )
    .await;

    RepositorySnapshot::from_outcomes(repo, issues, pull_requests, milestones)
}
