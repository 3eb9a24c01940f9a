//! Snapshot data model
//!
//! Point-in-time copies of the issues, pull requests and milestones fetched
//! for one repository during a single run. Everything here is serialized with
//! camelCase field names so the JSON artifacts stay readable by other tools.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Open/closed state shared by issues and pull requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemState {
    Open,
    Closed,
}

impl ItemState {
    pub fn is_open(&self) -> bool {
        matches!(self, ItemState::Open)
    }
}

/// An issue as seen at fetch time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Issue {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub state: ItemState,
    /// Label names attached to the issue
    #[serde(default)]
    pub labels: Vec<String>,
    pub updated_at: DateTime<Utc>,
}

/// A pull request as seen at fetch time
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub state: ItemState,
    /// Present only when the pull request was merged
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub merged_at: Option<DateTime<Utc>>,
}

impl PullRequest {
    pub fn is_merged(&self) -> bool {
        self.merged_at.is_some()
    }
}

/// A milestone. Persisted with the snapshot but not aggregated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Milestone {
    pub number: u64,
    #[serde(default)]
    pub title: String,
    pub state: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_on: Option<DateTime<Utc>>,
}

/// The three kinds of data fetched per repository
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum FetchCategory {
    Issues,
    PullRequests,
    Milestones,
}

impl FetchCategory {
    pub fn as_str(&self) -> &'static str {
        match self {
            FetchCategory::Issues => "issues",
            FetchCategory::PullRequests => "pull requests",
            FetchCategory::Milestones => "milestones",
        }
    }
}

impl fmt::Display for FetchCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Result of fetching one category for one repository
#[derive(Debug, Clone, PartialEq)]
pub enum FetchOutcome<T> {
    Fetched(Vec<T>),
    Failed { reason: String },
}

impl<T> FetchOutcome<T> {
    /// Split into the items to keep and the failure to record, if any.
    /// A failed category contributes an empty collection.
    pub fn into_parts(self, category: FetchCategory) -> (Vec<T>, Option<FetchFailure>) {
        match self {
            FetchOutcome::Fetched(items) => (items, None),
            FetchOutcome::Failed { reason } => (Vec::new(), Some(FetchFailure { category, reason })),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, FetchOutcome::Failed { .. })
    }
}

/// A category that could not be fetched during this run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FetchFailure {
    pub category: FetchCategory,
    pub reason: String,
}

/// Everything fetched for one repository in one run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RepositorySnapshot {
    pub name: String,
    pub issues: Vec<Issue>,
    pub pull_requests: Vec<PullRequest>,
    pub milestones: Vec<Milestone>,
    /// Categories that failed; empty when the snapshot is complete
    #[serde(default)]
    pub fetch_errors: Vec<FetchFailure>,
}

impl RepositorySnapshot {
    /// Create an empty snapshot for a repository
    pub fn empty(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            issues: Vec::new(),
            pull_requests: Vec::new(),
            milestones: Vec::new(),
            fetch_errors: Vec::new(),
        }
    }

    /// Assemble a snapshot from the three per-category outcomes
    pub fn from_outcomes(
        name: impl Into<String>,
        issues: FetchOutcome<Issue>,
        pull_requests: FetchOutcome<PullRequest>,
        milestones: FetchOutcome<Milestone>,
    ) -> Self {
        let mut fetch_errors = Vec::new();

        let (issues, failure) = issues.into_parts(FetchCategory::Issues);
        fetch_errors.extend(failure);
        let (pull_requests, failure) = pull_requests.into_parts(FetchCategory::PullRequests);
        fetch_errors.extend(failure);
        let (milestones, failure) = milestones.into_parts(FetchCategory::Milestones);
        fetch_errors.extend(failure);

        Self {
            name: name.into(),
            issues,
            pull_requests,
            milestones,
            fetch_errors,
        }
    }

    pub fn is_complete(&self) -> bool {
        self.fetch_errors.is_empty()
    }

    pub fn open_issue_count(&self) -> usize {
        self.issues.iter().filter(|i| i.state.is_open()).count()
    }

    pub fn open_pull_request_count(&self) -> usize {
        self.pull_requests.iter().filter(|pr| pr.state.is_open()).count()
    }

    /// Most recent `updated_at` across all issues
    pub fn last_issue_update(&self) -> Option<DateTime<Utc>> {
        self.issues.iter().map(|i| i.updated_at).max()
    }
}

/// Combined output of a sync run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncData {
    pub timestamp: DateTime<Utc>,
    pub repos: Vec<RepositorySnapshot>,
}
