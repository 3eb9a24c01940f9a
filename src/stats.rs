//! Statistics aggregation over repository snapshots
//!
//! Counting is a pure function of the snapshots. Labels are classified by
//! case-insensitive substring match against two fixed keyword lists; within
//! each list the first keyword found wins.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::snapshot::{Issue, PullRequest, RepositorySnapshot};

/// Priority keywords in match order
pub const PRIORITY_KEYWORDS: [&str; 4] = ["critical", "high", "medium", "low"];

/// Type keywords in match order
pub const TYPE_KEYWORDS: [&str; 4] = ["bug", "feature", "enhancement", "documentation"];

/// Priority bucket a label falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Priority {
    Critical,
    High,
    Medium,
    Low,
}

/// Type bucket a label falls into
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IssueType {
    Bug,
    Feature,
    Enhancement,
    Documentation,
}

impl Priority {
    /// Classify a label name, first keyword match wins
    pub fn classify(label: &str) -> Option<Self> {
        let name = label.to_lowercase();
        PRIORITY_KEYWORDS
            .iter()
            .position(|keyword| name.contains(keyword))
            .map(|index| match index {
                0 => Priority::Critical,
                1 => Priority::High,
                2 => Priority::Medium,
                _ => Priority::Low,
            })
    }
}

impl IssueType {
    /// Classify a label name, first keyword match wins
    pub fn classify(label: &str) -> Option<Self> {
        let name = label.to_lowercase();
        TYPE_KEYWORDS
            .iter()
            .position(|keyword| name.contains(keyword))
            .map(|index| match index {
                0 => IssueType::Bug,
                1 => IssueType::Feature,
                2 => IssueType::Enhancement,
                _ => IssueType::Documentation,
            })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriorityCounts {
    pub critical: u64,
    pub high: u64,
    pub medium: u64,
    pub low: u64,
}

impl PriorityCounts {
    fn record(&mut self, priority: Priority) {
        match priority {
            Priority::Critical => self.critical += 1,
            Priority::High => self.high += 1,
            Priority::Medium => self.medium += 1,
            Priority::Low => self.low += 1,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TypeCounts {
    pub bug: u64,
    pub feature: u64,
    pub enhancement: u64,
    pub documentation: u64,
}

impl TypeCounts {
    fn record(&mut self, issue_type: IssueType) {
        match issue_type {
            IssueType::Bug => self.bug += 1,
            IssueType::Feature => self.feature += 1,
            IssueType::Enhancement => self.enhancement += 1,
            IssueType::Documentation => self.documentation += 1,
        }
    }
}

/// Counters computed across every snapshot of a run
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Statistics {
    pub total_issues: u64,
    pub open_issues: u64,
    pub closed_issues: u64,
    #[serde(rename = "totalPRs")]
    pub total_prs: u64,
    #[serde(rename = "openPRs")]
    pub open_prs: u64,
    #[serde(rename = "mergedPRs")]
    pub merged_prs: u64,
    /// Occurrences of each label name across all issues
    pub label_counts: BTreeMap<String, u64>,
    pub priority_counts: PriorityCounts,
    pub type_counts: TypeCounts,
}

impl Statistics {
    /// Aggregate all snapshots into one set of counters
    pub fn from_snapshots(snapshots: &[RepositorySnapshot]) -> Self {
        let mut stats = Self::default();

        for snapshot in snapshots {
            for issue in &snapshot.issues {
                stats.record_issue(issue);
            }
            for pull_request in &snapshot.pull_requests {
                stats.record_pull_request(pull_request);
            }
        }

        stats
    }

    fn record_issue(&mut self, issue: &Issue) {
        self.total_issues += 1;
        if issue.state.is_open() {
            self.open_issues += 1;
        } else {
            self.closed_issues += 1;
        }

        for label in &issue.labels {
            *self.label_counts.entry(label.clone()).or_insert(0) += 1;

            if let Some(priority) = Priority::classify(label) {
                self.priority_counts.record(priority);
            }
            if let Some(issue_type) = IssueType::classify(label) {
                self.type_counts.record(issue_type);
            }
        }
    }

    // Closed but unmerged pull requests only count toward the total.
    fn record_pull_request(&mut self, pull_request: &PullRequest) {
        self.total_prs += 1;
        if pull_request.state.is_open() {
            self.open_prs += 1;
        } else if pull_request.is_merged() {
            self.merged_prs += 1;
        }
    }
}
