//! Batch issue creation from a YAML plan
//!
//! A plan lists issues in creation order. A body may mention an issue created
//! earlier in the same plan as `{{key}}`, which becomes `#<number>` once that
//! issue exists. Plans are validated before the first request is sent.

use anyhow::{anyhow, bail, Context, Result};
use async_trait::async_trait;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::sync::OnceLock;
use tracing::{error, info};

use crate::github::{CreatedIssue, GitHubClient, NewIssue};

/// A set of issues to create in one go
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct IssuePlan {
    /// Target repository; falls back to `issues.repository` in the config
    #[serde(default)]
    pub repository: Option<String>,

    pub issues: Vec<PlannedIssue>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PlannedIssue {
    /// Name other bodies use to reference this issue
    pub key: String,
    pub title: String,
    #[serde(default)]
    pub body: String,
    #[serde(default)]
    pub labels: Vec<String>,
}

/// An issue created from a plan entry
#[derive(Debug, Clone, PartialEq)]
pub struct CreatedEntry {
    pub key: String,
    pub number: u64,
    pub url: String,
}

/// Anything that can create issues in a repository
#[async_trait]
pub trait IssueCreator: Send + Sync {
    async fn create(&self, owner: &str, repo: &str, issue: &NewIssue) -> Result<CreatedIssue>;
}

#[async_trait]
impl IssueCreator for GitHubClient {
    async fn create(&self, owner: &str, repo: &str, issue: &NewIssue) -> Result<CreatedIssue> {
        self.create_issue(owner, repo, issue).await
    }
}

// A leading `$` marks a CI expression such as `${{ github.sha }}`, not a reference
fn reference_pattern() -> &'static Regex {
    static PATTERN: OnceLock<Regex> = OnceLock::new();
    PATTERN.get_or_init(|| {
        Regex::new(r"(\$?)\{\{\s*([A-Za-z0-9_.-]+)\s*\}\}").expect("reference pattern is valid")
    })
}

fn reference_key<'t>(caps: &regex::Captures<'t>) -> Option<&'t str> {
    let is_expression = caps.get(1).is_some_and(|m| !m.as_str().is_empty());
    if is_expression {
        return None;
    }
    caps.get(2).map(|m| m.as_str())
}

/// `{{token}}` placeholders in a body, in order of appearance.
/// Only tokens naming a key in the plan are treated as issue references.
pub fn references(body: &str) -> Vec<&str> {
    reference_pattern()
        .captures_iter(body)
        .filter_map(|caps| reference_key(&caps))
        .collect()
}

/// Replace every `{{key}}` of an already created issue with `#<number>`.
/// Other placeholders are left as written.
pub fn render_body(body: &str, created: &HashMap<String, u64>) -> String {
    reference_pattern()
        .replace_all(body, |caps: &regex::Captures<'_>| {
            match reference_key(caps).and_then(|key| created.get(key)) {
                Some(number) => format!("#{}", number),
                None => caps[0].to_string(),
            }
        })
        .into_owned()
}

impl IssuePlan {
    /// Load and validate a plan file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read issue plan: {:?}", path))?;

        let plan: IssuePlan = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse issue plan: {:?}", path))?;

        plan.validate()
            .with_context(|| format!("Invalid issue plan: {:?}", path))?;

        Ok(plan)
    }

    /// Check keys are unique, titles non-empty, and references point backwards
    pub fn validate(&self) -> Result<()> {
        if self.issues.is_empty() {
            bail!("Plan contains no issues");
        }

        let mut keys = HashSet::new();
        for issue in &self.issues {
            if !keys.insert(issue.key.as_str()) {
                bail!("Duplicate issue key '{}'", issue.key);
            }
        }

        let mut seen = HashSet::new();
        for issue in &self.issues {
            if issue.title.trim().is_empty() {
                bail!("Issue '{}' has an empty title", issue.key);
            }

            for reference in references(&issue.body) {
                if keys.contains(reference) && !seen.contains(reference) {
                    bail!(
                        "Issue '{}' references '{}', which is not created before it",
                        issue.key,
                        reference
                    );
                }
            }

            seen.insert(issue.key.as_str());
        }

        Ok(())
    }

    /// Repository to create issues in
    pub fn target_repository<'a>(&'a self, default: &'a str) -> &'a str {
        self.repository.as_deref().unwrap_or(default)
    }

    /// Create every issue in order, stopping at the first failure
    pub async fn create_all(
        &self,
        creator: &dyn IssueCreator,
        owner: &str,
        repo: &str,
    ) -> Result<Vec<CreatedEntry>> {
        self.validate()?;

        info!("Creating {} issues in {}/{}", self.issues.len(), owner, repo);

        let mut numbers: HashMap<String, u64> = HashMap::new();
        let mut created = Vec::with_capacity(self.issues.len());

        for planned in &self.issues {
            let new_issue = NewIssue {
                title: planned.title.clone(),
                body: render_body(&planned.body, &numbers),
                labels: planned.labels.clone(),
            };

            match creator.create(owner, repo, &new_issue).await {
                Ok(issue) => {
                    numbers.insert(planned.key.clone(), issue.number);
                    created.push(CreatedEntry {
                        key: planned.key.clone(),
                        number: issue.number,
                        url: issue.html_url,
                    });
                }
                Err(e) => {
                    error!("Failed to create '{}': {:#}", planned.key, e);
                    let done: Vec<String> = created
                        .iter()
                        .map(|entry| format!("{} (#{})", entry.key, entry.number))
                        .collect();
                    return Err(e.context(format!(
                        "Issue creation stopped at '{}'; already created: [{}]",
                        planned.key,
                        done.join(", ")
                    )));
                }
            }
        }

        Ok(created)
    }
}

impl std::str::FromStr for IssuePlan {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self> {
        let plan: IssuePlan = serde_yaml::from_str(s).map_err(|e| anyhow!("{}", e))?;
        plan.validate()?;
        Ok(plan)
    }
}
