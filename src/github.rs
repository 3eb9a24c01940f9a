use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use octocrab::{Octocrab, Page};
use serde::{Deserialize, Serialize};
use std::env;
use std::process::Command;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::fetch::RepoFetcher;
use crate::snapshot::{Issue, ItemState, Milestone, PullRequest};

/// Largest page size the GitHub REST API accepts
pub const MAX_PER_PAGE: u8 = 100;

/// GitHub client wrapper with authentication management
#[derive(Clone)]
pub struct GitHubClient {
    client: Octocrab,
}

/// GitHub authentication strategies
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthStrategy {
    /// Use GitHub CLI authentication
    GitHubCLI,
    /// Use environment variable token
    EnvironmentToken,
}

/// Query parameters shared by the list endpoints
#[derive(Debug, Serialize)]
struct ListParams {
    state: &'static str,
    per_page: u8,
}

impl ListParams {
    fn all() -> Self {
        Self {
            state: "all",
            per_page: MAX_PER_PAGE,
        }
    }
}

#[derive(Debug, Deserialize)]
struct LabelRecord {
    name: String,
}

#[derive(Debug, Deserialize)]
struct IssueRecord {
    number: u64,
    #[serde(default)]
    title: String,
    state: String,
    #[serde(default)]
    labels: Vec<LabelRecord>,
    updated_at: DateTime<Utc>,
    /// Set by GitHub when the "issue" is really a pull request
    #[serde(default)]
    pull_request: Option<serde_json::Value>,
}

#[derive(Debug, Deserialize)]
struct PullRequestRecord {
    number: u64,
    #[serde(default)]
    title: Option<String>,
    state: String,
    #[serde(default)]
    merged_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Deserialize)]
struct MilestoneRecord {
    number: u64,
    #[serde(default)]
    title: String,
    state: String,
    #[serde(default)]
    due_on: Option<DateTime<Utc>>,
}

/// Payload for creating an issue
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NewIssue {
    pub title: String,
    pub body: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub labels: Vec<String>,
}

/// The parts of a created issue we report back
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct CreatedIssue {
    pub number: u64,
    pub html_url: String,
}

fn parse_state(state: &str) -> ItemState {
    if state.eq_ignore_ascii_case("open") {
        ItemState::Open
    } else {
        ItemState::Closed
    }
}

impl From<IssueRecord> for Issue {
    fn from(record: IssueRecord) -> Self {
        Self {
            number: record.number,
            title: record.title,
            state: parse_state(&record.state),
            labels: record.labels.into_iter().map(|label| label.name).collect(),
            updated_at: record.updated_at,
        }
    }
}

impl From<PullRequestRecord> for PullRequest {
    fn from(record: PullRequestRecord) -> Self {
        Self {
            number: record.number,
            title: record.title.unwrap_or_default(),
            state: parse_state(&record.state),
            merged_at: record.merged_at,
        }
    }
}

impl From<MilestoneRecord> for Milestone {
    fn from(record: MilestoneRecord) -> Self {
        Self {
            number: record.number,
            title: record.title,
            state: record.state,
            due_on: record.due_on,
        }
    }
}

impl GitHubClient {
    /// Create a new GitHub client with automatic authentication
    pub fn new(config: &Config) -> Result<Self> {
        let (auth_strategy, token) = Self::detect_authentication(config)?;

        info!("Using authentication strategy: {:?}", auth_strategy);

        Self::with_token(config, token)
    }

    /// Create a client from an already resolved token
    pub fn with_token(config: &Config, token: String) -> Result<Self> {
        let mut builder = Octocrab::builder().personal_token(token);

        if let Some(api_base) = &config.github.api_base {
            debug!("Using GitHub API base: {}", api_base);
            builder = builder
                .base_uri(api_base.as_str())
                .with_context(|| format!("Invalid GitHub API base: {}", api_base))?;
        }

        let client = builder.build().context("Failed to create GitHub client")?;

        Ok(Self { client })
    }

    /// Detect and obtain GitHub authentication
    fn detect_authentication(config: &Config) -> Result<(AuthStrategy, String)> {
        let token_env = config.github.token_env.as_str();

        match config.github.auth_method.as_str() {
            "auto" => {
                // Try the environment token first, then GitHub CLI
                if let Ok(token) = Self::try_environment_token(token_env) {
                    Ok((AuthStrategy::EnvironmentToken, token))
                } else if let Ok(token) = Self::try_github_cli() {
                    Ok((AuthStrategy::GitHubCLI, token))
                } else {
                    Err(anyhow!(
                        "No GitHub authentication found. Please either:\n\
                         1. Set the {} environment variable\n\
                         2. Install and authenticate GitHub CLI: gh auth login",
                        token_env
                    ))
                }
            }
            "gh_cli" => {
                let token = Self::try_github_cli()
                    .context("GitHub CLI authentication failed. Run: gh auth login")?;
                Ok((AuthStrategy::GitHubCLI, token))
            }
            "token" => {
                let token = Self::try_environment_token(token_env).with_context(|| {
                    format!("{} environment variable not found or invalid", token_env)
                })?;
                Ok((AuthStrategy::EnvironmentToken, token))
            }
            other => Err(anyhow!("Unknown auth method: {}", other)),
        }
    }

    /// Try to get token from GitHub CLI
    fn try_github_cli() -> Result<String> {
        debug!("Attempting GitHub CLI authentication");

        if !Self::is_command_available("gh") {
            return Err(anyhow!("GitHub CLI (gh) is not installed"));
        }

        let token_output = Command::new("gh")
            .args(["auth", "token"])
            .output()
            .context("Failed to get GitHub CLI token")?;

        if !token_output.status.success() {
            return Err(anyhow!(
                "Failed to retrieve token from GitHub CLI: {}",
                String::from_utf8_lossy(&token_output.stderr)
            ));
        }

        let token = String::from_utf8(token_output.stdout)
            .context("GitHub CLI token is not valid UTF-8")?
            .trim()
            .to_string();

        if token.is_empty() {
            return Err(anyhow!("GitHub CLI returned empty token"));
        }

        debug!("Successfully obtained token from GitHub CLI");
        Ok(token)
    }

    /// Try to get token from an environment variable
    fn try_environment_token(var: &str) -> Result<String> {
        debug!("Attempting environment variable authentication via {}", var);

        let token = env::var(var).with_context(|| format!("{} environment variable not set", var))?;

        if token.trim().is_empty() {
            return Err(anyhow!("{} is empty", var));
        }

        if !token.starts_with("ghp_")
            && !token.starts_with("gho_")
            && !token.starts_with("ghs_")
            && !token.starts_with("github_pat_")
        {
            warn!("{} doesn't look like a GitHub token", var);
        }

        Ok(token)
    }

    /// Check if a command is available in PATH
    fn is_command_available(command: &str) -> bool {
        Command::new("which")
            .arg(command)
            .output()
            .map(|output| output.status.success())
            .unwrap_or(false)
    }

    /// Fetch the first page of a list endpoint and follow `next` links to the end
    async fn list_all<T>(&self, route: String) -> Result<Vec<T>>
    where
        T: serde::de::DeserializeOwned,
    {
        debug!("GET {} (all pages)", route);

        let first_page: Page<T> = self
            .client
            .get(&route, Some(&ListParams::all()))
            .await
            .with_context(|| format!("Failed to fetch {}", route))?;

        let items = self
            .client
            .all_pages(first_page)
            .await
            .with_context(|| format!("Failed to follow pagination for {}", route))?;

        Ok(items)
    }

    /// Create one issue and return its number and URL
    pub async fn create_issue(&self, owner: &str, repo: &str, issue: &NewIssue) -> Result<CreatedIssue> {
        let route = format!("/repos/{}/{}/issues", owner, repo);

        let created: CreatedIssue = self
            .client
            .post(&route, Some(issue))
            .await
            .with_context(|| format!("Failed to create issue '{}' in {}/{}", issue.title, owner, repo))?;

        info!("Created issue #{} in {}/{}", created.number, owner, repo);
        Ok(created)
    }
}

#[async_trait]
impl RepoFetcher for GitHubClient {
    async fn fetch_issues(&self, owner: &str, repo: &str) -> Result<Vec<Issue>> {
        let records: Vec<IssueRecord> = self
            .list_all(format!("/repos/{}/{}/issues", owner, repo))
            .await?;

        let total = records.len();
        let issues: Vec<Issue> = records
            .into_iter()
            .filter(|record| record.pull_request.is_none())
            .map(Issue::from)
            .collect();

        debug!(
            "{}/{}: {} issues ({} pull requests skipped)",
            owner,
            repo,
            issues.len(),
            total - issues.len()
        );
        Ok(issues)
    }

    async fn fetch_pull_requests(&self, owner: &str, repo: &str) -> Result<Vec<PullRequest>> {
        let records: Vec<PullRequestRecord> = self
            .list_all(format!("/repos/{}/{}/pulls", owner, repo))
            .await?;

        Ok(records.into_iter().map(PullRequest::from).collect())
    }

    async fn fetch_milestones(&self, owner: &str, repo: &str) -> Result<Vec<Milestone>> {
        let records: Vec<MilestoneRecord> = self
            .list_all(format!("/repos/{}/{}/milestones", owner, repo))
            .await?;

        Ok(records.into_iter().map(Milestone::from).collect())
    }
}
