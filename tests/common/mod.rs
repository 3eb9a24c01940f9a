//! Common test utilities and helpers for repostats tests
#![allow(dead_code)]

use repostats::config::OutputConfig;
use repostats::{Config, GitHubClient};
use serde_json::{json, Value};
use tempfile::TempDir;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Temporary output directories plus a config pointed at a mock server
pub struct TestEnvironment {
    pub temp_dir: TempDir,
    pub config: Config,
}

impl TestEnvironment {
    pub fn new(server: &MockServer, repositories: &[&str]) -> Self {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");

        let mut config = Config {
            owner: "acme".to_string(),
            repositories: repositories.iter().map(|r| r.to_string()).collect(),
            title: "Acme".to_string(),
            output: OutputConfig {
                data_dir: temp_dir.path().join("data").to_string_lossy().into_owned(),
                dashboard_dir: temp_dir
                    .path()
                    .join("dashboards")
                    .to_string_lossy()
                    .into_owned(),
            },
            ..Default::default()
        };
        config.github.api_base = Some(server.uri());

        Self { temp_dir, config }
    }

    pub fn client(&self) -> GitHubClient {
        GitHubClient::with_token(&self.config, "ghp_test".to_string())
            .expect("Failed to build GitHub client")
    }

    pub fn data_file(&self, name: &str) -> std::path::PathBuf {
        self.temp_dir.path().join("data").join(name)
    }

    pub fn dashboard(&self) -> String {
        std::fs::read_to_string(self.temp_dir.path().join("dashboards/GITHUB_STATS.md"))
            .expect("Failed to read dashboard")
    }
}

/// Issue JSON as returned by the issues endpoint
pub fn issue_json(number: u64, state: &str, labels: &[&str]) -> Value {
    let labels: Vec<Value> = labels.iter().map(|name| json!({ "name": name })).collect();
    json!({
        "number": number,
        "title": format!("Issue {}", number),
        "state": state,
        "labels": labels,
        "updated_at": "2025-07-30T10:00:00Z"
    })
}

/// Pull request as it appears on the issues endpoint
pub fn issue_pull_request_json(number: u64) -> Value {
    let mut value = issue_json(number, "open", &[]);
    value["pull_request"] = json!({ "url": format!("https://api.github.com/repos/acme/x/pulls/{}", number) });
    value
}

pub fn pull_json(number: u64, state: &str, merged_at: Option<&str>) -> Value {
    json!({
        "number": number,
        "title": format!("PR {}", number),
        "state": state,
        "merged_at": merged_at
    })
}

pub fn milestone_json(number: u64) -> Value {
    json!({
        "number": number,
        "title": format!("v{}", number),
        "state": "open",
        "due_on": null
    })
}

/// Mount a single-page list response for one endpoint of one repository
pub async fn mount_list(server: &MockServer, repo: &str, endpoint: &str, body: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/repos/acme/{}/{}", repo, endpoint)))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .mount(server)
        .await;
}

/// Mount all three endpoints for a repository
pub async fn mount_repository(server: &MockServer, repo: &str, issues: Value, pulls: Value, milestones: Value) {
    mount_list(server, repo, "issues", issues).await;
    mount_list(server, repo, "pulls", pulls).await;
    mount_list(server, repo, "milestones", milestones).await;
}

/// Assert every expected fragment appears in the text
pub fn assert_contains_all(text: &str, expected: &[&str]) {
    for item in expected {
        assert!(
            text.contains(item),
            "Expected text to contain '{}', but it didn't. Text: {}",
            item,
            text
        );
    }
}
