//! GitHub API behavior against a mock server

mod common;

use chrono::Utc;
use common::*;
use repostats::fetch::{fetch_snapshot, RepoFetcher};
use repostats::github::NewIssue;
use repostats::persist::load_snapshot;
use repostats::snapshot::FetchCategory;
use repostats::{IssuePlan, SyncEngine};
use serde_json::json;
use std::sync::Arc;
use wiremock::matchers::{body_partial_json, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

#[tokio::test]
async fn test_list_requests_use_state_all_and_max_page_size() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/pulls"))
        .and(query_param("state", "all"))
        .and(query_param("per_page", "100"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            pull_json(1, "open", None)
        ])))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnvironment::new(&server, &["widgets"]);
    let pulls = env.client().fetch_pull_requests("acme", "widgets").await.unwrap();

    assert_eq!(pulls.len(), 1);
}

#[tokio::test]
async fn test_issues_follow_pagination() {
    let server = MockServer::start().await;
    let next = format!(
        "<{}/repos/acme/widgets/issues?state=all&per_page=100&page=2>; rel=\"next\"",
        server.uri()
    );

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues"))
        .and(query_param("page", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([issue_json(3, "closed", &[])])))
        .with_priority(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues"))
        .respond_with(
            ResponseTemplate::new(200)
                .insert_header("link", next.as_str())
                .set_body_json(json!([issue_json(1, "open", &[]), issue_json(2, "open", &[])])),
        )
        .mount(&server)
        .await;

    let env = TestEnvironment::new(&server, &["widgets"]);
    let issues = env.client().fetch_issues("acme", "widgets").await.unwrap();

    let numbers: Vec<u64> = issues.iter().map(|i| i.number).collect();
    assert_eq!(numbers, vec![1, 2, 3]);
}

#[tokio::test]
async fn test_pull_requests_are_dropped_from_issues() {
    let server = MockServer::start().await;
    mount_list(
        &server,
        "widgets",
        "issues",
        json!([issue_json(1, "open", &["type/bug"]), issue_pull_request_json(2)]),
    )
    .await;

    let env = TestEnvironment::new(&server, &["widgets"]);
    let issues = env.client().fetch_issues("acme", "widgets").await.unwrap();

    assert_eq!(issues.len(), 1);
    assert_eq!(issues[0].number, 1);
    assert_eq!(issues[0].labels, vec!["type/bug"]);
}

#[tokio::test]
async fn test_failed_category_is_recorded() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/repos/acme/widgets/issues"))
        .respond_with(ResponseTemplate::new(404).set_body_json(json!({
            "message": "Not Found",
            "documentation_url": "https://docs.github.com/rest"
        })))
        .mount(&server)
        .await;
    mount_list(&server, "widgets", "pulls", json!([pull_json(5, "open", None)])).await;
    mount_list(&server, "widgets", "milestones", json!([milestone_json(1)])).await;

    let env = TestEnvironment::new(&server, &["widgets"]);
    let client = env.client();
    let snapshot = fetch_snapshot(&client, "acme", "widgets").await;

    assert!(snapshot.issues.is_empty());
    assert_eq!(snapshot.pull_requests.len(), 1);
    assert_eq!(snapshot.milestones.len(), 1);
    assert_eq!(snapshot.fetch_errors.len(), 1);
    assert_eq!(snapshot.fetch_errors[0].category, FetchCategory::Issues);
}

#[tokio::test]
async fn test_sync_end_to_end() {
    let server = MockServer::start().await;
    mount_repository(
        &server,
        "one",
        json!([issue_json(1, "open", &["priority/critical"])]),
        json!([
            pull_json(10, "closed", Some("2025-07-20T00:00:00Z")),
            pull_json(11, "open", None),
            pull_json(12, "closed", None)
        ]),
        json!([milestone_json(1)]),
    )
    .await;
    mount_repository(
        &server,
        "two",
        json!([issue_json(2, "open", &["priority/high"])]),
        json!([]),
        json!([]),
    )
    .await;

    let env = TestEnvironment::new(&server, &["one", "two"]);
    let engine = SyncEngine::new(env.config.clone(), Arc::new(env.client()));
    let summary = engine.run(Utc::now()).await.unwrap();

    assert!(summary.is_complete());
    let stats = &summary.statistics;
    assert_eq!(stats.total_issues, 2);
    assert_eq!(stats.open_issues, 2);
    assert_eq!(stats.priority_counts.critical, 1);
    assert_eq!(stats.priority_counts.high, 1);
    assert_eq!(stats.total_prs, 3);
    assert_eq!(stats.open_prs, 1);
    assert_eq!(stats.merged_prs, 1);

    let one = load_snapshot(&env.data_file("one.json")).unwrap();
    assert_eq!(one.issues.len(), 1);
    assert_eq!(one.pull_requests.len(), 3);
    assert_eq!(one.milestones.len(), 1);

    let statistics: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(env.data_file("statistics.json")).unwrap())
            .unwrap();
    assert_eq!(statistics["totalIssues"], 2);
    assert_eq!(statistics["priorityCounts"]["critical"], 1);

    let all: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(env.data_file("all-repos.json")).unwrap())
            .unwrap();
    assert_eq!(all["repos"].as_array().unwrap().len(), 2);
    assert!(all["timestamp"].is_string());

    assert_contains_all(
        &env.dashboard(),
        &[
            "| [one](https://github.com/acme/one) | 1 | 1 | 2025-07-30 |",
            "| [two](https://github.com/acme/two) | 1 | 0 | 2025-07-30 |",
            "Critical: 1",
            "High: 1",
        ],
    );
}

#[tokio::test]
async fn test_create_issue_posts_payload() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/tracker/issues"))
        .and(body_partial_json(json!({
            "title": "Fix transport",
            "labels": ["priority/critical"]
        })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "number": 42,
            "html_url": "https://github.com/acme/tracker/issues/42"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let env = TestEnvironment::new(&server, &[]);
    let created = env
        .client()
        .create_issue(
            "acme",
            "tracker",
            &NewIssue {
                title: "Fix transport".to_string(),
                body: "Use TLS".to_string(),
                labels: vec!["priority/critical".to_string()],
            },
        )
        .await
        .unwrap();

    assert_eq!(created.number, 42);
}

#[tokio::test]
async fn test_issue_plan_links_created_numbers() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/tracker/issues"))
        .and(body_partial_json(json!({ "title": "Security" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "number": 7,
            "html_url": "https://github.com/acme/tracker/issues/7"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/repos/acme/tracker/issues"))
        .and(body_partial_json(json!({ "title": "Tests", "body": "After #7" })))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({
            "number": 8,
            "html_url": "https://github.com/acme/tracker/issues/8"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let plan: IssuePlan = r#"
issues:
  - key: security
    title: "Security"
    body: "Plaintext transport"
  - key: tests
    title: "Tests"
    body: "After {{security}}"
"#
    .parse()
    .unwrap();

    let env = TestEnvironment::new(&server, &[]);
    let created = plan.create_all(&env.client(), "acme", "tracker").await.unwrap();

    let numbers: Vec<u64> = created.iter().map(|c| c.number).collect();
    assert_eq!(numbers, vec![7, 8]);
}
