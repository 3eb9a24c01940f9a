//! Sync Engine - fetches, aggregates, renders and persists one run
//!
//! Repositories are processed one at a time in configured order. A failed
//! fetch category degrades that repository's snapshot; a failed write aborts
//! the whole run.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{info, warn};

use crate::config::Config;
use crate::fetch::{fetch_snapshot, RepoFetcher};
use crate::persist::ArtifactWriter;
use crate::report::{render_dashboard, ReportContext};
use crate::snapshot::{FetchFailure, SyncData};
use crate::stats::Statistics;

/// Results from a complete sync run
#[derive(Debug, Clone)]
pub struct SyncSummary {
    pub total_repositories: usize,
    /// (repository, failure) for every category that could not be fetched
    pub failed_fetches: Vec<(String, FetchFailure)>,
    pub statistics: Statistics,
    pub written: Vec<PathBuf>,
    pub duration: Duration,
}

impl SyncSummary {
    pub fn is_complete(&self) -> bool {
        self.failed_fetches.is_empty()
    }
}

/// The engine that drives one synchronization run
#[derive(Clone)]
pub struct SyncEngine {
    config: Arc<Config>,
    fetcher: Arc<dyn RepoFetcher>,
}

impl SyncEngine {
    /// Create a sync engine over the given configuration and data source
    pub fn new(config: Config, fetcher: Arc<dyn RepoFetcher>) -> Self {
        Self {
            config: Arc::new(config),
            fetcher,
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Run a complete sync, stamping artifacts with `now`
    pub async fn run(&self, now: DateTime<Utc>) -> Result<SyncSummary> {
        let start_time = Instant::now();
        let config = self.config.as_ref();

        info!(
            "Starting GitHub data sync for {} repositories of {}",
            config.repositories.len(),
            config.owner
        );

        config.validate()?;

        let writer = ArtifactWriter::prepare(&config.output)
            .context("Failed to prepare output directories")?;
        let mut written = Vec::new();

        let mut data = SyncData {
            timestamp: now,
            repos: Vec::with_capacity(config.repositories.len()),
        };

        for repo in &config.repositories {
            info!("Fetching data for {}", repo);

            let snapshot = fetch_snapshot(self.fetcher.as_ref(), &config.owner, repo).await;
            written.push(writer.write_snapshot(&snapshot)?);
            data.repos.push(snapshot);
        }

        written.push(writer.write_all_repos(&data)?);

        let statistics = Statistics::from_snapshots(&data.repos);
        written.push(writer.write_statistics(&statistics)?);

        let dashboard = render_dashboard(&ReportContext {
            title: &config.title,
            owner: &config.owner,
            generated_at: now,
            snapshots: &data.repos,
            statistics: &statistics,
        });
        written.push(writer.write_dashboard(&dashboard)?);

        let failed_fetches: Vec<(String, FetchFailure)> = data
            .repos
            .iter()
            .flat_map(|snapshot| {
                snapshot
                    .fetch_errors
                    .iter()
                    .map(move |failure| (snapshot.name.clone(), failure.clone()))
            })
            .collect();

        if !failed_fetches.is_empty() {
            warn!(
                "{} fetch categories failed; the report is incomplete",
                failed_fetches.len()
            );
        }

        let summary = SyncSummary {
            total_repositories: data.repos.len(),
            failed_fetches,
            statistics,
            written,
            duration: start_time.elapsed(),
        };

        info!(
            "Sync completed in {:.2}s: {} repositories, {} issues, {} pull requests",
            summary.duration.as_secs_f64(),
            summary.total_repositories,
            summary.statistics.total_issues,
            summary.statistics.total_prs
        );

        Ok(summary)
    }
}
