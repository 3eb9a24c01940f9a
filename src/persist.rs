//! Artifact persistence
//!
//! Writes the per-repository snapshots, the combined run data, the statistics
//! and the dashboard. Every write replaces the previous file in place.

use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::config::OutputConfig;
use crate::report::DASHBOARD_FILE;
use crate::snapshot::{RepositorySnapshot, SyncData};
use crate::stats::Statistics;

/// File name of the combined snapshot list
pub const ALL_REPOS_FILE: &str = "all-repos.json";

/// File name of the aggregated statistics
pub const STATISTICS_FILE: &str = "statistics.json";

/// Repository names whose `<name>.json` would collide with the combined artifacts
pub const RESERVED_REPOSITORY_NAMES: [&str; 2] = ["all-repos", "statistics"];

/// Writer bound to directories that are known to exist
#[derive(Debug, Clone)]
pub struct ArtifactWriter {
    data_dir: PathBuf,
    dashboard_dir: PathBuf,
}

impl ArtifactWriter {
    /// Create the output directories if needed and return a writer for them
    pub fn prepare(output: &OutputConfig) -> Result<Self> {
        let data_dir = output.data_path();
        let dashboard_dir = output.dashboard_path();

        std::fs::create_dir_all(&data_dir)
            .with_context(|| format!("Failed to create data directory: {:?}", data_dir))?;
        std::fs::create_dir_all(&dashboard_dir)
            .with_context(|| format!("Failed to create dashboard directory: {:?}", dashboard_dir))?;

        debug!(
            "Artifacts go to {:?} (data) and {:?} (dashboard)",
            data_dir, dashboard_dir
        );

        Ok(Self {
            data_dir,
            dashboard_dir,
        })
    }

    pub fn snapshot_path(&self, repo: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", repo))
    }

    pub fn all_repos_path(&self) -> PathBuf {
        self.data_dir.join(ALL_REPOS_FILE)
    }

    pub fn statistics_path(&self) -> PathBuf {
        self.data_dir.join(STATISTICS_FILE)
    }

    pub fn dashboard_path(&self) -> PathBuf {
        self.dashboard_dir.join(DASHBOARD_FILE)
    }

    /// Write `<data_dir>/<repo>.json`
    pub fn write_snapshot(&self, snapshot: &RepositorySnapshot) -> Result<PathBuf> {
        let path = self.snapshot_path(&snapshot.name);
        write_json(&path, snapshot)?;
        info!("Saved data for {} to {:?}", snapshot.name, path);
        Ok(path)
    }

    /// Write `<data_dir>/all-repos.json`
    pub fn write_all_repos(&self, data: &SyncData) -> Result<PathBuf> {
        let path = self.all_repos_path();
        write_json(&path, data)?;
        Ok(path)
    }

    /// Write `<data_dir>/statistics.json`
    pub fn write_statistics(&self, statistics: &Statistics) -> Result<PathBuf> {
        let path = self.statistics_path();
        write_json(&path, statistics)?;
        Ok(path)
    }

    /// Write `<dashboard_dir>/GITHUB_STATS.md`
    pub fn write_dashboard(&self, markdown: &str) -> Result<PathBuf> {
        let path = self.dashboard_path();
        std::fs::write(&path, markdown)
            .with_context(|| format!("Failed to write dashboard: {:?}", path))?;
        info!("Generated dashboard: {:?}", path);
        Ok(path)
    }
}

fn write_json<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)
        .with_context(|| format!("Failed to serialize {:?}", path))?;

    std::fs::write(path, content).with_context(|| format!("Failed to write {:?}", path))?;

    Ok(())
}

/// Read a snapshot artifact back from disk
pub fn load_snapshot(path: &Path) -> Result<RepositorySnapshot> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read snapshot: {:?}", path))?;

    serde_json::from_str(&content).with_context(|| format!("Failed to parse snapshot: {:?}", path))
}
