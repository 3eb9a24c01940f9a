//! repostats - GitHub issue and pull request statistics
//!
//! Snapshots issues, pull requests and milestones for a configured set of
//! repositories, aggregates simple counters and writes JSON artifacts plus a
//! markdown dashboard. Also creates batches of issues from a YAML plan.
//!
//! ## Modules
//!
//! - [`config`]: Configuration management and parsing
//! - [`github`]: GitHub API access and authentication
//! - [`fetch`]: Per-category fetching with tagged failures
//! - [`stats`]: Counter aggregation and label classification
//! - [`report`]: Markdown dashboard rendering
//! - [`persist`]: JSON and markdown artifact writing
//! - [`sync`]: One complete sync run
//! - [`issues`]: Issue creation from a plan

pub mod config;
pub mod fetch;
pub mod github;
pub mod issues;
pub mod persist;
pub mod report;
pub mod snapshot;
pub mod stats;
pub mod sync;

pub use config::Config;
pub use fetch::RepoFetcher;
pub use github::GitHubClient;
pub use issues::IssuePlan;
pub use snapshot::{RepositorySnapshot, SyncData};
pub use stats::Statistics;
pub use sync::{SyncEngine, SyncSummary};
