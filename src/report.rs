//! Markdown dashboard rendering
//!
//! Rendering is pure: the same snapshots, statistics and timestamp always
//! produce the same document. Repository rows keep the configured order.

use chrono::{DateTime, Utc};
use std::fmt::Write;

use crate::snapshot::RepositorySnapshot;
use crate::stats::Statistics;

/// File name of the rendered dashboard
pub const DASHBOARD_FILE: &str = "GITHUB_STATS.md";

/// Everything needed to render one dashboard
#[derive(Debug, Clone)]
pub struct ReportContext<'a> {
    pub title: &'a str,
    pub owner: &'a str,
    pub generated_at: DateTime<Utc>,
    pub snapshots: &'a [RepositorySnapshot],
    pub statistics: &'a Statistics,
}

/// Render the dashboard markdown
pub fn render_dashboard(ctx: &ReportContext<'_>) -> String {
    let mut out = String::new();
    write_dashboard(&mut out, ctx).expect("writing to a String cannot fail");
    out
}

fn write_dashboard(out: &mut String, ctx: &ReportContext<'_>) -> std::fmt::Result {
    write_header(out, ctx)?;
    write_repository_table(out, ctx)?;
    write_fetch_warnings(out, ctx.snapshots)?;
    write_summary(out, ctx.statistics)
}

/// Collapse a possibly multi-line error chain onto one line
fn single_line(reason: &str) -> String {
    reason
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

fn write_header(out: &mut String, ctx: &ReportContext<'_>) -> std::fmt::Result {
    writeln!(out, "# {} - GitHub Statistics Dashboard", ctx.title)?;
    writeln!(
        out,
        "Last updated: {}",
        ctx.generated_at.format("%Y-%m-%d %H:%M:%S UTC")
    )?;
    writeln!(out)
}

fn write_repository_table(out: &mut String, ctx: &ReportContext<'_>) -> std::fmt::Result {
    writeln!(out, "## 📊 Repository Statistics")?;
    writeln!(out)?;
    writeln!(out, "| Repository | Open Issues | Open PRs | Last Updated |")?;
    writeln!(out, "|------------|-------------|----------|--------------|")?;

    for snapshot in ctx.snapshots {
        let last_update = snapshot
            .last_issue_update()
            .map(|ts| ts.format("%Y-%m-%d").to_string())
            .unwrap_or_else(|| "N/A".to_string());

        writeln!(
            out,
            "| [{name}](https://github.com/{owner}/{name}) | {} | {} | {} |",
            snapshot.open_issue_count(),
            snapshot.open_pull_request_count(),
            last_update,
            name = snapshot.name,
            owner = ctx.owner,
        )?;
    }

    writeln!(out)
}

fn write_fetch_warnings(out: &mut String, snapshots: &[RepositorySnapshot]) -> std::fmt::Result {
    if snapshots.iter().all(RepositorySnapshot::is_complete) {
        return Ok(());
    }

    writeln!(out, "## ⚠️ Fetch Warnings")?;
    writeln!(out)?;
    writeln!(out, "Counts below exclude data that could not be fetched:")?;
    writeln!(out)?;
    for snapshot in snapshots {
        for failure in &snapshot.fetch_errors {
            writeln!(
                out,
                "- **{}** {}: {}",
                snapshot.name,
                failure.category,
                single_line(&failure.reason)
            )?;
        }
    }
    writeln!(out)
}

fn write_summary(out: &mut String, stats: &Statistics) -> std::fmt::Result {
    writeln!(out, "## 📈 Overall Statistics")?;
    writeln!(out)?;

    writeln!(out, "### Issues")?;
    writeln!(out, "- **Total**: {}", stats.total_issues)?;
    writeln!(out, "- **Open**: {}", stats.open_issues)?;
    writeln!(out, "- **Closed**: {}", stats.closed_issues)?;
    writeln!(out)?;

    writeln!(out, "### Pull Requests")?;
    writeln!(out, "- **Total**: {}", stats.total_prs)?;
    writeln!(out, "- **Open**: {}", stats.open_prs)?;
    writeln!(out, "- **Merged**: {}", stats.merged_prs)?;
    writeln!(out)?;

    let priority = &stats.priority_counts;
    writeln!(out, "### Priority Distribution")?;
    writeln!(out, "- 🔴 Critical: {}", priority.critical)?;
    writeln!(out, "- 🟠 High: {}", priority.high)?;
    writeln!(out, "- 🟡 Medium: {}", priority.medium)?;
    writeln!(out, "- 🟢 Low: {}", priority.low)?;
    writeln!(out)?;

    let types = &stats.type_counts;
    writeln!(out, "### Type Distribution")?;
    writeln!(out, "- 🐛 Bugs: {}", types.bug)?;
    writeln!(out, "- ✨ Features: {}", types.feature)?;
    writeln!(out, "- 💎 Enhancements: {}", types.enhancement)?;
    writeln!(out, "- 📝 Documentation: {}", types.documentation)
}
