use anyhow::Result;
use chrono::Utc;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use repostats::{Config, GitHubClient, IssuePlan, SyncEngine};

#[derive(Parser)]
#[command(name = "repostats")]
#[command(about = "GitHub issue and pull request statistics snapshotter")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file path (defaults to XDG config location)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch repository data, write snapshots, statistics and the dashboard
    Sync,

    /// Create the issues listed in a YAML plan
    CreateIssues {
        /// Issue plan file
        plan: PathBuf,

        /// Repository to create the issues in (overrides plan and config)
        #[arg(long)]
        repo: Option<String>,

        /// Validate and print the plan without creating anything
        #[arg(long)]
        dry_run: bool,
    },

    /// Manage configuration
    Config {
        #[command(subcommand)]
        config_command: ConfigCommands,
    },
}

#[derive(Subcommand)]
enum ConfigCommands {
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },

    /// Print the effective configuration
    Show,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // `config init` must work before any configuration file exists
    let config = match &cli.command {
        Commands::Config {
            config_command: ConfigCommands::Init { .. },
        } => Config::default(),
        _ => load_config(cli.config.as_ref())?,
    };
    init_logging(cli.verbose, &config.logging.level);
    info!("Starting repostats v{}", env!("CARGO_PKG_VERSION"));

    match cli.command {
        Commands::Sync => cmd_sync(config).await,
        Commands::CreateIssues {
            plan,
            repo,
            dry_run,
        } => cmd_create_issues(&plan, repo, dry_run, &config).await,
        Commands::Config { config_command } => cmd_config(config_command, cli.config, &config),
    }
}

/// Initialize logging; RUST_LOG takes precedence over flags and config
fn init_logging(verbose: bool, configured_level: &str) {
    let default_level = if verbose { "debug" } else { configured_level };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(std::io::stderr))
        .with(filter)
        .init();
}

/// Load configuration from specified path or default location
fn load_config(config_path: Option<&PathBuf>) -> Result<Config> {
    match config_path {
        Some(path) => Config::load(path),
        None => Config::load_or_default(),
    }
}

/// Run one full sync
async fn cmd_sync(config: Config) -> Result<()> {
    println!("🔄 Syncing GitHub data for {}...", config.owner);

    let client = GitHubClient::new(&config)?;
    let engine = SyncEngine::new(config, Arc::new(client));

    let summary = engine.run(Utc::now()).await?;

    println!("\n✅ Sync complete");
    println!("   📁 Repositories: {}", summary.total_repositories);
    println!(
        "   🐛 Issues: {} ({} open)",
        summary.statistics.total_issues, summary.statistics.open_issues
    );
    println!(
        "   🔀 Pull requests: {} ({} open, {} merged)",
        summary.statistics.total_prs, summary.statistics.open_prs, summary.statistics.merged_prs
    );
    println!("   ⏱️  Duration: {:.2}s", summary.duration.as_secs_f64());

    if !summary.is_complete() {
        println!("\n⚠️  Some data could not be fetched:");
        for (repo, failure) in &summary.failed_fetches {
            println!("   ❌ {} {}: {}", repo, failure.category, failure.reason);
        }
    }

    for path in &summary.written {
        println!("   📝 {}", path.display());
    }

    Ok(())
}

/// Create issues from a plan file
async fn cmd_create_issues(
    plan_path: &Path,
    repo_override: Option<String>,
    dry_run: bool,
    config: &Config,
) -> Result<()> {
    let plan = IssuePlan::load(plan_path)?;
    let repo = repo_override
        .unwrap_or_else(|| plan.target_repository(&config.issues.repository).to_string());

    if dry_run {
        println!(
            "📋 Plan is valid: {} issues for {}/{}",
            plan.issues.len(),
            config.owner,
            repo
        );
        for (i, issue) in plan.issues.iter().enumerate() {
            println!("   {}. [{}] {}", i + 1, issue.key, issue.title);
            if !issue.labels.is_empty() {
                println!("      🏷  {}", issue.labels.join(", "));
            }
        }
        return Ok(());
    }

    let client = GitHubClient::new(config)?;
    let created = plan.create_all(&client, &config.owner, &repo).await?;

    println!("\n🎉 Created {} issues:", created.len());
    for entry in &created {
        println!("   #{} [{}] {}", entry.number, entry.key, entry.url);
    }
    println!("\nView them at: {}/issues", config.repository_url(&repo));

    Ok(())
}

/// Handle configuration commands
fn cmd_config(
    config_command: ConfigCommands,
    config_path: Option<PathBuf>,
    config: &Config,
) -> Result<()> {
    match config_command {
        ConfigCommands::Init { force } => {
            let path = match config_path {
                Some(path) => path,
                None => Config::default_config_path()?,
            };

            if path.exists() && !force {
                println!("⚠️  Configuration already exists: {}", path.display());
                println!("   Use --force to overwrite it");
                return Ok(());
            }

            Config::default().save(&path)?;
            println!("✅ Configuration written to {}", path.display());
        }
        ConfigCommands::Show => {
            print!("{}", serde_yaml::to_string(config)?);
        }
    }

    Ok(())
}
