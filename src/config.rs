use anyhow::{bail, Context, Result};
use dirs::config_dir;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::persist::RESERVED_REPOSITORY_NAMES;

/// Main configuration structure for repostats
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct Config {
    /// Owner (user or organization) of every configured repository
    #[serde(default = "default_owner")]
    pub owner: String,

    /// Repositories to snapshot, in report order
    #[serde(default = "default_repositories")]
    pub repositories: Vec<String>,

    /// Title shown at the top of the dashboard
    #[serde(default = "default_title")]
    pub title: String,

    /// GitHub authentication settings
    #[serde(default)]
    pub github: GitHubConfig,

    /// Where artifacts are written
    #[serde(default)]
    pub output: OutputConfig,

    /// Issue creation settings
    #[serde(default)]
    pub issues: IssuesConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// GitHub configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct GitHubConfig {
    /// Authentication method
    #[serde(default = "default_auth_method")]
    pub auth_method: String, // "auto", "gh_cli", "token"

    /// Environment variable holding the access token
    #[serde(default = "default_token_env")]
    pub token_env: String,

    /// Alternative API base URL (GitHub Enterprise, test servers)
    #[serde(default)]
    pub api_base: Option<String>,
}

/// Output directory configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct OutputConfig {
    /// Directory for JSON snapshots and statistics
    #[serde(default = "default_data_dir")]
    pub data_dir: String,

    /// Directory for the markdown dashboard
    #[serde(default = "default_dashboard_dir")]
    pub dashboard_dir: String,
}

/// Issue creation configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct IssuesConfig {
    /// Repository that receives created issues unless the plan overrides it
    #[serde(default = "default_issues_repository")]
    pub repository: String,
}

/// Logging configuration
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    /// Log level
    #[serde(default = "default_log_level")]
    pub level: String, // "info"
}

// Default value functions
fn default_owner() -> String {
    "sparkminan".to_string()
}
fn default_repositories() -> Vec<String> {
    vec![
        "claude-code-remote".to_string(),
        "henkaku-ai-archive".to_string(),
    ]
}
fn default_title() -> String {
    "Vibey Technologies".to_string()
}
fn default_auth_method() -> String {
    "auto".to_string()
}
fn default_token_env() -> String {
    "GITHUB_TOKEN".to_string()
}
fn default_data_dir() -> String {
    "data".to_string()
}
fn default_dashboard_dir() -> String {
    "dashboards".to_string()
}
fn default_issues_repository() -> String {
    "vibey-tech-management".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

// Default implementations
impl Default for GitHubConfig {
    fn default() -> Self {
        Self {
            auth_method: default_auth_method(),
            token_env: default_token_env(),
            api_base: None,
        }
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            dashboard_dir: default_dashboard_dir(),
        }
    }
}

impl OutputConfig {
    pub fn data_path(&self) -> PathBuf {
        PathBuf::from(&self.data_dir)
    }

    pub fn dashboard_path(&self) -> PathBuf {
        PathBuf::from(&self.dashboard_dir)
    }
}

impl Default for IssuesConfig {
    fn default() -> Self {
        Self {
            repository: default_issues_repository(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

impl Config {
    /// Load configuration from the default location or fall back to defaults
    pub fn load_or_default() -> Result<Self> {
        let config_path = Self::default_config_path()?;

        if config_path.exists() {
            Self::load(&config_path)
        } else {
            tracing::debug!("No configuration at {:?}, using defaults", config_path);
            let mut config = Self::default();
            config.expand_paths()?;
            Ok(config)
        }
    }

    /// Load configuration from a specific file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let mut config: Config = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config file: {:?}", path))?;

        config
            .validate()
            .with_context(|| format!("Invalid config file: {:?}", path))?;

        // Expand environment variables in paths
        config.expand_paths()?;

        Ok(config)
    }

    /// Save configuration to a file
    pub fn save(&self, path: &Path) -> Result<()> {
        let content = serde_yaml::to_string(self).context("Failed to serialize configuration")?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        std::fs::write(path, content)
            .with_context(|| format!("Failed to write config file: {:?}", path))?;

        Ok(())
    }

    /// Get the default configuration file path (XDG compliant)
    pub fn default_config_path() -> Result<PathBuf> {
        let config_dir = config_dir().context("Failed to get user config directory")?;

        Ok(config_dir.join("repostats").join("config.yml"))
    }

    /// Reject repository names that would overwrite the combined artifacts
    pub fn validate(&self) -> Result<()> {
        for repo in &self.repositories {
            if RESERVED_REPOSITORY_NAMES.contains(&repo.as_str()) {
                bail!(
                    "Repository name '{}' is reserved: its snapshot would be overwritten by {}.json",
                    repo,
                    repo
                );
            }
        }

        Ok(())
    }

    /// Expand environment variables and `~` in output paths
    pub fn expand_paths(&mut self) -> Result<()> {
        self.output.data_dir = shellexpand::full(&self.output.data_dir)
            .context("Failed to expand data_dir path")?
            .into_owned();

        self.output.dashboard_dir = shellexpand::full(&self.output.dashboard_dir)
            .context("Failed to expand dashboard_dir path")?
            .into_owned();

        Ok(())
    }

    /// URL of a repository's GitHub page
    pub fn repository_url(&self, repo: &str) -> String {
        format!("https://github.com/{}/{}", self.owner, repo)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            owner: default_owner(),
            repositories: default_repositories(),
            title: default_title(),
            github: GitHubConfig::default(),
            output: OutputConfig::default(),
            issues: IssuesConfig::default(),
            logging: LoggingConfig::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use tempfile::TempDir;

    #[test]
    fn test_config_default_values() {
        let config = Config::default();

        assert_eq!(config.owner, "sparkminan");
        assert_eq!(
            config.repositories,
            vec!["claude-code-remote", "henkaku-ai-archive"]
        );
        assert_eq!(config.github.auth_method, "auto");
        assert_eq!(config.github.token_env, "GITHUB_TOKEN");
        assert!(config.github.api_base.is_none());
        assert_eq!(config.output.data_dir, "data");
        assert_eq!(config.output.dashboard_dir, "dashboards");
        assert_eq!(config.issues.repository, "vibey-tech-management");
    }

    #[test]
    #[serial]
    fn test_expand_paths() {
        env::set_var("TEST_REPOSTATS_HOME", "/test/home");

        let mut config = Config::default();
        config.output.data_dir = "${TEST_REPOSTATS_HOME}/data".to_string();
        config.output.dashboard_dir = "$TEST_REPOSTATS_HOME/dashboards".to_string();

        config.expand_paths().expect("Failed to expand paths");

        assert_eq!(config.output.data_dir, "/test/home/data");
        assert_eq!(config.output.dashboard_dir, "/test/home/dashboards");

        env::remove_var("TEST_REPOSTATS_HOME");
    }

    #[test]
    fn test_config_load_nonexistent_file() {
        let result = Config::load(Path::new("/nonexistent/path/config.yml"));
        assert!(result.is_err());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("repostats").join("config.yml");

        let mut config = Config::default();
        config.owner = "acme".to_string();
        config.repositories = vec!["widgets".to_string()];
        config.output.data_dir = "/custom/data".to_string();

        config.save(&config_path).expect("Failed to save config");
        let loaded = Config::load(&config_path).expect("Failed to load config");

        assert_eq!(loaded.owner, "acme");
        assert_eq!(loaded.repositories, vec!["widgets"]);
        assert_eq!(loaded.output.data_dir, "/custom/data");
    }

    #[test]
    fn test_config_default_path_xdg() {
        let default_path = Config::default_config_path().expect("Failed to get default path");
        assert!(default_path.to_string_lossy().contains("repostats"));
        assert!(default_path.to_string_lossy().ends_with("config.yml"));
    }

    #[test]
    fn test_yaml_parsing() {
        let yaml_content = r#"
owner: "acme"
repositories:
  - "alpha"
  - "beta"
title: "Acme"
github:
  auth_method: "token"
  token_env: "ACME_TOKEN"
  api_base: "http://localhost:9999"
output:
  data_dir: "/tmp/acme-data"
logging:
  level: "debug"
"#;

        let config: Config = serde_yaml::from_str(yaml_content).expect("Failed to parse YAML");

        assert_eq!(config.owner, "acme");
        assert_eq!(config.repositories, vec!["alpha", "beta"]);
        assert_eq!(config.title, "Acme");
        assert_eq!(config.github.auth_method, "token");
        assert_eq!(config.github.token_env, "ACME_TOKEN");
        assert_eq!(
            config.github.api_base.as_deref(),
            Some("http://localhost:9999")
        );
        assert_eq!(config.output.data_dir, "/tmp/acme-data");
        // Unset sections fall back to defaults
        assert_eq!(config.output.dashboard_dir, "dashboards");
        assert_eq!(config.issues.repository, "vibey-tech-management");
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_empty_repository_list_is_allowed() {
        let config: Config = serde_yaml::from_str("repositories: []").expect("Failed to parse YAML");
        assert!(config.repositories.is_empty());
        assert_eq!(config.owner, "sparkminan");
    }

    #[test]
    fn test_reserved_repository_names_are_rejected() {
        let temp_dir = TempDir::new().expect("Failed to create temp dir");
        let config_path = temp_dir.path().join("config.yml");
        std::fs::write(&config_path, "repositories: [\"widgets\", \"statistics\"]\n")
            .expect("Failed to write config");

        let err = Config::load(&config_path).unwrap_err();
        assert!(format!("{:#}", err).contains("'statistics' is reserved"));

        let mut config = Config::default();
        config.repositories = vec!["all-repos".to_string()];
        assert!(config.validate().is_err());

        config.repositories = vec!["statistics-dashboard".to_string()];
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_repository_url() {
        let config = Config::default();
        assert_eq!(
            config.repository_url("claude-code-remote"),
            "https://github.com/sparkminan/claude-code-remote"
        );
    }
}
