use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete configuration for git-release.
///
/// Every section is optional in the file; missing values fall back to defaults.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub changelog: ChangelogConfig,
    pub repository: RepositoryConfig,
    pub workflow: WorkflowConfig,
    pub polling: PollingConfig,
    pub conventional_commits: ConventionalCommitsConfig,
}

/// Where the changelog lives.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct ChangelogConfig {
    pub path: PathBuf,
}

impl Default for ChangelogConfig {
    fn default() -> Self {
        ChangelogConfig {
            path: PathBuf::from("CHANGELOG.md"),
        }
    }
}

/// Remote used for pushing and for building comparison links.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct RepositoryConfig {
    pub remote: String,
    /// Browsable repository URL; derived from the remote when unset
    pub url: Option<String>,
    /// Branch to push the changelog commit to; the current branch when unset
    pub branch: Option<String>,
}

impl Default for RepositoryConfig {
    fn default() -> Self {
        RepositoryConfig {
            remote: "origin".to_string(),
            url: None,
            branch: None,
        }
    }
}

/// The CI workflow that performs the release.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct WorkflowConfig {
    /// Workflow file name or display name, as accepted by `gh workflow run`
    pub name: String,
    /// Name of the workflow_dispatch input receiving the version
    pub input: String,
    pub settle_delay_secs: u64,
    pub lookup_retries: u32,
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        WorkflowConfig {
            name: "release.yml".to_string(),
            input: "version".to_string(),
            settle_delay_secs: 5,
            lookup_retries: 3,
        }
    }
}

impl WorkflowConfig {
    pub fn settle_delay(&self) -> Duration {
        Duration::from_secs(self.settle_delay_secs)
    }
}

/// How the triggered run is watched.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
    /// Give up watching after this long; unlimited when unset
    pub max_wait_secs: Option<u64>,
    pub max_consecutive_errors: u32,
}

impl Default for PollingConfig {
    fn default() -> Self {
        PollingConfig {
            interval_secs: 5,
            max_wait_secs: None,
            max_consecutive_errors: 3,
        }
    }
}

impl PollingConfig {
    pub fn interval(&self) -> Duration {
        Duration::from_secs(self.interval_secs)
    }

    pub fn max_wait(&self) -> Option<Duration> {
        self.max_wait_secs.map(Duration::from_secs)
    }
}

/// Returns the default list of breaking change indicators.
fn default_breaking_change_indicators() -> Vec<String> {
    crate::domain::commit::DEFAULT_BREAKING_INDICATORS
        .iter()
        .map(|s| s.to_string())
        .collect()
}

/// Configuration for conventional commit analysis.
#[derive(Debug, Deserialize, Serialize, Clone, PartialEq)]
pub struct ConventionalCommitsConfig {
    #[serde(default = "default_breaking_change_indicators")]
    pub breaking_change_indicators: Vec<String>,
}

impl Default for ConventionalCommitsConfig {
    fn default() -> Self {
        ConventionalCommitsConfig {
            breaking_change_indicators: default_breaking_change_indicators(),
        }
    }
}

/// Loads configuration from file or returns defaults.
///
/// Attempts to load configuration in the following order:
/// 1. Custom path provided as parameter
/// 2. `gitrelease.toml` in current directory
/// 3. `.gitrelease.toml` in the user config directory
/// 4. Default configuration if no file found
///
/// # Returns
/// * `Ok(Config)` - Loaded or default configuration
/// * `Err` - If a file exists but cannot be read or parsed, or an explicit path is missing
pub fn load_config(config_path: Option<&Path>) -> Result<Config> {
    let path = match config_path {
        Some(path) => Some(path.to_path_buf()),
        None => discover_config(),
    };

    let Some(path) = path else {
        return Ok(Config::default());
    };

    let config_str = fs::read_to_string(&path).map_err(|e| {
        ReleaseError::config(format!("Cannot read {}: {}", path.display(), e))
    })?;
    toml::from_str(&config_str)
        .map_err(|e| ReleaseError::config(format!("Invalid {}: {}", path.display(), e)))
}

fn discover_config() -> Option<PathBuf> {
    let local = PathBuf::from("./gitrelease.toml");
    if local.exists() {
        return Some(local);
    }
    dirs::config_dir()
        .map(|dir| dir.join(".gitrelease.toml"))
        .filter(|path| path.exists())
}
