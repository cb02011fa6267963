use thiserror::Error;

/// Unified error type for git-release operations
#[derive(Error, Debug)]
pub enum ReleaseError {
    #[error("Invalid version '{0}': expected MAJOR.MINOR.PATCH[-prerelease]")]
    InvalidVersion(String),

    #[error("No changelog entry for {version}: add a '{header}' section to the changelog")]
    MissingChangelogEntry { version: String, header: String },

    #[error("Release {tag} already exists: delete it first (gh release delete {tag} --cleanup-tag)")]
    ReleaseAlreadyExists { tag: String },

    #[error("Changelog error: {0}")]
    Changelog(String),

    #[error("Workflow trigger failed: {0}")]
    Trigger(String),

    #[error("Polling workflow run failed: {0}")]
    Poll(String),

    #[error("Command `{command}` failed: {stderr}")]
    Command { command: String, stderr: String },

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Git operation failed: {0}")]
    Git(#[from] git2::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed JSON from CI client: {0}")]
    Json(#[from] serde_json::Error),
}

/// Convenience type alias for Results in git-release
pub type Result<T> = std::result::Result<T, ReleaseError>;

impl ReleaseError {
    /// Create an invalid version error for the raw input
    pub fn invalid_version(input: impl Into<String>) -> Self {
        ReleaseError::InvalidVersion(input.into())
    }

    /// Create a changelog error with context
    pub fn changelog(msg: impl Into<String>) -> Self {
        ReleaseError::Changelog(msg.into())
    }

    /// Create a trigger error with context
    pub fn trigger(msg: impl Into<String>) -> Self {
        ReleaseError::Trigger(msg.into())
    }

    /// Create a poll error with context
    pub fn poll(msg: impl Into<String>) -> Self {
        ReleaseError::Poll(msg.into())
    }

    /// Create a configuration error with context
    pub fn config(msg: impl Into<String>) -> Self {
        ReleaseError::Config(msg.into())
    }

    /// Create a failed-subprocess error
    pub fn command(command: impl Into<String>, stderr: impl Into<String>) -> Self {
        ReleaseError::Command {
            command: command.into(),
            stderr: stderr.into(),
        }
    }
}
