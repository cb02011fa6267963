use std::fmt;

/// Non-fatal conditions worth telling the operator about.
#[derive(Debug, Clone, PartialEq)]
pub enum ReleaseWarning {
    /// The changelog footer has no `[Unreleased]` link to anchor a new link
    MissingUnreleasedLink { version: String },
    /// No commits since the latest release tag
    NoNewCommits { latest_tag: String },
    /// A status query failed but the retry budget is not exhausted
    TransientPollError {
        attempt: u32,
        max_attempts: u32,
        message: String,
    },
}

impl fmt::Display for ReleaseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReleaseWarning::MissingUnreleasedLink { version } => write!(
                f,
                "No [Unreleased] link in the changelog; appended [{}] at the end instead",
                version
            ),
            ReleaseWarning::NoNewCommits { latest_tag } => {
                write!(f, "No new commits since tag '{}'", latest_tag)
            }
            ReleaseWarning::TransientPollError {
                attempt,
                max_attempts,
                message,
            } => write!(
                f,
                "Run status query failed ({}/{}), retrying: {}",
                attempt, max_attempts, message
            ),
        }
    }
}
