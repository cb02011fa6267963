//! CI / release host abstraction
//!
//! Everything the release flow asks of GitHub goes through [CiClient]:
//! checking for an existing release, dispatching the release workflow, and
//! reading workflow runs.
//!
//! - [gh::GhCli]: shells out to the GitHub CLI
//! - [mock::MockCiClient]: scripted responses for tests

pub mod gh;
pub mod mock;

pub use gh::GhCli;
pub use mock::MockCiClient;

use crate::error::Result;
use std::fmt;

/// Lifecycle of a workflow run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    Queued,
    InProgress,
    Completed,
}

impl RunStatus {
    /// Map a GitHub status string; waiting/requested/pending count as queued
    pub fn from_github(status: &str) -> Self {
        match status {
            "completed" => RunStatus::Completed,
            "in_progress" => RunStatus::InProgress,
            _ => RunStatus::Queued,
        }
    }
}

/// Outcome of a completed run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunConclusion {
    Success,
    Failure,
    Cancelled,
}

impl RunConclusion {
    /// Map a GitHub conclusion string; anything unsuccessful other than
    /// cancellation (timed_out, action_required, startup_failure...) is a failure
    pub fn from_github(conclusion: &str) -> Option<Self> {
        match conclusion {
            "" => None,
            "success" => Some(RunConclusion::Success),
            "cancelled" => Some(RunConclusion::Cancelled),
            _ => Some(RunConclusion::Failure),
        }
    }
}

impl fmt::Display for RunConclusion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunConclusion::Success => write!(f, "success"),
            RunConclusion::Failure => write!(f, "failure"),
            RunConclusion::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// Point-in-time view of a workflow run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunSnapshot {
    pub id: String,
    pub status: RunStatus,
    pub conclusion: Option<RunConclusion>,
    /// Web URL of the run (its logs)
    pub url: String,
}

/// The CI system hosting releases and workflow runs
pub trait CiClient {
    /// Whether a release (or its tag) named `tag` exists on the host
    fn release_exists(&self, tag: &str) -> Result<bool>;

    /// Dispatch `workflow`, passing `value` as the `input` parameter
    ///
    /// Dispatch is fire-and-forget: no run id comes back.
    fn dispatch_workflow(&self, workflow: &str, input: &str, value: &str) -> Result<()>;

    /// Most recent run of `workflow`, if any
    fn latest_run(&self, workflow: &str) -> Result<Option<RunSnapshot>>;

    /// Current status of a run
    fn run_status(&self, run_id: &str) -> Result<RunSnapshot>;
}
