use super::{CiClient, RunConclusion, RunSnapshot, RunStatus};
use crate::error::{ReleaseError, Result};
use std::collections::{HashSet, VecDeque};
use std::sync::Mutex;

/// Scripted CI client for testing
///
/// `latest_run` and `run_status` answer from queues; the last queued answer
/// is repeated once the queue would otherwise run dry.
pub struct MockCiClient {
    releases: HashSet<String>,
    fail_dispatch: Option<String>,
    latest_runs: Mutex<VecDeque<std::result::Result<Option<RunSnapshot>, String>>>,
    statuses: Mutex<VecDeque<std::result::Result<RunSnapshot, String>>>,
    dispatches: Mutex<Vec<(String, String, String)>>,
    status_queries: Mutex<u32>,
}

impl MockCiClient {
    pub fn new() -> Self {
        MockCiClient {
            releases: HashSet::new(),
            fail_dispatch: None,
            latest_runs: Mutex::new(VecDeque::new()),
            statuses: Mutex::new(VecDeque::new()),
            dispatches: Mutex::new(Vec::new()),
            status_queries: Mutex::new(0),
        }
    }

    /// Pretend a release for `tag` already exists
    pub fn add_release(&mut self, tag: impl Into<String>) {
        self.releases.insert(tag.into());
    }

    /// Make dispatches fail with `message`
    pub fn fail_dispatch(&mut self, message: impl Into<String>) {
        self.fail_dispatch = Some(message.into());
    }

    /// Queue an answer for `latest_run`
    pub fn push_latest_run(&self, run: Option<RunSnapshot>) {
        if let Ok(mut runs) = self.latest_runs.lock() {
            runs.push_back(Ok(run));
        }
    }

    /// Queue a failing `latest_run` call
    pub fn push_latest_run_error(&self, message: impl Into<String>) {
        if let Ok(mut runs) = self.latest_runs.lock() {
            runs.push_back(Err(message.into()));
        }
    }

    /// Queue a status answer for `run_status`
    pub fn push_status(&self, snapshot: RunSnapshot) {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.push_back(Ok(snapshot));
        }
    }

    /// Queue a failing `run_status` call
    pub fn push_status_error(&self, message: impl Into<String>) {
        if let Ok(mut statuses) = self.statuses.lock() {
            statuses.push_back(Err(message.into()));
        }
    }

    /// `(workflow, input, value)` for every dispatch
    pub fn dispatches(&self) -> Vec<(String, String, String)> {
        self.dispatches.lock().map(|d| d.clone()).unwrap_or_default()
    }

    pub fn status_queries(&self) -> u32 {
        self.status_queries.lock().map(|n| *n).unwrap_or(0)
    }
}

impl Default for MockCiClient {
    fn default() -> Self {
        Self::new()
    }
}

/// Build a run snapshot with a predictable URL
pub fn snapshot(
    id: &str,
    status: RunStatus,
    conclusion: Option<RunConclusion>,
) -> RunSnapshot {
    RunSnapshot {
        id: id.to_string(),
        status,
        conclusion,
        url: format!("https://github.com/acme/widgets/actions/runs/{}", id),
    }
}

fn next_sticky<T: Clone>(queue: &mut VecDeque<T>) -> Option<T> {
    if queue.len() > 1 {
        queue.pop_front()
    } else {
        queue.front().cloned()
    }
}

fn poisoned() -> ReleaseError {
    ReleaseError::config("mock CI client lock poisoned")
}

impl CiClient for MockCiClient {
    fn release_exists(&self, tag: &str) -> Result<bool> {
        Ok(self.releases.contains(tag))
    }

    fn dispatch_workflow(&self, workflow: &str, input: &str, value: &str) -> Result<()> {
        if let Some(message) = &self.fail_dispatch {
            return Err(ReleaseError::command(
                format!("gh workflow run {}", workflow),
                message.clone(),
            ));
        }
        self.dispatches.lock().map_err(|_| poisoned())?.push((
            workflow.to_string(),
            input.to_string(),
            value.to_string(),
        ));
        Ok(())
    }

    fn latest_run(&self, workflow: &str) -> Result<Option<RunSnapshot>> {
        let mut runs = self.latest_runs.lock().map_err(|_| poisoned())?;
        match next_sticky(&mut runs) {
            Some(Ok(run)) => Ok(run),
            Some(Err(message)) => Err(ReleaseError::command(
                format!("gh run list --workflow {}", workflow),
                message,
            )),
            None => Ok(None),
        }
    }

    fn run_status(&self, run_id: &str) -> Result<RunSnapshot> {
        *self.status_queries.lock().map_err(|_| poisoned())? += 1;

        let mut statuses = self.statuses.lock().map_err(|_| poisoned())?;
        match next_sticky(&mut statuses) {
            Some(Ok(snapshot)) => Ok(snapshot),
            Some(Err(message)) => Err(ReleaseError::command(
                format!("gh run view {}", run_id),
                message,
            )),
            None => Err(ReleaseError::command(
                format!("gh run view {}", run_id),
                "run not found",
            )),
        }
    }
}
