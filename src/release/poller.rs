use super::clock::{Clock, Interrupt};
use super::trigger::RunHandle;
use crate::ci::{CiClient, RunConclusion, RunSnapshot, RunStatus};
use crate::config::PollingConfig;
use crate::error::{ReleaseError, Result};
use crate::warning::ReleaseWarning;
use std::fmt;
use std::time::Duration;
use tracing::{debug, warn};

/// Observed state of a release run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollState {
    /// Dispatched, not yet observed
    Dispatched,
    Queued,
    InProgress,
    Completed(RunConclusion),
}

impl PollState {
    fn from_snapshot(snapshot: &RunSnapshot) -> Self {
        match snapshot.status {
            RunStatus::Queued => PollState::Queued,
            RunStatus::InProgress => PollState::InProgress,
            // completed without a conclusion is not a success
            RunStatus::Completed => {
                PollState::Completed(snapshot.conclusion.unwrap_or(RunConclusion::Failure))
            }
        }
    }
}

impl fmt::Display for PollState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PollState::Dispatched => write!(f, "dispatched"),
            PollState::Queued => write!(f, "queued"),
            PollState::InProgress => write!(f, "in progress"),
            PollState::Completed(conclusion) => write!(f, "completed ({})", conclusion),
        }
    }
}

/// How watching a run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PollOutcome {
    Completed(RunConclusion),
    /// Gave up after the maximum wait; the run may still be going
    TimedOut,
    /// The operator stopped watching; the run keeps going
    Interrupted,
}

/// Progress reported while polling
#[derive(Debug, Clone, PartialEq)]
pub enum PollEvent {
    Transition { from: PollState, to: PollState },
    Retry(ReleaseWarning),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PollReport {
    pub outcome: PollOutcome,
    /// Every state entered, starting with [PollState::Dispatched]
    pub states: Vec<PollState>,
    pub run_url: String,
    pub elapsed: Duration,
}

/// Watches a workflow run until it completes
pub struct ReleasePoller<'a> {
    ci: &'a dyn CiClient,
    clock: &'a dyn Clock,
    interrupt: Interrupt,
    interval: Duration,
    max_wait: Option<Duration>,
    max_consecutive_errors: u32,
}

impl<'a> ReleasePoller<'a> {
    pub fn new(
        ci: &'a dyn CiClient,
        clock: &'a dyn Clock,
        interrupt: Interrupt,
        config: &PollingConfig,
    ) -> Self {
        ReleasePoller {
            ci,
            clock,
            interrupt,
            interval: config.interval(),
            max_wait: config.max_wait(),
            max_consecutive_errors: config.max_consecutive_errors,
        }
    }

    /// Poll `handle` every interval, reporting each state change to `observer`
    ///
    /// States only move forward: a stale `queued` answer after `in_progress`
    /// is ignored. Status query failures are retried until more than
    /// `max_consecutive_errors` happen in a row.
    pub fn run<F>(&self, handle: &RunHandle, mut observer: F) -> Result<PollReport>
    where
        F: FnMut(&PollEvent),
    {
        let _watching = self.interrupt.watch();
        let started = self.clock.elapsed();
        let mut state = PollState::Dispatched;
        let mut states = vec![state];
        let mut run_url = handle.url.clone();
        let mut errors = 0u32;

        let report = |outcome, states, run_url| PollReport {
            outcome,
            states,
            run_url,
            elapsed: self.clock.elapsed().saturating_sub(started),
        };

        loop {
            if self.interrupt.is_requested() {
                debug!(run_id = %handle.id, "interrupted while watching");
                return Ok(report(PollOutcome::Interrupted, states, run_url));
            }

            match self.ci.run_status(&handle.id) {
                Ok(snapshot) => {
                    errors = 0;
                    if !snapshot.url.is_empty() {
                        run_url = snapshot.url.clone();
                    }

                    let next = PollState::from_snapshot(&snapshot);
                    if rank(next) > rank(state) {
                        debug!(run_id = %handle.id, from = %state, to = %next, "run state changed");
                        observer(&PollEvent::Transition {
                            from: state,
                            to: next,
                        });
                        state = next;
                        states.push(next);
                    }

                    if let PollState::Completed(conclusion) = state {
                        return Ok(report(PollOutcome::Completed(conclusion), states, run_url));
                    }
                }
                Err(e) => {
                    errors += 1;
                    if errors > self.max_consecutive_errors {
                        return Err(ReleaseError::poll(format!(
                            "{} consecutive status queries failed for run {}: {}",
                            errors, handle.id, e
                        )));
                    }
                    warn!(run_id = %handle.id, attempt = errors, "status query failed: {}", e);
                    observer(&PollEvent::Retry(ReleaseWarning::TransientPollError {
                        attempt: errors,
                        max_attempts: self.max_consecutive_errors,
                        message: e.to_string(),
                    }));
                }
            }

            if let Some(max_wait) = self.max_wait {
                if self.clock.elapsed().saturating_sub(started) >= max_wait {
                    return Ok(report(PollOutcome::TimedOut, states, run_url));
                }
            }

            self.clock.sleep(self.interval);
        }
    }
}

fn rank(state: PollState) -> u8 {
    match state {
        PollState::Dispatched => 0,
        PollState::Queued => 1,
        PollState::InProgress => 2,
        PollState::Completed(_) => 3,
    }
}
