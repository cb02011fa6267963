use super::clock::Clock;
use crate::ci::CiClient;
use crate::config::WorkflowConfig;
use crate::domain::SemanticVersion;
use crate::error::{ReleaseError, Result};
use std::time::Duration;
use tracing::{debug, info, warn};

/// The workflow run started for a release
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunHandle {
    pub id: String,
    pub url: String,
    pub version: SemanticVersion,
}

/// Dispatches the release workflow and locates the run it started
///
/// Dispatch does not return a run id, so the run is found by listing the
/// latest dispatched run of the workflow. Any run that was already the
/// latest before dispatching is ignored, which keeps a previous release's
/// run from being mistaken for this one.
pub struct ReleaseTrigger<'a> {
    ci: &'a dyn CiClient,
    clock: &'a dyn Clock,
    workflow: String,
    input: String,
    settle_delay: Duration,
    lookup_retries: u32,
}

impl<'a> ReleaseTrigger<'a> {
    pub fn new(ci: &'a dyn CiClient, clock: &'a dyn Clock, config: &WorkflowConfig) -> Self {
        ReleaseTrigger {
            ci,
            clock,
            workflow: config.name.clone(),
            input: config.input.clone(),
            settle_delay: config.settle_delay(),
            lookup_retries: config.lookup_retries,
        }
    }

    /// Dispatch once, then look up the new run
    ///
    /// The lookup is retried `lookup_retries` times, doubling the wait each
    /// time, whether the run is not listed yet or the lookup itself failed.
    /// The workflow is never dispatched twice.
    pub fn trigger(&self, version: &SemanticVersion) -> Result<RunHandle> {
        let previous = self.ci.latest_run(&self.workflow)?.map(|run| run.id);
        debug!(workflow = %self.workflow, previous = ?previous, "latest run before dispatch");

        self.ci
            .dispatch_workflow(&self.workflow, &self.input, &version.to_string())?;
        info!(workflow = %self.workflow, %version, "workflow dispatched");

        let mut delay = self.settle_delay;
        let mut last_error = None;
        for attempt in 0..=self.lookup_retries {
            self.clock.sleep(delay);
            delay *= 2;

            match self.ci.latest_run(&self.workflow) {
                Ok(Some(run)) if previous.as_deref() != Some(run.id.as_str()) => {
                    info!(run_id = %run.id, "found workflow run");
                    return Ok(RunHandle {
                        id: run.id,
                        url: run.url,
                        version: version.clone(),
                    });
                }
                Ok(_) => debug!(attempt, "dispatched run not listed yet"),
                Err(e) => {
                    warn!(attempt, "run lookup failed: {}", e);
                    last_error = Some(e);
                }
            }
        }

        let reason = match last_error {
            Some(e) => format!("last lookup failed: {}", e),
            None => "check the Actions tab".to_string(),
        };
        Err(ReleaseError::trigger(format!(
            "workflow '{}' was dispatched but its run was not found after {} lookups; {}",
            self.workflow,
            self.lookup_retries + 1,
            reason
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ci::mock::snapshot;
    use crate::ci::{MockCiClient, RunStatus};
    use crate::release::clock::ManualClock;

    fn config() -> WorkflowConfig {
        WorkflowConfig {
            lookup_retries: 2,
            ..WorkflowConfig::default()
        }
    }

    #[test]
    fn test_trigger_finds_new_run() {
        let ci = MockCiClient::new();
        ci.push_latest_run(None);
        ci.push_latest_run(Some(snapshot("42", RunStatus::Queued, None)));
        let clock = ManualClock::new();

        let handle = ReleaseTrigger::new(&ci, &clock, &config())
            .trigger(&SemanticVersion::new(1, 6, 0))
            .unwrap();

        assert_eq!(handle.id, "42");
        assert!(handle.url.ends_with("/runs/42"));
        assert_eq!(
            ci.dispatches(),
            vec![(
                "release.yml".to_string(),
                "version".to_string(),
                "1.6.0".to_string()
            )]
        );
        assert_eq!(clock.sleeps(), vec![Duration::from_secs(5)]);
    }

    #[test]
    fn test_trigger_skips_previous_run() {
        let ci = MockCiClient::new();
        ci.push_latest_run(Some(snapshot("7", RunStatus::Completed, None)));
        ci.push_latest_run(Some(snapshot("7", RunStatus::Completed, None)));
        ci.push_latest_run(Some(snapshot("8", RunStatus::Queued, None)));
        let clock = ManualClock::new();

        let handle = ReleaseTrigger::new(&ci, &clock, &config())
            .trigger(&SemanticVersion::new(1, 6, 0))
            .unwrap();

        assert_eq!(handle.id, "8");
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(5), Duration::from_secs(10)]
        );
    }

    #[test]
    fn test_trigger_gives_up_without_redispatching() {
        let ci = MockCiClient::new();
        ci.push_latest_run(None);
        let clock = ManualClock::new();

        let err = ReleaseTrigger::new(&ci, &clock, &config())
            .trigger(&SemanticVersion::new(1, 6, 0))
            .unwrap_err();

        assert!(matches!(err, ReleaseError::Trigger(_)));
        assert_eq!(ci.dispatches().len(), 1);
        assert_eq!(clock.sleeps().len(), 3);
    }

    #[test]
    fn test_failed_lookup_after_dispatch_is_retried() {
        let ci = MockCiClient::new();
        ci.push_latest_run(None);
        ci.push_latest_run_error("HTTP 502: Bad Gateway");
        ci.push_latest_run(Some(snapshot("42", RunStatus::Queued, None)));
        let clock = ManualClock::new();

        let handle = ReleaseTrigger::new(&ci, &clock, &config())
            .trigger(&SemanticVersion::new(1, 6, 0))
            .unwrap();

        assert_eq!(handle.id, "42");
        assert_eq!(ci.dispatches().len(), 1);
        assert_eq!(
            clock.sleeps(),
            vec![Duration::from_secs(5), Duration::from_secs(10)]
        );
    }

    #[test]
    fn test_persistent_lookup_failure_is_trigger_error() {
        let ci = MockCiClient::new();
        ci.push_latest_run(None);
        ci.push_latest_run_error("HTTP 502: Bad Gateway");
        let clock = ManualClock::new();

        let err = ReleaseTrigger::new(&ci, &clock, &config())
            .trigger(&SemanticVersion::new(1, 6, 0))
            .unwrap_err();

        assert!(matches!(err, ReleaseError::Trigger(_)));
        assert!(err.to_string().contains("HTTP 502"));
        assert_eq!(ci.dispatches().len(), 1);
        assert_eq!(clock.sleeps().len(), 3);
    }

    #[test]
    fn test_lookup_failure_before_dispatch_fails_fast() {
        let ci = MockCiClient::new();
        ci.push_latest_run_error("HTTP 401: Bad credentials");
        let clock = ManualClock::new();

        let err = ReleaseTrigger::new(&ci, &clock, &config())
            .trigger(&SemanticVersion::new(1, 6, 0))
            .unwrap_err();

        assert!(matches!(err, ReleaseError::Command { .. }));
        assert!(ci.dispatches().is_empty());
    }

    #[test]
    fn test_dispatch_failure_propagates() {
        let mut ci = MockCiClient::new();
        ci.fail_dispatch("HTTP 403: Resource not accessible by integration");
        let clock = ManualClock::new();

        let err = ReleaseTrigger::new(&ci, &clock, &config())
            .trigger(&SemanticVersion::new(1, 6, 0))
            .unwrap_err();

        assert!(err.to_string().contains("HTTP 403"));
        assert!(clock.sleeps().is_empty());
    }
}
