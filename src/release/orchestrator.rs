use super::clock::{Clock, Interrupt};
use super::gate::{GateFailure, ReleaseGate};
use super::poller::{PollEvent, PollOutcome, PollState, ReleasePoller};
use super::trigger::ReleaseTrigger;
use crate::changelog::{ChangelogStore, ComparisonLink};
use crate::ci::{CiClient, RunConclusion};
use crate::config::Config;
use crate::domain::SemanticVersion;
use crate::error::Result;
use crate::git::{compare_url_base, Repository};
use crate::warning::ReleaseWarning;
use chrono::NaiveDate;
use tracing::{debug, info};

/// Operator-facing side of a release: progress output and the commit prompt
pub trait Interaction {
    fn status(&mut self, message: &str);
    fn success(&mut self, message: &str);
    fn warning(&mut self, warning: &ReleaseWarning);
    /// The watched run entered `state`
    fn run_state(&mut self, state: PollState);
    /// Ask a yes/no question; `Ok(false)` declines
    fn confirm(&mut self, prompt: &str) -> Result<bool>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReleaseRequest {
    /// Target version as typed, with or without a leading `v`
    pub version: String,
    /// Commit and push the changelog without asking
    pub auto_confirm: bool,
    /// Check and report, but change nothing
    pub dry_run: bool,
}

impl ReleaseRequest {
    pub fn new(version: impl Into<String>) -> Self {
        ReleaseRequest {
            version: version.into(),
            auto_confirm: false,
            dry_run: false,
        }
    }
}

/// How a release attempt ended once it got past the gate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReleaseOutcome {
    Released,
    DryRun,
    /// The operator declined to commit the changelog update
    Cancelled,
    RunFailed(RunConclusion),
    TimedOut,
    Interrupted,
    /// Status polling kept failing; the run state is unknown
    PollFailed(String),
}

#[derive(Debug, Clone, PartialEq)]
pub struct ReleaseReport {
    pub version: SemanticVersion,
    pub outcome: ReleaseOutcome,
    /// Link added to the changelog, if one was missing
    pub link: Option<ComparisonLink>,
    pub changelog_committed: bool,
    /// Web page of the published release, on success
    pub release_url: Option<String>,
    /// Logs of the workflow run, once one was found
    pub run_url: Option<String>,
}

impl ReleaseReport {
    fn new(version: SemanticVersion, outcome: ReleaseOutcome) -> Self {
        ReleaseReport {
            version,
            outcome,
            link: None,
            changelog_committed: false,
            release_url: None,
            run_url: None,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(
            self.outcome,
            ReleaseOutcome::Released | ReleaseOutcome::DryRun
        )
    }

    pub fn exit_code(&self) -> i32 {
        if self.is_success() {
            0
        } else {
            1
        }
    }
}

/// Runs a release end to end
///
/// Version validation, the gate, and the workflow trigger fail with an
/// error before anything is polled. Once a run exists, every ending
/// (including polling failures) comes back as a [ReleaseReport].
pub struct ReleaseOrchestrator<'a> {
    repo: &'a dyn Repository,
    ci: &'a dyn CiClient,
    clock: &'a dyn Clock,
    config: &'a Config,
    interrupt: Interrupt,
    today: NaiveDate,
}

impl<'a> ReleaseOrchestrator<'a> {
    pub fn new(
        repo: &'a dyn Repository,
        ci: &'a dyn CiClient,
        clock: &'a dyn Clock,
        config: &'a Config,
    ) -> Self {
        ReleaseOrchestrator {
            repo,
            ci,
            clock,
            config,
            interrupt: Interrupt::default(),
            today: chrono::Local::now().date_naive(),
        }
    }

    pub fn with_interrupt(mut self, interrupt: Interrupt) -> Self {
        self.interrupt = interrupt;
        self
    }

    /// Date used in the header suggested for a missing changelog entry
    pub fn with_today(mut self, today: NaiveDate) -> Self {
        self.today = today;
        self
    }

    pub fn run(
        &self,
        request: &ReleaseRequest,
        interaction: &mut dyn Interaction,
    ) -> Result<ReleaseReport> {
        let version = SemanticVersion::parse(&request.version)?;
        let store = ChangelogStore::new(&self.config.changelog.path);
        let mut doc = store.load()?;

        ReleaseGate::new(self.today)
            .check(&doc, &version, |tag| {
                Ok(self.repo.find_tag(tag)?.is_some() || self.ci.release_exists(tag)?)
            })
            .map_err(|failure: GateFailure| {
                debug!(%failure, "release gate failed");
                failure.into_error()
            })?;
        interaction.status(&format!(
            "Changelog entry for {} found, no existing release {}",
            version,
            version.tag()
        ));

        let repo_url = self.repo_url()?;
        let update = doc.ensure_comparison_link(&version, &repo_url);
        if let Some(warning) = &update.warning {
            interaction.warning(warning);
        }

        let mut report = ReleaseReport::new(version.clone(), ReleaseOutcome::DryRun);
        report.link = update.inserted.clone();

        if request.dry_run {
            match &update.inserted {
                Some(link) => interaction.status(&format!("Would add comparison link {}", link)),
                None => interaction.status("Comparison link already present"),
            }
            interaction.status(&format!(
                "Would dispatch '{}' with {}={}",
                self.config.workflow.name, self.config.workflow.input, version
            ));
            return Ok(report);
        }

        if update.changed {
            store.save(&doc)?;
            if let Some(link) = &update.inserted {
                interaction.status(&format!("Added comparison link {}", link));
            }

            let confirmed = request.auto_confirm
                || interaction.confirm(&format!(
                    "Commit and push the changelog update for {}?",
                    version
                ))?;
            if !confirmed {
                info!("changelog commit declined, release not triggered");
                report.outcome = ReleaseOutcome::Cancelled;
                return Ok(report);
            }

            self.commit_changelog(&store, &version)?;
            report.changelog_committed = true;
            interaction.success("Changelog committed and pushed");
        }

        let handle = ReleaseTrigger::new(self.ci, self.clock, &self.config.workflow)
            .trigger(&version)?;
        report.run_url = Some(handle.url.clone());
        interaction.status(&format!("Watching workflow run {}", handle.url));

        let poller = ReleasePoller::new(
            self.ci,
            self.clock,
            self.interrupt.clone(),
            &self.config.polling,
        );
        let polled = poller.run(&handle, |event| match event {
            PollEvent::Transition { to, .. } => interaction.run_state(*to),
            PollEvent::Retry(warning) => interaction.warning(warning),
        });

        report.outcome = match polled {
            Ok(poll) => {
                report.run_url = Some(poll.run_url);
                match poll.outcome {
                    PollOutcome::Completed(RunConclusion::Success) => ReleaseOutcome::Released,
                    PollOutcome::Completed(conclusion) => ReleaseOutcome::RunFailed(conclusion),
                    PollOutcome::TimedOut => ReleaseOutcome::TimedOut,
                    PollOutcome::Interrupted => ReleaseOutcome::Interrupted,
                }
            }
            Err(e) => ReleaseOutcome::PollFailed(e.to_string()),
        };

        if report.outcome == ReleaseOutcome::Released {
            report.release_url = Some(format!("{}/releases/tag/{}", repo_url, version.tag()));
        }
        info!(%version, outcome = ?report.outcome, "release finished");
        Ok(report)
    }

    fn repo_url(&self) -> Result<String> {
        match &self.config.repository.url {
            Some(url) => Ok(url.trim_end_matches('/').to_string()),
            None => {
                let remote = self.repo.remote_url(&self.config.repository.remote)?;
                Ok(compare_url_base(&remote))
            }
        }
    }

    fn commit_changelog(&self, store: &ChangelogStore, version: &SemanticVersion) -> Result<()> {
        let message = format!("docs(changelog): add comparison link for {}", version);
        let hash = self.repo.commit_file(store.path(), &message)?;
        debug!(%hash, "changelog committed");

        let branch = match &self.config.repository.branch {
            Some(branch) => branch.clone(),
            None => self.repo.current_branch()?,
        };
        self.repo
            .push_branch(&self.config.repository.remote, &branch)
    }
}
