use super::{CiClient, RunConclusion, RunSnapshot, RunStatus};
use crate::error::{ReleaseError, Result};
use serde::Deserialize;
use std::process::Command;
use tracing::debug;

const RUN_FIELDS: &str = "databaseId,status,conclusion,url";

/// GitHub CLI backend
///
/// Relies on an authenticated `gh` session. Commands run in the current
/// directory so `gh` resolves the repository from the git remote.
#[derive(Debug, Clone)]
pub struct GhCli {
    program: String,
}

impl Default for GhCli {
    fn default() -> Self {
        GhCli {
            program: "gh".to_string(),
        }
    }
}

/// `gh run ... --json databaseId,status,conclusion,url` record
#[derive(Debug, Deserialize)]
struct GhRun {
    #[serde(rename = "databaseId")]
    database_id: u64,
    status: String,
    #[serde(default)]
    conclusion: Option<String>,
    #[serde(default)]
    url: String,
}

impl From<GhRun> for RunSnapshot {
    fn from(run: GhRun) -> Self {
        RunSnapshot {
            id: run.database_id.to_string(),
            status: RunStatus::from_github(&run.status),
            conclusion: RunConclusion::from_github(run.conclusion.as_deref().unwrap_or("")),
            url: run.url,
        }
    }
}

impl GhCli {
    pub fn new() -> Self {
        Self::default()
    }

    fn command(&self, args: &[&str]) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(args);
        // no pager, no prompts
        cmd.env("GH_PROMPT_DISABLED", "1");
        cmd.env("GH_PAGER", "");
        cmd
    }

    /// Run gh and return stdout, or the failed command with its stderr
    fn run(&self, args: &[&str]) -> Result<String> {
        let rendered = format!("{} {}", self.program, args.join(" "));
        debug!(command = %rendered, "running");

        let output = self.command(args).output().map_err(|e| {
            ReleaseError::command(rendered.clone(), format!("cannot execute: {}", e))
        })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            return Err(ReleaseError::command(rendered, stderr));
        }

        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

impl CiClient for GhCli {
    fn release_exists(&self, tag: &str) -> Result<bool> {
        match self.run(&["release", "view", tag, "--json", "tagName"]) {
            Ok(_) => Ok(true),
            Err(ReleaseError::Command { stderr, .. }) if is_not_found(&stderr) => Ok(false),
            Err(e) => Err(e),
        }
    }

    fn dispatch_workflow(&self, workflow: &str, input: &str, value: &str) -> Result<()> {
        let field = format!("{}={}", input, value);
        self.run(&["workflow", "run", workflow, "-f", &field])?;
        Ok(())
    }

    fn latest_run(&self, workflow: &str) -> Result<Option<RunSnapshot>> {
        let stdout = self.run(&[
            "run",
            "list",
            "--workflow",
            workflow,
            "--event",
            "workflow_dispatch",
            "--limit",
            "1",
            "--json",
            RUN_FIELDS,
        ])?;
        parse_run_list(&stdout)
    }

    fn run_status(&self, run_id: &str) -> Result<RunSnapshot> {
        let stdout = self.run(&["run", "view", run_id, "--json", RUN_FIELDS])?;
        parse_run(&stdout)
    }
}

fn is_not_found(stderr: &str) -> bool {
    let lower = stderr.to_lowercase();
    lower.contains("release not found") || lower.contains("http 404")
}

fn parse_run_list(json: &str) -> Result<Option<RunSnapshot>> {
    let runs: Vec<GhRun> = serde_json::from_str(json)?;
    Ok(runs.into_iter().next().map(RunSnapshot::from))
}

fn parse_run(json: &str) -> Result<RunSnapshot> {
    let run: GhRun = serde_json::from_str(json)?;
    Ok(run.into())
}
