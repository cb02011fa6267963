use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use git_release::analyzer::VersionAnalyzer;
use git_release::changelog::{draft_section, ChangelogStore};
use git_release::ci::GhCli;
use git_release::config::{self, Config};
use git_release::git::Git2Repository;
use git_release::release::{Interrupt, ReleaseOrchestrator, ReleaseRequest, SystemClock};
use git_release::ui::{self, ConsoleInteraction};
use git_release::warning::ReleaseWarning;

/// Exit code when Ctrl-C arrives outside of run watching
const EXIT_SIGINT: i32 = 130;

#[derive(Parser)]
#[command(
    name = "git-release",
    version,
    about = "Release a version from its changelog entry through a CI workflow",
    args_conflicts_with_subcommands = true
)]
struct Args {
    #[command(subcommand)]
    command: Option<Commands>,

    /// Version to release, with or without a leading 'v'
    #[arg(value_name = "VERSION")]
    target: Option<String>,

    #[arg(short, long, global = true, help = "Custom configuration file path")]
    config: Option<PathBuf>,

    #[arg(short, long, global = true, help = "Show debug logging")]
    verbose: bool,

    #[arg(short = 'y', long, help = "Commit and push the changelog without asking")]
    yes: bool,

    #[arg(long, help = "Check and preview without changing anything")]
    dry_run: bool,

    #[arg(long, global = true, help = "Changelog file (overrides config)")]
    changelog: Option<PathBuf>,

    #[arg(long, help = "Release workflow name or file (overrides config)")]
    workflow: Option<String>,

    #[arg(long, value_name = "SECS", help = "Stop watching the run after this long")]
    timeout: Option<u64>,

    #[arg(long, value_name = "SECS", help = "Seconds between run status checks")]
    interval: Option<u64>,
}

#[derive(Subcommand)]
enum Commands {
    /// Suggest the next version and draft its changelog section from commits
    Suggest {
        #[arg(long, help = "Insert the drafted section into the changelog")]
        write: bool,
    },
}

fn main() {
    let args = Args::parse();
    init_tracing(args.verbose);

    match run(args) {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            ui::display_error(&format!("{:#}", e));
            std::process::exit(1);
        }
    }
}

fn init_tracing(verbose: bool) {
    let rust_log = std::env::var("RUST_LOG").ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(verbose, rust_log.as_deref()))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `--verbose` wins, then `RUST_LOG`, then warnings only
fn log_filter(verbose: bool, rust_log: Option<&str>) -> EnvFilter {
    if verbose {
        return EnvFilter::new("debug");
    }
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| EnvFilter::new("warn"))
}

fn run(args: Args) -> Result<i32> {
    let mut config = config::load_config(args.config.as_deref())?;
    apply_overrides(&mut config, &args);

    match args.command {
        Some(Commands::Suggest { write }) => suggest(&config, write),
        None => match args.target.as_deref() {
            Some(version) => release(&config, version, args.yes, args.dry_run),
            None => anyhow::bail!("missing VERSION; run with --help for usage"),
        },
    }
}

fn apply_overrides(config: &mut Config, args: &Args) {
    if let Some(path) = &args.changelog {
        config.changelog.path = path.clone();
    }
    if let Some(workflow) = &args.workflow {
        config.workflow.name = workflow.clone();
    }
    if let Some(timeout) = args.timeout {
        config.polling.max_wait_secs = Some(timeout);
    }
    if let Some(interval) = args.interval {
        config.polling.interval_secs = interval;
    }
}

fn release(config: &Config, version: &str, yes: bool, dry_run: bool) -> Result<i32> {
    let interrupt = Interrupt::new();
    let handler = interrupt.clone();
    ctrlc::set_handler(move || {
        // absorbed while a run is watched: the poller reports and exits
        if !handler.request() {
            std::process::exit(EXIT_SIGINT);
        }
    })
    .context("failed to set Ctrl+C handler")?;

    let repo = Git2Repository::open(".").context("not inside a git repository")?;
    let ci = GhCli::new();
    let clock = SystemClock::new(interrupt.clone());

    let request = ReleaseRequest {
        version: version.to_string(),
        auto_confirm: yes,
        dry_run,
    };
    let report = ReleaseOrchestrator::new(&repo, &ci, &clock, config)
        .with_interrupt(interrupt)
        .run(&request, &mut ConsoleInteraction)?;

    ui::display_report(&report);
    Ok(report.exit_code())
}

fn suggest(config: &Config, write: bool) -> Result<i32> {
    let repo = Git2Repository::open(".").context("not inside a git repository")?;
    let analysis =
        VersionAnalyzer::new(config.conventional_commits.clone()).analyze_repository(&repo)?;

    if analysis.commits.is_empty() {
        ui::display_warning(&ReleaseWarning::NoNewCommits {
            latest_tag: analysis
                .previous_tag
                .clone()
                .unwrap_or_else(|| "(none)".to_string()),
        });
    }
    ui::display_analysis(&analysis);

    let today = chrono::Local::now().date_naive();
    let section = draft_section(&analysis.next, today, &analysis.commits);
    ui::display_section(&section);

    if write {
        let store = ChangelogStore::new(&config.changelog.path);
        let mut doc = store.load()?;
        doc.insert_section(section)?;
        store.save(&doc)?;
        ui::display_success(&format!(
            "Added {} section to {}",
            analysis.next,
            store.path().display()
        ));
    }
    Ok(0)
}
