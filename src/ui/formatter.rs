//! Pure formatting functions for UI output.
//!
//! This module contains all display/formatting logic separated from user interaction.
//! Message text is built by plain functions so it can be tested; the `display_*`
//! functions only style and print it.

use crate::analyzer::Analysis;
use crate::changelog::VersionSection;
use crate::ci::RunConclusion;
use crate::release::{PollState, ReleaseOutcome, ReleaseReport};
use crate::warning::ReleaseWarning;
use console::style;

/// Format and print an error message in red.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Format and print a success message with green checkmark.
pub fn display_success(message: &str) {
    println!("{} {}", style("✓").green(), message);
}

/// Format and print a status message with yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Display a non-fatal warning on stderr.
pub fn display_warning(warning: &ReleaseWarning) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), warning);
}

/// Display a state change of the watched workflow run.
pub fn display_run_state(state: PollState) {
    let label = format!("Run {}", state);
    let styled = match state {
        PollState::Completed(RunConclusion::Success) => style(label).green(),
        PollState::Completed(_) => style(label).red(),
        _ => style(label).cyan(),
    };
    println!("  {} {}", style("•").dim(), styled);
}

/// Display commits since the last tag and the version they imply.
///
/// Shows up to 10 commits; the remainder is summarised as a count.
pub fn display_analysis(analysis: &Analysis) {
    let since = analysis.previous_tag.as_deref().unwrap_or("the beginning");
    println!(
        "\n{}",
        style(format!("Commits since {}:", since)).bold()
    );

    for commit in analysis.commits.iter().take(10) {
        let marker = if commit.breaking {
            style("!").red().bold().to_string()
        } else {
            " ".to_string()
        };
        println!(
            "  {} {} {}",
            style(commit.commit.short_hash()).dim(),
            marker,
            truncate(&commit.commit.subject, 60)
        );
    }
    if analysis.commits.len() > 10 {
        println!("  ... and {} more commits", analysis.commits.len() - 10);
    }

    println!("\n{}", style("Suggested Version:").bold());
    match &analysis.previous {
        Some(previous) => {
            println!("  From: {}", style(previous).red());
            println!("  To:   {} ({} bump)", style(&analysis.next).green(), analysis.bump);
        }
        None => println!("  Initial: {}", style(&analysis.next).green()),
    }
}

/// Print a drafted changelog section as markdown.
pub fn display_section(section: &VersionSection) {
    println!("\n{}", style(&section.header).bold());
    println!("{}", section.body_text());
}

/// Display the final result of a release.
pub fn display_report(report: &ReleaseReport) {
    let message = outcome_message(report);
    if report.is_success() {
        display_success(&message);
    } else {
        display_error(&message);
    }

    if let Some(url) = &report.release_url {
        println!("  Release: {}", style(url).cyan());
    }
    if !report.is_success() {
        if let Some(url) = &report.run_url {
            println!("  Run logs: {}", style(url).cyan());
        }
    }
}

/// One-line summary of a release outcome.
pub fn outcome_message(report: &ReleaseReport) -> String {
    let tag = report.version.tag();
    match &report.outcome {
        ReleaseOutcome::Released => format!("Released {}", tag),
        ReleaseOutcome::DryRun => format!("Dry run: {} is ready to release", tag),
        ReleaseOutcome::Cancelled => format!(
            "Release of {} cancelled; the changelog update is left uncommitted",
            tag
        ),
        ReleaseOutcome::RunFailed(conclusion) => {
            format!("Release workflow for {} finished with {}", tag, conclusion)
        }
        ReleaseOutcome::TimedOut => format!(
            "Stopped waiting for the release workflow of {}; it may still be running",
            tag
        ),
        ReleaseOutcome::Interrupted => format!(
            "Stopped watching the release workflow of {}; the run continues",
            tag
        ),
        ReleaseOutcome::PollFailed(reason) => {
            format!("Lost track of the release workflow of {}: {}", tag, reason)
        }
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}…", cut)
    }
}
