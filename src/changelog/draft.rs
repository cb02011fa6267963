use super::{section_header, VersionSection};
use crate::domain::commit::extract_pr_numbers;
use crate::domain::{ClassifiedCommit, CommitCategory, SemanticVersion};
use chrono::NaiveDate;

/// Subsection headings in the order they are rendered
const GROUPS: &[(&str, &[CommitCategory])] = &[
    ("Added", &[CommitCategory::Feat]),
    ("Fixed", &[CommitCategory::Fix]),
    ("Performance", &[CommitCategory::Perf]),
    ("Changed", &[CommitCategory::Refactor, CommitCategory::Style]),
    ("Documentation", &[CommitCategory::Docs]),
    (
        "Other",
        &[
            CommitCategory::Test,
            CommitCategory::Build,
            CommitCategory::Ci,
            CommitCategory::Chore,
            CommitCategory::Other,
        ],
    ),
];

/// Render a changelog section for `version` from classified commits
///
/// Breaking commits are listed once, under "Breaking Changes", ahead of the
/// per-category groups.
pub fn draft_section(
    version: &SemanticVersion,
    date: NaiveDate,
    commits: &[ClassifiedCommit],
) -> VersionSection {
    let mut body = vec![String::new()];

    let breaking: Vec<&ClassifiedCommit> = commits.iter().filter(|c| c.breaking).collect();
    push_group(&mut body, "Breaking Changes", &breaking);

    for (heading, categories) in GROUPS {
        let entries: Vec<&ClassifiedCommit> = commits
            .iter()
            .filter(|c| !c.breaking && categories.contains(&c.category))
            .collect();
        push_group(&mut body, heading, &entries);
    }

    if body.len() == 1 {
        body.push("_No notable changes._".to_string());
        body.push(String::new());
    }

    VersionSection {
        label: version.to_string(),
        date: Some(date.format("%Y-%m-%d").to_string()),
        header: section_header(version, date),
        body,
    }
}

fn push_group(body: &mut Vec<String>, heading: &str, entries: &[&ClassifiedCommit]) {
    if entries.is_empty() {
        return;
    }
    body.push(format!("### {}", heading));
    body.push(String::new());
    body.extend(entries.iter().map(|c| format_entry(c)));
    body.push(String::new());
}

fn format_entry(commit: &ClassifiedCommit) -> String {
    let mut line = String::from("- ");
    if let Some(scope) = &commit.scope {
        line.push_str(&format!("**{}:** ", scope));
    }
    line.push_str(&commit.description);

    let mentioned = extract_pr_numbers(&commit.description);
    let missing: Vec<String> = commit
        .pr_numbers
        .difference(&mentioned)
        .map(|n| format!("#{}", n))
        .collect();
    if !missing.is_empty() {
        line.push_str(&format!(" ({})", missing.join(", ")));
    }
    line
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{classify, Commit};

    fn classified(messages: &[&str]) -> Vec<ClassifiedCommit> {
        let commits: Vec<Commit> = messages
            .iter()
            .map(|m| Commit::from_message("abc", "dev", m))
            .collect();
        classify(&commits)
    }

    fn date() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
    }

    #[test]
    fn test_draft_groups_by_category() {
        let commits = classified(&[
            "feat(api): add endpoint (#12)",
            "fix: null check\n\nCloses #13",
            "docs: readme",
            "ci: cache deps",
        ]);
        let section = draft_section(&SemanticVersion::new(1, 6, 0), date(), &commits);

        assert_eq!(section.header, "## [1.6.0] - 2025-01-15");
        assert_eq!(
            section.body.join("\n"),
            "\n### Added\n\n- **api:** add endpoint (#12)\n\n### Fixed\n\n- null check (#13)\n\n### Documentation\n\n- readme\n\n### Other\n\n- cache deps\n"
        );
    }

    #[test]
    fn test_breaking_listed_once() {
        let commits = classified(&["feat!: new config format", "fix: typo"]);
        let body = draft_section(&SemanticVersion::new(2, 0, 0), date(), &commits)
            .body
            .join("\n");

        assert!(body.starts_with("\n### Breaking Changes\n\n- new config format\n"));
        assert!(!body.contains("### Added"));
        assert_eq!(body.matches("new config format").count(), 1);
    }

    #[test]
    fn test_pr_reference_prefix_of_another_is_kept() {
        let commits = classified(&["fix: thing (#12)\n\nAlso fixes #1"]);
        let body = draft_section(&SemanticVersion::new(1, 6, 1), date(), &commits)
            .body
            .join("\n");

        assert!(body.contains("- thing (#12) (#1)\n"), "got: {}", body);
    }

    #[test]
    fn test_empty_draft() {
        let section = draft_section(&SemanticVersion::new(0, 1, 1), date(), &[]);
        assert_eq!(section.body_text(), "_No notable changes._");
    }
}
