use regex::Regex;
use std::collections::BTreeSet;
use std::fmt;
use std::sync::OnceLock;

/// Default body markers that flag a breaking change
pub const DEFAULT_BREAKING_INDICATORS: &[&str] = &["BREAKING CHANGE:", "BREAKING-CHANGE:"];

fn conventional_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(feat|fix|docs|style|refactor|perf|test|build|ci|chore)(\(([^)]+)\))?(!)?:\s+(.+)",
        )
        .expect("static regex")
    })
}

fn pr_number_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"#(\d+)").expect("static regex"))
}

/// A commit read from history
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Commit {
    pub hash: String,
    pub subject: String,
    pub body: String,
    pub author_name: String,
}

impl Commit {
    /// Build a commit from a raw message: first line is the subject, the rest the body
    pub fn from_message(
        hash: impl Into<String>,
        author_name: impl Into<String>,
        message: &str,
    ) -> Self {
        let (subject, body) = match message.split_once('\n') {
            Some((subject, body)) => (subject, body.trim()),
            None => (message, ""),
        };

        Commit {
            hash: hash.into(),
            subject: subject.trim().to_string(),
            body: body.to_string(),
            author_name: author_name.into(),
        }
    }

    pub fn short_hash(&self) -> &str {
        self.hash.get(..7).unwrap_or(&self.hash)
    }
}

/// Conventional commit type prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CommitCategory {
    Feat,
    Fix,
    Docs,
    Style,
    Refactor,
    Perf,
    Test,
    Build,
    Ci,
    Chore,
    Other,
}

impl CommitCategory {
    fn from_type(commit_type: &str) -> Self {
        match commit_type {
            "feat" => CommitCategory::Feat,
            "fix" => CommitCategory::Fix,
            "docs" => CommitCategory::Docs,
            "style" => CommitCategory::Style,
            "refactor" => CommitCategory::Refactor,
            "perf" => CommitCategory::Perf,
            "test" => CommitCategory::Test,
            "build" => CommitCategory::Build,
            "ci" => CommitCategory::Ci,
            "chore" => CommitCategory::Chore,
            _ => CommitCategory::Other,
        }
    }
}

impl fmt::Display for CommitCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            CommitCategory::Feat => "feat",
            CommitCategory::Fix => "fix",
            CommitCategory::Docs => "docs",
            CommitCategory::Style => "style",
            CommitCategory::Refactor => "refactor",
            CommitCategory::Perf => "perf",
            CommitCategory::Test => "test",
            CommitCategory::Build => "build",
            CommitCategory::Ci => "ci",
            CommitCategory::Chore => "chore",
            CommitCategory::Other => "other",
        };
        f.write_str(name)
    }
}

/// A commit with its conventional-commit classification
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedCommit {
    pub commit: Commit,
    pub category: CommitCategory,
    pub scope: Option<String>,
    /// Subject text after the `type(scope):` prefix, or the whole subject for `Other`
    pub description: String,
    pub breaking: bool,
    pub pr_numbers: BTreeSet<u64>,
}

/// Classify commits using the default breaking-change indicators
pub fn classify(commits: &[Commit]) -> Vec<ClassifiedCommit> {
    classify_with(commits, DEFAULT_BREAKING_INDICATORS)
}

/// Classify commits, treating any of `breaking_indicators` in the body as a breaking change
///
/// Subjects that are not conventional commits are kept as [`CommitCategory::Other`].
pub fn classify_with<S: AsRef<str>>(
    commits: &[Commit],
    breaking_indicators: &[S],
) -> Vec<ClassifiedCommit> {
    commits
        .iter()
        .map(|commit| classify_one(commit, breaking_indicators))
        .collect()
}

fn classify_one<S: AsRef<str>>(commit: &Commit, breaking_indicators: &[S]) -> ClassifiedCommit {
    let footer_breaking = breaking_indicators
        .iter()
        .any(|indicator| commit.body.contains(indicator.as_ref()));

    let pr_numbers = extract_pr_numbers(&commit.subject)
        .into_iter()
        .chain(extract_pr_numbers(&commit.body))
        .collect();

    match conventional_regex().captures(&commit.subject) {
        Some(captures) => ClassifiedCommit {
            commit: commit.clone(),
            category: CommitCategory::from_type(&captures[1]),
            scope: captures.get(3).map(|m| m.as_str().to_string()),
            description: captures[5].trim().to_string(),
            breaking: captures.get(4).is_some() || footer_breaking,
            pr_numbers,
        },
        None => ClassifiedCommit {
            commit: commit.clone(),
            category: CommitCategory::Other,
            scope: None,
            description: commit.subject.clone(),
            breaking: footer_breaking,
            pr_numbers,
        },
    }
}

/// Best-effort `#123` references
pub(crate) fn extract_pr_numbers(text: &str) -> BTreeSet<u64> {
    pr_number_regex()
        .captures_iter(text)
        .filter_map(|c| c[1].parse::<u64>().ok())
        .collect()
}
