use crate::config::ConventionalCommitsConfig;
use crate::domain::{classify_with, ClassifiedCommit, Commit, CommitCategory};
use crate::domain::{SemanticVersion, VersionBump};
use crate::error::Result;
use crate::git::Repository;

/// Determine the bump implied by a set of classified commits
///
/// Breaking beats features, features beat everything else. Any other
/// combination (fixes, docs, chores, non-conventional commits) is a patch.
pub fn determine_bump(commits: &[ClassifiedCommit]) -> VersionBump {
    if commits.iter().any(|c| c.breaking) {
        VersionBump::Major
    } else if commits.iter().any(|c| c.category == CommitCategory::Feat) {
        VersionBump::Minor
    } else {
        VersionBump::Patch
    }
}

/// Compute the next release version after `previous`
///
/// A prerelease `previous` is bumped as if it were its release version.
pub fn next_version(previous: &SemanticVersion, commits: &[ClassifiedCommit]) -> SemanticVersion {
    previous.release().bump(determine_bump(commits))
}

/// Result of analysing the history since the last release tag
#[derive(Debug, Clone, PartialEq)]
pub struct Analysis {
    /// Latest semver tag found, if any
    pub previous_tag: Option<String>,
    pub previous: Option<SemanticVersion>,
    pub commits: Vec<ClassifiedCommit>,
    pub bump: VersionBump,
    pub next: SemanticVersion,
}

/// Analyzes commits to determine the next release version
pub struct VersionAnalyzer {
    config: ConventionalCommitsConfig,
}

impl VersionAnalyzer {
    /// Create a new version analyzer
    pub fn new(config: ConventionalCommitsConfig) -> Self {
        VersionAnalyzer { config }
    }

    /// Classify raw commits with the configured breaking-change indicators
    pub fn classify(&self, commits: &[Commit]) -> Vec<ClassifiedCommit> {
        classify_with(commits, &self.config.breaking_change_indicators)
    }

    /// Analyze history since the latest `v*` semver tag
    ///
    /// With no prior tag every reachable commit is analysed and the next
    /// version is computed from `0.0.0`.
    pub fn analyze_repository<R: Repository + ?Sized>(&self, repo: &R) -> Result<Analysis> {
        let previous_tag = latest_version_tag(&repo.list_tags()?);
        let previous = previous_tag
            .as_deref()
            .and_then(|tag| SemanticVersion::parse(tag).ok());

        let commits = self.classify(&repo.commits_since(previous_tag.as_deref())?);
        let bump = determine_bump(&commits);
        let next = next_version(
            previous.as_ref().unwrap_or(&SemanticVersion::new(0, 0, 0)),
            &commits,
        );

        Ok(Analysis {
            previous_tag,
            previous,
            commits,
            bump,
            next,
        })
    }
}

/// Highest `v`-prefixed semver tag
pub fn latest_version_tag(tags: &[String]) -> Option<String> {
    tags.iter()
        .filter(|tag| tag.starts_with('v'))
        .filter_map(|tag| SemanticVersion::parse(tag).ok().map(|v| (v, tag)))
        .max_by(|(a, _), (b, _)| a.cmp(b))
        .map(|(_, tag)| tag.clone())
}
