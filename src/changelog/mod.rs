//! Keep-a-Changelog document model
//!
//! The changelog is parsed into a preamble, `## [label]` sections and a
//! trailing footer of reference-style comparison links. Section bodies are
//! opaque lines: rendering an unmodified document reproduces the input byte
//! for byte, and edits touch only the lines they own.

pub mod draft;
pub mod store;

pub use draft::draft_section;
pub use store::ChangelogStore;

use crate::domain::SemanticVersion;
use crate::error::{ReleaseError, Result};
use crate::warning::ReleaseWarning;
use chrono::NaiveDate;
use regex::Regex;
use std::fmt;
use std::sync::OnceLock;

/// Label of the section collecting not-yet-released changes
pub const UNRELEASED: &str = "Unreleased";

fn header_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^## \[([^\]]+)\](?:\s+-\s+(\S+))?").expect("static regex")
    })
}

fn link_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\[([^\]]+)\]:\s*(\S+)").expect("static regex"))
}

/// Bracketed labels compare with one leading `v` stripped
fn normalize_label(label: &str) -> &str {
    label.strip_prefix('v').unwrap_or(label)
}

fn is_unreleased(label: &str) -> bool {
    label.eq_ignore_ascii_case(UNRELEASED)
}

/// Header line to add for a version that has no section yet
pub fn section_header(version: &SemanticVersion, date: NaiveDate) -> String {
    format!("## [{}] - {}", version, date.format("%Y-%m-%d"))
}

/// One `## [label]` section
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionSection {
    /// Token between the brackets, as written
    pub label: String,
    /// Text after ` - ` in the header, usually `YYYY-MM-DD`
    pub date: Option<String>,
    /// The header line, as written
    pub header: String,
    /// Lines up to the next section header or the link footer
    pub body: Vec<String>,
}

impl VersionSection {
    pub fn is_unreleased(&self) -> bool {
        is_unreleased(&self.label)
    }

    /// Parsed version, or `None` for `Unreleased` and unparseable labels
    pub fn version(&self) -> Option<SemanticVersion> {
        if self.is_unreleased() {
            return None;
        }
        SemanticVersion::parse(&self.label).ok()
    }

    fn matches(&self, version: &str) -> bool {
        normalize_label(&self.label) == version
    }

    /// Body as markdown text, trimmed of surrounding blank lines
    pub fn body_text(&self) -> String {
        self.body.join("\n").trim().to_string()
    }
}

/// A `[label]: url` reference link
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComparisonLink {
    pub label: String,
    pub url: String,
}

impl fmt::Display for ComparisonLink {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}]: {}", self.label, self.url)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum FooterLine {
    /// `original` is the line as written, line ending included
    Link {
        link: ComparisonLink,
        original: Option<String>,
    },
    Blank(String),
}

impl FooterLine {
    fn new_link(link: ComparisonLink, eol: &str) -> Self {
        FooterLine::Link {
            original: Some(format!("{}{}", link, eol)),
            link,
        }
    }

    fn render(&self) -> String {
        match self {
            FooterLine::Link {
                original: Some(line),
                ..
            } => line.clone(),
            FooterLine::Link { link, .. } => link.to_string(),
            FooterLine::Blank(line) => line.clone(),
        }
    }
}

/// Outcome of [ChangelogDocument::ensure_comparison_link]
#[derive(Debug, Clone, PartialEq, Default)]
pub struct LinkUpdate {
    /// Whether the document was modified
    pub changed: bool,
    /// The link that was inserted
    pub inserted: Option<ComparisonLink>,
    /// The rewritten `[Unreleased]` link
    pub unreleased: Option<ComparisonLink>,
    pub warning: Option<ReleaseWarning>,
}

/// Parsed changelog
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChangelogDocument {
    preamble: Vec<String>,
    sections: Vec<VersionSection>,
    footer: Vec<FooterLine>,
    trailing_newline: bool,
    /// `"\r"` for CRLF files; appended to every line this model creates
    eol: &'static str,
}

impl ChangelogDocument {
    pub fn parse(text: &str) -> Self {
        let trailing_newline = text.ends_with('\n');
        let eol = if text.contains("\r\n") { "\r" } else { "" };
        let content = if trailing_newline {
            &text[..text.len() - 1]
        } else {
            text
        };

        let mut preamble = Vec::new();
        let mut sections: Vec<VersionSection> = Vec::new();

        for line in content.split('\n') {
            if let Some(captures) = header_regex().captures(line) {
                sections.push(VersionSection {
                    label: captures[1].trim().to_string(),
                    date: captures.get(2).map(|m| m.as_str().to_string()),
                    header: line.to_string(),
                    body: Vec::new(),
                });
            } else if let Some(section) = sections.last_mut() {
                section.body.push(line.to_string());
            } else {
                preamble.push(line.to_string());
            }
        }

        let footer = match sections.last_mut() {
            Some(section) => split_footer(&mut section.body),
            None => split_footer(&mut preamble),
        };

        ChangelogDocument {
            preamble,
            sections,
            footer,
            trailing_newline,
            eol,
        }
    }

    pub fn render(&self) -> String {
        let mut lines: Vec<String> = self.preamble.clone();
        for section in &self.sections {
            lines.push(section.header.clone());
            lines.extend(section.body.iter().cloned());
        }
        lines.extend(self.footer.iter().map(FooterLine::render));

        let mut text = lines.join("\n");
        if self.trailing_newline {
            text.push('\n');
        }
        text
    }

    pub fn sections(&self) -> &[VersionSection] {
        &self.sections
    }

    /// Footer links in document order
    pub fn links(&self) -> Vec<&ComparisonLink> {
        self.footer
            .iter()
            .filter_map(|line| match line {
                FooterLine::Link { link, .. } => Some(link),
                FooterLine::Blank(_) => None,
            })
            .collect()
    }

    /// First section whose label equals `version` (after `v`-stripping)
    pub fn section(&self, version: &SemanticVersion) -> Option<&VersionSection> {
        let wanted = version.to_string();
        self.sections.iter().find(|s| s.matches(&wanted))
    }

    /// Like [Self::section], failing with the header the operator should add
    ///
    /// The suggested header is dated today in local time.
    pub fn find_section(&self, version: &SemanticVersion) -> Result<&VersionSection> {
        self.section(version)
            .ok_or_else(|| missing_entry(version, chrono::Local::now().date_naive()))
    }

    /// Whether a `[version]:` link line exists anywhere in the document
    pub fn has_comparison_link(&self, version: &SemanticVersion) -> bool {
        let wanted = version.to_string();
        let is_link_for = |line: &str| {
            link_regex()
                .captures(line)
                .is_some_and(|c| normalize_label(&c[1]) == wanted)
        };

        self.links()
            .iter()
            .any(|link| normalize_label(&link.label) == wanted)
            || self.preamble.iter().any(|l| is_link_for(l))
            || self
                .sections
                .iter()
                .flat_map(|s| s.body.iter())
                .any(|l| is_link_for(l))
    }

    /// Version released before `version`
    ///
    /// Headers are assumed to be in descending order: this is the first
    /// parseable version header below the one for `version`. When `version`
    /// has no section, the first header with a lower version is used.
    pub fn previous_version(&self, version: &SemanticVersion) -> Option<SemanticVersion> {
        let wanted = version.to_string();
        match self.sections.iter().position(|s| s.matches(&wanted)) {
            Some(idx) => self.sections[idx + 1..].iter().find_map(|s| s.version()),
            None => self
                .sections
                .iter()
                .filter_map(|s| s.version())
                .find(|v| v < version),
        }
    }

    /// Make sure a comparison link for `version` exists
    ///
    /// Does nothing when the link is already present. Otherwise the link
    /// compares against the previous version (or points at the release tag
    /// for a first release), is inserted right after `[Unreleased]`, and
    /// `[Unreleased]` is retargeted to compare `v<version>...HEAD`. Without an
    /// `[Unreleased]` link the new link is appended and a warning returned.
    pub fn ensure_comparison_link(
        &mut self,
        version: &SemanticVersion,
        repo_url: &str,
    ) -> LinkUpdate {
        if self.has_comparison_link(version) {
            return LinkUpdate::default();
        }

        let repo_url = repo_url.trim_end_matches('/');
        let url = match self.previous_version(version) {
            Some(previous) => format!("{}/compare/{}...{}", repo_url, previous.tag(), version.tag()),
            None => format!("{}/releases/tag/{}", repo_url, version.tag()),
        };
        let link = ComparisonLink {
            label: version.to_string(),
            url,
        };

        let unreleased_idx = self.footer.iter().position(
            |line| matches!(line, FooterLine::Link { link, .. } if is_unreleased(&link.label)),
        );

        match unreleased_idx {
            Some(idx) => {
                let retargeted = ComparisonLink {
                    label: match &self.footer[idx] {
                        FooterLine::Link { link, .. } => link.label.clone(),
                        FooterLine::Blank(_) => UNRELEASED.to_string(),
                    },
                    url: format!("{}/compare/{}...HEAD", repo_url, version.tag()),
                };
                self.footer[idx] = FooterLine::new_link(retargeted.clone(), self.eol);
                self.footer
                    .insert(idx + 1, FooterLine::new_link(link.clone(), self.eol));

                LinkUpdate {
                    changed: true,
                    inserted: Some(link),
                    unreleased: Some(retargeted),
                    warning: None,
                }
            }
            None => {
                if self.footer.is_empty() && !self.last_content_line_is_blank() {
                    self.footer.push(FooterLine::Blank(self.eol.to_string()));
                }
                self.footer.push(FooterLine::new_link(link.clone(), self.eol));
                self.trailing_newline = true;

                LinkUpdate {
                    changed: true,
                    inserted: Some(link),
                    unreleased: None,
                    warning: Some(ReleaseWarning::MissingUnreleasedLink {
                        version: version.to_string(),
                    }),
                }
            }
        }
    }

    /// Insert a freshly drafted section above the newest released version
    ///
    /// The section lands directly below `## [Unreleased]` when that is the
    /// first section, otherwise at the top of the section list.
    pub fn insert_section(&mut self, section: VersionSection) -> Result<()> {
        if let Some(version) = section.version() {
            if self.section(&version).is_some() {
                return Err(ReleaseError::changelog(format!(
                    "A section for {} already exists",
                    version
                )));
            }
        }

        let idx = match self.sections.first() {
            Some(first) if first.is_unreleased() => 1,
            _ => 0,
        };

        let preceding = if idx == 0 {
            &mut self.preamble
        } else {
            &mut self.sections[idx - 1].body
        };
        if preceding.last().is_some_and(|l| !l.trim().is_empty()) {
            preceding.push(self.eol.to_string());
        }

        let mut section = section;
        if !self.eol.is_empty() {
            section.header.push_str(self.eol);
            for line in &mut section.body {
                line.push_str(self.eol);
            }
        }
        self.sections.insert(idx, section);
        Ok(())
    }

    fn last_content_line_is_blank(&self) -> bool {
        let last = match self.sections.last() {
            Some(section) => section.body.last().unwrap_or(&section.header),
            None => match self.preamble.last() {
                Some(line) => line,
                None => return true,
            },
        };
        last.trim().is_empty()
    }
}

/// Error for a version with no changelog section
pub fn missing_entry(version: &SemanticVersion, today: NaiveDate) -> ReleaseError {
    ReleaseError::MissingChangelogEntry {
        version: version.to_string(),
        header: section_header(version, today),
    }
}

/// Detach the trailing run of link and blank lines that starts with a link
fn split_footer(lines: &mut Vec<String>) -> Vec<FooterLine> {
    let mut start = lines.len();
    for (idx, line) in lines.iter().enumerate().rev() {
        if link_regex().is_match(line) {
            start = idx;
        } else if !line.trim().is_empty() {
            break;
        }
    }

    lines
        .split_off(start)
        .into_iter()
        .map(|line| match link_regex().captures(&line) {
            Some(captures) => FooterLine::Link {
                link: ComparisonLink {
                    label: captures[1].to_string(),
                    url: captures[2].to_string(),
                },
                original: Some(line.clone()),
            },
            None => FooterLine::Blank(line),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPO: &str = "https://github.com/acme/widgets";

    fn v(s: &str) -> SemanticVersion {
        SemanticVersion::parse(s).unwrap()
    }

    const TWO_RELEASES: &str = "# Changelog

All notable changes to this project will be documented in this file.

## [Unreleased]

## [2.0.0] - 2025-02-01

### Changed
- Rewrote the widget engine

## [1.5.0] - 2025-01-10

### Added
- Sprockets

[Unreleased]: https://github.com/acme/widgets/compare/v1.5.0...HEAD
[1.5.0]: https://github.com/acme/widgets/compare/v1.4.0...v1.5.0
";

    #[test]
    fn test_round_trip_is_exact() {
        for text in [
            TWO_RELEASES,
            "",
            "\n",
            "no headers at all",
            "# Changelog\r\n\r\n## [1.0.0] - 2025-01-01\r\n- x\r\n",
            "## [1.0.0]\n[1.0.0]:   https://x  \n\n",
        ] {
            assert_eq!(ChangelogDocument::parse(text).render(), text);
        }
    }

    #[test]
    fn test_parse_structure() {
        let doc = ChangelogDocument::parse(TWO_RELEASES);
        let labels: Vec<&str> = doc.sections().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Unreleased", "2.0.0", "1.5.0"]);
        assert_eq!(doc.sections()[1].date.as_deref(), Some("2025-02-01"));
        assert_eq!(doc.links().len(), 2);
        assert_eq!(doc.sections()[2].body_text(), "### Added\n- Sprockets");
    }

    #[test]
    fn test_find_section() {
        let doc = ChangelogDocument::parse(TWO_RELEASES);
        let section = doc.find_section(&v("2.0.0")).unwrap();
        assert_eq!(section.header, "## [2.0.0] - 2025-02-01");
        assert_eq!(
            section.body_text(),
            "### Changed\n- Rewrote the widget engine"
        );
    }

    #[test]
    fn test_find_section_accepts_v_prefixed_headers() {
        let doc = ChangelogDocument::parse("## [v3.1.0] - 2025-03-01\n- x\n");
        assert!(doc.find_section(&v("3.1.0")).is_ok());
    }

    #[test]
    fn test_find_section_missing() {
        let doc = ChangelogDocument::parse(TWO_RELEASES);
        match doc.find_section(&v("9.9.9")) {
            Err(ReleaseError::MissingChangelogEntry { version, header }) => {
                assert_eq!(version, "9.9.9");
                assert!(header.starts_with("## [9.9.9] - "));
            }
            other => panic!("expected MissingChangelogEntry, got {:?}", other),
        }
    }

    #[test]
    fn test_find_section_does_not_prefix_match() {
        let doc = ChangelogDocument::parse("## [1.0.10] - 2025-01-01\n");
        assert!(doc.section(&v("1.0.1")).is_none());
    }

    #[test]
    fn test_has_comparison_link() {
        let doc = ChangelogDocument::parse(TWO_RELEASES);
        assert!(doc.has_comparison_link(&v("1.5.0")));
        assert!(!doc.has_comparison_link(&v("2.0.0")));
    }

    #[test]
    fn test_previous_version() {
        let doc = ChangelogDocument::parse(TWO_RELEASES);
        assert_eq!(doc.previous_version(&v("2.0.0")), Some(v("1.5.0")));
        assert_eq!(doc.previous_version(&v("1.5.0")), None);
        assert_eq!(doc.previous_version(&v("1.7.0")), Some(v("1.5.0")));
    }

    #[test]
    fn test_subsequent_release_link() {
        let mut doc = ChangelogDocument::parse(TWO_RELEASES);
        let update = doc.ensure_comparison_link(&v("2.0.0"), REPO);

        assert!(update.changed);
        assert!(update.warning.is_none());
        let rendered = doc.render();
        assert!(rendered.contains(
            "[Unreleased]: https://github.com/acme/widgets/compare/v2.0.0...HEAD\n\
             [2.0.0]: https://github.com/acme/widgets/compare/v1.5.0...v2.0.0\n\
             [1.5.0]: https://github.com/acme/widgets/compare/v1.4.0...v1.5.0\n"
        ));
        assert!(!rendered.contains("compare/v1.5.0...HEAD"));
    }

    #[test]
    fn test_first_release_link() {
        let text = "# Changelog\n\n## [Unreleased]\n\n## [1.0.0] - 2025-01-01\n\n- Initial\n\n[Unreleased]: https://github.com/acme/widgets/compare/HEAD\n";
        let mut doc = ChangelogDocument::parse(text);
        let update = doc.ensure_comparison_link(&v("1.0.0"), REPO);

        assert_eq!(
            update.inserted.unwrap().to_string(),
            "[1.0.0]: https://github.com/acme/widgets/releases/tag/v1.0.0"
        );
        assert!(doc
            .render()
            .ends_with("[Unreleased]: https://github.com/acme/widgets/compare/v1.0.0...HEAD\n[1.0.0]: https://github.com/acme/widgets/releases/tag/v1.0.0\n"));
    }

    #[test]
    fn test_ensure_link_is_idempotent() {
        let mut doc = ChangelogDocument::parse(TWO_RELEASES);
        doc.ensure_comparison_link(&v("2.0.0"), REPO);
        let once = doc.render();

        let update = doc.ensure_comparison_link(&v("2.0.0"), REPO);
        assert!(!update.changed);
        assert_eq!(doc.render(), once);
        assert_eq!(once.matches("[2.0.0]:").count(), 1);
    }

    #[test]
    fn test_missing_unreleased_link_appends_with_warning() {
        let text = "# Changelog\n\n## [1.1.0] - 2025-02-01\n- b\n\n## [1.0.0] - 2025-01-01\n- a\n";
        let mut doc = ChangelogDocument::parse(text);
        let update = doc.ensure_comparison_link(&v("1.1.0"), REPO);

        assert!(update.changed);
        assert_eq!(
            update.warning,
            Some(ReleaseWarning::MissingUnreleasedLink {
                version: "1.1.0".to_string()
            })
        );
        assert_eq!(
            doc.render(),
            format!(
                "{}\n[1.1.0]: https://github.com/acme/widgets/compare/v1.0.0...v1.1.0\n",
                text
            )
        );
    }

    #[test]
    fn test_crlf_line_endings_kept_for_new_lines() {
        let text = TWO_RELEASES.replace('\n', "\r\n");
        let mut doc = ChangelogDocument::parse(&text);
        doc.ensure_comparison_link(&v("2.0.0"), REPO);

        let rendered = doc.render();
        assert!(rendered.ends_with(
            "[Unreleased]: https://github.com/acme/widgets/compare/v2.0.0...HEAD\r\n\
             [2.0.0]: https://github.com/acme/widgets/compare/v1.5.0...v2.0.0\r\n\
             [1.5.0]: https://github.com/acme/widgets/compare/v1.4.0...v1.5.0\r\n"
        ));
        assert_eq!(rendered.matches('\n').count(), rendered.matches("\r\n").count());
    }

    #[test]
    fn test_crlf_appended_link_and_inserted_section() {
        let text = "# Changelog\r\n\r\n## [1.0.0] - 2025-01-01\r\n- a\r\n";
        let mut doc = ChangelogDocument::parse(text);
        doc.ensure_comparison_link(&v("1.0.0"), REPO);
        doc.insert_section(VersionSection {
            label: "1.1.0".to_string(),
            date: Some("2025-02-01".to_string()),
            header: "## [1.1.0] - 2025-02-01".to_string(),
            body: vec!["- b".to_string(), String::new()],
        })
        .unwrap();

        let rendered = doc.render();
        assert!(rendered.contains("\r\n## [1.1.0] - 2025-02-01\r\n- b\r\n\r\n## [1.0.0]"));
        assert!(rendered.ends_with("- a\r\n\r\n[1.0.0]: https://github.com/acme/widgets/releases/tag/v1.0.0\r\n"));
        assert_eq!(rendered.matches('\n').count(), rendered.matches("\r\n").count());
    }

    #[test]
    fn test_trailing_slash_on_repo_url() {
        let mut doc = ChangelogDocument::parse(TWO_RELEASES);
        let update = doc.ensure_comparison_link(&v("2.0.0"), "https://github.com/acme/widgets/");
        assert_eq!(
            update.inserted.unwrap().url,
            "https://github.com/acme/widgets/compare/v1.5.0...v2.0.0"
        );
    }

    #[test]
    fn test_untouched_sections_preserved() {
        let mut doc = ChangelogDocument::parse(TWO_RELEASES);
        doc.ensure_comparison_link(&v("2.0.0"), REPO);
        let rendered = doc.render();
        let body_end = TWO_RELEASES.find("[Unreleased]:").unwrap();
        assert_eq!(&rendered[..body_end], &TWO_RELEASES[..body_end]);
    }

    #[test]
    fn test_insert_section_below_unreleased() {
        let mut doc = ChangelogDocument::parse(TWO_RELEASES);
        let section = VersionSection {
            label: "2.1.0".to_string(),
            date: Some("2025-03-01".to_string()),
            header: "## [2.1.0] - 2025-03-01".to_string(),
            body: vec![String::new(), "### Added".to_string(), "- Gears".to_string(), String::new()],
        };
        doc.insert_section(section).unwrap();

        let labels: Vec<&str> = doc.sections().iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Unreleased", "2.1.0", "2.0.0", "1.5.0"]);
        assert!(doc
            .render()
            .contains("## [Unreleased]\n\n## [2.1.0] - 2025-03-01\n\n### Added\n- Gears\n\n## [2.0.0]"));
    }

    #[test]
    fn test_insert_duplicate_section_rejected() {
        let mut doc = ChangelogDocument::parse(TWO_RELEASES);
        let section = VersionSection {
            label: "2.0.0".to_string(),
            date: None,
            header: "## [2.0.0]".to_string(),
            body: Vec::new(),
        };
        assert!(doc.insert_section(section).is_err());
    }
}
