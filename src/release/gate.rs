use crate::changelog::{section_header, ChangelogDocument};
use crate::domain::SemanticVersion;
use crate::error::{ReleaseError, Result};
use chrono::NaiveDate;
use std::fmt;

/// A single pre-flight violation
#[derive(Debug)]
pub enum GateError {
    /// No `## [version]` section; `header` is the line to add
    MissingChangelogEntry { version: String, header: String },
    /// A release or tag named `tag` already exists
    ReleaseAlreadyExists { tag: String },
    /// Could not determine whether the release exists
    Lookup(ReleaseError),
}

impl From<GateError> for ReleaseError {
    fn from(error: GateError) -> Self {
        match error {
            GateError::MissingChangelogEntry { version, header } => {
                ReleaseError::MissingChangelogEntry { version, header }
            }
            GateError::ReleaseAlreadyExists { tag } => ReleaseError::ReleaseAlreadyExists { tag },
            GateError::Lookup(e) => e,
        }
    }
}

/// Every violation found by [ReleaseGate::check], in check order
#[derive(Debug)]
pub struct GateFailure {
    pub violations: Vec<GateError>,
}

impl GateFailure {
    /// The first violation as an error, for callers that fail fast
    pub fn into_error(self) -> ReleaseError {
        match self.violations.into_iter().next() {
            Some(violation) => violation.into(),
            None => ReleaseError::changelog("release gate failed without a reason"),
        }
    }
}

impl fmt::Display for GateFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let messages: Vec<String> = self
            .violations
            .iter()
            .map(|v| match v {
                GateError::MissingChangelogEntry { version, header } => {
                    format!("no changelog entry for {} (add '{}')", version, header)
                }
                GateError::ReleaseAlreadyExists { tag } => {
                    format!("release {} already exists", tag)
                }
                GateError::Lookup(e) => format!("release lookup failed: {}", e),
            })
            .collect();
        write!(f, "{}", messages.join("; "))
    }
}

/// Pre-flight checks that must pass before anything is changed
#[derive(Debug, Clone)]
pub struct ReleaseGate {
    today: NaiveDate,
}

impl ReleaseGate {
    /// `today` dates the header suggested for a missing changelog entry
    pub fn new(today: NaiveDate) -> Self {
        ReleaseGate { today }
    }

    /// Run every check and collect all violations
    ///
    /// `release_exists` is asked about the tag `v<version>`.
    pub fn check<F>(
        &self,
        doc: &ChangelogDocument,
        version: &SemanticVersion,
        mut release_exists: F,
    ) -> std::result::Result<(), GateFailure>
    where
        F: FnMut(&str) -> Result<bool>,
    {
        let mut violations = Vec::new();

        if doc.section(version).is_none() {
            violations.push(GateError::MissingChangelogEntry {
                version: version.to_string(),
                header: section_header(version, self.today),
            });
        }

        let tag = version.tag();
        match release_exists(&tag) {
            Ok(true) => violations.push(GateError::ReleaseAlreadyExists { tag }),
            Ok(false) => {}
            Err(e) => violations.push(GateError::Lookup(e)),
        }

        if violations.is_empty() {
            Ok(())
        } else {
            Err(GateFailure { violations })
        }
    }
}
