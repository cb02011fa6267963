use crate::error::{ReleaseError, Result};
use regex::Regex;
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use std::sync::OnceLock;

fn version_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^(\d+)\.(\d+)\.(\d+)(?:-([0-9A-Za-z.-]+))?$").expect("static regex")
    })
}

/// Semantic version representation
///
/// Textual form is `MAJOR.MINOR.PATCH[-prerelease]`. A leading `v` is accepted
/// on input but never printed.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct SemanticVersion {
    pub major: u64,
    pub minor: u64,
    pub patch: u64,
    pub prerelease: Option<String>,
}

impl SemanticVersion {
    /// Create a release version (no prerelease)
    pub fn new(major: u64, minor: u64, patch: u64) -> Self {
        SemanticVersion {
            major,
            minor,
            patch,
            prerelease: None,
        }
    }

    /// Parse a version string, stripping one leading `v`
    ///
    /// # Example
    /// ```
    /// # use git_release::domain::SemanticVersion;
    /// let v = SemanticVersion::parse("v1.6.0-rc.1").unwrap();
    /// assert_eq!(v.to_string(), "1.6.0-rc.1");
    /// assert!(SemanticVersion::parse("1.2").is_err());
    /// ```
    pub fn parse(input: &str) -> Result<Self> {
        let clean = input.strip_prefix('v').unwrap_or(input);

        let captures = version_regex()
            .captures(clean)
            .ok_or_else(|| ReleaseError::invalid_version(input))?;

        let component = |idx: usize| -> Result<u64> {
            captures[idx]
                .parse::<u64>()
                .map_err(|_| ReleaseError::invalid_version(input))
        };

        Ok(SemanticVersion {
            major: component(1)?,
            minor: component(2)?,
            patch: component(3)?,
            prerelease: captures.get(4).map(|m| m.as_str().to_string()),
        })
    }

    /// Git tag name for this version (e.g. "v1.2.3")
    pub fn tag(&self) -> String {
        format!("v{}", self)
    }

    pub fn is_prerelease(&self) -> bool {
        self.prerelease.is_some()
    }

    /// The same version with any prerelease suffix dropped
    pub fn release(&self) -> Self {
        SemanticVersion::new(self.major, self.minor, self.patch)
    }

    /// Bump to the next release according to bump type
    ///
    /// Prerelease suffixes are discarded: the result is always a clean release.
    pub fn bump(&self, bump_type: VersionBump) -> Self {
        match bump_type {
            VersionBump::Major => SemanticVersion::new(self.major + 1, 0, 0),
            VersionBump::Minor => SemanticVersion::new(self.major, self.minor + 1, 0),
            VersionBump::Patch => SemanticVersion::new(self.major, self.minor, self.patch + 1),
        }
    }
}

impl FromStr for SemanticVersion {
    type Err = ReleaseError;

    fn from_str(s: &str) -> Result<Self> {
        SemanticVersion::parse(s)
    }
}

impl fmt::Display for SemanticVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)?;
        if let Some(pre) = &self.prerelease {
            write!(f, "-{}", pre)?;
        }
        Ok(())
    }
}

impl Ord for SemanticVersion {
    fn cmp(&self, other: &Self) -> Ordering {
        (self.major, self.minor, self.patch)
            .cmp(&(other.major, other.minor, other.patch))
            .then_with(|| compare_prerelease(self.prerelease.as_deref(), other.prerelease.as_deref()))
    }
}

impl PartialOrd for SemanticVersion {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

/// A release outranks any prerelease of the same version.
fn compare_prerelease(a: Option<&str>, b: Option<&str>) -> Ordering {
    match (a, b) {
        (None, None) => Ordering::Equal,
        (None, Some(_)) => Ordering::Greater,
        (Some(_), None) => Ordering::Less,
        (Some(a), Some(b)) => match (semver::Prerelease::new(a), semver::Prerelease::new(b)) {
            (Ok(pa), Ok(pb)) => pa.cmp(&pb),
            // identifiers semver rejects (leading zeros, empty segments)
            _ => a.cmp(b),
        },
    }
}

/// Version bump type decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VersionBump {
    Major,
    Minor,
    Patch,
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            VersionBump::Major => write!(f, "major"),
            VersionBump::Minor => write!(f, "minor"),
            VersionBump::Patch => write!(f, "patch"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_version_parse() {
        let v = SemanticVersion::parse("v1.2.3").unwrap();
        assert_eq!(v.major, 1);
        assert_eq!(v.minor, 2);
        assert_eq!(v.patch, 3);
        assert_eq!(v.prerelease, None);
    }

    #[test]
    fn test_version_parse_without_v() {
        let v = SemanticVersion::parse("1.2.3").unwrap();
        assert_eq!(v, SemanticVersion::new(1, 2, 3));
    }

    #[test]
    fn test_version_parse_prerelease() {
        let v = SemanticVersion::parse("1.6.0-rc1").unwrap();
        assert_eq!(v.prerelease.as_deref(), Some("rc1"));
        assert!(v.is_prerelease());
    }

    #[test]
    fn test_version_parse_invalid() {
        for input in ["1.2", "v1.x.0", "1.2.3.4", "1.2.3/extra", "", "v", "vv1.2.3", "1.2.3-"] {
            assert!(
                matches!(
                    SemanticVersion::parse(input),
                    Err(ReleaseError::InvalidVersion(_))
                ),
                "{} should be rejected",
                input
            );
        }
    }

    #[test]
    fn test_version_parse_overflow_rejected() {
        assert!(SemanticVersion::parse("99999999999999999999.0.0").is_err());
    }

    #[test]
    fn test_display_normalizes() {
        for (input, expected) in [
            ("v1.2.3", "1.2.3"),
            ("0.0.1", "0.0.1"),
            ("v2.0.0-beta.2", "2.0.0-beta.2"),
        ] {
            assert_eq!(SemanticVersion::parse(input).unwrap().to_string(), expected);
        }
    }

    #[test]
    fn test_tag() {
        assert_eq!(SemanticVersion::new(1, 6, 0).tag(), "v1.6.0");
    }

    #[test]
    fn test_ordering() {
        let parse = |s: &str| SemanticVersion::parse(s).unwrap();
        assert!(parse("2.0.0") > parse("1.9.9"));
        assert!(parse("1.10.0") > parse("1.9.0"));
        assert!(parse("1.0.0") > parse("1.0.0-rc.1"));
        assert!(parse("1.0.0-rc.2") > parse("1.0.0-rc.1"));
        assert!(parse("1.0.0-beta") > parse("1.0.0-alpha"));
    }

    #[test]
    fn test_version_bump_major() {
        let v = SemanticVersion::new(1, 2, 3);
        assert_eq!(v.bump(VersionBump::Major), SemanticVersion::new(2, 0, 0));
    }

    #[test]
    fn test_version_bump_minor() {
        let v = SemanticVersion::new(1, 2, 3);
        assert_eq!(v.bump(VersionBump::Minor), SemanticVersion::new(1, 3, 0));
    }

    #[test]
    fn test_version_bump_patch() {
        let v = SemanticVersion::new(1, 2, 3);
        assert_eq!(v.bump(VersionBump::Patch), SemanticVersion::new(1, 2, 4));
    }

    #[test]
    fn test_bump_drops_prerelease() {
        let v = SemanticVersion::parse("1.6.0-rc1").unwrap();
        assert_eq!(v.bump(VersionBump::Patch), SemanticVersion::new(1, 6, 1));
    }
}
