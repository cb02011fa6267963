//! Analysis engine for determining version bumps from commits

pub mod version_analyzer;

pub use version_analyzer::{
    determine_bump, latest_version_tag, next_version, Analysis, VersionAnalyzer,
};
