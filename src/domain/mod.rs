//! Domain logic - pure business rules independent of git and CI operations

pub mod commit;
pub mod version;

pub use commit::{classify, classify_with, ClassifiedCommit, Commit, CommitCategory};
pub use version::{SemanticVersion, VersionBump};
