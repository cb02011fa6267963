pub mod analyzer;
pub mod changelog;
pub mod ci;
pub mod config;
pub mod domain;
pub mod error;
pub mod git;
pub mod release;
pub mod ui;
pub mod warning;

pub use error::{ReleaseError, Result};
