//! Git operations abstraction layer
//!
//! The release flow needs only a handful of things from the local repository:
//! the remote URL (to build comparison links), tags (to detect an existing
//! release and find the previous version), history since a tag (to classify
//! commits), and the ability to commit and push the changelog.
//!
//! - [repository::Git2Repository]: a real implementation using the `git2` crate
//! - [mock::MockRepository]: an in-memory implementation for tests
//!
//! Most code should depend on the [Repository] trait rather than concrete
//! implementations.

pub mod mock;
pub mod repository;

pub use mock::MockRepository;
pub use repository::Git2Repository;

use crate::domain::Commit;
use crate::error::Result;
use std::path::Path;

/// Common git operation trait for abstraction
///
/// All implementors must be `Send + Sync`. Implementations map underlying
/// errors (like `git2::Error`) to [crate::error::ReleaseError].
pub trait Repository: Send + Sync {
    /// URL configured for a remote, as written in git config
    fn remote_url(&self, remote: &str) -> Result<String>;

    /// Name of the checked-out branch
    ///
    /// Fails on a detached HEAD: there is nothing sensible to push.
    fn current_branch(&self) -> Result<String>;

    /// Find a tag by name and return the commit it points at
    ///
    /// # Returns
    /// * `Ok(Some(hash))` - Commit hash the tag peels to
    /// * `Ok(None)` - If the tag doesn't exist
    fn find_tag(&self, tag_name: &str) -> Result<Option<String>>;

    /// All tag names in the repository
    fn list_tags(&self) -> Result<Vec<String>>;

    /// Commits reachable from HEAD but not from `tag`, oldest first
    ///
    /// With `tag == None` the whole history of HEAD is returned.
    fn commits_since(&self, tag: Option<&str>) -> Result<Vec<Commit>>;

    /// Stage a single file and commit it on the current branch
    ///
    /// # Returns
    /// Hash of the new commit
    fn commit_file(&self, path: &Path, message: &str) -> Result<String>;

    /// Push a local branch to the same name on `remote`
    fn push_branch(&self, remote: &str, branch: &str) -> Result<()>;
}

/// Turn a git remote URL into the browsable `https://host/owner/repo` base
///
/// Handles scp-style (`git@host:owner/repo.git`), `ssh://` and `http(s)://`
/// remotes, dropping credentials, a trailing `.git` and trailing slashes.
///
/// ```
/// # use git_release::git::compare_url_base;
/// assert_eq!(
///     compare_url_base("git@github.com:acme/widgets.git"),
///     "https://github.com/acme/widgets"
/// );
/// ```
pub fn compare_url_base(remote_url: &str) -> String {
    let url = remote_url.trim();

    let host_and_path = if let Some(rest) = url
        .strip_prefix("https://")
        .or_else(|| url.strip_prefix("http://"))
        .or_else(|| url.strip_prefix("ssh://"))
        .or_else(|| url.strip_prefix("git://"))
    {
        let rest = rest.split_once('@').map_or(rest, |(_, host)| host);
        // ssh://git@host:22/owner/repo
        match rest.split_once('/') {
            Some((host, path)) => {
                let host = host.split_once(':').map_or(host, |(h, _)| h);
                format!("{}/{}", host, path)
            }
            None => rest.to_string(),
        }
    } else if let Some((user_host, path)) = url.split_once(':') {
        let host = user_host.split_once('@').map_or(user_host, |(_, h)| h);
        format!("{}/{}", host, path)
    } else {
        url.to_string()
    };

    let trimmed = host_and_path.trim_end_matches('/');
    let trimmed = trimmed.strip_suffix(".git").unwrap_or(trimmed);
    format!("https://{}", trimmed)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_url_base_variants() {
        let expected = "https://github.com/acme/widgets";
        for remote in [
            "git@github.com:acme/widgets.git",
            "git@github.com:acme/widgets",
            "https://github.com/acme/widgets.git",
            "https://github.com/acme/widgets/",
            "https://token@github.com/acme/widgets.git",
            "ssh://git@github.com/acme/widgets.git",
            "ssh://git@github.com:22/acme/widgets.git",
        ] {
            assert_eq!(compare_url_base(remote), expected, "remote: {}", remote);
        }
    }
}
