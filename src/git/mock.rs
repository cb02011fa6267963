use crate::domain::Commit;
use crate::error::{ReleaseError, Result};
use crate::git::Repository;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Mock repository for testing without actual git operations
///
/// `commits_since` ignores the tag and returns every added commit: tests add
/// only the commits they expect to be "since the last release".
pub struct MockRepository {
    commits: Vec<Commit>,
    tags: HashMap<String, String>,
    remotes: HashMap<String, String>,
    branch: String,
    fail_push: bool,
    committed: Mutex<Vec<(PathBuf, String)>>,
    pushed: Mutex<Vec<(String, String)>>,
}

impl MockRepository {
    /// Create a new empty mock repository on branch `main`
    pub fn new() -> Self {
        MockRepository {
            commits: Vec::new(),
            tags: HashMap::new(),
            remotes: HashMap::new(),
            branch: "main".to_string(),
            fail_push: false,
            committed: Mutex::new(Vec::new()),
            pushed: Mutex::new(Vec::new()),
        }
    }

    /// Add a commit to the mock history (appended as newest)
    pub fn add_commit(&mut self, commit: Commit) {
        self.commits.push(commit);
    }

    /// Add a tag pointing to a commit hash
    pub fn add_tag(&mut self, name: impl Into<String>, hash: impl Into<String>) {
        self.tags.insert(name.into(), hash.into());
    }

    /// Configure a remote URL
    pub fn add_remote(&mut self, name: impl Into<String>, url: impl Into<String>) {
        self.remotes.insert(name.into(), url.into());
    }

    /// Set the checked-out branch
    pub fn set_branch(&mut self, branch: impl Into<String>) {
        self.branch = branch.into();
    }

    /// Make every push fail
    pub fn fail_pushes(&mut self) {
        self.fail_push = true;
    }

    /// Files committed through [Repository::commit_file], with messages
    pub fn committed(&self) -> Vec<(PathBuf, String)> {
        self.committed.lock().map(|c| c.clone()).unwrap_or_default()
    }

    /// `(remote, branch)` pairs pushed through [Repository::push_branch]
    pub fn pushed(&self) -> Vec<(String, String)> {
        self.pushed.lock().map(|p| p.clone()).unwrap_or_default()
    }
}

impl Default for MockRepository {
    fn default() -> Self {
        Self::new()
    }
}

impl Repository for MockRepository {
    fn remote_url(&self, remote: &str) -> Result<String> {
        self.remotes
            .get(remote)
            .cloned()
            .ok_or_else(|| ReleaseError::config(format!("Remote not found: {}", remote)))
    }

    fn current_branch(&self) -> Result<String> {
        Ok(self.branch.clone())
    }

    fn find_tag(&self, tag_name: &str) -> Result<Option<String>> {
        Ok(self.tags.get(tag_name).cloned())
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let mut tags: Vec<String> = self.tags.keys().cloned().collect();
        tags.sort();
        Ok(tags)
    }

    fn commits_since(&self, _tag: Option<&str>) -> Result<Vec<Commit>> {
        Ok(self.commits.clone())
    }

    fn commit_file(&self, path: &Path, message: &str) -> Result<String> {
        let mut committed = self
            .committed
            .lock()
            .map_err(|_| ReleaseError::config("mock repository lock poisoned"))?;
        committed.push((path.to_path_buf(), message.to_string()));
        Ok(format!("{:040x}", committed.len()))
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        if self.fail_push {
            return Err(ReleaseError::command(
                format!("git push {} {}", remote, branch),
                "mock push failure",
            ));
        }
        self.pushed
            .lock()
            .map_err(|_| ReleaseError::config("mock repository lock poisoned"))?
            .push((remote.to_string(), branch.to_string()));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mock_repository_tags() {
        let mut repo = MockRepository::new();
        repo.add_tag("v1.0.0", "abc123");

        assert_eq!(repo.find_tag("v1.0.0").unwrap(), Some("abc123".to_string()));
        assert_eq!(repo.find_tag("v2.0.0").unwrap(), None);
    }

    #[test]
    fn test_mock_repository_list_tags_sorted() {
        let mut repo = MockRepository::new();
        repo.add_tag("v2.0.0", "b");
        repo.add_tag("v1.0.0", "a");

        assert_eq!(
            repo.list_tags().unwrap(),
            vec!["v1.0.0".to_string(), "v2.0.0".to_string()]
        );
    }

    #[test]
    fn test_mock_repository_records_commit_and_push() {
        let repo = MockRepository::new();
        repo.commit_file(Path::new("CHANGELOG.md"), "docs: links").unwrap();
        repo.push_branch("origin", "main").unwrap();

        assert_eq!(
            repo.committed(),
            vec![(PathBuf::from("CHANGELOG.md"), "docs: links".to_string())]
        );
        assert_eq!(
            repo.pushed(),
            vec![("origin".to_string(), "main".to_string())]
        );
    }

    #[test]
    fn test_mock_repository_push_failure() {
        let mut repo = MockRepository::new();
        repo.fail_pushes();
        assert!(repo.push_branch("origin", "main").is_err());
        assert!(repo.pushed().is_empty());
    }

    #[test]
    fn test_mock_repository_default() {
        let repo = MockRepository::default();
        assert!(repo.list_tags().unwrap().is_empty());
        assert_eq!(repo.current_branch().unwrap(), "main");
    }
}
