use crate::domain::Commit;
use crate::error::{ReleaseError, Result};
use git2::{Cred, CredentialType, PushOptions, RemoteCallbacks, Repository as Git2Repo, Sort};
use std::path::Path;
use tracing::debug;

/// Wrapper around git2::Repository with our trait interface
pub struct Git2Repository {
    repo: Git2Repo,
}

impl Git2Repository {
    /// Open or discover a git repository
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let repo = Git2Repo::discover(path)?;

        Ok(Git2Repository { repo })
    }

    /// Create from existing git2::Repository
    pub fn from_git2(repo: Git2Repo) -> Self {
        Git2Repository { repo }
    }

    /// Path of `path` relative to the working tree, as the index expects it
    fn workdir_relative(&self, path: &Path) -> Result<std::path::PathBuf> {
        let workdir = self
            .repo
            .workdir()
            .ok_or_else(|| ReleaseError::changelog("Repository has no working tree"))?
            .canonicalize()?;
        let absolute = path.canonicalize()?;

        absolute
            .strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| {
                ReleaseError::changelog(format!(
                    "{} is outside the repository at {}",
                    absolute.display(),
                    workdir.display()
                ))
            })
    }
}

impl super::Repository for Git2Repository {
    fn remote_url(&self, remote: &str) -> Result<String> {
        let remote = self.repo.find_remote(remote)?;
        remote.url().map(str::to_string).ok_or_else(|| {
            ReleaseError::config(format!(
                "Remote '{}' has no URL (or it is not valid UTF-8)",
                remote.name().unwrap_or("?")
            ))
        })
    }

    fn current_branch(&self) -> Result<String> {
        let head = self.repo.head()?;
        if !head.is_branch() {
            return Err(ReleaseError::config(
                "HEAD is detached: check out the release branch first",
            ));
        }
        head.shorthand()
            .map(str::to_string)
            .ok_or_else(|| ReleaseError::config("Current branch name is not valid UTF-8"))
    }

    fn find_tag(&self, tag_name: &str) -> Result<Option<String>> {
        let reference_name = format!("refs/tags/{}", tag_name);

        match self.repo.find_reference(&reference_name) {
            Ok(reference) => {
                let commit = reference.peel_to_commit()?;
                Ok(Some(commit.id().to_string()))
            }
            Err(e) if e.code() == git2::ErrorCode::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn list_tags(&self) -> Result<Vec<String>> {
        let tags = self.repo.tag_names(None)?;

        Ok(tags.iter().flatten().map(|s| s.to_string()).collect())
    }

    fn commits_since(&self, tag: Option<&str>) -> Result<Vec<Commit>> {
        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::REVERSE)?;
        revwalk.push_head()?;

        if let Some(tag) = tag {
            let reference = self.repo.find_reference(&format!("refs/tags/{}", tag))?;
            revwalk.hide(reference.peel_to_commit()?.id())?;
        }

        let mut commits = Vec::new();
        for oid_result in revwalk {
            let oid = oid_result?;
            let commit = self.repo.find_commit(oid)?;

            let message = commit.message().unwrap_or("(empty message)");
            let author = commit.author().name().unwrap_or("unknown").to_string();

            commits.push(Commit::from_message(oid.to_string(), author, message));
        }

        debug!(count = commits.len(), since = ?tag, "collected commits");
        Ok(commits)
    }

    fn commit_file(&self, path: &Path, message: &str) -> Result<String> {
        let relative = self.workdir_relative(path)?;

        let mut index = self.repo.index()?;
        index.add_path(&relative)?;
        index.write()?;

        let tree = self.repo.find_tree(index.write_tree()?)?;
        let signature = self.repo.signature()?;
        let parent = self.repo.head()?.peel_to_commit()?;

        let oid = self.repo.commit(
            Some("HEAD"),
            &signature,
            &signature,
            message,
            &tree,
            &[&parent],
        )?;

        debug!(commit = %oid, file = %relative.display(), "committed changelog");
        Ok(oid.to_string())
    }

    fn push_branch(&self, remote: &str, branch: &str) -> Result<()> {
        let mut remote = self
            .repo
            .find_remote(remote)
            .map_err(|e| ReleaseError::config(format!("Cannot find remote: {}", e)))?;

        let config = self.repo.config()?;
        let mut callbacks = RemoteCallbacks::new();
        callbacks.credentials(move |url, username, allowed| {
            if allowed.contains(CredentialType::SSH_KEY) {
                if let Some(username) = username {
                    return Cred::ssh_key_from_agent(username);
                }
            }
            if allowed.contains(CredentialType::USER_PASS_PLAINTEXT) {
                return Cred::credential_helper(&config, url, username);
            }
            Cred::default()
        });
        callbacks.push_update_reference(|refname, status| match status {
            Some(reason) => Err(git2::Error::from_str(&format!(
                "remote rejected {}: {}",
                refname, reason
            ))),
            None => Ok(()),
        });

        let mut options = PushOptions::new();
        options.remote_callbacks(callbacks);

        let refspec = format!("refs/heads/{0}:refs/heads/{0}", branch);
        remote.push(&[refspec.as_str()], Some(&mut options))?;

        Ok(())
    }
}

// SAFETY: Git2Repository wraps git2::Repository which is Send; the release flow
// is sequential and never shares the repository across threads concurrently.
unsafe impl Sync for Git2Repository {}
