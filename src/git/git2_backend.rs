use git2::{
    Config as GitConfig, Cred, CredentialType, PushOptions, RemoteCallbacks, Repository,
    RepositoryOpenFlags, Signature,
};
use std::cell::RefCell;
use std::path::{Path, PathBuf};

use super::Publisher;
use crate::config::Git;
use crate::error::PublishError;

/// Credential callback attempts before giving up; libgit2 keeps asking otherwise.
const MAX_CRED_ATTEMPTS: usize = 3;

/// Publishes the ledger by committing it in the enclosing repository and
/// pushing to a remote, entirely through `git2`.
#[derive(Debug, Clone)]
pub struct Git2Publisher {
    ledger: PathBuf,
    remote: String,
    branch: Option<String>,
    author_name: String,
    author_email: String,
}

impl Git2Publisher {
    pub fn new(ledger: &Path, git: &Git) -> Self {
        Git2Publisher {
            ledger: ledger.to_path_buf(),
            remote: git.remote.clone(),
            branch: git.branch.clone(),
            author_name: git.author_name.clone(),
            author_email: git.author_email.clone(),
        }
    }

    /// Find the repository enclosing the ledger, searching upwards the way the
    /// git CLI does (`GIT_CEILING_DIRECTORIES` and friends apply).
    fn open(&self) -> Result<Repository, PublishError> {
        let dir = self
            .ledger
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .unwrap_or(Path::new("."));
        Repository::open_ext(dir, RepositoryOpenFlags::FROM_ENV, &[] as &[&std::ffi::OsStr])
            .map_err(|_| PublishError::RepositoryNotFound(dir.to_path_buf()))
    }

    /// Path of the ledger relative to the repository work tree.
    fn relative_ledger(&self, repo: &Repository) -> Result<PathBuf, PublishError> {
        let outside = || PublishError::OutsideWorkTree(self.ledger.clone());
        let workdir = repo.workdir().ok_or_else(outside)?;
        let workdir = workdir.canonicalize().map_err(|_| outside())?;
        let ledger = self.ledger.canonicalize().map_err(|_| outside())?;
        ledger
            .strip_prefix(&workdir)
            .map(Path::to_path_buf)
            .map_err(|_| outside())
    }

    /// Stage the ledger and commit it on HEAD.
    fn commit(&self, repo: &Repository, message: &str) -> Result<git2::Oid, PublishError> {
        let rel = self.relative_ledger(repo)?;
        let mut index = repo.index()?;
        index.add_path(&rel)?;
        index.write()?;
        let tree = repo.find_tree(index.write_tree()?)?;

        let sig = repo
            .signature()
            .or_else(|_| Signature::now(&self.author_name, &self.author_email))?;
        let parent = repo.head().ok().and_then(|h| h.peel_to_commit().ok());
        let parents: Vec<&git2::Commit> = parent.iter().collect();

        let oid = repo.commit(Some("HEAD"), &sig, &sig, message, &tree, &parents)?;
        tracing::info!(sha = %oid, file = %rel.display(), "committed ledger");
        Ok(oid)
    }

    fn branch_to_push(&self, repo: &Repository) -> Result<String, PublishError> {
        if let Some(b) = &self.branch {
            return Ok(b.clone());
        }
        if repo.head_detached()? {
            return Err(PublishError::NoBranch);
        }
        let head = repo.head().map_err(|_| PublishError::NoBranch)?;
        head.shorthand()
            .map(str::to_string)
            .ok_or(PublishError::NoBranch)
    }

    fn push(&self, repo: &Repository, branch: &str) -> Result<(), PublishError> {
        let mut remote = repo.find_remote(&self.remote)?;
        let git_config = repo.config()?;
        let rejected: RefCell<Option<String>> = RefCell::new(None);

        let mut cb = RemoteCallbacks::new();
        cb.credentials(credentials(git_config));
        cb.push_update_reference(|refname, status| {
            if let Some(msg) = status {
                tracing::warn!(refname, msg, "push rejected");
                *rejected.borrow_mut() = Some(msg.to_string());
            }
            Ok(())
        });

        let mut po = PushOptions::new();
        po.remote_callbacks(cb);

        let refspec = format!("refs/heads/{branch}:refs/heads/{branch}");
        tracing::info!(remote = %self.remote, branch, "pushing");
        remote.push(&[refspec.as_str()], Some(&mut po))?;

        if let Some(detail) = rejected.borrow_mut().take() {
            return Err(PublishError::PushRejected {
                branch: branch.to_string(),
                detail,
            });
        }
        Ok(())
    }
}

impl Publisher for Git2Publisher {
    fn publish(&self, message: &str) -> Result<(), PublishError> {
        let repo = self.open()?;
        self.commit(&repo, message)?;
        let branch = self.branch_to_push(&repo)?;
        self.push(&repo, &branch)
    }
}

/// Credential callback: SSH agent for SSH remotes, the configured credential
/// helper for HTTPS, and libgit2 defaults otherwise.
fn credentials(
    git_config: GitConfig,
) -> impl FnMut(&str, Option<&str>, CredentialType) -> Result<Cred, git2::Error> {
    let mut attempts = 0;
    move |url, username_from_url, allowed| {
        attempts += 1;
        if attempts > MAX_CRED_ATTEMPTS {
            return Err(git2::Error::from_str("authentication failed"));
        }
        if allowed.contains(CredentialType::SSH_KEY) {
            return Cred::ssh_key_from_agent(username_from_url.unwrap_or("git"));
        }
        if allowed.contains(CredentialType::USER_PASS_PLAINTEXT)
            && let Ok(c) = Cred::credential_helper(&git_config, url, username_from_url)
        {
            return Ok(c);
        }
        Cred::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::ffi::OsString;
    use std::fs;
    use tempfile::tempdir;

    /// Stops repository discovery at `dir` for the guard's lifetime.
    struct CeilingGuard(Option<OsString>);

    impl CeilingGuard {
        fn at(dir: &Path) -> Self {
            let saved = std::env::var_os("GIT_CEILING_DIRECTORIES");
            let canonical = dir.canonicalize().unwrap();
            let joined = std::env::join_paths([dir.to_path_buf(), canonical]).unwrap();
            // SAFETY: tests touching the environment are #[serial].
            unsafe { std::env::set_var("GIT_CEILING_DIRECTORIES", joined) };
            CeilingGuard(saved)
        }
    }

    impl Drop for CeilingGuard {
        fn drop(&mut self) {
            unsafe {
                match &self.0 {
                    Some(v) => std::env::set_var("GIT_CEILING_DIRECTORIES", v),
                    None => std::env::remove_var("GIT_CEILING_DIRECTORIES"),
                }
            }
        }
    }

    fn work_repo(dir: &Path) -> Repository {
        let repo = Repository::init(dir).unwrap();
        let mut cfg = repo.config().unwrap();
        cfg.set_str("user.name", "Tester").unwrap();
        cfg.set_str("user.email", "tester@example.com").unwrap();
        repo
    }

    fn publisher(ledger: &Path) -> Git2Publisher {
        Git2Publisher::new(ledger, &Git::default())
    }

    #[test]
    fn commit_stages_only_the_ledger() {
        let td = tempdir().unwrap();
        let repo = work_repo(td.path());
        let ledger = td.path().join("_redirects");
        fs::write(&ledger, "/a https://a.com\n").unwrap();
        fs::write(td.path().join("untracked.txt"), "x").unwrap();

        let p = publisher(&ledger);
        let oid = p.commit(&repo, "add /a").unwrap();

        let commit = repo.find_commit(oid).unwrap();
        assert_eq!(commit.message(), Some("add /a"));
        assert_eq!(commit.author().name(), Some("Tester"));
        let tree = commit.tree().unwrap();
        assert!(tree.get_name("_redirects").is_some());
        assert!(tree.get_name("untracked.txt").is_none());
    }

    #[test]
    #[serial]
    fn ledger_in_subdirectory_is_found_from_parent_repo() {
        let td = tempdir().unwrap();
        let repo = work_repo(td.path());
        let site = td.path().join("site");
        fs::create_dir_all(&site).unwrap();
        let ledger = site.join("_redirects");
        fs::write(&ledger, "/a https://a.com\n").unwrap();

        let p = publisher(&ledger);
        let opened = p.open().unwrap();
        assert_eq!(
            p.relative_ledger(&opened).unwrap(),
            PathBuf::from("site/_redirects")
        );
        let oid = p.commit(&repo, "add /a").unwrap();
        let tree = repo.find_commit(oid).unwrap().tree().unwrap();
        assert!(tree.get_path(Path::new("site/_redirects")).is_ok());
    }

    #[test]
    fn configured_branch_overrides_head() {
        let td = tempdir().unwrap();
        let repo = work_repo(td.path());
        let git = Git {
            branch: Some("gh-pages".to_string()),
            ..Git::default()
        };
        let p = Git2Publisher::new(&td.path().join("_redirects"), &git);
        assert_eq!(p.branch_to_push(&repo).unwrap(), "gh-pages");
    }

    #[test]
    #[serial]
    fn missing_remote_is_an_error_after_commit() {
        let td = tempdir().unwrap();
        let repo = work_repo(td.path());
        let ledger = td.path().join("_redirects");
        fs::write(&ledger, "/a https://a.com\n").unwrap();

        let err = publisher(&ledger).publish("add /a").unwrap_err();
        assert!(matches!(err, PublishError::Git(_)));
        assert!(repo.head().unwrap().peel_to_commit().is_ok());
    }

    #[test]
    #[serial]
    fn no_repository_is_reported() {
        let td = tempdir().unwrap();
        let site = td.path().join("site");
        fs::create_dir(&site).unwrap();
        let ledger = site.join("_redirects");
        fs::write(&ledger, "").unwrap();
        let _ceiling = CeilingGuard::at(td.path());

        assert!(matches!(
            publisher(&ledger).publish("add /a"),
            Err(PublishError::RepositoryNotFound(ref dir)) if *dir == site
        ));
    }

    #[test]
    #[serial]
    fn repository_below_ceiling_is_still_found() {
        let td = tempdir().unwrap();
        let site = td.path().join("site");
        work_repo(&site);
        let ledger = site.join("_redirects");
        fs::write(&ledger, "").unwrap();
        let _ceiling = CeilingGuard::at(td.path());

        assert!(publisher(&ledger).open().is_ok());
    }
}
