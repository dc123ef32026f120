//! Local Git working copy operations.
//!
//! This module provides the version control capability the repository
//! synchronizer needs, implemented with git2:
//! - Full clone of a remote into a directory
//! - Pull of the checked-out branch (fetch followed by a fast-forward)
//!
//! Operations are written to the command log as audit lines in the same
//! format as external commands, so the log reads as one timeline.

use std::{path::Path, sync::Arc};

use git2::{build::CheckoutBuilder, Repository};
use tracing::{debug, error, info};

use crate::{command::LogSink, errors::Error};

#[cfg(test)]
#[path = "git_tests.rs"]
mod tests;

/// Result of a pull.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PullOutcome {
    /// The local branch already matched the remote.
    UpToDate,
    /// The local branch was moved forward to the remote head.
    FastForwarded,
}

/// Clone and pull, the only two version control operations the bootstrap uses.
pub trait VersionControl: Send + Sync {
    /// Clones `remote` into `dir`. `dir` may exist but must be empty.
    fn clone_repository(&self, remote: &str, dir: &Path) -> Result<(), Error>;

    /// Brings the working copy in `dir` up to date with its `origin` remote.
    fn pull(&self, dir: &Path) -> Result<PullOutcome, Error>;
}

/// [`VersionControl`] backed by libgit2.
#[derive(Debug, Clone)]
pub struct GitVersionControl {
    log: Arc<LogSink>,
}

impl GitVersionControl {
    pub fn new(log: Arc<LogSink>) -> Self {
        Self { log }
    }
}

impl VersionControl for GitVersionControl {
    fn clone_repository(&self, remote: &str, dir: &Path) -> Result<(), Error> {
        self.log
            .audit(&format!("git clone {} {}", remote, dir.display()))?;

        Repository::clone(remote, dir).map_err(|e| {
            error!("Failed to clone {}: {}", remote, e);
            Error::version_control("clone", format!("{}: {}", remote, e.message()))
        })?;

        info!("Cloned {} into {:?}", remote, dir);
        Ok(())
    }

    fn pull(&self, dir: &Path) -> Result<PullOutcome, Error> {
        self.log.audit(&format!("git -C {} pull", dir.display()))?;

        let repo = Repository::open(dir).map_err(|e| {
            Error::version_control("pull", format!("not a git repository: {}", e.message()))
        })?;
        let outcome = fast_forward_from_origin(&repo)?;
        self.log.append(&format!("{:?}\n", outcome))?;
        Ok(outcome)
    }
}

/// Fetch the current branch from `origin` and fast-forward onto it.
///
/// Diverged history or a detached HEAD is an error; the working copy is a
/// cache and is never merged into.
fn fast_forward_from_origin(repo: &Repository) -> Result<PullOutcome, Error> {
    let head = repo
        .head()
        .map_err(|e| Error::version_control("pull", format!("no HEAD: {}", e.message())))?;
    if !head.is_branch() {
        return Err(Error::version_control("pull", "HEAD is detached"));
    }
    let branch = head
        .shorthand()
        .ok_or_else(|| Error::version_control("pull", "branch name is not valid UTF-8"))?
        .to_string();
    debug!("Pulling branch {}", branch);

    let mut remote = repo.find_remote("origin")?;
    remote
        .fetch(&[branch.as_str()], None, None)
        .map_err(|e| Error::version_control("fetch", e.message()))?;

    let fetch_head = repo.find_reference("FETCH_HEAD")?;
    let fetch_commit = repo.reference_to_annotated_commit(&fetch_head)?;
    let (analysis, _) = repo.merge_analysis(&[&fetch_commit])?;

    if analysis.is_up_to_date() {
        debug!("Branch {} is up to date", branch);
        return Ok(PullOutcome::UpToDate);
    }

    if !analysis.is_fast_forward() {
        return Err(Error::version_control(
            "pull",
            format!("local branch {} has diverged from origin", branch),
        ));
    }

    let refname = format!("refs/heads/{}", branch);
    let mut reference = repo.find_reference(&refname)?;
    reference.set_target(fetch_commit.id(), "pull: fast-forward")?;
    repo.set_head(&refname)?;
    repo.checkout_head(Some(CheckoutBuilder::default().force()))?;

    info!("Fast-forwarded {} to {}", branch, fetch_commit.id());
    Ok(PullOutcome::FastForwarded)
}
