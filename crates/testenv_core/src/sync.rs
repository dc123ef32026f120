//! Repository synchronization.
//!
//! Ensures the workspace holds an up to date working copy of the
//! infrastructure repository. The first run clones; every later run reuses
//! the existing directory and only pulls.

use std::{fs, path::Path};

use tracing::{debug, info, instrument};

use crate::{
    errors::Error,
    git::{PullOutcome, VersionControl},
};

#[cfg(test)]
#[path = "sync_tests.rs"]
mod tests;

/// What the synchronizer had to do to obtain the working copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncOutcome {
    /// The directory was missing and a fresh clone was made.
    Cloned(PullOutcome),
    /// An existing directory was reused.
    Reused(PullOutcome),
}

impl SyncOutcome {
    pub fn cloned(&self) -> bool {
        matches!(self, SyncOutcome::Cloned(_))
    }
}

/// Clones `remote` into `dir` if needed, then pulls.
///
/// An existing directory is assumed to already contain a working copy.
///
/// # Errors
///
/// - `Error::InconsistentWorkspace` if `dir` exists but is not a directory
/// - any clone or pull failure, unchanged
#[instrument(skip(vcs))]
pub fn synchronize_repository(
    vcs: &dyn VersionControl,
    dir: &Path,
    remote: &str,
) -> Result<SyncOutcome, Error> {
    let cloned = if dir.exists() {
        if !dir.is_dir() {
            return Err(Error::InconsistentWorkspace {
                path: dir.to_path_buf(),
                reason: "repository path exists but is not a directory".to_string(),
            });
        }
        debug!("Repository directory {:?} present, skipping clone", dir);
        false
    } else {
        info!("No repository directory found, cloning {} into {:?}", remote, dir);
        fs::create_dir_all(dir)?;
        vcs.clone_repository(remote, dir)?;
        true
    };

    let pulled = vcs.pull(dir)?;
    debug!("Pull finished: {:?}", pulled);

    Ok(if cloned {
        SyncOutcome::Cloned(pulled)
    } else {
        SyncOutcome::Reused(pulled)
    })
}
