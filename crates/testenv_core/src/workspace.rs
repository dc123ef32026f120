//! Environment workspace layout.
//!
//! The workspace is a directory on local disk that survives across runs. It
//! holds one log file per invocation, the synchronized infrastructure
//! repository and the generated configuration document. Nothing in this crate
//! ever deletes it.

use std::{
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::errors::Error;

/// File name of the generated configuration document
pub const CONFIG_FILE_NAME: &str = "testing_config.json";

/// Prefix of the per-invocation command output log
pub const LOG_FILE_PREFIX: &str = "logs_stdout_";

#[cfg(test)]
#[path = "workspace_tests.rs"]
mod tests;

/// A workspace rooted at an absolute directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    root: PathBuf,
}

impl Workspace {
    /// Creates the workspace handle, resolving `root` against the current
    /// directory when it is relative. No filesystem access happens here.
    pub fn new(root: impl Into<PathBuf>) -> Result<Self, Error> {
        let root = root.into();
        let root = if root.is_absolute() {
            root
        } else {
            std::env::current_dir()?.join(root)
        };
        Ok(Self { root })
    }

    /// Creates the workspace directory if it is missing.
    ///
    /// # Errors
    ///
    /// Returns `Error::InconsistentWorkspace` when the root exists but is not a
    /// directory, or `Error::Io` when creation fails.
    pub fn ensure(&self) -> Result<(), Error> {
        if self.root.exists() {
            if !self.root.is_dir() {
                return Err(Error::InconsistentWorkspace {
                    path: self.root.clone(),
                    reason: "workspace root exists but is not a directory".to_string(),
                });
            }
            debug!("Workspace already present at {:?}", self.root);
            return Ok(());
        }

        fs::create_dir_all(&self.root)?;
        info!("Created workspace at {:?}", self.root);
        Ok(())
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Directory holding the working copy of `repository_url`.
    ///
    /// The directory is named after the last path segment of the URL, without
    /// a trailing `.git`.
    pub fn repository_dir(&self, repository_url: &str) -> PathBuf {
        self.root.join(repository_dir_name(repository_url))
    }

    /// Path of the generated configuration document.
    pub fn config_path(&self) -> PathBuf {
        self.root.join(CONFIG_FILE_NAME)
    }

    /// Path of the command output log for an invocation started at `started_at`.
    pub fn log_file_path(&self, started_at: DateTime<Utc>) -> PathBuf {
        self.root.join(format!(
            "{}{}",
            LOG_FILE_PREFIX,
            started_at.format("%Y%m%d-%H%M%S%.6f")
        ))
    }
}

fn repository_dir_name(repository_url: &str) -> String {
    let last = repository_url
        .trim_end_matches('/')
        .rsplit(&['/', ':'][..])
        .next()
        .unwrap_or(repository_url);
    let name = last.strip_suffix(".git").unwrap_or(last);
    if name.is_empty() {
        "repository".to_string()
    } else {
        name.to_string()
    }
}
