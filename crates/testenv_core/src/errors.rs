use std::path::PathBuf;

use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Fatal setup errors raised while bootstrapping the test environment.
///
/// Every variant aborts the remaining bootstrap sequence. There is no retry
/// policy anywhere in the bootstrap; callers are expected to report the error
/// and exit with a non-zero status.
///
/// "No stale container found" is not an error; see
/// [`crate::ContainerPresence::NotFound`].
#[derive(Error, Debug)]
pub enum Error {
    /// An external command could not be started at all.
    #[error("Failed to spawn command `{command}`: {source}")]
    CommandSpawn {
        /// The literal command line
        command: String,
        /// The underlying OS error
        #[source]
        source: std::io::Error,
    },

    /// An external command ran but finished with a non-zero exit status.
    ///
    /// `code` is `None` when the process was terminated by a signal.
    #[error("Command `{command}` failed with exit code {}", display_code(.code))]
    CommandFailed {
        /// The literal command line
        command: String,
        /// The exit code, if the process exited normally
        code: Option<i32>,
    },

    /// A local path is in a state the bootstrap cannot reconcile, e.g. the
    /// repository directory exists but is a regular file.
    #[error("Inconsistent workspace state at {path:?}: {reason}")]
    InconsistentWorkspace {
        /// The offending path
        path: PathBuf,
        /// What was expected of it
        reason: String,
    },

    /// The seed file given on the command line does not exist.
    #[error("Seed file does not exist: {0:?}")]
    SeedFileMissing(PathBuf),

    /// The seed file given on the command line is a directory.
    #[error("Seed file is a directory: {0:?}")]
    SeedFileIsDirectory(PathBuf),

    /// A version control operation failed.
    #[error("Version control operation '{operation}' failed: {message}")]
    VersionControl {
        /// Short name of the operation (clone, pull, ...)
        operation: String,
        /// Error detail
        message: String,
    },

    /// Loading or parsing the bootstrap settings failed.
    #[error("Settings error: {0}")]
    Settings(String),

    /// The configuration document could not be serialized.
    #[error("Failed to serialize configuration document: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Filesystem I/O failed.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    pub(crate) fn version_control(operation: &str, message: impl Into<String>) -> Self {
        Self::VersionControl {
            operation: operation.to_string(),
            message: message.into(),
        }
    }
}

impl From<git2::Error> for Error {
    fn from(e: git2::Error) -> Self {
        Self::version_control("git", e.message())
    }
}

fn display_code(code: &Option<i32>) -> String {
    match code {
        Some(c) => c.to_string(),
        None => "<terminated by signal>".to_string(),
    }
}

/// Result alias used throughout the bootstrap crate.
pub type BootstrapResult<T> = Result<T, Error>;
