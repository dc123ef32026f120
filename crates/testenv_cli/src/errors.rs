use thiserror::Error;

#[cfg(test)]
#[path = "errors_tests.rs"]
mod tests;

/// Errors that can occur in the test environment CLI.
///
/// Every variant is fatal: `main` logs it and exits with a non-zero status.
#[derive(Error, Debug)]
pub enum Error {
    /// A bootstrap step failed.
    ///
    /// Covers everything from a failing `docker build` to a missing seed file.
    #[error("Bootstrap failed: {0}")]
    Bootstrap(#[from] testenv_core::Error),
}
