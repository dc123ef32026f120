//! Test utilities for bootstrap unit and integration tests.
//!
//! This crate provides local git fixtures plus in-memory stand-ins for the
//! container runtime, version control and step reporting, so the full
//! bootstrap sequence can run without docker or network access.

pub mod fakes;
pub mod git;

pub use fakes::{
    FailurePoint, FakeBackgroundProcess, FakeContainerRuntime, FakeVersionControl,
    RecordingReporter, RuntimeCall, VcsCall,
};

#[cfg(test)]
#[path = "lib_tests.rs"]
mod tests;
