//! Test environment CLI library exports for integration testing.
//!
//! This module exposes the argument parser and command implementations so
//! they can be exercised without spawning the binary.

pub mod args;
pub mod commands;
pub mod errors;
