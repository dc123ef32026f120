//! Command implementations for the test environment CLI.
//!
//! - `bootstrap_cmd`: the single bootstrap run driven by the top level flags

pub mod bootstrap_cmd;
