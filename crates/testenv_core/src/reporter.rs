//! Operator-facing step announcements.

use tracing::info;

/// Receives the high-level progress messages of a bootstrap.
pub trait StepReporter: Send + Sync {
    fn step(&self, message: &str);
}

/// Prints each step to stdout as `#### <message>`.
#[derive(Debug, Clone, Copy, Default)]
pub struct ConsoleReporter;

impl StepReporter for ConsoleReporter {
    fn step(&self, message: &str) {
        info!(step = message);
        println!("#### {}", message);
    }
}
