//! Readiness gating after the database container starts.
//!
//! [`ReadinessStrategy::FixedDelay`] sleeps unconditionally; it does not prove
//! the database accepts connections, so a slow start surfaces later as a
//! connection error in seeding or in the test suites.
//! [`ReadinessStrategy::Probe`] asks the database directly with exponential
//! backoff and gives up at the same upper bound. Giving up is not an error:
//! the bootstrap proceeds exactly as it would after the blind sleep.

use std::time::Duration;

use tokio::time::{sleep, Instant};
use tracing::{debug, info, warn};

use crate::{
    runtime::ContainerRuntime,
    settings::{DatabaseSettings, ReadinessMode, ReadinessSettings},
};

const MIN_BACKOFF: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessStrategy {
    FixedDelay(Duration),
    Probe {
        upper_bound: Duration,
        initial_backoff: Duration,
        max_backoff: Duration,
    },
}

impl From<&ReadinessSettings> for ReadinessStrategy {
    fn from(settings: &ReadinessSettings) -> Self {
        match settings.mode {
            ReadinessMode::Delay => ReadinessStrategy::FixedDelay(settings.delay()),
            ReadinessMode::Probe => ReadinessStrategy::Probe {
                upper_bound: settings.delay(),
                initial_backoff: settings.initial_backoff(),
                max_backoff: settings.max_backoff(),
            },
        }
    }
}

/// How the readiness wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadinessOutcome {
    /// The fixed delay elapsed.
    Delayed,
    /// The probe succeeded.
    Ready { attempts: u32 },
    /// The probe never succeeded within the upper bound.
    TimedOut { attempts: u32 },
}

impl ReadinessStrategy {
    /// One-line description for progress messages.
    pub fn describe(&self) -> String {
        match self {
            ReadinessStrategy::FixedDelay(delay) => format!(
                "Sleeping for {} seconds to wait for db container start",
                delay.as_secs()
            ),
            ReadinessStrategy::Probe { upper_bound, .. } => format!(
                "Probing db container for up to {} seconds",
                upper_bound.as_secs()
            ),
        }
    }

    /// Waits until the container is considered ready.
    pub async fn wait(
        &self,
        runtime: &dyn ContainerRuntime,
        container: &str,
        database: &DatabaseSettings,
    ) -> ReadinessOutcome {
        match *self {
            ReadinessStrategy::FixedDelay(delay) => {
                debug!("Sleeping {:?} for readiness", delay);
                sleep(delay).await;
                ReadinessOutcome::Delayed
            }
            ReadinessStrategy::Probe {
                upper_bound,
                initial_backoff,
                max_backoff,
            } => {
                probe(
                    runtime,
                    container,
                    database,
                    upper_bound,
                    initial_backoff,
                    max_backoff,
                )
                .await
            }
        }
    }
}

async fn probe(
    runtime: &dyn ContainerRuntime,
    container: &str,
    database: &DatabaseSettings,
    upper_bound: Duration,
    initial_backoff: Duration,
    max_backoff: Duration,
) -> ReadinessOutcome {
    let deadline = Instant::now() + upper_bound;
    let mut backoff = initial_backoff;
    let mut attempts = 0;

    loop {
        attempts += 1;
        if runtime.is_accepting_connections(container, database).await {
            info!("Database ready after {} attempt(s)", attempts);
            return ReadinessOutcome::Ready { attempts };
        }

        let now = Instant::now();
        if now >= deadline {
            warn!(
                "Database not ready after {} attempt(s) within {:?}, continuing anyway",
                attempts, upper_bound
            );
            return ReadinessOutcome::TimedOut { attempts };
        }

        let pause = backoff.max(MIN_BACKOFF).min(deadline - now);
        debug!("Database not ready (attempt {}), retrying in {:?}", attempts, pause);
        sleep(pause).await;
        backoff = (backoff * 2).min(max_backoff);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strategy_from_default_settings_is_fixed_delay() {
        let strategy = ReadinessStrategy::from(&ReadinessSettings::default());

        assert_eq!(strategy, ReadinessStrategy::FixedDelay(Duration::from_secs(7)));
        assert_eq!(
            strategy.describe(),
            "Sleeping for 7 seconds to wait for db container start"
        );
    }

    #[test]
    fn test_probe_strategy_uses_delay_as_upper_bound() {
        let settings = ReadinessSettings {
            mode: ReadinessMode::Probe,
            delay_seconds: 12,
            probe_initial_backoff_millis: 100,
            probe_max_backoff_millis: 800,
        };

        assert_eq!(
            ReadinessStrategy::from(&settings),
            ReadinessStrategy::Probe {
                upper_bound: Duration::from_secs(12),
                initial_backoff: Duration::from_millis(100),
                max_backoff: Duration::from_millis(800),
            }
        );
    }
}
