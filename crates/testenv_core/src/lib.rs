//! # Test Environment Core
//!
//! This crate provisions a disposable local backend test environment: a
//! PostgreSQL container built from an external infrastructure repository,
//! optionally seeded, plus the configuration document the backend test suites
//! read through the `PLANTE_BACKEND_CONFIG_FILE_PATH` environment variable.
//!
//! ## Overview
//!
//! A bootstrap runs these steps in order:
//! 1. Workspace creation (`.testing_env` by default) and per-invocation log file
//! 2. Clone-if-absent and pull of the infrastructure repository
//! 3. Image build, stale container teardown, fresh container start
//! 4. Readiness wait (fixed delay or bounded probe)
//! 5. Optional seeding from an SQL file
//! 6. Configuration document emission
//! 7. Blocking on the container process until it ends
//!
//! ## Examples
//!
//! ```no_run
//! use testenv_core::{
//!     Bootstrap, BootstrapContext, BootstrapSettings, ConsoleReporter, DockerCli,
//!     GitVersionControl, InvocationParameters, ServiceCredentials,
//! };
//!
//! # async fn example() -> Result<(), testenv_core::Error> {
//! let context = BootstrapContext::initialize(BootstrapSettings::default())?;
//! let runtime = DockerCli::new(context.runner());
//! let vcs = GitVersionControl::new(context.log());
//!
//! let params = InvocationParameters::new(
//!     ServiceCredentials::new("osm_user", "osm_password"),
//!     ServiceCredentials::new("off_user", "off_password"),
//! );
//!
//! let exit_code = Bootstrap::new(&context, &runtime, &vcs, &ConsoleReporter)
//!     .run(&params)
//!     .await?;
//! println!("db container exited with {:?}", exit_code);
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! External systems sit behind two traits so the orchestration is testable
//! against fakes:
//! - [`ContainerRuntime`] for image and container operations ([`DockerCli`])
//! - [`VersionControl`] for clone and pull ([`GitVersionControl`])
//!
//! ## Error Handling
//!
//! Every failure is an [`Error`] and aborts the bootstrap; there are no
//! retries. "No stale container" is not an error, see [`ContainerPresence`].

pub mod command;
pub mod config_emitter;
pub mod context;
mod errors;
pub mod git;
pub mod lifecycle;
pub mod orchestrator;
pub mod params;
pub mod readiness;
pub mod reporter;
pub mod runtime;
pub mod seed;
pub mod settings;
pub mod sync;
pub mod workspace;

pub use command::{BackgroundProcess, CommandLine, CommandRunner, LogSink};
pub use config_emitter::{emit_config, TestingConfig, CONFIG_PATH_ENV_VAR};
pub use context::BootstrapContext;
pub use errors::{BootstrapResult, Error};
pub use git::{GitVersionControl, PullOutcome, VersionControl};
pub use lifecycle::{ContainerLifecycle, TeardownOutcome};
pub use orchestrator::{Bootstrap, PreparedEnvironment};
pub use params::{InvocationParameters, ObjectStorageParams, Secret, ServiceCredentials};
pub use readiness::{ReadinessOutcome, ReadinessStrategy};
pub use reporter::{ConsoleReporter, StepReporter};
pub use runtime::{ContainerPresence, ContainerRun, ContainerRuntime, DockerCli, ImageBuild};
pub use seed::{load_seed, SeedFile};
pub use settings::{BootstrapSettings, DatabaseSettings, ReadinessMode, ReadinessSettings};
pub use sync::{synchronize_repository, SyncOutcome};
pub use workspace::Workspace;
