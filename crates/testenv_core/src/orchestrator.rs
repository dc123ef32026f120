//! Bootstrap orchestration.
//!
//! Sequence:
//! 1. ensure workspace
//! 2. synchronize the infrastructure repository
//! 3. build the database image
//! 4. stop and remove a stale container
//! 5. start a fresh container in the background
//! 6. wait for readiness
//! 7. seed the database, when a seed file was given
//! 8. emit the configuration document
//! 9. block on the container process
//!
//! Every step before the final wait aborts the bootstrap on error. Nothing is
//! retried and nothing already done is rolled back; a container that was
//! started stays up.

use std::path::PathBuf;

use tracing::{error, info, instrument, warn};

use crate::{
    command::BackgroundProcess,
    config_emitter::{emit_config, CONFIG_PATH_ENV_VAR},
    context::BootstrapContext,
    errors::Error,
    git::VersionControl,
    lifecycle::{ContainerLifecycle, TeardownOutcome},
    params::InvocationParameters,
    readiness::{ReadinessOutcome, ReadinessStrategy},
    reporter::StepReporter,
    runtime::ContainerRuntime,
    seed::{load_seed, SeedFile},
    sync::{synchronize_repository, SyncOutcome},
};

/// State after every setup step succeeded, before the final wait.
pub struct PreparedEnvironment {
    pub config_path: PathBuf,
    pub sync: SyncOutcome,
    pub teardown: TeardownOutcome,
    pub readiness: ReadinessOutcome,
    pub container: Box<dyn BackgroundProcess>,
}

impl std::fmt::Debug for PreparedEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PreparedEnvironment")
            .field("config_path", &self.config_path)
            .field("sync", &self.sync)
            .field("teardown", &self.teardown)
            .field("readiness", &self.readiness)
            .field("container", &self.container.describe())
            .finish()
    }
}

/// Sequences the bootstrap components.
pub struct Bootstrap<'a> {
    context: &'a BootstrapContext,
    runtime: &'a dyn ContainerRuntime,
    vcs: &'a dyn VersionControl,
    reporter: &'a dyn StepReporter,
    readiness: ReadinessStrategy,
}

impl<'a> Bootstrap<'a> {
    pub fn new(
        context: &'a BootstrapContext,
        runtime: &'a dyn ContainerRuntime,
        vcs: &'a dyn VersionControl,
        reporter: &'a dyn StepReporter,
    ) -> Self {
        Self {
            context,
            runtime,
            vcs,
            reporter,
            readiness: ReadinessStrategy::from(&context.settings().readiness),
        }
    }

    /// Replaces the readiness strategy derived from the settings.
    pub fn with_readiness(mut self, readiness: ReadinessStrategy) -> Self {
        self.readiness = readiness;
        self
    }

    fn step(&self, message: impl AsRef<str>) {
        self.reporter.step(message.as_ref());
    }

    /// Runs every setup step and returns the live environment.
    ///
    /// The seed file is validated before anything touches the repository or
    /// the container runtime.
    #[instrument(skip_all)]
    pub async fn prepare(
        &self,
        params: &InvocationParameters,
    ) -> Result<PreparedEnvironment, Error> {
        let settings = self.context.settings();
        self.step(format!("Args: {:?}", params));
        self.step(format!("std out log file: {}", self.context.log().path().display()));

        let seed = match &params.seed_file {
            Some(path) => {
                self.step(format!("Checking seed file {}", path.display()));
                Some(SeedFile::validate(path)?)
            }
            None => None,
        };

        self.step("Ensuring workspace existence");
        self.context.workspace().ensure()?;

        self.step("Ensuring docker repo existence");
        let repository_dir = self.context.repository_dir();
        let sync = synchronize_repository(self.vcs, &repository_dir, &settings.repository_url)?;
        if sync.cloned() {
            self.step(format!(
                "No docker repo dir found - cloned docker repo into dir: {}",
                repository_dir.display()
            ));
        } else {
            self.step("Docker repo dir found, no need to clone the repo");
        }
        self.step("Pulled last commits from docker repo");

        let lifecycle = ContainerLifecycle::new(self.runtime, settings);

        self.step("Building db container");
        lifecycle.build_image(&repository_dir).await?;

        self.step("Trying to stop already spinning db container");
        let teardown = lifecycle.remove_stale().await?;
        match &teardown {
            TeardownOutcome::Removed => {
                self.step("Spinning db container found, stopped and removed it")
            }
            TeardownOutcome::NothingToRemove => self.step("Spinning db not found"),
            TeardownOutcome::ForcedRemoval { reason } => self.step(format!(
                "Could not list containers ({}), forced removal of db container",
                reason
            )),
        }

        self.step("Starting db container in background");
        let container = lifecycle.start_fresh().await?;

        self.step(self.readiness.describe());
        let readiness = lifecycle.wait_until_ready(&self.readiness).await;
        if let ReadinessOutcome::TimedOut { attempts } = readiness {
            self.step(format!(
                "db container did not report readiness after {} attempts, continuing",
                attempts
            ));
        }

        if let Some(seed) = &seed {
            self.step(format!("Seeding db with {}", seed.path().display()));
            load_seed(
                self.runtime,
                lifecycle.container_name(),
                seed,
                &settings.database,
            )
            .await?;
        }

        self.step("Generating testing config");
        let config_path = emit_config(params, &settings.database, &self.context.config_path())?;
        self.step(format!("Wrote config to file: {}", config_path.display()));

        Ok(PreparedEnvironment {
            config_path,
            sync,
            teardown,
            readiness,
            container,
        })
    }

    /// Prepares the environment, then blocks until the container process ends.
    ///
    /// Returns the container process's exit code. The wait itself cannot fail
    /// the bootstrap: an error while waiting is logged and reported as `None`.
    pub async fn run(&self, params: &InvocationParameters) -> Result<Option<i32>, Error> {
        let mut prepared = self.prepare(params).await?;

        self.step("Blocking until db container finishes");
        self.step(format!(
            "You can start the tests now, don't forget to export env var {} with value: {}",
            CONFIG_PATH_ENV_VAR,
            prepared.config_path.display()
        ));

        let code = match prepared.container.wait().await {
            Ok(code) => {
                info!(
                    "Container process {} ended with {:?}",
                    prepared.container.describe(),
                    code
                );
                code
            }
            Err(e) => {
                error!("Waiting on the container process failed: {}", e);
                None
            }
        };
        if code != Some(0) {
            warn!("db container process exited with {:?}", code);
        }

        self.step("Finishing");
        Ok(code)
    }
}
