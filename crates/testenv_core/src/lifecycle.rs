//! Database container lifecycle.
//!
//! The container identity is a single fixed name. Before a new instance starts,
//! any existing container with that name, running or stopped, is torn down so
//! that at most one exists at a time. There is no cross-process locking: two
//! bootstraps racing on the same host can still collide between teardown and
//! start.

use std::path::Path;

use tracing::{info, instrument, warn};

use crate::{
    command::BackgroundProcess,
    errors::Error,
    readiness::{ReadinessOutcome, ReadinessStrategy},
    runtime::{ContainerPresence, ContainerRun, ContainerRuntime, ImageBuild},
    settings::{BootstrapSettings, CONTAINER_PORT},
};

/// Build argument carrying the database user's password into the image
pub const PASSWORD_BUILD_ARG: &str = "USER_PASSWORD";

/// What the stale-container teardown did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TeardownOutcome {
    /// A container with the name existed and was stopped and removed.
    Removed,
    /// No container with the name existed.
    NothingToRemove,
    /// The listing failed; a forced removal was attempted blindly.
    ForcedRemoval { reason: String },
}

/// Drives the build, teardown, start and readiness steps for one container.
pub struct ContainerLifecycle<'a> {
    runtime: &'a dyn ContainerRuntime,
    settings: &'a BootstrapSettings,
}

impl<'a> ContainerLifecycle<'a> {
    pub fn new(runtime: &'a dyn ContainerRuntime, settings: &'a BootstrapSettings) -> Self {
        Self { runtime, settings }
    }

    pub fn container_name(&self) -> &str {
        &self.settings.container_name
    }

    /// Build parameters for the image in `repository_dir`.
    pub fn image_build(&self, repository_dir: &Path) -> ImageBuild {
        ImageBuild {
            tag: self.settings.container_name.clone(),
            context_dir: repository_dir.join(&self.settings.image_subdir),
            build_args: vec![(
                PASSWORD_BUILD_ARG.to_string(),
                self.settings.database.password.clone(),
            )],
        }
    }

    /// Run parameters for a fresh instance.
    pub fn container_run(&self) -> ContainerRun {
        ContainerRun {
            name: self.settings.container_name.clone(),
            image: self.settings.container_name.clone(),
            port_mappings: vec![(self.settings.database.host_port, CONTAINER_PORT)],
        }
    }

    /// Always rebuilds the image.
    #[instrument(skip(self))]
    pub async fn build_image(&self, repository_dir: &Path) -> Result<(), Error> {
        self.runtime
            .build_image(&self.image_build(repository_dir))
            .await
    }

    /// Removes any container holding the name.
    ///
    /// A failed listing never counts as "not found": a forced removal is
    /// attempted and its result ignored, leaving a real conflict to surface
    /// when the new container starts.
    #[instrument(skip(self))]
    pub async fn remove_stale(&self) -> Result<TeardownOutcome, Error> {
        let name = self.container_name();
        match self.runtime.find_by_name(name).await {
            ContainerPresence::Found => {
                info!("Stale container {} found, stopping and removing it", name);
                self.runtime.stop_and_remove(name).await?;
                Ok(TeardownOutcome::Removed)
            }
            ContainerPresence::NotFound => {
                info!("No stale container {} found", name);
                Ok(TeardownOutcome::NothingToRemove)
            }
            ContainerPresence::QueryFailed(reason) => {
                warn!(
                    "Could not determine whether {} exists ({}), forcing removal",
                    name, reason
                );
                self.runtime.force_remove(name).await;
                Ok(TeardownOutcome::ForcedRemoval { reason })
            }
        }
    }

    /// Starts a fresh container from the built image.
    #[instrument(skip(self))]
    pub async fn start_fresh(&self) -> Result<Box<dyn BackgroundProcess>, Error> {
        self.runtime.run_in_background(&self.container_run()).await
    }

    pub async fn wait_until_ready(&self, strategy: &ReadinessStrategy) -> ReadinessOutcome {
        strategy
            .wait(self.runtime, self.container_name(), &self.settings.database)
            .await
    }
}
