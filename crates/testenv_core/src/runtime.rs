//! Container runtime interface.
//!
//! The bootstrap needs a handful of container operations and nothing more.
//! They are expressed as typed methods on [`ContainerRuntime`] so the
//! orchestration can run against an in-memory fake in tests; [`DockerCli`]
//! is the production implementation driving the `docker` binary.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, instrument, warn};

use crate::{
    command::{BackgroundProcess, CommandLine, CommandRunner},
    errors::Error,
    settings::{DatabaseSettings, CONTAINER_PORT},
};

#[cfg(test)]
#[path = "runtime_tests.rs"]
mod tests;

/// Whether a container with a given name exists, running or stopped.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ContainerPresence {
    Found,
    /// Expected on a clean host; not an error.
    NotFound,
    /// The listing itself failed, so nothing is known.
    QueryFailed(String),
}

/// Parameters of an image build.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageBuild {
    pub tag: String,
    pub context_dir: PathBuf,
    pub build_args: Vec<(String, String)>,
}

/// Parameters of a container start.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContainerRun {
    pub name: String,
    pub image: String,
    /// `(host, container)` port pairs
    pub port_mappings: Vec<(u16, u16)>,
}

/// The container operations the bootstrap depends on.
#[async_trait]
pub trait ContainerRuntime: Send + Sync {
    /// Builds (or rebuilds) an image.
    async fn build_image(&self, build: &ImageBuild) -> Result<(), Error>;

    /// Looks for a container, running or stopped, with exactly this name.
    async fn find_by_name(&self, name: &str) -> ContainerPresence;

    /// Stops and then removes the named container.
    async fn stop_and_remove(&self, name: &str) -> Result<(), Error>;

    /// Best-effort forced removal; failures are swallowed.
    async fn force_remove(&self, name: &str);

    /// Starts a container and returns the handle of the process attached to it.
    ///
    /// The handle completes when the container stops.
    async fn run_in_background(
        &self,
        run: &ContainerRun,
    ) -> Result<Box<dyn BackgroundProcess>, Error>;

    /// Copies a local file into the container's filesystem.
    async fn copy_into(&self, name: &str, source: &Path, destination: &str) -> Result<(), Error>;

    /// Executes a command inside the container.
    async fn exec_in(&self, name: &str, command: &[String]) -> Result<(), Error>;

    /// Asks the database inside the container whether it accepts connections.
    async fn is_accepting_connections(&self, name: &str, database: &DatabaseSettings) -> bool;
}

/// [`ContainerRuntime`] driving the `docker` command line client.
#[derive(Debug, Clone)]
pub struct DockerCli {
    runner: CommandRunner,
    binary: String,
}

impl DockerCli {
    pub fn new(runner: CommandRunner) -> Self {
        Self::with_binary(runner, "docker")
    }

    /// Uses a different client binary, e.g. `podman`.
    pub fn with_binary(runner: CommandRunner, binary: impl Into<String>) -> Self {
        Self {
            runner,
            binary: binary.into(),
        }
    }

    fn docker(&self) -> CommandLine {
        CommandLine::new(&self.binary)
    }

    pub(crate) fn build_command(&self, build: &ImageBuild) -> CommandLine {
        let mut command = self
            .docker()
            .arg("build")
            .arg("-t")
            .arg(&build.tag)
            .arg(build.context_dir.display().to_string());
        for (key, value) in &build.build_args {
            command = command.arg("--build-arg").arg(format!("{}={}", key, value));
        }
        command
    }

    pub(crate) fn list_names_command(&self, name: &str) -> CommandLine {
        self.docker()
            .args(["ps", "-a", "--filter"])
            .arg(format!("name={}", name))
            .args(["--format", "{{.Names}}"])
    }

    pub(crate) fn run_command(&self, run: &ContainerRun) -> CommandLine {
        let mut command = self.docker().arg("run").arg(format!("--name={}", run.name));
        for (host, container) in &run.port_mappings {
            command = command.arg("-p").arg(format!("{}:{}", host, container));
        }
        command.arg(&run.image)
    }
}

/// Interprets the output of a name listing.
///
/// The runtime's name filter matches substrings, so only an exact line match
/// counts as found.
pub(crate) fn presence_from_listing(
    name: &str,
    code: Option<i32>,
    stdout: &str,
) -> ContainerPresence {
    if code != Some(0) {
        return ContainerPresence::QueryFailed(format!(
            "container listing exited with {:?}",
            code
        ));
    }

    if stdout.lines().any(|line| line.trim() == name) {
        ContainerPresence::Found
    } else {
        ContainerPresence::NotFound
    }
}

#[async_trait]
impl ContainerRuntime for DockerCli {
    #[instrument(skip(self, build), fields(tag = %build.tag))]
    async fn build_image(&self, build: &ImageBuild) -> Result<(), Error> {
        self.runner.run_checked(&self.build_command(build)).await
    }

    #[instrument(skip(self))]
    async fn find_by_name(&self, name: &str) -> ContainerPresence {
        let command = self.list_names_command(name);
        match self.runner.run_captured(&command).await {
            Ok(output) => {
                let presence = presence_from_listing(name, output.code, &output.stdout);
                debug!("Container presence for {}: {:?}", name, presence);
                presence
            }
            Err(e) => {
                warn!("Container listing could not run: {}", e);
                ContainerPresence::QueryFailed(e.to_string())
            }
        }
    }

    #[instrument(skip(self))]
    async fn stop_and_remove(&self, name: &str) -> Result<(), Error> {
        self.runner
            .run_checked(&self.docker().arg("stop").arg(name))
            .await?;
        self.runner
            .run_checked(&self.docker().arg("rm").arg(name))
            .await
    }

    #[instrument(skip(self))]
    async fn force_remove(&self, name: &str) {
        self.runner
            .run_ignored(&self.docker().args(["rm", "-f"]).arg(name))
            .await;
    }

    #[instrument(skip(self, run), fields(name = %run.name))]
    async fn run_in_background(
        &self,
        run: &ContainerRun,
    ) -> Result<Box<dyn BackgroundProcess>, Error> {
        let process = self.runner.spawn_background(&self.run_command(run))?;
        Ok(Box::new(process))
    }

    #[instrument(skip(self))]
    async fn copy_into(&self, name: &str, source: &Path, destination: &str) -> Result<(), Error> {
        let command = self
            .docker()
            .arg("cp")
            .arg(source.display().to_string())
            .arg(format!("{}:{}", name, destination));
        self.runner.run_checked(&command).await
    }

    #[instrument(skip(self))]
    async fn exec_in(&self, name: &str, command: &[String]) -> Result<(), Error> {
        let command = self
            .docker()
            .arg("exec")
            .arg(name)
            .args(command.iter().cloned());
        self.runner.run_checked(&command).await
    }

    #[instrument(skip(self, database))]
    async fn is_accepting_connections(&self, name: &str, database: &DatabaseSettings) -> bool {
        let command = self
            .docker()
            .arg("exec")
            .arg(name)
            .args(["pg_isready", "-h", "localhost", "-p"])
            .arg(CONTAINER_PORT.to_string())
            .arg("-U")
            .arg(&database.user)
            .arg("-d")
            .arg(&database.name);

        match self.runner.run_inspect(&command).await {
            Ok(status) => status.success(),
            Err(e) => {
                debug!("Readiness probe could not run: {}", e);
                false
            }
        }
    }
}
