//! The bootstrap command.

use testenv_core::{
    Bootstrap, BootstrapContext, BootstrapSettings, ConsoleReporter, ContainerRuntime, DockerCli,
    GitVersionControl, StepReporter, VersionControl,
};
use tracing::{debug, info, instrument};

use crate::{args::Cli, errors::Error};

#[cfg(test)]
#[path = "bootstrap_cmd_tests.rs"]
mod tests;

/// Loads the settings file, if any, and applies command line overrides.
pub fn resolve_settings(cli: &Cli) -> Result<BootstrapSettings, Error> {
    let mut settings = BootstrapSettings::load_or_default(cli.settings.as_deref())?;
    if let Some(mode) = cli.readiness {
        debug!("Readiness mode overridden to {:?}", mode);
        settings.readiness.mode = mode;
    }
    Ok(settings)
}

/// Runs the bootstrap against the real docker and git backends.
///
/// Returns the exit code of the database container process.
#[instrument(skip_all)]
pub async fn execute(cli: &Cli) -> Result<Option<i32>, Error> {
    let context = BootstrapContext::initialize(resolve_settings(cli)?)?;
    let runtime = DockerCli::new(context.runner());
    let vcs = GitVersionControl::new(context.log());

    execute_with(cli, &context, &runtime, &vcs, &ConsoleReporter).await
}

/// Runs the bootstrap with the given collaborators.
pub async fn execute_with(
    cli: &Cli,
    context: &BootstrapContext,
    runtime: &dyn ContainerRuntime,
    vcs: &dyn VersionControl,
    reporter: &dyn StepReporter,
) -> Result<Option<i32>, Error> {
    let params = cli.invocation_parameters();
    let code = Bootstrap::new(context, runtime, vcs, reporter)
        .run(&params)
        .await?;
    info!("Bootstrap finished, db container exit code {:?}", code);
    Ok(code)
}
