//! Process-wide bootstrap context.
//!
//! Built once before any side-effecting step and passed by reference to every
//! component. It is never reset.

use std::{path::PathBuf, sync::Arc};

use chrono::{DateTime, Utc};
use tracing::info;

use crate::{
    command::{CommandRunner, LogSink},
    errors::Error,
    settings::BootstrapSettings,
    workspace::Workspace,
};

#[derive(Debug)]
pub struct BootstrapContext {
    settings: BootstrapSettings,
    workspace: Workspace,
    log: Arc<LogSink>,
    started_at: DateTime<Utc>,
}

impl BootstrapContext {
    /// Ensures the workspace exists and opens this invocation's log file.
    pub fn initialize(settings: BootstrapSettings) -> Result<Self, Error> {
        let workspace = Workspace::new(&settings.workspace_dir)?;
        workspace.ensure()?;

        let started_at = Utc::now();
        let log = Arc::new(LogSink::open(workspace.log_file_path(started_at))?);
        info!(
            workspace = ?workspace.root(),
            log = ?log.path(),
            "Bootstrap context initialized"
        );

        Ok(Self {
            settings,
            workspace,
            log,
            started_at,
        })
    }

    pub fn settings(&self) -> &BootstrapSettings {
        &self.settings
    }

    pub fn workspace(&self) -> &Workspace {
        &self.workspace
    }

    pub fn log(&self) -> Arc<LogSink> {
        Arc::clone(&self.log)
    }

    pub fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// A command runner writing to this invocation's log.
    pub fn runner(&self) -> CommandRunner {
        CommandRunner::new(self.log())
    }

    pub fn repository_dir(&self) -> PathBuf {
        self.workspace.repository_dir(&self.settings.repository_url)
    }

    pub fn config_path(&self) -> PathBuf {
        self.workspace.config_path()
    }
}
