//! Bootstrap settings.
//!
//! Every value the bootstrap treats as a fixed constant (workspace location,
//! infrastructure repository, container identity, database credentials,
//! readiness timing) lives here. The defaults reproduce the canonical local
//! test environment; a TOML file can override any subset of them.
//!
//! # Example TOML
//!
//! ```toml
//! workspace_dir = "/var/tmp/testing_env"
//! container_name = "db_for_my_branch"
//!
//! [readiness]
//! mode = "probe"
//! delay_seconds = 10
//! ```

use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use crate::errors::Error;

/// Default workspace directory, relative to the current directory
pub const DEFAULT_WORKSPACE_DIR: &str = ".testing_env";

/// Default infrastructure repository holding the database image sources
pub const DEFAULT_REPOSITORY_URL: &str = "https://github.com/blazern/plante_docker.git";

/// Default container and image name
pub const DEFAULT_CONTAINER_NAME: &str = "db_container_for_plante_server_tests";

/// Default readiness delay, also the upper bound for the readiness probe
pub const DEFAULT_READINESS_DELAY_SECONDS: u64 = 7;

/// Port the database listens on inside the container
pub const CONTAINER_PORT: u16 = 5432;

#[cfg(test)]
#[path = "settings_tests.rs"]
mod tests;

/// How the bootstrap decides that the freshly started database can be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReadinessMode {
    /// Sleep for the full readiness delay.
    Delay,
    /// Poll the database inside the container, bounded by the readiness delay.
    Probe,
}

impl std::str::FromStr for ReadinessMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "delay" => Ok(Self::Delay),
            "probe" => Ok(Self::Probe),
            other => Err(format!(
                "unknown readiness mode '{}', expected 'delay' or 'probe'",
                other
            )),
        }
    }
}

/// Readiness timing settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ReadinessSettings {
    pub mode: ReadinessMode,
    pub delay_seconds: u64,
    pub probe_initial_backoff_millis: u64,
    pub probe_max_backoff_millis: u64,
}

impl ReadinessSettings {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_seconds)
    }

    pub fn initial_backoff(&self) -> Duration {
        Duration::from_millis(self.probe_initial_backoff_millis)
    }

    pub fn max_backoff(&self) -> Duration {
        Duration::from_millis(self.probe_max_backoff_millis)
    }
}

impl Default for ReadinessSettings {
    fn default() -> Self {
        Self {
            mode: ReadinessMode::Delay,
            delay_seconds: DEFAULT_READINESS_DELAY_SECONDS,
            probe_initial_backoff_millis: 250,
            probe_max_backoff_millis: 2_000,
        }
    }
}

/// Database settings baked into the image and mirrored in the emitted config.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseSettings {
    /// Password passed to the image build as `USER_PASSWORD`
    pub password: String,
    pub user: String,
    pub name: String,
    /// Host side of the port mapping; the server inside the container
    /// always listens on [`CONTAINER_PORT`]
    pub host_port: u16,
}

impl DatabaseSettings {
    /// Connection URL written into the configuration document.
    ///
    /// The port is only spelled out when it differs from the default.
    pub fn url(&self) -> String {
        if self.host_port == CONTAINER_PORT {
            format!("postgresql://localhost/{}", self.name)
        } else {
            format!("postgresql://localhost:{}/{}", self.host_port, self.name)
        }
    }
}

impl Default for DatabaseSettings {
    fn default() -> Self {
        Self {
            password: "123".to_string(),
            user: "main_user".to_string(),
            name: "main".to_string(),
            host_port: CONTAINER_PORT,
        }
    }
}

/// Top-level bootstrap settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct BootstrapSettings {
    pub workspace_dir: PathBuf,
    pub repository_url: String,
    /// Directory inside the repository holding the database Dockerfile
    pub image_subdir: String,
    /// Used both as the image tag and the container name
    pub container_name: String,
    pub database: DatabaseSettings,
    pub readiness: ReadinessSettings,
}

impl Default for BootstrapSettings {
    fn default() -> Self {
        Self {
            workspace_dir: PathBuf::from(DEFAULT_WORKSPACE_DIR),
            repository_url: DEFAULT_REPOSITORY_URL.to_string(),
            image_subdir: "db".to_string(),
            container_name: DEFAULT_CONTAINER_NAME.to_string(),
            database: DatabaseSettings::default(),
            readiness: ReadinessSettings::default(),
        }
    }
}

impl BootstrapSettings {
    /// Loads settings from a TOML file.
    ///
    /// Missing keys fall back to their defaults. A path that does not exist is
    /// an error: the caller named it explicitly.
    ///
    /// # Errors
    ///
    /// Returns `Error::Settings` if the file is missing, unreadable or not
    /// valid TOML for this schema.
    pub fn load(path: &Path) -> Result<Self, Error> {
        debug!("Loading bootstrap settings from {:?}", path);

        if !path.exists() {
            return Err(Error::Settings(format!(
                "Settings file not found: {:?}",
                path
            )));
        }

        let content = fs::read_to_string(path)
            .map_err(|e| Error::Settings(format!("Failed to read settings file: {}", e)))?;

        let settings: BootstrapSettings = toml::from_str(&content)
            .map_err(|e| Error::Settings(format!("Failed to parse settings file: {}", e)))?;

        info!("Loaded bootstrap settings from {:?}", path);
        Ok(settings)
    }

    /// Loads settings from `path` when given, otherwise returns the defaults.
    pub fn load_or_default(path: Option<&Path>) -> Result<Self, Error> {
        match path {
            Some(p) => Self::load(p),
            None => Ok(Self::default()),
        }
    }
}
