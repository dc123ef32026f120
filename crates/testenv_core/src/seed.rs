//! Optional database seeding.

use std::path::{Path, PathBuf};

use tracing::{info, instrument};

use crate::{errors::Error, runtime::ContainerRuntime, settings::DatabaseSettings};

/// Where the seed file is copied inside the container
pub const SEED_CONTAINER_PATH: &str = "/tmp/seed.sql";

/// A seed file that existed and was not a directory when validated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeedFile(PathBuf);

impl SeedFile {
    /// # Errors
    ///
    /// `Error::SeedFileMissing` or `Error::SeedFileIsDirectory`.
    pub fn validate(path: &Path) -> Result<Self, Error> {
        if !path.exists() {
            return Err(Error::SeedFileMissing(path.to_path_buf()));
        }
        if path.is_dir() {
            return Err(Error::SeedFileIsDirectory(path.to_path_buf()));
        }
        Ok(Self(path.to_path_buf()))
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

/// The client command executed inside the container.
pub fn psql_command(database: &DatabaseSettings) -> Vec<String> {
    vec![
        "psql".to_string(),
        "-U".to_string(),
        database.user.clone(),
        "-d".to_string(),
        database.name.clone(),
        "-f".to_string(),
        SEED_CONTAINER_PATH.to_string(),
    ]
}

/// Copies the seed into the container and runs it against the database.
#[instrument(skip(runtime, database))]
pub async fn load_seed(
    runtime: &dyn ContainerRuntime,
    container: &str,
    seed: &SeedFile,
    database: &DatabaseSettings,
) -> Result<(), Error> {
    runtime
        .copy_into(container, seed.path(), SEED_CONTAINER_PATH)
        .await?;
    runtime.exec_in(container, &psql_command(database)).await?;
    info!("Seeded database {} from {:?}", database.name, seed.path());
    Ok(())
}
