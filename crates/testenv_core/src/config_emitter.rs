//! Configuration document emitted for the backend test suites.
//!
//! The document is a pure function of the invocation parameters and the
//! database settings. Production account fields never come from input: they
//! are always filled with sentinel values that cannot authenticate, so a test
//! run can never write to a production system.

use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::{errors::Error, params::InvocationParameters, settings::DatabaseSettings};

/// Environment variable the test suites read the config path from
pub const CONFIG_PATH_ENV_VAR: &str = "PLANTE_BACKEND_CONFIG_FILE_PATH";

/// Sentinel user for the production OpenStreetMap account
pub const OSM_PROD_USER_SENTINEL: &str =
    "intentionally invalid so that tests wouldn't mess prod osm db";

/// Sentinel user for the production Open Food Facts account
pub const OFF_PROD_USER_SENTINEL: &str =
    "intentionally invalid so that tests wouldn't mess prod off db";

/// Sentinel password for every production account
pub const PROD_PASSWORD_SENTINEL: &str = "";

pub const DB_CONNECTION_ATTEMPTS_TIMEOUT_SECONDS: u32 = 10;
pub const JWT_SECRET: &str = "not so secret secret";
pub const ALWAYS_MODERATOR_NAME: &str = "local always moderator";
pub const METRICS_ENDPOINT_PLACEHOLDER: &str = "doesnt_matter_its_not_tested";

#[cfg(test)]
#[path = "config_emitter_tests.rs"]
mod tests;

/// The backend configuration consumed through [`CONFIG_PATH_ENV_VAR`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TestingConfig {
    pub psql_url: String,
    pub psql_user: String,
    pub psql_pass: String,
    pub db_connection_attempts_timeout_seconds: u32,
    pub jwt_secret: String,
    pub ios_backend_private_key_file_path: String,
    pub osm_testing_user: String,
    pub osm_testing_password: String,
    pub off_testing_user: String,
    pub off_testing_password: String,
    pub osm_prod_user: String,
    pub osm_prod_password: String,
    pub off_prod_user: String,
    pub off_prod_password: String,
    pub aws_s3_access_key_id: String,
    pub aws_s3_secret_access_key: String,
    pub aws_s3_region: String,
    pub aws_s3_bucket_name: String,
    pub always_moderator_name: String,
    pub allow_cors: bool,
    pub metrics_endpoint: String,
}

impl TestingConfig {
    /// Renders the document.
    pub fn render(params: &InvocationParameters, database: &DatabaseSettings) -> Self {
        let storage = &params.object_storage;

        Self {
            psql_url: database.url(),
            psql_user: database.user.clone(),
            psql_pass: database.password.clone(),
            db_connection_attempts_timeout_seconds: DB_CONNECTION_ATTEMPTS_TIMEOUT_SECONDS,
            jwt_secret: JWT_SECRET.to_string(),
            ios_backend_private_key_file_path: params.private_key_path_or_default(),
            osm_testing_user: params.osm_testing.user.clone(),
            osm_testing_password: params.osm_testing.password.expose().to_string(),
            off_testing_user: params.off_testing.user.clone(),
            off_testing_password: params.off_testing.password.expose().to_string(),
            osm_prod_user: OSM_PROD_USER_SENTINEL.to_string(),
            osm_prod_password: PROD_PASSWORD_SENTINEL.to_string(),
            off_prod_user: OFF_PROD_USER_SENTINEL.to_string(),
            off_prod_password: PROD_PASSWORD_SENTINEL.to_string(),
            aws_s3_access_key_id: storage.access_key_id.clone().unwrap_or_default(),
            aws_s3_secret_access_key: storage
                .secret_access_key
                .as_ref()
                .map(|s| s.expose().to_string())
                .unwrap_or_default(),
            aws_s3_region: storage.region.clone().unwrap_or_default(),
            aws_s3_bucket_name: storage.bucket_name.clone().unwrap_or_default(),
            always_moderator_name: ALWAYS_MODERATOR_NAME.to_string(),
            allow_cors: true,
            metrics_endpoint: METRICS_ENDPOINT_PLACEHOLDER.to_string(),
        }
    }

    /// Pretty-printed JSON form of the document.
    pub fn to_json(&self) -> Result<String, Error> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Writes the document to `path`, replacing whatever was there.
    #[instrument(skip(self))]
    pub fn write_to(&self, path: &Path) -> Result<(), Error> {
        let content = self.to_json()?;
        debug!("Writing {} bytes of configuration", content.len());
        fs::write(path, content)?;
        info!("Wrote testing configuration to {:?}", path);
        Ok(())
    }
}

/// Renders the document and writes it to `path`.
pub fn emit_config(
    params: &InvocationParameters,
    database: &DatabaseSettings,
    path: &Path,
) -> Result<PathBuf, Error> {
    TestingConfig::render(params, database).write_to(path)?;
    Ok(path.to_path_buf())
}
