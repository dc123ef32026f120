//! Command line arguments.

use std::path::PathBuf;

use clap::Parser;
use testenv_core::{InvocationParameters, ObjectStorageParams, ReadinessMode, ServiceCredentials};

#[cfg(test)]
#[path = "args_tests.rs"]
mod tests;

/// Prepares a local environment for the backend integration tests: a freshly
/// started database container and the config file the tests read.
#[derive(Parser)]
#[command(name = "init-test-env")]
#[command(about = "Bootstrap the local backend test environment", long_about = None)]
pub struct Cli {
    /// User of the OpenStreetMap testing instance
    #[arg(long)]
    pub osm_testing_user: String,

    /// Password of the OpenStreetMap testing instance
    #[arg(long)]
    pub osm_testing_password: String,

    /// User of the Open Food Facts testing instance
    #[arg(long)]
    pub off_testing_user: String,

    /// Password of the Open Food Facts testing instance
    #[arg(long)]
    pub off_testing_password: String,

    /// Path to the iOS server private key
    #[arg(long)]
    pub ios_server_private_key_path: Option<PathBuf>,

    #[arg(long)]
    pub aws_s3_access_key_id: Option<String>,

    #[arg(long)]
    pub aws_s3_secret_access_key: Option<String>,

    #[arg(long)]
    pub aws_s3_region: Option<String>,

    #[arg(long)]
    pub aws_s3_bucket_name: Option<String>,

    /// SQL file executed against the database once it is up
    #[arg(long)]
    pub seed_file: Option<PathBuf>,

    /// TOML file overriding the built-in bootstrap settings
    #[arg(long)]
    pub settings: Option<PathBuf>,

    /// How to wait for the database: `delay` or `probe`
    #[arg(long, value_parser = parse_readiness_mode)]
    pub readiness: Option<ReadinessMode>,
}

fn parse_readiness_mode(s: &str) -> Result<ReadinessMode, String> {
    s.parse()
}

impl Cli {
    /// The bootstrap's invocation parameters.
    pub fn invocation_parameters(&self) -> InvocationParameters {
        let mut params = InvocationParameters::new(
            ServiceCredentials::new(
                self.osm_testing_user.as_str(),
                self.osm_testing_password.as_str(),
            ),
            ServiceCredentials::new(
                self.off_testing_user.as_str(),
                self.off_testing_password.as_str(),
            ),
        )
        .with_object_storage(ObjectStorageParams {
            access_key_id: self.aws_s3_access_key_id.clone(),
            secret_access_key: self.aws_s3_secret_access_key.as_deref().map(Into::into),
            region: self.aws_s3_region.clone(),
            bucket_name: self.aws_s3_bucket_name.clone(),
        });

        if let Some(path) = &self.ios_server_private_key_path {
            params = params.with_private_key_path(path);
        }
        if let Some(path) = &self.seed_file {
            params = params.with_seed_file(path);
        }
        params
    }
}
