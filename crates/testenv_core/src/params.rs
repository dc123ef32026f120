//! Invocation parameters.
//!
//! The operator supplies these once at startup. They are immutable for the
//! rest of the process. Note that there is no way to pass production
//! credentials in: the configuration document always gets sentinel values for
//! those fields.

use std::path::PathBuf;

/// Private key path used when the operator does not supply one
pub const DEFAULT_PRIVATE_KEY_PATH: &str = "/not/existing/path";

/// A secret string (password, access key) that is never printed.
#[derive(Clone, PartialEq, Eq, Default)]
pub struct Secret(String);

impl Secret {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Get the secret value
    ///
    /// # Security
    /// Only call this when writing the value to its final destination.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl From<String> for Secret {
    fn from(value: String) -> Self {
        Self(value)
    }
}

impl From<&str> for Secret {
    fn from(value: &str) -> Self {
        Self(value.to_string())
    }
}

// Security: Don't log the actual secret value
impl std::fmt::Debug for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Secret([REDACTED])")
    }
}

impl std::fmt::Display for Secret {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[REDACTED]")
    }
}

/// User and password for a third-party service's testing instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceCredentials {
    pub user: String,
    pub password: Secret,
}

impl ServiceCredentials {
    pub fn new(user: impl Into<String>, password: impl Into<Secret>) -> Self {
        Self {
            user: user.into(),
            password: password.into(),
        }
    }
}

/// Object storage access. Every field is optional and empty when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectStorageParams {
    pub access_key_id: Option<String>,
    pub secret_access_key: Option<Secret>,
    pub region: Option<String>,
    pub bucket_name: Option<String>,
}

/// Everything the operator passes on the command line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvocationParameters {
    /// OpenStreetMap testing instance credentials
    pub osm_testing: ServiceCredentials,
    /// Open Food Facts testing instance credentials
    pub off_testing: ServiceCredentials,
    pub private_key_path: Option<PathBuf>,
    pub object_storage: ObjectStorageParams,
    pub seed_file: Option<PathBuf>,
}

impl InvocationParameters {
    /// Parameters with only the two required credential pairs.
    pub fn new(osm_testing: ServiceCredentials, off_testing: ServiceCredentials) -> Self {
        Self {
            osm_testing,
            off_testing,
            private_key_path: None,
            object_storage: ObjectStorageParams::default(),
            seed_file: None,
        }
    }

    pub fn with_private_key_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.private_key_path = Some(path.into());
        self
    }

    pub fn with_object_storage(mut self, object_storage: ObjectStorageParams) -> Self {
        self.object_storage = object_storage;
        self
    }

    pub fn with_seed_file(mut self, path: impl Into<PathBuf>) -> Self {
        self.seed_file = Some(path.into());
        self
    }

    /// The private key path as written to the configuration document.
    pub fn private_key_path_or_default(&self) -> String {
        self.private_key_path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| DEFAULT_PRIVATE_KEY_PATH.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_secret_is_redacted() {
        let secret = Secret::new("hunter2-very-secret");

        let debug_output = format!("{:?}", secret);
        assert!(!debug_output.contains("hunter2"));
        assert!(debug_output.contains("REDACTED"));
        assert_eq!(secret.to_string(), "[REDACTED]");
        assert_eq!(secret.expose(), "hunter2-very-secret");
    }

    #[test]
    fn test_secret_debug_hides_length() {
        let short = format!("{:?}", Secret::new("a"));
        let long = format!("{:?}", Secret::new("a much longer password"));

        assert_eq!(short, "Secret([REDACTED])");
        assert_eq!(short, long);
    }

    #[test]
    fn test_parameters_debug_never_leaks_passwords() {
        let params = InvocationParameters::new(
            ServiceCredentials::new("osm_user", "osm-pass-123"),
            ServiceCredentials::new("off_user", "off-pass-456"),
        )
        .with_object_storage(ObjectStorageParams {
            secret_access_key: Some(Secret::new("aws-secret-789")),
            ..Default::default()
        });

        let dump = format!("{:?}", params);
        assert!(dump.contains("osm_user"));
        assert!(!dump.contains("osm-pass-123"));
        assert!(!dump.contains("off-pass-456"));
        assert!(!dump.contains("aws-secret-789"));
    }

    #[test]
    fn test_private_key_path_default() {
        let params = InvocationParameters::new(
            ServiceCredentials::new("a", "b"),
            ServiceCredentials::new("c", "d"),
        );
        assert_eq!(params.private_key_path_or_default(), "/not/existing/path");

        let params = params.with_private_key_path("/keys/ios.p8");
        assert_eq!(params.private_key_path_or_default(), "/keys/ios.p8");
    }
}
