use super::*;
use std::fs;
use tempfile::TempDir;

#[test]
fn test_defaults_match_canonical_environment() {
    let settings = BootstrapSettings::default();

    assert_eq!(settings.workspace_dir, PathBuf::from(".testing_env"));
    assert_eq!(settings.container_name, "db_container_for_plante_server_tests");
    assert_eq!(settings.image_subdir, "db");
    assert_eq!(settings.database.user, "main_user");
    assert_eq!(settings.database.password, "123");
    assert_eq!(settings.database.host_port, 5432);
    assert_eq!(settings.database.url(), "postgresql://localhost/main");
    assert_eq!(settings.readiness.mode, ReadinessMode::Delay);
    assert_eq!(settings.readiness.delay(), Duration::from_secs(7));
}

#[test]
fn test_load_partial_file_keeps_defaults() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("settings.toml");
    fs::write(
        &path,
        r#"
container_name = "db_for_branch"

[readiness]
mode = "probe"
"#,
    )
    .expect("Failed to write settings");

    let settings = BootstrapSettings::load(&path).expect("Failed to load settings");

    assert_eq!(settings.container_name, "db_for_branch");
    assert_eq!(settings.readiness.mode, ReadinessMode::Probe);
    assert_eq!(settings.readiness.delay_seconds, 7);
    assert_eq!(settings.repository_url, DEFAULT_REPOSITORY_URL);
}

#[test]
fn test_load_nonexistent_file() {
    let result = BootstrapSettings::load(Path::new("nonexistent_settings.toml"));

    match result {
        Err(Error::Settings(msg)) => assert!(msg.contains("Settings file not found")),
        other => panic!("Expected Settings error, got {other:?}"),
    }
}

#[test]
fn test_load_invalid_toml() {
    let temp_dir = TempDir::new().expect("Failed to create temp directory");
    let path = temp_dir.path().join("invalid.toml");
    fs::write(&path, "invalid = toml = syntax").expect("Failed to write invalid TOML");

    match BootstrapSettings::load(&path) {
        Err(Error::Settings(msg)) => assert!(msg.contains("Failed to parse settings file")),
        other => panic!("Expected Settings error, got {other:?}"),
    }
}

#[test]
fn test_load_or_default_without_path() {
    let settings = BootstrapSettings::load_or_default(None).expect("defaults never fail");
    assert_eq!(settings, BootstrapSettings::default());
}

#[test]
fn test_readiness_mode_from_str() {
    assert_eq!("delay".parse::<ReadinessMode>(), Ok(ReadinessMode::Delay));
    assert_eq!("PROBE".parse::<ReadinessMode>(), Ok(ReadinessMode::Probe));
    assert!("poll".parse::<ReadinessMode>().is_err());
}

#[test]
fn test_custom_host_port_appears_in_url() {
    let database = DatabaseSettings {
        host_port: 15432,
        ..Default::default()
    };

    assert_eq!(database.url(), "postgresql://localhost:15432/main");
}
