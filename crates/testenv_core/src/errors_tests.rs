//! Tests for error types

use super::*;

#[test]
fn test_command_failed_display_with_code() {
    let err = Error::CommandFailed {
        command: "docker build -t db .".to_string(),
        code: Some(1),
    };

    assert_eq!(
        err.to_string(),
        "Command `docker build -t db .` failed with exit code 1"
    );
}

#[test]
fn test_command_failed_display_without_code() {
    let err = Error::CommandFailed {
        command: "docker run db".to_string(),
        code: None,
    };

    assert!(err.to_string().contains("<terminated by signal>"));
}

#[test]
fn test_command_spawn_keeps_source() {
    let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "no such binary");
    let err = Error::CommandSpawn {
        command: "docker ps -a".to_string(),
        source: io_error,
    };

    assert!(err.to_string().contains("docker ps -a"));
    assert!(std::error::Error::source(&err).is_some());
}

#[test]
fn test_inconsistent_workspace_display() {
    let err = Error::InconsistentWorkspace {
        path: PathBuf::from("/tmp/ws/plante_docker"),
        reason: "expected a directory".to_string(),
    };

    let message = err.to_string();
    assert!(message.contains("plante_docker"));
    assert!(message.contains("expected a directory"));
}

#[test]
fn test_seed_errors_name_the_path() {
    let missing = Error::SeedFileMissing(PathBuf::from("/nope/seed.sql"));
    let dir = Error::SeedFileIsDirectory(PathBuf::from("/tmp"));

    assert!(missing.to_string().contains("/nope/seed.sql"));
    assert!(dir.to_string().contains("directory"));
}

#[test]
fn test_git_error_converts_to_version_control() {
    let git_error = git2::Error::from_str("remote not found");
    let err: Error = git_error.into();

    match err {
        Error::VersionControl { operation, message } => {
            assert_eq!(operation, "git");
            assert_eq!(message, "remote not found");
        }
        other => panic!("Expected VersionControl variant, got {other:?}"),
    }
}

#[test]
fn test_error_is_send_sync() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Error>();
}
