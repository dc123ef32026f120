use super::*;
use crate::command::LogSink;
use std::{fs, sync::Arc};
use tempfile::TempDir;

fn docker_in(temp_dir: &TempDir) -> DockerCli {
    let sink = LogSink::open(temp_dir.path().join("log")).expect("Failed to open log");
    DockerCli::new(CommandRunner::new(Arc::new(sink)))
}

/// Installs an executable script standing in for the docker client.
#[cfg(unix)]
fn scripted_docker(temp_dir: &TempDir, script: &str) -> DockerCli {
    use std::os::unix::fs::PermissionsExt;

    let path = temp_dir.path().join("fake-docker");
    fs::write(&path, format!("#!/bin/sh\n{}\n", script)).unwrap();
    fs::set_permissions(&path, fs::Permissions::from_mode(0o755)).unwrap();

    let sink = LogSink::open(temp_dir.path().join("log")).expect("Failed to open log");
    DockerCli::with_binary(
        CommandRunner::new(Arc::new(sink)),
        path.display().to_string(),
    )
}

#[test]
fn test_build_command_passes_build_args() {
    let temp_dir = TempDir::new().unwrap();
    let docker = docker_in(&temp_dir);

    let command = docker.build_command(&ImageBuild {
        tag: "db_image".to_string(),
        context_dir: PathBuf::from("/ws/plante_docker/db"),
        build_args: vec![("USER_PASSWORD".to_string(), "123".to_string())],
    });

    assert_eq!(
        command.to_string(),
        "docker build -t db_image /ws/plante_docker/db --build-arg USER_PASSWORD=123"
    );
}

#[test]
fn test_run_command_maps_ports() {
    let temp_dir = TempDir::new().unwrap();
    let docker = docker_in(&temp_dir);

    let command = docker.run_command(&ContainerRun {
        name: "db".to_string(),
        image: "db_image".to_string(),
        port_mappings: vec![(5432, 5432)],
    });

    assert_eq!(command.to_string(), "docker run --name=db -p 5432:5432 db_image");
}

#[test]
fn test_list_names_command() {
    let temp_dir = TempDir::new().unwrap();
    let docker = docker_in(&temp_dir);

    assert_eq!(
        docker.list_names_command("db").to_string(),
        "docker ps -a --filter name=db --format {{.Names}}"
    );
}

#[test]
fn test_presence_requires_exact_name() {
    assert_eq!(
        presence_from_listing("db", Some(0), "db_old\nother\n"),
        ContainerPresence::NotFound
    );
    assert_eq!(
        presence_from_listing("db", Some(0), "db_old\ndb\n"),
        ContainerPresence::Found
    );
    assert_eq!(
        presence_from_listing("db", Some(0), ""),
        ContainerPresence::NotFound
    );
}

#[test]
fn test_presence_listing_failure_is_not_not_found() {
    let presence = presence_from_listing("db", Some(1), "");
    assert!(matches!(presence, ContainerPresence::QueryFailed(_)));

    let presence = presence_from_listing("db", None, "db\n");
    assert!(matches!(presence, ContainerPresence::QueryFailed(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_find_by_name_with_scripted_client() {
    let temp_dir = TempDir::new().unwrap();
    let docker = scripted_docker(&temp_dir, "echo some_other\necho db_container");

    assert_eq!(docker.find_by_name("db_container").await, ContainerPresence::Found);
    assert_eq!(docker.find_by_name("missing").await, ContainerPresence::NotFound);
}

#[cfg(unix)]
#[tokio::test]
async fn test_find_by_name_reports_failing_client() {
    let temp_dir = TempDir::new().unwrap();
    let docker = scripted_docker(&temp_dir, "echo 'daemon not running' >&2\nexit 1");

    let presence = docker.find_by_name("db_container").await;

    assert!(matches!(presence, ContainerPresence::QueryFailed(_)));
    let log = fs::read_to_string(temp_dir.path().join("log")).unwrap();
    assert!(log.contains("daemon not running"));
}

#[tokio::test]
async fn test_find_by_name_reports_missing_client() {
    let temp_dir = TempDir::new().unwrap();
    let sink = LogSink::open(temp_dir.path().join("log")).unwrap();
    let docker = DockerCli::with_binary(
        CommandRunner::new(Arc::new(sink)),
        "definitely-not-docker-4242",
    );

    let presence = docker.find_by_name("db_container").await;

    assert!(matches!(presence, ContainerPresence::QueryFailed(_)));
}

#[cfg(unix)]
#[tokio::test]
async fn test_stop_and_remove_fails_when_stop_fails() {
    let temp_dir = TempDir::new().unwrap();
    let docker = scripted_docker(&temp_dir, "if [ \"$1\" = stop ]; then exit 1; fi");

    let result = docker.stop_and_remove("db_container").await;

    assert!(matches!(result, Err(Error::CommandFailed { .. })));
    let log = fs::read_to_string(temp_dir.path().join("log")).unwrap();
    assert!(!log.contains(" rm db_container"));
}

#[cfg(unix)]
#[tokio::test]
async fn test_readiness_probe_uses_exit_status() {
    let temp_dir = TempDir::new().unwrap();
    let ready = scripted_docker(&temp_dir, "exit 0");
    assert!(
        ready
            .is_accepting_connections("db", &DatabaseSettings::default())
            .await
    );

    let temp_dir = TempDir::new().unwrap();
    let not_ready = scripted_docker(&temp_dir, "exit 2");
    assert!(
        !not_ready
            .is_accepting_connections("db", &DatabaseSettings::default())
            .await
    );
}
