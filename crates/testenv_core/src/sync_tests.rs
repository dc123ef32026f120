use super::*;
use crate::{command::LogSink, git::GitVersionControl};
use std::{
    path::PathBuf,
    sync::{Arc, Mutex},
};
use tempfile::TempDir;
use test_utils::git::{commit_file, init_origin};

/// Records calls without touching the filesystem beyond what the
/// synchronizer itself does.
#[derive(Default)]
struct CountingVcs {
    clones: Mutex<Vec<PathBuf>>,
    pulls: Mutex<Vec<PathBuf>>,
    fail_pull: bool,
}

impl VersionControl for CountingVcs {
    fn clone_repository(&self, _remote: &str, dir: &Path) -> Result<(), Error> {
        self.clones.lock().unwrap().push(dir.to_path_buf());
        Ok(())
    }

    fn pull(&self, dir: &Path) -> Result<PullOutcome, Error> {
        self.pulls.lock().unwrap().push(dir.to_path_buf());
        if self.fail_pull {
            return Err(Error::version_control("pull", "network unreachable"));
        }
        Ok(PullOutcome::UpToDate)
    }
}

#[test]
fn test_missing_directory_is_created_and_cloned() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("plante_docker");
    let vcs = CountingVcs::default();

    let outcome = synchronize_repository(&vcs, &dir, "https://example.com/infra.git").unwrap();

    assert_eq!(outcome, SyncOutcome::Cloned(PullOutcome::UpToDate));
    assert!(dir.is_dir());
    assert_eq!(*vcs.clones.lock().unwrap(), vec![dir.clone()]);
    assert_eq!(*vcs.pulls.lock().unwrap(), vec![dir]);
}

#[test]
fn test_second_run_never_reclones() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("plante_docker");
    let vcs = CountingVcs::default();

    let first = synchronize_repository(&vcs, &dir, "https://example.com/infra.git").unwrap();
    let second = synchronize_repository(&vcs, &dir, "https://example.com/infra.git").unwrap();

    assert!(first.cloned());
    assert!(!second.cloned());
    assert_eq!(vcs.clones.lock().unwrap().len(), 1);
    assert_eq!(vcs.pulls.lock().unwrap().len(), 2);
}

#[test]
fn test_regular_file_in_place_of_directory_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("plante_docker");
    fs::write(&dir, "not a repo").unwrap();
    let vcs = CountingVcs::default();

    let result = synchronize_repository(&vcs, &dir, "https://example.com/infra.git");

    assert!(matches!(result, Err(Error::InconsistentWorkspace { .. })));
    assert!(vcs.clones.lock().unwrap().is_empty());
    assert!(vcs.pulls.lock().unwrap().is_empty());
}

#[test]
fn test_pull_failure_is_fatal() {
    let temp_dir = TempDir::new().unwrap();
    let dir = temp_dir.path().join("plante_docker");
    fs::create_dir_all(&dir).unwrap();
    let vcs = CountingVcs {
        fail_pull: true,
        ..Default::default()
    };

    let result = synchronize_repository(&vcs, &dir, "https://example.com/infra.git");

    assert!(matches!(result, Err(Error::VersionControl { .. })));
}

#[test]
fn test_real_repository_clone_then_pull() {
    let temp_dir = TempDir::new().unwrap();
    let origin = temp_dir.path().join("origin");
    init_origin(&origin, "db/Dockerfile", "FROM postgres:13").unwrap();
    let sink = LogSink::open(temp_dir.path().join("log")).unwrap();
    let vcs = GitVersionControl::new(Arc::new(sink));
    let dir = temp_dir.path().join("ws").join("infra");
    let remote = origin.to_str().unwrap();

    let first = synchronize_repository(&vcs, &dir, remote).unwrap();
    assert_eq!(first, SyncOutcome::Cloned(PullOutcome::UpToDate));

    commit_file(&origin, "db/init.sql", "CREATE TABLE t();", "Add init").unwrap();

    let second = synchronize_repository(&vcs, &dir, remote).unwrap();
    assert_eq!(second, SyncOutcome::Reused(PullOutcome::FastForwarded));
    assert!(dir.join("db").join("init.sql").exists());
}
