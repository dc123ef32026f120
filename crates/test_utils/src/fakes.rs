//! In-memory fakes for the bootstrap's external collaborators.

use std::{
    collections::{BTreeSet, HashSet},
    fs,
    path::{Path, PathBuf},
    sync::{Arc, Mutex},
};

use async_trait::async_trait;
use testenv_core::{
    BackgroundProcess, ContainerPresence, ContainerRun, ContainerRuntime, DatabaseSettings,
    Error, ImageBuild, PullOutcome, StepReporter, VersionControl,
};

/// A call made against [`FakeContainerRuntime`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RuntimeCall {
    BuildImage(ImageBuild),
    FindByName(String),
    StopAndRemove(String),
    ForceRemove(String),
    RunInBackground(ContainerRun),
    CopyInto {
        name: String,
        source: PathBuf,
        destination: String,
    },
    ExecIn {
        name: String,
        command: Vec<String>,
    },
    Probe(String),
}

/// Operations that can be made to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FailurePoint {
    Build,
    StopAndRemove,
    Run,
    CopyInto,
    ExecIn,
}

#[derive(Debug, Default)]
struct RuntimeState {
    containers: BTreeSet<String>,
    calls: Vec<RuntimeCall>,
    failures: HashSet<FailurePoint>,
    listing_fails: bool,
    ready_after: Option<u32>,
    probes: u32,
}

/// Container runtime keeping containers in a set of names.
///
/// Starting a container whose name is taken fails the way the real runtime
/// does, so tests can observe whether teardown happened.
#[derive(Debug, Clone)]
pub struct FakeContainerRuntime {
    state: Arc<Mutex<RuntimeState>>,
    exit_code: Option<i32>,
}

impl Default for FakeContainerRuntime {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeContainerRuntime {
    pub fn new() -> Self {
        Self {
            state: Arc::default(),
            exit_code: Some(0),
        }
    }

    /// Pre-populates a container, as left behind by an earlier run.
    pub fn with_existing_container(self, name: &str) -> Self {
        self.lock().containers.insert(name.to_string());
        self
    }

    /// Makes every name lookup report `QueryFailed`.
    pub fn with_listing_failure(self) -> Self {
        self.lock().listing_fails = true;
        self
    }

    pub fn with_failure(self, point: FailurePoint) -> Self {
        self.lock().failures.insert(point);
        self
    }

    /// The readiness probe succeeds from the `attempts`-th call on.
    /// Without this the probe never succeeds.
    pub fn ready_after(self, attempts: u32) -> Self {
        self.lock().ready_after = Some(attempts);
        self
    }

    /// Exit code reported by started container processes.
    pub fn with_exit_code(mut self, code: Option<i32>) -> Self {
        self.exit_code = code;
        self
    }

    pub fn containers(&self) -> Vec<String> {
        self.lock().containers.iter().cloned().collect()
    }

    pub fn calls(&self) -> Vec<RuntimeCall> {
        self.lock().calls.clone()
    }

    pub fn probe_count(&self) -> u32 {
        self.lock().probes
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, RuntimeState> {
        self.state.lock().unwrap()
    }

    fn record(&self, call: RuntimeCall) {
        self.lock().calls.push(call);
    }

    fn check(&self, point: FailurePoint, command: &str) -> Result<(), Error> {
        if self.lock().failures.contains(&point) {
            return Err(Error::CommandFailed {
                command: command.to_string(),
                code: Some(1),
            });
        }
        Ok(())
    }
}

#[async_trait]
impl ContainerRuntime for FakeContainerRuntime {
    async fn build_image(&self, build: &ImageBuild) -> Result<(), Error> {
        self.record(RuntimeCall::BuildImage(build.clone()));
        self.check(FailurePoint::Build, "fake build")
    }

    async fn find_by_name(&self, name: &str) -> ContainerPresence {
        self.record(RuntimeCall::FindByName(name.to_string()));
        let state = self.lock();
        if state.listing_fails {
            ContainerPresence::QueryFailed("fake listing failure".to_string())
        } else if state.containers.contains(name) {
            ContainerPresence::Found
        } else {
            ContainerPresence::NotFound
        }
    }

    async fn stop_and_remove(&self, name: &str) -> Result<(), Error> {
        self.record(RuntimeCall::StopAndRemove(name.to_string()));
        self.check(FailurePoint::StopAndRemove, "fake stop")?;
        if !self.lock().containers.remove(name) {
            return Err(Error::CommandFailed {
                command: format!("fake stop {}", name),
                code: Some(1),
            });
        }
        Ok(())
    }

    async fn force_remove(&self, name: &str) {
        self.record(RuntimeCall::ForceRemove(name.to_string()));
        self.lock().containers.remove(name);
    }

    async fn run_in_background(
        &self,
        run: &ContainerRun,
    ) -> Result<Box<dyn BackgroundProcess>, Error> {
        self.record(RuntimeCall::RunInBackground(run.clone()));
        self.check(FailurePoint::Run, "fake run")?;
        if !self.lock().containers.insert(run.name.clone()) {
            return Err(Error::CommandFailed {
                command: format!("fake run --name={}", run.name),
                code: Some(125),
            });
        }
        Ok(Box::new(FakeBackgroundProcess::new(
            run.name.clone(),
            self.exit_code,
        )))
    }

    async fn copy_into(&self, name: &str, source: &Path, destination: &str) -> Result<(), Error> {
        self.record(RuntimeCall::CopyInto {
            name: name.to_string(),
            source: source.to_path_buf(),
            destination: destination.to_string(),
        });
        self.check(FailurePoint::CopyInto, "fake cp")
    }

    async fn exec_in(&self, name: &str, command: &[String]) -> Result<(), Error> {
        self.record(RuntimeCall::ExecIn {
            name: name.to_string(),
            command: command.to_vec(),
        });
        self.check(FailurePoint::ExecIn, "fake exec")
    }

    async fn is_accepting_connections(&self, name: &str, _database: &DatabaseSettings) -> bool {
        self.record(RuntimeCall::Probe(name.to_string()));
        let mut state = self.lock();
        state.probes += 1;
        matches!(state.ready_after, Some(after) if state.probes >= after)
    }
}

/// Container process that has already finished with a fixed exit code.
#[derive(Debug, Clone)]
pub struct FakeBackgroundProcess {
    name: String,
    exit_code: Option<i32>,
}

impl FakeBackgroundProcess {
    pub fn new(name: impl Into<String>, exit_code: Option<i32>) -> Self {
        Self {
            name: name.into(),
            exit_code,
        }
    }
}

#[async_trait]
impl BackgroundProcess for FakeBackgroundProcess {
    fn describe(&self) -> String {
        format!("fake container {}", self.name)
    }

    async fn wait(&mut self) -> Result<Option<i32>, Error> {
        Ok(self.exit_code)
    }
}

/// A call made against [`FakeVersionControl`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum VcsCall {
    Clone { remote: String, dir: PathBuf },
    Pull(PathBuf),
}

/// Version control that "clones" by writing a single file.
#[derive(Debug, Default)]
pub struct FakeVersionControl {
    calls: Mutex<Vec<VcsCall>>,
    fail_clone: bool,
    fail_pull: bool,
}

impl FakeVersionControl {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn failing_clone() -> Self {
        Self {
            fail_clone: true,
            ..Self::default()
        }
    }

    pub fn failing_pull() -> Self {
        Self {
            fail_pull: true,
            ..Self::default()
        }
    }

    pub fn calls(&self) -> Vec<VcsCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn clone_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, VcsCall::Clone { .. }))
            .count()
    }

    pub fn pull_count(&self) -> usize {
        self.calls()
            .iter()
            .filter(|call| matches!(call, VcsCall::Pull(_)))
            .count()
    }
}

impl VersionControl for FakeVersionControl {
    fn clone_repository(&self, remote: &str, dir: &Path) -> Result<(), Error> {
        self.calls.lock().unwrap().push(VcsCall::Clone {
            remote: remote.to_string(),
            dir: dir.to_path_buf(),
        });
        if self.fail_clone {
            return Err(Error::VersionControl {
                operation: "clone".to_string(),
                message: format!("fake clone of {} failed", remote),
            });
        }
        fs::create_dir_all(dir.join("db"))?;
        fs::write(dir.join("db").join("Dockerfile"), "FROM postgres:13\n")?;
        Ok(())
    }

    fn pull(&self, dir: &Path) -> Result<PullOutcome, Error> {
        self.calls
            .lock()
            .unwrap()
            .push(VcsCall::Pull(dir.to_path_buf()));
        if self.fail_pull {
            return Err(Error::VersionControl {
                operation: "pull".to_string(),
                message: "fake pull failed".to_string(),
            });
        }
        Ok(PullOutcome::UpToDate)
    }
}

/// Reporter that keeps every step message.
#[derive(Debug, Default)]
pub struct RecordingReporter {
    steps: Mutex<Vec<String>>,
}

impl RecordingReporter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> Vec<String> {
        self.steps.lock().unwrap().clone()
    }

    pub fn contains(&self, fragment: &str) -> bool {
        self.steps().iter().any(|step| step.contains(fragment))
    }
}

impl StepReporter for RecordingReporter {
    fn step(&self, message: &str) {
        self.steps.lock().unwrap().push(message.to_string());
    }
}
