// Process Runner Port
// Abstraction for launching and monitoring external benchmark processes

use std::path::PathBuf;

use async_trait::async_trait;

use crate::application::cancellation::CancellationToken;
use crate::error::Result;

/// Description of a process to launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessSpec {
    pub executable: PathBuf,
    pub arguments: Vec<String>,
    pub working_dir: Option<PathBuf>,
    /// Request escalated OS privileges. How elevation is obtained is the
    /// runner implementation's concern.
    pub elevated: bool,
}

impl ProcessSpec {
    pub fn new(executable: impl Into<PathBuf>) -> Self {
        Self {
            executable: executable.into(),
            arguments: Vec::new(),
            working_dir: None,
            elevated: false,
        }
    }

    pub fn arg(mut self, arg: impl Into<String>) -> Self {
        self.arguments.push(arg.into());
        self
    }

    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.arguments.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = Some(dir.into());
        self
    }

    pub fn elevated(mut self, elevated: bool) -> Self {
        self.elevated = elevated;
        self
    }

    /// Human-readable command line for logs and error messages.
    pub fn command_line(&self) -> String {
        let mut line = self.executable.display().to_string();
        for arg in &self.arguments {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

/// Captured result of a finished (or short-circuited) process.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProcessOutput {
    /// None when the process never ran or was killed before exiting.
    pub exit_code: Option<i32>,
    pub stdout: String,
    pub stderr: String,
}

impl ProcessOutput {
    /// The result of a run that was skipped because cancellation was
    /// already requested.
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn success(&self) -> bool {
        self.exit_code == Some(0)
    }
}

/// Process Runner port.
///
/// Contract:
/// - A token that is already cancelled short-circuits to
///   `Ok(ProcessOutput::empty())` with no side effects at all. This is a
///   deliberate "do nothing near exit" policy.
/// - A force-kill cleanup action is registered before the process is
///   started, so the kill is guaranteed even if start itself fails.
/// - Cancellation during the run kills the process instead of waiting for
///   natural exit; the output captured so far is returned without error.
/// - A non-zero exit (when not cancelled) fails with
///   `WorkloadError::WorkloadFailed` carrying the captured output.
/// - Safe to call concurrently for independent processes; each call owns
///   its own child handle.
#[async_trait]
pub trait ProcessRunner: Send + Sync {
    async fn run(&self, spec: ProcessSpec, cancel: &CancellationToken) -> Result<ProcessOutput>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use crate::error::WorkloadError;
    use std::sync::{Arc, Mutex};

    /// Mock runner behavior
    #[derive(Debug, Clone)]
    pub enum MockBehavior {
        /// Exit 0 with the given stdout
        Succeed(String),
        /// Exit with the given non-zero code and stderr
        ExitWith(i32, String),
        /// Fail to start at all
        FailSpawn(String),
    }

    /// Mock Process Runner for testing. Records every spec it was asked
    /// to run so tests can assert exact command lines (or their absence).
    pub struct MockProcessRunner {
        behavior: Mutex<MockBehavior>,
        invocations: Arc<Mutex<Vec<ProcessSpec>>>,
    }

    impl MockProcessRunner {
        pub fn new(behavior: MockBehavior) -> Self {
            Self {
                behavior: Mutex::new(behavior),
                invocations: Arc::new(Mutex::new(Vec::new())),
            }
        }

        pub fn succeeding() -> Self {
            Self::new(MockBehavior::Succeed(String::new()))
        }

        pub fn failing(exit_code: i32) -> Self {
            Self::new(MockBehavior::ExitWith(exit_code, "mock failure".to_string()))
        }

        pub fn invocations(&self) -> Vec<ProcessSpec> {
            self.invocations.lock().unwrap().clone()
        }

        pub fn call_count(&self) -> usize {
            self.invocations.lock().unwrap().len()
        }
    }

    #[async_trait]
    impl ProcessRunner for MockProcessRunner {
        async fn run(
            &self,
            spec: ProcessSpec,
            cancel: &CancellationToken,
        ) -> Result<ProcessOutput> {
            if cancel.is_cancelled() {
                return Ok(ProcessOutput::empty());
            }

            self.invocations.lock().unwrap().push(spec.clone());

            let behavior = self.behavior.lock().unwrap().clone();
            match behavior {
                MockBehavior::Succeed(stdout) => Ok(ProcessOutput {
                    exit_code: Some(0),
                    stdout,
                    stderr: String::new(),
                }),
                MockBehavior::ExitWith(exit_code, stderr) => Err(WorkloadError::WorkloadFailed {
                    command: spec.command_line(),
                    exit_code,
                    stdout: String::new(),
                    stderr,
                }),
                MockBehavior::FailSpawn(reason) => Err(WorkloadError::SpawnFailed {
                    command: spec.command_line(),
                    reason,
                }),
            }
        }
    }
}
