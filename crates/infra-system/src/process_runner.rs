// System process runner
// tokio for async process management; kill guaranteed via the cleanup registry

use std::process::Stdio;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::{Child, Command};
use tracing::{debug, info, warn};

use benchpress_core::application::cancellation::CancellationToken;
use benchpress_core::application::cleanup::CleanupRegistry;
use benchpress_core::error::{Result, WorkloadError};
use benchpress_core::port::{ProcessOutput, ProcessRunner, ProcessSpec};

const EXIT_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// How the runner obtains escalated privileges for elevated specs.
///
/// Elevation itself is an external capability; the composition root picks
/// the method (sudo prefix when not already root, nothing otherwise).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ElevationMethod {
    /// Run elevated specs as-is (the agent itself is already privileged,
    /// or the platform handles it out-of-band).
    None,
    /// Prefix elevated specs with non-interactive sudo.
    Sudo,
}

/// Spawns, monitors, and force-kills external benchmark processes.
///
/// Each `run` call owns its own child handle, so independent processes
/// can run concurrently. A force-kill action is registered in the shared
/// cleanup registry before spawning, guaranteeing the kill even if the
/// spawn itself fails.
pub struct SystemProcessRunner {
    cleanup: Arc<CleanupRegistry>,
    elevation: ElevationMethod,
}

impl SystemProcessRunner {
    pub fn new(cleanup: Arc<CleanupRegistry>, elevation: ElevationMethod) -> Self {
        Self { cleanup, elevation }
    }

    fn build_command(&self, spec: &ProcessSpec) -> Command {
        let mut command = match (spec.elevated, self.elevation) {
            (true, ElevationMethod::Sudo) => {
                let mut command = Command::new("sudo");
                command.arg("-n").arg(&spec.executable);
                command.args(&spec.arguments);
                command
            }
            _ => {
                let mut command = Command::new(&spec.executable);
                command.args(&spec.arguments);
                command
            }
        };

        if let Some(dir) = &spec.working_dir {
            command.current_dir(dir);
        }

        command
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

async fn capture<R: AsyncRead + Unpin>(stream: Option<R>) -> String {
    let mut buf = Vec::new();
    if let Some(mut stream) = stream {
        let _ = stream.read_to_end(&mut buf).await;
    }
    String::from_utf8_lossy(&buf).to_string()
}

#[async_trait]
impl ProcessRunner for SystemProcessRunner {
    async fn run(&self, spec: ProcessSpec, cancel: &CancellationToken) -> Result<ProcessOutput> {
        // Do nothing near exit: a token that is already cancelled means
        // no process creation and no cleanup registration at all.
        if cancel.is_cancelled() {
            debug!(
                command = %spec.command_line(),
                "Cancellation already requested; skipping process creation"
            );
            return Ok(ProcessOutput::empty());
        }

        let command_line = spec.command_line();
        info!(
            command = %command_line,
            working_dir = ?spec.working_dir,
            elevated = spec.elevated,
            "Starting workload process"
        );

        // The kill must be guaranteed even if spawn itself fails, so the
        // cleanup action is registered before the child exists. The slot
        // is filled once the spawn succeeds.
        let child_slot: Arc<Mutex<Option<Child>>> = Arc::new(Mutex::new(None));
        {
            let slot = child_slot.clone();
            self.cleanup
                .register(format!("kill '{command_line}'"), move || {
                    Box::pin(async move {
                        if let Some(child) = slot.lock().unwrap().as_mut() {
                            if child.start_kill().is_ok() {
                                debug!("Force-killed process during cleanup");
                            }
                        }
                        Ok(())
                    })
                });
        }

        let mut command = self.build_command(&spec);
        let mut child = command.spawn().map_err(|e| WorkloadError::SpawnFailed {
            command: command_line.clone(),
            reason: e.to_string(),
        })?;

        let stdout_task = tokio::spawn(capture(child.stdout.take()));
        let stderr_task = tokio::spawn(capture(child.stderr.take()));
        *child_slot.lock().unwrap() = Some(child);

        // Wait for exit, checking the token between polls. Cancellation
        // kills the in-flight process rather than waiting for natural
        // exit; the loop then continues until the kill lands.
        let mut kill_sent = false;
        let status = loop {
            let exited = {
                let mut guard = child_slot.lock().unwrap();
                let child = guard
                    .as_mut()
                    .expect("child stored before the wait loop starts");
                child.try_wait()?
            };
            if let Some(status) = exited {
                break status;
            }

            tokio::select! {
                _ = tokio::time::sleep(EXIT_POLL_INTERVAL) => {}
                _ = cancel.cancelled(), if !kill_sent => {
                    warn!(command = %command_line, "Cancellation requested; killing in-flight process");
                    if let Some(child) = child_slot.lock().unwrap().as_mut() {
                        let _ = child.start_kill();
                    }
                    kill_sent = true;
                }
            }
        };

        let output = ProcessOutput {
            exit_code: status.code(),
            stdout: stdout_task.await.unwrap_or_default(),
            stderr: stderr_task.await.unwrap_or_default(),
        };

        info!(
            command = %command_line,
            exit_code = ?output.exit_code,
            "Workload process exited"
        );

        // A run interrupted by cancellation is not a workload failure;
        // return whatever output was captured.
        if !cancel.is_cancelled() && !output.success() {
            return Err(WorkloadError::WorkloadFailed {
                command: command_line,
                exit_code: output.exit_code.unwrap_or(-1),
                stdout: output.stdout,
                stderr: output.stderr,
            });
        }

        Ok(output)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use benchpress_core::application::cancellation::cancellation_pair;
    use std::time::Instant;

    fn runner() -> (Arc<CleanupRegistry>, SystemProcessRunner) {
        let cleanup = Arc::new(CleanupRegistry::new());
        let runner = SystemProcessRunner::new(cleanup.clone(), ElevationMethod::None);
        (cleanup, runner)
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_run_captures_stdout() {
        let (cleanup, runner) = runner();
        let (_source, token) = cancellation_pair();

        let output = runner
            .run(ProcessSpec::new("echo").arg("hello"), &token)
            .await
            .unwrap();

        assert_eq!(output.exit_code, Some(0));
        assert!(output.stdout.contains("hello"));
        // The guaranteed-kill action was registered for the run.
        assert_eq!(cleanup.len(), 1);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_non_zero_exit_is_a_workload_failure() {
        let (_cleanup, runner) = runner();
        let (_source, token) = cancellation_pair();

        let err = runner
            .run(ProcessSpec::new("sh").args(["-c", "echo oops >&2; exit 3"]), &token)
            .await
            .unwrap_err();

        match err {
            WorkloadError::WorkloadFailed {
                exit_code, stderr, ..
            } => {
                assert_eq!(exit_code, 3);
                assert!(stderr.contains("oops"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_pre_cancelled_token_creates_nothing() {
        let (cleanup, runner) = runner();
        let (source, token) = cancellation_pair();
        source.cancel();

        let output = runner
            .run(ProcessSpec::new("definitely-not-a-real-binary"), &token)
            .await
            .unwrap();

        assert_eq!(output, ProcessOutput::empty());
        assert!(cleanup.is_empty());
    }

    #[tokio::test]
    async fn test_spawn_failure_still_registers_the_kill() {
        let (cleanup, runner) = runner();
        let (_source, token) = cancellation_pair();

        let err = runner
            .run(ProcessSpec::new("definitely-not-a-real-binary"), &token)
            .await
            .unwrap_err();

        assert!(matches!(err, WorkloadError::SpawnFailed { .. }));
        assert_eq!(cleanup.len(), 1);
        // Running the registered action against a never-started child is
        // a safe no-op.
        cleanup.run_all().await;
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_cancellation_kills_the_inflight_process() {
        let (_cleanup, runner) = runner();
        let (source, token) = cancellation_pair();

        let started = Instant::now();
        let handle = tokio::spawn(async move {
            runner.run(ProcessSpec::new("sleep").arg("30"), &token).await
        });

        tokio::time::sleep(Duration::from_millis(200)).await;
        source.cancel();

        let output = handle.await.unwrap().unwrap();
        assert!(started.elapsed() < Duration::from_secs(5));
        // Killed, not exited normally.
        assert_ne!(output.exit_code, Some(0));
    }

    #[test]
    fn test_sudo_elevation_prefixes_the_command() {
        let (cleanup, _) = runner();
        let runner = SystemProcessRunner::new(cleanup, ElevationMethod::Sudo);
        let spec = ProcessSpec::new("netsh").arg("advfirewall").elevated(true);

        let command = runner.build_command(&spec);
        let std_command = command.as_std();
        assert_eq!(std_command.get_program(), "sudo");
        let args: Vec<_> = std_command.get_args().collect();
        assert_eq!(args[0], "-n");
        assert_eq!(args[1], "netsh");
    }

    #[test]
    fn test_unelevated_spec_ignores_the_elevation_method() {
        let (cleanup, _) = runner();
        let runner = SystemProcessRunner::new(cleanup, ElevationMethod::Sudo);
        let spec = ProcessSpec::new("echo").arg("hi");

        let command = runner.build_command(&spec);
        assert_eq!(command.as_std().get_program(), "echo");
    }
}
