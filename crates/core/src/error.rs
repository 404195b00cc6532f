// Central Error Type for the Workload Agent

use thiserror::Error;

use crate::domain::Role;

/// Workload-level error type
///
/// Each variant corresponds to a distinct failure reason so callers can
/// classify failures without string matching. None of these are retried
/// by the core; retry policy belongs to whatever drives the lifecycle.
#[derive(Error, Debug)]
pub enum WorkloadError {
    #[error(
        "the workload is not supported on the current platform/architecture '{current}'. \
         Supported platform/architectures include: {supported}"
    )]
    PlatformNotSupported { current: String, supported: String },

    #[error(
        "the workload is not supported on the current Linux distribution '{distribution}'. \
         Supported distributions include: {supported}"
    )]
    DistributionNotSupported {
        distribution: String,
        supported: String,
    },

    #[error("role '{role}' is not supported by workload '{workload}' (supported roles: {supported})")]
    RoleNotSupported {
        role: Role,
        workload: String,
        supported: String,
    },

    #[error("no instance with role '{role}' could be resolved from the environment layout")]
    PeerAddressNotFound { role: Role },

    #[error("workload process '{command}' failed with exit code {exit_code}: {stderr}")]
    WorkloadFailed {
        command: String,
        exit_code: i32,
        stdout: String,
        stderr: String,
    },

    #[error("failed to install dependency '{dependency}': {source}")]
    DependencyInstallationFailed {
        dependency: String,
        #[source]
        source: Box<WorkloadError>,
    },

    #[error("failed to start process '{command}': {reason}")]
    SpawnFailed { command: String, reason: String },

    #[error("state store error: {0}")]
    State(String),

    #[error("peer client error: {0}")]
    Peer(String),

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Result type alias using WorkloadError
pub type Result<T> = std::result::Result<T, WorkloadError>;

// From implementation for infra crates (to avoid circular dependency)
impl From<String> for WorkloadError {
    fn from(err: String) -> Self {
        WorkloadError::State(err)
    }
}
