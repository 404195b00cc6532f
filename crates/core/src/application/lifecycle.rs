// Execution Lifecycle
// Initialize -> Execute -> Cleanup orchestration for one workload instance

use std::collections::HashMap;
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info};

use crate::application::cancellation::CancellationToken;
use crate::application::cleanup::CleanupRegistry;
use crate::application::topology::ResolvedTopology;
use crate::domain::{ClientInstance, Layout, PlatformInfo, PlatformRequirements, Role};
use crate::error::{Result, WorkloadError};
use crate::port::{
    FirewallManager, PeerClient, PeerClientFactory, PlatformProbe, ProcessRunner, StateStore,
};

/// Lifecycle phases. Transitions are one-directional; there is no retry
/// loop back from `Failed` - retries are a new lifecycle instance.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LifecycleState {
    Created,
    Initializing,
    Ready,
    Executing,
    Completed,
    Failed,
    CleanedUp,
}

/// Capability contract a workload implements to be driven by the
/// lifecycle. Replaces a deep base-class hierarchy: the orchestrator owns
/// the state machine, the workload owns the benchmark-specific steps.
#[async_trait]
pub trait Workload: Send + Sync {
    /// Workload type name; also keys the persisted state record.
    fn name(&self) -> &str;

    /// Roles this workload knows how to act as.
    fn supported_roles(&self) -> &[Role];

    /// Platform/architecture/distribution support matrix.
    fn requirements(&self) -> PlatformRequirements;

    /// Helper scripts/binaries to mark runnable before first use.
    fn executables(&self) -> Vec<PathBuf> {
        Vec::new()
    }

    /// Which role's instance this one coordinates with. Defaults to the
    /// first supported role different from the local one.
    fn peer_role(&self, local: Role) -> Option<Role> {
        self.supported_roles()
            .iter()
            .copied()
            .find(|role| *role != local)
    }

    /// Workload-specific initialization (state seeding, argument
    /// precomputation). Runs after the platform gate and topology
    /// resolution.
    async fn initialize(&self, _ctx: &WorkloadContext) -> Result<()> {
        Ok(())
    }

    /// The benchmark itself. May use the process runner and firewall
    /// manager from the context; must observe the cancellation token and
    /// set persisted flags only after the step they guard has completed.
    async fn execute(&self, ctx: &WorkloadContext) -> Result<()>;
}

/// Everything a workload needs during initialize/execute, resolved once
/// by the lifecycle.
pub struct WorkloadContext {
    pub run_id: String,
    pub platform: PlatformInfo,
    pub local: ClientInstance,
    pub topology: ResolvedTopology,
    /// The canonical peer instance; None in single-machine mode or for
    /// single-role workloads.
    pub peer: Option<ClientInstance>,
    pub peer_client: Option<Arc<dyn PeerClient>>,
    pub process_runner: Arc<dyn ProcessRunner>,
    pub firewall: Arc<dyn FirewallManager>,
    pub state_store: Arc<dyn StateStore>,
    pub cleanup: Arc<CleanupRegistry>,
    pub cancel: CancellationToken,
    /// Free-form profile parameters (scenario names, command strings).
    pub parameters: HashMap<String, String>,
}

impl WorkloadContext {
    pub fn parameter(&self, key: &str) -> Option<&str> {
        self.parameters.get(key).map(String::as_str)
    }
}

/// Orchestrates one workload run: Initialize -> Execute -> Cleanup.
///
/// Collaborators are injected explicitly so every dependency is visible
/// in the constructor and trivially mockable. The instance is not
/// re-entrant; `run` consumes the Created state and cannot be repeated.
pub struct ExecutionLifecycle {
    workload: Arc<dyn Workload>,
    probe: Arc<dyn PlatformProbe>,
    process_runner: Arc<dyn ProcessRunner>,
    firewall: Arc<dyn FirewallManager>,
    state_store: Arc<dyn StateStore>,
    peer_clients: Arc<dyn PeerClientFactory>,
    cleanup: Arc<CleanupRegistry>,
    layout: Option<Layout>,
    local_address: IpAddr,
    parameters: HashMap<String, String>,
    state: LifecycleState,
}

impl ExecutionLifecycle {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        workload: Arc<dyn Workload>,
        probe: Arc<dyn PlatformProbe>,
        process_runner: Arc<dyn ProcessRunner>,
        firewall: Arc<dyn FirewallManager>,
        state_store: Arc<dyn StateStore>,
        peer_clients: Arc<dyn PeerClientFactory>,
        cleanup: Arc<CleanupRegistry>,
    ) -> Self {
        Self {
            workload,
            probe,
            process_runner,
            firewall,
            state_store,
            peer_clients,
            cleanup,
            layout: None,
            local_address: IpAddr::V4(Ipv4Addr::LOCALHOST),
            parameters: HashMap::new(),
            state: LifecycleState::Created,
        }
    }

    /// Declare the multi-machine layout. Absent layout means
    /// single-machine mode.
    pub fn with_layout(mut self, layout: Option<Layout>) -> Self {
        self.layout = layout;
        self
    }

    /// The address this machine appears under in the layout.
    pub fn with_local_address(mut self, address: IpAddr) -> Self {
        self.local_address = address;
        self
    }

    pub fn with_parameters(mut self, parameters: HashMap<String, String>) -> Self {
        self.parameters = parameters;
        self
    }

    pub fn state(&self) -> LifecycleState {
        self.state
    }

    /// Drive the workload through its whole lifecycle. Cleanup actions
    /// run unconditionally once this method is entered, regardless of
    /// which phase failed.
    pub async fn run(&mut self, cancel: CancellationToken) -> Result<()> {
        // Running twice is a programming error, not a recoverable condition.
        assert!(
            self.state == LifecycleState::Created,
            "ExecutionLifecycle::run called on an instance that already ran; \
             retries require a new lifecycle"
        );

        let workload = self.workload.name().to_string();
        let result = self.run_phases(&cancel).await;

        match &result {
            Ok(()) => {
                self.state = LifecycleState::Completed;
                info!(workload = %workload, "Workload completed");
            }
            Err(e) => {
                self.state = LifecycleState::Failed;
                error!(workload = %workload, error = %e, "Workload failed");
            }
        }

        self.cleanup.run_all().await;
        self.state = LifecycleState::CleanedUp;

        result
    }

    async fn run_phases(&mut self, cancel: &CancellationToken) -> Result<()> {
        if cancel.is_cancelled() {
            info!(
                workload = %self.workload.name(),
                "Cancellation requested before initialization; nothing to do"
            );
            return Ok(());
        }

        self.state = LifecycleState::Initializing;
        let ctx = self.initialize(cancel).await?;
        self.state = LifecycleState::Ready;

        if cancel.is_cancelled() {
            info!(workload = %self.workload.name(), "Cancellation requested before execution");
            return Ok(());
        }

        self.state = LifecycleState::Executing;
        info!(
            workload = %self.workload.name(),
            run_id = %ctx.run_id,
            role = %ctx.local.role,
            "Executing workload"
        );
        self.workload.execute(&ctx).await
    }

    /// Platform gate, executable preparation, topology resolution, role
    /// validation, peer client creation, then workload-specific init.
    async fn initialize(&self, cancel: &CancellationToken) -> Result<WorkloadContext> {
        let platform = self.probe.current().await?;

        // Support must be checked before any mutating action.
        self.workload.requirements().check(&platform)?;

        for path in self.workload.executables() {
            self.probe.make_executable(&path).await?;
        }

        let required = self.workload.supported_roles().to_vec();
        let topology = ResolvedTopology::resolve(self.layout.as_ref(), &required)?;

        let local = if topology.multi_machine {
            topology
                .local(self.local_address)
                .cloned()
                .ok_or_else(|| {
                    WorkloadError::Config(format!(
                        "local address {} does not appear in the declared layout",
                        self.local_address
                    ))
                })?
        } else {
            topology.instances[0].clone()
        };

        if !self.workload.supported_roles().contains(&local.role) {
            return Err(WorkloadError::RoleNotSupported {
                role: local.role,
                workload: self.workload.name().to_string(),
                supported: self
                    .workload
                    .supported_roles()
                    .iter()
                    .map(Role::to_string)
                    .collect::<Vec<_>>()
                    .join(", "),
            });
        }

        let (peer, peer_client) = if topology.multi_machine {
            match self.workload.peer_role(local.role) {
                Some(role) => {
                    let peer = topology.canonical(role)?.clone();
                    let client = self.peer_clients.get_or_create(peer.address)?;
                    info!(
                        workload = %self.workload.name(),
                        peer = %peer.address,
                        peer_role = %peer.role,
                        "Resolved canonical peer"
                    );
                    (Some(peer), Some(client))
                }
                None => (None, None),
            }
        } else {
            (None, None)
        };

        let ctx = WorkloadContext {
            run_id: uuid::Uuid::new_v4().to_string(),
            platform,
            local,
            topology,
            peer,
            peer_client,
            process_runner: self.process_runner.clone(),
            firewall: self.firewall.clone(),
            state_store: self.state_store.clone(),
            cleanup: self.cleanup.clone(),
            cancel: cancel.clone(),
            parameters: self.parameters.clone(),
        };

        self.workload.initialize(&ctx).await?;
        Ok(ctx)
    }
}
