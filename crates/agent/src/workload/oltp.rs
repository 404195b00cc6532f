// OLTP database benchmark workload
// Server role prepares the database and opens its port; client role runs
// the benchmark tool against it

use std::collections::HashMap;
use std::path::PathBuf;

use async_trait::async_trait;
use tracing::info;

use benchpress_core::application::{Workload, WorkloadContext};
use benchpress_core::domain::{
    Architecture, FirewallRule, LinuxDistribution, Platform, PlatformRequirements, Protocol, Role,
    StateRecord,
};
use benchpress_core::error::{Result, WorkloadError};
use benchpress_core::port::{FirewallManager, PeerClient, ProcessRunner, ProcessSpec, StateStore};

const STATE_NAME: &str = "oltp";
const DEFAULT_DB_PORT: u16 = 3306;
const DEFAULT_SCENARIO: &str = "Default";

/// Persisted setup progress. A flag is set only after the step it guards
/// has fully completed, so interrupted runs redo exactly the unfinished
/// steps.
#[derive(Debug, Default, serde::Serialize, serde::Deserialize)]
struct OltpState {
    #[serde(default)]
    initialized: bool,
    #[serde(default, rename = "database-initialized")]
    database_initialized: bool,
    #[serde(default, rename = "disk-paths-argument")]
    disk_paths_argument: String,
}

/// OLTP client/server database benchmark.
///
/// The concrete tool command lines arrive through profile parameters:
/// `server_prepare_command`, `client_run_command`, `db_port`,
/// `disk_paths`, `scenario`, `scripts_dir`.
pub struct OltpWorkload {
    roles: Vec<Role>,
    scripts_dir: Option<PathBuf>,
}

impl OltpWorkload {
    pub fn new(parameters: &HashMap<String, String>) -> Self {
        Self {
            roles: vec![Role::Client, Role::Server],
            scripts_dir: parameters.get("scripts_dir").map(PathBuf::from),
        }
    }

    async fn load_state(ctx: &WorkloadContext) -> Result<OltpState> {
        match ctx.state_store.get(STATE_NAME).await? {
            Some(record) => record.to_typed(),
            None => Ok(OltpState::default()),
        }
    }

    async fn save_state(ctx: &WorkloadContext, state: &OltpState) -> Result<()> {
        let record = StateRecord::from_typed(STATE_NAME, state)?;
        ctx.state_store.save(&record).await
    }

    fn db_port(ctx: &WorkloadContext) -> Result<u16> {
        match ctx.parameter("db_port") {
            Some(raw) => raw.parse().map_err(|_| {
                WorkloadError::Config(format!("invalid db_port '{raw}'"))
            }),
            None => Ok(DEFAULT_DB_PORT),
        }
    }

    fn command_spec(&self, command: &str, elevated: bool) -> Result<ProcessSpec> {
        let mut parts = command.split_whitespace();
        let executable = parts.next().ok_or_else(|| {
            WorkloadError::Config("empty command string in parameters".to_string())
        })?;

        let mut spec = ProcessSpec::new(executable)
            .args(parts.map(str::to_string))
            .elevated(elevated);
        if let Some(dir) = &self.scripts_dir {
            spec = spec.working_dir(dir);
        }
        Ok(spec)
    }

    async fn execute_server(&self, ctx: &WorkloadContext) -> Result<()> {
        let scenario = ctx.parameter("scenario").unwrap_or(DEFAULT_SCENARIO);
        let port = Self::db_port(ctx)?;

        // The database port is a dependency of the benchmark; open it
        // before any client can be told we are ready.
        let rule = FirewallRule::with_ports(
            "benchpress-oltp-server",
            "Inbound database connections for the OLTP benchmark",
            Protocol::Tcp,
            [port],
        );
        ctx.firewall.enable_inbound(&rule, &ctx.cancel).await?;

        let mut state = Self::load_state(ctx).await?;
        if !state.database_initialized {
            info!(scenario = %scenario, "Preparing benchmark database");
            if let Some(command) = ctx.parameter("server_prepare_command") {
                let spec = self.command_spec(command, true)?;
                ctx.process_runner.run(spec, &ctx.cancel).await?;
            }
            if ctx.cancel.is_cancelled() {
                // Interrupted: leave the flag unset so the next run
                // redoes the preparation.
                return Ok(());
            }
            state.database_initialized = true;
            Self::save_state(ctx, &state).await?;
        } else {
            info!(scenario = %scenario, "Database already prepared; skipping");
        }

        if let Some(peer) = &ctx.peer_client {
            peer.notify_ready(Role::Server).await?;
        }
        Ok(())
    }

    async fn execute_client(&self, ctx: &WorkloadContext) -> Result<()> {
        if let Some(command) = ctx.parameter("client_run_command") {
            let spec = self.command_spec(command, false)?;
            let output = ctx.process_runner.run(spec, &ctx.cancel).await?;
            // Metric parsing is the caller's concern; keep the raw output
            // available in the logs.
            info!(
                stdout_bytes = output.stdout.len(),
                exit_code = ?output.exit_code,
                "Benchmark run finished"
            );
        } else {
            info!("No client_run_command configured; nothing to run");
        }

        if let Some(peer) = &ctx.peer_client {
            peer.notify_exit("benchmark run complete").await?;
        }
        Ok(())
    }
}

#[async_trait]
impl Workload for OltpWorkload {
    fn name(&self) -> &str {
        "oltp"
    }

    fn supported_roles(&self) -> &[Role] {
        &self.roles
    }

    fn requirements(&self) -> PlatformRequirements {
        PlatformRequirements::new()
            .platform(Platform::Linux, Architecture::X64)
            .platform(Platform::Linux, Architecture::Arm64)
            .distribution(LinuxDistribution::Ubuntu)
            .distribution(LinuxDistribution::Debian)
    }

    fn executables(&self) -> Vec<PathBuf> {
        match &self.scripts_dir {
            Some(dir) => vec![dir.join("setup-server.sh"), dir.join("run-client.sh")],
            None => Vec::new(),
        }
    }

    async fn initialize(&self, ctx: &WorkloadContext) -> Result<()> {
        let mut state = Self::load_state(ctx).await?;
        if !state.initialized {
            state.disk_paths_argument = ctx.parameter("disk_paths").unwrap_or_default().to_string();
            state.initialized = true;
            Self::save_state(ctx, &state).await?;
        }
        Ok(())
    }

    async fn execute(&self, ctx: &WorkloadContext) -> Result<()> {
        match ctx.local.role {
            Role::Server => {
                self.execute_server(ctx).await?;
                if !ctx.topology.multi_machine {
                    // Single-machine mode drives both sides locally.
                    self.execute_client(ctx).await?;
                }
                Ok(())
            }
            Role::Client => self.execute_client(ctx).await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::net::{IpAddr, Ipv4Addr};
    use std::sync::Arc;

    use benchpress_core::application::cancellation::cancellation_pair;
    use benchpress_core::application::{CleanupRegistry, ResolvedTopology};
    use benchpress_core::domain::{ClientInstance, PlatformInfo};
    use benchpress_core::port::firewall::mocks::MockFirewallManager;
    use benchpress_core::port::peer_client::mocks::{MockPeerClient, Notification};
    use benchpress_core::port::process_runner::mocks::MockProcessRunner;
    use benchpress_core::port::state_store::mocks::InMemoryStateStore;

    struct Mocks {
        runner: Arc<MockProcessRunner>,
        firewall: Arc<MockFirewallManager>,
        store: Arc<InMemoryStateStore>,
        peer: Arc<MockPeerClient>,
    }

    fn context(role: Role, multi_machine: bool, parameters: HashMap<String, String>) -> (Mocks, WorkloadContext) {
        let runner = Arc::new(MockProcessRunner::succeeding());
        let firewall = Arc::new(MockFirewallManager::new());
        let store = Arc::new(InMemoryStateStore::new());
        let peer = Arc::new(MockPeerClient::new());
        // Dropping the source leaves the token permanently un-cancelled,
        // which is exactly what these tests need.
        let (_source, cancel) = cancellation_pair();

        let local = ClientInstance::new("local", role, IpAddr::V4(Ipv4Addr::new(10, 0, 0, 1)));
        let topology = ResolvedTopology {
            instances: vec![local.clone()],
            multi_machine,
        };

        let ctx = WorkloadContext {
            run_id: "test-run".to_string(),
            platform: PlatformInfo::new(Platform::Linux, Architecture::X64)
                .with_distribution(LinuxDistribution::Ubuntu),
            local,
            topology,
            peer: None,
            peer_client: if multi_machine {
                Some(peer.clone() as Arc<dyn benchpress_core::port::PeerClient>)
            } else {
                None
            },
            process_runner: runner.clone(),
            firewall: firewall.clone(),
            state_store: store.clone(),
            cleanup: Arc::new(CleanupRegistry::new()),
            cancel,
            parameters,
        };

        (
            Mocks {
                runner,
                firewall,
                store,
                peer,
            },
            ctx,
        )
    }

    fn server_parameters() -> HashMap<String, String> {
        HashMap::from([
            ("db_port".to_string(), "3306".to_string()),
            (
                "server_prepare_command".to_string(),
                "mysql-prepare --scenario=Default".to_string(),
            ),
        ])
    }

    #[tokio::test]
    async fn test_initialize_seeds_state_once() {
        let parameters =
            HashMap::from([("disk_paths".to_string(), "/dev/sdb /dev/sdc".to_string())]);
        let workload = OltpWorkload::new(&parameters);
        let (mocks, ctx) = context(Role::Server, true, parameters);

        workload.initialize(&ctx).await.unwrap();
        let record = mocks.store.get("oltp").await.unwrap().unwrap();
        let state: OltpState = record.to_typed().unwrap();
        assert!(state.initialized);
        assert_eq!(state.disk_paths_argument, "/dev/sdb /dev/sdc");
    }

    #[tokio::test]
    async fn test_server_opens_firewall_and_prepares_database_once() {
        let parameters = server_parameters();
        let workload = OltpWorkload::new(&parameters);
        let (mocks, ctx) = context(Role::Server, true, parameters);

        workload.execute(&ctx).await.unwrap();

        // Firewall rule for the database port, tcp.
        let rules = mocks.firewall.enabled_rules();
        assert_eq!(rules.len(), 1);
        assert_eq!(rules[0].protocol, Protocol::Tcp);
        assert_eq!(rules[0].ports.to_string(), "3306");

        // Preparation command ran and the guarded flag is now set.
        assert_eq!(mocks.runner.call_count(), 1);
        let state: OltpState = mocks
            .store
            .get("oltp")
            .await
            .unwrap()
            .unwrap()
            .to_typed()
            .unwrap();
        assert!(state.database_initialized);

        // The peer was told we are ready.
        assert_eq!(
            mocks.peer.notifications(),
            vec![Notification::Ready(Role::Server)]
        );

        // A second execute must not re-prepare the database.
        workload.execute(&ctx).await.unwrap();
        assert_eq!(mocks.runner.call_count(), 1);
    }

    #[tokio::test]
    async fn test_client_runs_benchmark_and_notifies_exit() {
        let parameters = HashMap::from([(
            "client_run_command".to_string(),
            "sysbench oltp_read_write run".to_string(),
        )]);
        let workload = OltpWorkload::new(&parameters);
        let (mocks, ctx) = context(Role::Client, true, parameters);

        workload.execute(&ctx).await.unwrap();

        let invocations = mocks.runner.invocations();
        assert_eq!(invocations.len(), 1);
        assert_eq!(invocations[0].command_line(), "sysbench oltp_read_write run");
        assert!(!invocations[0].elevated);
        assert_eq!(
            mocks.peer.notifications(),
            vec![Notification::Exit("benchmark run complete".to_string())]
        );
    }

    #[tokio::test]
    async fn test_single_machine_server_drives_both_sides() {
        let mut parameters = server_parameters();
        parameters.insert(
            "client_run_command".to_string(),
            "sysbench run".to_string(),
        );
        let workload = OltpWorkload::new(&parameters);
        let (mocks, ctx) = context(Role::Server, false, parameters);

        workload.execute(&ctx).await.unwrap();

        // Prepare + run, no peer to notify.
        assert_eq!(mocks.runner.call_count(), 2);
        assert!(mocks.peer.notifications().is_empty());
    }

    #[tokio::test]
    async fn test_invalid_db_port_is_a_config_error() {
        let parameters = HashMap::from([("db_port".to_string(), "lots".to_string())]);
        let workload = OltpWorkload::new(&parameters);
        let (_mocks, ctx) = context(Role::Server, true, parameters);

        assert!(matches!(
            workload.execute(&ctx).await,
            Err(WorkloadError::Config(_))
        ));
    }

    #[test]
    fn test_executables_follow_the_scripts_dir() {
        let parameters =
            HashMap::from([("scripts_dir".to_string(), "/opt/oltp".to_string())]);
        let workload = OltpWorkload::new(&parameters);
        let executables = workload.executables();
        assert_eq!(executables.len(), 2);
        assert!(executables[0].starts_with("/opt/oltp"));

        assert!(OltpWorkload::new(&HashMap::new()).executables().is_empty());
    }
}
