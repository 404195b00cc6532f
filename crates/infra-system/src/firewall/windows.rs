// Windows firewall manager (netsh advfirewall)

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use benchpress_core::application::cancellation::CancellationToken;
use benchpress_core::domain::FirewallRule;
use benchpress_core::error::{Result, WorkloadError};
use benchpress_core::port::{FirewallManager, ProcessRunner, ProcessSpec};

/// Translates inbound rules into `netsh advfirewall` invocations.
pub struct WindowsFirewallManager {
    runner: Arc<dyn ProcessRunner>,
}

impl WindowsFirewallManager {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    fn add_rule_spec(rule: &FirewallRule) -> ProcessSpec {
        ProcessSpec::new("netsh")
            .args(["advfirewall", "firewall", "add", "rule"])
            .arg(format!("name=\"{}\"", rule.name))
            .arg("dir=in")
            .arg(format!("protocol={}", rule.protocol))
            .arg(format!("localport={}", rule.ports))
            .arg("action=allow")
            .elevated(true)
    }
}

#[async_trait]
impl FirewallManager for WindowsFirewallManager {
    async fn enable_inbound(&self, rule: &FirewallRule, cancel: &CancellationToken) -> Result<()> {
        info!(rule = %rule.name, ports = %rule.ports, "Enabling inbound firewall rule");

        self.runner
            .run(Self::add_rule_spec(rule), cancel)
            .await
            .map(|_| ())
            .map_err(|source| WorkloadError::DependencyInstallationFailed {
                dependency: format!("firewall rule '{}'", rule.name),
                source: Box::new(source),
            })
    }
}
