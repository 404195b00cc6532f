// Linux firewall manager (iptables)
// Same field contract as the netsh form: named rule, inbound, protocol,
// ports or range, allow

use std::sync::Arc;

use async_trait::async_trait;
use tracing::info;

use benchpress_core::application::cancellation::CancellationToken;
use benchpress_core::domain::{FirewallRule, PortSelection};
use benchpress_core::error::{Result, WorkloadError};
use benchpress_core::port::{FirewallManager, ProcessRunner, ProcessSpec};

/// Translates inbound rules into `iptables` invocations, one per
/// concrete protocol (iptables takes a single protocol per rule).
pub struct IptablesFirewallManager {
    runner: Arc<dyn ProcessRunner>,
}

impl IptablesFirewallManager {
    pub fn new(runner: Arc<dyn ProcessRunner>) -> Self {
        Self { runner }
    }

    fn dports(ports: &PortSelection) -> String {
        match ports {
            // iptables multiport takes the comma-joined list verbatim.
            PortSelection::List(_) => ports.to_string(),
            // Ranges use the colon form.
            PortSelection::Range { start, end } => format!("{start}:{end}"),
        }
    }

    fn add_rule_spec(rule: &FirewallRule, protocol: &str) -> ProcessSpec {
        ProcessSpec::new("iptables")
            .args(["-A", "INPUT", "-p", protocol])
            .args(["-m", "multiport", "--dports"])
            .arg(Self::dports(&rule.ports))
            .args(["-m", "comment", "--comment"])
            .arg(rule.name.clone())
            .args(["-j", "ACCEPT"])
            .elevated(true)
    }
}

#[async_trait]
impl FirewallManager for IptablesFirewallManager {
    async fn enable_inbound(&self, rule: &FirewallRule, cancel: &CancellationToken) -> Result<()> {
        info!(rule = %rule.name, ports = %rule.ports, "Enabling inbound firewall rule");

        for protocol in rule.protocol.concrete() {
            self.runner
                .run(Self::add_rule_spec(rule, protocol), cancel)
                .await
                .map_err(|source| WorkloadError::DependencyInstallationFailed {
                    dependency: format!("firewall rule '{}'", rule.name),
                    source: Box::new(source),
                })?;
        }
        Ok(())
    }
}
