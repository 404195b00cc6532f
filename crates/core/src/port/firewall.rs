// Firewall Manager Port

use async_trait::async_trait;

use crate::application::cancellation::CancellationToken;
use crate::domain::FirewallRule;
use crate::error::Result;

/// Opens network paths required by a workload's processes.
///
/// Implementations translate the declarative rule into the host firewall
/// tool's command form and execute it (elevated) through the Process
/// Runner. A failing tool invocation surfaces as
/// `WorkloadError::DependencyInstallationFailed` - the rule is a
/// dependency of the benchmark, not the benchmark itself.
#[async_trait]
pub trait FirewallManager: Send + Sync {
    async fn enable_inbound(&self, rule: &FirewallRule, cancel: &CancellationToken) -> Result<()>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::sync::Mutex;

    /// Mock firewall manager that records enabled rules.
    #[derive(Default)]
    pub struct MockFirewallManager {
        rules: Mutex<Vec<FirewallRule>>,
    }

    impl MockFirewallManager {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn enabled_rules(&self) -> Vec<FirewallRule> {
            self.rules.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl FirewallManager for MockFirewallManager {
        async fn enable_inbound(
            &self,
            rule: &FirewallRule,
            cancel: &CancellationToken,
        ) -> Result<()> {
            if cancel.is_cancelled() {
                return Ok(());
            }
            self.rules.lock().unwrap().push(rule.clone());
            Ok(())
        }
    }
}
