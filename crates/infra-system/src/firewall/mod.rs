// Firewall adapters
// Both managers drive the host firewall tool through the ProcessRunner port

mod linux;
mod windows;

pub use linux::IptablesFirewallManager;
pub use windows::WindowsFirewallManager;

use std::sync::Arc;

use benchpress_core::port::{FirewallManager, ProcessRunner};

/// The firewall manager matching the build target.
pub fn system_firewall_manager(runner: Arc<dyn ProcessRunner>) -> Arc<dyn FirewallManager> {
    #[cfg(windows)]
    {
        Arc::new(WindowsFirewallManager::new(runner))
    }
    #[cfg(not(windows))]
    {
        Arc::new(IptablesFirewallManager::new(runner))
    }
}
