// Port Layer - Interfaces for external dependencies

pub mod firewall;
pub mod peer_client;
pub mod platform_probe;
pub mod process_runner;
pub mod state_store;

// Re-exports
pub use firewall::FirewallManager;
pub use peer_client::{PeerClient, PeerClientFactory};
pub use platform_probe::PlatformProbe;
pub use process_runner::{ProcessOutput, ProcessRunner, ProcessSpec};
pub use state_store::StateStore;
