// Domain Layer - Core types with no infrastructure dependencies

pub mod firewall;
pub mod layout;
pub mod platform;
pub mod role;
pub mod state;

// Re-exports
pub use firewall::{FirewallRule, PortSelection, Protocol};
pub use layout::{Layout, LayoutInstance};
pub use platform::{
    Architecture, LinuxDistribution, Platform, PlatformInfo, PlatformRequirements,
};
pub use role::{ClientInstance, Role};
pub use state::StateRecord;
