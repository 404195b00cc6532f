// Application Layer - orchestration built on domain types and ports

pub mod cancellation;
pub mod cleanup;
pub mod lifecycle;
pub mod topology;

// Re-exports
pub use cancellation::{cancellation_pair, CancellationSource, CancellationToken};
pub use cleanup::CleanupRegistry;
pub use lifecycle::{ExecutionLifecycle, LifecycleState, Workload, WorkloadContext};
pub use topology::ResolvedTopology;
