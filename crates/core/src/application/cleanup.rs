// Cleanup Registry
// Deferred actions guaranteed to run once on every exit path

use std::sync::Mutex;

use futures::future::BoxFuture;
use tracing::{debug, warn};

use crate::error::Result;

type CleanupFn = Box<dyn FnOnce() -> BoxFuture<'static, Result<()>> + Send>;

struct CleanupAction {
    name: String,
    action: CleanupFn,
}

/// Registry of deferred cleanup actions.
///
/// Actions registered during execution run exactly once, in reverse
/// registration order, on every exit path (success, error, cancellation).
/// An individual action's failure is logged and swallowed so one broken
/// cleanup never prevents the rest from running.
///
/// Sequential access only - the lifecycle is not re-entrant.
#[derive(Default)]
pub struct CleanupRegistry {
    actions: Mutex<Vec<CleanupAction>>,
}

impl CleanupRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a deferred action. `name` identifies it in logs.
    pub fn register<F>(&self, name: impl Into<String>, action: F)
    where
        F: FnOnce() -> BoxFuture<'static, Result<()>> + Send + 'static,
    {
        let name = name.into();
        debug!(action = %name, "Registering cleanup action");
        self.actions.lock().unwrap().push(CleanupAction {
            name,
            action: Box::new(action),
        });
    }

    pub fn len(&self) -> usize {
        self.actions.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Run all registered actions in reverse registration order, draining
    /// the registry. Failures are logged, never propagated.
    pub async fn run_all(&self) {
        let mut actions = {
            let mut guard = self.actions.lock().unwrap();
            std::mem::take(&mut *guard)
        };

        while let Some(CleanupAction { name, action }) = actions.pop() {
            debug!(action = %name, "Running cleanup action");
            if let Err(e) = action().await {
                warn!(action = %name, error = %e, "Cleanup action failed; continuing");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::WorkloadError;
    use std::sync::Arc;

    #[tokio::test]
    async fn test_actions_run_in_reverse_order() {
        let registry = CleanupRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for i in 0..3 {
            let order = order.clone();
            registry.register(format!("action-{i}"), move || {
                Box::pin(async move {
                    order.lock().unwrap().push(i);
                    Ok(())
                })
            });
        }

        registry.run_all().await;
        assert_eq!(*order.lock().unwrap(), vec![2, 1, 0]);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_failed_action_does_not_stop_the_rest() {
        let registry = CleanupRegistry::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        {
            let order = order.clone();
            registry.register("first", move || {
                Box::pin(async move {
                    order.lock().unwrap().push("first");
                    Ok(())
                })
            });
        }
        registry.register("broken", || {
            Box::pin(async { Err(WorkloadError::State("disk gone".to_string())) })
        });

        registry.run_all().await;
        // The broken action (registered last, run first) must not mask
        // the earlier one.
        assert_eq!(*order.lock().unwrap(), vec!["first"]);
    }

    #[tokio::test]
    async fn test_second_run_is_a_no_op() {
        let registry = CleanupRegistry::new();
        let count = Arc::new(Mutex::new(0));

        {
            let count = count.clone();
            registry.register("once", move || {
                Box::pin(async move {
                    *count.lock().unwrap() += 1;
                    Ok(())
                })
            });
        }

        registry.run_all().await;
        registry.run_all().await;
        assert_eq!(*count.lock().unwrap(), 1);
    }
}
