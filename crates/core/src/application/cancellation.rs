// Cooperative Cancellation Token

use tokio::sync::watch;

/// Cancellation signal threaded through every blocking operation.
///
/// Cancellation is advisory-cooperative, not preemptive: holders check it
/// before starting new side-effecting work and propagate it into waits.
#[derive(Clone)]
pub struct CancellationToken {
    rx: watch::Receiver<bool>,
}

impl CancellationToken {
    /// Check whether cancellation was requested.
    pub fn is_cancelled(&self) -> bool {
        *self.rx.borrow()
    }

    /// Wait until cancellation is requested. If the source is dropped
    /// without cancelling, this future never resolves.
    pub async fn cancelled(&self) {
        let mut rx = self.rx.clone();
        loop {
            if *rx.borrow() {
                return;
            }
            if rx.changed().await.is_err() {
                // Source dropped without cancelling.
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Owning side of the cancellation signal.
pub struct CancellationSource {
    tx: watch::Sender<bool>,
}

impl CancellationSource {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(false);
        Self { tx }
    }

    /// Request cancellation for every outstanding token.
    pub fn cancel(&self) {
        let _ = self.tx.send(true);
    }

    /// Hand out a token tied to this source.
    pub fn token(&self) -> CancellationToken {
        CancellationToken {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for CancellationSource {
    fn default() -> Self {
        Self::new()
    }
}

/// Create a source/token pair.
pub fn cancellation_pair() -> (CancellationSource, CancellationToken) {
    let source = CancellationSource::new();
    let token = source.token();
    (source, token)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_token_reflects_cancel() {
        let (source, token) = cancellation_pair();
        assert!(!token.is_cancelled());
        source.cancel();
        assert!(token.is_cancelled());
    }

    #[tokio::test]
    async fn test_cancelled_wakes_waiters() {
        let (source, token) = cancellation_pair();
        let waiter = tokio::spawn(async move { token.cancelled().await });

        tokio::time::sleep(Duration::from_millis(10)).await;
        source.cancel();

        tokio::time::timeout(Duration::from_secs(1), waiter)
            .await
            .expect("waiter should resolve after cancel")
            .unwrap();
    }

    #[tokio::test]
    async fn test_clones_share_the_signal() {
        let (source, token) = cancellation_pair();
        let clone = token.clone();
        source.cancel();
        assert!(clone.is_cancelled());
    }
}
