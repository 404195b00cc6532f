// Peer Client Port
// Readiness/exit coordination between role instances

use std::net::IpAddr;
use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::Role;
use crate::error::Result;

/// Client used to exchange readiness/exit signals with a peer instance
/// over the network. Wire format is the implementation's concern.
#[async_trait]
pub trait PeerClient: Send + Sync {
    /// Tell the peer that this instance, acting as `role`, is ready.
    async fn notify_ready(&self, role: Role) -> Result<()>;

    /// Tell the peer that this instance is exiting and why.
    async fn notify_exit(&self, reason: &str) -> Result<()>;
}

/// Process-wide cache of peer clients, keyed by IP address.
///
/// The first call for an address constructs the client; later calls
/// return the same instance (reference identity matters for any
/// registered exit-notification subscriptions). No eviction - the cache
/// lives for the process lifetime.
pub trait PeerClientFactory: Send + Sync {
    fn get_or_create(&self, address: IpAddr) -> Result<Arc<dyn PeerClient>>;
}

// ============================================================================
// Mock Implementations for Testing
// ============================================================================

pub mod mocks {
    use super::*;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// What a mock peer was told.
    #[derive(Debug, Clone, PartialEq, Eq)]
    pub enum Notification {
        Ready(Role),
        Exit(String),
    }

    /// Mock peer client that records notifications.
    #[derive(Default)]
    pub struct MockPeerClient {
        notifications: Mutex<Vec<Notification>>,
    }

    impl MockPeerClient {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn notifications(&self) -> Vec<Notification> {
            self.notifications.lock().unwrap().clone()
        }
    }

    #[async_trait]
    impl PeerClient for MockPeerClient {
        async fn notify_ready(&self, role: Role) -> Result<()> {
            self.notifications
                .lock()
                .unwrap()
                .push(Notification::Ready(role));
            Ok(())
        }

        async fn notify_exit(&self, reason: &str) -> Result<()> {
            self.notifications
                .lock()
                .unwrap()
                .push(Notification::Exit(reason.to_string()));
            Ok(())
        }
    }

    /// Mock factory with the same caching contract as the real one.
    #[derive(Default)]
    pub struct MockPeerClientFactory {
        clients: Mutex<HashMap<IpAddr, Arc<MockPeerClient>>>,
    }

    impl MockPeerClientFactory {
        pub fn new() -> Self {
            Self::default()
        }

        pub fn created_count(&self) -> usize {
            self.clients.lock().unwrap().len()
        }

        pub fn client_for(&self, address: IpAddr) -> Option<Arc<MockPeerClient>> {
            self.clients.lock().unwrap().get(&address).cloned()
        }
    }

    impl PeerClientFactory for MockPeerClientFactory {
        fn get_or_create(&self, address: IpAddr) -> Result<Arc<dyn PeerClient>> {
            let mut clients = self.clients.lock().unwrap();
            let client = clients
                .entry(address)
                .or_insert_with(|| Arc::new(MockPeerClient::new()));
            Ok(client.clone())
        }
    }
}
