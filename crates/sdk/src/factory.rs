//! Process-wide Peer Client Cache

use std::collections::HashMap;
use std::net::IpAddr;
use std::sync::{Arc, Mutex};

use tracing::debug;

use benchpress_core::port::{PeerClient, PeerClientFactory};

use crate::client::PeerApiClient;
use crate::DEFAULT_PEER_API_PORT;

/// Creates peer clients lazily and caches them by IP address for the
/// process lifetime. Repeated calls for the same address return the same
/// instance, so exit-notification subscriptions registered on a client
/// survive later lookups. No eviction.
pub struct CachingPeerClientFactory {
    port: u16,
    clients: Mutex<HashMap<IpAddr, Arc<PeerApiClient>>>,
}

impl CachingPeerClientFactory {
    pub fn new(port: u16) -> Self {
        Self {
            port,
            clients: Mutex::new(HashMap::new()),
        }
    }

    pub fn cached_count(&self) -> usize {
        self.clients.lock().unwrap().len()
    }
}

impl Default for CachingPeerClientFactory {
    fn default() -> Self {
        Self::new(DEFAULT_PEER_API_PORT)
    }
}

impl PeerClientFactory for CachingPeerClientFactory {
    fn get_or_create(
        &self,
        address: IpAddr,
    ) -> benchpress_core::error::Result<Arc<dyn PeerClient>> {
        let mut clients = self.clients.lock().unwrap();
        if let Some(client) = clients.get(&address) {
            return Ok(client.clone());
        }

        debug!(peer = %address, port = self.port, "Creating peer API client");
        let client = Arc::new(PeerApiClient::new(address, self.port).map_err(
            benchpress_core::error::WorkloadError::from,
        )?);
        clients.insert(address, client.clone());
        Ok(client)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_address_returns_the_same_client() {
        let factory = CachingPeerClientFactory::default();
        let address: IpAddr = "10.0.0.2".parse().unwrap();

        let first = factory.get_or_create(address).unwrap();
        let second = factory.get_or_create(address).unwrap();

        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(factory.cached_count(), 1);
    }

    #[test]
    fn test_distinct_addresses_get_distinct_clients() {
        let factory = CachingPeerClientFactory::default();
        let first = factory.get_or_create("10.0.0.1".parse().unwrap()).unwrap();
        let second = factory.get_or_create("10.0.0.2".parse().unwrap()).unwrap();

        assert!(!Arc::ptr_eq(&first, &second));
        assert_eq!(factory.cached_count(), 2);
    }
}
