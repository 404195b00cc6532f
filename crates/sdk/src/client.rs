//! Peer API Client Implementation

use std::net::IpAddr;
use std::time::Duration;

use async_trait::async_trait;
use jsonrpsee::core::client::ClientT;
use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use jsonrpsee::rpc_params;
use tracing::debug;

use benchpress_core::domain::Role;
use benchpress_core::port::PeerClient;

use crate::error::{Result, SdkError};
use crate::types::{Ack, NotifyExitRequest, NotifyReadyRequest};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// JSON-RPC client for one peer instance.
///
/// Obtain instances through the `CachingPeerClientFactory` so that every
/// caller talking to the same address shares one client.
pub struct PeerApiClient {
    client: HttpClient,
    address: IpAddr,
}

impl PeerApiClient {
    /// Build a client for the peer agent at `address:port`.
    pub fn new(address: IpAddr, port: u16) -> Result<Self> {
        let url = format!("http://{address}:{port}");
        let client = HttpClientBuilder::default()
            .request_timeout(REQUEST_TIMEOUT)
            .build(&url)
            .map_err(|e| SdkError::Connection(format!("Failed to create client: {e}")))?;

        Ok(Self { client, address })
    }

    pub fn address(&self) -> IpAddr {
        self.address
    }
}

#[async_trait]
impl PeerClient for PeerApiClient {
    async fn notify_ready(&self, role: Role) -> benchpress_core::error::Result<()> {
        debug!(peer = %self.address, role = %role, "Sending readiness notification");

        let request = NotifyReadyRequest { role };
        let _ack: Ack = self
            .client
            .request("peer.notifyReady.v1", rpc_params![request])
            .await
            .map_err(SdkError::from)?;

        Ok(())
    }

    async fn notify_exit(&self, reason: &str) -> benchpress_core::error::Result<()> {
        debug!(peer = %self.address, reason = %reason, "Sending exit notification");

        let request = NotifyExitRequest {
            reason: reason.to_string(),
        };
        let _ack: Ack = self
            .client
            .request("peer.notifyExit.v1", rpc_params![request])
            .await
            .map_err(SdkError::from)?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builds_for_any_address() {
        let client = PeerApiClient::new("10.0.0.2".parse().unwrap(), 9560).unwrap();
        assert_eq!(client.address(), "10.0.0.2".parse::<IpAddr>().unwrap());
    }
}
