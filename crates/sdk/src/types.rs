//! Peer coordination request/response types

use serde::{Deserialize, Serialize};

use benchpress_core::domain::Role;

/// Sent when an instance has finished its setup and is ready for the
/// peer to proceed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyReadyRequest {
    pub role: Role,
}

/// Sent when an instance is exiting, with the reason.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NotifyExitRequest {
    pub reason: String,
}

/// Generic acknowledgement returned by the peer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Ack {
    pub acknowledged: bool,
}
