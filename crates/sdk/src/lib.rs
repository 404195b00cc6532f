//! Benchpress Peer SDK
//!
//! Client side of the peer coordination interface: role instances exchange
//! readiness/exit signals over JSON-RPC. The server side lives in the peer
//! agent process and is not part of this crate.

mod client;
mod error;
mod factory;
mod types;

pub use client::PeerApiClient;
pub use error::{Result, SdkError};
pub use factory::CachingPeerClientFactory;
pub use types::{Ack, NotifyExitRequest, NotifyReadyRequest};

/// Default port the peer coordination API listens on.
pub const DEFAULT_PEER_API_PORT: u16 = 9560;
