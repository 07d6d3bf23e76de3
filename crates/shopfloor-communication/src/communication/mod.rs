//! Transport implementations
//!
//! - [`mqtt`]: broker link, report ingestion and the publish side
//! - [`dispatch`]: operator intent to wire command mapping
//! - [`direct`]: transient synchronous line channel to one machine
//! - [`cloud`]: best-effort periodic status push to an HTTP endpoint
//! - [`topics`]: the bus topic grammar

pub mod cloud;
pub mod direct;
pub mod dispatch;
pub mod mqtt;
pub mod topics;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Externally observable connectivity signal for a transport
///
/// Consumers (status indicators, the dispatcher's pre-flight check) read it;
/// only the owning transport task writes it. Reconnection is the transport's
/// responsibility — observers never retry on its behalf.
#[derive(Debug, Clone, Default)]
pub struct ConnectionStatus {
    connected: Arc<AtomicBool>,
}

impl ConnectionStatus {
    /// Create a status that starts disconnected
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the transport currently considers itself connected
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }
}
