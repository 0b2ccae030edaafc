//! Relay Router — turns connection events into registry updates and forwards.

use std::sync::Arc;

use relay_protocol::{Envelope, RelayError};
use relay_transport::{ConnectionEvents, ConnectionHandle};
use tracing::{debug, error, warn};

use crate::registry::ConnectionRegistry;

/// The relay: registers connections and forwards envelope payloads.
///
/// Delivery is fire-and-forget. A sender is never told whether its
/// message reached anyone.
pub struct RelayServer {
    registry: Arc<ConnectionRegistry>,
    /// Called with every fault after it is logged
    fault_listener: Option<FaultListener>,
}

/// Observer for faults passed to `on_error`: connection id and error.
pub type FaultListener = Arc<dyn Fn(&str, &RelayError) + Send + Sync>;

impl RelayServer {
    pub fn new() -> Self {
        Self::with_registry(Arc::new(ConnectionRegistry::new()))
    }

    /// Build a relay around a registry the caller also holds.
    pub fn with_registry(registry: Arc<ConnectionRegistry>) -> Self {
        Self {
            registry,
            fault_listener: None,
        }
    }

    /// Observe faults in addition to the error log.
    pub fn set_fault_listener(&mut self, listener: FaultListener) {
        self.fault_listener = Some(listener);
    }

    pub fn registry(&self) -> &Arc<ConnectionRegistry> {
        &self.registry
    }

    /// Route one inbound frame. Returns whether a payload was handed to a
    /// destination handle.
    pub fn relay(&self, sender_id: &str, text: &str) -> bool {
        let envelope = match Envelope::parse(text) {
            Ok(Some(envelope)) => envelope,
            Ok(None) => return false,
            Err(e) => {
                warn!("Dropping frame from {sender_id}: {e}");
                return false;
            }
        };

        let Some(recipient) = envelope.recipient() else {
            debug!("Envelope from {sender_id} has no recipient");
            return false;
        };

        let Some(destination) = self.registry.lookup(recipient) else {
            debug!("Recipient {recipient} not connected; dropping frame from {sender_id}");
            return false;
        };

        // The sender built the bad envelope; blame its connection.
        let Some(payload) = envelope.payload() else {
            self.on_error(
                sender_id,
                &RelayError::MissingPayload {
                    recipient: recipient.to_string(),
                },
            );
            return false;
        };

        debug!("Forwarding {sender_id} -> {recipient}: {payload}");
        match destination.send_text(payload) {
            Ok(()) => true,
            Err(e) => {
                self.on_error(recipient, &e);
                false
            }
        }
    }
}

impl Default for RelayServer {
    fn default() -> Self {
        Self::new()
    }
}

impl ConnectionEvents for RelayServer {
    fn on_connect(&self, handle: Arc<dyn ConnectionHandle>) {
        let id = handle.id().to_string();
        self.registry.add(id, handle);
    }

    fn on_disconnect(&self, id: &str) {
        self.registry.remove(id);
    }

    fn on_message(&self, sender_id: &str, text: &str) {
        debug!("Received from {sender_id}: {text}");
        self.relay(sender_id, text);
    }

    // Log only. Deregistration happens in `on_disconnect`, which the
    // transport emits for every connection it tears down.
    fn on_error(&self, id: &str, error: &RelayError) {
        error!("Error on connection {id}: {error}");
        if let Some(listener) = &self.fault_listener {
            listener(id, error);
        }
    }

    fn live_count(&self) -> i64 {
        self.registry.count()
    }
}
