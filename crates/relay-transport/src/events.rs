//! The seam between the transport and whatever routes its traffic.

use std::sync::Arc;

use relay_protocol::{RelayError, RelayResult};

/// A live, writable reference to one open connection.
pub trait ConnectionHandle: Send + Sync + 'static {
    /// Identifier assigned by the transport; unique while the connection lives.
    fn id(&self) -> &str;

    /// Queue a text frame. Fails once the connection can no longer be written.
    fn send_text(&self, text: &str) -> RelayResult<()>;
}

/// Lifecycle callbacks driven by a transport.
///
/// Callbacks for different connections run concurrently, so implementations
/// must be safe to call from many tasks at once. None of them may block on
/// the network: writes go through [`ConnectionHandle::send_text`].
pub trait ConnectionEvents: Send + Sync + 'static {
    /// A connection was established and can now receive frames.
    fn on_connect(&self, handle: Arc<dyn ConnectionHandle>);

    /// The connection is gone. Emitted exactly once per connection.
    fn on_disconnect(&self, id: &str);

    /// A text frame arrived from `sender_id`.
    fn on_message(&self, sender_id: &str, text: &str);

    /// A fault was observed on connection `id`. Does not imply disconnect.
    fn on_error(&self, id: &str, error: &RelayError);

    /// Number of connections currently tracked, reported on `/health`.
    fn live_count(&self) -> i64;
}
