//! Fake connection handles for handler tests.

use std::sync::Arc;

use parking_lot::Mutex;
use relay_protocol::{RelayError, RelayResult};
use relay_transport::ConnectionHandle;

/// Records every frame it is asked to send.
pub(crate) struct RecordingHandle {
    id: String,
    sent: Mutex<Vec<String>>,
    closed: bool,
}

impl RecordingHandle {
    pub(crate) fn new(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            sent: Mutex::new(Vec::new()),
            closed: false,
        })
    }

    /// A handle whose writes always fail, as after the peer went away.
    pub(crate) fn closed(id: &str) -> Arc<Self> {
        Arc::new(Self {
            id: id.into(),
            sent: Mutex::new(Vec::new()),
            closed: true,
        })
    }

    pub(crate) fn sent(&self) -> Vec<String> {
        self.sent.lock().clone()
    }
}

impl ConnectionHandle for RecordingHandle {
    fn id(&self) -> &str {
        &self.id
    }

    fn send_text(&self, text: &str) -> RelayResult<()> {
        if self.closed {
            return Err(RelayError::ConnectionClosed { id: self.id.clone() });
        }
        self.sent.lock().push(text.to_string());
        Ok(())
    }
}
