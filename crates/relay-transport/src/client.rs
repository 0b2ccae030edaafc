//! Per-connection handle backed by a bounded outbound frame queue.

use std::time::{Duration, Instant};

use axum::extract::ws::Message;
use relay_protocol::{RelayError, RelayResult};
use tokio::sync::mpsc::{self, error::TrySendError};

use crate::events::ConnectionHandle;

/// Default outbound queue depth per connection.
pub const OUTBOUND_BUFFER_SIZE: usize = 1000;

/// A connected WebSocket client.
///
/// Frames are pushed onto a bounded queue that the connection's writer
/// task drains. Sending never waits on the socket: when a slow reader has
/// let the queue fill up, the frame is dropped and `QueueFull` returned.
#[derive(Debug)]
pub struct WsConnection {
    /// Unique client ID
    id: String,
    /// When the client connected
    connected_at: Instant,
    /// Outbound frames, drained by the writer task
    tx: mpsc::Sender<Message>,
}

impl WsConnection {
    pub fn new(id: String, tx: mpsc::Sender<Message>) -> Self {
        Self {
            id,
            connected_at: Instant::now(),
            tx,
        }
    }

    /// Queue any frame, e.g. a pong.
    pub fn send_frame(&self, frame: Message) -> RelayResult<()> {
        self.tx.try_send(frame).map_err(|e| match e {
            TrySendError::Full(_) => RelayError::QueueFull { id: self.id.clone() },
            TrySendError::Closed(_) => RelayError::ConnectionClosed { id: self.id.clone() },
        })
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    pub fn uptime(&self) -> Duration {
        self.connected_at.elapsed()
    }
}

impl ConnectionHandle for WsConnection {
    fn id(&self) -> &str {
        &self.id
    }

    fn send_text(&self, text: &str) -> RelayResult<()> {
        self.send_frame(Message::Text(text.to_owned().into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_frames_are_queued_in_order() {
        let (tx, mut rx) = mpsc::channel(OUTBOUND_BUFFER_SIZE);
        let conn = WsConnection::new("a".into(), tx);

        conn.send_text("one").unwrap();
        conn.send_text("two").unwrap();

        match rx.try_recv().unwrap() {
            Message::Text(t) => assert_eq!(t.as_str(), "one"),
            other => panic!("unexpected frame: {other:?}"),
        }
        match rx.try_recv().unwrap() {
            Message::Text(t) => assert_eq!(t.as_str(), "two"),
            other => panic!("unexpected frame: {other:?}"),
        }
    }

    #[test]
    fn stalled_writer_caps_queued_frames() {
        let (tx, mut rx) = mpsc::channel(4);
        let conn = WsConnection::new("slow".into(), tx);
        let frame = "x".repeat(1024);

        let mut queued = 0;
        let mut dropped = 0;
        for _ in 0..1000 {
            match conn.send_text(&frame) {
                Ok(()) => queued += 1,
                Err(RelayError::QueueFull { ref id }) if id == "slow" => dropped += 1,
                Err(e) => panic!("unexpected error: {e}"),
            }
        }
        assert_eq!(queued, 4);
        assert_eq!(dropped, 996);

        // Draining one slot lets the next frame through.
        rx.try_recv().unwrap();
        conn.send_text("after drain").unwrap();
    }

    #[test]
    fn send_after_writer_stops_fails() {
        let (tx, rx) = mpsc::channel(OUTBOUND_BUFFER_SIZE);
        let conn = WsConnection::new("gone".into(), tx);
        drop(rx);

        assert!(conn.is_closed());
        let err = conn.send_text("hi").unwrap_err();
        assert!(matches!(err, RelayError::ConnectionClosed { ref id } if id == "gone"));
    }
}
