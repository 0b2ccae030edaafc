//! Relay Transport Layer
//!
//! Provides the WebSocket endpoint clients connect to. The transport handles:
//! - HTTP upgrade and connection-id assignment
//! - A bounded per-connection outbound queue drained by a writer task
//! - Ping/pong and close frames
//! - Lifecycle events (connect, message, disconnect, error)
//!
//! Routing lives elsewhere: the transport only drives a `ConnectionEvents`
//! implementation and hands it `ConnectionHandle`s to write to.

pub mod client;
pub mod events;
pub mod server;

pub use client::{OUTBOUND_BUFFER_SIZE, WsConnection};
pub use events::{ConnectionEvents, ConnectionHandle};
pub use server::{TransportConfig, TransportServer};
