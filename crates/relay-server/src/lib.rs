//! Relay Server — tracks live connections and forwards envelopes.
//!
//! `RelayServer` is the `ConnectionEvents` implementation the transport
//! drives. It owns a `ConnectionRegistry`; nothing here is global.

pub mod registry;
pub mod router;

pub use registry::ConnectionRegistry;
pub use router::{FaultListener, RelayServer};

#[cfg(test)]
pub(crate) mod testing;
