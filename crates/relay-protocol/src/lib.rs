//! Relay Protocol Types
//!
//! Wire types shared by the transport and the relay handlers.
//! Clients send an [`Envelope`] naming a recipient; the relay forwards the
//! envelope's payload to that recipient as a bare text frame.

pub mod envelope;
pub mod error;

pub use envelope::{Envelope, Welcome};
pub use error::{RelayError, RelayResult};
