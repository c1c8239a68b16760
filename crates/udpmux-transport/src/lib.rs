//! UDP datagram endpoint for udpmux.
//!
//! Provides the transport primitive the routing layer is built on:
//! bind-to-port, timed receive returning `(len, sender)`, and send-to.
//! The receive timeout is what lets receive loops poll a shutdown flag
//! without blocking indefinitely.

pub mod endpoint;
pub mod error;

pub use endpoint::UdpEndpoint;
pub use error::{Result, TransportError};
