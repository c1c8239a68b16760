//! Logical-channel routing over UDP ports.
//!
//! A [`Router`] decouples the integer channels producers and consumers talk
//! about from the physical UDP ports datagrams travel on. Attaching a port to
//! a channel spawns one receive loop per port; inbound values fan into every
//! channel attached to the port, and outbound writes fan out to every
//! destination attached to the channel.
//!
//! Best-effort by design: no retransmission, no cross-channel ordering, no
//! back-pressure on the per-channel queues.

pub mod config;
pub mod error;
pub mod router;
mod rx;

pub use config::{RouterConfig, DEFAULT_MAX_PACKET_SIZE, DEFAULT_RECV_TIMEOUT};
pub use error::{Result, RouterError};
pub use router::{Router, DEFAULT_CHANNEL};
