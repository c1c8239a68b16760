use std::net::SocketAddr;

use udpmux_transport::TransportError;
use udpmux_value::CodecError;

/// Errors that can occur in router operations.
#[derive(Debug, thiserror::Error)]
pub enum RouterError {
    /// Transport-level error (bind on attach, loop spawn).
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// Value encoding failed before any network action.
    #[error("codec error: {0}")]
    Codec(#[from] CodecError),

    /// One or more destinations in a fan-out send failed.
    ///
    /// Every destination is attempted regardless; the failures are collected
    /// here so a partial fan-out is never silently swallowed.
    #[error("send failed to {} of {attempted} destinations", .failed.len())]
    Send {
        attempted: usize,
        failed: Vec<(SocketAddr, TransportError)>,
    },
}

pub type Result<T> = std::result::Result<T, RouterError>;
