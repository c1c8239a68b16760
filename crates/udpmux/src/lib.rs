//! Logical-channel multiplexing over UDP with a tagged-value wire format.
//!
//! udpmux lets independent producers and consumers exchange typed values over
//! many physical UDP ports while addressing each other through small integer
//! channel identifiers decoupled from port numbers.
//!
//! # Crate Structure
//!
//! - [`transport`] — UDP endpoint primitive (bind, timed receive, send-to)
//! - [`value`] — Tagged-value sum type and binary codec
//! - [`router`] — Channel routing engine (behind the `router` feature)

/// Re-export transport types.
pub mod transport {
    pub use udpmux_transport::*;
}

/// Re-export value and codec types.
pub mod value {
    pub use udpmux_value::*;
}

/// Re-export router types (requires `router` feature).
#[cfg(feature = "router")]
pub mod router {
    pub use udpmux_router::*;
}
