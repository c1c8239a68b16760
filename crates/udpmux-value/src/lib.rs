//! Self-describing tagged-value wire format for UDP channel multiplexing.
//!
//! Every value is encoded as a one-byte type tag followed by a type-specific
//! payload, all multi-byte integers little-endian. Arrays nest recursively
//! with no subtree-length field, so decoding is strictly sequential.
//!
//! Decoding is strict: a buffer must contain exactly one well-formed value
//! with zero trailing bytes. Over an unverified datagram transport this
//! doubles as a cheap truncation/corruption check.

pub mod codec;
pub mod error;
pub mod value;

pub use codec::{decode, encode, encoded_len};
pub use error::{CodecError, Result};
pub use value::Value;
