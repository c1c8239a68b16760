/// Errors that can occur during value encoding/decoding.
#[derive(Debug, thiserror::Error)]
pub enum CodecError {
    /// The encoded size would exceed the caller-supplied capacity.
    #[error("encoded value too large ({size} bytes, max {max})")]
    Overflow { size: usize, max: usize },

    /// A string's byte length does not fit the u16 length prefix.
    #[error("string too long ({len} bytes, max {max})")]
    StringTooLong { len: usize, max: usize },

    /// An array's element count does not fit the u16 count prefix.
    #[error("array too long ({len} elements, max {max})")]
    ArrayTooLong { len: usize, max: usize },

    /// The input begins with a type tag that matches no known type.
    #[error("unknown type tag 0x{0:02x}")]
    UnknownTag(u8),

    /// The input ended before the declared value was complete.
    #[error("truncated input ({needed} more bytes needed)")]
    Truncated { needed: usize },

    /// Bytes remained after the single top-level value was parsed.
    #[error("{0} trailing bytes after value")]
    TrailingBytes(usize),

    /// A decoded string payload was not valid UTF-8.
    #[error("string payload is not valid UTF-8")]
    InvalidUtf8(#[from] std::str::Utf8Error),
}

pub type Result<T> = std::result::Result<T, CodecError>;
