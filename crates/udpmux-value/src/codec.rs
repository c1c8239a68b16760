use bytes::{BufMut, Bytes, BytesMut};

use crate::error::{CodecError, Result};
use crate::value::Value;

/// Type tags, one byte each. Booleans are encoded purely by tag.
pub const TAG_NULL: u8 = 0;
pub const TAG_TRUE: u8 = 1;
pub const TAG_FALSE: u8 = 2;
pub const TAG_STRING: u8 = 3;
pub const TAG_ARRAY: u8 = 4;
pub const TAG_INT8: u8 = 5;
pub const TAG_INT16: u8 = 6;
pub const TAG_INT32: u8 = 7;
pub const TAG_INT64: u8 = 8;
pub const TAG_UINT8: u8 = 9;
pub const TAG_UINT16: u8 = 10;
pub const TAG_UINT32: u8 = 11;
pub const TAG_UINT64: u8 = 12;

/// Maximum string byte length / array element count (u16 prefix).
pub const MAX_SEQUENCE_LEN: usize = u16::MAX as usize;

/// The exact serialized size of a value in bytes.
pub fn encoded_len(value: &Value) -> usize {
    match value {
        Value::Null | Value::Bool(_) => 1,
        Value::String(s) => 1 + 2 + s.len(),
        Value::Array(items) => 1 + 2 + items.iter().map(encoded_len).sum::<usize>(),
        Value::Int8(_) | Value::UInt8(_) => 1 + 1,
        Value::Int16(_) | Value::UInt16(_) => 1 + 2,
        Value::Int32(_) | Value::UInt32(_) => 1 + 4,
        Value::Int64(_) | Value::UInt64(_) => 1 + 8,
    }
}

/// Encode a value into its wire form.
///
/// Wire format, all multi-byte integers little-endian:
/// ```text
/// ┌──────────┬───────────────────────────────────────────────┐
/// │ Tag (1B) │ Payload                                       │
/// ├──────────┼───────────────────────────────────────────────┤
/// │ NULL     │ none                                          │
/// │ TRUE     │ none                                          │
/// │ FALSE    │ none                                          │
/// │ STRING   │ u16 byte length N, then N raw bytes           │
/// │ ARRAY    │ u16 count N, then N recursively encoded values│
/// │ INT*     │ two's-complement integer, width-matched       │
/// │ UINT*    │ raw integer, same widths                      │
/// └──────────┴───────────────────────────────────────────────┘
/// ```
///
/// Values are written depth-first, pre-order. Arrays carry no subtree-length
/// field, so a decoder must parse each child to find where the next starts.
///
/// Fails with [`CodecError::Overflow`] if the serialized size would exceed
/// `capacity`, before any bytes are produced.
pub fn encode(value: &Value, capacity: usize) -> Result<Bytes> {
    let size = encoded_len(value);
    if size > capacity {
        return Err(CodecError::Overflow {
            size,
            max: capacity,
        });
    }
    let mut buf = BytesMut::with_capacity(size);
    write_value(value, &mut buf)?;
    Ok(buf.freeze())
}

fn write_value(value: &Value, buf: &mut BytesMut) -> Result<()> {
    match value {
        Value::Null => buf.put_u8(TAG_NULL),
        Value::Bool(true) => buf.put_u8(TAG_TRUE),
        Value::Bool(false) => buf.put_u8(TAG_FALSE),
        Value::String(s) => {
            if s.len() > MAX_SEQUENCE_LEN {
                return Err(CodecError::StringTooLong {
                    len: s.len(),
                    max: MAX_SEQUENCE_LEN,
                });
            }
            buf.put_u8(TAG_STRING);
            buf.put_u16_le(s.len() as u16);
            buf.put_slice(s.as_bytes());
        }
        Value::Array(items) => {
            if items.len() > MAX_SEQUENCE_LEN {
                return Err(CodecError::ArrayTooLong {
                    len: items.len(),
                    max: MAX_SEQUENCE_LEN,
                });
            }
            buf.put_u8(TAG_ARRAY);
            buf.put_u16_le(items.len() as u16);
            for item in items {
                write_value(item, buf)?;
            }
        }
        Value::Int8(v) => {
            buf.put_u8(TAG_INT8);
            buf.put_i8(*v);
        }
        Value::Int16(v) => {
            buf.put_u8(TAG_INT16);
            buf.put_i16_le(*v);
        }
        Value::Int32(v) => {
            buf.put_u8(TAG_INT32);
            buf.put_i32_le(*v);
        }
        Value::Int64(v) => {
            buf.put_u8(TAG_INT64);
            buf.put_i64_le(*v);
        }
        Value::UInt8(v) => {
            buf.put_u8(TAG_UINT8);
            buf.put_u8(*v);
        }
        Value::UInt16(v) => {
            buf.put_u8(TAG_UINT16);
            buf.put_u16_le(*v);
        }
        Value::UInt32(v) => {
            buf.put_u8(TAG_UINT32);
            buf.put_u32_le(*v);
        }
        Value::UInt64(v) => {
            buf.put_u8(TAG_UINT64);
            buf.put_u64_le(*v);
        }
    }
    Ok(())
}

/// Decode exactly one value from `input`.
///
/// Strict consumption: the input must contain one well-formed value and
/// nothing else. Unknown tags, truncated payloads, and trailing bytes all
/// fail. Empty input fails with [`CodecError::Truncated`].
pub fn decode(input: &[u8]) -> Result<Value> {
    let mut cursor = input;
    let value = read_value(&mut cursor)?;
    if !cursor.is_empty() {
        return Err(CodecError::TrailingBytes(cursor.len()));
    }
    Ok(value)
}

fn read_value(input: &mut &[u8]) -> Result<Value> {
    let tag = take(input, 1)?[0];
    match tag {
        TAG_NULL => Ok(Value::Null),
        TAG_TRUE => Ok(Value::Bool(true)),
        TAG_FALSE => Ok(Value::Bool(false)),
        TAG_STRING => {
            let len = read_u16(input)? as usize;
            let raw = take(input, len)?;
            let text = std::str::from_utf8(raw)?;
            Ok(Value::String(text.to_string()))
        }
        TAG_ARRAY => {
            let count = read_u16(input)? as usize;
            let mut items = Vec::with_capacity(count.min(64));
            for _ in 0..count {
                items.push(read_value(input)?);
            }
            Ok(Value::Array(items))
        }
        TAG_INT8 => Ok(Value::Int8(take(input, 1)?[0] as i8)),
        TAG_INT16 => Ok(Value::Int16(i16::from_le_bytes(
            take(input, 2)?.try_into().unwrap(),
        ))),
        TAG_INT32 => Ok(Value::Int32(i32::from_le_bytes(
            take(input, 4)?.try_into().unwrap(),
        ))),
        TAG_INT64 => Ok(Value::Int64(i64::from_le_bytes(
            take(input, 8)?.try_into().unwrap(),
        ))),
        TAG_UINT8 => Ok(Value::UInt8(take(input, 1)?[0])),
        TAG_UINT16 => Ok(Value::UInt16(read_u16(input)?)),
        TAG_UINT32 => Ok(Value::UInt32(u32::from_le_bytes(
            take(input, 4)?.try_into().unwrap(),
        ))),
        TAG_UINT64 => Ok(Value::UInt64(u64::from_le_bytes(
            take(input, 8)?.try_into().unwrap(),
        ))),
        other => Err(CodecError::UnknownTag(other)),
    }
}

fn take<'a>(input: &mut &'a [u8], n: usize) -> Result<&'a [u8]> {
    if input.len() < n {
        return Err(CodecError::Truncated {
            needed: n - input.len(),
        });
    }
    let (head, tail) = input.split_at(n);
    *input = tail;
    Ok(head)
}

fn read_u16(input: &mut &[u8]) -> Result<u16> {
    Ok(u16::from_le_bytes(take(input, 2)?.try_into().unwrap()))
}
