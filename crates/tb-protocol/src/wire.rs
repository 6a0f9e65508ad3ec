//! Primitive field encoding shared by every message
//!
//! - integers: big-endian
//! - strings: `u32` byte length followed by UTF-8 bytes
//! - coordinates: `f32`, big-endian

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{DecodingError, EncodingError};

/// Maximum length of any string field (16 MiB)
pub const MAX_STRING_LEN: usize = 16 * 1024 * 1024;

/// Maximum vertex count of one mesh record.
///
/// The server indexes vertices with signed 32-bit integers; a full
/// 46338 x 46338 calculation grid stays below this.
pub const MAX_VERTICES: usize = i32::MAX as usize;

/// Smallest face on the wire: a two-index face is a loose edge
pub const MIN_FACE_ARITY: usize = 2;

/// Largest face on the wire
pub const MAX_FACE_ARITY: usize = u16::MAX as usize;

/// The mesh count of a request is a single byte
pub const MAX_MESHES_PER_REQUEST: usize = u8::MAX as usize;

pub(crate) const MAX_COUNT: usize = u32::MAX as usize;

/// Write a length-prefixed UTF-8 string
pub(crate) fn put_string(
    dst: &mut BytesMut,
    field: &'static str,
    value: &str,
) -> Result<(), EncodingError> {
    let len = value.len();
    if len > MAX_STRING_LEN {
        return Err(EncodingError::StringTooLong {
            field,
            len,
            max: MAX_STRING_LEN,
        });
    }
    dst.reserve(4 + len);
    dst.put_u32(len as u32);
    dst.put_slice(value.as_bytes());
    Ok(())
}

/// Write a `u32` count, rejecting values above `max`
pub(crate) fn put_count(
    dst: &mut BytesMut,
    field: &'static str,
    count: usize,
    max: usize,
) -> Result<(), EncodingError> {
    let max = max.min(MAX_COUNT);
    if count > max {
        return Err(EncodingError::CountOverflow { field, count, max });
    }
    let value = u32::try_from(count).map_err(|_| EncodingError::CountOverflow {
        field,
        count,
        max,
    })?;
    dst.put_u32(value);
    Ok(())
}

/// Failure while reading a field from a buffer that may still be filling
#[derive(Debug)]
pub(crate) enum ReadError {
    /// At least `missing` more bytes are needed before the field can be read
    Incomplete { missing: usize },
    /// The bytes are present but malformed
    Invalid(DecodingError),
}

impl From<DecodingError> for ReadError {
    fn from(err: DecodingError) -> Self {
        ReadError::Invalid(err)
    }
}

impl ReadError {
    /// Raise the missing-byte count of an `Incomplete` error by `extra`
    pub(crate) fn needing(self, extra: usize) -> Self {
        match self {
            ReadError::Incomplete { missing } => ReadError::Incomplete {
                missing: missing.saturating_add(extra),
            },
            invalid => invalid,
        }
    }
}

pub(crate) type ReadResult<T> = Result<T, ReadError>;

pub(crate) fn ensure(src: &[u8], needed: usize) -> ReadResult<()> {
    if src.len() < needed {
        return Err(ReadError::Incomplete {
            missing: needed - src.len(),
        });
    }
    Ok(())
}

pub(crate) fn get_u8(src: &mut &[u8]) -> ReadResult<u8> {
    ensure(src, 1)?;
    Ok(src.get_u8())
}

pub(crate) fn get_u32(src: &mut &[u8]) -> ReadResult<u32> {
    ensure(src, 4)?;
    Ok(src.get_u32())
}

/// Read a `u32` count, rejecting values above `max`
pub(crate) fn get_count(src: &mut &[u8], field: &'static str, max: usize) -> ReadResult<usize> {
    let value = get_u32(src)?;
    if value as usize > max {
        return Err(DecodingError::LengthTooLarge {
            field,
            value: u64::from(value),
            max: max as u64,
        }
        .into());
    }
    Ok(value as usize)
}

/// Read a length-prefixed UTF-8 string
pub(crate) fn get_string(src: &mut &[u8], field: &'static str) -> ReadResult<String> {
    let len = get_count(src, field, MAX_STRING_LEN)?;
    ensure(src, len)?;
    let value = std::str::from_utf8(&src[..len])
        .map_err(|source| DecodingError::InvalidUtf8 { field, source })?
        .to_owned();
    src.advance(len);
    Ok(value)
}

/// Run `parse` against the front of `src`, consuming what it read only on
/// success
pub(crate) fn take<T>(
    src: &mut BytesMut,
    parse: impl FnOnce(&mut &[u8]) -> ReadResult<T>,
) -> ReadResult<T> {
    let mut cursor: &[u8] = &src[..];
    let item = parse(&mut cursor)?;
    let consumed = src.len() - cursor.len();
    src.advance(consumed);
    Ok(item)
}

/// Run `parse` against the buffered bytes, consuming them only on success.
///
/// `pending` remembers how many bytes the last incomplete attempt needed, so
/// a large item is not re-parsed on every small read.
pub(crate) fn decode_buffered<T>(
    pending: &mut Option<usize>,
    src: &mut BytesMut,
    parse: impl FnOnce(&mut &[u8]) -> ReadResult<T>,
) -> Result<Option<T>, DecodingError> {
    if let Some(needed) = *pending {
        if src.len() < needed {
            return Ok(None);
        }
    }

    match take(src, parse) {
        Ok(item) => {
            *pending = None;
            Ok(Some(item))
        }
        Err(ReadError::Incomplete { missing }) => {
            *pending = Some(src.len() + missing);
            Ok(None)
        }
        Err(ReadError::Invalid(err)) => {
            *pending = None;
            Err(err)
        }
    }
}
