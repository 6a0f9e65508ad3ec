//! Codec error types

use thiserror::Error;

/// Errors raised while turning values into wire bytes.
///
/// Encoding happens before anything touches the socket, so one of these
/// always means nothing was transmitted.
#[derive(Error, Debug)]
pub enum EncodingError {
    /// A string does not fit the length prefix limit
    #[error("{field} is {len} bytes, exceeds maximum of {max} bytes")]
    StringTooLong {
        field: &'static str,
        len: usize,
        max: usize,
    },

    /// A count does not fit its wire field
    #[error("{field} count {count} exceeds maximum of {max}")]
    CountOverflow {
        field: &'static str,
        count: usize,
        max: usize,
    },

    /// A face references a vertex the record does not contain
    #[error("face {face} references vertex {index} but mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    /// A face has too few or too many corners
    #[error("face {face} has {arity} indices, expected between {min} and {max}")]
    InvalidArity {
        face: usize,
        arity: usize,
        min: usize,
        max: usize,
    },

    /// I/O error from a framed transport
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors raised while reading wire bytes.
///
/// A decoding error is always fatal to the exchange: records after a bad one
/// are never delivered.
#[derive(Error, Debug)]
pub enum DecodingError {
    /// Stream ended inside an item
    #[error("Truncated stream: expected at least {expected} bytes, got {actual}")]
    Truncated { expected: usize, actual: usize },

    /// Stream ended cleanly but without the end marker
    #[error("Stream closed before the end-of-response marker")]
    MissingEndMarker,

    /// A length or count prefix is larger than the protocol allows
    #[error("Malformed {field} prefix: {value} exceeds maximum of {max}")]
    LengthTooLarge {
        field: &'static str,
        value: u64,
        max: u64,
    },

    /// A face references a vertex the record does not contain
    #[error("face {face} references vertex {index} but mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        face: usize,
        index: u32,
        vertex_count: usize,
    },

    /// A face has too few corners
    #[error("face {face} has {arity} indices, expected at least {min}")]
    InvalidArity {
        face: usize,
        arity: usize,
        min: usize,
    },

    /// A string field is not UTF-8
    #[error("{field} is not valid UTF-8")]
    InvalidUtf8 {
        field: &'static str,
        #[source]
        source: std::str::Utf8Error,
    },

    /// The same property key appears twice in one bag
    #[error("Duplicate property key: {0}")]
    DuplicateKey(String),

    /// Unknown response item tag
    #[error("Unknown response item tag: 0x{0:02x}")]
    UnknownTag(u8),

    /// The server answered with an error item instead of geometry
    #[error("Server error: {0}")]
    Remote(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}
