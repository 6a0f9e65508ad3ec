//! Core error types for toxicblend
//!
//! Each message names the step that failed. The underlying cause is not
//! repeated in the message; it is available through `source()`, so a
//! formatter that walks the chain prints every part exactly once.

use std::path::PathBuf;

use tb_protocol::{DecodingError, EncodingError};
use thiserror::Error;

/// Top-level error type for a toxicblend exchange
#[derive(Error, Debug)]
pub enum ToxicblendError {
    /// Connection error
    #[error(transparent)]
    Connection(#[from] ConnectionError),

    /// Transmission error
    #[error(transparent)]
    Transmission(#[from] TransmissionError),

    /// Reception error
    #[error(transparent)]
    Reception(#[from] ReceptionError),

    /// Mesh adapter error
    #[error(transparent)]
    Adapter(#[from] AdapterError),

    /// Configuration error
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// Operator parameter out of its documented range
    #[error("Property {property} = {value} is outside [{min}, {max}]")]
    InvalidProperty {
        property: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },

    /// Operator needs an object but none was given
    #[error("Operator {0} requires an active object")]
    MissingObject(String),

    /// I/O error
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Errors establishing the transport
#[derive(Error, Debug)]
pub enum ConnectionError {
    /// Host name could not be resolved
    #[error("Failed to resolve {address}")]
    Resolve {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Resolution succeeded but produced no addresses
    #[error("No address found for {0}")]
    NoAddress(String),

    /// Host unreachable or port refused
    #[error("Failed to connect to {address} (is the toxicblend server running?)")]
    Connect {
        address: String,
        #[source]
        source: std::io::Error,
    },

    /// Socket options could not be applied
    #[error("Failed to configure socket")]
    Socket(#[source] std::io::Error),
}

/// Errors while sending a request
#[derive(Error, Debug)]
pub enum TransmissionError {
    /// Request could not be encoded; nothing was written
    #[error("Failed to encode request")]
    Encoding(#[from] EncodingError),

    /// Socket write failed part way
    #[error("Failed to write request")]
    Write(#[from] std::io::Error),

    /// Previous response has not been received yet
    #[error("A response is still pending; receive it before sending again")]
    OutOfSequence,

    /// Session already closed
    #[error("Session is closed")]
    Closed,
}

/// Errors while receiving a response
#[derive(Error, Debug)]
pub enum ReceptionError {
    /// Read failure or malformed response
    #[error(transparent)]
    Decoding(#[from] DecodingError),

    /// Nothing was sent, so no response can arrive
    #[error("No request has been sent on this session")]
    NothingSent,

    /// Session already closed
    #[error("Session is closed")]
    Closed,
}

/// Host meshes the wire format cannot express
#[derive(Error, Debug, PartialEq)]
pub enum AdapterError {
    /// Mesh has more vertices than the wire allows
    #[error("mesh has {count} vertices, maximum is {max}")]
    TooManyVertices { count: usize, max: usize },

    /// An edge or polygon references a missing vertex
    #[error("{element} {position} references vertex {index} but mesh has {vertex_count} vertices")]
    IndexOutOfRange {
        element: &'static str,
        position: usize,
        index: usize,
        vertex_count: usize,
    },

    /// Polygon corner count outside the supported range
    #[error("polygon {polygon} has {corners} corners, expected between {min} and {max}")]
    InvalidPolygon {
        polygon: usize,
        corners: usize,
        min: usize,
        max: usize,
    },

    /// Edge whose two ends are the same vertex
    #[error("edge {edge} connects vertex {vertex} to itself")]
    DegenerateEdge { edge: usize, vertex: usize },

    /// NaN or infinite coordinate
    #[error("vertex {vertex} has a non-finite coordinate")]
    NonFiniteCoordinate { vertex: usize },
}

/// Configuration-related errors
#[derive(Error, Debug)]
pub enum ConfigError {
    /// Config file not found
    #[error("Config file not found: {0}")]
    NotFound(PathBuf),

    /// Invalid configuration
    #[error("Invalid config: {0}")]
    Invalid(String),

    /// TOML parse error
    #[error("Failed to parse TOML")]
    Parse(#[from] toml::de::Error),

    /// TOML serialize error
    #[error("Failed to serialize TOML")]
    Serialize(#[from] toml::ser::Error),
}
