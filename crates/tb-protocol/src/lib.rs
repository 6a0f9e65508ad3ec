//! tb-protocol: Wire codec for the toxicblend geometry service
//!
//! This crate defines the binary framing used between a modelling host and
//! the external geometry processing server. A request carries a command
//! identifier, a property bag of string pairs and zero or more meshes; the
//! response is a stream of meshes closed by an end marker.
//!
//! Every variable-length field is preceded by a big-endian `u32` length, so
//! neither end ever scans for delimiters.

pub mod codec;
pub mod error;
pub mod mesh;
pub mod message;
pub mod property;
pub mod stream;
mod wire;

pub use codec::{encode_request, encode_request_parts, RequestCodec, ResponseCodec};
pub use error::{DecodingError, EncodingError};
pub use mesh::{MeshRecord, Vertex};
pub use message::{ItemTag, Request, ResponseItem, PROTOCOL_VERSION};
pub use property::PropertyBag;
pub use stream::{decode_response, MeshStream};
pub use wire::{MAX_FACE_ARITY, MAX_MESHES_PER_REQUEST, MAX_STRING_LEN, MAX_VERTICES, MIN_FACE_ARITY};
