//! Codecs for requests and response items
//!
//! Both codecs implement the `tokio_util` [`Encoder`]/[`Decoder`] traits, so
//! they serve a blocking client (fed by hand from a socket) as well as an
//! async server wrapped in `Framed`.

use bytes::{Buf, BufMut, BytesMut};
use tokio_util::codec::{Decoder, Encoder};

use crate::error::{DecodingError, EncodingError};
use crate::mesh::{MeshDecoder, MeshRecord};
use crate::message::{ItemTag, Request, ResponseItem};
use crate::property::PropertyBag;
use crate::wire::{self, ReadError, ReadResult, MAX_MESHES_PER_REQUEST};

/// Encode a request into a fresh buffer
pub fn encode_request(request: &Request) -> Result<BytesMut, EncodingError> {
    encode_request_parts(&request.command, &request.properties, &request.meshes)
}

/// Encode a request from borrowed parts
pub fn encode_request_parts(
    command: &str,
    properties: &PropertyBag,
    meshes: &[MeshRecord],
) -> Result<BytesMut, EncodingError> {
    let mut dst = BytesMut::new();
    write_request(command, properties, meshes, &mut dst)?;
    Ok(dst)
}

fn write_request(
    command: &str,
    properties: &PropertyBag,
    meshes: &[MeshRecord],
    dst: &mut BytesMut,
) -> Result<(), EncodingError> {
    if meshes.len() > MAX_MESHES_PER_REQUEST {
        return Err(EncodingError::CountOverflow {
            field: "mesh",
            count: meshes.len(),
            max: MAX_MESHES_PER_REQUEST,
        });
    }

    let start = dst.len();
    let result = write_request_body(command, properties, meshes, dst);
    if result.is_err() {
        // Never leave half a frame behind
        dst.truncate(start);
    }
    result
}

fn write_request_body(
    command: &str,
    properties: &PropertyBag,
    meshes: &[MeshRecord],
    dst: &mut BytesMut,
) -> Result<(), EncodingError> {
    wire::put_string(dst, "command", command)?;
    properties.encode(dst)?;
    dst.put_u8(meshes.len() as u8);
    for mesh in meshes {
        mesh.encode(dst)?;
    }
    Ok(())
}

fn read_request(src: &mut &[u8]) -> ReadResult<Request> {
    let command = wire::get_string(src, "command")?;
    let properties = PropertyBag::decode(src)?;
    let mesh_count = wire::get_u8(src)? as usize;
    let mut meshes = Vec::with_capacity(mesh_count);
    for _ in 0..mesh_count {
        meshes.push(MeshRecord::decode(src)?);
    }
    Ok(Request {
        command,
        properties,
        meshes,
    })
}

fn read_error_item(src: &mut &[u8]) -> ReadResult<ResponseItem> {
    wire::get_u8(src)?;
    Ok(ResponseItem::Error(wire::get_string(src, "error message")?))
}

fn truncated(pending: Option<usize>, src: &BytesMut) -> DecodingError {
    DecodingError::Truncated {
        expected: pending.unwrap_or(src.len() + 1),
        actual: src.len(),
    }
}

/// Codec for requests: the client encodes, a server decodes
#[derive(Debug, Default)]
pub struct RequestCodec {
    /// Bytes needed before the buffered request can complete
    pending: Option<usize>,
}

impl RequestCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self { pending: None }
    }
}

impl Decoder for RequestCodec {
    type Item = Request;
    type Error = DecodingError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        let request = wire::decode_buffered(&mut self.pending, src, read_request)?;
        if let Some(request) = &request {
            tracing::trace!(
                command = %request.command,
                properties = request.properties.len(),
                meshes = request.meshes.len(),
                "Decoded request"
            );
        }
        Ok(request)
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(request) => Ok(Some(request)),
            None if src.is_empty() => Ok(None),
            None => Err(truncated(self.pending, src)),
        }
    }
}

impl Encoder<Request> for RequestCodec {
    type Error = EncodingError;

    fn encode(&mut self, request: Request, dst: &mut BytesMut) -> Result<(), Self::Error> {
        write_request(&request.command, &request.properties, &request.meshes, dst)
    }
}

/// Codec for response items: a server encodes, the client decodes.
///
/// Mesh records are decoded incrementally, so a large record arriving in
/// many small reads costs no more than one arriving at once.
#[derive(Debug, Default)]
pub struct ResponseCodec {
    /// Bytes needed before the buffered item can complete
    pending: Option<usize>,
    /// Mesh record received in part
    mesh: Option<MeshDecoder>,
}

impl ResponseCodec {
    /// Create a new codec
    pub fn new() -> Self {
        Self {
            pending: None,
            mesh: None,
        }
    }

    fn decode_mesh(
        &mut self,
        mut decoder: MeshDecoder,
        src: &mut BytesMut,
    ) -> Result<Option<ResponseItem>, DecodingError> {
        match decoder.resume(src) {
            Ok(mesh) => {
                self.pending = None;
                tracing::trace!(
                    vertices = mesh.vertex_count(),
                    faces = mesh.face_count(),
                    "Decoded mesh record"
                );
                Ok(Some(ResponseItem::Mesh(mesh)))
            }
            Err(ReadError::Incomplete { missing }) => {
                // Kept for decode_eof; complete units are consumed regardless
                self.pending = Some(src.len() + missing);
                self.mesh = Some(decoder);
                Ok(None)
            }
            Err(ReadError::Invalid(err)) => {
                self.pending = None;
                Err(err)
            }
        }
    }
}

impl Decoder for ResponseCodec {
    type Item = ResponseItem;
    type Error = DecodingError;

    fn decode(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        if let Some(decoder) = self.mesh.take() {
            return self.decode_mesh(decoder, src);
        }

        let Some(&tag_byte) = src.first() else {
            return Ok(None);
        };
        match ItemTag::from_u8(tag_byte).ok_or(DecodingError::UnknownTag(tag_byte))? {
            ItemTag::Mesh => {
                src.advance(1);
                self.decode_mesh(MeshDecoder::default(), src)
            }
            ItemTag::Error => wire::decode_buffered(&mut self.pending, src, read_error_item),
            ItemTag::End => {
                src.advance(1);
                Ok(Some(ResponseItem::End))
            }
        }
    }

    fn decode_eof(&mut self, src: &mut BytesMut) -> Result<Option<Self::Item>, Self::Error> {
        match self.decode(src)? {
            Some(item) => Ok(Some(item)),
            None if src.is_empty() && self.mesh.is_none() => Ok(None),
            None => Err(truncated(self.pending, src)),
        }
    }
}

impl Encoder<ResponseItem> for ResponseCodec {
    type Error = EncodingError;

    fn encode(&mut self, item: ResponseItem, dst: &mut BytesMut) -> Result<(), Self::Error> {
        let start = dst.len();
        dst.put_u8(item.tag().as_u8());
        let result = match &item {
            ResponseItem::Mesh(mesh) => mesh.encode(dst),
            ResponseItem::Error(message) => wire::put_string(dst, "error message", message),
            ResponseItem::End => Ok(()),
        };
        if result.is_err() {
            dst.truncate(start);
        }
        result
    }
}
