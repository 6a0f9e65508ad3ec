//! Lazy decoding of a response from a blocking reader

use std::io::{ErrorKind, Read};
use std::iter::FusedIterator;

use bytes::BytesMut;
use tokio_util::codec::Decoder;

use crate::codec::ResponseCodec;
use crate::error::DecodingError;
use crate::mesh::MeshRecord;
use crate::message::ResponseItem;

/// Bytes requested from the reader per read call
const READ_CHUNK: usize = 8 * 1024;

/// Decode the response on `reader` one mesh at a time
pub fn decode_response<R: Read>(reader: R) -> MeshStream<R> {
    MeshStream::new(reader)
}

/// Single-pass iterator over the meshes of one response.
///
/// Reads only as much as it needs to complete the next record. Iteration
/// ends at the end marker; any error is yielded once and then the stream is
/// finished. Bytes that arrive after the end marker are discarded.
#[derive(Debug)]
pub struct MeshStream<R> {
    reader: R,
    codec: ResponseCodec,
    buffer: BytesMut,
    eof: bool,
    finished: bool,
    received: usize,
}

impl<R: Read> MeshStream<R> {
    /// Wrap a reader positioned at the start of a response
    pub fn new(reader: R) -> Self {
        Self {
            reader,
            codec: ResponseCodec::new(),
            buffer: BytesMut::with_capacity(READ_CHUNK),
            eof: false,
            finished: false,
            received: 0,
        }
    }

    /// Meshes yielded so far
    pub fn received(&self) -> usize {
        self.received
    }

    /// Whether the stream has ended, normally or not
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    fn next_mesh(&mut self) -> Result<Option<MeshRecord>, DecodingError> {
        loop {
            let decoded = if self.eof {
                self.codec.decode_eof(&mut self.buffer)?
            } else {
                self.codec.decode(&mut self.buffer)?
            };

            let item = match decoded {
                Some(item) => item,
                None if self.eof => return Err(DecodingError::MissingEndMarker),
                None => {
                    self.fill()?;
                    continue;
                }
            };

            match item {
                ResponseItem::Mesh(mesh) => {
                    self.received += 1;
                    return Ok(Some(mesh));
                }
                ResponseItem::End => {
                    tracing::debug!(meshes = self.received, "End of response");
                    self.finished = true;
                    return Ok(None);
                }
                ResponseItem::Error(message) => return Err(DecodingError::Remote(message)),
            }
        }
    }

    fn fill(&mut self) -> Result<(), DecodingError> {
        let mut chunk = [0u8; READ_CHUNK];
        loop {
            match self.reader.read(&mut chunk) {
                Ok(0) => {
                    self.eof = true;
                    return Ok(());
                }
                Ok(n) => {
                    self.buffer.extend_from_slice(&chunk[..n]);
                    return Ok(());
                }
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }
    }
}

impl<R: Read> Iterator for MeshStream<R> {
    type Item = Result<MeshRecord, DecodingError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.next_mesh() {
            Ok(Some(mesh)) => Some(Ok(mesh)),
            Ok(None) => None,
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

impl<R: Read> FusedIterator for MeshStream<R> {}
