//! Mesh records: the wire form of one object's geometry
//!
//! Layout (all big-endian):
//! - vertex_count: u32
//! - vertices: vertex_count x (x: f32, y: f32, z: f32)
//! - face_count: u32
//! - faces: face_count x (arity: u32, arity x index: u32)
//!
//! A face of arity 2 is a loose edge; arity 3 and above is a polygon.

use bytes::{Buf, BufMut, BytesMut};

use crate::error::{DecodingError, EncodingError};
use crate::wire::{
    self, ReadError, ReadResult, MAX_COUNT, MAX_FACE_ARITY, MAX_VERTICES, MIN_FACE_ARITY,
};

/// A vertex position
pub type Vertex = [f32; 3];

const VERTEX_SIZE: usize = 12;

/// Smallest possible encoded face: arity prefix plus two indices
const MIN_FACE_SIZE: usize = 4 + 4 * MIN_FACE_ARITY;

/// Vertices plus faces indexing into them
#[derive(Debug, Clone, Default, PartialEq)]
pub struct MeshRecord {
    /// Vertex positions, in index order
    pub vertices: Vec<Vertex>,
    /// Index tuples; every index is `< vertices.len()`
    pub faces: Vec<Vec<u32>>,
}

impl MeshRecord {
    /// Create a mesh record
    pub fn new(vertices: Vec<Vertex>, faces: Vec<Vec<u32>>) -> Self {
        Self { vertices, faces }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Number of two-index faces
    pub fn edge_count(&self) -> usize {
        self.faces.iter().filter(|f| f.len() == 2).count()
    }

    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() && self.faces.is_empty()
    }

    /// Check that the record can be put on the wire
    pub fn validate(&self) -> Result<(), EncodingError> {
        let vertex_count = self.vertices.len();
        if vertex_count > MAX_VERTICES {
            return Err(EncodingError::CountOverflow {
                field: "vertex",
                count: vertex_count,
                max: MAX_VERTICES,
            });
        }

        for (face, indices) in self.faces.iter().enumerate() {
            let arity = indices.len();
            if !(MIN_FACE_ARITY..=MAX_FACE_ARITY).contains(&arity) {
                return Err(EncodingError::InvalidArity {
                    face,
                    arity,
                    min: MIN_FACE_ARITY,
                    max: MAX_FACE_ARITY,
                });
            }
            if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
                return Err(EncodingError::IndexOutOfRange {
                    face,
                    index,
                    vertex_count,
                });
            }
        }
        Ok(())
    }

    /// Exact number of bytes [`encode`](Self::encode) writes
    pub fn encoded_len(&self) -> usize {
        let faces: usize = self.faces.iter().map(|f| 4 + 4 * f.len()).sum();
        4 + VERTEX_SIZE * self.vertices.len() + 4 + faces
    }

    pub(crate) fn encode(&self, dst: &mut BytesMut) -> Result<(), EncodingError> {
        self.validate()?;
        dst.reserve(self.encoded_len());

        wire::put_count(dst, "vertex", self.vertices.len(), MAX_VERTICES)?;
        for [x, y, z] in &self.vertices {
            dst.put_f32(*x);
            dst.put_f32(*y);
            dst.put_f32(*z);
        }

        wire::put_count(dst, "face", self.faces.len(), MAX_COUNT)?;
        for face in &self.faces {
            wire::put_count(dst, "face arity", face.len(), MAX_FACE_ARITY)?;
            for &index in face {
                dst.put_u32(index);
            }
        }
        Ok(())
    }

    pub(crate) fn decode(src: &mut &[u8]) -> ReadResult<Self> {
        let vertex_count = wire::get_count(src, "vertex", MAX_VERTICES)?;
        let vertex_bytes = vertex_count
            .checked_mul(VERTEX_SIZE)
            .ok_or(DecodingError::LengthTooLarge {
                field: "vertex",
                value: vertex_count as u64,
                max: (usize::MAX / VERTEX_SIZE) as u64,
            })?;
        // Wait for the whole vertex block before allocating for it
        wire::ensure(src, vertex_bytes)?;

        let mut vertices = Vec::with_capacity(vertex_count);
        for _ in 0..vertex_count {
            vertices.push([src.get_f32(), src.get_f32(), src.get_f32()]);
        }

        let face_count = wire::get_count(src, "face", MAX_COUNT)?;
        let mut faces = Vec::with_capacity(face_count.min(src.len() / MIN_FACE_SIZE));
        for face in 0..face_count {
            let indices = read_face(src, face, vertex_count)
                .map_err(|e| e.needing(min_faces_len(face_count - face - 1)))?;
            faces.push(indices);
        }

        Ok(Self { vertices, faces })
    }
}

/// Fewest bytes `count` more faces can take
fn min_faces_len(count: usize) -> usize {
    count.saturating_mul(MIN_FACE_SIZE)
}

fn read_face(src: &mut &[u8], face: usize, vertex_count: usize) -> ReadResult<Vec<u32>> {
    let arity = wire::get_count(src, "face arity", MAX_FACE_ARITY)?;
    if arity < MIN_FACE_ARITY {
        return Err(DecodingError::InvalidArity {
            face,
            arity,
            min: MIN_FACE_ARITY,
        }
        .into());
    }
    wire::ensure(src, 4 * arity)?;

    let mut indices = Vec::with_capacity(arity);
    for _ in 0..arity {
        let index = src.get_u32();
        if index as usize >= vertex_count {
            return Err(DecodingError::IndexOutOfRange {
                face,
                index,
                vertex_count,
            }
            .into());
        }
        indices.push(index);
    }
    Ok(indices)
}

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
enum Phase {
    #[default]
    VertexCount,
    Vertices,
    FaceCount,
    Faces,
}

/// Incremental decoder for one mesh record.
///
/// Every complete count, vertex and face is taken out of the buffer as soon
/// as it arrives, so a record spread over many reads is parsed exactly once.
#[derive(Debug, Default)]
pub(crate) struct MeshDecoder {
    phase: Phase,
    vertex_count: usize,
    face_count: usize,
    vertices: Vec<Vertex>,
    faces: Vec<Vec<u32>>,
}

impl MeshDecoder {
    /// Continue with whatever `src` holds.
    ///
    /// `Incomplete` means the consumed part is kept and decoding picks up
    /// where it stopped on the next call.
    pub(crate) fn resume(&mut self, src: &mut BytesMut) -> ReadResult<MeshRecord> {
        loop {
            match self.phase {
                Phase::VertexCount => {
                    let count = wire::take(src, |c| wire::get_count(c, "vertex", MAX_VERTICES))?;
                    self.vertex_count = count;
                    self.vertices = Vec::with_capacity(count.min(src.len() / VERTEX_SIZE));
                    self.phase = Phase::Vertices;
                }
                Phase::Vertices => {
                    let remaining = self.vertex_count - self.vertices.len();
                    let available = remaining.min(src.len() / VERTEX_SIZE);
                    self.vertices.reserve(available);
                    for _ in 0..available {
                        self.vertices
                            .push([src.get_f32(), src.get_f32(), src.get_f32()]);
                    }
                    if available < remaining {
                        let missing = (remaining - available).saturating_mul(VERTEX_SIZE);
                        return Err(ReadError::Incomplete {
                            missing: missing - src.len(),
                        });
                    }
                    self.phase = Phase::FaceCount;
                }
                Phase::FaceCount => {
                    let count = wire::take(src, |c| wire::get_count(c, "face", MAX_COUNT))?;
                    self.face_count = count;
                    self.faces = Vec::with_capacity(count.min(src.len() / MIN_FACE_SIZE));
                    self.phase = Phase::Faces;
                }
                Phase::Faces => {
                    while self.faces.len() < self.face_count {
                        let face = self.faces.len();
                        let vertex_count = self.vertex_count;
                        let rest = min_faces_len(self.face_count - face - 1);
                        let indices = wire::take(src, |c| read_face(c, face, vertex_count))
                            .map_err(|e| e.needing(rest))?;
                        self.faces.push(indices);
                    }
                    let done = std::mem::take(self);
                    return Ok(MeshRecord {
                        vertices: done.vertices,
                        faces: done.faces,
                    });
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::wire::ReadError;

    /// Two triangles sharing an edge, plus nothing else
    fn quad() -> MeshRecord {
        MeshRecord::new(
            vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [1.0, 1.0, 0.0],
                [0.0, 1.0, 0.5],
            ],
            vec![vec![0, 1, 2], vec![0, 2, 3]],
        )
    }

    fn decode(buf: &[u8]) -> ReadResult<MeshRecord> {
        let mut cursor = buf;
        MeshRecord::decode(&mut cursor)
    }

    #[test]
    fn test_mesh_roundtrip() {
        let mesh = quad();
        let mut buf = BytesMut::new();
        mesh.encode(&mut buf).unwrap();

        assert_eq!(buf.len(), mesh.encoded_len());
        assert_eq!(decode(&buf).unwrap(), mesh);
    }

    #[test]
    fn test_mixed_edges_and_ngons_roundtrip() {
        let mesh = MeshRecord::new(
            vec![
                [0.0, 0.0, 0.0],
                [2.0, 0.0, 0.0],
                [3.0, 1.0, 0.0],
                [2.0, 2.0, 0.0],
                [0.0, 2.0, 0.0],
                [-1.5, 1.0, -0.25],
            ],
            vec![vec![0, 1, 2, 3, 4], vec![4, 5], vec![5, 0]],
        );
        let mut buf = BytesMut::new();
        mesh.encode(&mut buf).unwrap();

        let decoded = decode(&buf).unwrap();
        assert_eq!(decoded, mesh);
        assert_eq!(decoded.edge_count(), 2);
    }

    #[test]
    fn test_vertex_layout_is_big_endian_f32() {
        let mesh = MeshRecord::new(vec![[1.0, -2.0, 0.5]], vec![]);
        let mut buf = BytesMut::new();
        mesh.encode(&mut buf).unwrap();

        assert_eq!(&buf[0..4], &[0, 0, 0, 1]);
        assert_eq!(&buf[4..8], &1.0f32.to_be_bytes());
        assert_eq!(&buf[8..12], &(-2.0f32).to_be_bytes());
        assert_eq!(&buf[12..16], &0.5f32.to_be_bytes());
        assert_eq!(&buf[16..20], &[0, 0, 0, 0]);
    }

    #[test]
    fn test_encode_rejects_out_of_range_index() {
        let mut mesh = quad();
        mesh.faces.push(vec![1, 4]);

        let mut buf = BytesMut::new();
        let result = mesh.encode(&mut buf);
        assert!(matches!(
            result,
            Err(EncodingError::IndexOutOfRange {
                face: 2,
                index: 4,
                vertex_count: 4
            })
        ));
        assert!(buf.is_empty(), "nothing is written for an invalid record");
    }

    #[test]
    fn test_encode_rejects_single_index_face() {
        let mut mesh = quad();
        mesh.faces.push(vec![3]);
        assert!(matches!(
            mesh.validate(),
            Err(EncodingError::InvalidArity { face: 2, arity: 1, .. })
        ));
    }

    #[test]
    fn test_decode_rejects_out_of_range_index() {
        let mut buf = BytesMut::new();
        buf.put_u32(1);
        buf.put_f32(0.0);
        buf.put_f32(0.0);
        buf.put_f32(0.0);
        buf.put_u32(1);
        buf.put_u32(2);
        buf.put_u32(0);
        buf.put_u32(1);

        assert!(matches!(
            decode(&buf),
            Err(ReadError::Invalid(DecodingError::IndexOutOfRange {
                face: 0,
                index: 1,
                vertex_count: 1
            }))
        ));
    }

    #[test]
    fn test_decode_waits_for_whole_vertex_block() {
        let mut buf = BytesMut::new();
        buf.put_u32(1000);
        match decode(&buf) {
            Err(ReadError::Incomplete { missing }) => assert_eq!(missing, 12_000),
            other => panic!("expected Incomplete, got {:?}", other),
        }
    }

    #[test]
    fn test_decode_rejects_vertex_count_above_limit() {
        let buf = [0x80, 0, 0, 0];
        assert!(matches!(
            decode(&buf),
            Err(ReadError::Invalid(DecodingError::LengthTooLarge {
                field: "vertex",
                ..
            }))
        ));
    }

    #[test]
    fn test_resolution_ceiling_fits() {
        let grid = 46_338usize * 46_338;
        assert!(grid <= MAX_VERTICES);
        assert!(grid - 1 <= u32::MAX as usize);
    }

    #[test]
    fn test_decode_hint_counts_remaining_faces() {
        let mesh = MeshRecord::new(vec![[0.0; 3]; 3], vec![vec![0, 1, 2]; 10]);
        let mut buf = BytesMut::new();
        mesh.encode(&mut buf).unwrap();

        // vertex block, face count and the arity of the first face
        let cut = 4 + 36 + 4 + 4;
        match decode(&buf[..cut]) {
            Err(ReadError::Incomplete { missing }) => assert_eq!(missing, 12 + 9 * MIN_FACE_SIZE),
            other => panic!("expected Incomplete, got {:?}", other),
        }
    }

    #[test]
    fn test_decoder_resumes_byte_by_byte() {
        let mesh = quad();
        let mut encoded = BytesMut::new();
        mesh.encode(&mut encoded).unwrap();

        let mut decoder = MeshDecoder::default();
        let mut buf = BytesMut::new();
        let (last, body) = encoded.split_last().unwrap();
        for &byte in body {
            buf.extend_from_slice(&[byte]);
            assert!(matches!(
                decoder.resume(&mut buf),
                Err(ReadError::Incomplete { .. })
            ));
            assert!(buf.len() < 16, "complete units are consumed");
        }
        buf.extend_from_slice(&[*last]);
        assert_eq!(decoder.resume(&mut buf).unwrap(), mesh);
        assert!(buf.is_empty());
    }

    #[test]
    fn test_decoder_reports_missing_vertex_bytes() {
        let mut buf = BytesMut::new();
        buf.put_u32(1000);
        buf.put_slice(&[0u8; 30]);

        let mut decoder = MeshDecoder::default();
        match decoder.resume(&mut buf) {
            Err(ReadError::Incomplete { missing }) => assert_eq!(missing, 12_000 - 30),
            other => panic!("expected Incomplete, got {:?}", other),
        }
        assert_eq!(buf.len(), 6, "two whole vertices were taken");
    }

    #[test]
    fn test_decoder_rejects_bad_index_mid_stream() {
        let mut buf = BytesMut::new();
        buf.put_u32(2);
        buf.put_slice(&[0u8; 24]);
        buf.put_u32(2);
        buf.put_u32(2);
        buf.put_u32(0);
        buf.put_u32(1);

        let mut decoder = MeshDecoder::default();
        assert!(matches!(
            decoder.resume(&mut buf),
            Err(ReadError::Incomplete { .. })
        ));
        buf.put_u32(2);
        buf.put_u32(0);
        buf.put_u32(5);
        assert!(matches!(
            decoder.resume(&mut buf),
            Err(ReadError::Invalid(DecodingError::IndexOutOfRange {
                face: 1,
                index: 5,
                vertex_count: 2
            }))
        ));
    }
}
