//! Mesh adapter: host meshes to wire records and back
//!
//! This is the only module that looks inside [`HostMesh`]. Polygons go on
//! the wire as faces, loose edges as two-index faces. Coordinates are never
//! rescaled here; the scene's unit settings travel in the property bag and
//! the server interprets them.

use tb_protocol::{MeshRecord, PropertyBag, MAX_FACE_ARITY, MAX_VERTICES};

use crate::error::AdapterError;
use crate::types::{HostMesh, UnitSettings};

/// Fewest corners a host polygon may have
pub const MIN_POLYGON_CORNERS: usize = 3;

/// Convert a host mesh into a wire record.
///
/// Polygons come first in their original order, followed by loose edges.
/// Meshes the wire cannot carry are rejected whole, never truncated.
pub fn to_record(mesh: &HostMesh) -> Result<MeshRecord, AdapterError> {
    let vertex_count = mesh.vertices.len();
    if vertex_count > MAX_VERTICES {
        return Err(AdapterError::TooManyVertices {
            count: vertex_count,
            max: MAX_VERTICES,
        });
    }

    if let Some(vertex) = mesh
        .vertices
        .iter()
        .position(|v| v.iter().any(|c| !c.is_finite()))
    {
        return Err(AdapterError::NonFiniteCoordinate { vertex });
    }

    let check = |element: &'static str, position: usize, index: usize| {
        if index < vertex_count {
            // vertex_count <= MAX_VERTICES, so every valid index fits in u32
            Ok(index as u32)
        } else {
            Err(AdapterError::IndexOutOfRange {
                element,
                position,
                index,
                vertex_count,
            })
        }
    };

    let mut faces = Vec::with_capacity(mesh.polygons.len() + mesh.edges.len());

    for (polygon, corners) in mesh.polygons.iter().enumerate() {
        if !(MIN_POLYGON_CORNERS..=MAX_FACE_ARITY).contains(&corners.len()) {
            return Err(AdapterError::InvalidPolygon {
                polygon,
                corners: corners.len(),
                min: MIN_POLYGON_CORNERS,
                max: MAX_FACE_ARITY,
            });
        }
        let face = corners
            .iter()
            .map(|&index| check("polygon", polygon, index))
            .collect::<Result<Vec<u32>, _>>()?;
        faces.push(face);
    }

    for (edge, [a, b]) in mesh.loose_edges() {
        if a == b {
            return Err(AdapterError::DegenerateEdge { edge, vertex: a });
        }
        faces.push(vec![check("edge", edge, a)?, check("edge", edge, b)?]);
    }

    tracing::debug!(
        object = %mesh.name,
        vertices = vertex_count,
        polygons = mesh.polygons.len(),
        loose_edges = faces.len() - mesh.polygons.len(),
        "Converted host mesh"
    );

    Ok(MeshRecord::new(mesh.vertices.clone(), faces))
}

/// Convert a received record into a host mesh named `name`.
///
/// Two-index faces become edges, larger faces become polygons, and polygon
/// sides are added to the edge list.
pub fn from_record(record: MeshRecord, name: impl Into<String>) -> HostMesh {
    let mut edges = Vec::new();
    let mut polygons = Vec::new();
    for face in record.faces {
        let indices: Vec<usize> = face.into_iter().map(|i| i as usize).collect();
        match indices.as_slice() {
            [a, b] => edges.push([*a, *b]),
            _ => polygons.push(indices),
        }
    }
    HostMesh::from_pydata(name, record.vertices, edges, polygons)
}

/// Record the scene's unit settings in `properties`
pub fn unit_properties(units: &UnitSettings, properties: &mut PropertyBag) {
    properties.insert("unitSystem", units.system.to_string());
    properties.insert("unitScale", format_float(units.scale_length));
}

/// Render a float the way the host prints it: whole numbers keep one
/// decimal (`32.0`), everything else uses the shortest exact form.
pub fn format_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{:.1}", value)
    } else {
        value.to_string()
    }
}
