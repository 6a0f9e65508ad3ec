//! Host-side domain types

use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A mesh object as the modelling host holds it.
///
/// Mirrors Blender's `Mesh`: vertex positions, an edge list that includes
/// polygon sides, and polygons as vertex loops.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct HostMesh {
    /// Object name in the scene
    pub name: String,
    /// Vertex positions
    pub vertices: Vec<[f32; 3]>,
    /// All edges, polygon sides included
    pub edges: Vec<[usize; 2]>,
    /// Polygons as ordered vertex loops
    pub polygons: Vec<Vec<usize>>,
}

impl HostMesh {
    /// Build a mesh the way Blender's `from_pydata` does: polygon sides are
    /// added to the edge list.
    pub fn from_pydata(
        name: impl Into<String>,
        vertices: Vec<[f32; 3]>,
        edges: Vec<[usize; 2]>,
        polygons: Vec<Vec<usize>>,
    ) -> Self {
        let mut mesh = Self {
            name: name.into(),
            vertices,
            edges,
            polygons,
        };
        mesh.calc_edges();
        mesh
    }

    /// Append every polygon side missing from `edges`
    pub fn calc_edges(&mut self) {
        let mut known: HashSet<(usize, usize)> =
            self.edges.iter().map(|&[a, b]| edge_key(a, b)).collect();
        let mut added = Vec::new();
        for polygon in &self.polygons {
            for (a, b) in polygon_sides(polygon) {
                if known.insert(edge_key(a, b)) {
                    added.push([a, b]);
                }
            }
        }
        self.edges.extend(added);
    }

    /// Edges that are not a side of any polygon
    pub fn loose_edges(&self) -> impl Iterator<Item = (usize, [usize; 2])> + '_ {
        let sides: HashSet<(usize, usize)> = self
            .polygons
            .iter()
            .flat_map(|p| polygon_sides(p))
            .map(|(a, b)| edge_key(a, b))
            .collect();
        self.edges
            .iter()
            .copied()
            .enumerate()
            .filter(move |(_, [a, b])| !sides.contains(&edge_key(*a, *b)))
    }
}

/// Undirected edge identity
fn edge_key(a: usize, b: usize) -> (usize, usize) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Consecutive corner pairs of a polygon loop, closing back to the start
fn polygon_sides(polygon: &[usize]) -> impl Iterator<Item = (usize, usize)> + '_ {
    let closing = polygon.first().copied();
    polygon
        .iter()
        .copied()
        .zip(polygon.iter().copied().skip(1).chain(closing))
        .filter(move |_| polygon.len() >= 2)
}

/// Failure to parse one of the host's enum-valued settings
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("invalid {kind} '{value}', expected one of: {expected}")]
pub struct ParseEnumError {
    pub kind: &'static str,
    pub value: String,
    pub expected: String,
}

/// Scene unit system
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum UnitSystem {
    None,
    #[default]
    Metric,
    Imperial,
}

impl fmt::Display for UnitSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitSystem::None => write!(f, "NONE"),
            UnitSystem::Metric => write!(f, "METRIC"),
            UnitSystem::Imperial => write!(f, "IMPERIAL"),
        }
    }
}

impl FromStr for UnitSystem {
    type Err = ParseEnumError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "NONE" => Ok(UnitSystem::None),
            "METRIC" => Ok(UnitSystem::Metric),
            "IMPERIAL" => Ok(UnitSystem::Imperial),
            _ => Err(ParseEnumError {
                kind: "unit system",
                value: s.to_string(),
                expected: "NONE, METRIC, IMPERIAL".to_string(),
            }),
        }
    }
}

/// Scene unit settings, forwarded to the server untouched
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnitSettings {
    pub system: UnitSystem,
    /// Scene scale (Blender's `scale_length`)
    pub scale_length: f64,
}

impl Default for UnitSettings {
    fn default() -> Self {
        Self {
            system: UnitSystem::Metric,
            scale_length: 1.0,
        }
    }
}
