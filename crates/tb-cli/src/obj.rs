//! Wavefront OBJ bridge
//!
//! The CLI stands in for the modelling host: it reads the active object from
//! an OBJ file and writes received objects back out as OBJ.
//!
//! Only geometry is read: `o`, `v`, `f` and `l`. Texture coordinates,
//! normals, groups and materials are skipped.

use std::fmt::Write as _;
use std::fs;
use std::path::Path;

use thiserror::Error;

use tb_core::HostMesh;

/// Failure to read an OBJ file
#[derive(Error, Debug)]
pub enum ObjError {
    #[error("Failed to read {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
}

fn parse_error(line: usize, message: impl Into<String>) -> ObjError {
    ObjError::Parse {
        line,
        message: message.into(),
    }
}

/// Read `path` into a single host mesh.
///
/// The object takes the name of the first `o` statement, or the file stem.
pub fn read_obj(path: &Path) -> Result<HostMesh, ObjError> {
    let content = fs::read_to_string(path).map_err(|source| ObjError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let fallback = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "object".to_string());
    parse_obj(&content, &fallback)
}

/// Parse OBJ text into a host mesh named `fallback_name` unless the text
/// names its object
pub fn parse_obj(content: &str, fallback_name: &str) -> Result<HostMesh, ObjError> {
    let mut name: Option<String> = None;
    let mut vertices = Vec::new();
    let mut edges = Vec::new();
    let mut polygons = Vec::new();

    for (number, raw) in content.lines().enumerate() {
        let line_no = number + 1;
        let line = raw.split('#').next().unwrap_or("").trim();
        let mut fields = line.split_whitespace();
        let Some(keyword) = fields.next() else {
            continue;
        };

        match keyword {
            "o" => {
                if name.is_none() {
                    let rest: Vec<&str> = fields.collect();
                    if !rest.is_empty() {
                        name = Some(rest.join(" "));
                    }
                }
            }
            "v" => {
                let mut position = [0.0f32; 3];
                for slot in position.iter_mut() {
                    let field = fields
                        .next()
                        .ok_or_else(|| parse_error(line_no, "vertex needs x, y and z"))?;
                    *slot = field
                        .parse()
                        .map_err(|_| parse_error(line_no, format!("bad coordinate '{}'", field)))?;
                }
                vertices.push(position);
            }
            "f" => {
                let corners = resolve_indices(fields, vertices.len(), line_no)?;
                if corners.len() < 3 {
                    return Err(parse_error(line_no, "face needs at least 3 corners"));
                }
                polygons.push(corners);
            }
            "l" => {
                let points = resolve_indices(fields, vertices.len(), line_no)?;
                if points.len() < 2 {
                    return Err(parse_error(line_no, "line needs at least 2 points"));
                }
                edges.extend(points.windows(2).map(|pair| [pair[0], pair[1]]));
            }
            _ => tracing::trace!(line = line_no, keyword, "Skipping OBJ statement"),
        }
    }

    let name = name.unwrap_or_else(|| fallback_name.to_string());
    Ok(HostMesh::from_pydata(name, vertices, edges, polygons))
}

/// Turn OBJ references (`7`, `7/2`, `7//3`, `-1`) into 0-based indices
fn resolve_indices<'a>(
    fields: impl Iterator<Item = &'a str>,
    vertex_count: usize,
    line_no: usize,
) -> Result<Vec<usize>, ObjError> {
    fields
        .map(|field| {
            let reference = field.split('/').next().unwrap_or(field);
            let index: i64 = reference
                .parse()
                .map_err(|_| parse_error(line_no, format!("bad vertex reference '{}'", field)))?;
            let resolved = match index {
                i if i > 0 => i - 1,
                i if i < 0 => vertex_count as i64 + i,
                _ => return Err(parse_error(line_no, "vertex references start at 1")),
            };
            if resolved < 0 || resolved >= vertex_count as i64 {
                return Err(parse_error(
                    line_no,
                    format!(
                        "vertex reference {} out of range ({} vertices so far)",
                        index, vertex_count
                    ),
                ));
            }
            Ok(resolved as usize)
        })
        .collect()
}

/// Render `mesh` as OBJ text. Loose edges become `l` statements.
pub fn to_obj_string(mesh: &HostMesh) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "# toxicblend {}", env!("CARGO_PKG_VERSION"));
    let _ = writeln!(out, "o {}", mesh.name);
    for [x, y, z] in &mesh.vertices {
        let _ = writeln!(out, "v {} {} {}", x, y, z);
    }
    for polygon in &mesh.polygons {
        out.push('f');
        for index in polygon {
            let _ = write!(out, " {}", index + 1);
        }
        out.push('\n');
    }
    for (_, [a, b]) in mesh.loose_edges() {
        let _ = writeln!(out, "l {} {}", a + 1, b + 1);
    }
    out
}

/// Write `mesh` to `path`
pub fn write_obj(path: &Path, mesh: &HostMesh) -> std::io::Result<()> {
    fs::write(path, to_obj_string(mesh))
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "\
# a square made of two triangles
o Square
v 0 0 0
v 1 0 0
v 1 1 0
v 0 1 0
vt 0 0
f 1/1 2/1 3/1
f 1//1 3//1 4//1
";

    #[test]
    fn test_parse_faces() {
        let mesh = parse_obj(SQUARE, "fallback").unwrap();
        assert_eq!(mesh.name, "Square");
        assert_eq!(mesh.vertices.len(), 4);
        assert_eq!(mesh.polygons, vec![vec![0, 1, 2], vec![0, 2, 3]]);
        assert_eq!(mesh.edges.len(), 5);
    }

    #[test]
    fn test_parse_lines_and_negative_indices() {
        let text = "v 0 0 0\nv 1 0 0\nv 2 0 0\nl -3 -2 -1\n";
        let mesh = parse_obj(text, "path").unwrap();
        assert_eq!(mesh.name, "path");
        assert_eq!(mesh.edges, vec![[0, 1], [1, 2]]);
        assert!(mesh.polygons.is_empty());
    }

    #[test]
    fn test_parse_rejects_bad_input() {
        let err = parse_obj("v 0 0 0\nf 1 2 3\n", "x").unwrap_err();
        assert!(matches!(err, ObjError::Parse { line: 2, .. }));

        let err = parse_obj("v 0 zero 0\n", "x").unwrap_err();
        assert!(matches!(err, ObjError::Parse { line: 1, .. }));

        let err = parse_obj("v 0 0 0\nv 1 1 1\nf 1 2\n", "x").unwrap_err();
        assert!(err.to_string().contains("at least 3"));
    }

    #[test]
    fn test_written_obj_reads_back() {
        let mesh = HostMesh::from_pydata(
            "Tail",
            vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0], [0.5, 2.5, -1.0]],
            vec![[2, 3]],
            vec![vec![0, 1, 2]],
        );
        let text = to_obj_string(&mesh);
        assert!(text.contains("o Tail\n"));
        assert!(text.contains("v 0.5 2.5 -1\n"));
        assert!(text.contains("f 1 2 3\n"));
        assert!(text.contains("l 3 4\n"));

        let parsed = parse_obj(&text, "ignored").unwrap();
        assert_eq!(parsed.vertices, mesh.vertices);
        assert_eq!(parsed.polygons, mesh.polygons);
        assert_eq!(parsed.loose_edges().count(), 1);
    }

    #[test]
    fn test_read_obj_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("plane.obj");
        std::fs::write(&path, "v 0 0 0\nv 1 0 0\nv 1 1 0\nf 1 2 3\n").unwrap();

        let mesh = read_obj(&path).unwrap();
        assert_eq!(mesh.name, "plane");
        assert_eq!(mesh.polygons.len(), 1);

        let missing = read_obj(&dir.path().join("missing.obj"));
        assert!(matches!(missing, Err(ObjError::Io { .. })));
    }
}
