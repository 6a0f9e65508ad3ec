//! Output formatting utilities for the CLI
//!
//! Tables for received objects and colored status messages.

use std::path::PathBuf;

use tabled::{settings::Style, Table, Tabled};

use tb_core::HostMesh;

/// Format received objects and the files they were written to as a table
pub fn format_objects(objects: &[(HostMesh, PathBuf)]) -> String {
    if objects.is_empty() {
        return "Server returned no objects".to_string();
    }

    #[derive(Tabled)]
    struct ObjectRow {
        #[tabled(rename = "OBJECT")]
        name: String,
        #[tabled(rename = "VERTICES")]
        vertices: usize,
        #[tabled(rename = "EDGES")]
        edges: usize,
        #[tabled(rename = "POLYGONS")]
        polygons: usize,
        #[tabled(rename = "FILE")]
        file: String,
    }

    let rows: Vec<ObjectRow> = objects
        .iter()
        .map(|(mesh, path)| ObjectRow {
            name: mesh.name.clone(),
            vertices: mesh.vertices.len(),
            edges: mesh.edges.len(),
            polygons: mesh.polygons.len(),
            file: path.display().to_string(),
        })
        .collect();

    Table::new(rows).with(Style::rounded()).to_string()
}

/// Print a success message in green with a checkmark prefix
pub fn print_success(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Green),
        Print("✓ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an error message in red with an X prefix to stderr
pub fn print_error(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Red),
        Print("✗ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print a warning message in yellow to stderr
pub fn print_warning(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stderr = std::io::stderr();
    let _ = crossterm::execute!(
        stderr,
        SetForegroundColor(Color::Yellow),
        Print("⚠ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

/// Print an informational message in cyan
pub fn print_info(msg: &str) {
    use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};

    let mut stdout = std::io::stdout();
    let _ = crossterm::execute!(
        stdout,
        SetForegroundColor(Color::Cyan),
        Print("ℹ "),
        ResetColor,
        Print(msg),
        Print("\n")
    );
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_objects() {
        let mesh = HostMesh::from_pydata(
            "toxicblend_medianaxis.000",
            vec![[0.0; 3], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]],
            vec![],
            vec![vec![0, 1, 2]],
        );
        let table = format_objects(&[(mesh, PathBuf::from("out/toxicblend_medianaxis-0.obj"))]);
        assert!(table.contains("toxicblend_medianaxis.000"));
        assert!(table.contains("POLYGONS"));
        assert!(table.contains("out/toxicblend_medianaxis-0.obj"));
    }

    #[test]
    fn test_format_no_objects() {
        assert_eq!(format_objects(&[]), "Server returned no objects");
    }
}
