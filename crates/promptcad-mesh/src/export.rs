//! Mesh interchange writers.
//!
//! Binary STL layout: an 80-byte header, a little-endian `u32` triangle count,
//! then per triangle twelve little-endian `f32` (normal, three vertices) and a
//! `u16` attribute field. Normals are derived from the face winding.

use std::fmt::{self, Write as _};
use std::str::FromStr;

use thiserror::Error;

use crate::Mesh;
use crate::analysis::{cross, length, sub};

const STL_HEADER_LEN: usize = 80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ExportFormat {
    #[default]
    BinaryStl,
    AsciiStl,
    Obj,
}

impl ExportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ExportFormat::BinaryStl | ExportFormat::AsciiStl => "stl",
            ExportFormat::Obj => "obj",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown export format '{0}' (expected binary-stl, ascii-stl or obj)")]
pub struct UnknownFormat(pub String);

impl FromStr for ExportFormat {
    type Err = UnknownFormat;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.to_ascii_lowercase().as_str() {
            "binary-stl" | "stl" => Ok(ExportFormat::BinaryStl),
            "ascii-stl" => Ok(ExportFormat::AsciiStl),
            "obj" => Ok(ExportFormat::Obj),
            _ => Err(UnknownFormat(value.to_string())),
        }
    }
}

impl fmt::Display for ExportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ExportFormat::BinaryStl => "binary-stl",
            ExportFormat::AsciiStl => "ascii-stl",
            ExportFormat::Obj => "obj",
        })
    }
}

/// Serializes `mesh` in the requested format.
pub fn export(mesh: &Mesh, format: ExportFormat, name: &str) -> Vec<u8> {
    match format {
        ExportFormat::BinaryStl => to_binary_stl(mesh, name),
        ExportFormat::AsciiStl => to_ascii_stl(mesh, name).into_bytes(),
        ExportFormat::Obj => to_obj(mesh).into_bytes(),
    }
}

/// Unit normal from the winding; zero for degenerate faces such as the
/// collapsed rings at sphere poles.
pub fn triangle_normal(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> [f64; 3] {
    let n = cross(sub(b, a), sub(c, a));
    let len = length(n);
    if len <= f64::EPSILON {
        return [0.0; 3];
    }
    n.map(|component| component / len)
}

/// 80-byte header carrying `name`, a `u32` facet count, then one 50-byte
/// record per triangle.
pub fn to_binary_stl(mesh: &Mesh, name: &str) -> Vec<u8> {
    let mut bytes = Vec::with_capacity(84 + mesh.triangle_count() * 50);

    let name = name.as_bytes();
    let kept = &name[..name.len().min(STL_HEADER_LEN)];
    bytes.extend_from_slice(kept);
    bytes.resize(STL_HEADER_LEN, 0);
    bytes.extend_from_slice(&(mesh.triangle_count() as u32).to_le_bytes());

    for &triangle in &mesh.triangles {
        let corners = mesh.triangle_vertices(triangle);
        let [a, b, c] = corners;
        for point in std::iter::once(triangle_normal(a, b, c)).chain(corners) {
            for component in point {
                bytes.extend_from_slice(&(component as f32).to_le_bytes());
            }
        }
        // Attribute byte count, unused.
        bytes.extend_from_slice(&[0, 0]);
    }

    bytes
}

pub fn to_ascii_stl(mesh: &Mesh, name: &str) -> String {
    let mut out = format!("solid {name}\n");
    for &triangle in &mesh.triangles {
        let [a, b, c] = mesh.triangle_vertices(triangle);
        let [nx, ny, nz] = triangle_normal(a, b, c);
        let _ = writeln!(out, "  facet normal {nx} {ny} {nz}");
        out.push_str("    outer loop\n");
        for [x, y, z] in [a, b, c] {
            let _ = writeln!(out, "      vertex {x} {y} {z}");
        }
        out.push_str("    endloop\n  endfacet\n");
    }
    let _ = writeln!(out, "endsolid {name}");
    out
}

/// Wavefront OBJ with 1-based face indices.
pub fn to_obj(mesh: &Mesh) -> String {
    let mut out = String::new();
    for [x, y, z] in &mesh.vertices {
        let _ = writeln!(out, "v {x} {y} {z}");
    }
    for [a, b, c] in &mesh.triangles {
        let _ = writeln!(out, "f {} {} {}", a + 1, b + 1, c + 1);
    }
    out
}
