pub mod analysis;
pub mod export;

use serde::{Deserialize, Serialize};

pub use analysis::{MeshAnalysis, analyze, bounding_box, is_watertight, mesh_volume, surface_area};
pub use export::{ExportFormat, export, to_ascii_stl, to_binary_stl, to_obj};

/// Indexed triangle mesh: a shared vertex buffer plus faces that reference it.
///
/// Faces are wound counter-clockwise when seen from outside the solid.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Mesh {
    pub vertices: Vec<[f64; 3]>,
    pub triangles: Vec<[u32; 3]>,
}

impl Mesh {
    pub fn empty() -> Self {
        Self {
            vertices: Vec::new(),
            triangles: Vec::new(),
        }
    }

    pub fn with_capacity(vertex_count: usize, triangle_count: usize) -> Self {
        Self {
            vertices: Vec::with_capacity(vertex_count),
            triangles: Vec::with_capacity(triangle_count),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.triangles.is_empty()
    }

    /// Pushes a vertex and returns its index.
    pub fn push_vertex(&mut self, vertex: [f64; 3]) -> u32 {
        self.vertices.push(vertex);
        (self.vertices.len() - 1) as u32
    }

    pub fn push_triangle(&mut self, a: u32, b: u32, c: u32) {
        self.triangles.push([a, b, c]);
    }

    /// Moves `other` into this mesh, shifting its face indices past the
    /// vertices already present.
    pub fn append(&mut self, other: Mesh) {
        let offset = self.vertices.len() as u32;
        self.vertices.extend(other.vertices);
        self.triangles.extend(
            other
                .triangles
                .into_iter()
                .map(|[a, b, c]| [a + offset, b + offset, c + offset]),
        );
    }

    /// Largest face index, or `None` for a mesh without faces.
    pub fn max_index(&self) -> Option<u32> {
        self.triangles.iter().flatten().copied().max()
    }

    pub fn triangle_vertices(&self, triangle: [u32; 3]) -> [[f64; 3]; 3] {
        [
            self.vertices[triangle[0] as usize],
            self.vertices[triangle[1] as usize],
            self.vertices[triangle[2] as usize],
        ]
    }
}

/// Concatenates meshes into one, consuming the parts.
pub fn concatenate(parts: impl IntoIterator<Item = Mesh>) -> Mesh {
    parts.into_iter().fold(Mesh::empty(), |mut combined, part| {
        combined.append(part);
        combined
    })
}
