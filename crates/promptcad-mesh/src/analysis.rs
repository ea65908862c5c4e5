use std::collections::BTreeMap;

use serde::Serialize;

use crate::Mesh;

/// Summary measurements of a generated mesh.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MeshAnalysis {
    pub vertex_count: usize,
    pub triangle_count: usize,
    pub bbox_min: [f64; 3],
    pub bbox_max: [f64; 3],
    pub volume: f64,
    pub surface_area: f64,
    pub watertight: bool,
    pub degenerate_triangles: usize,
}

impl MeshAnalysis {
    pub fn extent(&self, axis: usize) -> f64 {
        self.bbox_max[axis] - self.bbox_min[axis]
    }
}

pub fn analyze(mesh: &Mesh) -> MeshAnalysis {
    let (bbox_min, bbox_max) = bounding_box(mesh);
    MeshAnalysis {
        vertex_count: mesh.vertices.len(),
        triangle_count: mesh.triangles.len(),
        bbox_min,
        bbox_max,
        volume: mesh_volume(mesh).abs(),
        surface_area: surface_area(mesh),
        watertight: is_watertight(mesh),
        degenerate_triangles: degenerate_triangle_count(mesh),
    }
}

/// Axis-aligned bounds; both corners are the origin for a mesh without vertices.
pub fn bounding_box(mesh: &Mesh) -> ([f64; 3], [f64; 3]) {
    if mesh.vertices.is_empty() {
        return ([0.0; 3], [0.0; 3]);
    }

    let mut min = [f64::INFINITY; 3];
    let mut max = [f64::NEG_INFINITY; 3];
    for vertex in &mesh.vertices {
        for axis in 0..3 {
            min[axis] = min[axis].min(vertex[axis]);
            max[axis] = max[axis].max(vertex[axis]);
        }
    }
    (min, max)
}

/// Signed volume via the divergence theorem. Positive for outward winding.
pub fn mesh_volume(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .map(|triangle| {
            let [a, b, c] = mesh.triangle_vertices(*triangle);
            dot(a, cross(b, c)) / 6.0
        })
        .sum()
}

pub fn surface_area(mesh: &Mesh) -> f64 {
    mesh.triangles
        .iter()
        .map(|triangle| {
            let [a, b, c] = mesh.triangle_vertices(*triangle);
            triangle_area(a, b, c)
        })
        .sum()
}

/// Every undirected edge is shared by exactly two faces.
pub fn is_watertight(mesh: &Mesh) -> bool {
    if mesh.triangles.is_empty() {
        return false;
    }

    let mut edge_counts: BTreeMap<(u32, u32), u32> = BTreeMap::new();
    for triangle in &mesh.triangles {
        let edges = [
            ordered_edge(triangle[0], triangle[1]),
            ordered_edge(triangle[1], triangle[2]),
            ordered_edge(triangle[2], triangle[0]),
        ];
        for edge in edges {
            *edge_counts.entry(edge).or_insert(0) += 1;
        }
    }

    edge_counts.values().all(|count| *count == 2)
}

pub fn degenerate_triangle_count(mesh: &Mesh) -> usize {
    mesh.triangles
        .iter()
        .filter(|triangle| {
            let [a, b, c] = mesh.triangle_vertices(**triangle);
            triangle_area(a, b, c) <= 1e-10
        })
        .count()
}

fn ordered_edge(a: u32, b: u32) -> (u32, u32) {
    if a < b { (a, b) } else { (b, a) }
}

fn triangle_area(a: [f64; 3], b: [f64; 3], c: [f64; 3]) -> f64 {
    0.5 * length(cross(sub(b, a), sub(c, a)))
}

pub(crate) fn sub(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [a[0] - b[0], a[1] - b[1], a[2] - b[2]]
}

pub(crate) fn length(v: [f64; 3]) -> f64 {
    (v[0] * v[0] + v[1] * v[1] + v[2] * v[2]).sqrt()
}

pub(crate) fn cross(a: [f64; 3], b: [f64; 3]) -> [f64; 3] {
    [
        a[1] * b[2] - a[2] * b[1],
        a[2] * b[0] - a[0] * b[2],
        a[0] * b[1] - a[1] * b[0],
    ]
}

fn dot(a: [f64; 3], b: [f64; 3]) -> f64 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

#[cfg(test)]
mod tests {
    use super::{analyze, bounding_box, is_watertight, mesh_volume};
    use crate::Mesh;

    fn tetrahedron() -> Mesh {
        Mesh {
            vertices: vec![
                [0.0, 0.0, 0.0],
                [1.0, 0.0, 0.0],
                [0.0, 1.0, 0.0],
                [0.0, 0.0, 1.0],
            ],
            triangles: vec![[0, 2, 1], [0, 1, 3], [0, 3, 2], [1, 2, 3]],
        }
    }

    #[test]
    fn tetrahedron_volume_is_one_sixth() {
        let volume = mesh_volume(&tetrahedron());
        assert!((volume - 1.0 / 6.0).abs() < 1e-12, "volume={volume}");
    }

    #[test]
    fn closed_tetrahedron_is_watertight() {
        assert!(is_watertight(&tetrahedron()));

        let mut open = tetrahedron();
        open.triangles.pop();
        assert!(!is_watertight(&open));
    }

    #[test]
    fn empty_mesh_is_not_watertight_and_has_zero_bounds() {
        let mesh = Mesh::empty();
        assert!(!is_watertight(&mesh));
        assert_eq!(bounding_box(&mesh), ([0.0; 3], [0.0; 3]));
    }

    #[test]
    fn analysis_reports_counts_and_extents() {
        let analysis = analyze(&tetrahedron());
        assert_eq!(analysis.vertex_count, 4);
        assert_eq!(analysis.triangle_count, 4);
        assert_eq!(analysis.degenerate_triangles, 0);
        assert!((analysis.extent(2) - 1.0).abs() < 1e-12);
        assert!(analysis.surface_area > 0.0);
    }
}
