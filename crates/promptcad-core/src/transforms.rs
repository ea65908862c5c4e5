use promptcad_mesh::Mesh;

/// Shifts every vertex by `offset`.
pub fn translate(mesh: &mut Mesh, offset: [f64; 3]) {
    for vertex in &mut mesh.vertices {
        vertex[0] += offset[0];
        vertex[1] += offset[1];
        vertex[2] += offset[2];
    }
}

/// Rotates every vertex about the X axis by `angle` radians (right-handed).
///
/// A proper rotation, so face winding and orientation are preserved.
pub fn rotate_x(mesh: &mut Mesh, angle: f64) {
    let (sin, cos) = angle.sin_cos();
    for vertex in &mut mesh.vertices {
        let [x, y, z] = *vertex;
        *vertex = [x, y * cos - z * sin, y * sin + z * cos];
    }
}
