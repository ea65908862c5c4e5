//! Procedural triangle-mesh generators for the primitive shapes.
//!
//! Every generator is deterministic, centers its solid on the origin with the
//! shape axis along +Z, and winds faces counter-clockwise seen from outside.

use std::f64::consts::{PI, TAU};

use promptcad_mesh::Mesh;
use tracing::debug;

use crate::composite::assemble_composite;
use crate::params::{BoxParams, Field, ParameterError, ShapeParameters, require_positive};

pub const DEFAULT_RESOLUTION: usize = 32;
pub const MIN_RESOLUTION: usize = 3;

/// Tessellation settings shared by the curved generators.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeshOptions {
    /// Angular segments (and sphere stacks / torus tube steps).
    pub resolution: usize,
    /// Close cylinder and cone ends with center fans.
    pub closed_ends: bool,
}

impl Default for MeshOptions {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            closed_ends: true,
        }
    }
}

impl MeshOptions {
    pub fn with_resolution(resolution: usize) -> Self {
        Self {
            resolution,
            ..Self::default()
        }
    }
}

/// Validates `params` and dispatches to the matching generator.
pub fn generate(params: &ShapeParameters, options: &MeshOptions) -> Result<Mesh, ParameterError> {
    params.validate()?;
    let mesh = match *params {
        ShapeParameters::Box(ref body) => generate_box(body)?,
        ShapeParameters::Sphere { radius } => generate_sphere(radius, options.resolution)?,
        ShapeParameters::Cylinder { radius, height } => {
            generate_cylinder(radius, height, options.resolution, options.closed_ends)?
        }
        ShapeParameters::Cone { radius, height } => {
            generate_cone(radius, height, options.resolution, options.closed_ends)?
        }
        ShapeParameters::Pyramid { base, height } => generate_pyramid(base, height)?,
        ShapeParameters::Torus {
            outer_radius,
            tube_radius,
        } => generate_torus(outer_radius, tube_radius, options.resolution)?,
        ShapeParameters::Composite(ref body) => assemble_composite(body, options)?,
    };
    debug!(
        shape = %params.tag(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "generated mesh"
    );
    Ok(mesh)
}

/// Corners 0..4 are the -Z ring, 4..8 the +Z ring, in the same order.
const BOX_TRIANGLES: [[u32; 3]; 12] = [
    // -Z
    [0, 2, 1],
    [0, 3, 2],
    // +Z
    [4, 5, 6],
    [4, 6, 7],
    // -Y
    [0, 1, 5],
    [0, 5, 4],
    // +Y
    [3, 7, 6],
    [3, 6, 2],
    // -X
    [0, 4, 7],
    [0, 7, 3],
    // +X
    [1, 2, 6],
    [1, 6, 5],
];

/// Axis-aligned box with eight corners at the half-extents.
pub fn generate_box(params: &BoxParams) -> Result<Mesh, ParameterError> {
    params.validate()?;
    let hx = params.length / 2.0;
    let hy = params.width / 2.0;
    let hz = params.height / 2.0;

    // Each layer walks the rectangle counter-clockwise seen from +Z.
    let mut mesh = Mesh::with_capacity(8, 12);
    for z in [-hz, hz] {
        for [x, y] in [[-hx, -hy], [hx, -hy], [hx, hy], [-hx, hy]] {
            mesh.push_vertex([x, y, z]);
        }
    }
    mesh.triangles.extend_from_slice(&BOX_TRIANGLES);
    Ok(mesh)
}

/// Latitude/longitude sphere with `resolution` stacks and slices.
///
/// Rings run from the +Z pole (φ = 0) to the -Z pole (φ = π); both pole rings
/// collapse onto the exact pole point, so the cells touching them produce
/// zero-area triangles.
pub fn generate_sphere(radius: f64, resolution: usize) -> Result<Mesh, ParameterError> {
    require_positive(Field::Radius, radius)?;
    check_resolution(resolution)?;
    let stacks = resolution;
    let slices = resolution;

    let mut mesh = Mesh::with_capacity((stacks + 1) * slices, 2 * stacks * slices);
    for i in 0..=stacks {
        let phi = PI * i as f64 / stacks as f64;
        let (sin_phi, cos_phi) = match i {
            0 => (0.0, 1.0),
            i if i == stacks => (0.0, -1.0),
            _ => phi.sin_cos(),
        };
        for j in 0..slices {
            let (sin_theta, cos_theta) = (TAU * j as f64 / slices as f64).sin_cos();
            mesh.push_vertex([
                radius * sin_phi * cos_theta,
                radius * sin_phi * sin_theta,
                radius * cos_phi,
            ]);
        }
    }

    let index = |ring: usize, slice: usize| (ring * slices + slice % slices) as u32;
    for i in 0..stacks {
        for j in 0..slices {
            let a = index(i, j);
            let b = index(i, j + 1);
            let c = index(i + 1, j + 1);
            let d = index(i + 1, j);
            mesh.push_triangle(a, d, c);
            mesh.push_triangle(a, c, b);
        }
    }
    Ok(mesh)
}

/// Cylinder of the given radius between z = -height/2 and z = +height/2.
pub fn generate_cylinder(
    radius: f64,
    height: f64,
    resolution: usize,
    closed_ends: bool,
) -> Result<Mesh, ParameterError> {
    require_positive(Field::Radius, radius)?;
    require_positive(Field::Height, height)?;
    check_resolution(resolution)?;
    let n = resolution;
    let half = height / 2.0;

    let mut mesh = Mesh::with_capacity(2 * n + 2, 4 * n);
    push_ring(&mut mesh, radius, -half, n);
    push_ring(&mut mesh, radius, half, n);

    for j in 0..n {
        let b0 = j as u32;
        let b1 = ((j + 1) % n) as u32;
        let t0 = (n + j) as u32;
        let t1 = (n + (j + 1) % n) as u32;
        mesh.push_triangle(b0, b1, t1);
        mesh.push_triangle(b0, t1, t0);
    }

    if closed_ends {
        let bottom = mesh.push_vertex([0.0, 0.0, -half]);
        let top = mesh.push_vertex([0.0, 0.0, half]);
        for j in 0..n {
            let next = (j + 1) % n;
            mesh.push_triangle(bottom, next as u32, j as u32);
            mesh.push_triangle(top, (n + j) as u32, (n + next) as u32);
        }
    }
    Ok(mesh)
}

/// Cone with its apex at z = +height/2 over a base ring at z = -height/2.
pub fn generate_cone(
    radius: f64,
    height: f64,
    resolution: usize,
    closed_ends: bool,
) -> Result<Mesh, ParameterError> {
    require_positive(Field::Radius, radius)?;
    require_positive(Field::Height, height)?;
    check_resolution(resolution)?;
    let n = resolution;
    let half = height / 2.0;

    let mut mesh = Mesh::with_capacity(n + 2, 2 * n);
    let apex = mesh.push_vertex([0.0, 0.0, half]);
    push_ring(&mut mesh, radius, -half, n);

    let ring = |j: usize| (1 + j % n) as u32;
    for j in 0..n {
        mesh.push_triangle(ring(j), ring(j + 1), apex);
    }
    if closed_ends {
        let center = mesh.push_vertex([0.0, 0.0, -half]);
        for j in 0..n {
            mesh.push_triangle(center, ring(j + 1), ring(j));
        }
    }
    Ok(mesh)
}

/// Square pyramid: four base corners at z = -height/2, apex at z = +height/2.
pub fn generate_pyramid(base: f64, height: f64) -> Result<Mesh, ParameterError> {
    require_positive(Field::Base, base)?;
    require_positive(Field::Height, height)?;
    let hb = base / 2.0;
    let hz = height / 2.0;

    let mut mesh = Mesh::with_capacity(5, 6);
    mesh.push_vertex([-hb, -hb, -hz]);
    mesh.push_vertex([hb, -hb, -hz]);
    mesh.push_vertex([hb, hb, -hz]);
    mesh.push_vertex([-hb, hb, -hz]);
    let apex = mesh.push_vertex([0.0, 0.0, hz]);

    for corner in 0..4u32 {
        mesh.push_triangle(corner, (corner + 1) % 4, apex);
    }
    mesh.push_triangle(0, 2, 1);
    mesh.push_triangle(0, 3, 2);
    Ok(mesh)
}

/// Ring torus around the Z axis; `outer_radius` is the distance from the
/// center to the middle of the tube.
pub fn generate_torus(
    outer_radius: f64,
    tube_radius: f64,
    resolution: usize,
) -> Result<Mesh, ParameterError> {
    ShapeParameters::Torus {
        outer_radius,
        tube_radius,
    }
    .validate()?;
    check_resolution(resolution)?;
    let n = resolution;

    let mut mesh = Mesh::with_capacity(n * n, 2 * n * n);
    for i in 0..n {
        let (sin_u, cos_u) = (TAU * i as f64 / n as f64).sin_cos();
        for k in 0..n {
            let (sin_v, cos_v) = (TAU * k as f64 / n as f64).sin_cos();
            let ring = outer_radius + tube_radius * cos_v;
            mesh.push_vertex([ring * cos_u, ring * sin_u, tube_radius * sin_v]);
        }
    }

    let index = |i: usize, k: usize| ((i % n) * n + k % n) as u32;
    for i in 0..n {
        for k in 0..n {
            let a = index(i, k);
            let b = index(i + 1, k);
            let c = index(i + 1, k + 1);
            let d = index(i, k + 1);
            mesh.push_triangle(a, b, c);
            mesh.push_triangle(a, c, d);
        }
    }
    Ok(mesh)
}

fn push_ring(mesh: &mut Mesh, radius: f64, z: f64, segments: usize) {
    for j in 0..segments {
        let (sin, cos) = (TAU * j as f64 / segments as f64).sin_cos();
        mesh.push_vertex([radius * cos, radius * sin, z]);
    }
}

fn check_resolution(resolution: usize) -> Result<(), ParameterError> {
    if resolution < MIN_RESOLUTION {
        return Err(ParameterError::Resolution {
            value: resolution,
            min: MIN_RESOLUTION,
        });
    }
    Ok(())
}
