//! Box body plus wheels, concatenated into one mesh without boolean union.

use std::f64::consts::FRAC_PI_2;

use promptcad_mesh::{Mesh, concatenate};
use tracing::debug;

use crate::params::{CompositeBody, ParameterError};
use crate::primitives::{MeshOptions, generate_box, generate_cylinder};
use crate::transforms::{rotate_x, translate};

/// Wheel hub centers under the body, symmetric about the body center.
///
/// Wheels sit `wheel_radius` in from the front and back faces (clamped to
/// the center line on short bodies), centered on the side faces in Y, and at
/// the body's bottom plane in Z. Order: front-left, front-right, rear-left,
/// rear-right. Empty when `wheel_count` is zero.
pub fn wheel_positions(params: &CompositeBody) -> Vec<[f64; 3]> {
    if params.wheel_count == 0 {
        return Vec::new();
    }
    let x = (params.body.length / 2.0 - params.wheel_radius).max(0.0);
    let y = params.body.width / 2.0;
    let z = -params.body.height / 2.0;
    vec![[x, y, z], [x, -y, z], [-x, y, z], [-x, -y, z]]
}

/// Generates the body once and one upright cylinder per wheel position.
///
/// Wheels are cylinders turned a quarter about X so their axle runs along Y.
/// Parts may overlap; the result is a visual approximation, not a closed
/// solid.
pub fn assemble_composite(
    params: &CompositeBody,
    options: &MeshOptions,
) -> Result<Mesh, ParameterError> {
    params.validate()?;
    let body = generate_box(&params.body)?;

    let mut wheel = generate_cylinder(
        params.wheel_radius,
        params.wheel_height,
        options.resolution,
        options.closed_ends,
    )?;
    rotate_x(&mut wheel, FRAC_PI_2);

    let positions = wheel_positions(params);
    let wheels = positions.iter().map(|position| {
        let mut part = wheel.clone();
        translate(&mut part, *position);
        part
    });
    let mesh = concatenate(std::iter::once(body).chain(wheels));

    debug!(
        wheels = positions.len(),
        vertices = mesh.vertex_count(),
        triangles = mesh.triangle_count(),
        "assembled composite"
    );
    Ok(mesh)
}

#[cfg(test)]
mod tests {
    use promptcad_mesh::{Mesh, is_watertight, mesh_volume};
    use proptest::prelude::*;

    use super::{assemble_composite, wheel_positions};
    use crate::params::{BoxParams, CompositeBody, ParameterError};
    use crate::primitives::{MeshOptions, generate_box, generate_cylinder};

    fn toy_car(wheel_count: u32) -> CompositeBody {
        CompositeBody {
            body: BoxParams {
                length: 40.0,
                width: 20.0,
                height: 10.0,
            },
            wheel_radius: 5.0,
            wheel_height: 3.0,
            wheel_count,
        }
    }

    #[test]
    fn four_wheels_are_symmetric_about_the_center() {
        let positions = wheel_positions(&toy_car(4));
        assert_eq!(positions.len(), 4);
        let sum = positions
            .iter()
            .fold([0.0; 3], |acc, p| [acc[0] + p[0], acc[1] + p[1], acc[2] + p[2]]);
        assert!(sum[0].abs() < 1e-12 && sum[1].abs() < 1e-12);
        assert!(positions.iter().all(|p| p[2] == -5.0));
        assert_eq!(positions[0], [15.0, 10.0, -5.0]);
    }

    #[test]
    fn composite_concatenates_body_and_wheels() {
        let options = MeshOptions::with_resolution(16);
        let mesh = assemble_composite(&toy_car(4), &options).expect("car should assemble");
        let body = generate_box(&toy_car(4).body).expect("box should generate");
        let wheel = generate_cylinder(5.0, 3.0, 16, true).expect("wheel should generate");

        assert_eq!(
            mesh.vertex_count(),
            body.vertex_count() + 4 * wheel.vertex_count()
        );
        assert_eq!(
            mesh.triangle_count(),
            body.triangle_count() + 4 * wheel.triangle_count()
        );
        assert_eq!(&mesh.vertices[..8], &body.vertices[..]);
        let max = mesh.max_index().expect("mesh has faces");
        assert!((max as usize) < mesh.vertex_count());
    }

    #[test]
    fn wheels_stand_upright_along_y() {
        let options = MeshOptions::with_resolution(12);
        let mesh = assemble_composite(&toy_car(4), &options).expect("car should assemble");
        // First wheel starts right after the eight body corners.
        let wheel = &mesh.vertices[8..8 + 26];
        let min_y = wheel.iter().map(|v| v[1]).fold(f64::INFINITY, f64::min);
        let max_y = wheel.iter().map(|v| v[1]).fold(f64::NEG_INFINITY, f64::max);
        assert!((max_y - min_y - 3.0).abs() < 1e-9);
        let max_z = wheel.iter().map(|v| v[2]).fold(f64::NEG_INFINITY, f64::max);
        assert!((max_z - 0.0).abs() < 1e-9);
    }

    #[test]
    fn zero_wheels_yield_the_body_alone() {
        let mesh = assemble_composite(&toy_car(0), &MeshOptions::default())
            .expect("body should assemble");
        assert_eq!(mesh.vertex_count(), 8);
        assert_eq!(mesh.triangle_count(), 12);
        assert!((mesh_volume(&mesh) - 40.0 * 20.0 * 10.0).abs() < 1e-9);
    }

    #[test]
    fn unsupported_wheel_count_is_rejected() {
        assert_eq!(
            assemble_composite(&toy_car(6), &MeshOptions::default()),
            Err(ParameterError::WheelCount(6))
        );
    }

    proptest! {
        #[test]
        fn composite_indices_stay_in_bounds(
            length in 1.0f64..200.0,
            width in 1.0f64..200.0,
            height in 1.0f64..200.0,
            wheel_radius in 0.1f64..50.0,
            wheel_height in 0.1f64..20.0,
            resolution in 3usize..24,
        ) {
            let car = CompositeBody {
                body: BoxParams { length, width, height },
                wheel_radius,
                wheel_height,
                wheel_count: 4,
            };
            let mesh = assemble_composite(&car, &MeshOptions::with_resolution(resolution))
                .expect("car should assemble");
            let max = mesh.max_index().expect("mesh has faces");
            prop_assert!((max as usize) < mesh.vertex_count());

            let body = Mesh {
                vertices: mesh.vertices[..8].to_vec(),
                triangles: mesh.triangles[..12].to_vec(),
            };
            let expected = length * width * height;
            prop_assert!(is_watertight(&body));
            prop_assert!((mesh_volume(&body) - expected).abs() <= 1e-9 * expected);
        }
    }
}
