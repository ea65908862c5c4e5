pub mod composite;
pub mod params;
pub mod primitives;
pub mod transforms;
pub mod units;

pub use composite::{assemble_composite, wheel_positions};
pub use params::{
    BoxParams, CompositeBody, Field, ParameterError, ShapeParameters, ShapeTag, UnknownShape,
};
pub use primitives::{
    DEFAULT_RESOLUTION, MIN_RESOLUTION, MeshOptions, generate, generate_box, generate_cone,
    generate_cylinder, generate_pyramid, generate_sphere, generate_torus,
};
pub use transforms::{rotate_x, translate};
pub use units::{Unit, UnknownUnit, from_millimeters, to_millimeters};

pub use promptcad_mesh::Mesh;
