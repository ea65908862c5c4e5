//! Typed shape parameters. All lengths are millimeters.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Shape class selected by the classifier or by the caller.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ShapeTag {
    Box,
    Sphere,
    Cylinder,
    Cone,
    Pyramid,
    Torus,
    Composite,
}

impl ShapeTag {
    pub const ALL: [ShapeTag; 7] = [
        ShapeTag::Box,
        ShapeTag::Sphere,
        ShapeTag::Cylinder,
        ShapeTag::Cone,
        ShapeTag::Pyramid,
        ShapeTag::Torus,
        ShapeTag::Composite,
    ];

    pub const fn name(self) -> &'static str {
        match self {
            ShapeTag::Box => "box",
            ShapeTag::Sphere => "sphere",
            ShapeTag::Cylinder => "cylinder",
            ShapeTag::Cone => "cone",
            ShapeTag::Pyramid => "pyramid",
            ShapeTag::Torus => "torus",
            ShapeTag::Composite => "composite",
        }
    }

    /// Dimension fields in declaration order. Positional extraction assigns
    /// values in exactly this order.
    pub const fn fields(self) -> &'static [Field] {
        match self {
            ShapeTag::Box => &[Field::Length, Field::Width, Field::Height],
            ShapeTag::Sphere => &[Field::Radius],
            ShapeTag::Cylinder | ShapeTag::Cone => &[Field::Radius, Field::Height],
            ShapeTag::Pyramid => &[Field::Base, Field::Height],
            ShapeTag::Torus => &[Field::OuterRadius, Field::TubeRadius],
            ShapeTag::Composite => &[
                Field::Length,
                Field::Width,
                Field::Height,
                Field::WheelRadius,
                Field::WheelHeight,
            ],
        }
    }

    pub const fn is_curved(self) -> bool {
        !matches!(self, ShapeTag::Box | ShapeTag::Pyramid)
    }
}

impl fmt::Display for ShapeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown shape '{0}' (expected box, sphere, cylinder, cone, pyramid, torus or car)")]
pub struct UnknownShape(pub String);

impl FromStr for ShapeTag {
    type Err = UnknownShape;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let shape = match value.trim().to_ascii_lowercase().as_str() {
            "box" => ShapeTag::Box,
            "sphere" => ShapeTag::Sphere,
            "cylinder" => ShapeTag::Cylinder,
            "cone" => ShapeTag::Cone,
            "pyramid" => ShapeTag::Pyramid,
            "torus" => ShapeTag::Torus,
            "composite" | "car" | "toy car" | "toy_car" | "toy-car" => ShapeTag::Composite,
            _ => return Err(UnknownShape(value.to_string())),
        };
        Ok(shape)
    }
}

/// A named dimension of some shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Length,
    Width,
    Height,
    Radius,
    Base,
    OuterRadius,
    TubeRadius,
    WheelRadius,
    WheelHeight,
}

impl Field {
    pub const fn is_wheel_field(self) -> bool {
        matches!(self, Field::WheelRadius | Field::WheelHeight)
    }

    pub const fn name(self) -> &'static str {
        match self {
            Field::Length => "length",
            Field::Width => "width",
            Field::Height => "height",
            Field::Radius => "radius",
            Field::Base => "base",
            Field::OuterRadius => "outer_radius",
            Field::TubeRadius => "tube_radius",
            Field::WheelRadius => "wheel_radius",
            Field::WheelHeight => "wheel_height",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Field {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let normalized = value.trim().to_ascii_lowercase().replace(['-', ' '], "_");
        let field = match normalized.as_str() {
            "length" => Field::Length,
            "width" => Field::Width,
            "height" => Field::Height,
            "radius" => Field::Radius,
            "base" => Field::Base,
            "outer_radius" => Field::OuterRadius,
            "tube_radius" => Field::TubeRadius,
            "wheel_radius" => Field::WheelRadius,
            "wheel_height" | "wheel_width" => Field::WheelHeight,
            _ => return Err(format!("unknown dimension '{value}'")),
        };
        Ok(field)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxParams {
    pub length: f64,
    pub width: f64,
    pub height: f64,
}

impl BoxParams {
    pub fn validate(&self) -> Result<(), ParameterError> {
        require_positive(Field::Length, self.length)?;
        require_positive(Field::Width, self.width)?;
        require_positive(Field::Height, self.height)?;
        Ok(())
    }
}

/// A box body with wheels hung under its four bottom corners.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CompositeBody {
    pub body: BoxParams,
    pub wheel_radius: f64,
    pub wheel_height: f64,
    pub wheel_count: u32,
}

impl CompositeBody {
    pub const DEFAULT_WHEEL_COUNT: u32 = 4;

    pub fn validate(&self) -> Result<(), ParameterError> {
        self.body.validate()?;
        if self.wheel_count != 0 && self.wheel_count != 4 {
            return Err(ParameterError::WheelCount(self.wheel_count));
        }
        require_positive(Field::WheelRadius, self.wheel_radius)?;
        require_positive(Field::WheelHeight, self.wheel_height)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "shape", rename_all = "snake_case")]
pub enum ShapeParameters {
    Box(BoxParams),
    Sphere { radius: f64 },
    Cylinder { radius: f64, height: f64 },
    Cone { radius: f64, height: f64 },
    Pyramid { base: f64, height: f64 },
    Torus { outer_radius: f64, tube_radius: f64 },
    Composite(CompositeBody),
}

impl ShapeParameters {
    pub fn tag(&self) -> ShapeTag {
        match self {
            ShapeParameters::Box(_) => ShapeTag::Box,
            ShapeParameters::Sphere { .. } => ShapeTag::Sphere,
            ShapeParameters::Cylinder { .. } => ShapeTag::Cylinder,
            ShapeParameters::Cone { .. } => ShapeTag::Cone,
            ShapeParameters::Pyramid { .. } => ShapeTag::Pyramid,
            ShapeParameters::Torus { .. } => ShapeTag::Torus,
            ShapeParameters::Composite(_) => ShapeTag::Composite,
        }
    }

    /// Builds the variant for `tag` from a field lookup. Returns `None` when
    /// any declared field is absent; values are taken as given and checked by
    /// [`ShapeParameters::validate`].
    pub fn from_fields(
        tag: ShapeTag,
        wheel_count: u32,
        lookup: impl Fn(Field) -> Option<f64>,
    ) -> Option<Self> {
        let params = match tag {
            ShapeTag::Box => ShapeParameters::Box(BoxParams {
                length: lookup(Field::Length)?,
                width: lookup(Field::Width)?,
                height: lookup(Field::Height)?,
            }),
            ShapeTag::Sphere => ShapeParameters::Sphere {
                radius: lookup(Field::Radius)?,
            },
            ShapeTag::Cylinder => ShapeParameters::Cylinder {
                radius: lookup(Field::Radius)?,
                height: lookup(Field::Height)?,
            },
            ShapeTag::Cone => ShapeParameters::Cone {
                radius: lookup(Field::Radius)?,
                height: lookup(Field::Height)?,
            },
            ShapeTag::Pyramid => ShapeParameters::Pyramid {
                base: lookup(Field::Base)?,
                height: lookup(Field::Height)?,
            },
            ShapeTag::Torus => ShapeParameters::Torus {
                outer_radius: lookup(Field::OuterRadius)?,
                tube_radius: lookup(Field::TubeRadius)?,
            },
            ShapeTag::Composite => ShapeParameters::Composite(CompositeBody {
                body: BoxParams {
                    length: lookup(Field::Length)?,
                    width: lookup(Field::Width)?,
                    height: lookup(Field::Height)?,
                },
                wheel_radius: lookup(Field::WheelRadius)?,
                wheel_height: lookup(Field::WheelHeight)?,
                wheel_count,
            }),
        };
        Some(params)
    }

    pub fn get(&self, field: Field) -> Option<f64> {
        self.dimensions()
            .into_iter()
            .find_map(|(name, value)| (name == field).then_some(value))
    }

    /// Dimension values in the shape's declared field order.
    pub fn dimensions(&self) -> Vec<(Field, f64)> {
        match *self {
            ShapeParameters::Box(b) => vec![
                (Field::Length, b.length),
                (Field::Width, b.width),
                (Field::Height, b.height),
            ],
            ShapeParameters::Sphere { radius } => vec![(Field::Radius, radius)],
            ShapeParameters::Cylinder { radius, height }
            | ShapeParameters::Cone { radius, height } => {
                vec![(Field::Radius, radius), (Field::Height, height)]
            }
            ShapeParameters::Pyramid { base, height } => {
                vec![(Field::Base, base), (Field::Height, height)]
            }
            ShapeParameters::Torus {
                outer_radius,
                tube_radius,
            } => vec![
                (Field::OuterRadius, outer_radius),
                (Field::TubeRadius, tube_radius),
            ],
            ShapeParameters::Composite(c) => vec![
                (Field::Length, c.body.length),
                (Field::Width, c.body.width),
                (Field::Height, c.body.height),
                (Field::WheelRadius, c.wheel_radius),
                (Field::WheelHeight, c.wheel_height),
            ],
        }
    }

    /// Checks every field is finite and strictly positive, plus the
    /// shape-specific relations (torus radii, wheel count).
    pub fn validate(&self) -> Result<(), ParameterError> {
        match self {
            ShapeParameters::Box(b) => b.validate(),
            ShapeParameters::Torus {
                outer_radius,
                tube_radius,
            } => {
                require_positive(Field::OuterRadius, *outer_radius)?;
                require_positive(Field::TubeRadius, *tube_radius)?;
                if outer_radius <= tube_radius {
                    return Err(ParameterError::TorusRadii {
                        outer: *outer_radius,
                        tube: *tube_radius,
                    });
                }
                Ok(())
            }
            ShapeParameters::Composite(c) => c.validate(),
            other => other
                .dimensions()
                .into_iter()
                .try_for_each(|(field, value)| require_positive(field, value).map(|_| ())),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum ParameterError {
    #[error("{field} must be a finite number, got {value}")]
    NonFinite { field: Field, value: f64 },
    #[error("{field} must be greater than zero, got {value}")]
    NonPositive { field: Field, value: f64 },
    #[error("outer_radius ({outer}) must be larger than tube_radius ({tube})")]
    TorusRadii { outer: f64, tube: f64 },
    #[error("wheel count must be 0 or 4, got {0}")]
    WheelCount(u32),
    #[error("resolution must be at least {min}, got {value}")]
    Resolution { value: usize, min: usize },
}

impl ParameterError {
    /// The offending dimension, when the error concerns a single field.
    pub fn field(&self) -> Option<Field> {
        match self {
            ParameterError::NonFinite { field, .. } | ParameterError::NonPositive { field, .. } => {
                Some(*field)
            }
            ParameterError::TorusRadii { .. } => Some(Field::TubeRadius),
            ParameterError::WheelCount(_) | ParameterError::Resolution { .. } => None,
        }
    }
}

pub(crate) fn require_positive(field: Field, value: f64) -> Result<f64, ParameterError> {
    if !value.is_finite() {
        return Err(ParameterError::NonFinite { field, value });
    }
    if value <= 0.0 {
        return Err(ParameterError::NonPositive { field, value });
    }
    Ok(value)
}
