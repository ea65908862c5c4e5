//! Turns free-form prompt text into a shape class and typed dimensions.

pub mod classify;
pub mod extract;
mod scan;

pub use classify::{ShapeMatch, classify, find_shape, suggest_shape};
pub use extract::{
    AppliedDefault, ExtractError, ExtractOptions, Extraction, Grammar, PartialParameters,
    ShapeDefaults, extract, extract_partial,
};
