use std::collections::BTreeMap;

use promptcad_core::{
    DEFAULT_RESOLUTION, Field, MeshOptions, ParameterError, ShapeParameters, ShapeTag, Unit,
    generate,
};
use promptcad_mesh::{Mesh, MeshAnalysis, analyze};
use promptcad_text::{
    AppliedDefault, ExtractError, ExtractOptions, Grammar, PartialParameters, ShapeDefaults,
    classify, extract_partial, suggest_shape,
};
use serde::Serialize;
use thiserror::Error;
use tracing::{field, info, info_span, warn};

use crate::model::{TextModel, interpretation_prompt};

/// Knobs for one pipeline run. Presentation options (colors, camera) never
/// reach this struct.
#[derive(Debug, Clone, PartialEq)]
pub struct DesignConfig {
    pub resolution: usize,
    pub grammar: Grammar,
    pub unit_override: Option<Unit>,
    /// Skips classification when set.
    pub shape_override: Option<ShapeTag>,
    pub closed_ends: bool,
    /// Explicit field values in millimeters; they win over extracted ones.
    pub overrides: BTreeMap<Field, f64>,
    /// Fills fields still missing after extraction and overrides. Every
    /// filled field is reported in [`Design::defaults_applied`].
    pub defaults: Option<ShapeDefaults>,
}

impl Default for DesignConfig {
    fn default() -> Self {
        Self {
            resolution: DEFAULT_RESOLUTION,
            grammar: Grammar::Auto,
            unit_override: None,
            shape_override: None,
            closed_ends: true,
            overrides: BTreeMap::new(),
            defaults: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    Interpret,
    Classify,
    Extract,
    Generate,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Stage::Interpret => "interpret",
            Stage::Classify => "classify",
            Stage::Extract => "extract",
            Stage::Generate => "generate",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum PipelineError {
    #[error("no supported shape found in the prompt{}", suggestion_hint(.suggestion))]
    UnrecognizedShape { suggestion: Option<String> },
    #[error("not enough dimensions for {}: missing {}", .0.shape, missing_fields(.0))]
    InsufficientDimensions(Box<PartialParameters>),
    #[error(transparent)]
    Extraction(ExtractError),
    #[error("invalid {shape} geometry: {source}")]
    InvalidGeometry {
        shape: ShapeTag,
        #[source]
        source: ParameterError,
    },
    #[error("text model failed: {0}")]
    ExternalService(String),
}

fn suggestion_hint(suggestion: &Option<String>) -> String {
    suggestion
        .as_ref()
        .map(|word| format!(" (did you mean '{word}'?)"))
        .unwrap_or_default()
}

fn missing_fields(partial: &PartialParameters) -> String {
    partial
        .missing()
        .iter()
        .map(|field| field.name())
        .collect::<Vec<_>>()
        .join(", ")
}

impl From<ExtractError> for PipelineError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Incomplete(partial) => PipelineError::InsufficientDimensions(partial),
            other => PipelineError::Extraction(other),
        }
    }
}

impl PipelineError {
    pub fn stage(&self) -> Stage {
        match self {
            PipelineError::ExternalService(_) => Stage::Interpret,
            PipelineError::UnrecognizedShape { .. } => Stage::Classify,
            PipelineError::InsufficientDimensions(_) | PipelineError::Extraction(_) => {
                Stage::Extract
            }
            PipelineError::InvalidGeometry { .. } => Stage::Generate,
        }
    }

    /// Stable snake_case name for API responses.
    pub fn kind(&self) -> &'static str {
        match self {
            PipelineError::UnrecognizedShape { .. } => "unrecognized_shape",
            PipelineError::InsufficientDimensions(_) => "insufficient_dimensions",
            PipelineError::Extraction(ExtractError::UnsupportedUnit { .. }) => "unsupported_unit",
            PipelineError::Extraction(_) => "invalid_override",
            PipelineError::InvalidGeometry { .. } => "invalid_geometry",
            PipelineError::ExternalService(_) => "external_service",
        }
    }

    /// The dimension at fault, when one is.
    pub fn field(&self) -> Option<Field> {
        match self {
            PipelineError::InsufficientDimensions(partial) => partial.missing().first().copied(),
            PipelineError::Extraction(ExtractError::FieldNotApplicable { field, .. }) => {
                Some(*field)
            }
            PipelineError::InvalidGeometry { source, .. } => source.field(),
            _ => None,
        }
    }
}

/// Mesh measurements reported alongside a design.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DesignReport {
    pub shape: ShapeTag,
    pub resolution: usize,
    #[serde(flatten)]
    pub mesh: MeshAnalysis,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Design {
    pub shape: ShapeTag,
    pub parameters: ShapeParameters,
    pub grammar: Grammar,
    pub unit: Unit,
    pub defaults_applied: Vec<AppliedDefault>,
    /// Model rewrite the design was built from, when one was requested.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub interpreted: Option<String>,
    pub report: DesignReport,
    #[serde(skip)]
    pub mesh: Mesh,
}

#[derive(Debug, Clone, Default)]
pub struct Designer {
    config: DesignConfig,
}

impl Designer {
    pub fn new(config: DesignConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DesignConfig {
        &self.config
    }

    /// Runs classify, extract and generate on `text`. Any stage failure
    /// aborts the run; there is no partial mesh.
    pub fn build(&self, text: &str) -> Result<Design, PipelineError> {
        let span = info_span!(
            "design",
            shape = field::Empty,
            grammar = %self.config.grammar,
            resolution = self.config.resolution
        );
        let _guard = span.enter();

        let shape = match self.config.shape_override {
            Some(shape) => shape,
            None => classify(text).ok_or_else(|| {
                let suggestion = suggest_shape(text).map(str::to_string);
                warn!(?suggestion, "prompt names no supported shape");
                PipelineError::UnrecognizedShape { suggestion }
            })?,
        };
        span.record("shape", field::display(shape));

        let options = ExtractOptions {
            grammar: self.config.grammar,
            unit_override: self.config.unit_override,
        };
        let mut partial = extract_partial(text, shape, &options)?;
        for (&target, &millimeters) in &self.config.overrides {
            partial.set(target, millimeters)?;
        }
        if let Some(defaults) = &self.config.defaults {
            partial = partial.with_defaults(defaults);
        }
        let extraction = partial.complete()?;

        let mesh_options = MeshOptions {
            resolution: self.config.resolution,
            closed_ends: self.config.closed_ends,
        };
        let mesh = generate(&extraction.parameters, &mesh_options)
            .map_err(|source| PipelineError::InvalidGeometry { shape, source })?;

        let report = DesignReport {
            shape,
            resolution: self.config.resolution,
            mesh: analyze(&mesh),
        };
        info!(
            vertices = report.mesh.vertex_count,
            triangles = report.mesh.triangle_count,
            defaults = extraction.defaults_applied.len(),
            "design built"
        );

        Ok(Design {
            shape,
            parameters: extraction.parameters,
            grammar: extraction.grammar,
            unit: extraction.unit,
            defaults_applied: extraction.defaults_applied,
            interpreted: None,
            report,
            mesh,
        })
    }

    /// Asks `model` to restate `prompt` with explicit dimensions, then builds
    /// from the model's text. Model failures and empty answers are reported
    /// as-is; nothing is retried.
    pub fn interpret_and_build<M: TextModel + ?Sized>(
        &self,
        model: &mut M,
        prompt: &str,
    ) -> Result<Design, PipelineError> {
        let response = model
            .describe(&interpretation_prompt(prompt))
            .map_err(PipelineError::ExternalService)?;
        let interpreted = response.trim();
        if interpreted.is_empty() {
            return Err(PipelineError::ExternalService(
                "text model returned an empty response".to_string(),
            ));
        }
        info!(interpreted, "text model interpretation");

        let mut design = self.build(interpreted)?;
        design.interpreted = Some(interpreted.to_string());
        Ok(design)
    }
}
