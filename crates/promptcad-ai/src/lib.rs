//! Prompt-to-mesh pipeline: classify, extract, generate.
//!
//! [`Designer`] runs the deterministic stages on text. An optional
//! [`TextModel`] can first rewrite a loose request into a description the
//! extractor reads reliably; see [`Designer::interpret_and_build`].

pub mod gemini;
pub mod model;
pub mod pipeline;

pub use gemini::{GeminiClient, GeminiConfig, ModelError};
pub use model::{TextModel, default_instructions, interpretation_prompt};
pub use pipeline::{Design, DesignConfig, DesignReport, Designer, PipelineError, Stage};
