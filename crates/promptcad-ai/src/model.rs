const DEFAULT_INSTRUCTIONS: &str = r#"You turn requests for simple 3D parts into one plain sentence that names the part and all of its dimensions.

Supported parts and their dimensions:
- box: length, width, height
- sphere: radius
- cylinder: radius, height
- cone: radius, height
- pyramid: base, height (square base)
- torus: outer radius, tube radius (outer radius larger than tube radius)
- toy car: length, width, height, wheel radius, wheel width, and a wheel count of 4 or 0

Rules:
- Start with the part name, then write every dimension as "<name> <number><unit>", e.g. "Create a cylinder with radius 5mm and height 20mm."
- Use only mm, cm, m, in, ft or yd.
- Choose sensible values for dimensions the request leaves out.
- Answer with the sentence only."#;

/// Text-generation collaborator used to rewrite loose requests.
///
/// Errors are plain messages; the pipeline reports them without retrying.
pub trait TextModel {
    fn describe(&mut self, prompt: &str) -> Result<String, String>;
}

impl<T: TextModel + ?Sized> TextModel for Box<T> {
    fn describe(&mut self, prompt: &str) -> Result<String, String> {
        (**self).describe(prompt)
    }
}

pub fn default_instructions() -> &'static str {
    DEFAULT_INSTRUCTIONS
}

/// Full prompt sent to the model for a user request.
pub fn interpretation_prompt(request: &str) -> String {
    format!("{DEFAULT_INSTRUCTIONS}\n\nRequest: {}", request.trim())
}
