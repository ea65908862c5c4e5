use promptcad_ai::{GeminiConfig, ModelError};
use promptcad_core::DEFAULT_RESOLUTION;
use tracing::warn;

/// Server settings, read from the environment at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    /// Resolution used when a request does not name one.
    pub default_resolution: usize,
    /// Requests above this are refused with 413.
    pub max_resolution: usize,
    /// Text model for `interpret` requests; `None` disables them.
    pub gemini: Option<GeminiConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            port: 3000,
            default_resolution: DEFAULT_RESOLUTION,
            max_resolution: 256,
            gemini: None,
        }
    }
}

impl Config {
    /// Reads `PORT`, `DEFAULT_RESOLUTION`, `MAX_RESOLUTION` and the Gemini
    /// variables. Unparseable values fall back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::from_lookup(|name| std::env::var(name).ok());
        config.gemini = match GeminiConfig::from_env() {
            Ok(gemini) => Some(gemini),
            Err(ModelError::MissingApiKey) => None,
            Err(err) => {
                warn!(error = %err, "text model disabled");
                None
            }
        };
        config
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let parse_or = |name: &str, fallback: usize| {
            lookup(name)
                .and_then(|raw| raw.trim().parse().ok())
                .unwrap_or(fallback)
        };
        Self {
            port: lookup("PORT")
                .and_then(|raw| raw.trim().parse().ok())
                .unwrap_or(defaults.port),
            default_resolution: parse_or("DEFAULT_RESOLUTION", defaults.default_resolution),
            max_resolution: parse_or("MAX_RESOLUTION", defaults.max_resolution),
            gemini: None,
        }
    }
}
