mod config;

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Instant;

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use http::header::{CONTENT_DISPOSITION, CONTENT_TYPE};
use http::{HeaderValue, Method, StatusCode};
use promptcad_ai::{
    Design, DesignConfig, Designer, GeminiClient, PipelineError, Stage, TextModel,
};
use promptcad_core::{Field, MIN_RESOLUTION, ShapeTag, Unit};
use promptcad_mesh::to_binary_stl;
use promptcad_text::{
    ExtractOptions, Extraction, Grammar, ShapeDefaults, extract_partial, find_shape, suggest_shape,
};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

pub use config::Config;

/// Creates a text model for one `interpret` request. Called on the blocking
/// pool, so implementations may block.
pub type ModelFactory =
    Arc<dyn Fn() -> Result<Box<dyn TextModel + Send>, String> + Send + Sync>;

#[derive(Clone)]
struct AppState {
    config: Arc<Config>,
    model: Option<ModelFactory>,
}

/// Router backed by the Gemini client when `config.gemini` is set.
pub fn app(config: Config) -> Router {
    let model = config.gemini.clone().map(|gemini| -> ModelFactory {
        Arc::new(move || {
            GeminiClient::new(gemini.clone())
                .map(|client| Box::new(client) as Box<dyn TextModel + Send>)
                .map_err(|err| err.to_string())
        })
    });
    router(config, model)
}

/// Router with a caller-supplied text model.
pub fn app_with_model(config: Config, model: ModelFactory) -> Router {
    router(config, Some(model))
}

fn router(config: Config, model: Option<ModelFactory>) -> Router {
    let state = AppState {
        config: Arc::new(config),
        model,
    };
    Router::new()
        .route("/health", get(health))
        .route("/classify", post(classify))
        .route("/extract", post(extract))
        .route("/design", post(design))
        .route("/design/stl", post(design_stl))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer())
        .with_state(state)
}

fn cors_layer() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::OPTIONS])
        .allow_headers(Any)
}

#[derive(Debug, Deserialize)]
struct ClassifyRequest {
    prompt: String,
}

#[derive(Debug, Deserialize)]
struct ExtractRequest {
    prompt: String,
    shape: Option<String>,
    grammar: Option<String>,
    unit: Option<String>,
}

/// Unknown fields (colors, camera settings, ...) are ignored.
#[derive(Debug, Deserialize)]
struct DesignRequest {
    prompt: String,
    shape: Option<String>,
    grammar: Option<String>,
    unit: Option<String>,
    resolution: Option<usize>,
    #[serde(default)]
    open_ends: bool,
    #[serde(default)]
    overrides: BTreeMap<Field, f64>,
    #[serde(default)]
    defaults: bool,
    #[serde(default)]
    interpret: bool,
}

#[derive(Debug, Serialize, Deserialize)]
struct HealthResponse {
    status: String,
    interpret: bool,
}

#[derive(Debug, Serialize)]
struct ClassifyResponse {
    shape: Option<ShapeTag>,
    keyword: Option<String>,
    offset: Option<usize>,
    suggestion: Option<&'static str>,
}

#[derive(Debug, Serialize, Deserialize)]
struct MeshJson {
    vertices: Vec<[f64; 3]>,
    triangles: Vec<[u32; 3]>,
}

#[derive(Debug, Serialize, Deserialize)]
struct DesignStats {
    time_ms: f64,
    triangle_count: usize,
}

#[derive(Debug, Serialize)]
struct DesignResponse {
    design: Design,
    mesh: MeshJson,
    stats: DesignStats,
}

#[derive(Debug, Default, Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    stage: Option<Stage>,
    #[serde(skip_serializing_if = "Option::is_none")]
    kind: Option<&'static str>,
    #[serde(skip_serializing_if = "Option::is_none")]
    field: Option<Field>,
    #[serde(skip_serializing_if = "Option::is_none")]
    suggestion: Option<String>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    missing: Vec<Field>,
}

#[derive(Debug)]
struct ApiError {
    status: StatusCode,
    body: ErrorResponse,
}

impl ApiError {
    fn new(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorResponse {
                error: message.into(),
                ..ErrorResponse::default()
            },
        }
    }

    fn bad_request(message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, message)
    }

    fn payload_too_large(message: impl Into<String>) -> Self {
        Self::new(StatusCode::PAYLOAD_TOO_LARGE, message)
    }
}

impl From<PipelineError> for ApiError {
    fn from(err: PipelineError) -> Self {
        let suggestion = match &err {
            PipelineError::UnrecognizedShape { suggestion } => suggestion.clone(),
            _ => None,
        };
        let missing = match &err {
            PipelineError::InsufficientDimensions(partial) => partial.missing(),
            _ => Vec::new(),
        };
        Self {
            status: StatusCode::UNPROCESSABLE_ENTITY,
            body: ErrorResponse {
                error: err.to_string(),
                stage: Some(err.stage()),
                kind: Some(err.kind()),
                field: err.field(),
                suggestion,
                missing,
            },
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        interpret: state.model.is_some(),
    })
}

async fn classify(body: Bytes) -> Result<Json<ClassifyResponse>, ApiError> {
    let request: ClassifyRequest = parse_json(&body)?;
    let found = find_shape(&request.prompt);
    let suggestion = match found {
        Some(_) => None,
        None => suggest_shape(&request.prompt),
    };
    Ok(Json(ClassifyResponse {
        shape: found.as_ref().map(|found| found.shape),
        keyword: found.as_ref().map(|found| found.keyword.clone()),
        offset: found.as_ref().map(|found| found.offset),
        suggestion,
    }))
}

async fn extract(body: Bytes) -> Result<Json<Extraction>, ApiError> {
    let request: ExtractRequest = parse_json(&body)?;
    let shape = match parse_option::<ShapeTag>(request.shape.as_deref())? {
        Some(shape) => shape,
        None => find_shape(&request.prompt)
            .map(|found| found.shape)
            .ok_or_else(|| PipelineError::UnrecognizedShape {
                suggestion: suggest_shape(&request.prompt).map(str::to_string),
            })?,
    };
    let options = ExtractOptions {
        grammar: parse_option::<Grammar>(request.grammar.as_deref())?.unwrap_or_default(),
        unit_override: parse_option::<Unit>(request.unit.as_deref())?,
    };
    let extraction = extract_partial(&request.prompt, shape, &options)
        .and_then(|partial| partial.complete())
        .map_err(PipelineError::from)?;
    Ok(Json(extraction))
}

async fn design(
    State(state): State<AppState>,
    body: Bytes,
) -> Result<Json<DesignResponse>, ApiError> {
    let request: DesignRequest = parse_json(&body)?;
    let start = Instant::now();
    let mut design = run_design(&state, request).await?;
    let time_ms = start.elapsed().as_secs_f64() * 1000.0;

    let mesh = std::mem::take(&mut design.mesh);
    Ok(Json(DesignResponse {
        stats: DesignStats {
            time_ms,
            triangle_count: mesh.triangle_count(),
        },
        mesh: MeshJson {
            vertices: mesh.vertices,
            triangles: mesh.triangles,
        },
        design,
    }))
}

async fn design_stl(State(state): State<AppState>, body: Bytes) -> Result<Response, ApiError> {
    let request: DesignRequest = parse_json(&body)?;
    let design = run_design(&state, request).await?;
    let name = design.shape.name();
    let bytes = to_binary_stl(&design.mesh, name);

    let mut response = Response::new(Body::from(bytes));
    response.headers_mut().insert(
        CONTENT_TYPE,
        "application/octet-stream"
            .parse()
            .expect("valid content type"),
    );
    response.headers_mut().insert(
        CONTENT_DISPOSITION,
        HeaderValue::from_str(&format!("attachment; filename=\"{name}.stl\""))
            .map_err(|_| ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "invalid file name"))?,
    );
    Ok(response)
}

async fn run_design(state: &AppState, request: DesignRequest) -> Result<Design, ApiError> {
    let resolution = resolve_resolution(request.resolution, &state.config)?;
    let config = DesignConfig {
        resolution,
        grammar: parse_option::<Grammar>(request.grammar.as_deref())?.unwrap_or_default(),
        unit_override: parse_option::<Unit>(request.unit.as_deref())?,
        shape_override: parse_option::<ShapeTag>(request.shape.as_deref())?,
        closed_ends: !request.open_ends,
        overrides: request.overrides,
        defaults: request.defaults.then(ShapeDefaults::default),
    };
    let designer = Designer::new(config);

    if !request.interpret {
        return Ok(designer.build(&request.prompt)?);
    }

    let factory = state.model.clone().ok_or_else(|| {
        ApiError::new(
            StatusCode::SERVICE_UNAVAILABLE,
            "text model is not configured (set GOOGLE_API_KEY)",
        )
    })?;
    let prompt = request.prompt;
    let outcome = tokio::task::spawn_blocking(move || {
        let mut model = factory().map_err(PipelineError::ExternalService)?;
        designer.interpret_and_build(model.as_mut(), &prompt)
    })
    .await
    .map_err(|err| {
        warn!(error = %err, "interpret task failed");
        ApiError::new(StatusCode::INTERNAL_SERVER_ERROR, "interpret task failed")
    })?;

    let design = outcome?;
    info!(shape = %design.shape, "interpreted design built");
    Ok(design)
}

fn parse_json<T: DeserializeOwned>(body: &Bytes) -> Result<T, ApiError> {
    if body.is_empty() {
        return Err(ApiError::bad_request("request body is required"));
    }

    serde_json::from_slice(body)
        .map_err(|err| ApiError::bad_request(format!("invalid JSON body: {err}")))
}

fn parse_option<T>(value: Option<&str>) -> Result<Option<T>, ApiError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    value
        .map(|raw| raw.parse::<T>())
        .transpose()
        .map_err(|err| ApiError::bad_request(err.to_string()))
}

fn resolve_resolution(value: Option<usize>, config: &Config) -> Result<usize, ApiError> {
    let resolution = value.unwrap_or(config.default_resolution);
    if resolution < MIN_RESOLUTION {
        return Err(ApiError::bad_request(format!(
            "resolution must be at least {MIN_RESOLUTION}"
        )));
    }
    if resolution > config.max_resolution {
        return Err(ApiError::payload_too_large(format!(
            "resolution {resolution} exceeds the limit of {}",
            config.max_resolution
        )));
    }
    Ok(resolution)
}
