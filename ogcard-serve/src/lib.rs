//! HTTP service for the card rendering pipeline.
//!
//! `GET /convert` resolves a conversion indirection: it fetches the source
//! image, re-encodes it as PNG, and returns the bytes with an immutable cache
//! directive. `POST /normalize` runs the server-context walker over a template
//! and returns the normalized copy for the external layout engine.

use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use ogcard_rs::convert::raster_to_png_bytes;
use ogcard_rs::{normalize_template, NormalizeError, ProxyRewriter, RewriteConfig, Template};
use serde::Deserialize;
use serde_json::json;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{error, info};

static OGCARD_USER_AGENT: &str = concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION"));

/// The converted response is a pure function of the source URL's current
/// content, so long-lived immutable caching is safe and desirable.
const CONVERTED_CACHE_CONTROL: &str = "public, max-age=31536000, immutable";

pub const DEFAULT_FETCH_TIMEOUT: Duration = Duration::from_secs(10);

#[derive(Clone)]
pub struct AppState {
    client: reqwest::Client,
    rewrite: RewriteConfig,
    fetch_timeout: Duration,
}

impl AppState {
    pub fn new(rewrite: RewriteConfig, fetch_timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::ClientBuilder::new()
            .user_agent(OGCARD_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            rewrite,
            fetch_timeout,
        })
    }
}

/// Request-level failures, mapped to JSON `{"error": …}` responses.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("Missing url query parameter")]
    MissingUrl,

    #[error("Invalid url parameter: `{0}`")]
    InvalidUrl(String),

    #[error("Invalid template: {0}")]
    InvalidTemplate(String),

    /// The source image could not be retrieved. The upstream status is carried
    /// as a raw code because reqwest and axum straddle two `http` major
    /// versions. Never retried here; retry policy belongs to the caller.
    #[error("Failed to fetch image from `{url}`: {detail}")]
    UpstreamFetch {
        url: String,
        status: Option<u16>,
        detail: String,
    },

    #[error(transparent)]
    Conversion(#[from] NormalizeError),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::MissingUrl | ApiError::InvalidUrl(_) | ApiError::InvalidTemplate(_) => {
                StatusCode::BAD_REQUEST
            }
            ApiError::UpstreamFetch { status, .. } => status
                .and_then(|code| StatusCode::from_u16(code).ok())
                .unwrap_or(StatusCode::BAD_GATEWAY),
            ApiError::Conversion(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        error!("{self}");
        (self.status_code(), Json(json!({ "error": self.to_string() }))).into_response()
    }
}

#[derive(Debug, Deserialize)]
pub struct ConvertQuery {
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct NormalizeQuery {
    /// Externally visible origin of this service, when the caller knows it
    /// better than the static configuration does.
    origin: Option<String>,
}

pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/convert", get(convert_image))
        .route("/normalize", post(normalize))
        .route("/healthz", get(healthz))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

async fn healthz() -> &'static str {
    "ok"
}

/// Resolve one conversion indirection: fetch the source URL, decode the bytes,
/// re-encode as PNG. Stateless and idempotent given stable upstream content.
async fn convert_image(
    State(state): State<AppState>,
    Query(query): Query<ConvertQuery>,
) -> Result<Response, ApiError> {
    let source_url = query.url.ok_or(ApiError::MissingUrl)?;
    let parsed =
        reqwest::Url::parse(&source_url).map_err(|_| ApiError::InvalidUrl(source_url.clone()))?;
    if !matches!(parsed.scheme(), "http" | "https") {
        return Err(ApiError::InvalidUrl(source_url));
    }

    info!("Resolving conversion for {source_url}");
    let response = state
        .client
        .get(parsed)
        .timeout(state.fetch_timeout)
        .send()
        .await
        .map_err(|err| ApiError::UpstreamFetch {
            url: source_url.clone(),
            status: err
                .is_timeout()
                .then(|| StatusCode::GATEWAY_TIMEOUT.as_u16()),
            detail: err.to_string(),
        })?;

    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::UpstreamFetch {
            url: source_url,
            status: Some(status.as_u16()),
            detail: format!("upstream responded with status {status}"),
        });
    }

    let bytes = response
        .bytes()
        .await
        .map_err(|err| ApiError::UpstreamFetch {
            url: source_url.clone(),
            status: None,
            detail: err.to_string(),
        })?;

    // Decode and re-encode off the reactor; the codec work is CPU-bound.
    let png_bytes = tokio::task::spawn_blocking(move || raster_to_png_bytes(&bytes))
        .await
        .map_err(|err| ApiError::Conversion(NormalizeError::ConversionFailure(err.to_string())))??;

    let mut response = (StatusCode::OK, png_bytes).into_response();
    let headers = response.headers_mut();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("image/png"));
    headers.insert(
        header::CACHE_CONTROL,
        HeaderValue::from_static(CONVERTED_CACHE_CONTROL),
    );
    Ok(response)
}

/// Normalize a template for rendering: remote WebP references become
/// indirections through this service's `/convert` endpoint.
async fn normalize(
    State(state): State<AppState>,
    Query(query): Query<NormalizeQuery>,
    Json(template): Json<Template>,
) -> Result<Json<Template>, ApiError> {
    if !template.canvas.is_valid() {
        return Err(ApiError::InvalidTemplate(
            "canvas dimensions must be positive".to_string(),
        ));
    }

    let mut rewriter = ProxyRewriter::new(state.rewrite.clone());
    if let Some(origin) = query.origin {
        rewriter = rewriter.with_request_origin(origin);
    }

    let normalized = normalize_template(&template, &rewriter).await?;
    Ok(Json(normalized))
}
