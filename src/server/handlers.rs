//! HTTP request handlers for the IIIF gateway.
//!
//! # Endpoints
//!
//! - `GET {prefix}/{identifier}/info.json` - Image information
//! - `GET {prefix}/{identifier}/{region}/{size}/{rotation}/{quality}.{format}` - Image
//! - `GET /health` - Health check endpoint

use std::any::Any;
use std::sync::Arc;

use axum::{
    body::Body,
    extract::{rejection::PathRejection, Path, State},
    http::{header, HeaderValue, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::{debug, error, warn};

use crate::backend::ImageBackend;
use crate::error::{IiifError, Param};
use crate::gateway::{IiifResponse, IiifService, IMAGE_CONTENT_TYPE};
use crate::iiif::PROFILE_LINK_HEADER;

const TEXT_CONTENT_TYPE: &str = "text/plain; charset=utf-8";
const JSON_CONTENT_TYPE: &str = "application/json";

// =============================================================================
// Application State
// =============================================================================

/// Shared application state containing the IIIF service.
///
/// This is passed to all handlers via Axum's State extractor.
pub struct AppState<B: ImageBackend> {
    /// The request interpreter
    pub service: Arc<IiifService<B>>,

    /// Cache-Control max-age in seconds for rendered images
    pub cache_max_age: u32,
}

impl<B: ImageBackend> AppState<B> {
    /// Create application state with a one hour image max-age.
    pub fn new(service: IiifService<B>) -> Self {
        Self::with_cache_max_age(service, 3600)
    }

    pub fn with_cache_max_age(service: IiifService<B>, cache_max_age: u32) -> Self {
        Self {
            service: Arc::new(service),
            cache_max_age,
        }
    }
}

impl<B: ImageBackend> Clone for AppState<B> {
    fn clone(&self) -> Self {
        Self {
            service: Arc::clone(&self.service),
            cache_max_age: self.cache_max_age,
        }
    }
}

// =============================================================================
// Response Types
// =============================================================================

/// Health check response.
#[derive(Debug, Serialize)]
pub struct HealthResponse {
    /// Service status
    pub status: String,

    /// Service version
    pub version: String,
}

// =============================================================================
// Error Mapping
// =============================================================================

/// Convert IiifError to a plain-text HTTP response.
///
/// Server errors are logged at ERROR, backend failures and unsupported
/// qualities at WARN, and malformed requests at DEBUG.
impl IntoResponse for IiifError {
    fn into_response(self) -> Response {
        let status = self.status();
        let param = self.param();

        if status.is_server_error() {
            error!(param = %param, status = status.as_u16(), "Server error: {}", self);
        } else {
            match &self {
                IiifError::BackendDescribeFailed(_)
                | IiifError::BackendRenderFailed(_)
                | IiifError::UnsupportedQuality { .. } => {
                    warn!(param = %param, status = status.as_u16(), "Request failed: {}", self);
                }
                _ => {
                    debug!(param = %param, status = status.as_u16(), "Rejected request: {}", self);
                }
            }
        }

        (
            status,
            [(header::CONTENT_TYPE, TEXT_CONTENT_TYPE)],
            self.body(),
        )
            .into_response()
    }
}

/// Convert a panic inside a request into a generic 500 response.
///
/// Installed through `tower_http::catch_panic`, so one failing request never
/// takes the server down.
pub fn handle_panic(panic: Box<dyn Any + Send + 'static>) -> http::Response<String> {
    let detail = if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = panic.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "unknown panic payload".to_string()
    };

    let err = IiifError::Internal(detail);
    error!(status = 500, "Request handler panicked: {}", err);

    let mut response = http::Response::new(err.body());
    *response.status_mut() = StatusCode::INTERNAL_SERVER_ERROR;
    response
        .headers_mut()
        .insert(header::CONTENT_TYPE, HeaderValue::from_static(TEXT_CONTENT_TYPE));
    response
}

// =============================================================================
// Handlers
// =============================================================================

/// Handle IIIF info and image requests.
///
/// # Endpoint
///
/// `GET {prefix}/{*path}`
///
/// # Response
///
/// - info requests: `200 OK` with the JSON info document
/// - image requests: `200 OK` with JPEG bytes and `Cache-Control`
///
/// Both carry the compliance `Link` header. Failures are plain text, see
/// [`IiifError::body`]. A path that does not percent-decode to UTF-8 is an
/// invalid identifier.
pub async fn iiif_handler<B: ImageBackend>(
    State(state): State<AppState<B>>,
    uri: Uri,
    path: Result<Path<String>, PathRejection>,
) -> Result<Response, IiifError> {
    let path = match path {
        Ok(Path(path)) => path,
        Err(rejection) => {
            debug!(uri = %uri, error = %rejection, "Undecodable IIIF path");
            let raw = uri
                .path()
                .strip_prefix(state.service.settings().prefix.as_str())
                .unwrap_or(uri.path())
                .trim_start_matches('/');
            return Err(IiifError::SegmentInvalid {
                param: Param::Identifier,
                value: raw.to_string(),
            });
        }
    };

    respond(&state, &path).await
}

/// Handle a request for the bare prefix, which carries no segments at all.
///
/// # Endpoint
///
/// `GET {prefix}` and `GET {prefix}/`
pub async fn iiif_root_handler<B: ImageBackend>(
    State(state): State<AppState<B>>,
) -> Result<Response, IiifError> {
    respond(&state, "").await
}

async fn respond<B: ImageBackend>(state: &AppState<B>, path: &str) -> Result<Response, IiifError> {
    let response = match state.service.handle(path).await? {
        IiifResponse::Info(info) => {
            let body = serde_json::to_vec(&info)
                .map_err(|e| IiifError::Internal(format!("info serialization failed: {}", e)))?;

            Response::builder()
                .status(StatusCode::OK)
                .header(header::CONTENT_TYPE, JSON_CONTENT_TYPE)
                .header(header::LINK, PROFILE_LINK_HEADER)
                .body(Body::from(body))
        }
        IiifResponse::Image(image) => Response::builder()
            .status(StatusCode::OK)
            .header(header::CONTENT_TYPE, IMAGE_CONTENT_TYPE)
            .header(
                header::CACHE_CONTROL,
                format!("public, max-age={}", state.cache_max_age),
            )
            .header(header::LINK, PROFILE_LINK_HEADER)
            .body(Body::from(image.data)),
    };

    response.map_err(|e| IiifError::Internal(format!("response build failed: {}", e)))
}

/// Handle health check requests.
///
/// # Endpoint
///
/// `GET /health`
///
/// # Response
///
/// `200 OK` with JSON body:
/// ```json
/// {
///   "status": "healthy",
///   "version": "0.1.0"
/// }
/// ```
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
    })
}

// =============================================================================
// Tests
// =============================================================================
