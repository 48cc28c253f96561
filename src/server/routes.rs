//! Router configuration for the IIIF gateway.
//!
//! This module defines the HTTP routes and applies middleware for CORS,
//! panic recovery and request tracing.
//!
//! # Route Structure
//!
//! ```text
//! /health              - Health check
//! {prefix}, {prefix}/  - Bare prefix, answered with a missing-segment error
//! {prefix}/{*path}     - IIIF info and image requests
//! ```
//!
//! # Example
//!
//! ```ignore
//! use iiif_imagex::backend::ImageXClient;
//! use iiif_imagex::gateway::{IiifService, IiifSettings};
//! use iiif_imagex::server::{create_router, RouterConfig};
//!
//! let client = ImageXClient::new("http://imageserver", "/erdas-iws/erdas/imagex/prmap", timeout)?;
//! let service = IiifService::new(client, IiifSettings::default());
//!
//! let router = create_router(service, RouterConfig::new());
//!
//! let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//! axum::serve(listener, router).await?;
//! ```

use std::time::Duration;

use axum::{routing::get, Router};
use http::header::CONTENT_TYPE;
use http::Method;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::handlers::{handle_panic, health_handler, iiif_handler, iiif_root_handler, AppState};
use crate::backend::ImageBackend;
use crate::gateway::IiifService;

// =============================================================================
// Router Configuration
// =============================================================================

/// Configuration for the HTTP router.
#[derive(Debug, Clone)]
pub struct RouterConfig {
    /// Allowed CORS origins (None = allow any origin)
    pub cors_origins: Option<Vec<String>>,

    /// Cache-Control max-age in seconds for images
    pub cache_max_age: u32,

    /// Whether to enable request tracing
    pub enable_tracing: bool,
}

impl RouterConfig {
    /// Create a router configuration.
    ///
    /// By default:
    /// - CORS allows any origin
    /// - Cache max-age is 1 hour (3600 seconds)
    /// - Tracing is enabled
    pub fn new() -> Self {
        Self {
            cors_origins: None,
            cache_max_age: 3600,
            enable_tracing: true,
        }
    }

    /// Set specific allowed CORS origins.
    ///
    /// Pass an empty vec to disallow all cross-origin requests.
    pub fn with_cors_origins(mut self, origins: Vec<String>) -> Self {
        self.cors_origins = Some(origins);
        self
    }

    /// Allow any CORS origin.
    pub fn with_cors_any_origin(mut self) -> Self {
        self.cors_origins = None;
        self
    }

    /// Set the Cache-Control max-age in seconds.
    pub fn with_cache_max_age(mut self, seconds: u32) -> Self {
        self.cache_max_age = seconds;
        self
    }

    /// Enable or disable request tracing.
    pub fn with_tracing(mut self, enabled: bool) -> Self {
        self.enable_tracing = enabled;
        self
    }
}

impl Default for RouterConfig {
    fn default() -> Self {
        Self::new()
    }
}

// =============================================================================
// Router Builder
// =============================================================================

/// Create the application router.
///
/// IIIF routes are mounted under the service's configured prefix. Panics
/// inside a handler become 500 responses.
pub fn create_router<B>(service: IiifService<B>, config: RouterConfig) -> Router
where
    B: ImageBackend + 'static,
{
    let prefix = service.settings().prefix.clone();
    let iiif_route = format!("{}/{{*path}}", prefix);
    let app_state = AppState::with_cache_max_age(service, config.cache_max_age);

    let cors = build_cors_layer(&config);

    let mut router = Router::new()
        .route("/health", get(health_handler))
        .route(&iiif_route, get(iiif_handler::<B>))
        .route(&format!("{}/", prefix), get(iiif_root_handler::<B>));

    // An empty prefix mounts at the root, which is already routed above
    if !prefix.is_empty() {
        router = router.route(&prefix, get(iiif_root_handler::<B>));
    }

    let router = router
        .with_state(app_state)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors);

    if config.enable_tracing {
        router.layer(TraceLayer::new_for_http())
    } else {
        router
    }
}

/// Build the CORS layer based on configuration.
fn build_cors_layer(config: &RouterConfig) -> CorsLayer {
    let cors = CorsLayer::new()
        .allow_methods([Method::GET, Method::HEAD, Method::OPTIONS])
        .allow_headers([CONTENT_TYPE])
        .max_age(Duration::from_secs(86400));

    match &config.cors_origins {
        None => cors.allow_origin(Any),
        Some(origins) if origins.is_empty() => cors,
        Some(origins) => {
            let parsed_origins: Vec<_> = origins.iter().filter_map(|o| o.parse().ok()).collect();
            cors.allow_origin(parsed_origins)
        }
    }
}

// =============================================================================
// Tests
// =============================================================================
