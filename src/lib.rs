//! # IIIF ImageX
//!
//! An IIIF Image API 1.1 gateway in front of an ERDAS ImageX image server.
//!
//! Clients speak the IIIF URL grammar; the gateway validates each request,
//! resolves region and size against the image's native dimensions, and
//! forwards a single rectangle-and-size render query to the backend.
//!
//! ## Features
//!
//! - **Right-to-left path parsing**: identifiers may contain `/`
//! - **Dimension caching**: each identifier is described once, with
//!   concurrent cold lookups sharing one backend call
//! - **Plain-text errors** naming the offending parameter, 400/501/500
//! - **Bounded backend calls**: every ImageX request has a timeout
//!
//! ## Architecture
//!
//! - [`iiif`] - URL grammar, geometry resolution and the info document
//! - [`backend`] - backend trait, ImageX HTTP client, dimension cache
//! - [`gateway`] - the request interpreter
//! - [`server`] - Axum-based HTTP server and routes
//! - [`config`] - CLI and configuration types
//! - [`error`] - error taxonomy
//!
//! ## Example
//!
//! ```rust,no_run
//! use std::time::Duration;
//! use iiif_imagex::{create_router, IiifService, IiifSettings, ImageXClient, RouterConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let client = ImageXClient::new(
//!         "http://imageserver",
//!         "/erdas-iws/erdas/imagex/prmap",
//!         Duration::from_secs(30),
//!     )?;
//!     let service = IiifService::new(client, IiifSettings::default());
//!     let router = create_router(service, RouterConfig::new());
//!
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await?;
//!     axum::serve(listener, router).await?;
//!     Ok(())
//! }
//! ```

pub mod backend;
pub mod config;
pub mod error;
pub mod gateway;
pub mod iiif;
pub mod server;

// Re-export commonly used types
pub use backend::{DimensionCache, ImageBackend, ImageXClient, RenderQuery};
pub use config::Config;
pub use error::{Axis, BackendError, GeometryError, IiifError, Param};
pub use gateway::{IiifResponse, IiifService, IiifSettings, ImageResponse};
pub use iiif::{
    parse_path, IiifRequest, ImageRequest, InfoDocument, NativeDimensions, OutputFormat,
    OutputSize, PixelRegion, Quality, RegionSpec, SizeSpec,
};
pub use server::{create_router, AppState, RouterConfig};
