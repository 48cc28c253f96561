//! Configuration management for the IIIF gateway.
//!
//! This module provides a configuration system that supports:
//! - Command-line arguments via clap
//! - Environment variables with `IIIF_` prefix
//! - Defaults for every setting
//!
//! # Example
//!
//! ```ignore
//! use iiif_imagex::config::Config;
//!
//! let config = Config::parse();
//! config.validate()?;
//!
//! println!("Listening on {}", config.bind_address());
//! println!("Backend: {}{}", config.backend_url, config.backend_path);
//! ```
//!
//! # Environment Variables
//!
//! - `IIIF_HOST` - Server bind address (default: 0.0.0.0)
//! - `IIIF_PORT` - Server port (default: 8080)
//! - `IIIF_BASE_URL` - Public base URL used in `@id` (default: http://appserver)
//! - `IIIF_PREFIX` - Path prefix of the IIIF routes (default: /iiif)
//! - `IIIF_TILE_SIZE` - Advertised tile size (default: 256)
//! - `IIIF_SCALE_FACTORS` - Advertised scale factors (default: 1,2,4,8)
//! - `IIIF_BACKEND_URL` - ImageX server base URL (default: http://imageserver)
//! - `IIIF_BACKEND_PATH` - ImageX endpoint path (default: /erdas-iws/erdas/imagex/prmap)
//! - `IIIF_MAX_IMAGE_SIZE` - Largest output width or height (default: 10000)
//! - `IIIF_BACKEND_TIMEOUT` - Backend call timeout in seconds (default: 30)
//! - `IIIF_DIMENSION_CACHE_CAPACITY` - Max cached identifiers (default: unbounded)
//! - `IIIF_CACHE_MAX_AGE` - HTTP cache max-age seconds for images (default: 3600)
//! - `IIIF_CORS_ORIGINS` - Allowed CORS origins, comma-separated (default: any)

use std::time::Duration;

use clap::Parser;
use url::Url;

use crate::backend::DEFAULT_BACKEND_TIMEOUT;
use crate::gateway::IiifSettings;
use crate::server::RouterConfig;

// =============================================================================
// Default Values
// =============================================================================

/// Default server host.
pub const DEFAULT_HOST: &str = "0.0.0.0";

/// Default server port.
pub const DEFAULT_PORT: u16 = 8080;

/// Default public base URL.
pub const DEFAULT_BASE_URL: &str = "http://appserver";

/// Default IIIF path prefix.
pub const DEFAULT_PREFIX: &str = "/iiif";

/// Default advertised tile size.
pub const DEFAULT_TILE_SIZE: u32 = 256;

/// Default ImageX server.
pub const DEFAULT_BACKEND_URL: &str = "http://imageserver";

/// Default ImageX endpoint path.
pub const DEFAULT_BACKEND_PATH: &str = "/erdas-iws/erdas/imagex/prmap";

/// Default maximum output width or height.
pub const DEFAULT_MAX_IMAGE_SIZE: u32 = 10000;

/// Default HTTP cache max-age in seconds (1 hour).
pub const DEFAULT_CACHE_MAX_AGE: u32 = 3600;

// =============================================================================
// CLI Arguments
// =============================================================================

/// IIIF ImageX gateway - IIIF Image API 1.1 in front of an ERDAS ImageX server.
///
/// Translates IIIF region/size/quality requests into ImageX image queries
/// and serves the rendered JPEG bytes.
#[derive(Parser, Debug, Clone)]
#[command(name = "iiif-imagex")]
#[command(author, version, about, long_about = None)]
pub struct Config {
    // =========================================================================
    // Server Configuration
    // =========================================================================
    /// Host address to bind the server to.
    #[arg(long, default_value = DEFAULT_HOST, env = "IIIF_HOST")]
    pub host: String,

    /// Port to listen on.
    #[arg(short, long, default_value_t = DEFAULT_PORT, env = "IIIF_PORT")]
    pub port: u16,

    // =========================================================================
    // IIIF Configuration
    // =========================================================================
    /// Public base URL of this service, used to build `@id`.
    #[arg(long, default_value = DEFAULT_BASE_URL, env = "IIIF_BASE_URL")]
    pub base_url: String,

    /// Path prefix the IIIF routes are mounted under.
    ///
    /// Must start with '/' and must not end with '/'. May be empty.
    #[arg(long, default_value = DEFAULT_PREFIX, env = "IIIF_PREFIX")]
    pub prefix: String,

    /// Tile width and height advertised in info documents.
    #[arg(long, default_value_t = DEFAULT_TILE_SIZE, env = "IIIF_TILE_SIZE")]
    pub tile_size: u32,

    /// Scale factors advertised in info documents (comma-separated).
    #[arg(
        long,
        env = "IIIF_SCALE_FACTORS",
        value_delimiter = ',',
        default_value = "1,2,4,8"
    )]
    pub scale_factors: Vec<u32>,

    // =========================================================================
    // Backend Configuration
    // =========================================================================
    /// Base URL of the ImageX server.
    #[arg(long, default_value = DEFAULT_BACKEND_URL, env = "IIIF_BACKEND_URL")]
    pub backend_url: String,

    /// ImageX endpoint path appended to the backend URL.
    #[arg(long, default_value = DEFAULT_BACKEND_PATH, env = "IIIF_BACKEND_PATH")]
    pub backend_path: String,

    /// Largest output width or height the backend is asked to render.
    #[arg(long, default_value_t = DEFAULT_MAX_IMAGE_SIZE, env = "IIIF_MAX_IMAGE_SIZE")]
    pub max_image_size: u32,

    /// Timeout for a single backend call, in seconds.
    #[arg(long, default_value_t = DEFAULT_BACKEND_TIMEOUT.as_secs(), env = "IIIF_BACKEND_TIMEOUT")]
    pub backend_timeout: u64,

    // =========================================================================
    // Cache Configuration
    // =========================================================================
    /// Maximum number of identifiers whose dimensions are kept.
    ///
    /// If not specified, dimensions are kept for the life of the process.
    #[arg(long, env = "IIIF_DIMENSION_CACHE_CAPACITY")]
    pub dimension_cache_capacity: Option<usize>,

    /// HTTP Cache-Control max-age in seconds for images.
    #[arg(long, default_value_t = DEFAULT_CACHE_MAX_AGE, env = "IIIF_CACHE_MAX_AGE")]
    pub cache_max_age: u32,

    // =========================================================================
    // CORS Configuration
    // =========================================================================
    /// Allowed CORS origins (comma-separated).
    ///
    /// If not specified, allows any origin.
    #[arg(long, env = "IIIF_CORS_ORIGINS", value_delimiter = ',')]
    pub cors_origins: Option<Vec<String>>,

    // =========================================================================
    // Logging Configuration
    // =========================================================================
    /// Enable verbose logging (debug level).
    #[arg(short, long, default_value_t = false)]
    pub verbose: bool,

    /// Disable request tracing.
    #[arg(long, default_value_t = false)]
    pub no_tracing: bool,
}

impl Config {
    /// Validate the configuration and return an error message if invalid.
    pub fn validate(&self) -> Result<(), String> {
        Url::parse(&self.base_url)
            .map_err(|e| format!("base_url '{}' is not a valid URL: {}", self.base_url, e))?;
        Url::parse(&self.backend_url).map_err(|e| {
            format!(
                "backend_url '{}' is not a valid URL: {}",
                self.backend_url, e
            )
        })?;

        if !self.prefix.is_empty() && !self.prefix.starts_with('/') {
            return Err(format!("prefix '{}' must start with '/'", self.prefix));
        }
        if self.prefix.ends_with('/') {
            return Err(format!("prefix '{}' must not end with '/'", self.prefix));
        }

        if self.tile_size == 0 {
            return Err("tile_size must be greater than 0".to_string());
        }

        if self.scale_factors.is_empty() {
            return Err("scale_factors must not be empty".to_string());
        }
        if self.scale_factors.contains(&0) {
            return Err("scale_factors must all be greater than 0".to_string());
        }

        if self.max_image_size == 0 {
            return Err("max_image_size must be greater than 0".to_string());
        }
        if self.backend_timeout == 0 {
            return Err("backend_timeout must be greater than 0".to_string());
        }
        if self.dimension_cache_capacity == Some(0) {
            return Err("dimension_cache_capacity must be greater than 0".to_string());
        }

        Ok(())
    }

    /// Get the server bind address as "host:port".
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Timeout applied to every backend call.
    pub fn backend_timeout(&self) -> Duration {
        Duration::from_secs(self.backend_timeout)
    }

    /// Settings consumed by the request interpreter.
    pub fn iiif_settings(&self) -> IiifSettings {
        IiifSettings {
            base_url: self.base_url.clone(),
            prefix: self.prefix.clone(),
            tile_size: self.tile_size,
            scale_factors: self.scale_factors.clone(),
            max_image_size: self.max_image_size,
        }
    }

    /// Build the router configuration.
    pub fn router_config(&self) -> RouterConfig {
        let mut router_config = RouterConfig::new()
            .with_cache_max_age(self.cache_max_age)
            .with_tracing(!self.no_tracing);

        if let Some(ref origins) = self.cors_origins {
            router_config = router_config.with_cors_origins(origins.clone());
        }

        router_config
    }
}

// =============================================================================
// Tests
// =============================================================================
