//! IIIF service orchestrating dimension lookups, geometry and rendering.

use std::sync::Arc;

use bytes::Bytes;
use tracing::{debug, warn};

use crate::backend::{DimensionCache, ImageBackend, RenderQuery};
use crate::error::IiifError;
use crate::iiif::{
    parse_path, resolve_rotation, IiifRequest, ImageRequest, InfoDocument, NativeDimensions,
    OutputFormat, Quality, RegionSpec, SizeSpec, SUPPORTED_QUALITIES,
};

/// Content type of every rendered image.
///
/// The backend is always asked for JPEG, whatever format the client named.
pub const IMAGE_CONTENT_TYPE: &str = "image/jpeg";

// =============================================================================
// Settings
// =============================================================================

/// Values the interpreter needs from the deployment configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct IiifSettings {
    /// Public base URL of this service, e.g. `http://appserver`
    pub base_url: String,

    /// Path prefix the IIIF routes are mounted under, e.g. `/iiif`
    pub prefix: String,

    /// Advertised tile width and height
    pub tile_size: u32,

    /// Advertised scale factors, in order
    pub scale_factors: Vec<u32>,

    /// Largest output width or height the backend is asked to render
    pub max_image_size: u32,
}

impl IiifSettings {
    /// The `@id` of an image: base URL, prefix and identifier.
    pub fn service_id(&self, identifier: &str) -> String {
        format!(
            "{}{}/{}",
            self.base_url.trim_end_matches('/'),
            self.prefix,
            identifier
        )
    }
}

impl Default for IiifSettings {
    fn default() -> Self {
        Self {
            base_url: "http://appserver".to_string(),
            prefix: "/iiif".to_string(),
            tile_size: 256,
            scale_factors: vec![1, 2, 4, 8],
            max_image_size: 10000,
        }
    }
}

// =============================================================================
// Responses
// =============================================================================

/// Rendered image returned by the backend.
#[derive(Debug, Clone)]
pub struct ImageResponse {
    /// JPEG bytes
    pub data: Bytes,

    /// The query the backend answered
    pub query: RenderQuery,

    /// Format segment of the request (validated, not honored)
    pub format: OutputFormat,

    /// Normalized rotation in degrees (validated, not applied)
    pub rotation: f64,
}

/// Outcome of a successfully interpreted request.
#[derive(Debug, Clone)]
pub enum IiifResponse {
    Info(InfoDocument),
    Image(ImageResponse),
}

// =============================================================================
// IIIF Service
// =============================================================================

/// Request interpreter for the IIIF Image API.
///
/// This is the only component that calls the backend or populates the
/// dimension cache.
pub struct IiifService<B: ImageBackend> {
    backend: Arc<B>,
    dimensions: DimensionCache,
    settings: IiifSettings,
}

impl<B: ImageBackend> IiifService<B> {
    /// Create a service with an unbounded dimension cache.
    pub fn new(backend: B, settings: IiifSettings) -> Self {
        Self::with_dimension_cache(Arc::new(backend), DimensionCache::new(), settings)
    }

    /// Create a service sharing `backend` and using the given cache.
    pub fn with_dimension_cache(
        backend: Arc<B>,
        dimensions: DimensionCache,
        settings: IiifSettings,
    ) -> Self {
        Self {
            backend,
            dimensions,
            settings,
        }
    }

    pub fn settings(&self) -> &IiifSettings {
        &self.settings
    }

    pub fn backend(&self) -> &Arc<B> {
        &self.backend
    }

    pub fn dimension_cache(&self) -> &DimensionCache {
        &self.dimensions
    }

    /// Interpret a request path relative to the service prefix.
    pub async fn handle(&self, path: &str) -> Result<IiifResponse, IiifError> {
        match parse_path(path)? {
            IiifRequest::Info { identifier } => {
                self.info(&identifier).await.map(IiifResponse::Info)
            }
            IiifRequest::Image(request) => self.image(&request).await.map(IiifResponse::Image),
        }
    }

    /// Build the info document for `identifier`.
    pub async fn info(&self, identifier: &str) -> Result<InfoDocument, IiifError> {
        let dims = self.dimensions(identifier).await?;

        Ok(InfoDocument::new(
            self.settings.service_id(identifier),
            dims,
            self.settings.tile_size,
            &self.settings.scale_factors,
        ))
    }

    /// Resolve an image request and fetch the rendered bytes.
    pub async fn image(&self, request: &ImageRequest) -> Result<ImageResponse, IiifError> {
        let dims = self.dimensions(&request.identifier).await?;

        let region = RegionSpec::parse(&request.region)?.resolve(dims)?;
        let size = SizeSpec::parse(&request.size)?
            .resolve(dims)?
            .ensure_within(self.settings.max_image_size)?;
        let rotation = resolve_rotation(&request.rotation)?;
        let quality = backend_quality(request.quality)?;

        let query = RenderQuery {
            identifier: request.identifier.clone(),
            region,
            size,
            quality,
        };

        debug!(
            identifier = %query.identifier,
            x = region.x,
            y = region.y,
            w = region.width,
            h = region.height,
            out_w = size.width,
            out_h = size.height,
            "Resolved image request"
        );

        let data = self.backend.render(&query).await.map_err(|err| {
            warn!(identifier = %query.identifier, error = %err, "Backend render failed");
            IiifError::BackendRenderFailed(err)
        })?;

        Ok(ImageResponse {
            data,
            query,
            format: request.format,
            rotation,
        })
    }

    async fn dimensions(&self, identifier: &str) -> Result<NativeDimensions, IiifError> {
        let backend = Arc::clone(&self.backend);

        self.dimensions
            .get_or_fetch(identifier, || async move { backend.describe(identifier).await })
            .await
            .map_err(|err| {
                warn!(identifier, error = %err, "Backend describe failed");
                IiifError::BackendDescribeFailed(err)
            })
    }
}

/// Check a quality against the advertised list and map it to what the
/// backend renders. The second advertised quality renders as `native`.
fn backend_quality(quality: Quality) -> Result<Quality, IiifError> {
    if !SUPPORTED_QUALITIES.contains(&quality) {
        return Err(IiifError::UnsupportedQuality {
            quality: quality.to_string(),
        });
    }

    if quality == SUPPORTED_QUALITIES[1] {
        Ok(Quality::Native)
    } else {
        Ok(quality)
    }
}

// =============================================================================
// Tests
// =============================================================================
