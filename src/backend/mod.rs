//! Backend image server access.
//!
//! The gateway needs exactly two things from the tiled-image server:
//!
//! ```text
//! describe(identifier)            -> native width/height
//! render(identifier, rect, size)  -> JPEG bytes
//! ```
//!
//! [`ImageBackend`] abstracts those calls so the interpreter can be driven by
//! the real [`ImageXClient`] or by a test double. [`DimensionCache`] keeps
//! described dimensions for the lifetime of the process.

mod cache;
mod imagex;

use async_trait::async_trait;
use bytes::Bytes;

use crate::error::BackendError;
use crate::iiif::{NativeDimensions, OutputSize, PixelRegion, Quality};

pub use cache::DimensionCache;
pub use imagex::{parse_dimensions, ImageXClient, DEFAULT_BACKEND_TIMEOUT};

/// A resolved render call, expressed in backend terms.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderQuery {
    /// Backend layer name (the IIIF identifier)
    pub identifier: String,

    /// Source rectangle in native pixels
    pub region: PixelRegion,

    /// Output size in pixels
    pub size: OutputSize,

    /// Quality after backend aliasing (`color` becomes `native`)
    pub quality: Quality,
}

impl RenderQuery {
    /// Top-left corner as `(x, y)`.
    pub fn top_left(&self) -> (u32, u32) {
        (self.region.x, self.region.y)
    }

    /// Bottom-right corner as `(x + w, y + h)`.
    pub fn bottom_right(&self) -> (u32, u32) {
        (self.region.right(), self.region.bottom())
    }
}

/// The tiled-image server the gateway translates into.
#[async_trait]
pub trait ImageBackend: Send + Sync {
    /// Fetch the native dimensions of an image.
    async fn describe(&self, identifier: &str) -> Result<NativeDimensions, BackendError>;

    /// Fetch rendered JPEG bytes for a rectangle at an output size.
    async fn render(&self, query: &RenderQuery) -> Result<Bytes, BackendError>;
}
