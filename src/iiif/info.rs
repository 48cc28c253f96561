//! IIIF 1.1 image information document.

use serde::Serialize;

use super::geometry::NativeDimensions;
use super::grammar::Quality;

/// JSON-LD context for IIIF Image API 1.1.
pub const IIIF_CONTEXT: &str = "http://library.stanford.edu/iiif/image-api/1.1/context.json";

/// Compliance level advertised inside the info document.
pub const COMPLIANCE_PROFILE: &str =
    "http://library.stanford.edu/iiif/image-api/1.1/compliance.html#level1";

/// Value of the `Link` header sent with every served response.
pub const PROFILE_LINK_HEADER: &str =
    "<http://library.stanford.edu/iiif/image-api/1.1/compliance.html#level2>;rel=\"profile\"";

/// Formats the gateway advertises.
pub const SUPPORTED_FORMATS: [&str; 2] = ["jpg", "png"];

/// Qualities the gateway advertises, in order.
///
/// The second entry is rendered by the backend exactly like `native`.
pub const SUPPORTED_QUALITIES: [Quality; 2] = [Quality::Native, Quality::Color];

/// Image information document.
///
/// Fields are declared in sorted key order so the serialized JSON is stable.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InfoDocument {
    #[serde(rename = "@context")]
    pub context: &'static str,

    #[serde(rename = "@id")]
    pub id: String,

    pub formats: Vec<&'static str>,

    pub height: u32,

    pub profile: &'static str,

    pub qualities: Vec<&'static str>,

    pub scale_factors: Vec<u32>,

    pub tile_height: u32,

    pub tile_width: u32,

    pub width: u32,
}

impl InfoDocument {
    /// Build the document for one image.
    ///
    /// `id` is the full service URI of the image (base URL, prefix and
    /// identifier).
    pub fn new(
        id: impl Into<String>,
        dims: NativeDimensions,
        tile_size: u32,
        scale_factors: &[u32],
    ) -> Self {
        Self {
            context: IIIF_CONTEXT,
            id: id.into(),
            formats: SUPPORTED_FORMATS.to_vec(),
            height: dims.height,
            profile: COMPLIANCE_PROFILE,
            qualities: SUPPORTED_QUALITIES.iter().map(Quality::as_str).collect(),
            scale_factors: scale_factors.to_vec(),
            tile_height: tile_size,
            tile_width: tile_size,
            width: dims.width,
        }
    }
}
