//! IIIF Image API 1.1 request language.
//!
//! ```text
//! {identifier}/{region}/{size}/{rotation}/{quality}.{format}
//! {identifier}/info.json
//! ```
//!
//! - [`grammar`] - segment validation and right-to-left path parsing
//! - [`geometry`] - region/size/rotation resolution against native dimensions
//! - [`info`] - the capabilities document and advertised constants

pub mod geometry;
pub mod grammar;
pub mod info;

pub use geometry::{resolve_rotation, NativeDimensions, OutputSize, PixelRegion, RegionSpec, SizeSpec};
pub use grammar::{parse_path, validate_segment, IiifRequest, ImageRequest, OutputFormat, Quality};
pub use info::{
    InfoDocument, COMPLIANCE_PROFILE, IIIF_CONTEXT, PROFILE_LINK_HEADER, SUPPORTED_FORMATS,
    SUPPORTED_QUALITIES,
};
