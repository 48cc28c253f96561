use std::fmt;

use http::StatusCode;
use thiserror::Error;

/// The request parameter an error is attributed to.
///
/// The display form is what appears in the client-facing error body.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Param {
    Identifier,
    Region,
    Size,
    Rotation,
    Quality,
    Format,
    /// Fetching native dimensions from the backend
    InformationRequest,
    /// Fetching rendered pixels from the backend
    ImageRequest,
}

impl Param {
    pub fn as_str(&self) -> &'static str {
        match self {
            Param::Identifier => "identifier",
            Param::Region => "region",
            Param::Size => "size",
            Param::Rotation => "rotation",
            Param::Quality => "quality",
            Param::Format => "format",
            Param::InformationRequest => "information request",
            Param::ImageRequest => "image request",
        }
    }

    /// Capitalized form used at the start of error messages.
    fn title(&self) -> &'static str {
        match self {
            Param::Identifier => "Identifier",
            Param::Region => "Region",
            Param::Size => "Size",
            Param::Rotation => "Rotation",
            Param::Quality => "Quality",
            Param::Format => "Format",
            Param::InformationRequest => "Information request",
            Param::ImageRequest => "Image request",
        }
    }
}

impl fmt::Display for Param {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Image axis, used to name the failing coordinate or extent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Axis {
    X,
    Y,
}

impl Axis {
    fn coordinate(&self) -> &'static str {
        match self {
            Axis::X => "X",
            Axis::Y => "Y",
        }
    }

    fn extent(&self) -> &'static str {
        match self {
            Axis::X => "width",
            Axis::Y => "height",
        }
    }
}

/// Errors talking to the ImageX backend.
#[derive(Debug, Clone, Error)]
pub enum BackendError {
    /// Network or connection error
    #[error("Connection error: {0}")]
    Connection(String),

    /// The backend did not answer within the configured timeout
    #[error("Backend timed out: {0}")]
    Timeout(String),

    /// The backend answered with a non-success status
    #[error("Backend returned HTTP {status} for {url}")]
    Status { status: u16, url: String },

    /// The backend answered, but the body could not be understood
    #[error("Malformed backend response: {0}")]
    Malformed(String),

    /// The backend URL could not be built
    #[error("Invalid backend URL: {0}")]
    InvalidUrl(String),
}

/// Errors resolving region, size and rotation against native dimensions.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum GeometryError {
    /// Region origin lies outside the image
    #[error("{} coordinate is outside image ({value} >= {limit})", .axis.coordinate())]
    OutOfBounds { axis: Axis, value: u64, limit: u32 },

    /// A region or size with a zero width or height
    #[error("{} {} is zero", .param.title(), .axis.extent())]
    ZeroExtent { param: Param, axis: Axis },

    #[error("Unable to parse region: '{0}'")]
    UnparseableRegion(String),

    #[error("Size unparseable: '{0}'")]
    UnparseableSize(String),

    #[error("Rotation must be 0-360: '{0}'")]
    InvalidRotation(String),

    /// Output would exceed the largest image the backend will produce
    #[error("Requested size {width}x{height} exceeds the maximum of {max} pixels per side")]
    SizeExceedsLimit { width: u32, height: u32, max: u32 },
}

impl GeometryError {
    /// The parameter this failure is reported against.
    pub fn param(&self) -> Param {
        match self {
            GeometryError::OutOfBounds { .. } | GeometryError::UnparseableRegion(_) => {
                Param::Region
            }
            GeometryError::ZeroExtent { param, .. } => *param,
            GeometryError::UnparseableSize(_) | GeometryError::SizeExceedsLimit { .. } => {
                Param::Size
            }
            GeometryError::InvalidRotation(_) => Param::Rotation,
        }
    }
}

/// Errors produced while interpreting an IIIF request.
#[derive(Debug, Clone, Error)]
pub enum IiifError {
    /// A path segment required for this request kind is absent
    #[error("{} unspecified", .param.title())]
    SegmentMissing { param: Param },

    /// A path segment does not match its grammar
    #[error("{} invalid: '{value}'", .param.title())]
    SegmentInvalid { param: Param, value: String },

    /// Identifier carries characters that must be percent-escaped
    #[error("Unescaped characters: '{value}'")]
    UnescapedCharacters { value: String },

    #[error(transparent)]
    Geometry(#[from] GeometryError),

    /// Quality is well formed but not offered for this image
    #[error("Quality not supported for this image: '{quality}'")]
    UnsupportedQuality { quality: String },

    #[error("Describe request failed: {0}")]
    BackendDescribeFailed(BackendError),

    #[error("Render request failed: {0}")]
    BackendRenderFailed(BackendError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IiifError {
    /// The parameter named in the client-facing error body.
    pub fn param(&self) -> Param {
        match self {
            IiifError::SegmentMissing { param } | IiifError::SegmentInvalid { param, .. } => {
                *param
            }
            IiifError::UnescapedCharacters { .. } => Param::Identifier,
            IiifError::Geometry(err) => err.param(),
            IiifError::UnsupportedQuality { .. } => Param::Quality,
            IiifError::BackendDescribeFailed(_) => Param::InformationRequest,
            IiifError::BackendRenderFailed(_) | IiifError::Internal(_) => Param::ImageRequest,
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            IiifError::UnsupportedQuality { .. } => StatusCode::NOT_IMPLEMENTED,
            IiifError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
            _ => StatusCode::BAD_REQUEST,
        }
    }

    /// Reason shown to the client. Backend and internal detail stays in the logs.
    pub fn client_message(&self) -> String {
        match self {
            IiifError::BackendDescribeFailed(_) | IiifError::BackendRenderFailed(_) => {
                "Problem getting information from the server".to_string()
            }
            IiifError::Internal(_) => "Internal server error".to_string(),
            other => other.to_string(),
        }
    }

    /// Full plain-text response body.
    pub fn body(&self) -> String {
        format!(
            "An error occurred when processing the '{}' parameter: {}",
            self.param(),
            self.client_message()
        )
    }
}
