//! IIIF path grammar.
//!
//! Validates each segment of
//! `{identifier}/{region}/{size}/{rotation}/{quality}.{format}` and splits a
//! request path into its typed parts.
//!
//! Identifiers may themselves contain `/`, so the path is consumed from the
//! end: quality and format first, then rotation, size and region. Whatever
//! is left is rejoined with `/` and becomes the identifier.

use std::fmt;
use std::str::FromStr;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::error::{IiifError, Param};

// =============================================================================
// Segment Patterns
// =============================================================================

static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"^[^#?@]+$").unwrap());

/// Characters that must arrive percent-escaped inside an identifier.
static UNESCAPED: Lazy<Regex> = Lazy::new(|| Regex::new(r"[\[\]?@#]").unwrap());

static REGION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(full|(pct:)?([\d.]+,){3}[\d.]+)$").unwrap());

static SIZE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(full|[\d.]+,|,[\d.]+|pct:[\d.]+|[\d.]+,[\d.]+|![\d.]+,[\d.]+)$").unwrap()
});

static QUALITY: Lazy<Regex> = Lazy::new(|| Regex::new(r"^(native|color|grey|bitonal)$").unwrap());

static FORMAT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^(jpg|tif|png|gif|jp2|pdf|eps|bmp)$").unwrap());

/// Extension that marks a capabilities request.
const INFO_EXTENSION: &str = "json";

/// Format assumed when the final segment carries no extension.
const DEFAULT_FORMAT: &str = "jpg";

/// Check a raw segment against the grammar for its role.
///
/// Only syntax is checked here; numeric interpretation happens when the
/// geometry is resolved.
pub fn validate_segment(param: Param, value: &str) -> Result<(), IiifError> {
    let pattern = match param {
        Param::Identifier => &IDENTIFIER,
        Param::Region => &REGION,
        Param::Size => &SIZE,
        Param::Rotation => return validate_rotation(value),
        Param::Quality => &QUALITY,
        Param::Format => &FORMAT,
        Param::InformationRequest | Param::ImageRequest => return Ok(()),
    };

    if !pattern.is_match(value) {
        return Err(IiifError::SegmentInvalid {
            param,
            value: value.to_string(),
        });
    }

    if param == Param::Identifier && UNESCAPED.is_match(value) {
        return Err(IiifError::UnescapedCharacters {
            value: value.to_string(),
        });
    }

    Ok(())
}

/// Rotation is any finite real number, exponent notation included.
fn validate_rotation(value: &str) -> Result<(), IiifError> {
    match value.parse::<f64>() {
        Ok(degrees) if degrees.is_finite() => Ok(()),
        _ => Err(IiifError::SegmentInvalid {
            param: Param::Rotation,
            value: value.to_string(),
        }),
    }
}

// =============================================================================
// Quality and Format
// =============================================================================

/// Requested color/tonal rendering mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Quality {
    Native,
    Color,
    Grey,
    Bitonal,
}

impl Quality {
    pub fn as_str(&self) -> &'static str {
        match self {
            Quality::Native => "native",
            Quality::Color => "color",
            Quality::Grey => "grey",
            Quality::Bitonal => "bitonal",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = IiifError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "native" => Ok(Quality::Native),
            "color" => Ok(Quality::Color),
            "grey" => Ok(Quality::Grey),
            "bitonal" => Ok(Quality::Bitonal),
            _ => Err(IiifError::SegmentInvalid {
                param: Param::Quality,
                value: s.to_string(),
            }),
        }
    }
}

/// Output format named by the path extension.
///
/// All of these are accepted syntactically. The backend is always asked for
/// JPEG regardless.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OutputFormat {
    Jpg,
    Tif,
    Png,
    Gif,
    Jp2,
    Pdf,
    Eps,
    Bmp,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Jpg => "jpg",
            OutputFormat::Tif => "tif",
            OutputFormat::Png => "png",
            OutputFormat::Gif => "gif",
            OutputFormat::Jp2 => "jp2",
            OutputFormat::Pdf => "pdf",
            OutputFormat::Eps => "eps",
            OutputFormat::Bmp => "bmp",
        }
    }
}

impl FromStr for OutputFormat {
    type Err = IiifError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "jpg" => Ok(OutputFormat::Jpg),
            "tif" => Ok(OutputFormat::Tif),
            "png" => Ok(OutputFormat::Png),
            "gif" => Ok(OutputFormat::Gif),
            "jp2" => Ok(OutputFormat::Jp2),
            "pdf" => Ok(OutputFormat::Pdf),
            "eps" => Ok(OutputFormat::Eps),
            "bmp" => Ok(OutputFormat::Bmp),
            _ => Err(IiifError::SegmentInvalid {
                param: Param::Format,
                value: s.to_string(),
            }),
        }
    }
}

// =============================================================================
// Parsed Requests
// =============================================================================

/// An image request whose segments passed the grammar.
///
/// Region, size and rotation stay in their raw form until the native
/// dimensions of the image are known.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageRequest {
    pub identifier: String,
    pub region: String,
    pub size: String,
    pub rotation: String,
    pub quality: Quality,
    pub format: OutputFormat,
}

/// A request path classified by kind.
#[derive(Debug, Clone, PartialEq)]
pub enum IiifRequest {
    /// `{identifier}/info.json`
    Info { identifier: String },
    /// `{identifier}/{region}/{size}/{rotation}/{quality}.{format}`
    Image(ImageRequest),
}

impl IiifRequest {
    pub fn identifier(&self) -> &str {
        match self {
            IiifRequest::Info { identifier } => identifier,
            IiifRequest::Image(req) => &req.identifier,
        }
    }
}

/// Parse a request path (with the service prefix already removed).
///
/// A leading `/` is optional.
pub fn parse_path(path: &str) -> Result<IiifRequest, IiifError> {
    let path = path.strip_prefix('/').unwrap_or(path);
    let mut segments: Vec<&str> = if path.is_empty() {
        Vec::new()
    } else {
        path.split('/').collect()
    };

    let last = segments.pop().ok_or(IiifError::SegmentMissing {
        param: Param::Quality,
    })?;
    let (quality, format) = match last.rfind('.') {
        Some(dot) => (&last[..dot], &last[dot + 1..]),
        None => (last, DEFAULT_FORMAT),
    };

    if format == INFO_EXTENSION {
        let identifier = parse_identifier(&segments)?;
        return Ok(IiifRequest::Info { identifier });
    }

    validate_segment(Param::Quality, quality)?;
    validate_segment(Param::Format, format)?;

    let rotation = pop_segment(&mut segments, Param::Rotation)?;
    let size = pop_segment(&mut segments, Param::Size)?;
    let region = pop_segment(&mut segments, Param::Region)?;
    let identifier = parse_identifier(&segments)?;

    Ok(IiifRequest::Image(ImageRequest {
        identifier,
        region: region.to_string(),
        size: size.to_string(),
        rotation: rotation.to_string(),
        quality: quality.parse()?,
        format: format.parse()?,
    }))
}

fn pop_segment<'a>(segments: &mut Vec<&'a str>, param: Param) -> Result<&'a str, IiifError> {
    let value = segments
        .pop()
        .ok_or(IiifError::SegmentMissing { param })?;
    validate_segment(param, value)?;
    Ok(value)
}

fn parse_identifier(segments: &[&str]) -> Result<String, IiifError> {
    if segments.is_empty() {
        return Err(IiifError::SegmentMissing {
            param: Param::Identifier,
        });
    }

    let identifier = segments.join("/");
    validate_segment(Param::Identifier, &identifier)?;
    Ok(identifier)
}

// =============================================================================
// Tests
// =============================================================================
