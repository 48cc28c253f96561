//! Region, size and rotation resolution.
//!
//! Converts the IIIF region and size sub-languages into absolute pixel
//! geometry relative to an image's native dimensions. Everything here is a
//! pure function of its inputs.
//!
//! Percent conversions truncate toward zero. Size scaling is always computed
//! from the native dimensions of the image, not from the extracted region.

use crate::error::{Axis, GeometryError, Param};

// =============================================================================
// Dimensions and Resolved Geometry
// =============================================================================

/// Full-resolution extent of a source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NativeDimensions {
    pub width: u32,
    pub height: u32,
}

impl NativeDimensions {
    /// Create dimensions, returning `None` unless both sides are positive.
    pub fn new(width: u32, height: u32) -> Option<Self> {
        if width == 0 || height == 0 {
            None
        } else {
            Some(Self { width, height })
        }
    }
}

/// Absolute pixel rectangle inside the source image.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PixelRegion {
    pub x: u32,
    pub y: u32,
    pub width: u32,
    pub height: u32,
}

impl PixelRegion {
    /// Exclusive right edge (`x + width`).
    pub fn right(&self) -> u32 {
        self.x + self.width
    }

    /// Exclusive bottom edge (`y + height`).
    pub fn bottom(&self) -> u32 {
        self.y + self.height
    }
}

/// Absolute output dimensions requested from the backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OutputSize {
    pub width: u32,
    pub height: u32,
}

impl OutputSize {
    /// Reject output sizes the backend will not produce.
    pub fn ensure_within(self, max: u32) -> Result<Self, GeometryError> {
        if self.width > max || self.height > max {
            return Err(GeometryError::SizeExceedsLimit {
                width: self.width,
                height: self.height,
                max,
            });
        }
        Ok(self)
    }
}

// =============================================================================
// Region
// =============================================================================

/// Parsed region segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RegionSpec {
    Full,
    Pixel { x: u64, y: u64, w: u64, h: u64 },
    Percent { x: f64, y: f64, w: f64, h: f64 },
}

impl RegionSpec {
    /// Parse a syntactically valid region segment.
    ///
    /// Pixel regions must be integers; percent regions accept decimals.
    pub fn parse(raw: &str) -> Result<Self, GeometryError> {
        if raw == "full" {
            return Ok(RegionSpec::Full);
        }

        let unparseable = || GeometryError::UnparseableRegion(raw.to_string());
        let (percent, values) = match raw.strip_prefix("pct:") {
            Some(rest) => (true, rest),
            None => (false, raw),
        };

        let parts: Vec<&str> = values.split(',').collect();
        let [x, y, w, h] = parts.as_slice() else {
            return Err(unparseable());
        };

        if percent {
            let parse = |s: &str| s.parse::<f64>().map_err(|_| unparseable());
            Ok(RegionSpec::Percent {
                x: parse(*x)?,
                y: parse(*y)?,
                w: parse(*w)?,
                h: parse(*h)?,
            })
        } else {
            let parse = |s: &str| s.parse::<u64>().map_err(|_| unparseable());
            Ok(RegionSpec::Pixel {
                x: parse(*x)?,
                y: parse(*y)?,
                w: parse(*w)?,
                h: parse(*h)?,
            })
        }
    }

    /// Resolve into a pixel rectangle clamped to the image bounds.
    pub fn resolve(&self, dims: NativeDimensions) -> Result<PixelRegion, GeometryError> {
        match *self {
            RegionSpec::Full => Ok(PixelRegion {
                x: 0,
                y: 0,
                width: dims.width,
                height: dims.height,
            }),
            RegionSpec::Percent { x, y, w, h } => RegionSpec::Pixel {
                x: percent_of(x, dims.width).into(),
                y: percent_of(y, dims.height).into(),
                w: percent_of(w, dims.width).into(),
                h: percent_of(h, dims.height).into(),
            }
            .resolve(dims),
            RegionSpec::Pixel { x, y, w, h } => {
                let width = u64::from(dims.width);
                let height = u64::from(dims.height);

                // An origin on the far edge would leave nothing to extract.
                if x >= width {
                    return Err(GeometryError::OutOfBounds {
                        axis: Axis::X,
                        value: x,
                        limit: dims.width,
                    });
                }
                if y >= height {
                    return Err(GeometryError::OutOfBounds {
                        axis: Axis::Y,
                        value: y,
                        limit: dims.height,
                    });
                }
                if w < 1 {
                    return Err(GeometryError::ZeroExtent {
                        param: Param::Region,
                        axis: Axis::X,
                    });
                }
                if h < 1 {
                    return Err(GeometryError::ZeroExtent {
                        param: Param::Region,
                        axis: Axis::Y,
                    });
                }

                // All four values are now bounded by the u32 native dimensions
                Ok(PixelRegion {
                    x: x as u32,
                    y: y as u32,
                    width: w.min(width - x) as u32,
                    height: h.min(height - y) as u32,
                })
            }
        }
    }
}

/// `pct` percent of `dimension`, truncated toward zero.
fn percent_of(pct: f64, dimension: u32) -> u32 {
    // `as` saturates for out-of-range floats and maps NaN to zero
    (pct / 100.0 * f64::from(dimension)) as u32
}

// =============================================================================
// Size
// =============================================================================

/// Parsed size segment.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SizeSpec {
    Full,
    FixedWidth(u32),
    FixedHeight(u32),
    BestFit { max_width: u32, max_height: u32 },
    Percent(f64),
    Exact { width: u32, height: u32 },
}

impl SizeSpec {
    /// Parse a syntactically valid size segment.
    ///
    /// Pixel counts must be integers; `pct:` accepts decimals.
    pub fn parse(raw: &str) -> Result<Self, GeometryError> {
        let unparseable = || GeometryError::UnparseableSize(raw.to_string());
        let int = |s: &str| s.parse::<u32>().map_err(|_| unparseable());
        let pair = |s: &str| -> Result<(u32, u32), GeometryError> {
            let (w, h) = s.split_once(',').ok_or_else(unparseable)?;
            Ok((int(w)?, int(h)?))
        };

        if raw == "full" {
            Ok(SizeSpec::Full)
        } else if let Some(pct) = raw.strip_prefix("pct:") {
            let n = pct.parse::<f64>().map_err(|_| unparseable())?;
            Ok(SizeSpec::Percent(n))
        } else if let Some(rest) = raw.strip_prefix('!') {
            let (max_width, max_height) = pair(rest)?;
            Ok(SizeSpec::BestFit {
                max_width,
                max_height,
            })
        } else if let Some(w) = raw.strip_suffix(',') {
            Ok(SizeSpec::FixedWidth(int(w)?))
        } else if let Some(h) = raw.strip_prefix(',') {
            Ok(SizeSpec::FixedHeight(int(h)?))
        } else {
            let (width, height) = pair(raw)?;
            Ok(SizeSpec::Exact { width, height })
        }
    }

    /// Resolve into output dimensions.
    ///
    /// A requested zero extent is an error; a derived extent that rounds
    /// down to zero is raised to one pixel.
    pub fn resolve(&self, dims: NativeDimensions) -> Result<OutputSize, GeometryError> {
        let width = u64::from(dims.width);
        let height = u64::from(dims.height);

        let (out_w, out_h) = match *self {
            SizeSpec::Full => (width, height),
            SizeSpec::FixedWidth(w) => {
                require_nonzero(w, Axis::X)?;
                let w = u64::from(w);
                (w, height * w / width)
            }
            SizeSpec::FixedHeight(h) => {
                require_nonzero(h, Axis::Y)?;
                let h = u64::from(h);
                (width * h / height, h)
            }
            SizeSpec::BestFit {
                max_width,
                max_height,
            } => {
                require_nonzero(max_width, Axis::X)?;
                require_nonzero(max_height, Axis::Y)?;
                let max_w = u64::from(max_width);
                let max_h = u64::from(max_height);
                // Compare max_w / width against max_h / height without division.
                if max_w * height <= max_h * width {
                    (max_w, height * max_w / width)
                } else {
                    (width * max_h / height, max_h)
                }
            }
            SizeSpec::Percent(n) => {
                if n.is_nan() || n <= 0.0 {
                    return Err(GeometryError::ZeroExtent {
                        param: Param::Size,
                        axis: Axis::X,
                    });
                }
                let scale = n / 100.0;
                (
                    (width as f64 * scale) as u64,
                    (height as f64 * scale) as u64,
                )
            }
            SizeSpec::Exact {
                width: w,
                height: h,
            } => {
                require_nonzero(w, Axis::X)?;
                require_nonzero(h, Axis::Y)?;
                (u64::from(w), u64::from(h))
            }
        };

        Ok(OutputSize {
            width: clamp_extent(out_w),
            height: clamp_extent(out_h),
        })
    }
}

fn require_nonzero(value: u32, axis: Axis) -> Result<(), GeometryError> {
    if value == 0 {
        Err(GeometryError::ZeroExtent {
            param: Param::Size,
            axis,
        })
    } else {
        Ok(())
    }
}

fn clamp_extent(value: u64) -> u32 {
    u32::try_from(value).unwrap_or(u32::MAX).max(1)
}

// =============================================================================
// Rotation
// =============================================================================

/// Parse a rotation in degrees and normalize it into `[0, 360)`.
///
/// Values outside `[0, 360]` are rejected before normalization.
pub fn resolve_rotation(raw: &str) -> Result<f64, GeometryError> {
    let degrees: f64 = raw
        .parse()
        .map_err(|_| GeometryError::InvalidRotation(raw.to_string()))?;

    if !degrees.is_finite() || !(0.0..=360.0).contains(&degrees) {
        return Err(GeometryError::InvalidRotation(raw.to_string()));
    }

    // "-0" parses to negative zero
    let normalized = degrees % 360.0;
    Ok(if normalized == 0.0 { 0.0 } else { normalized })
}

// =============================================================================
// Tests
// =============================================================================
