use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::DomainError;

pub const DEFAULT_QUALITY: f32 = 0.9;
pub const DEFAULT_COMPRESS_QUALITY: f32 = 0.5;
pub const LOSSLESS_QUALITY: f32 = 1.0;
/// Largest drawing surface, in pixels, a raster tool may allocate.
pub const MAX_SURFACE_PIXELS: u64 = 100_000_000;

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    #[default]
    Jpeg,
    Png,
    Webp,
}

impl OutputFormat {
    pub const ALL: [OutputFormat; 3] = [Self::Jpeg, Self::Png, Self::Webp];

    pub fn mime_type(self) -> &'static str {
        match self {
            Self::Jpeg => "image/jpeg",
            Self::Png => "image/png",
            Self::Webp => "image/webp",
        }
    }

    pub fn extension(self) -> &'static str {
        match self {
            Self::Jpeg => "jpg",
            Self::Png => "png",
            Self::Webp => "webp",
        }
    }

    /// PNG is lossless and the WebP encoder only writes lossless output.
    pub fn is_lossless(self) -> bool {
        matches!(self, Self::Png | Self::Webp)
    }

    pub fn from_mime(mime: &str) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|format| format.mime_type().eq_ignore_ascii_case(mime))
    }
}

impl Display for OutputFormat {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.mime_type())
    }
}

impl FromStr for OutputFormat {
    type Err = DomainError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let lowered = value.trim().to_ascii_lowercase();
        match lowered.as_str() {
            "jpeg" | "jpg" | "image/jpeg" | "image/jpg" => Ok(Self::Jpeg),
            "png" | "image/png" => Ok(Self::Png),
            "webp" | "image/webp" => Ok(Self::Webp),
            _ => Err(DomainError::UnsupportedFormat(value.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Quality(f32);

impl Quality {
    pub fn new(value: f32) -> Result<Self, DomainError> {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Err(DomainError::InvalidQuality(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> f32 {
        self.0
    }

    /// Encoder scale, 1..=100.
    pub fn percent(self) -> u8 {
        (self.0 * 100.0).round().clamp(1.0, 100.0) as u8
    }
}

impl Default for Quality {
    fn default() -> Self {
        Self(DEFAULT_QUALITY)
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TransformSpec {
    pub width: u32,
    pub height: u32,
    pub format: OutputFormat,
    pub quality: Quality,
}

impl TransformSpec {
    pub fn new(width: u32, height: u32) -> Result<Self, DomainError> {
        Self::with_encoding(width, height, OutputFormat::default(), Quality::default())
    }

    pub fn with_encoding(
        width: u32,
        height: u32,
        format: OutputFormat,
        quality: Quality,
    ) -> Result<Self, DomainError> {
        if width == 0 || height == 0 {
            return Err(DomainError::InvalidDimensions { width, height });
        }
        Ok(Self {
            width,
            height,
            format,
            quality,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EncodedImage {
    pub bytes: Vec<u8>,
    pub mime_type: String,
}

impl EncodedImage {
    pub fn new(bytes: Vec<u8>, format: OutputFormat) -> Self {
        Self {
            bytes,
            mime_type: format.mime_type().to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageInfo {
    pub width: u32,
    pub height: u32,
    pub format: Option<OutputFormat>,
}

pub fn surface_fits(width: u32, height: u32) -> bool {
    u64::from(width) * u64::from(height) <= MAX_SURFACE_PIXELS
}

/// Height that keeps the `original` aspect ratio at `width`.
pub fn fit_height(original_width: u32, original_height: u32, width: u32) -> u32 {
    if original_width == 0 {
        return width.max(1);
    }
    let ratio = f64::from(original_height) / f64::from(original_width);
    ((f64::from(width) * ratio).round() as u32).max(1)
}
