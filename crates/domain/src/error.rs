use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum DomainError {
    #[error("dimensions must be at least 1x1, got {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },
    #[error("quality must be a finite value in [0, 1], got {0}")]
    InvalidQuality(f32),
    #[error("unsupported output format: {0}")]
    UnsupportedFormat(String),
    #[error("malformed data url: {0}")]
    MalformedDataUrl(String),
    #[error("unknown {kind} preset: {value}")]
    UnknownPreset { kind: &'static str, value: String },
    #[error("invalid color value: {0}")]
    InvalidColor(String),
}
