use pixatools_domain::DomainError;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum ApplicationError {
    #[error(transparent)]
    Domain(#[from] DomainError),
    #[error("invalid input: {0}")]
    InvalidInput(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("daily AI limit of {limit} calls reached, try again tomorrow")]
    QuotaExceeded { limit: u32 },
    #[error("not configured: {0}")]
    NotConfigured(String),
    #[error("remote processing failed: {0}")]
    RemoteProcessing(String),
    #[error("io error: {0}")]
    Io(String),
    #[error("persistence error: {0}")]
    Persistence(String),
    #[error("decode error: {0}")]
    Decode(String),
    #[error("encode error: {0}")]
    Encode(String),
}

impl ApplicationError {
    /// Decode and encode failures are the ones a caller may choose to degrade on.
    pub fn is_raster_failure(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::Encode(_))
    }
}
