use base64::engine::general_purpose::STANDARD;
use base64::Engine;

use crate::DomainError;

const DATA_PREFIX: &str = "data:";
const BASE64_MARKER: &str = ";base64";

/// A `data:<mime>;base64,<payload>` string, or a bare base64 payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataUrl {
    mime_type: Option<String>,
    payload: String,
}

impl DataUrl {
    pub fn parse(value: &str) -> Result<Self, DomainError> {
        let Some(rest) = value.strip_prefix(DATA_PREFIX) else {
            return Ok(Self {
                mime_type: None,
                payload: value.trim().to_string(),
            });
        };
        let (header, payload) = rest
            .split_once(',')
            .ok_or_else(|| DomainError::MalformedDataUrl("missing ',' separator".to_string()))?;
        let mime = header.strip_suffix(BASE64_MARKER).ok_or_else(|| {
            DomainError::MalformedDataUrl(format!("expected base64 encoding, got header {header}"))
        })?;
        Ok(Self {
            mime_type: (!mime.is_empty()).then(|| mime.to_string()),
            payload: payload.to_string(),
        })
    }

    pub fn from_bytes(mime_type: &str, bytes: &[u8]) -> Self {
        Self {
            mime_type: Some(mime_type.to_string()),
            payload: STANDARD.encode(bytes),
        }
    }

    pub fn mime_type(&self) -> Option<&str> {
        self.mime_type.as_deref()
    }

    /// The base64 text with any `data:` header removed.
    pub fn payload(&self) -> &str {
        &self.payload
    }

    pub fn decode(&self) -> Result<Vec<u8>, DomainError> {
        STANDARD
            .decode(self.payload.as_bytes())
            .map_err(|error| DomainError::MalformedDataUrl(error.to_string()))
    }
}

impl std::fmt::Display for DataUrl {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.mime_type {
            Some(mime) => write!(f, "{DATA_PREFIX}{mime}{BASE64_MARKER},{}", self.payload),
            None => f.write_str(&self.payload),
        }
    }
}
