mod wire;

use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use pixatools_application::{ApplicationError, ImageEditGateway, RemoteImage};

use wire::{Content, GenerateContentRequest, GenerateContentResponse, InlineData, RequestPart};

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash-image";
const FALLBACK_MIME: &str = "image/png";

#[derive(Debug, Clone)]
pub struct GatewayConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl Default for GatewayConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            api_key: String::new(),
            timeout: Duration::from_secs(120),
        }
    }
}

/// Sends one `generateContent` request per edit; never retries.
pub struct HttpImageEditGateway {
    client: reqwest::blocking::Client,
    config: GatewayConfig,
}

impl HttpImageEditGateway {
    pub fn new(config: GatewayConfig) -> Result<Self, ApplicationError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|error| ApplicationError::RemoteProcessing(error.to_string()))?;
        Ok(Self { client, config })
    }

    fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.endpoint.trim_end_matches('/'),
            self.config.model
        )
    }
}

impl ImageEditGateway for HttpImageEditGateway {
    fn ensure_ready(&self) -> Result<(), ApplicationError> {
        if self.config.api_key.trim().is_empty() {
            return Err(ApplicationError::NotConfigured(
                "no API key; set PIXATOOLS_API_KEY or [gateway].api_key".to_string(),
            ));
        }
        Ok(())
    }

    fn edit(
        &self,
        image: &[u8],
        mime_type: &str,
        instruction: &str,
    ) -> Result<RemoteImage, ApplicationError> {
        self.ensure_ready()?;

        let payload = STANDARD.encode(image);
        let body = build_request(&payload, mime_type, instruction);
        tracing::info!(model = %self.config.model, bytes = image.len(), "sending image edit request");

        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", &self.config.api_key)
            .json(&body)
            .send()
            .and_then(|response| response.error_for_status())
            .map_err(|error| ApplicationError::RemoteProcessing(error.to_string()))?;
        let parsed: GenerateContentResponse = response
            .json()
            .map_err(|error| ApplicationError::RemoteProcessing(error.to_string()))?;

        extract_image(parsed)
    }
}

fn build_request<'a>(
    payload: &'a str,
    mime_type: &'a str,
    instruction: &'a str,
) -> GenerateContentRequest<'a> {
    let mime_type = if mime_type.starts_with("image/") {
        mime_type
    } else {
        FALLBACK_MIME
    };
    GenerateContentRequest {
        contents: Content {
            parts: vec![
                RequestPart::Inline {
                    inline_data: InlineData {
                        data: payload,
                        mime_type,
                    },
                },
                RequestPart::Text { text: instruction },
            ],
        },
    }
}

/// First inline image part of the first candidate. Any text the model sent
/// instead is logged.
fn extract_image(response: GenerateContentResponse) -> Result<RemoteImage, ApplicationError> {
    let parts = response
        .candidates
        .into_iter()
        .next()
        .and_then(|candidate| candidate.content)
        .map(|content| content.parts)
        .unwrap_or_default();

    let mut reply = Vec::new();
    let mut inline = None;
    for part in parts {
        if let Some(data) = part.inline_data {
            inline = Some(data);
            break;
        }
        if let Some(text) = part.text {
            reply.push(text);
        }
    }
    let Some(inline) = inline else {
        let reply = reply.join(" ");
        tracing::warn!(reply = %reply, "model response contained no image part");
        return Err(ApplicationError::RemoteProcessing(if reply.is_empty() {
            "response contained no image part".to_string()
        } else {
            format!("response contained no image part: {reply}")
        }));
    };

    let bytes = STANDARD
        .decode(inline.data.as_bytes())
        .map_err(|error| ApplicationError::RemoteProcessing(error.to_string()))?;
    Ok(RemoteImage {
        bytes,
        mime_type: inline
            .mime_type
            .unwrap_or_else(|| FALLBACK_MIME.to_string()),
    })
}
