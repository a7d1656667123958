//! Extraction Types

/// Instruction sent alongside every menu photo
pub const MENU_EXTRACTION_PROMPT: &str = r#"Please analyze this menu image and extract all menu items. Return ONLY a valid JSON object with no additional text or explanations. Use exactly this format:
{
  "menuItems": [
    {
      "name": "item name",
      "price": "price as string",
      "description": "item description"
    }
  ]
}"#;

/// Base64 encoded image ready to be sent to a vision model
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImagePayload {
    /// Declared media type, passed through unchanged
    pub media_type: String,
    /// Standard base64 of the image bytes
    pub data: String,
}

/// Extraction error types
#[derive(Debug, thiserror::Error)]
pub enum ExtractionError {
    #[error("No API key configured for {provider}; set {env_var}")]
    MissingApiKey {
        provider: &'static str,
        env_var: &'static str,
    },

    #[error("Request to {provider} failed: {message}")]
    Request {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} returned {status}: {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("Failed to decode {provider} response: {message}")]
    InvalidResponse {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} returned no text")]
    EmptyResponse { provider: &'static str },
}

impl ExtractionError {
    /// Whether the failure comes from local configuration rather than the service
    pub fn is_configuration(&self) -> bool {
        matches!(self, Self::MissingApiKey { .. })
    }
}
