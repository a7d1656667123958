//! Extraction Module
//!
//! Reads menu photos with a vision-language model.
//!
//! Supports multiple backends:
//! - Anthropic Messages API (hosted, needs `ANTHROPIC_API_KEY`)
//! - Ollama vision models (local LLM)
//!
//! The model only returns text; turning that text into menu items is the
//! job of [`crate::menu::ResponseParser`].

mod encoder;
mod provider;
mod types;

pub use provider::{http_client, AnthropicProvider, ExtractionProvider, OllamaProvider};
pub use types::{ExtractionError, ImagePayload, MENU_EXTRACTION_PROMPT};

#[cfg(test)]
pub use provider::MockProvider;
