//! Application state management

use std::sync::Arc;
use std::time::Duration;

use crate::config::{Config, ParserKind, ProviderKind, StoreBackend};
use crate::extraction::{http_client, AnthropicProvider, ExtractionProvider, OllamaProvider};
use crate::menu::{BalancedParser, MenuService, ResponseParser, SubstringParser};
use crate::store::{JsonFileMenuStore, MemoryMenuStore, MenuStore};

/// Error type for state initialization
#[derive(Debug, thiserror::Error)]
pub enum StateError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),
}

/// Shared application state
#[derive(Clone)]
pub struct AppState {
    inner: Arc<AppStateInner>,
}

struct AppStateInner {
    config: Config,
    menus: MenuService,
}

impl AppState {
    /// Create the application state from configuration
    pub fn new(config: Config) -> Result<Self, StateError> {
        let client = http_client(Duration::from_secs(config.extraction.timeout_secs))?;

        let provider: Arc<dyn ExtractionProvider> = match config.extraction.provider {
            ProviderKind::Anthropic => {
                if config.extraction.anthropic_api_key.is_none() {
                    tracing::warn!("ANTHROPIC_API_KEY is not set; menu uploads will fail");
                }
                Arc::new(AnthropicProvider::new(
                    client,
                    &config.extraction.anthropic_base_url,
                    config.extraction.anthropic_api_key.clone(),
                    &config.extraction.anthropic_model,
                    config.extraction.max_tokens,
                ))
            }
            ProviderKind::Ollama => Arc::new(OllamaProvider::new(
                client,
                &config.extraction.ollama_url,
                &config.extraction.ollama_model,
            )),
        };

        let parser: Arc<dyn ResponseParser> = match config.extraction.parser {
            ParserKind::Substring => Arc::new(SubstringParser),
            ParserKind::Balanced => Arc::new(BalancedParser),
        };

        let store: Arc<dyn MenuStore> = match config.store.backend {
            StoreBackend::File => {
                let store = JsonFileMenuStore::new(config.store.path.clone());
                tracing::info!(path = %store.path().display(), "Using JSON file menu store");
                Arc::new(store)
            }
            StoreBackend::Memory => {
                tracing::warn!("Using in-memory menu store; menus are lost on restart");
                Arc::new(MemoryMenuStore::new())
            }
        };

        tracing::info!(
            provider = provider.name(),
            parser = parser.name(),
            store = store.backend(),
            "Menu pipeline configured"
        );

        let menus = MenuService::new(provider, parser, store, &config.server.public_base_url);
        Ok(Self::with_service(config, menus))
    }

    /// Create the application state around an existing menu service
    pub fn with_service(config: Config, menus: MenuService) -> Self {
        Self {
            inner: Arc::new(AppStateInner { config, menus }),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &Config {
        &self.inner.config
    }

    /// Get the menu service
    pub fn menus(&self) -> &MenuService {
        &self.inner.menus
    }
}
