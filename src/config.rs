//! Configuration management for Menu Share Server

use serde::Deserialize;
use std::env;
use std::path::PathBuf;

/// Default upload limit, matching what the upload form accepts
pub const DEFAULT_MAX_UPLOAD_BYTES: usize = 5 * 1024 * 1024;

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    pub server: ServerConfig,
    pub extraction: ExtractionConfig,
    pub store: StoreConfig,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    /// Base URL used when building share links
    pub public_base_url: String,
    pub max_upload_bytes: usize,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ExtractionConfig {
    pub provider: ProviderKind,
    pub anthropic_api_key: Option<String>,
    pub anthropic_base_url: String,
    pub anthropic_model: String,
    pub max_tokens: u32,
    pub timeout_secs: u64,
    pub ollama_url: String,
    pub ollama_model: String,
    pub parser: ParserKind,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ProviderKind {
    Anthropic,
    Ollama,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ParserKind {
    /// First `{` to last `}`
    Substring,
    /// First balanced-brace object
    Balanced,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StoreConfig {
    pub backend: StoreBackend,
    pub path: PathBuf,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    /// One JSON array file at `path`
    File,
    /// Process memory; everything is lost on restart
    Memory,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid value for {name}: {value}")]
    InvalidValue { name: &'static str, value: String },
}

impl Default for Config {
    fn default() -> Self {
        Config {
            server: ServerConfig {
                host: "0.0.0.0".to_string(),
                port: 3000,
                public_base_url: "http://localhost:3000".to_string(),
                max_upload_bytes: DEFAULT_MAX_UPLOAD_BYTES,
            },
            extraction: ExtractionConfig {
                provider: ProviderKind::Anthropic,
                anthropic_api_key: None,
                anthropic_base_url: "https://api.anthropic.com".to_string(),
                anthropic_model: "claude-3-5-sonnet-20241022".to_string(),
                max_tokens: 1024,
                timeout_secs: 120,
                ollama_url: "http://localhost:11434".to_string(),
                ollama_model: "llava".to_string(),
                parser: ParserKind::Substring,
            },
            store: StoreConfig {
                backend: StoreBackend::File,
                path: PathBuf::from("./data/menu.json"),
            },
        }
    }
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build a config from an arbitrary variable lookup, falling back to defaults
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Config::default();
        let var = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        Ok(Config {
            server: ServerConfig {
                host: var("SERVER_HOST").unwrap_or(defaults.server.host),
                port: parse_var(&var, "SERVER_PORT", defaults.server.port)?,
                public_base_url: var("PUBLIC_BASE_URL")
                    .map(|url| url.trim_end_matches('/').to_string())
                    .unwrap_or(defaults.server.public_base_url),
                max_upload_bytes: parse_var(
                    &var,
                    "MAX_UPLOAD_BYTES",
                    defaults.server.max_upload_bytes,
                )?,
            },
            extraction: ExtractionConfig {
                provider: match var("EXTRACTION_PROVIDER").as_deref() {
                    None | Some("anthropic") => ProviderKind::Anthropic,
                    Some("ollama") => ProviderKind::Ollama,
                    Some(other) => {
                        return Err(ConfigError::InvalidValue {
                            name: "EXTRACTION_PROVIDER",
                            value: other.to_string(),
                        })
                    }
                },
                anthropic_api_key: var("ANTHROPIC_API_KEY"),
                anthropic_base_url: var("ANTHROPIC_BASE_URL")
                    .unwrap_or(defaults.extraction.anthropic_base_url),
                anthropic_model: var("ANTHROPIC_MODEL")
                    .unwrap_or(defaults.extraction.anthropic_model),
                max_tokens: parse_var(
                    &var,
                    "EXTRACTION_MAX_TOKENS",
                    defaults.extraction.max_tokens,
                )?,
                timeout_secs: parse_var(
                    &var,
                    "EXTRACTION_TIMEOUT_SECS",
                    defaults.extraction.timeout_secs,
                )?,
                ollama_url: var("OLLAMA_URL").unwrap_or(defaults.extraction.ollama_url),
                ollama_model: var("OLLAMA_MODEL").unwrap_or(defaults.extraction.ollama_model),
                parser: match var("RESPONSE_PARSER").as_deref() {
                    None | Some("substring") => ParserKind::Substring,
                    Some("balanced") => ParserKind::Balanced,
                    Some(other) => {
                        return Err(ConfigError::InvalidValue {
                            name: "RESPONSE_PARSER",
                            value: other.to_string(),
                        })
                    }
                },
            },
            store: StoreConfig {
                backend: match var("MENU_STORE_BACKEND").as_deref() {
                    None | Some("file") => StoreBackend::File,
                    Some("memory") => StoreBackend::Memory,
                    Some(other) => {
                        return Err(ConfigError::InvalidValue {
                            name: "MENU_STORE_BACKEND",
                            value: other.to_string(),
                        })
                    }
                },
                path: var("MENU_STORE_PATH")
                    .map(PathBuf::from)
                    .unwrap_or(defaults.store.path),
            },
        })
    }
}

fn parse_var<T, F>(var: &F, name: &'static str, default: T) -> Result<T, ConfigError>
where
    T: std::str::FromStr,
    F: Fn(&str) -> Option<String>,
{
    match var(name) {
        Some(value) => value
            .trim()
            .parse()
            .map_err(|_| ConfigError::InvalidValue { name, value }),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name| map.get(name).cloned()
    }

    #[test]
    fn test_defaults_when_environment_is_empty() {
        let config = Config::from_lookup(lookup(&[])).unwrap();

        assert_eq!(config.server.port, 3000);
        assert_eq!(config.server.max_upload_bytes, DEFAULT_MAX_UPLOAD_BYTES);
        assert_eq!(config.extraction.provider, ProviderKind::Anthropic);
        assert_eq!(config.extraction.parser, ParserKind::Substring);
        assert!(config.extraction.anthropic_api_key.is_none());
        assert_eq!(config.store.backend, StoreBackend::File);
        assert_eq!(config.store.path, PathBuf::from("./data/menu.json"));
    }

    #[test]
    fn test_overrides() {
        let config = Config::from_lookup(lookup(&[
            ("SERVER_PORT", "8080"),
            ("PUBLIC_BASE_URL", "https://menus.example.com/"),
            ("EXTRACTION_PROVIDER", "ollama"),
            ("RESPONSE_PARSER", "balanced"),
            ("ANTHROPIC_API_KEY", "sk-test"),
            ("MENU_STORE_PATH", "/var/lib/menus/menu.json"),
            ("MENU_STORE_BACKEND", "memory"),
        ]))
        .unwrap();

        assert_eq!(config.server.port, 8080);
        assert_eq!(config.server.public_base_url, "https://menus.example.com");
        assert_eq!(config.extraction.provider, ProviderKind::Ollama);
        assert_eq!(config.extraction.parser, ParserKind::Balanced);
        assert_eq!(config.extraction.anthropic_api_key.as_deref(), Some("sk-test"));
        assert_eq!(config.store.backend, StoreBackend::Memory);
        assert_eq!(config.store.path, PathBuf::from("/var/lib/menus/menu.json"));
    }

    #[test]
    fn test_blank_api_key_is_treated_as_missing() {
        let config = Config::from_lookup(lookup(&[("ANTHROPIC_API_KEY", "  ")])).unwrap();
        assert!(config.extraction.anthropic_api_key.is_none());
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        let result = Config::from_lookup(lookup(&[("SERVER_PORT", "not-a-port")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "SERVER_PORT", .. })
        ));

        let result = Config::from_lookup(lookup(&[("EXTRACTION_PROVIDER", "tesseract")]));
        assert!(matches!(
            result,
            Err(ConfigError::InvalidValue { name: "EXTRACTION_PROVIDER", .. })
        ));
    }
}
