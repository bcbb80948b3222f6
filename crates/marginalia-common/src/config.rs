//! Service configuration, read once from the environment at startup and
//! injected into the pipelines at construction time. Leaf code never reads
//! env vars directly.

use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const DEFAULT_PORT: u16 = 8000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("missing environment variables: {}", .0.join(", "))]
    Missing(Vec<String>),

    #[error("invalid value for {var}: {value}")]
    Invalid { var: String, value: String },
}

/// Credentials and endpoints for the three external services plus the HTTP
/// listen port.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// LanceDB URI — a local data directory or a `db://` remote URI.
    pub store_uri: String,
    /// API key for remote LanceDB stores. Unused for local directories.
    pub store_api_key: Option<String>,
    /// Unstructured partition API key.
    pub unstructured_api_key: String,
    /// OpenAI API key (completions + embeddings).
    pub openai_api_key: String,
    pub port: u16,
}

impl Config {
    /// Load configuration from the process environment (`.env` honoured).
    /// Fails eagerly, naming every missing variable, so no pipeline gets
    /// constructed with half a configuration.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|var| std::env::var(var).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let mut missing = Vec::new();
        let mut required = |var: &str| -> String {
            match lookup(var) {
                Some(v) if !v.is_empty() => v,
                _ => {
                    missing.push(var.to_string());
                    String::new()
                }
            }
        };

        let store_uri = required("STORE_URI");
        let unstructured_api_key = required("UNSTRUCTURED_API_KEY");
        let openai_api_key = required("OPENAI_API_KEY");
        let store_api_key = lookup("STORE_API_KEY").filter(|v| !v.is_empty());

        let port = match lookup("PORT") {
            None => DEFAULT_PORT,
            Some(raw) => raw.parse().map_err(|_| ConfigError::Invalid {
                var: "PORT".to_string(),
                value: raw.clone(),
            })?,
        };

        if !missing.is_empty() {
            return Err(ConfigError::Missing(missing));
        }

        Ok(Self {
            store_uri,
            store_api_key,
            unstructured_api_key,
            openai_api_key,
            port,
        })
    }
}
