//! Process configuration read from the environment

use std::path::PathBuf;

const DEFAULT_PORT: u16 = 8000;
const DEFAULT_SECRETS_PATH: &str = "secrets.toml";

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppConfig {
    pub port: u16,
    /// TOML file consulted for the API key after the environment
    pub secrets_path: PathBuf,
    /// Override for the OpenAI-compatible base URL (gateway mode)
    pub api_base_url: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            port: DEFAULT_PORT,
            secrets_path: PathBuf::from(DEFAULT_SECRETS_PATH),
            api_base_url: None,
        }
    }
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Unparseable or empty values
    /// fall back to defaults.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        let defaults = Self::default();

        let port = match get("ROOM_SERVICE_PORT") {
            Some(raw) => raw.trim().parse().unwrap_or_else(|_| {
                tracing::warn!(value = %raw, "Invalid ROOM_SERVICE_PORT, using default");
                defaults.port
            }),
            None => defaults.port,
        };

        Self {
            port,
            secrets_path: get("ROOM_SERVICE_SECRETS")
                .map_or(defaults.secrets_path, PathBuf::from),
            api_base_url: get("ROOM_SERVICE_API_BASE"),
        }
    }
}
