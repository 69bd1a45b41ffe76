//! API credential lookup
//!
//! Keys come from the process environment first, then from a flat TOML
//! secrets file. A missing key is an ordinary error: the server still
//! starts and the first chat turn reports it.

use std::collections::HashMap;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CredentialError {
    #[error("{name} not found in {location}")]
    Missing { name: String, location: String },
    #[error("Failed to read secrets file {}: {message}", path.display())]
    Unreadable { path: PathBuf, message: String },
    #[error("Secrets file {} is not a table of strings: {message}", path.display())]
    Malformed { path: PathBuf, message: String },
}

/// Lookup of a single named secret
pub trait CredentialStore: Send + Sync {
    fn lookup(&self, name: &str) -> Result<String, CredentialError>;

    /// Where this store looks, for error messages
    fn describe(&self) -> String;
}

/// Reads secrets from environment variables
#[derive(Debug, Clone, Copy, Default)]
pub struct EnvCredentials;

impl CredentialStore for EnvCredentials {
    fn lookup(&self, name: &str) -> Result<String, CredentialError> {
        std::env::var(name)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| CredentialError::Missing {
                name: name.to_string(),
                location: self.describe(),
            })
    }

    fn describe(&self) -> String {
        "environment".to_string()
    }
}

/// Reads secrets from a TOML file of `NAME = "value"` pairs.
///
/// The file is read on every lookup so a missing file is reported as a
/// lookup error rather than at construction.
#[derive(Debug, Clone)]
pub struct SecretsFile {
    path: PathBuf,
}

impl SecretsFile {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Parse the file; `None` when it does not exist
    fn load(&self) -> Result<Option<HashMap<String, String>>, CredentialError> {
        let text = match std::fs::read_to_string(&self.path) {
            Ok(text) => text,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(CredentialError::Unreadable {
                    path: self.path.clone(),
                    message: e.to_string(),
                })
            }
        };

        toml::from_str(&text)
            .map(Some)
            .map_err(|e| CredentialError::Malformed {
                path: self.path.clone(),
                message: e.to_string(),
            })
    }
}

impl CredentialStore for SecretsFile {
    fn lookup(&self, name: &str) -> Result<String, CredentialError> {
        let missing = || CredentialError::Missing {
            name: name.to_string(),
            location: self.describe(),
        };

        let Some(secrets) = self.load()? else {
            return Err(missing());
        };

        secrets
            .get(name)
            .filter(|v| !v.is_empty())
            .cloned()
            .ok_or_else(missing)
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}

/// Tries each store in order; the first hit wins
pub struct ChainedCredentials {
    stores: Vec<Box<dyn CredentialStore>>,
}

impl ChainedCredentials {
    pub fn new(stores: Vec<Box<dyn CredentialStore>>) -> Self {
        Self { stores }
    }

    /// Environment first, then the secrets file at `secrets_path`
    pub fn env_then_file(secrets_path: impl Into<PathBuf>) -> Self {
        Self::new(vec![
            Box::new(EnvCredentials),
            Box::new(SecretsFile::new(secrets_path)),
        ])
    }
}

impl CredentialStore for ChainedCredentials {
    fn lookup(&self, name: &str) -> Result<String, CredentialError> {
        let mut first_hard_error = None;
        for store in &self.stores {
            match store.lookup(name) {
                Ok(value) => return Ok(value),
                Err(CredentialError::Missing { .. }) => {}
                Err(e) => {
                    tracing::warn!(store = %store.describe(), error = %e, "Credential store failed");
                    if first_hard_error.is_none() {
                        first_hard_error = Some(e);
                    }
                }
            }
        }

        Err(first_hard_error.unwrap_or_else(|| CredentialError::Missing {
            name: name.to_string(),
            location: self.describe(),
        }))
    }

    fn describe(&self) -> String {
        self.stores
            .iter()
            .map(|s| s.describe())
            .collect::<Vec<_>>()
            .join(", ")
    }
}
