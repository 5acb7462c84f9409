//! Service configuration, resolved once at startup.
//!
//! Sources are layered: built-in defaults, an optional TOML file, then
//! `HD_*` environment overrides supplied through a lookup function so that
//! nothing below `main` reads the process environment.

use hd_core::IngestConfig;
use serde::Deserialize;
use sha2::{Digest, Sha256};
use std::collections::HashSet;
use std::fmt;
use std::net::SocketAddr;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

pub const DEFAULT_BIND_ADDR: &str = "127.0.0.1:4830";
pub const DEFAULT_DB_PATH: &str = ".helpdesk/ingest.db";
pub const DEFAULT_MAX_BODY_BYTES: usize = 16 * 1024 * 1024;
pub const DEFAULT_STORE_TIMEOUT_MS: u64 = 5000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {message}")]
    Read { path: String, message: String },
    #[error("failed to parse config: {message}")]
    Parse { message: String },
    #[error("invalid value for {key}: {value}")]
    InvalidValue { key: &'static str, value: String },
    #[error("invalid config: {message}")]
    Invalid { message: String },
}

#[derive(Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub bind_addr: String,
    pub db_path: String,
    pub max_batch_size: usize,
    pub max_body_bytes: usize,
    pub store_timeout_ms: u64,
    pub internal_tokens: Vec<String>,
    pub log_filter: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_addr: DEFAULT_BIND_ADDR.to_string(),
            db_path: DEFAULT_DB_PATH.to_string(),
            max_batch_size: IngestConfig::default().max_batch_size,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            store_timeout_ms: DEFAULT_STORE_TIMEOUT_MS,
            internal_tokens: Vec::new(),
            log_filter: "info".to_string(),
        }
    }
}

// Tokens never reach a log line in clear text.
impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let tokens: Vec<String> = self
            .internal_tokens
            .iter()
            .map(|token| fingerprint(token))
            .collect();
        f.debug_struct("Config")
            .field("bind_addr", &self.bind_addr)
            .field("db_path", &self.db_path)
            .field("max_batch_size", &self.max_batch_size)
            .field("max_body_bytes", &self.max_body_bytes)
            .field("store_timeout_ms", &self.store_timeout_ms)
            .field("internal_tokens", &tokens)
            .field("log_filter", &self.log_filter)
            .finish()
    }
}

impl Config {
    pub fn from_toml_str(contents: &str) -> Result<Self, ConfigError> {
        toml::from_str(contents).map_err(|err| ConfigError::Parse {
            message: err.to_string(),
        })
    }

    /// Defaults, overlaid with the file at `path` when one is given.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let Some(path) = path else {
            return Ok(Self::default());
        };
        let contents = std::fs::read_to_string(path).map_err(|err| ConfigError::Read {
            path: path.display().to_string(),
            message: err.to_string(),
        })?;
        Self::from_toml_str(&contents)
    }

    pub fn apply_env<F>(&mut self, lookup: F) -> Result<(), ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup("HD_BIND_ADDR") {
            self.bind_addr = value;
        }
        if let Some(value) = lookup("HD_DB_PATH") {
            self.db_path = value;
        }
        if let Some(value) = lookup("HD_MAX_BATCH_SIZE") {
            self.max_batch_size = parse_number("HD_MAX_BATCH_SIZE", &value)?;
        }
        if let Some(value) = lookup("HD_MAX_BODY_BYTES") {
            self.max_body_bytes = parse_number("HD_MAX_BODY_BYTES", &value)?;
        }
        if let Some(value) = lookup("HD_STORE_TIMEOUT_MS") {
            self.store_timeout_ms = parse_number("HD_STORE_TIMEOUT_MS", &value)?;
        }
        if let Some(value) = lookup("HD_INTERNAL_TOKENS") {
            self.internal_tokens = value
                .split(',')
                .map(|token| token.trim().to_string())
                .filter(|token| !token.is_empty())
                .collect();
        }
        if let Some(value) = lookup("HD_LOG") {
            self.log_filter = value;
        }
        Ok(())
    }

    pub fn validate(&self, require_tokens: bool) -> Result<(), ConfigError> {
        self.socket_addr()?;
        if self.max_batch_size == 0 {
            return Err(ConfigError::Invalid {
                message: "max_batch_size must be at least 1".to_string(),
            });
        }
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid {
                message: "max_body_bytes must be at least 1".to_string(),
            });
        }
        if require_tokens && self.internal_tokens.iter().all(|t| t.trim().is_empty()) {
            return Err(ConfigError::Invalid {
                message: "at least one internal token is required".to_string(),
            });
        }
        Ok(())
    }

    pub fn socket_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind_addr
            .parse()
            .map_err(|_| ConfigError::InvalidValue {
                key: "bind_addr",
                value: self.bind_addr.clone(),
            })
    }

    pub fn ingest_config(&self) -> IngestConfig {
        IngestConfig {
            max_batch_size: self.max_batch_size,
        }
    }

    pub fn store_timeout(&self) -> Duration {
        Duration::from_millis(self.store_timeout_ms)
    }
}

fn parse_number<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}

/// Short, non-reversible label for a token: first 8 hex chars of its SHA-256.
pub fn fingerprint(token: &str) -> String {
    let mut encoded = digest_hex(token);
    encoded.truncate(8);
    encoded
}

fn digest_hex(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

/// Accepted internal tokens, held only as digests.
#[derive(Clone, Default)]
pub struct InternalTokens {
    digests: HashSet<String>,
}

impl InternalTokens {
    pub fn new<'a>(tokens: impl IntoIterator<Item = &'a String>) -> Self {
        let digests = tokens
            .into_iter()
            .map(|token| token.trim())
            .filter(|token| !token.is_empty())
            .map(digest_hex)
            .collect();
        Self { digests }
    }

    pub fn verify(&self, presented: &str) -> bool {
        self.digests.contains(&digest_hex(presented.trim()))
    }
}

impl fmt::Debug for InternalTokens {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InternalTokens")
            .field("count", &self.digests.len())
            .finish()
    }
}
