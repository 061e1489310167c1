use std::env;
use std::net::SocketAddr;

use thiserror::Error;

use crate::access::{ApiKeys, PolicyMode};

pub mod cors;
pub mod security;

pub use cors::create_cors_layer;
pub use security::create_security_headers_layer;

const DEFAULT_BIND_ADDR: &str = "0.0.0.0:3001";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is invalid: {reason}")]
    Invalid { name: &'static str, reason: String },
}

#[derive(Debug, Clone)]
pub struct Config {
    /// Absent means events are kept in process memory.
    pub database_url: Option<String>,
    pub bind_addr: SocketAddr,
    pub access_policy: PolicyMode,
    pub anon_key: String,
    pub authenticated_tokens: Vec<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let bind_addr = read("BIND_ADDR")
            .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string())
            .parse::<SocketAddr>()
            .map_err(|e| ConfigError::Invalid {
                name: "BIND_ADDR",
                reason: e.to_string(),
            })?;

        let access_policy = match read("ACCESS_POLICY") {
            Some(raw) => raw.parse::<PolicyMode>().map_err(|reason| ConfigError::Invalid {
                name: "ACCESS_POLICY",
                reason,
            })?,
            None => PolicyMode::default(),
        };

        let anon_key = read("ANON_KEY").ok_or(ConfigError::Missing("ANON_KEY"))?;
        if anon_key.chars().any(char::is_whitespace) {
            return Err(ConfigError::Invalid {
                name: "ANON_KEY",
                reason: "must not contain whitespace".to_string(),
            });
        }

        let authenticated_tokens: Vec<String> = read("AUTHENTICATED_TOKENS")
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|t| !t.is_empty())
                    .map(str::to_string)
                    .collect()
            })
            .unwrap_or_default();

        if authenticated_tokens.iter().any(|t| *t == anon_key) {
            return Err(ConfigError::Invalid {
                name: "AUTHENTICATED_TOKENS",
                reason: "must not contain the anon key".to_string(),
            });
        }

        Ok(Self {
            database_url: read("DATABASE_URL"),
            bind_addr,
            access_policy,
            anon_key,
            authenticated_tokens,
        })
    }

    pub fn api_keys(&self) -> ApiKeys {
        ApiKeys::new(self.anon_key.clone(), self.authenticated_tokens.clone())
    }
}
