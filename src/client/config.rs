use std::env;

use reqwest::Url;

use super::error::ClientError;

pub const PROJECT_URL_VAR: &str = "EVENTS_PROJECT_URL";
pub const ANON_KEY_VAR: &str = "EVENTS_ANON_KEY";

/// Endpoint and key a page needs to talk to the event store.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    project_url: Url,
    anon_key: String,
}

impl ClientConfig {
    /// Builds a config from literal values, e.g. ones embedded in a page.
    pub fn new(project_url: &str, anon_key: &str) -> Result<Self, ClientError> {
        let project_url = parse_project_url(project_url)?;
        let anon_key = check_anon_key(anon_key)?;
        Ok(Self {
            project_url,
            anon_key,
        })
    }

    /// Reads `EVENTS_PROJECT_URL` and `EVENTS_ANON_KEY`.
    pub fn from_env() -> Result<Self, ClientError> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ClientError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let url = lookup(PROJECT_URL_VAR)
            .ok_or_else(|| ClientError::Config(format!("{} is not set", PROJECT_URL_VAR)))?;
        let key = lookup(ANON_KEY_VAR)
            .ok_or_else(|| ClientError::Config(format!("{} is not set", ANON_KEY_VAR)))?;
        Self::new(&url, &key)
    }

    pub fn project_url(&self) -> &Url {
        &self.project_url
    }

    pub fn anon_key(&self) -> &str {
        &self.anon_key
    }
}

fn is_placeholder(value: &str) -> bool {
    let upper = value.to_uppercase();
    upper.starts_with("YOUR_") || upper.starts_with("YOUR-") || upper.contains("<YOUR")
}

fn parse_project_url(raw: &str) -> Result<Url, ClientError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ClientError::Config("project URL is empty".to_string()));
    }
    if is_placeholder(raw) {
        return Err(ClientError::Config(
            "project URL is still a placeholder".to_string(),
        ));
    }

    let mut url = Url::parse(raw)
        .map_err(|e| ClientError::Config(format!("project URL '{}' is invalid: {}", raw, e)))?;

    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(ClientError::Config(format!(
            "project URL '{}' must be an http(s) address",
            raw
        )));
    }

    // Relative joins must append to the project path, not replace its tail.
    if !url.path().ends_with('/') {
        let path = format!("{}/", url.path());
        url.set_path(&path);
    }

    Ok(url)
}

fn check_anon_key(raw: &str) -> Result<String, ClientError> {
    let key = raw.trim();
    if key.is_empty() {
        return Err(ClientError::Config("anon key is empty".to_string()));
    }
    if is_placeholder(key) {
        return Err(ClientError::Config(
            "anon key is still a placeholder".to_string(),
        ));
    }
    if key.chars().any(char::is_whitespace) {
        return Err(ClientError::Config(
            "anon key must not contain whitespace".to_string(),
        ));
    }
    Ok(key.to_string())
}
