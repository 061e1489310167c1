//! Typed client for the events REST surface.

use reqwest::{Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;

use crate::access::caller::API_KEY_HEADER;
use crate::models::{Event, NewEvent};
use crate::utils::response::{ApiErrorResponse, ApiResponse};

pub mod config;
pub mod error;

pub use config::ClientConfig;
pub use error::ClientError;

const EVENTS_RESOURCE: &str = "rest/v1/events";

#[derive(Debug, Clone)]
pub struct EventsClient {
    http: reqwest::Client,
    config: ClientConfig,
    access_token: Option<String>,
}

impl EventsClient {
    pub fn new(config: ClientConfig) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
            access_token: None,
        }
    }

    /// Sends requests as an authenticated session instead of the anon role.
    pub fn with_access_token(mut self, token: impl Into<String>) -> Self {
        self.access_token = Some(token.into());
        self
    }

    pub async fn insert_event(&self, event: &NewEvent) -> Result<Event, ClientError> {
        check_required(event)?;

        let response = self
            .request(Method::POST)?
            .json(event)
            .send()
            .await?;
        let stored: Event = read_data(response).await?;

        tracing::debug!(event_id = stored.id, "Event stored");
        Ok(stored)
    }

    pub async fn list_events(&self) -> Result<Vec<Event>, ClientError> {
        let response = self.request(Method::GET)?.send().await?;
        read_data(response).await
    }

    fn events_url(&self) -> Result<Url, ClientError> {
        self.config
            .project_url()
            .join(EVENTS_RESOURCE)
            .map_err(|e| ClientError::Config(format!("cannot build events URL: {}", e)))
    }

    fn request(&self, method: Method) -> Result<RequestBuilder, ClientError> {
        let bearer = self
            .access_token
            .as_deref()
            .unwrap_or_else(|| self.config.anon_key());

        Ok(self
            .http
            .request(method, self.events_url()?)
            .header(API_KEY_HEADER, self.config.anon_key())
            .bearer_auth(bearer))
    }
}

/// Required text inputs must be non-empty, the same rule a form's
/// `required` attribute applies before submitting. Whitespace counts as input.
fn check_required(event: &NewEvent) -> Result<(), ClientError> {
    let blank: Vec<&str> = [
        ("city", &event.city),
        ("brand", &event.brand),
        ("theme", &event.theme),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(name, _)| name)
    .collect();

    if blank.is_empty() {
        Ok(())
    } else {
        Err(ClientError::Validation(format!(
            "Please fill in: {}",
            blank.join(", ")
        )))
    }
}

async fn read_data<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let status = response.status();

    if status.is_success() {
        let body: ApiResponse<T> = response.json().await?;
        return body.data.ok_or_else(|| ClientError::Api {
            status: status.as_u16(),
            code: "EMPTY_RESPONSE".to_string(),
            message: "response carried no data".to_string(),
        });
    }

    let text = response.text().await?;
    let (code, message) = match serde_json::from_str::<ApiErrorResponse>(&text) {
        Ok(body) => (body.error.code, body.error.message),
        Err(_) => ("HTTP_ERROR".to_string(), text),
    };

    tracing::debug!(status = status.as_u16(), %code, "Request failed");

    Err(match status {
        StatusCode::FORBIDDEN => ClientError::Permission(message),
        StatusCode::UNAUTHORIZED => ClientError::Unauthorized(message),
        StatusCode::BAD_REQUEST => ClientError::Validation(message),
        _ => ClientError::Api {
            status: status.as_u16(),
            code,
            message,
        },
    })
}
