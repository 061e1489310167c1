use std::collections::HashSet;

use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::http::HeaderMap;

use super::Role;
use crate::utils::error::AppError;
use crate::AppState;

pub const API_KEY_HEADER: &str = "apikey";

/// Credentials the server accepts.
#[derive(Debug, Clone)]
pub struct ApiKeys {
    anon_key: String,
    authenticated_tokens: HashSet<String>,
}

impl ApiKeys {
    pub fn new<I, S>(anon_key: impl Into<String>, authenticated_tokens: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            anon_key: anon_key.into(),
            authenticated_tokens: authenticated_tokens.into_iter().map(Into::into).collect(),
        }
    }

    /// Maps request headers to the role the request runs under.
    ///
    /// The `apikey` header must carry the anon key. A bearer token, when
    /// present, either repeats the anon key or names an authenticated session.
    pub fn resolve(&self, headers: &HeaderMap) -> Result<Role, AppError> {
        let api_key = headers
            .get(API_KEY_HEADER)
            .and_then(|value| value.to_str().ok())
            .ok_or_else(|| AppError::AuthError("No API key found in request".to_string()))?;

        if api_key != self.anon_key {
            return Err(AppError::AuthError("Invalid API key".to_string()));
        }

        let bearer = match headers.get(AUTHORIZATION) {
            None => return Ok(Role::Anon),
            Some(value) => value
                .to_str()
                .ok()
                .and_then(bearer_token)
                .ok_or_else(|| {
                    AppError::AuthError("Malformed Authorization header".to_string())
                })?,
        };

        if bearer == self.anon_key {
            Ok(Role::Anon)
        } else if self.authenticated_tokens.contains(bearer) {
            Ok(Role::Authenticated)
        } else {
            Err(AppError::AuthError("Invalid bearer token".to_string()))
        }
    }
}

/// Extracts the token of a `Bearer` credential. The scheme is matched
/// case-insensitively.
fn bearer_token(header: &str) -> Option<&str> {
    let (scheme, token) = header.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// The resolved identity of the current request.
#[derive(Debug, Clone, Copy)]
pub struct Caller {
    pub role: Role,
}

#[async_trait]
impl FromRequestParts<AppState> for Caller {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let role = state.keys.resolve(&parts.headers)?;
        Ok(Caller { role })
    }
}
