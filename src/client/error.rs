use thiserror::Error;

#[derive(Debug, Error)]
pub enum ClientError {
    /// Credentials absent or malformed. Raised before any request is sent.
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The server's access policy rejected the operation.
    #[error("Permission denied: {0}")]
    Permission(String),

    #[error("API error ({status} {code}): {message}")]
    Api {
        status: u16,
        code: String,
        message: String,
    },

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),
}
