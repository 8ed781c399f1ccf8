use thiserror::Error;

/// Errors surfaced by the HTTP client and the change feed.
#[derive(Debug, Error)]
pub enum Error {
    /// No valid session — the caller must re-authenticate.
    #[error("unauthorized: no valid session")]
    Unauthorized,

    /// The session exists but may not touch this resource.
    #[error("forbidden: not your project")]
    Forbidden,

    /// The resource does not exist (or is hidden by row policy).
    #[error("not found")]
    NotFound,

    /// Any other non-success response from the service.
    #[error("API error (HTTP {status}): {message}")]
    Api { status: u16, message: String },

    /// The body did not match the expected envelope.
    #[error("failed to deserialize response: {message}")]
    Deserialization { message: String, body: String },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("invalid URL: {0}")]
    Url(#[from] url::ParseError),

    #[error("change feed error: {message}")]
    Feed { message: String },
}
