use std::time::Duration;

use thiserror::Error;

/// Errors a caller of the resolver can see.
#[derive(Debug, Error)]
pub enum SearchError {
    /// No usable input. The caller must collect a new query.
    #[error("invalid query: {0}")]
    InvalidQuery(String),

    /// The photo could not be turned into a food name.
    #[error("could not identify the food in the image: {reason}")]
    IdentificationFailed { reason: String, retry_with_text: bool },
}

/// A collaborator did not answer. The resolver converts every one of these into
/// "try the next source".
#[derive(Debug, Error)]
pub enum CollaboratorError {
    #[error("timed out after {0:?}")]
    Timeout(Duration),

    /// The HTTP client gave up before the resolver's own deadline.
    #[error("request timed out")]
    RequestTimeout,

    #[error("transport error: {0}")]
    Transport(String),

    #[error("unexpected status {0}")]
    Status(u16),

    #[error("malformed response: {0}")]
    Malformed(String),
}

/// Request URLs can carry credentials, so they are dropped from the message.
impl From<reqwest::Error> for CollaboratorError {
    fn from(e: reqwest::Error) -> Self {
        let e = e.without_url();
        if e.is_timeout() {
            CollaboratorError::RequestTimeout
        } else if e.is_decode() {
            CollaboratorError::Malformed(e.to_string())
        } else {
            CollaboratorError::Transport(e.to_string())
        }
    }
}
