//! Error taxonomy for registration, serving, and replay.

use thiserror::Error;

/// Errors surfaced by the mock service and its collaborators.
#[derive(Debug, Error)]
pub enum Error {
    #[error("No mock definition stored for id '{0}'")]
    NotFound(String),

    #[error("Invalid status code: {0}")]
    InvalidStatusCode(u16),

    #[error("Unresolvable HTTP method: {0}")]
    UnresolvedMethod(String),

    #[error("Invalid target URI: {0}")]
    InvalidUri(String),

    #[error("Invalid header '{name}': {reason}")]
    InvalidHeader { name: String, reason: String },

    #[error("Invalid definition: {0}")]
    InvalidDefinition(String),

    #[error("Replay dispatch failed: {0}")]
    ReplayFailed(#[source] Box<dyn std::error::Error + Send + Sync>),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),
}

/// HTTP status code mapping for service errors.
impl Error {
    pub fn status_code(&self) -> u16 {
        match self {
            Error::NotFound(_) => 404,
            Error::InvalidStatusCode(_) => 400,
            Error::UnresolvedMethod(_) => 400,
            Error::InvalidUri(_) => 400,
            Error::InvalidHeader { .. } => 400,
            Error::InvalidDefinition(_) => 400,
            Error::ReplayFailed(_) => 502,
            Error::Store(_) => 500,
        }
    }
}

impl From<reqwest::Error> for Error {
    fn from(e: reqwest::Error) -> Self {
        Error::ReplayFailed(Box::new(e))
    }
}

/// Definition store errors, kept separate so a missing id is never
/// conflated with a failing backend.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store backend unavailable: {0}")]
    Unavailable(String),
}
