use std::fmt;

use serde_json::Value;
use thiserror::Error;

use crate::cache::RecordId;

// ---------------------------------------------------------------------------
// TransportError
// ---------------------------------------------------------------------------

/// Failure below HTTP: the request never produced a status line.
#[derive(Debug, Clone, Error)]
pub enum TransportError {
    #[error("Invalid URL \"{url}\": {message}")]
    InvalidUrl { url: String, message: String },

    #[error("Request timed out")]
    Timeout,

    #[error("Connection failed: {0}")]
    Connection(String),

    #[error("Failed to read response body: {0}")]
    Body(String),
}

// ---------------------------------------------------------------------------
// RequestFailure
// ---------------------------------------------------------------------------

/// A non-2xx response, kept verbatim so the message can be extracted later.
#[derive(Debug, Clone, Error)]
#[error("HTTP {status} {status_text}")]
pub struct RequestFailure {
    pub status: u16,
    pub status_text: String,
    pub content_type: Option<String>,
    pub body: String,
}

impl RequestFailure {
    /// The server's `exception` message, if the body is a JSON error document.
    pub fn exception(&self) -> Option<String> {
        if !is_json_content_type(self.content_type.as_deref()) {
            return None;
        }
        let json: Value = serde_json::from_str(&self.body).ok()?;
        json.get("exception")
            .and_then(Value::as_str)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
    }

    /// The `exception` field when present, otherwise the HTTP status text.
    pub fn message(&self) -> String {
        self.exception()
            .unwrap_or_else(|| self.status_text.clone())
    }
}

pub(crate) fn is_json_content_type(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.contains("application/json"))
}

// ---------------------------------------------------------------------------
// RemoteError
// ---------------------------------------------------------------------------

/// Any failure of a round trip to the server.
#[derive(Debug, Clone, Error)]
pub enum RemoteError {
    #[error(transparent)]
    Transport(#[from] TransportError),

    #[error(transparent)]
    Request(#[from] RequestFailure),

    #[error("Malformed response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Message suitable for showing to a user.
    pub fn user_message(&self) -> String {
        match self {
            Self::Request(failure) => failure.message(),
            other => other.to_string(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Request(failure) => Some(failure.status),
            _ => None,
        }
    }
}

// ---------------------------------------------------------------------------
// LoadError
// ---------------------------------------------------------------------------

/// The last read failure, retained on the store instead of being returned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadError {
    pub message: String,
    pub status: Option<u16>,
}

impl From<&RemoteError> for LoadError {
    fn from(err: &RemoteError) -> Self {
        Self {
            message: err.user_message(),
            status: err.status(),
        }
    }
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.status {
            Some(status) => write!(f, "Load failed ({status}): {}", self.message),
            None => write!(f, "Load failed: {}", self.message),
        }
    }
}

impl std::error::Error for LoadError {}

// ---------------------------------------------------------------------------
// StoreError
// ---------------------------------------------------------------------------

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Store for {schema}.{query} is not updatable")]
    NotUpdatable { schema: String, query: String },

    #[error("Record not found: {0}")]
    UnknownRecord(RecordId),

    #[error("Identity column is unknown until the store has been loaded")]
    IdentityUnknown,

    #[error("Invalid store configuration: {0}")]
    Config(String),

    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error(transparent)]
    Json(#[from] serde_json::Error),
}

/// Crate-wide result; the error defaults to `StoreError`.
pub type Result<T, E = StoreError> = std::result::Result<T, E>;

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
