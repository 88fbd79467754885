//! Error taxonomy for gateway calls and stream subscriptions.

use std::error::Error as StdError;

use thiserror::Error;

pub type ApiResult<T> = Result<T, ApiError>;

/// A required dependency or setting was missing or invalid at wiring time.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
#[error("invalid configuration: {message}")]
pub struct ConfigurationError {
    pub message: String,
}

impl ConfigurationError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// No response was obtained from the backend.
#[derive(Debug, Error)]
#[error("{message}")]
pub struct TransportError {
    message: String,
    #[source]
    source: Option<Box<dyn StdError + Send + Sync>>,
}

impl TransportError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl Into<Box<dyn StdError + Send + Sync>>,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(source.into()),
        }
    }

    pub fn message(&self) -> &str {
        &self.message
    }
}

/// Coarse classification callers branch on (retry, toast, redirect).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ApiErrorKind {
    Configuration,
    Transport,
    Http,
    InvalidPath,
    Encode,
    Decode,
}

#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Configuration(#[from] ConfigurationError),
    #[error("transport failure: {0}")]
    Transport(#[from] TransportError),
    #[error("http {status} {status_text}")]
    Http { status: u16, status_text: String },
    /// A caller-supplied path segment was empty, `.` or `..`; nothing was sent.
    #[error("invalid path segment {segment:?}")]
    InvalidPath { segment: String },
    #[error("request body encode failed: {0}")]
    Encode(#[source] serde_json::Error),
    #[error("response body decode failed: {0}")]
    Decode(#[source] serde_json::Error),
}

impl ApiError {
    pub fn kind(&self) -> ApiErrorKind {
        match self {
            Self::Configuration(_) => ApiErrorKind::Configuration,
            Self::Transport(_) => ApiErrorKind::Transport,
            Self::Http { .. } => ApiErrorKind::Http,
            Self::InvalidPath { .. } => ApiErrorKind::InvalidPath,
            Self::Encode(_) => ApiErrorKind::Encode,
            Self::Decode(_) => ApiErrorKind::Decode,
        }
    }

    /// HTTP status for `Http` errors.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_transport(&self) -> bool {
        self.kind() == ApiErrorKind::Transport
    }

    pub fn is_http(&self) -> bool {
        self.kind() == ApiErrorKind::Http
    }

    pub fn is_decode(&self) -> bool {
        self.kind() == ApiErrorKind::Decode
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(self.status(), Some(401 | 403))
    }
}

/// Failure reported to a subscription's `on_error` handler. Never returned to callers.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StreamError {
    #[error("invalid stream url: {0}")]
    Url(String),
    #[error("stream connect failed: {0}")]
    Connect(String),
    #[error("stream rejected with status {0}")]
    Status(u16),
    #[error("stream read failed: {0}")]
    Read(String),
    #[error("stream closed by server")]
    Closed,
}
