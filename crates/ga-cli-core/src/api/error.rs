use std::fmt;

use reqwest::StatusCode;
use serde::Deserialize;
use thiserror::Error;

use crate::auth::AuthError;

/// Closed set of remote failure kinds reported by Google APIs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    NotFound,
    PermissionDenied,
    InvalidArgument,
    Unauthenticated,
    ResourceExhausted,
    Internal,
    Unavailable,
    DeadlineExceeded,
}

impl ErrorKind {
    /// Map a canonical status name (`"NOT_FOUND"`) to a kind
    pub fn from_status_name(name: &str) -> Option<Self> {
        match name {
            "NOT_FOUND" => Some(Self::NotFound),
            "PERMISSION_DENIED" => Some(Self::PermissionDenied),
            "INVALID_ARGUMENT" => Some(Self::InvalidArgument),
            "UNAUTHENTICATED" => Some(Self::Unauthenticated),
            "RESOURCE_EXHAUSTED" => Some(Self::ResourceExhausted),
            "INTERNAL" => Some(Self::Internal),
            "UNAVAILABLE" => Some(Self::Unavailable),
            "DEADLINE_EXCEEDED" => Some(Self::DeadlineExceeded),
            _ => None,
        }
    }

    pub fn from_http_status(status: StatusCode) -> Option<Self> {
        match status.as_u16() {
            400 => Some(Self::InvalidArgument),
            401 => Some(Self::Unauthenticated),
            403 => Some(Self::PermissionDenied),
            404 => Some(Self::NotFound),
            429 => Some(Self::ResourceExhausted),
            500 => Some(Self::Internal),
            503 => Some(Self::Unavailable),
            504 => Some(Self::DeadlineExceeded),
            _ => None,
        }
    }

    /// Failures expected to resolve without client-side correction.
    /// Rate limiting is not one of them.
    pub const fn is_transient(self) -> bool {
        matches!(
            self,
            Self::Unavailable | Self::DeadlineExceeded | Self::Internal
        )
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::PermissionDenied => "permission_denied",
            Self::InvalidArgument => "invalid_argument",
            Self::Unauthenticated => "unauthenticated",
            Self::ResourceExhausted => "resource_exhausted",
            Self::Internal => "internal",
            Self::Unavailable => "unavailable",
            Self::DeadlineExceeded => "deadline_exceeded",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{message} ({kind})")]
    Remote { kind: ErrorKind, message: String },

    #[error("Request failed with status {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Network error: {0}")]
    Network(#[source] reqwest::Error),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error(transparent)]
    Auth(#[from] AuthError),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

/// Google JSON error envelope: `{"error": {"code", "message", "status"}}`
#[derive(Deserialize)]
struct ErrorEnvelope {
    error: ErrorStatus,
}

#[derive(Deserialize)]
struct ErrorStatus {
    message: Option<String>,
    status: Option<String>,
}

/// OAuth token endpoint error body
#[derive(Deserialize)]
struct OAuthError {
    error: String,
    error_description: Option<String>,
}

impl ApiError {
    pub fn remote(kind: ErrorKind, message: impl Into<String>) -> Self {
        ApiError::Remote {
            kind,
            message: message.into(),
        }
    }

    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        let body = body.trim();
        if body.chars().count() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let head: String = body.chars().take(MAX_ERROR_BODY_LENGTH).collect();
            format!("{}... (truncated, {} total bytes)", head, body.len())
        }
    }

    /// Classify a failed Admin API response
    pub fn from_status(status: StatusCode, body: &str) -> Self {
        let envelope = serde_json::from_str::<ErrorEnvelope>(body).ok();

        let kind = envelope
            .as_ref()
            .and_then(|e| e.error.status.as_deref())
            .and_then(ErrorKind::from_status_name)
            .or_else(|| ErrorKind::from_http_status(status));

        match kind {
            Some(kind) => {
                let message = envelope
                    .and_then(|e| e.error.message)
                    .unwrap_or_else(|| Self::truncate_body(body));
                ApiError::Remote { kind, message }
            }
            None => ApiError::Status {
                status,
                body: Self::truncate_body(body),
            },
        }
    }

    /// Classify a failed OAuth token exchange. Rejected grants are
    /// authentication failures; server-side trouble keeps its usual kind.
    pub(crate) fn from_token_failure(status: StatusCode, body: &str) -> Self {
        if status.is_server_error() || status == StatusCode::TOO_MANY_REQUESTS {
            return Self::from_status(status, body);
        }
        let message = match serde_json::from_str::<OAuthError>(body) {
            Ok(oauth) => oauth.error_description.unwrap_or(oauth.error),
            Err(_) => Self::truncate_body(body),
        };
        ApiError::remote(ErrorKind::Unauthenticated, message)
    }

    pub fn kind(&self) -> Option<ErrorKind> {
        match self {
            ApiError::Remote { kind, .. } => Some(*kind),
            _ => None,
        }
    }

    pub fn is_transient(&self) -> bool {
        self.kind().is_some_and(ErrorKind::is_transient)
    }
}

impl From<reqwest::Error> for ApiError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ApiError::remote(ErrorKind::DeadlineExceeded, err.to_string())
        } else if err.is_connect() {
            ApiError::remote(ErrorKind::Unavailable, err.to_string())
        } else {
            ApiError::Network(err)
        }
    }
}
