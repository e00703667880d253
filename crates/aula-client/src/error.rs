//! Error taxonomy for client operations.

use std::path::PathBuf;

use reqwest::StatusCode;
use serde_json::Value;
use thiserror::Error;

use crate::config::ConfigError;
use crate::store::StoreError;

/// Message used when an error response carries nothing presentable.
pub const GENERIC_FAILURE: &str = "the request could not be completed";

const MAX_TEXT_MESSAGE_LEN: usize = 200;

/// Result alias for client operations.
pub type Result<T> = std::result::Result<T, ClientError>;

/// Errors raised by [`crate::AulaClient`] operations.
#[derive(Debug, Error)]
pub enum ClientError {
    /// The server answered with a non-success status.
    #[error("{}", describe_api(.status, .body))]
    Api {
        /// Response status.
        status: StatusCode,
        /// Decoded response body.
        body: ApiErrorBody,
    },
    /// A 401 ended the session: no refresh token was stored, or a concurrent
    /// refresh already failed and cleared it.
    #[error("{source}")]
    SessionExpired {
        /// The rejected response.
        source: Box<ClientError>,
    },
    /// A 401 could not be recovered because the refresh exchange failed.
    #[error("session expired: token refresh failed")]
    RefreshFailed {
        /// Failure of the refresh exchange.
        source: Box<ClientError>,
    },
    /// The request never produced a response.
    #[error("request {operation} failed")]
    Transport {
        /// Method and path of the request.
        operation: String,
        /// Underlying transport error.
        source: reqwest::Error,
    },
    /// A success response body did not match the expected document.
    #[error("failed to decode response of {operation}")]
    Decode {
        /// Method and path of the request.
        operation: String,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// A request body could not be serialised.
    #[error("failed to encode body of {operation}")]
    Encode {
        /// Method and path of the request.
        operation: String,
        /// Underlying serde error.
        source: serde_json::Error,
    },
    /// The HTTP client could not be constructed.
    #[error("failed to build HTTP client")]
    HttpClient {
        /// Underlying reqwest error.
        source: reqwest::Error,
    },
    /// Client configuration was invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),
    /// Session storage failed.
    #[error(transparent)]
    Storage(#[from] StoreError),
    /// An upload file could not be read.
    #[error("failed to read upload file {}", .path.display())]
    Upload {
        /// File that could not be read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },
}

fn describe_api(status: &StatusCode, body: &ApiErrorBody) -> String {
    body.message()
        .unwrap_or_else(|| format!("request failed with status {status}"))
}

/// Coarse classification used by front ends to pick a presentation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Credentials were rejected or the session ended.
    Auth,
    /// The server rejected the request content.
    Validation,
    /// The server failed or answered with an unexpected document.
    Server,
    /// The server could not be reached.
    Transport,
    /// A local resource (configuration, storage, files) failed.
    Local,
}

impl ClientError {
    /// Classify the error.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Api { status, .. } if *status == StatusCode::UNAUTHORIZED => ErrorKind::Auth,
            Self::Api { status, .. } if status.is_client_error() => ErrorKind::Validation,
            Self::Api { .. } | Self::Decode { .. } => ErrorKind::Server,
            Self::SessionExpired { .. } | Self::RefreshFailed { .. } => ErrorKind::Auth,
            Self::Transport { .. } => ErrorKind::Transport,
            Self::Encode { .. }
            | Self::HttpClient { .. }
            | Self::Config(_)
            | Self::Storage(_)
            | Self::Upload { .. } => ErrorKind::Local,
        }
    }

    /// HTTP status of an [`ClientError::Api`] failure, including the one
    /// wrapped by [`ClientError::SessionExpired`].
    #[must_use]
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Api { status, .. } => Some(*status),
            Self::SessionExpired { source } => source.status(),
            _ => None,
        }
    }

    /// Whether the session was cleared and the user must log in again.
    ///
    /// A 401 answered to a request retried with a freshly refreshed token
    /// leaves the session in place and is not an expiry.
    #[must_use]
    pub const fn is_session_expired(&self) -> bool {
        matches!(
            self,
            Self::SessionExpired { .. } | Self::RefreshFailed { .. }
        )
    }

    /// Decoded error body of an [`ClientError::Api`] failure, including the
    /// one wrapped by [`ClientError::SessionExpired`].
    #[must_use]
    pub fn body(&self) -> Option<&ApiErrorBody> {
        match self {
            Self::Api { body, .. } => Some(body),
            Self::SessionExpired { source } => source.body(),
            _ => None,
        }
    }

    /// Message suitable for end users.
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Api { body, .. } => body.message_or(GENERIC_FAILURE),
            Self::SessionExpired { source } => source.user_message(),
            Self::RefreshFailed { .. } => "your session has expired, log in again".to_string(),
            Self::Transport { .. } => "could not reach the server".to_string(),
            other => other.to_string(),
        }
    }
}

/// Body of an error response, kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiErrorBody {
    /// JSON document, usually `{"detail": ...}`, `{"error": ...}` or field errors.
    Json(Value),
    /// Non-JSON text such as an HTML error page.
    Text(String),
    /// No body.
    Empty,
}

impl ApiErrorBody {
    /// Decode raw response bytes.
    #[must_use]
    pub fn from_bytes(bytes: &[u8]) -> Self {
        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Self::Empty;
        }
        serde_json::from_slice::<Value>(bytes).map_or_else(
            |_| Self::Text(String::from_utf8_lossy(bytes).trim().to_string()),
            Self::Json,
        )
    }

    /// JSON document, when the body was JSON.
    #[must_use]
    pub const fn as_json(&self) -> Option<&Value> {
        match self {
            Self::Json(value) => Some(value),
            _ => None,
        }
    }

    /// Best presentable message: `detail`, then `error`, then
    /// `non_field_errors`, then the first field error.
    #[must_use]
    pub fn message(&self) -> Option<String> {
        match self {
            Self::Json(value) => json_message(value),
            Self::Text(text) if !text.is_empty() && text.len() <= MAX_TEXT_MESSAGE_LEN => {
                Some(text.clone())
            }
            Self::Text(_) | Self::Empty => None,
        }
    }

    /// [`Self::message`] or the given fallback.
    #[must_use]
    pub fn message_or(&self, fallback: &str) -> String {
        self.message().unwrap_or_else(|| fallback.to_string())
    }

    /// Per-field validation messages, first message per field.
    #[must_use]
    pub fn field_errors(&self) -> Vec<(String, String)> {
        let Some(Value::Object(map)) = self.as_json() else {
            return Vec::new();
        };
        map.iter()
            .filter(|(field, _)| !is_summary_key(field))
            .filter_map(|(field, value)| first_text(value).map(|text| (field.clone(), text)))
            .collect()
    }
}

fn is_summary_key(key: &str) -> bool {
    matches!(key, "detail" | "error" | "non_field_errors" | "code" | "messages")
}

fn json_message(value: &Value) -> Option<String> {
    match value {
        Value::Object(map) => ["detail", "error", "non_field_errors"]
            .iter()
            .find_map(|key| map.get(*key).and_then(first_text))
            .or_else(|| {
                map.iter()
                    .filter(|(field, _)| !is_summary_key(field))
                    .find_map(|(field, value)| {
                        first_text(value).map(|text| format!("{field}: {text}"))
                    })
            }),
        other => first_text(other),
    }
}

fn first_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) if !text.trim().is_empty() => Some(text.clone()),
        Value::Array(items) => items.iter().find_map(first_text),
        _ => None,
    }
}
