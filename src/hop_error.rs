//! Error types for the Hop API client.
//!
//! Every fallible operation in this crate returns [`HopError`]. The variants follow the
//! lifecycle of a call:
//! - configuration and credential problems surface at construction,
//! - parameter and misuse problems surface before any network I/O,
//! - transport failures are passed through from `reqwest` untouched,
//! - anything the server (or a garbled body) reports as failure becomes [`ApiError`].

use std::fmt;

use reqwest::{Method, StatusCode, header::HeaderMap};
use thiserror::Error;

/// Error code used when a response claimed to be JSON but could not be parsed.
pub const LOCAL_CLIENT_ERROR_CODE: &str = "local_client_error";

/// Result type using [`HopError`].
pub type Result<T> = std::result::Result<T, HopError>;

/// Errors that can occur when talking to the Hop API.
#[derive(Debug, Error)]
pub enum HopError {
    /// Missing required environment variable.
    #[error("missing required env var: {0}")]
    MissingEnv(&'static str),

    /// Invalid environment variable value.
    #[error("invalid env var {key}: {reason}")]
    InvalidEnv {
        /// The environment variable key.
        key: &'static str,
        /// The reason for invalidity.
        reason: &'static str,
    },

    /// The credential prefix is not one of the recognized authorization kinds.
    #[error("invalid authorization: unrecognized prefix `{prefix}` (expected ptk, bearer or pat)")]
    InvalidAuthorization {
        /// The prefix that was found before the first underscore.
        prefix: String,
    },

    /// A header name or value cannot be sent over HTTP.
    #[error("invalid header: {0}")]
    InvalidHeader(String),

    /// A path placeholder had no matching parameter.
    #[error("missing param {0}")]
    MissingParam(String),

    /// A path placeholder was bound to an undefined value.
    #[error("URL param {0} is undefined")]
    UndefinedParam(String),

    /// A body was supplied to a GET request.
    #[error("GET requests cannot have a body")]
    BodyOnGet,

    /// SDK-level argument validation failed.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Transport error raised by the HTTP client (DNS, connect, timeout, ...).
    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    /// Request body serialization or payload decoding failed.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),

    /// The server (or a malformed response) reported a failure.
    #[error("{0}")]
    Api(Box<ApiError>),
}

impl HopError {
    /// Returns the API error details when this is an [`HopError::Api`].
    #[must_use]
    pub fn as_api(&self) -> Option<&ApiError> {
        match self {
            Self::Api(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ApiError> for HopError {
    fn from(value: ApiError) -> Self {
        Self::Api(Box::new(value))
    }
}

/// Normalized error envelope, from either the modern or the legacy response shape.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiErrorBody {
    /// Machine-readable error code.
    pub code: String,
    /// Human-readable message.
    pub message: String,
}

impl ApiErrorBody {
    /// Build the envelope used for bodies that could not be parsed as JSON.
    #[must_use]
    pub fn local(message: impl Into<String>) -> Self {
        Self {
            code: LOCAL_CLIENT_ERROR_CODE.to_string(),
            message: message.into(),
        }
    }
}

/// Summary of the outgoing request that produced an [`ApiError`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestSummary {
    /// HTTP method.
    pub method: Method,
    /// Fully built URL, including the query string.
    pub url: String,
}

/// A failed API call, with the request, the response status and the parsed envelope.
#[derive(Debug, Clone)]
pub struct ApiError {
    /// The request that was sent.
    pub request: RequestSummary,
    /// HTTP status of the response.
    pub status: StatusCode,
    /// Response headers.
    pub headers: HeaderMap,
    /// The parsed error envelope.
    pub body: ApiErrorBody,
}

impl ApiError {
    /// Machine-readable error code.
    #[must_use]
    pub fn code(&self) -> &str {
        &self.body.code
    }

    /// Human-readable message.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.body.message
    }

    /// Whether the failure was synthesized locally from an unparsable body.
    #[must_use]
    pub fn is_local(&self) -> bool {
        self.body.code == LOCAL_CLIENT_ERROR_CODE
    }
}

impl fmt::Display for ApiError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.body.message)
    }
}

impl std::error::Error for ApiError {}
