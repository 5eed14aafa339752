//! Contract failure taxonomy
//!
//! Every stage of response resolution and validation fails with exactly one
//! [`ErrorCode`]. Messages name the concrete method, path and status involved
//! so a failure can be diagnosed without re-running the test.

use serde::{Deserialize, Serialize};

/// Kind of contract failure - closed set, hosts match on it instead of parsing text
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ErrorCode {
    /// No declared v3 server base path is a prefix of the request path
    ServerNotFound,
    /// The v2 `basePath` is not a prefix of the request path
    BasePathNotFound,
    /// Base path matched but no path template matches the rest
    PathNotFound,
    /// Path matched but no operation for the request method
    MethodNotFound,
    /// Operation matched but no response for the actual status
    StatusNotFound,
    /// Response body does not satisfy the declared schema
    InvalidBody,
    /// Standalone object does not satisfy the supplied schema
    InvalidObject,
}

impl ErrorCode {
    /// Stable identifier surfaced verbatim to users
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::ServerNotFound => "ServerNotFound",
            Self::BasePathNotFound => "BasePathNotFound",
            Self::PathNotFound => "PathNotFound",
            Self::MethodNotFound => "MethodNotFound",
            Self::StatusNotFound => "StatusNotFound",
            Self::InvalidBody => "InvalidBody",
            Self::InvalidObject => "InvalidObject",
        }
    }

    /// Human-readable description
    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::ServerNotFound => "Request path matches no server declared in the API spec",
            Self::BasePathNotFound => "Request path does not start with the API spec basePath",
            Self::PathNotFound => "Request path matches no path declared in the API spec",
            Self::MethodNotFound => "Request method has no operation for the matched path",
            Self::StatusNotFound => "Response status is not declared for the matched operation",
            Self::InvalidBody => "Response body does not match the declared schema",
            Self::InvalidObject => "Object does not match the supplied schema",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single contract failure: a kind plus a message, nothing else.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error, Serialize, Deserialize)]
#[error("{message}")]
pub struct ValidationError {
    pub code: ErrorCode,
    pub message: String,
}

impl ValidationError {
    #[must_use]
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
        }
    }

    #[must_use]
    pub fn server_not_found(method: &str, path: &str) -> Self {
        Self::new(
            ErrorCode::ServerNotFound,
            format!("no server in your API spec matches request '{method} {path}'"),
        )
    }

    #[must_use]
    pub fn base_path_not_found(method: &str, path: &str, base_path: &str) -> Self {
        Self::new(
            ErrorCode::BasePathNotFound,
            format!(
                "request '{method} {path}' does not start with the basePath '{base_path}' of your API spec"
            ),
        )
    }

    #[must_use]
    pub fn path_not_found(method: &str, path: &str) -> Self {
        Self::new(
            ErrorCode::PathNotFound,
            format!("no path in your API spec matches request '{method} {path}'"),
        )
    }

    #[must_use]
    pub fn method_not_found(method: &str, path: &str, openapi_path: &str) -> Self {
        Self::new(
            ErrorCode::MethodNotFound,
            format!(
                "no '{method}' operation defined for path '{openapi_path}' in your API spec (request '{method} {path}')"
            ),
        )
    }

    #[must_use]
    pub fn status_not_found(status: u16, method: &str, openapi_path: &str) -> Self {
        Self::new(
            ErrorCode::StatusNotFound,
            format!(
                "no '{status}' response defined for endpoint '{method} {openapi_path}' in your API spec"
            ),
        )
    }
}
