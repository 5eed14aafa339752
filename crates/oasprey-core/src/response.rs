//! Actual request/response types and the transport normalizer
//!
//! HTTP client libraries hand back responses in their own shapes. The engine
//! only consumes [`ActualResponse`]: a status, the originating request and a
//! body ready for schema validation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// The request that produced an actual response.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActualRequest {
    /// HTTP method, any case
    pub method: String,
    /// Path as sent, query included
    pub path: String,
}

impl ActualRequest {
    #[must_use]
    pub fn new(method: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            path: path.into(),
        }
    }

    /// Only the pathname takes part in matching (path = pathname + query).
    #[must_use]
    pub fn pathname(&self) -> &str {
        pathname(&self.path)
    }

    /// Upper-cased method, as used in diagnostics.
    #[must_use]
    pub fn method_upper(&self) -> String {
        self.method.to_ascii_uppercase()
    }
}

/// Extract the pathname from a request path or absolute URL.
///
/// `/a/b?x=1#top` → `/a/b`, `http://host:8080/a?x` → `/a`.
#[must_use]
pub fn pathname(path: &str) -> &str {
    let without_origin = if path.starts_with('/') {
        path
    } else {
        match path.find("://") {
            Some(idx) => {
                let rest = &path[idx + 3..];
                let authority_end = rest.find(['/', '?', '#']).unwrap_or(rest.len());
                if rest[authority_end..].starts_with('/') {
                    &rest[authority_end..]
                } else {
                    "/"
                }
            }
            None => path,
        }
    };
    let end = without_origin
        .find(['?', '#'])
        .unwrap_or(without_origin.len());
    &without_origin[..end]
}

/// A normalized response, as consumed by the spec accessor.
#[derive(Debug, Clone, PartialEq)]
pub struct ActualResponse {
    pub status: u16,
    pub req: ActualRequest,
    body: Option<Value>,
    body_has_no_content: bool,
}

impl ActualResponse {
    #[must_use]
    pub fn new(status: u16, req: ActualRequest, body: Value) -> Self {
        Self::from_parts(status, req, Some(body))
    }

    fn from_parts(status: u16, req: ActualRequest, body: Option<Value>) -> Self {
        let body_has_no_content = matches!(&body, Some(Value::String(s)) if s.is_empty());
        Self {
            status,
            req,
            body,
            body_has_no_content,
        }
    }

    /// Body exactly as the transport delivered it.
    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    /// True when the transport signalled "no content" with an empty string payload.
    #[must_use]
    pub fn is_body_empty(&self) -> bool {
        self.body_has_no_content
    }

    /// Body to validate: an absent body is `null`, never `""`, so strictly typed
    /// schemas do not reject a response that simply has no content.
    #[must_use]
    pub fn body_for_validation(&self) -> Value {
        if self.body_has_no_content {
            return Value::Null;
        }
        self.body.clone().unwrap_or(Value::Null)
    }

    /// What the response contained, for diagnostics.
    #[must_use]
    pub fn summary(&self) -> Value {
        serde_json::json!({ "body": self.body.clone().unwrap_or(Value::Null) })
    }
}

impl std::fmt::Display for ActualResponse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let text = serde_json::to_string_pretty(&self.summary()).map_err(|_| std::fmt::Error)?;
        f.write_str(&text)
    }
}

/// Raised when a value is not a response this crate knows how to read.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResponseError {
    #[error("Invalid response object: expected an object, received type '{0}'")]
    NotAnObject(&'static str),
    #[error("Unknown response object type: expected `status` with `data` and `request`, or `status` with `req`")]
    UnknownShape,
    #[error("Invalid response status: {0}")]
    InvalidStatus(String),
    #[error("Invalid request descriptor: {0}")]
    InvalidRequest(String),
}

/// Normalize a transport response.
///
/// Accepts two shapes:
/// - client style: `{ "status", "data", "request": { "method", "path" } }`
/// - plain mock:   `{ "status", "req": { "method", "path" }, "body"? }`
///
/// # Errors
///
/// Returns [`ResponseError`] when the value lacks a status, a request
/// descriptor or a payload field.
pub fn normalize(raw: &Value) -> Result<ActualResponse, ResponseError> {
    let obj = raw
        .as_object()
        .ok_or_else(|| ResponseError::NotAnObject(json_type_name(raw)))?;

    let (request, body) = if obj.contains_key("data")
        && obj.contains_key("status")
        && obj.contains_key("request")
    {
        (&obj["request"], obj.get("data").cloned())
    } else if obj.contains_key("status") && obj.contains_key("req") {
        (&obj["req"], obj.get("body").cloned())
    } else {
        return Err(ResponseError::UnknownShape);
    };

    let status = parse_status(&obj["status"])?;
    let req = parse_request(request)?;
    Ok(ActualResponse::from_parts(status, req, body))
}

impl TryFrom<&Value> for ActualResponse {
    type Error = ResponseError;

    fn try_from(raw: &Value) -> Result<Self, Self::Error> {
        normalize(raw)
    }
}

fn parse_status(value: &Value) -> Result<u16, ResponseError> {
    value
        .as_u64()
        .and_then(|n| u16::try_from(n).ok())
        .ok_or_else(|| ResponseError::InvalidStatus(value.to_string()))
}

fn parse_request(value: &Value) -> Result<ActualRequest, ResponseError> {
    let field = |name: &str| {
        value
            .get(name)
            .and_then(Value::as_str)
            .ok_or_else(|| ResponseError::InvalidRequest(format!("missing string `{name}`")))
    };
    Ok(ActualRequest::new(field("method")?, field("path")?))
}

/// JSON type name in the vocabulary users see in error messages.
#[must_use]
pub const fn json_type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
