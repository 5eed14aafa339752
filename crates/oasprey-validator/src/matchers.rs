//! Assertion-style checks with diagnostic messages
//!
//! A [`MatcherResult`] carries both the verdict and the message to show for
//! it, so a host can print the failure for a positive assertion or the
//! unexpected match for a negated one.

use oasprey_core::{ActualResponse, ErrorCode, ResponseError, ValidationError, normalize};
use serde_json::Value;

use crate::spec::{ApiSpec, OpenApiSpec};

/// Outcome of a matcher plus its diagnostic.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MatcherResult {
    pub pass: bool,
    pub message: String,
}

impl MatcherResult {
    /// Panic with the message unless the value satisfied the spec.
    pub fn assert_pass(&self) {
        assert!(self.pass, "{}", self.message);
    }

    /// Panic with the message if the value satisfied the spec.
    pub fn assert_fail(&self) {
        assert!(!self.pass, "{}", self.message);
    }
}

/// Misuse of a matcher; raised for both positive and negated assertions.
#[derive(Debug, thiserror::Error)]
pub enum MatcherError {
    #[error(transparent)]
    Response(#[from] ResponseError),
    #[error("`schemaName` must match a schema in your API spec\n\nSchemas found in API spec: {0}")]
    SchemaNotFound(String),
}

fn stringify(value: &Value) -> String {
    serde_json::to_string_pretty(value).unwrap_or_else(|_| value.to_string())
}

fn join<S: AsRef<str>>(items: &[S]) -> String {
    items
        .iter()
        .map(AsRef::as_ref)
        .collect::<Vec<&str>>()
        .join(", ")
}

/// Check a transport response against the spec.
///
/// # Errors
///
/// [`MatcherError::Response`] when `received` is not a recognized response
/// shape.
pub fn satisfy_api_spec(received: &Value, spec: &ApiSpec) -> Result<MatcherResult, MatcherError> {
    let actual = normalize(received)?;
    Ok(check_response(&actual, spec))
}

/// Check an already normalized response against the spec.
#[must_use]
pub fn check_response(actual: &ActualResponse, spec: &ApiSpec) -> MatcherResult {
    let method = actual.req.method_upper();
    let pathname = actual.req.pathname();

    let expected = match spec.find_expected_response(actual) {
        Ok(expected) => expected,
        Err(err) => {
            return MatcherResult {
                pass: false,
                message: format!(
                    "expected received to satisfy a '{}' response defined for endpoint '{method} {pathname}' in your API spec\n{}",
                    actual.status,
                    explain_resolution_failure(actual, spec, &err)
                ),
            };
        }
    };

    let endpoint = format!("{} {}", expected.operation.method, expected.operation.openapi_path);
    let definition = format!(
        "The '{}' response defined for endpoint '{endpoint}' in API spec: {}",
        actual.status,
        stringify(expected.definition)
    );

    match spec.validate_expected_body(&expected, &actual.body_for_validation()) {
        Ok(()) => MatcherResult {
            pass: true,
            message: format!(
                "expected received not to satisfy the '{}' response defined for endpoint '{endpoint}' in your API spec\n\nreceived contained: {actual}\n\n{definition}",
                actual.status
            ),
        },
        Err(err) => MatcherResult {
            pass: false,
            message: format!(
                "expected received to satisfy the '{}' response defined for endpoint '{endpoint}' in your API spec\n\nreceived did not satisfy it because: {}\n\nreceived contained: {actual}\n\n{definition}",
                actual.status, err.message
            ),
        },
    }
}

/// The "received had ..." lines for a response that never reached schema
/// validation.
fn explain_resolution_failure(
    actual: &ActualResponse,
    spec: &ApiSpec,
    err: &ValidationError,
) -> String {
    let method = actual.req.method_upper();
    let pathname = actual.req.pathname();
    let status = actual.status;

    match err.code {
        ErrorCode::ServerNotFound => {
            let urls = match spec {
                ApiSpec::V3(v3) => join(&v3.server_urls()),
                ApiSpec::V2(_) => String::new(),
            };
            format!(
                "received had request path '{pathname}', but your API spec has no matching servers\n\nServers found in API spec: {urls}"
            )
        }
        ErrorCode::BasePathNotFound => {
            let base_path = match spec {
                ApiSpec::V2(v2) => v2.base_path(),
                ApiSpec::V3(_) => "/",
            };
            format!(
                "received had request path '{pathname}', but your API spec has basePath '{base_path}'"
            )
        }
        ErrorCode::PathNotFound => {
            let mut text = format!(
                "received had request path '{pathname}', but your API spec has no matching path\n\nPaths found in API spec: {}",
                join(&spec.paths())
            );
            match spec {
                ApiSpec::V2(v2) if v2.did_user_define_base_path() => {
                    text.push_str(&format!(
                        "\n\n'{pathname}' matches basePath '{}' but no <basePath/endpointPath> combinations",
                        v2.base_path()
                    ));
                }
                ApiSpec::V3(v3) if v3.did_user_define_servers() => {
                    text.push_str(&format!(
                        "\n\n'{pathname}' matches servers {} but no <server/endpointPath> combinations",
                        join(&v3.matching_server_urls(pathname))
                    ));
                }
                _ => {}
            }
            text
        }
        ErrorCode::MethodNotFound => {
            let openapi_path = spec
                .find_openapi_path_matching_request(&actual.req)
                .unwrap_or(pathname);
            format!(
                "received had request method '{method}', but your API spec has no '{method}' operation defined for path '{openapi_path}'\n\nRequest operations found for path '{openapi_path}' in API spec: {}",
                join(&spec.operation_methods(openapi_path))
            )
        }
        ErrorCode::StatusNotFound => match spec.find_operation(&actual.req) {
            Ok(operation) => {
                let endpoint = format!("{} {}", operation.method, operation.openapi_path);
                format!(
                    "received had status {status}, but your API spec has no {status} response defined for endpoint '{endpoint}'\n\nResponse statuses found for endpoint '{endpoint}' in API spec: {}",
                    join(&operation.statuses())
                )
            }
            Err(_) => err.message.clone(),
        },
        ErrorCode::InvalidBody | ErrorCode::InvalidObject => err.message.clone(),
    }
}

/// Check a standalone value against a named schema of the spec.
///
/// # Errors
///
/// [`MatcherError::SchemaNotFound`] when the spec has no such schema; this
/// is a usage error whichever way the assertion is phrased.
pub fn satisfy_schema_in_api_spec(
    received: &Value,
    schema_name: &str,
    spec: &ApiSpec,
) -> Result<MatcherResult, MatcherError> {
    let schema = spec
        .schema_object(schema_name)
        .ok_or_else(|| MatcherError::SchemaNotFound(join(&spec.schema_names())))?;

    let definition = format!(
        "The '{schema_name}' schema in API spec: {}",
        stringify(schema)
    );
    let received_text = stringify(received);

    Ok(match spec.validate_object(received, schema) {
        Ok(()) => MatcherResult {
            pass: true,
            message: format!(
                "expected received not to satisfy the '{schema_name}' schema defined in your API spec\n\nreceived was: {received_text}\n\n{definition}"
            ),
        },
        Err(err) => MatcherResult {
            pass: false,
            message: format!(
                "expected received to satisfy the '{schema_name}' schema defined in your API spec\n\nreceived did not satisfy it because: {}\n\nreceived was: {received_text}\n\n{definition}",
                err.message
            ),
        },
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::loader::make_api_spec;
    use serde_json::json;

    fn spec() -> ApiSpec {
        make_api_spec(json!({
            "openapi": "3.0.0",
            "info": { "title": "t", "version": "1" },
            "servers": [{ "url": "http://localhost/api" }],
            "paths": {
                "/users/{id}": {
                    "get": {
                        "responses": {
                            "200": {
                                "description": "ok",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/User" }
                                    }
                                }
                            }
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "User": {
                        "type": "object",
                        "required": ["id"],
                        "properties": { "id": { "type": "integer" } }
                    }
                }
            }
        }))
        .unwrap()
    }

    fn res(method: &str, path: &str, status: u16, body: Value) -> Value {
        json!({ "status": status, "req": { "method": method, "path": path }, "body": body })
    }

    #[test]
    fn passing_response() {
        let result = satisfy_api_spec(&res("GET", "/api/users/1", 200, json!({"id": 1})), &spec())
            .unwrap();
        result.assert_pass();
        assert!(result.message.contains(
            "not to satisfy the '200' response defined for endpoint 'GET /users/{id}'"
        ));
    }

    #[test]
    fn invalid_body() {
        let result =
            satisfy_api_spec(&res("GET", "/api/users/1", 200, json!({"id": "x"})), &spec())
                .unwrap();
        result.assert_fail();
        assert!(result.message.contains("received did not satisfy it because: response.id"));
    }

    #[test]
    fn unknown_server() {
        let result = satisfy_api_spec(&res("GET", "/users/1", 200, json!({})), &spec()).unwrap();
        assert!(!result.pass);
        assert!(result.message.contains("Servers found in API spec: http://localhost/api"));
    }

    #[test]
    fn unknown_path_lists_paths_and_servers() {
        let result = satisfy_api_spec(&res("GET", "/api/nope", 200, json!({})), &spec()).unwrap();
        assert!(!result.pass);
        assert!(result.message.contains("Paths found in API spec: /users/{id}"));
        assert!(result.message.contains("matches servers http://localhost/api"));
    }

    #[test]
    fn unknown_method_lists_operations() {
        let result =
            satisfy_api_spec(&res("DELETE", "/api/users/1", 200, json!({})), &spec()).unwrap();
        assert!(!result.pass);
        assert!(result.message.contains(
            "Request operations found for path '/users/{id}' in API spec: GET"
        ));
    }

    #[test]
    fn unknown_status_lists_statuses() {
        let result =
            satisfy_api_spec(&res("GET", "/api/users/1", 418, json!({})), &spec()).unwrap();
        assert!(!result.pass);
        assert!(result.message.starts_with(
            "expected received to satisfy a '418' response defined for endpoint 'GET /api/users/1'"
        ));
        assert!(result.message.contains(
            "received had status 418, but your API spec has no 418 response defined for endpoint 'GET /users/{id}'"
        ));
        assert!(result.message.contains("Response statuses found"));
    }

    #[test]
    fn status_not_found_message() {
        let result =
            satisfy_api_spec(&res("GET", "/api/users/1?x=1", 418, json!({})), &spec()).unwrap();
        insta::assert_snapshot!(result.message, @r"
        expected received to satisfy a '418' response defined for endpoint 'GET /api/users/1' in your API spec
        received had status 418, but your API spec has no 418 response defined for endpoint 'GET /users/{id}'

        Response statuses found for endpoint 'GET /users/{id}' in API spec: 200
        ");
    }

    #[test]
    fn unreadable_response_is_an_error() {
        let err = satisfy_api_spec(&json!({"foo": 1}), &spec()).unwrap_err();
        assert!(matches!(err, MatcherError::Response(ResponseError::UnknownShape)));
    }

    #[test]
    fn schema_matcher() {
        let spec = spec();
        let ok = satisfy_schema_in_api_spec(&json!({"id": 3}), "User", &spec).unwrap();
        ok.assert_pass();

        let bad = satisfy_schema_in_api_spec(&json!({}), "User", &spec).unwrap();
        bad.assert_fail();
        assert!(bad.message.contains("because: object "), "{}", bad.message);
        assert!(bad.message.contains("The 'User' schema in API spec"));
    }

    #[test]
    fn unknown_schema_is_an_error() {
        let err = satisfy_schema_in_api_spec(&json!("foo"), "Nope", &spec()).unwrap_err();
        assert!(
            err.to_string()
                .starts_with("`schemaName` must match a schema in your API spec")
        );
        assert!(err.to_string().ends_with("Schemas found in API spec: User"));
    }

    #[test]
    fn schema_names_outside_uri_characters() {
        let spec = make_api_spec(json!({
            "swagger": "2.0",
            "info": { "title": "t", "version": "1" },
            "paths": {},
            "definitions": {
                "Page«Pet»": {
                    "type": "object",
                    "required": ["items"],
                    "properties": {
                        "items": { "type": "array", "items": { "$ref": "#/definitions/Pet" } }
                    }
                },
                "My Pet": { "type": "object", "required": ["id"] },
                "Pet": { "type": "object", "required": ["id"] }
            }
        }))
        .unwrap();

        satisfy_schema_in_api_spec(&json!({"items": [{"id": 1}]}), "Page«Pet»", &spec)
            .unwrap()
            .assert_pass();
        satisfy_schema_in_api_spec(&json!({"id": 1}), "My Pet", &spec)
            .unwrap()
            .assert_pass();

        let result =
            satisfy_schema_in_api_spec(&json!({"items": [{}]}), "Page«Pet»", &spec).unwrap();
        result.assert_fail();
        assert!(
            result
                .message
                .contains("received did not satisfy it because: object.items[0] "),
            "{}",
            result.message
        );
    }

    #[test]
    #[should_panic(expected = "received did not satisfy it")]
    fn assert_pass_panics_with_message() {
        satisfy_api_spec(&res("GET", "/api/users/1", 200, json!({"id": "x"})), &spec())
            .unwrap()
            .assert_pass();
    }
}
