//! OpenAPI document access
//!
//! [`OpenApiSpec`] holds the resolution pipeline shared by both versions:
//! request path to declared path, declared path to operation, operation to
//! response definition, response definition to schema. Version-specific
//! pieces (base path or servers, where responses and schemas live) are the
//! required trait methods implemented by [`OpenApi2Spec`] and
//! [`OpenApi3Spec`].

mod v2;
mod v3;

pub use v2::OpenApi2Spec;
pub use v3::OpenApi3Spec;

use oasprey_core::{ActualRequest, ActualResponse, ErrorCode, ValidationError};
use serde_json::{Map, Value};

use crate::schema::{self, SchemaDialect, SharedDefinitions, Subject};

/// Operation keys of a path item object.
pub const HTTP_METHODS: [&str; 8] = [
    "get", "put", "post", "delete", "options", "head", "patch", "trace",
];

/// A declared operation matched to a request.
#[derive(Debug, Clone)]
pub struct Operation<'a> {
    /// Declared path template, e.g. `/users/{id}`
    pub openapi_path: &'a str,
    /// Upper-case request method
    pub method: String,
    pub definition: &'a Value,
}

impl Operation<'_> {
    /// Declared response status keys, in declaration order.
    #[must_use]
    pub fn statuses(&self) -> Vec<&str> {
        self.definition
            .get("responses")
            .and_then(Value::as_object)
            .map(|responses| responses.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }
}

/// The response definition a received response is checked against.
#[derive(Debug, Clone)]
pub struct ExpectedResponse<'a> {
    pub status: u16,
    pub operation: Operation<'a>,
    /// Response object after following a response-level `$ref`
    pub definition: &'a Value,
    /// Body schema, `None` when the response declares no body
    pub schema: Option<&'a Value>,
}

pub trait OpenApiSpec {
    /// The whole document
    fn document(&self) -> &Value;

    /// Match a request path to a declared path, honouring base paths or
    /// servers.
    ///
    /// # Errors
    ///
    /// `ServerNotFound`/`BasePathNotFound` when no base applies, otherwise
    /// `PathNotFound`.
    fn find_openapi_path_matching_request(
        &self,
        request: &ActualRequest,
    ) -> Result<&str, ValidationError>;

    /// Follow a response `$ref` into the document's shared responses.
    fn find_response_definition(&self, reference: &str) -> Option<&Value>;

    fn shared_definitions(&self) -> SharedDefinitions<'_>;

    /// Map of named schemas (`definitions` or `components.schemas`)
    fn schema_objects(&self) -> Option<&Map<String, Value>>;

    fn dialect(&self) -> SchemaDialect;

    /// Body schema of a response object, if it declares one.
    fn response_schema<'a>(&self, response: &'a Value) -> Option<&'a Value>;

    fn paths_object(&self) -> Option<&Map<String, Value>> {
        self.document().get("paths").and_then(Value::as_object)
    }

    /// Declared paths in document order
    fn paths(&self) -> Vec<&str> {
        self.paths_object()
            .map(|paths| paths.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    fn path_item(&self, openapi_path: &str) -> Option<&Value> {
        self.paths_object()?.get(openapi_path)
    }

    fn schema_object(&self, name: &str) -> Option<&Value> {
        self.schema_objects()?.get(name)
    }

    fn schema_names(&self) -> Vec<&str> {
        self.schema_objects()
            .map(|schemas| schemas.keys().map(String::as_str).collect())
            .unwrap_or_default()
    }

    /// Upper-case methods declared for a path
    fn operation_methods(&self, openapi_path: &str) -> Vec<String> {
        let Some(item) = self.path_item(openapi_path).and_then(Value::as_object) else {
            return Vec::new();
        };
        item.keys()
            .filter(|key| HTTP_METHODS.contains(&key.as_str()))
            .map(|key| key.to_uppercase())
            .collect()
    }

    /// Response object for an exact status key, following a `$ref`.
    /// A `$ref` that points nowhere counts as no response.
    fn expected_response<'a>(&'a self, operation: &'a Value, status: u16) -> Option<&'a Value> {
        let response = operation.get("responses")?.get(status.to_string())?;
        match response.get("$ref").and_then(Value::as_str) {
            Some(reference) => self.find_response_definition(reference),
            None => Some(response),
        }
    }

    /// Resolve the operation a request targets.
    ///
    /// # Errors
    ///
    /// Any path resolution error, or `MethodNotFound`.
    fn find_operation(&self, request: &ActualRequest) -> Result<Operation<'_>, ValidationError> {
        let openapi_path = self.find_openapi_path_matching_request(request)?;
        let method = request.method_upper();
        let lower = method.to_lowercase();
        let definition = self
            .path_item(openapi_path)
            .filter(|_| HTTP_METHODS.contains(&lower.as_str()))
            .and_then(|item| item.get(lower.as_str()))
            .ok_or_else(|| {
                ValidationError::method_not_found(&method, request.pathname(), openapi_path)
            })?;

        tracing::debug!(method = %method, openapi_path, "matched operation");
        Ok(Operation {
            openapi_path,
            method,
            definition,
        })
    }

    /// Resolve the response definition for a received response.
    ///
    /// # Errors
    ///
    /// Any operation resolution error, or `StatusNotFound`.
    fn find_expected_response(
        &self,
        actual: &ActualResponse,
    ) -> Result<ExpectedResponse<'_>, ValidationError> {
        let operation = self.find_operation(&actual.req)?;
        let definition = self
            .expected_response(operation.definition, actual.status)
            .ok_or_else(|| {
                ValidationError::status_not_found(
                    actual.status,
                    &operation.method,
                    operation.openapi_path,
                )
            })?;

        Ok(ExpectedResponse {
            status: actual.status,
            operation,
            definition,
            schema: self.response_schema(definition),
        })
    }

    /// Check a body against a resolved expected response.
    ///
    /// # Errors
    ///
    /// `InvalidBody` listing every violation.
    fn validate_expected_body(
        &self,
        expected: &ExpectedResponse<'_>,
        body: &Value,
    ) -> Result<(), ValidationError> {
        let Some(schema) = expected.schema else {
            return Ok(());
        };
        schema::validate(schema, self.shared_definitions(), self.dialect(), body).map_err(
            |errors| {
                tracing::debug!(count = errors.len(), "response body violates schema");
                ValidationError::new(
                    ErrorCode::InvalidBody,
                    schema::join_errors(&errors, Subject::Response),
                )
            },
        )
    }

    /// Full check of a received response.
    ///
    /// # Errors
    ///
    /// The first failure along the resolution pipeline, or `InvalidBody`.
    fn validate_response(&self, actual: &ActualResponse) -> Result<(), ValidationError> {
        let expected = self.find_expected_response(actual)?;
        self.validate_expected_body(&expected, &actual.body_for_validation())
    }

    /// Check a standalone value against a schema from this document.
    ///
    /// # Errors
    ///
    /// `InvalidObject` listing every violation, paths rooted at `object`.
    fn validate_object(&self, value: &Value, schema: &Value) -> Result<(), ValidationError> {
        schema::validate(schema, self.shared_definitions(), self.dialect(), value).map_err(
            |errors| {
                ValidationError::new(
                    ErrorCode::InvalidObject,
                    schema::join_errors(&errors, Subject::Object),
                )
            },
        )
    }
}

/// A loaded document of either major version.
#[derive(Debug, Clone)]
pub enum ApiSpec {
    V2(OpenApi2Spec),
    V3(OpenApi3Spec),
}

impl ApiSpec {
    /// Pick the accessor from the document's version field.
    ///
    /// Documents with a `swagger` field are v2, everything else is v3.
    #[must_use]
    pub fn from_document(document: Value) -> Self {
        if document.get("swagger").is_some() {
            Self::V2(OpenApi2Spec::new(document))
        } else {
            Self::V3(OpenApi3Spec::new(document))
        }
    }

    #[must_use]
    pub fn as_dyn(&self) -> &dyn OpenApiSpec {
        &**self
    }

    /// Version string as declared (`2.0`, `3.0.3`, ...)
    #[must_use]
    pub fn version(&self) -> &str {
        let document = self.document();
        document
            .get("swagger")
            .or_else(|| document.get("openapi"))
            .and_then(Value::as_str)
            .unwrap_or_default()
    }
}

impl std::ops::Deref for ApiSpec {
    type Target = dyn OpenApiSpec;

    fn deref(&self) -> &Self::Target {
        match self {
            Self::V2(spec) => spec,
            Self::V3(spec) => spec,
        }
    }
}
