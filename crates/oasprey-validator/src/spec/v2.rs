//! Swagger 2.0 documents

use oasprey_core::{ActualRequest, ValidationError};
use serde_json::{Map, Value};

use super::OpenApiSpec;
use crate::path::{
    DEFAULT_BASE_PATH, find_openapi_path_matching_possible_pathnames, pathname_without_base_path,
};
use crate::schema::{SchemaDialect, SharedDefinitions};

const RESPONSE_REF_PREFIX: &str = "#/responses/";

/// Accessor for a Swagger 2.0 document.
#[derive(Debug, Clone)]
pub struct OpenApi2Spec {
    document: Value,
}

impl OpenApi2Spec {
    #[must_use]
    pub fn new(document: Value) -> Self {
        Self { document }
    }

    /// Whether the document sets `basePath` itself
    #[must_use]
    pub fn did_user_define_base_path(&self) -> bool {
        self.document.get("basePath").and_then(Value::as_str).is_some()
    }

    /// Declared `basePath`, `/` when absent
    #[must_use]
    pub fn base_path(&self) -> &str {
        self.document
            .get("basePath")
            .and_then(Value::as_str)
            .unwrap_or(DEFAULT_BASE_PATH)
    }
}

impl OpenApiSpec for OpenApi2Spec {
    fn document(&self) -> &Value {
        &self.document
    }

    fn find_openapi_path_matching_request(
        &self,
        request: &ActualRequest,
    ) -> Result<&str, ValidationError> {
        let pathname = request.pathname();
        let base_path = self.base_path();
        if self.did_user_define_base_path() && !pathname.starts_with(base_path) {
            return Err(ValidationError::base_path_not_found(
                &request.method_upper(),
                pathname,
                base_path,
            ));
        }

        let stripped = pathname_without_base_path(base_path, pathname);
        let paths = self.paths();
        let openapi_path = find_openapi_path_matching_possible_pathnames(&[stripped], &paths)
            .ok_or_else(|| ValidationError::path_not_found(&request.method_upper(), pathname))?;
        tracing::debug!(pathname, base_path, openapi_path, "matched path");
        Ok(openapi_path)
    }

    fn find_response_definition(&self, reference: &str) -> Option<&Value> {
        let name = reference.split(RESPONSE_REF_PREFIX).nth(1)?;
        self.document.get("responses")?.get(name)
    }

    fn shared_definitions(&self) -> SharedDefinitions<'_> {
        SharedDefinitions::Definitions(self.document.get("definitions"))
    }

    fn schema_objects(&self) -> Option<&Map<String, Value>> {
        self.document.get("definitions").and_then(Value::as_object)
    }

    fn dialect(&self) -> SchemaDialect {
        SchemaDialect::OpenApi2
    }

    fn response_schema<'a>(&self, response: &'a Value) -> Option<&'a Value> {
        response.get("schema")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use oasprey_core::{ActualResponse, ErrorCode};
    use serde_json::json;

    fn spec(base_path: Option<&str>) -> OpenApi2Spec {
        let mut doc = json!({
            "swagger": "2.0",
            "info": { "title": "t", "version": "1" },
            "paths": {
                "/test": {
                    "get": {
                        "responses": {
                            "200": { "description": "ok", "schema": { "type": "string" } },
                            "400": { "$ref": "#/responses/BadRequest" }
                        }
                    }
                }
            },
            "responses": {
                "BadRequest": {
                    "description": "bad",
                    "schema": { "$ref": "#/definitions/Problem" }
                }
            },
            "definitions": {
                "Problem": {
                    "type": "object",
                    "required": ["detail"],
                    "properties": { "detail": { "type": "string" } }
                }
            }
        });
        if let Some(base) = base_path {
            doc["basePath"] = json!(base);
        }
        OpenApi2Spec::new(doc)
    }

    fn get(path: &str, status: u16, body: Value) -> ActualResponse {
        ActualResponse::new(status, ActualRequest::new("GET", path), body)
    }

    #[test]
    fn default_base_path() {
        let spec = spec(None);
        assert!(!spec.did_user_define_base_path());
        assert_eq!(spec.base_path(), "/");
        assert!(spec.validate_response(&get("/test", 200, json!("ok"))).is_ok());
    }

    #[test]
    fn declared_base_path_is_stripped() {
        let spec = spec(Some("/api/v1"));
        assert!(spec.did_user_define_base_path());
        assert!(spec.validate_response(&get("/api/v1/test", 200, json!("ok"))).is_ok());
    }

    #[test]
    fn base_path_with_trailing_slash() {
        let spec = spec(Some("/api/"));
        assert!(spec.validate_response(&get("/api/test", 200, json!("ok"))).is_ok());
    }

    #[test]
    fn base_path_not_prefix() {
        let spec = spec(Some("/api/v1"));
        let err = spec.validate_response(&get("/test", 200, json!("ok"))).unwrap_err();
        assert_eq!(err.code, ErrorCode::BasePathNotFound);
        assert!(err.message.contains("'/api/v1'"));
    }

    #[test]
    fn path_not_found_after_base_path() {
        let spec = spec(Some("/api/v1"));
        let err = spec
            .validate_response(&get("/api/v1/other", 200, json!("ok")))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::PathNotFound);
    }

    #[test]
    fn response_ref_and_definitions() {
        let spec = spec(None);
        assert!(
            spec.validate_response(&get("/test", 400, json!({"detail": "x"})))
                .is_ok()
        );
        let err = spec
            .validate_response(&get("/test", 400, json!({"detail": 1})))
            .unwrap_err();
        assert_eq!(err.code, ErrorCode::InvalidBody);
        assert!(err.message.starts_with("response.detail "), "{}", err.message);
    }

    #[test]
    fn schema_objects_are_definitions() {
        let spec = spec(None);
        assert_eq!(spec.schema_names(), vec!["Problem"]);
        assert!(spec.find_response_definition("#/responses/BadRequest").is_some());
        assert!(spec.find_response_definition("#/responses/Nope").is_none());
        assert!(spec.find_response_definition("BadRequest").is_none());
    }
}
