//! OpenAPI 3.x documents

use oasprey_core::{ActualRequest, ValidationError};
use serde_json::{Map, Value, json};

use super::OpenApiSpec;
use crate::path::{
    DEFAULT_BASE_PATH, find_openapi_path_matching_possible_pathnames, pathname_without_base_path,
};
use crate::schema::{SchemaDialect, SharedDefinitions};
use crate::servers::{Server, ServerMatch, matching_servers};

const RESPONSE_REF_PREFIX: &str = "#/components/responses/";

/// Accessor for an OpenAPI 3.0 or 3.1 document.
#[derive(Debug, Clone)]
pub struct OpenApi3Spec {
    document: Value,
    servers: Vec<Server>,
    did_user_define_servers: bool,
}

impl OpenApi3Spec {
    /// Wrap a document. A missing or empty `servers` list is replaced by a
    /// single server with url `/`, as the OpenAPI 3 defaults require.
    #[must_use]
    pub fn new(mut document: Value) -> Self {
        let did_user_define_servers = document
            .get("servers")
            .and_then(Value::as_array)
            .is_some_and(|servers| !servers.is_empty());
        if !did_user_define_servers {
            if let Some(obj) = document.as_object_mut() {
                obj.insert("servers".to_string(), json!([{ "url": DEFAULT_BASE_PATH }]));
            }
        }

        let servers = document
            .get("servers")
            .and_then(Value::as_array)
            .map(|servers| servers.iter().filter_map(Server::from_value).collect())
            .unwrap_or_default();

        Self {
            document,
            servers,
            did_user_define_servers,
        }
    }

    #[must_use]
    pub fn did_user_define_servers(&self) -> bool {
        self.did_user_define_servers
    }

    #[must_use]
    pub fn servers(&self) -> &[Server] {
        &self.servers
    }

    #[must_use]
    pub fn server_urls(&self) -> Vec<&str> {
        self.servers.iter().map(|s| s.url.as_str()).collect()
    }

    /// Servers whose base path prefixes `pathname`, with the matched concrete URL
    #[must_use]
    pub fn matching_servers(&self, pathname: &str) -> Vec<ServerMatch> {
        matching_servers(&self.servers, pathname)
    }

    #[must_use]
    pub fn matching_server_urls(&self, pathname: &str) -> Vec<String> {
        self.matching_servers(pathname)
            .into_iter()
            .map(|m| m.concrete_url)
            .collect()
    }

    #[must_use]
    pub fn matching_server_base_paths(&self, pathname: &str) -> Vec<String> {
        self.matching_servers(pathname)
            .into_iter()
            .map(|m| m.matching_base_path)
            .collect()
    }
}

/// `application/json`, else the first `+json` type, else the first declared.
fn select_media_type(content: &Map<String, Value>) -> Option<&Value> {
    content
        .get("application/json")
        .or_else(|| {
            content
                .iter()
                .find(|(media_type, _)| media_type.ends_with("+json"))
                .map(|(_, media)| media)
        })
        .or_else(|| content.values().next())
}

impl OpenApiSpec for OpenApi3Spec {
    fn document(&self) -> &Value {
        &self.document
    }

    fn find_openapi_path_matching_request(
        &self,
        request: &ActualRequest,
    ) -> Result<&str, ValidationError> {
        let pathname = request.pathname();
        let base_paths = self.matching_server_base_paths(pathname);
        tracing::debug!(pathname, ?base_paths, "matching server base paths");
        if base_paths.is_empty() {
            return Err(ValidationError::server_not_found(
                &request.method_upper(),
                pathname,
            ));
        }

        let possible_pathnames: Vec<String> = base_paths
            .iter()
            .map(|base_path| pathname_without_base_path(base_path, pathname))
            .collect();
        let paths = self.paths();
        let openapi_path = find_openapi_path_matching_possible_pathnames(&possible_pathnames, &paths)
            .ok_or_else(|| ValidationError::path_not_found(&request.method_upper(), pathname))?;
        tracing::debug!(pathname, openapi_path, "matched path");
        Ok(openapi_path)
    }

    fn find_response_definition(&self, reference: &str) -> Option<&Value> {
        let name = reference.split(RESPONSE_REF_PREFIX).nth(1)?;
        self.document
            .get("components")?
            .get("responses")?
            .get(name)
    }

    fn shared_definitions(&self) -> SharedDefinitions<'_> {
        SharedDefinitions::Components(self.document.get("components"))
    }

    fn schema_objects(&self) -> Option<&Map<String, Value>> {
        self.document
            .get("components")?
            .get("schemas")?
            .as_object()
    }

    fn dialect(&self) -> SchemaDialect {
        let version = self
            .document
            .get("openapi")
            .and_then(Value::as_str)
            .unwrap_or_default();
        if version.starts_with("3.1") {
            SchemaDialect::OpenApi31
        } else {
            SchemaDialect::OpenApi30
        }
    }

    fn response_schema<'a>(&self, response: &'a Value) -> Option<&'a Value> {
        let content = response.get("content")?.as_object()?;
        select_media_type(content)?.get("schema")
    }
}
