//! Server and base path resolution
//!
//! OpenAPI 3 documents declare `servers`, each a URL template with optional
//! variables. A request path belongs to a server when one of the server's
//! concrete base paths is a prefix of it.

use serde_json::Value;

use crate::path::DEFAULT_BASE_PATH;

/// A server variable with its default and allowed values.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerVariable {
    pub name: String,
    pub default: String,
    pub enum_values: Vec<String>,
}

impl ServerVariable {
    /// Default first, then enum members, duplicates removed.
    #[must_use]
    pub fn possible_values(&self) -> Vec<&str> {
        let mut values = vec![self.default.as_str()];
        for value in &self.enum_values {
            if !values.contains(&value.as_str()) {
                values.push(value);
            }
        }
        values
    }
}

/// One entry of a document's `servers` list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Server {
    pub url: String,
    /// Variables in declaration order
    pub variables: Vec<ServerVariable>,
}

impl Server {
    #[must_use]
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            variables: Vec::new(),
        }
    }

    #[must_use]
    pub fn with_variable(mut self, name: &str, default: &str, enum_values: &[&str]) -> Self {
        self.variables.push(ServerVariable {
            name: name.to_string(),
            default: default.to_string(),
            enum_values: enum_values.iter().map(ToString::to_string).collect(),
        });
        self
    }

    /// Read a server object. Entries without a string `url` are skipped by
    /// returning `None`.
    #[must_use]
    pub fn from_value(value: &Value) -> Option<Self> {
        let url = value.get("url")?.as_str()?.to_string();
        let variables = value
            .get("variables")
            .and_then(Value::as_object)
            .map(|vars| {
                vars.iter()
                    .map(|(name, var)| ServerVariable {
                        name: name.clone(),
                        default: var
                            .get("default")
                            .map(value_to_string)
                            .unwrap_or_default(),
                        enum_values: var
                            .get("enum")
                            .and_then(Value::as_array)
                            .map(|values| values.iter().map(value_to_string).collect())
                            .unwrap_or_default(),
                    })
                    .collect()
            })
            .unwrap_or_default();

        Some(Self { url, variables })
    }

    /// Every concrete base path of this server, in expansion order.
    #[must_use]
    pub fn possible_base_paths(&self) -> Vec<String> {
        possible_concrete_base_paths(base_path(&self.url), &self.variables)
    }
}

fn value_to_string(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Path part of a server URL template: from the first `/` after the
/// scheme's `//`, or `/` when there is none.
#[must_use]
pub fn base_path(url: &str) -> &str {
    let masked = url.replacen("//", "  ", 1);
    masked.find('/').map_or(DEFAULT_BASE_PATH, |i| &url[i..])
}

/// Expand variable placeholders in a base path into every combination of
/// their possible values. Only variables that occur in the base path take
/// part; the first declared variable varies slowest.
#[must_use]
pub fn possible_concrete_base_paths(base_path: &str, variables: &[ServerVariable]) -> Vec<String> {
    let mut concrete = vec![base_path.to_string()];
    for variable in variables {
        let placeholder = format!("{{{}}}", variable.name);
        if !base_path.contains(&placeholder) {
            continue;
        }
        let values = variable.possible_values();
        concrete = concrete
            .iter()
            .flat_map(|partial| {
                values
                    .iter()
                    .map(|value| partial.replacen(&placeholder, value, 1))
                    .collect::<Vec<_>>()
            })
            .collect();
    }
    concrete
}

/// A server whose base path matched a request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerMatch {
    /// Server URL with its base path replaced by the matching concrete one
    pub concrete_url: String,
    pub matching_base_path: String,
}

/// For each server, the first concrete base path that prefixes `pathname`.
/// Servers with no such base path are left out.
#[must_use]
pub fn matching_servers(servers: &[Server], pathname: &str) -> Vec<ServerMatch> {
    servers
        .iter()
        .filter_map(|server| {
            let candidates = server.possible_base_paths();
            tracing::trace!(url = %server.url, ?candidates, "server base path candidates");
            let matching_base_path = candidates
                .into_iter()
                .find(|candidate| pathname.starts_with(candidate.as_str()))?;
            let concrete_url = server
                .url
                .replacen(base_path(&server.url), &matching_base_path, 1);
            Some(ServerMatch {
                concrete_url,
                matching_base_path,
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn base_path_of_absolute_url() {
        assert_eq!(base_path("http://api.example.com/v1"), "/v1");
        assert_eq!(base_path("https://api.example.com"), "/");
        assert_eq!(base_path("https://api.example.com/"), "/");
    }

    #[test]
    fn base_path_of_relative_url() {
        assert_eq!(base_path("/api"), "/api");
        assert_eq!(base_path("/"), "/");
        assert_eq!(base_path(""), "/");
        assert_eq!(base_path("localhost"), "/");
    }

    #[test]
    fn base_path_keeps_variable_placeholders() {
        assert_eq!(
            base_path("{scheme}://{host}/{basePath}/v1"),
            "/{basePath}/v1"
        );
    }

    #[test]
    fn variable_values_default_first_without_duplicates() {
        let var = ServerVariable {
            name: "v".to_string(),
            default: "v1".to_string(),
            enum_values: vec!["v2".to_string(), "v1".to_string(), "v3".to_string()],
        };
        assert_eq!(var.possible_values(), vec!["v1", "v2", "v3"]);
    }

    #[test]
    fn cartesian_expansion() {
        let server = Server::new("/{a}/{b}")
            .with_variable("a", "x", &["y"])
            .with_variable("b", "1", &["2"]);
        assert_eq!(
            server.possible_base_paths(),
            vec!["/x/1", "/x/2", "/y/1", "/y/2"]
        );
    }

    #[test]
    fn host_variables_do_not_multiply_base_paths() {
        let server = Server::new("https://{env}.example.com/api").with_variable(
            "env",
            "prod",
            &["staging", "dev"],
        );
        assert_eq!(server.possible_base_paths(), vec!["/api"]);
    }

    #[test]
    fn server_from_value() {
        let value = json!({
            "url": "/{version}",
            "variables": {
                "version": { "default": "v1", "enum": ["v1", "v2"] }
            }
        });
        let server = Server::from_value(&value).unwrap();
        assert_eq!(
            server,
            Server::new("/{version}").with_variable("version", "v1", &["v1", "v2"])
        );
        assert!(Server::from_value(&json!({"description": "no url"})).is_none());
    }

    #[test]
    fn variable_with_default_only() {
        let value = json!({
            "url": "http://localhost/{base}",
            "variables": { "base": { "default": "api" } }
        });
        let server = Server::from_value(&value).unwrap();
        assert_eq!(server.possible_base_paths(), vec!["/api"]);
    }

    #[test]
    fn first_matching_server_variant_is_reported() {
        let servers = vec![
            Server::new("/{v}").with_variable("v", "v1", &["v2"]),
            Server::new("http://other.example.com/nope"),
            Server::new("https://example.com/v2/extra"),
        ];
        let matches = matching_servers(&servers, "/v2/extra/thing");
        assert_eq!(
            matches,
            vec![
                ServerMatch {
                    concrete_url: "/v2".to_string(),
                    matching_base_path: "/v2".to_string(),
                },
                ServerMatch {
                    concrete_url: "https://example.com/v2/extra".to_string(),
                    matching_base_path: "/v2/extra".to_string(),
                },
            ]
        );
    }

    #[test]
    fn root_server_matches_everything() {
        let servers = vec![Server::new("http://localhost:3000")];
        let matches = matching_servers(&servers, "/anything");
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].matching_base_path, "/");
        assert_eq!(matches[0].concrete_url, "http://localhost:3000");
    }

    #[test]
    fn no_matching_server() {
        let servers = vec![Server::new("/api")];
        assert!(matching_servers(&servers, "/other").is_empty());
    }
}
