//! Loading OpenAPI documents from files or in-memory values

use std::path::{Path, PathBuf};

use oasprey_core::json_type_name;
use serde_json::Value;

use crate::spec::{ApiSpec, OpenApiSpec};

/// Where a document comes from.
#[derive(Debug, Clone)]
pub enum SpecSource {
    /// Absolute path to a YAML or JSON file
    Path(PathBuf),
    /// Already parsed document
    Object(Value),
}

impl From<PathBuf> for SpecSource {
    fn from(path: PathBuf) -> Self {
        Self::Path(path)
    }
}

impl From<&Path> for SpecSource {
    fn from(path: &Path) -> Self {
        Self::Path(path.to_path_buf())
    }
}

impl From<&str> for SpecSource {
    fn from(path: &str) -> Self {
        Self::Path(PathBuf::from(path))
    }
}

impl From<Value> for SpecSource {
    fn from(document: Value) -> Self {
        Self::Object(document)
    }
}

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error(
        "The provided argument must be either an absolute filepath or an object representing an OpenAPI specification.\nError details: {0}"
    )]
    InvalidArgument(String),
    #[error("Invalid OpenAPI spec: {0}")]
    InvalidSpec(String),
}

/// Load and check a document.
///
/// # Errors
///
/// [`LoadError::InvalidArgument`] for relative or unreadable paths,
/// unparseable files and non-object values; [`LoadError::InvalidSpec`]
/// when the document fails the structural check.
pub fn load_spec(source: impl Into<SpecSource>) -> Result<ApiSpec, LoadError> {
    let document = match source.into() {
        SpecSource::Path(path) => read_document(&path)?,
        SpecSource::Object(document) => {
            if !document.is_object() {
                return Err(LoadError::InvalidArgument(format!(
                    "Received type '{}'",
                    json_type_name(&document)
                )));
            }
            document
        }
    };
    make_api_spec(document)
}

fn read_document(path: &Path) -> Result<Value, LoadError> {
    if !path.is_absolute() {
        return Err(LoadError::InvalidArgument(format!(
            "'{}' is not an absolute filepath",
            path.display()
        )));
    }
    let content = std::fs::read_to_string(path).map_err(|e| {
        LoadError::InvalidArgument(format!("Unable to read '{}': {e}", path.display()))
    })?;
    if content.trim().is_empty() {
        return Err(LoadError::InvalidSpec("document is empty".to_string()));
    }
    let document = parse_document(path, &content)
        .map_err(|e| LoadError::InvalidArgument(format!("Invalid YAML or JSON:\n{e}")))?;
    tracing::debug!(path = %path.display(), "loaded API spec file");
    Ok(document)
}

/// Parse YAML or JSON.
///
/// Detection strategy: try extension first (`.yaml`/`.yml`/`.json`), then fall
/// back to content sniffing (leading `{` → JSON, otherwise YAML).
///
/// # Errors
///
/// Returns the parser's message.
pub fn parse_document(path: &Path, content: &str) -> Result<Value, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .unwrap_or("")
        .to_ascii_lowercase();

    match ext.as_str() {
        "yaml" | "yml" => serde_yml::from_str(content).map_err(|e| e.to_string()),
        "json" => serde_json::from_str(content).map_err(|e| e.to_string()),
        _ => {
            if content.trim_start().starts_with('{') {
                serde_json::from_str(content).map_err(|e| e.to_string())
            } else {
                serde_yml::from_str(content).map_err(|e| e.to_string())
            }
        }
    }
}

/// Build the version-specific accessor after a structural check.
///
/// # Errors
///
/// [`LoadError::InvalidSpec`] listing every structural problem.
pub fn make_api_spec(document: Value) -> Result<ApiSpec, LoadError> {
    let problems = structural_problems(&document);
    if !problems.is_empty() {
        return Err(LoadError::InvalidSpec(format!("{problems:?}")));
    }
    let spec = ApiSpec::from_document(document);
    tracing::debug!(version = spec.version(), paths = spec.paths().len(), "API spec ready");
    Ok(spec)
}

/// Minimal shape every OpenAPI 2/3 document must have.
fn structural_problems(document: &Value) -> Vec<String> {
    let Some(obj) = document.as_object() else {
        return vec![format!(
            "document must be an object, found {}",
            json_type_name(document)
        )];
    };
    let mut problems = Vec::new();

    let swagger = obj.get("swagger").and_then(Value::as_str);
    let openapi = obj.get("openapi").and_then(Value::as_str);
    let paths_required = match (swagger, openapi) {
        (Some("2.0"), _) => true,
        (None, Some(version)) if version.starts_with("3.") => !version.starts_with("3.1"),
        _ => {
            problems.push(
                "document must declare swagger: 2.0 or openapi: 3.x.y as a string".to_string(),
            );
            true
        }
    };

    match obj.get("info").and_then(Value::as_object) {
        None => problems.push("info must be an object".to_string()),
        Some(info) => {
            for field in ["title", "version"] {
                if !info.get(field).is_some_and(Value::is_string) {
                    problems.push(format!("info.{field} must be a string"));
                }
            }
        }
    }

    match obj.get("paths") {
        Some(Value::Object(_)) => {}
        None if !paths_required => {}
        None => problems.push("paths is required".to_string()),
        Some(_) => problems.push("paths must be an object".to_string()),
    }

    problems
}
