//! Schema validation adapter
//!
//! Validates a JSON value against a schema taken from an OpenAPI document.
//! The schema is embedded under a `response` property of a wrapper schema
//! that also carries the document's shared definitions, so internal `$ref`s
//! such as `#/definitions/Pet` or `#/components/schemas/Pet` resolve
//! against the wrapper root.

use serde::Serialize;
use serde_json::{Map, Value, json};

/// Property under which the validated value is nested.
const WRAPPER_PROPERTY: &str = "response";

/// Which flavour of JSON Schema a document uses.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SchemaDialect {
    /// Swagger 2.0: draft-04 plus `x-nullable` and `type: file`
    OpenApi2,
    /// OpenAPI 3.0: draft-04 subset plus `nullable`
    OpenApi30,
    /// OpenAPI 3.1: JSON Schema 2020-12
    OpenApi31,
}

impl SchemaDialect {
    fn draft(self) -> jsonschema::Draft {
        match self {
            Self::OpenApi2 | Self::OpenApi30 => jsonschema::Draft::Draft4,
            Self::OpenApi31 => jsonschema::Draft::Draft202012,
        }
    }
}

/// Document-level definitions that `$ref`s inside a schema point into.
#[derive(Debug, Clone, Copy)]
pub enum SharedDefinitions<'a> {
    /// v2 `definitions`
    Definitions(Option<&'a Value>),
    /// v3 `components`
    Components(Option<&'a Value>),
}

/// What is being validated; decides the root label in error paths.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Subject {
    Response,
    Object,
}

impl Subject {
    const fn label(self) -> &'static str {
        match self {
            Self::Response => "response",
            Self::Object => "object",
        }
    }
}

/// One schema violation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorDetail {
    /// Dotted location, rooted at `response` (e.g. `response.items[0].id`)
    pub path: String,
    pub message: String,
}

/// Validate `value` against `schema`.
///
/// # Errors
///
/// Returns every violation found. A schema that fails to compile is reported
/// as a single violation at the root.
pub fn validate(
    schema: &Value,
    shared: SharedDefinitions<'_>,
    dialect: SchemaDialect,
    value: &Value,
) -> Result<(), Vec<ErrorDetail>> {
    let mut root = Map::new();
    root.insert("type".to_string(), json!("object"));
    root.insert(
        "properties".to_string(),
        json!({ WRAPPER_PROPERTY: schema.clone() }),
    );
    root.insert("required".to_string(), json!([WRAPPER_PROPERTY]));
    match shared {
        SharedDefinitions::Definitions(Some(definitions)) => {
            root.insert("definitions".to_string(), definitions.clone());
        }
        SharedDefinitions::Components(Some(components)) => {
            root.insert("components".to_string(), components.clone());
        }
        SharedDefinitions::Definitions(None) | SharedDefinitions::Components(None) => {}
    }

    let mut root = Value::Object(root);
    if dialect != SchemaDialect::OpenApi31 {
        rewrite_openapi_keywords(&mut root, dialect);
    }

    let validator = jsonschema::options()
        .with_draft(dialect.draft())
        .build(&root)
        .map_err(|e| {
            tracing::debug!(error = %e, "response schema failed to compile");
            vec![ErrorDetail {
                path: WRAPPER_PROPERTY.to_string(),
                message: format!("has a schema that cannot be compiled: {e}"),
            }]
        })?;

    let instance = json!({ WRAPPER_PROPERTY: value });
    let errors: Vec<ErrorDetail> = validator
        .iter_errors(&instance)
        .map(|e| ErrorDetail {
            path: dotted_path(&e.instance_path().to_string()),
            message: e.to_string(),
        })
        .collect();

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

/// Keywords whose values are instance data, never schemas.
const LITERAL_KEYWORDS: &[&str] = &["enum", "const", "default", "example", "examples"];

/// Keywords whose values map arbitrary names to schemas.
const SCHEMA_MAP_KEYWORDS: &[&str] = &[
    "properties",
    "patternProperties",
    "definitions",
    "schemas",
];

/// Turn the draft-04 incompatible OpenAPI keywords into plain JSON Schema.
///
/// `nullable: true` (3.0) and `x-nullable: true` (2.0) add `"null"` to the
/// type and enum. A nullable schema without `type` is wrapped in
/// `anyOf [schema, {type: null}]` since draft-04 ignores `$ref` siblings.
/// Swagger's `type: file` is dropped.
pub fn rewrite_openapi_keywords(schema: &mut Value, dialect: SchemaDialect) {
    match schema {
        Value::Object(obj) => {
            for (keyword, child) in obj.iter_mut() {
                match keyword.as_str() {
                    k if LITERAL_KEYWORDS.contains(&k) => {}
                    k if SCHEMA_MAP_KEYWORDS.contains(&k) => {
                        if let Value::Object(schemas) = child {
                            for nested in schemas.values_mut() {
                                rewrite_openapi_keywords(nested, dialect);
                            }
                        }
                    }
                    _ => rewrite_openapi_keywords(child, dialect),
                }
            }

            if dialect == SchemaDialect::OpenApi2
                && obj.get("type").and_then(Value::as_str) == Some("file")
            {
                obj.remove("type");
            }

            let nullable_key = match dialect {
                SchemaDialect::OpenApi2 => "x-nullable",
                SchemaDialect::OpenApi30 | SchemaDialect::OpenApi31 => "nullable",
            };
            if obj.get(nullable_key) != Some(&Value::Bool(true)) {
                return;
            }
            obj.remove(nullable_key);

            if let Some(values) = obj.get_mut("enum").and_then(Value::as_array_mut) {
                if !values.contains(&Value::Null) {
                    values.push(Value::Null);
                }
            }

            match obj.get_mut("type") {
                Some(Value::String(t)) => {
                    let t = std::mem::take(t);
                    obj.insert("type".to_string(), json!([t, "null"]));
                }
                Some(Value::Array(types)) => {
                    if !types.iter().any(|t| t == "null") {
                        types.push(json!("null"));
                    }
                }
                _ => {
                    let inner = std::mem::take(obj);
                    obj.insert(
                        "anyOf".to_string(),
                        json!([Value::Object(inner), { "type": "null" }]),
                    );
                }
            }
        }
        Value::Array(items) => {
            for item in items {
                rewrite_openapi_keywords(item, dialect);
            }
        }
        _ => {}
    }
}

/// `/response/items/0/id` -> `response.items[0].id`
fn dotted_path(pointer: &str) -> String {
    let mut out = String::new();
    for segment in pointer.split('/').filter(|s| !s.is_empty()) {
        if segment.parse::<usize>().is_ok() {
            out.push('[');
            out.push_str(segment);
            out.push(']');
        } else {
            if !out.is_empty() {
                out.push('.');
            }
            out.push_str(&segment.replace("~1", "/").replace("~0", "~"));
        }
    }
    if out.is_empty() {
        WRAPPER_PROPERTY.to_string()
    } else {
        out
    }
}

/// Render violations as one line: `<path> <message>, <path> <message>`.
/// For [`Subject::Object`] the `response` root is renamed to `object`.
#[must_use]
pub fn join_errors(errors: &[ErrorDetail], subject: Subject) -> String {
    errors
        .iter()
        .map(|e| {
            let path = match e.path.strip_prefix(WRAPPER_PROPERTY) {
                Some(rest) => format!("{}{rest}", subject.label()),
                None => e.path.clone(),
            };
            format!("{path} {}", e.message)
        })
        .collect::<Vec<_>>()
        .join(", ")
}
