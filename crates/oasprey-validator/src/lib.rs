//! oasprey-validator: OpenAPI 2/3 response resolution and validation
//!
//! Loads a document, resolves a received response to the response it
//! declares (server or base path, path template, method, status) and
//! validates the body against that response's schema.

pub mod loader;
pub mod matchers;
pub mod path;
pub mod schema;
pub mod servers;
pub mod spec;

pub use loader::{LoadError, SpecSource, load_spec, make_api_spec};
pub use matchers::{
    MatcherError, MatcherResult, check_response, satisfy_api_spec, satisfy_schema_in_api_spec,
};
pub use spec::{ApiSpec, ExpectedResponse, OpenApi2Spec, OpenApi3Spec, OpenApiSpec, Operation};
