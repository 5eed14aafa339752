//! oasprey-core: Core types for OpenAPI contract checks
//!
//! This crate provides the failure taxonomy raised while matching an actual
//! HTTP interaction to its API spec, the normalized request/response types,
//! project configuration, and the verdict over a batch of checks.

pub mod config;
pub mod error;
pub mod response;
pub mod verdict;

pub use config::{Config, ConfigError};
pub use error::{ErrorCode, ValidationError};
pub use response::{ActualRequest, ActualResponse, ResponseError, json_type_name, normalize};
pub use verdict::{Finding, Verdict, VerdictPolicy, VerdictStatus};
