//! Tool contract and request adapter for the Magic Patterns `create_design` MCP tool.
//!
//! - [`contract`]: tool declaration, parameter/result shapes, JSON Schemas, validators
//! - [`runtime`]: the HTTP adapter that calls the design API
//! - [`safety`]: redaction helpers for logs and error messages
//!
//! It intentionally contains **no** MCP transport or process bootstrap logic.

pub mod contract;
pub mod runtime;
pub mod safety;

pub use contract::{DesignResult, ToolParameters, ValidationError};
pub use runtime::{ApiKey, DesignClient, DesignClientConfig, DesignError, RemoteError};
