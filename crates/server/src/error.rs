//! Error types for the MCP server process.

use magic_patterns_tools::runtime::ConfigError;
use thiserror::Error;

/// Main error type for the server.
#[derive(Error, Debug)]
pub enum ServerError {
    /// Configuration errors (missing credential, invalid endpoint, bad log filter)
    #[error("Configuration error: {0}")]
    Config(String),

    /// Startup errors (logging setup, MCP handshake)
    #[error("Startup error: {0}")]
    Startup(String),

    /// Runtime errors (transport task crashed)
    #[error("Runtime error: {0}")]
    Runtime(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl From<ConfigError> for ServerError {
    fn from(e: ConfigError) -> Self {
        Self::Config(e.to_string())
    }
}

/// Result type alias for server operations.
pub type Result<T> = std::result::Result<T, ServerError>;
