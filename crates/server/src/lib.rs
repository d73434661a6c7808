//! Magic Patterns MCP server.
//!
//! Binds the `create_design` tool contract and request adapter from `magic-patterns-tools`
//! into an rmcp server speaking MCP over stdio.

pub mod config;
pub mod error;
pub mod logging;
pub mod server;
