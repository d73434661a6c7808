//! Process configuration: CLI flags with environment fallbacks.
//!
//! The API credential is only ever read from the environment. Passing it as a flag would expose
//! it through the process table.

use crate::error::{Result, ServerError};
use crate::logging::LogFormat;
use clap::Parser;
use magic_patterns_tools::runtime::{ApiKey, DEFAULT_ENDPOINT, DesignClientConfig};
use std::time::Duration;

pub const API_KEY_ENV: &str = "MAGIC_PATTERNS_API_KEY";

#[derive(Debug, Clone, Parser)]
#[command(
    name = "magic-patterns-mcp",
    version,
    about = "Magic Patterns design generation as an MCP tool over stdio",
    after_help = "The API key is read from the MAGIC_PATTERNS_API_KEY environment variable."
)]
pub struct Cli {
    /// Design API endpoint.
    #[arg(long, env = "MAGIC_PATTERNS_API_URL", default_value = DEFAULT_ENDPOINT)]
    pub api_url: String,

    /// Per-request timeout in seconds (0 disables it).
    #[arg(long, env = "MAGIC_PATTERNS_TIMEOUT_SECS", default_value_t = 300)]
    pub timeout_secs: u64,

    /// Reject response bodies larger than this many bytes.
    #[arg(long, env = "MAGIC_PATTERNS_MAX_RESPONSE_BYTES")]
    pub max_response_bytes: Option<usize>,

    /// Log filter used when `RUST_LOG` is not set.
    #[arg(long, default_value = "info")]
    pub log_level: String,

    #[arg(long, value_enum, default_value_t = LogFormat::Text)]
    pub log_format: LogFormat,
}

/// Fully resolved configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub client: DesignClientConfig,
    pub api_key: ApiKey,
}

impl ServerConfig {
    /// Resolve from CLI flags and the process environment.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if the API key is missing or blank.
    pub fn from_env(cli: &Cli) -> Result<Self> {
        Self::resolve(cli, |name| std::env::var(name).ok())
    }

    /// Resolve using an explicit environment lookup.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Config`] if the API key is missing or blank.
    pub fn resolve(cli: &Cli, env: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let api_key = env(API_KEY_ENV)
            .map(ApiKey::new)
            .filter(|k| !k.is_blank())
            .ok_or_else(|| {
                ServerError::Config(format!("{API_KEY_ENV} must be set to a non-empty value"))
            })?;

        let timeout = (cli.timeout_secs > 0).then(|| Duration::from_secs(cli.timeout_secs));

        Ok(Self {
            client: DesignClientConfig {
                endpoint: cli.api_url.trim().to_string(),
                timeout,
                max_response_bytes: cli.max_response_bytes,
            },
            api_key,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cli(args: &[&str]) -> Cli {
        let mut argv = vec!["magic-patterns-mcp"];
        argv.extend_from_slice(args);
        Cli::try_parse_from(argv).expect("valid args")
    }

    #[test]
    fn missing_or_blank_key_is_fatal() {
        let cli = cli(&[]);

        let err = ServerConfig::resolve(&cli, |_| None).unwrap_err();
        assert!(err.to_string().contains(API_KEY_ENV));

        let err = ServerConfig::resolve(&cli, |_| Some("   ".to_string())).unwrap_err();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn defaults_point_at_the_public_api() {
        let cfg = ServerConfig::resolve(&cli(&[]), |_| Some("k".to_string())).expect("config");
        assert_eq!(cfg.client.endpoint, DEFAULT_ENDPOINT);
        assert_eq!(cfg.client.timeout, Some(Duration::from_secs(300)));
        assert_eq!(cfg.client.max_response_bytes, None);
        assert_eq!(cfg.api_key.expose(), "k");
    }

    #[test]
    fn flags_override_endpoint_and_limits() {
        let cfg = ServerConfig::resolve(
            &cli(&[
                "--api-url",
                "http://127.0.0.1:9999/api/v2/pattern",
                "--timeout-secs",
                "0",
                "--max-response-bytes",
                "1024",
                "--log-format",
                "json",
            ]),
            |_| Some("k".to_string()),
        )
        .expect("config");
        assert_eq!(cfg.client.endpoint, "http://127.0.0.1:9999/api/v2/pattern");
        assert_eq!(cfg.client.timeout, None);
        assert_eq!(cfg.client.max_response_bytes, Some(1024));
    }

    #[test]
    fn config_debug_output_hides_the_key() {
        let cfg = ServerConfig::resolve(&cli(&[]), |_| Some("super-secret".to_string()))
            .expect("config");
        assert!(!format!("{cfg:?}").contains("super-secret"));
    }
}
