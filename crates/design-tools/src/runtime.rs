//! Request adapter for the `create_design` tool.
//!
//! Turns validated [`ToolParameters`] into one authenticated multipart POST against the design
//! API and turns the reply into a schema-validated [`DesignResult`].
//!
//! The network is reached through the [`DesignTransport`] trait; [`ReqwestTransport`] is the
//! production implementation and tests plug in their own.

use crate::contract::{
    self, DEFAULT_PRESET_ID, DesignMode, DesignResult, ToolParameters, ValidationError,
};
use crate::safety::{redact_url, sanitize_reqwest_error, scrub_secret, truncate_body};
use async_trait::async_trait;
use reqwest::Client;
use reqwest::header::HeaderValue;
use serde_json::Value;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use url::Url;
use zeroize::Zeroizing;

pub const DEFAULT_ENDPOINT: &str = "https://api.magicpatterns.com/api/v2/pattern";
pub const API_KEY_HEADER: &str = "x-mp-api-key";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Image attachments are not supported; the API always receives an empty list.
pub const NO_IMAGES: &str = "[]";

const ERROR_BODY_LIMIT: usize = 2048;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("design API unreachable: {0}")]
    Transport(String),
    #[error("design API returned {status}: {body}")]
    Status { status: u16, body: String },
    #[error("design request cancelled")]
    Cancelled,
}

#[derive(Debug, Error)]
pub enum DesignError {
    /// Tool arguments rejected before any request was made.
    #[error("invalid arguments: {0}")]
    Validation(#[from] ValidationError),
    #[error(transparent)]
    Remote(#[from] RemoteError),
    /// The API answered 2xx but the body does not match the declared result shape.
    #[error("design API response violates the result contract: {detail}")]
    Protocol { detail: String },
}

pub type Result<T> = std::result::Result<T, DesignError>;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("API key must not be empty")]
    EmptyApiKey,
    #[error("invalid design API endpoint '{endpoint}': {reason}")]
    Endpoint { endpoint: String, reason: String },
    #[error("failed to build HTTP client: {0}")]
    Client(String),
}

/// The design API credential.
///
/// Never printed: `Debug` and `Display` show a placeholder and the buffer is wiped on drop.
#[derive(Clone)]
pub struct ApiKey(Zeroizing<String>);

impl ApiKey {
    #[must_use]
    pub fn new(value: impl Into<String>) -> Self {
        Self(Zeroizing::new(value.into()))
    }

    /// The raw credential. Only used to set the auth header.
    #[must_use]
    pub fn expose(&self) -> &str {
        self.0.as_str()
    }

    #[must_use]
    pub fn is_blank(&self) -> bool {
        self.0.trim().is_empty()
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey([redacted])")
    }
}

impl fmt::Display for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(crate::safety::REDACTED)
    }
}

#[derive(Debug, Clone)]
pub struct DesignClientConfig {
    pub endpoint: String,
    /// `None` disables the per-request timeout.
    pub timeout: Option<Duration>,
    /// `None` = unlimited.
    pub max_response_bytes: Option<usize>,
}

impl Default for DesignClientConfig {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            timeout: Some(DEFAULT_TIMEOUT),
            max_response_bytes: None,
        }
    }
}

/// Form fields of one pattern request, with defaults resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternForm {
    pub prompt: String,
    pub mode: DesignMode,
    pub preset_id: String,
    pub images: &'static str,
}

impl PatternForm {
    /// Apply the declared defaults: `mode` → `best`, `presetId` → `html-tailwind`.
    ///
    /// An empty `presetId` counts as absent.
    #[must_use]
    pub fn resolve(params: &ToolParameters) -> Self {
        let preset_id = params
            .preset_id
            .as_deref()
            .filter(|p| !p.is_empty())
            .unwrap_or(DEFAULT_PRESET_ID)
            .to_string();

        Self {
            prompt: params.prompt.clone(),
            mode: params.mode.unwrap_or_default(),
            preset_id,
            images: NO_IMAGES,
        }
    }

    /// Wire field names and values, in submission order.
    #[must_use]
    pub fn fields(&self) -> [(&'static str, String); 4] {
        [
            ("prompt", self.prompt.clone()),
            ("mode", self.mode.as_str().to_string()),
            ("presetId", self.preset_id.clone()),
            ("images", self.images.to_string()),
        ]
    }
}

pub struct PatternRequest<'a> {
    pub endpoint: &'a Url,
    pub api_key: &'a ApiKey,
    pub form: &'a PatternForm,
}

#[derive(Debug, Clone)]
pub struct TransportResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

#[derive(Debug, Error)]
pub enum TransportError {
    #[error("request timed out")]
    Timeout,
    #[error("connection failed: {0}")]
    Connect(String),
    #[error("{0}")]
    Other(String),
}

/// Sends one pattern request and returns the raw reply.
#[async_trait]
pub trait DesignTransport: Send + Sync {
    async fn submit(
        &self,
        request: PatternRequest<'_>,
    ) -> std::result::Result<TransportResponse, TransportError>;
}

pub struct ReqwestTransport {
    client: Client,
    timeout: Option<Duration>,
    max_response_bytes: Option<usize>,
}

impl ReqwestTransport {
    /// # Errors
    ///
    /// Returns an error if the underlying HTTP client cannot be built.
    pub fn new(
        timeout: Option<Duration>,
        max_response_bytes: Option<usize>,
    ) -> std::result::Result<Self, ConfigError> {
        let client = Client::builder()
            .user_agent(concat!("magic-patterns-mcp/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::Client(sanitize_reqwest_error(&e)))?;
        Ok(Self {
            client,
            timeout: timeout.filter(|t| !t.is_zero()),
            max_response_bytes,
        })
    }
}

#[async_trait]
impl DesignTransport for ReqwestTransport {
    async fn submit(
        &self,
        request: PatternRequest<'_>,
    ) -> std::result::Result<TransportResponse, TransportError> {
        let mut key = HeaderValue::from_str(request.api_key.expose())
            .map_err(|_| TransportError::Other("API key is not a valid header value".into()))?;
        key.set_sensitive(true);

        let form = request
            .form
            .fields()
            .into_iter()
            .fold(reqwest::multipart::Form::new(), |form, (name, value)| {
                form.text(name, value)
            });

        let mut builder = self
            .client
            .post(request.endpoint.clone())
            .header(API_KEY_HEADER, key)
            .multipart(form);
        if let Some(t) = self.timeout {
            builder = builder.timeout(t);
        }

        let response = builder.send().await.map_err(map_reqwest_error)?;
        let status = response.status().as_u16();
        let body = read_response_body_limited_bytes(response, self.max_response_bytes).await?;
        Ok(TransportResponse { status, body })
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_timeout() {
        TransportError::Timeout
    } else if e.is_connect() {
        TransportError::Connect(sanitize_reqwest_error(&e))
    } else {
        TransportError::Other(sanitize_reqwest_error(&e))
    }
}

async fn read_response_body_limited_bytes(
    mut response: reqwest::Response,
    max_bytes: Option<usize>,
) -> std::result::Result<Vec<u8>, TransportError> {
    let Some(max) = max_bytes else {
        let bytes = response.bytes().await.map_err(map_reqwest_error)?;
        return Ok(bytes.to_vec());
    };

    if let Some(len) = response.content_length()
        && len > max as u64
    {
        return Err(TransportError::Other(format!(
            "response too large: {len} bytes (limit {max})"
        )));
    }

    let mut out: Vec<u8> = Vec::new();
    while let Some(chunk) = response.chunk().await.map_err(map_reqwest_error)? {
        if out.len().saturating_add(chunk.len()) > max {
            return Err(TransportError::Other(format!(
                "response too large: exceeded {max} bytes"
            )));
        }
        out.extend_from_slice(&chunk);
    }

    Ok(out)
}

/// Client for the design API.
///
/// Immutable after construction and cheap to clone; concurrent calls share nothing mutable.
#[derive(Clone)]
pub struct DesignClient {
    inner: Arc<DesignClientInner>,
}

struct DesignClientInner {
    endpoint: Url,
    api_key: ApiKey,
    transport: Arc<dyn DesignTransport>,
}

impl fmt::Debug for DesignClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DesignClient")
            .field("endpoint", &redact_url(&self.inner.endpoint))
            .field("api_key", &self.inner.api_key)
            .finish_non_exhaustive()
    }
}

impl DesignClient {
    /// Build a client that talks to the API over `reqwest`.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank, the endpoint is not an absolute `http(s)` URL, or
    /// the HTTP client cannot be built.
    pub fn new(
        config: &DesignClientConfig,
        api_key: ApiKey,
    ) -> std::result::Result<Self, ConfigError> {
        let transport = ReqwestTransport::new(config.timeout, config.max_response_bytes)?;
        Self::with_transport(&config.endpoint, api_key, Arc::new(transport))
    }

    /// Build a client on top of a custom transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the key is blank or the endpoint is not an absolute `http(s)` URL.
    pub fn with_transport(
        endpoint: &str,
        api_key: ApiKey,
        transport: Arc<dyn DesignTransport>,
    ) -> std::result::Result<Self, ConfigError> {
        if api_key.is_blank() {
            return Err(ConfigError::EmptyApiKey);
        }

        let endpoint_err = |reason: String| ConfigError::Endpoint {
            endpoint: endpoint.to_string(),
            reason,
        };
        let url = Url::parse(endpoint).map_err(|e| endpoint_err(e.to_string()))?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(endpoint_err(format!(
                "unsupported URL scheme '{}'",
                url.scheme()
            )));
        }

        Ok(Self {
            inner: Arc::new(DesignClientInner {
                endpoint: url,
                api_key,
                transport,
            }),
        })
    }

    #[must_use]
    pub fn endpoint(&self) -> &Url {
        &self.inner.endpoint
    }

    /// Validate raw tool arguments, then create a design.
    ///
    /// Invalid arguments fail with [`DesignError::Validation`] and no request is sent.
    ///
    /// # Errors
    ///
    /// See [`DesignClient::create_design_with_cancel`].
    pub async fn call(&self, arguments: &Value, cancel: &CancellationToken) -> Result<DesignResult> {
        let params = contract::validate_parameters(arguments)?;
        self.create_design_with_cancel(&params, cancel).await
    }

    /// Like [`DesignClient::create_design`], but aborts the in-flight request as soon as
    /// `cancel` fires.
    ///
    /// # Errors
    ///
    /// Returns [`RemoteError::Cancelled`] on cancellation, otherwise the same errors as
    /// [`DesignClient::create_design`].
    pub async fn create_design_with_cancel(
        &self,
        params: &ToolParameters,
        cancel: &CancellationToken,
    ) -> Result<DesignResult> {
        tokio::select! {
            biased;
            () = cancel.cancelled() => {
                warn!("design request cancelled");
                Err(RemoteError::Cancelled.into())
            }
            result = self.create_design(params) => result,
        }
    }

    /// Send one pattern request and validate the reply.
    ///
    /// `params` must already have passed [`contract::validate_parameters`]; only the declared
    /// defaults are applied here. Exactly one request is sent, never retried.
    ///
    /// # Errors
    ///
    /// - [`RemoteError::Transport`] if the API cannot be reached
    /// - [`RemoteError::Status`] on a non-2xx reply (the body is not parsed)
    /// - [`DesignError::Protocol`] if a 2xx body is not JSON or does not match the result shape
    pub async fn create_design(&self, params: &ToolParameters) -> Result<DesignResult> {
        let inner = &self.inner;
        let form = PatternForm::resolve(params);

        debug!(
            endpoint = %redact_url(&inner.endpoint),
            prompt_len = form.prompt.len(),
            mode = %form.mode,
            preset_id = %form.preset_id,
            "submitting design request"
        );

        let response = inner
            .transport
            .submit(PatternRequest {
                endpoint: &inner.endpoint,
                api_key: &inner.api_key,
                form: &form,
            })
            .await
            .map_err(|e| {
                let detail = self.scrub(&e.to_string());
                warn!(error = %detail, "design API unreachable");
                RemoteError::Transport(detail)
            })?;

        let result = self.decode(&response);
        match &result {
            Ok(design) => info!(
                design_id = %design.id,
                source_files = design.source_files.len(),
                compiled_files = design.compiled_files.len(),
                "design created"
            ),
            Err(e) => warn!(status = response.status, error = %e, "design request failed"),
        }
        result
    }

    fn decode(&self, response: &TransportResponse) -> Result<DesignResult> {
        if !(200..300).contains(&response.status) {
            let body = self.scrub(&truncate_body(&response.body, ERROR_BODY_LIMIT));
            return Err(RemoteError::Status {
                status: response.status,
                body,
            }
            .into());
        }

        let raw: Value =
            serde_json::from_slice(&response.body).map_err(|e| DesignError::Protocol {
                detail: format!("response body is not valid JSON: {e}"),
            })?;

        contract::validate_result(&raw).map_err(|e| DesignError::Protocol {
            detail: self.scrub(&e.to_string()),
        })
    }

    fn scrub(&self, message: &str) -> String {
        scrub_secret(message, self.inner.api_key.expose())
    }
}
