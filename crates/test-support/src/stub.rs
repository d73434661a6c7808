//! In-process stand-in for the design API.

use anyhow::Context as _;
use axum::Router;
use axum::extract::{Multipart, State};
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse as _, Response};
use axum::routing::post;
use parking_lot::Mutex;
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;

pub const PATTERN_PATH: &str = "/api/v2/pattern";

/// How the stub answers each request.
#[derive(Debug, Clone)]
pub enum StubBehavior {
    /// Valid design whose id is `design-<n>` (n = request index) and whose first chat message
    /// echoes the submitted prompt.
    Echo,
    /// Same as `Echo`, after sleeping.
    Delayed(Duration),
    /// Fixed status and raw body.
    Fixed { status: u16, body: String },
}

/// One request as seen by the stub.
#[derive(Debug, Clone, Default)]
pub struct CapturedRequest {
    pub api_key: Option<String>,
    pub content_type: Option<String>,
    pub query: Option<String>,
    pub fields: Vec<(String, String)>,
}

impl CapturedRequest {
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v.as_str())
    }
}

struct StubState {
    behavior: StubBehavior,
    requests: Mutex<Vec<CapturedRequest>>,
}

pub struct StubDesignApi {
    addr: SocketAddr,
    state: Arc<StubState>,
    shutdown: Option<oneshot::Sender<()>>,
    handle: JoinHandle<()>,
}

impl StubDesignApi {
    /// Bind an ephemeral localhost port and start serving.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn start(behavior: StubBehavior) -> anyhow::Result<Self> {
        let state = Arc::new(StubState {
            behavior,
            requests: Mutex::new(Vec::new()),
        });

        let app = Router::new()
            .route(PATTERN_PATH, post(create_pattern))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .context("bind stub listener")?;
        let addr = listener.local_addr().context("stub local_addr")?;

        let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();
        let server = axum::serve(listener, app).with_graceful_shutdown(async move {
            let _ = shutdown_rx.await;
        });
        let handle = tokio::spawn(async move {
            let _ = server.await;
        });

        Ok(Self {
            addr,
            state,
            shutdown: Some(shutdown_tx),
            handle,
        })
    }

    /// Full URL of the pattern endpoint.
    #[must_use]
    pub fn endpoint(&self) -> String {
        format!("http://{}{PATTERN_PATH}", self.addr)
    }

    #[must_use]
    pub fn requests(&self) -> Vec<CapturedRequest> {
        self.state.requests.lock().clone()
    }
}

impl Drop for StubDesignApi {
    fn drop(&mut self) {
        if let Some(tx) = self.shutdown.take() {
            let _ = tx.send(());
        }
        self.handle.abort();
    }
}

async fn create_pattern(
    State(state): State<Arc<StubState>>,
    uri: axum::http::Uri,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Response {
    let header = |name: &str| {
        headers
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };

    let mut captured = CapturedRequest {
        api_key: header("x-mp-api-key"),
        content_type: header("content-type"),
        query: uri.query().map(str::to_string),
        fields: Vec::new(),
    };

    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                let name = field.name().unwrap_or_default().to_string();
                match field.text().await {
                    Ok(text) => captured.fields.push((name, text)),
                    Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
                }
            }
            Ok(None) => break,
            Err(e) => return (StatusCode::BAD_REQUEST, e.to_string()).into_response(),
        }
    }

    let prompt = captured.field("prompt").unwrap_or_default().to_string();
    let index = {
        let mut requests = state.requests.lock();
        requests.push(captured);
        requests.len() - 1
    };

    match &state.behavior {
        StubBehavior::Echo => echo(index, &prompt),
        StubBehavior::Delayed(delay) => {
            tokio::time::sleep(*delay).await;
            echo(index, &prompt)
        }
        StubBehavior::Fixed { status, body } => {
            let status = StatusCode::from_u16(*status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
            (
                status,
                [(axum::http::header::CONTENT_TYPE, "application/json")],
                body.clone(),
            )
                .into_response()
        }
    }
}

fn echo(index: usize, prompt: &str) -> Response {
    let body = crate::fixtures::design_result_for(&format!("design-{index}"), prompt);
    axum::Json(body).into_response()
}
