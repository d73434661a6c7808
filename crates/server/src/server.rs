//! rmcp server exposing the `create_design` tool.

use crate::error::{Result, ServerError};
use magic_patterns_tools::contract::{self, TOOL_NAME};
use magic_patterns_tools::runtime::{DesignClient, DesignError};
use rmcp::handler::server::ServerHandler;
use rmcp::model::{
    CallToolRequestParam, CallToolResult, Content, Implementation, JsonObject, ListToolsResult,
    PaginatedRequestParam, ServerCapabilities, ServerInfo, Tool,
};
use rmcp::service::RequestContext;
use rmcp::{ErrorData as McpError, RoleServer, ServiceExt as _};
use serde_json::{Value, json};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

pub const SERVER_NAME: &str = "magic-patterns-mcp";

const INSTRUCTIONS: &str = "Generates UI designs with Magic Patterns. Call create_design with a \
detailed prompt; the result contains the generated source files, hosted build outputs, an editor \
URL and a preview URL.";

#[derive(Clone)]
pub struct DesignServer {
    client: DesignClient,
    tool: Tool,
}

impl DesignServer {
    #[must_use]
    pub fn new(client: DesignClient) -> Self {
        Self {
            client,
            tool: contract::tool(),
        }
    }

    /// Run one `create_design` invocation.
    ///
    /// Argument validation failures are rejected as `invalid_params`; upstream failures are
    /// reported as an error tool result so the calling agent can see what went wrong.
    ///
    /// # Errors
    ///
    /// Returns an MCP error for invalid arguments or if the result cannot be serialized.
    pub async fn create_design(
        &self,
        arguments: Option<JsonObject>,
        cancel: &CancellationToken,
    ) -> std::result::Result<CallToolResult, McpError> {
        let arguments = Value::Object(arguments.unwrap_or_default());

        match self.client.call(&arguments, cancel).await {
            Ok(design) => {
                let structured = serde_json::to_value(&design).map_err(|e| {
                    McpError::internal_error(format!("serialize design result: {e}"), None)
                })?;
                // Also carries the JSON as a text block: some MCP clients only render `content`.
                Ok(CallToolResult::structured(structured))
            }
            Err(DesignError::Validation(e)) => Err(McpError::invalid_params(
                e.to_string(),
                Some(json!({ "path": e.path })),
            )),
            Err(e) => {
                warn!(tool = TOOL_NAME, error = %e, "tool call failed");
                Ok(CallToolResult::error(vec![Content::text(e.to_string())]))
            }
        }
    }
}

impl ServerHandler for DesignServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: SERVER_NAME.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Implementation::from_build_env()
            },
            instructions: Some(INSTRUCTIONS.to_string()),
            ..ServerInfo::default()
        }
    }

    async fn list_tools(
        &self,
        _request: Option<PaginatedRequestParam>,
        _context: RequestContext<RoleServer>,
    ) -> std::result::Result<ListToolsResult, McpError> {
        Ok(ListToolsResult::with_all_items(vec![self.tool.clone()]))
    }

    async fn call_tool(
        &self,
        request: CallToolRequestParam,
        context: RequestContext<RoleServer>,
    ) -> std::result::Result<CallToolResult, McpError> {
        if request.name != TOOL_NAME {
            return Err(McpError::invalid_params(
                format!("unknown tool: {}", request.name),
                None,
            ));
        }
        self.create_design(request.arguments, &context.ct).await
    }
}

/// Serve MCP over stdin/stdout until the client disconnects.
///
/// # Errors
///
/// Returns an error if the MCP handshake fails or the service task dies.
pub async fn serve_stdio(server: DesignServer) -> Result<()> {
    let service = server
        .serve(rmcp::transport::stdio())
        .await
        .map_err(|e| ServerError::Startup(format!("MCP initialization failed: {e}")))?;

    let reason = service
        .waiting()
        .await
        .map_err(|e| ServerError::Runtime(format!("MCP service task failed: {e}")))?;
    info!(?reason, "MCP session closed");
    Ok(())
}
