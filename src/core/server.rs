/// MCP Server Implementation
///
/// This module contains the MCP protocol layer:
/// - JSON-RPC 2.0 request/response structures
/// - Method routing shared by both transports
/// - STDIO server implementation for line-based communication
/// - HTTP server setup with Actix Web
///
/// Tool execution itself lives in the registry; this layer only extracts the
/// tool name and arguments and wraps the returned envelope.

use actix_web::{
    middleware::{Compress, DefaultHeaders, Logger},
    web, App, HttpResponse, HttpServer,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};

use crate::core::registry::{Api, RegistryError, ToolRegistry};
use crate::tools;

/// MCP protocol revision announced during `initialize`.
pub const PROTOCOL_VERSION: &str = "2024-11-05";

const PARSE_ERROR: i32 = -32700;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

/// Server state shared by every request, in either transport.
#[derive(Clone)]
pub struct AppState {
    /// Server name as reported in MCP initialize responses
    pub server_name: String,
    /// Server version string as reported in MCP initialize responses
    pub server_version: String,
    pub registry: Arc<ToolRegistry>,
}

/// JSON-RPC 2.0 request structure for MCP protocol.
///
/// `id` is None for notifications, which never get a response.
#[derive(Deserialize, Debug)]
pub struct MCPRequest {
    #[allow(dead_code)]
    jsonrpc: String,
    id: Option<Value>,
    /// MCP method name (e.g., "initialize", "tools/list", "tools/call")
    method: String,
    params: Option<Value>,
}

/// JSON-RPC 2.0 response structure for MCP protocol.
///
/// Exactly one of `result` and `error` is present.
#[derive(Serialize, Debug)]
pub struct MCPResponse {
    jsonrpc: &'static str,
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<MCPError>,
}

/// JSON-RPC 2.0 error structure.
#[derive(Serialize, Debug)]
pub struct MCPError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl MCPResponse {
    fn result(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<Value>, code: i32, message: String) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(MCPError {
                code,
                message,
                data: None,
            }),
        }
    }
}

/// Tool call parameters of a `tools/call` request.
#[derive(Deserialize, Debug)]
struct ToolCallParams {
    #[serde(default)]
    name: String,
    #[serde(default)]
    arguments: Value,
}

/// Initialize and register all tools against the given Management API handle.
///
/// # Errors
/// Fails when two tools share a name, which is a startup bug.
pub fn initialize_tools(api: Api) -> Result<Arc<ToolRegistry>, RegistryError> {
    let mut registry = ToolRegistry::new(api);

    tools::clients::register(&mut registry)?;
    tools::forms::register(&mut registry)?;
    tools::logs::register(&mut registry)?;
    tools::users::register(&mut registry)?;

    tracing::info!(tools = registry.tools().len(), "registered tools");
    Ok(Arc::new(registry))
}

/// Route a JSON-RPC request to its MCP method handler.
///
/// Returns None for notifications (requests without an id).
pub async fn handle_request(state: &AppState, req: MCPRequest) -> Option<MCPResponse> {
    if req.id.is_none() {
        tracing::debug!(method = %req.method, "received notification");
        return None;
    }

    let response = match req.method.as_str() {
        "initialize" => handle_initialize(state, req.id),
        "ping" => MCPResponse::result(req.id, json!({})),
        "tools/list" => handle_tools_list(state, req.id),
        "tools/call" => handle_tools_call(state, req.id, req.params).await,
        method => MCPResponse::error(
            req.id,
            METHOD_NOT_FOUND,
            format!("Method not found: {}", method),
        ),
    };
    Some(response)
}

/// Handle MCP initialize method.
///
/// Returns the protocol version, the tools capability and server information.
fn handle_initialize(state: &AppState, id: Option<Value>) -> MCPResponse {
    MCPResponse::result(
        id,
        json!({
            "protocolVersion": PROTOCOL_VERSION,
            "capabilities": {
                "tools": {}
            },
            "serverInfo": {
                "name": state.server_name,
                "version": state.server_version
            }
        }),
    )
}

fn handle_tools_list(state: &AppState, id: Option<Value>) -> MCPResponse {
    MCPResponse::result(id, json!({ "tools": state.registry.tools() }))
}

/// Handle MCP tools/call method.
///
/// Unknown tools, invalid arguments and remote failures all produce a normal
/// result with `isError: true`; only malformed params are a JSON-RPC error.
async fn handle_tools_call(state: &AppState, id: Option<Value>, params: Option<Value>) -> MCPResponse {
    let call: ToolCallParams = match params.map(serde_json::from_value) {
        Some(Ok(call)) => call,
        Some(Err(e)) => {
            return MCPResponse::error(id, INVALID_PARAMS, format!("Invalid params: {}", e));
        }
        None => return MCPResponse::error(id, INVALID_PARAMS, "Invalid params".to_string()),
    };

    let response = state.registry.dispatch(&call.name, call.arguments).await;
    match serde_json::to_value(&response) {
        Ok(result) => MCPResponse::result(id, result),
        Err(e) => MCPResponse::error(id, INTERNAL_ERROR, e.to_string()),
    }
}

/// Serve newline-delimited JSON-RPC messages from `reader` to `writer`.
///
/// Requests are processed one at a time and each response is flushed as
/// soon as it is written. Lines that are not valid requests get a parse
/// error response when an id can be recovered, and are skipped otherwise.
pub async fn serve_lines<R, W>(state: &AppState, reader: R, mut writer: W) -> std::io::Result<()>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
{
    let mut lines = reader.lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }

        let response = match serde_json::from_str::<MCPRequest>(&line) {
            Ok(req) => handle_request(state, req).await,
            Err(e) => {
                tracing::warn!(error = %e, "failed to parse request");
                serde_json::from_str::<Value>(&line)
                    .ok()
                    .and_then(|partial| partial.get("id").cloned())
                    .map(|id| {
                        MCPResponse::error(Some(id), PARSE_ERROR, format!("Parse error: {}", e))
                    })
            }
        };
        let Some(response) = response else {
            continue;
        };

        let response_json = match serde_json::to_string(&response) {
            Ok(json) => json,
            Err(e) => {
                tracing::error!(error = %e, "failed to serialize response");
                continue;
            }
        };
        writer.write_all(response_json.as_bytes()).await?;
        writer.write_all(b"\n").await?;
        writer.flush().await?;
    }

    Ok(())
}

/// Run the MCP server in STDIO mode.
///
/// Reads JSON-RPC requests line-by-line from stdin and writes responses to
/// stdout. Logging goes to stderr so it never interferes with the protocol
/// stream. Returns when stdin is closed.
pub async fn run_server_stdio(state: AppState) -> std::io::Result<()> {
    use tokio::io::{BufReader, BufWriter};

    tracing::info!(
        name = %state.server_name,
        version = %state.server_version,
        "MCP server starting (STDIO mode)"
    );

    let stdin = BufReader::with_capacity(8192, tokio::io::stdin());
    let stdout = BufWriter::with_capacity(8192, tokio::io::stdout());
    serve_lines(&state, stdin, stdout).await?;

    tracing::info!("stdin closed, shutting down");
    Ok(())
}

/// Health check endpoint handler.
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "service": "auth0-mcp-server"
    }))
}

/// MCP JSON-RPC request handler for HTTP mode.
///
/// Notifications are acknowledged with 202 and an empty body.
async fn mcp_handler(
    state: web::Data<AppState>,
    counter: web::Data<AtomicU64>,
    req: web::Json<MCPRequest>,
) -> HttpResponse {
    counter.fetch_add(1, Ordering::Relaxed);

    match handle_request(&state, req.into_inner()).await {
        Some(response) => HttpResponse::Ok().json(response),
        None => HttpResponse::Accepted().finish(),
    }
}

/// Returns the total number of requests processed since server start.
async fn metrics_handler(counter: web::Data<AtomicU64>) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "requests_total": counter.load(Ordering::Relaxed),
        "status": "ok"
    }))
}

/// Run the MCP server in HTTP mode.
///
/// Routes:
/// - POST /mcp and POST /: JSON-RPC requests
/// - GET /health, GET /: liveness
/// - GET /metrics: request counter
pub async fn run_server_http(
    state: AppState,
    host: String,
    port: u16,
    workers: usize,
) -> std::io::Result<()> {
    let bind_addr = format!("{}:{}", host, port);

    tracing::info!(
        name = %state.server_name,
        version = %state.server_version,
        bind = %bind_addr,
        workers,
        "MCP server starting (HTTP mode)"
    );

    let app_state = web::Data::new(state);
    // Lock-free request counter shared by all workers
    let request_count = web::Data::new(AtomicU64::new(0));

    HttpServer::new(move || {
        App::new()
            .app_data(app_state.clone())
            .app_data(request_count.clone())
            .wrap(Compress::default())
            .wrap(
                DefaultHeaders::new()
                    .add(("X-Content-Type-Options", "nosniff"))
                    .add(("X-Frame-Options", "DENY")),
            )
            .wrap(Logger::new("%r %s %Dms"))
            .route("/health", web::get().to(health))
            .route("/metrics", web::get().to(metrics_handler))
            .route("/mcp", web::post().to(mcp_handler))
            .route("/", web::post().to(mcp_handler))
            .route("/", web::get().to(health))
    })
    .workers(workers)
    .keep_alive(Duration::from_secs(30))
    .client_request_timeout(Duration::from_secs(30))
    .shutdown_timeout(10)
    .bind(&bind_addr)?
    .run()
    .await
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth0::{ApiError, MockManagementApi};

    fn state(api: MockManagementApi) -> AppState {
        AppState {
            server_name: "auth0-mcp-server".to_string(),
            server_version: "0.0.1".to_string(),
            registry: initialize_tools(Arc::new(api)).unwrap(),
        }
    }

    async fn exchange(state: &AppState, input: &str) -> Vec<Value> {
        let mut output = Vec::new();
        serve_lines(state, input.as_bytes(), &mut output).await.unwrap();
        String::from_utf8(output)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[tokio::test]
    async fn initialize_handshake_and_tool_listing() {
        let state = state(MockManagementApi::new());
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#, "\n",
            r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#, "\n",
            "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#, "\n",
        );

        let responses = exchange(&state, input).await;

        assert_eq!(responses.len(), 2);
        assert_eq!(responses[0]["id"], 1);
        assert_eq!(responses[0]["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(responses[0]["result"]["serverInfo"]["name"], "auth0-mcp-server");
        let tools = responses[1]["result"]["tools"].as_array().unwrap();
        assert!(tools.iter().any(|tool| tool["name"] == "find-user-by-email"));
        assert!(tools.iter().all(|tool| tool["inputSchema"]["type"] == "object"));
    }

    #[tokio::test]
    async fn tools_call_wraps_the_envelope() {
        let mut api = MockManagementApi::new();
        api.expect_delete()
            .times(1)
            .returning(|_, _| Err(ApiError::Rejected { status: 404, message: "not found".into() }));
        let state = state(api);
        let input = r#"{"jsonrpc":"2.0","id":"a","method":"tools/call","params":{"name":"delete-user","arguments":{"userId":"u1"}}}"#;

        let responses = exchange(&state, input).await;

        assert_eq!(
            responses[0],
            json!({
                "jsonrpc": "2.0",
                "id": "a",
                "result": {
                    "content": [{ "type": "text", "text": "Error: not found" }],
                    "isError": true
                }
            })
        );
    }

    #[tokio::test]
    async fn protocol_errors() {
        let state = state(MockManagementApi::new());
        let input = concat!(
            r#"{"jsonrpc":"2.0","id":1,"method":"resources/list"}"#, "\n",
            r#"{"jsonrpc":"2.0","id":2,"method":"tools/call"}"#, "\n",
            r#"{"jsonrpc":"2.0","id":3,"method":42}"#, "\n",
            "not json at all\n",
            r#"{"jsonrpc":"2.0","id":4,"method":"ping"}"#, "\n",
        );

        let responses = exchange(&state, input).await;

        assert_eq!(responses.len(), 4);
        assert_eq!(responses[0]["error"]["code"], METHOD_NOT_FOUND);
        assert_eq!(responses[1]["error"]["code"], INVALID_PARAMS);
        assert_eq!(responses[2]["error"]["code"], PARSE_ERROR);
        assert_eq!(responses[2]["id"], 3);
        assert_eq!(responses[3]["result"], json!({}));
    }
}
