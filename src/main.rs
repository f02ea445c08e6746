/// Auth0 MCP Server Entry Point
///
/// Loads configuration from the environment, builds the Management API client
/// and the tool registry, then serves MCP over the selected transport
/// (STDIO by default, HTTP, or both). See `core::config` for the variables.
///
/// Logs go to stderr. The process exits non-zero only when startup fails
/// or a transport cannot be served.

mod auth0;
mod core;
mod tools;

use std::process::ExitCode;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use crate::auth0::ManagementClient;
use crate::core::config::{Config, LogFormat, TransportMode};
use crate::core::server::{self, AppState};

fn init_logging(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let builder = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr);
    match format {
        LogFormat::Text => builder.init(),
        LogFormat::Json => builder.json().init(),
    }
}

#[tokio::main]
async fn main() -> ExitCode {
    let config = match Config::from_env() {
        Ok(config) => config,
        Err(e) => {
            init_logging(LogFormat::Text);
            tracing::error!(error = %e, "invalid configuration");
            return ExitCode::FAILURE;
        }
    };
    init_logging(config.log_format);

    let client = match ManagementClient::new(&config.auth0) {
        Ok(client) => client,
        Err(e) => {
            tracing::error!(error = %e, "failed to create Management API client");
            return ExitCode::FAILURE;
        }
    };
    let registry = match server::initialize_tools(Arc::new(client)) {
        Ok(registry) => registry,
        Err(e) => {
            tracing::error!(error = %e, "failed to register tools");
            return ExitCode::FAILURE;
        }
    };
    let state = AppState {
        server_name: config.server_name.clone(),
        server_version: config.server_version.clone(),
        registry,
    };

    let result = match config.transport {
        TransportMode::Stdio => server::run_server_stdio(state).await,
        TransportMode::Http => {
            server::run_server_http(state, config.host, config.port, config.workers).await
        }
        TransportMode::Both => {
            // STDIO in the background, HTTP in the foreground
            let stdio_state = state.clone();
            let stdio_handle = tokio::spawn(async move {
                if let Err(e) = server::run_server_stdio(stdio_state).await {
                    tracing::error!(error = %e, "STDIO server error");
                }
            });

            let http_result =
                server::run_server_http(state, config.host, config.port, config.workers).await;
            stdio_handle.abort();
            http_result
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            tracing::error!(error = %e, "transport failed");
            ExitCode::FAILURE
        }
    }
}
