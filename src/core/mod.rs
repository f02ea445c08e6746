/// Core Server Framework Module
///
/// This module contains the core server implementation including:
/// - config.rs: Environment configuration
/// - schema.rs: Declarative tool parameter schemas and validation
/// - outcome.rs: Tool outcomes and the response envelope
/// - registry.rs: Tool registry and invoker
/// - server.rs: MCP server implementation with HTTP and STDIO transport

pub mod config;
pub mod outcome;
pub mod registry;
pub mod schema;
pub mod server;
