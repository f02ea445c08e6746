/// Tool Registry and Invoker
///
/// The registry owns every tool definition (name, description, parameter
/// schema, handler) and the shared Management API handle. `dispatch` is the
/// failure boundary of the server: validation errors, remote faults and
/// unknown tool names all come back as a `ToolResponse`, never as an error
/// the transport has to deal with.

use futures_util::future::{BoxFuture, FutureExt};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use thiserror::Error;

use crate::auth0::{ApiError, ManagementApi};
use crate::core::outcome::{Outcome, ToolResponse};
use crate::core::schema::{self, Arguments, Field};

/// Failure raised inside a tool handler.
#[derive(Debug, Error)]
pub enum ToolError {
    #[error(transparent)]
    Remote(#[from] ApiError),

    /// Validated arguments did not decode into the handler's parameter type.
    #[error("invalid arguments: {0}")]
    Arguments(#[from] serde_json::Error),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("tool '{0}' is already registered")]
    Duplicate(String),
}

/// Shared Management API handle passed to every handler.
pub type Api = Arc<dyn ManagementApi>;

/// Boxed async tool handler stored in the registry.
pub type ToolHandler =
    Box<dyn Fn(Api, Arguments) -> BoxFuture<'static, Result<Outcome, ToolError>> + Send + Sync>;

/// Decode validated arguments into a handler's parameter struct.
pub fn parse<T: DeserializeOwned>(args: Arguments) -> Result<T, ToolError> {
    Ok(serde_json::from_value(Value::Object(args))?)
}

/// MCP tool definition as advertised by `tools/list`.
#[derive(Serialize, Debug, Clone)]
pub struct MCPTool {
    /// Unique tool identifier (e.g., "get-user-by-id")
    pub name: String,
    /// Human-readable description of what the tool does
    pub description: String,
    /// JSON Schema rendered from the tool's parameter table
    #[serde(rename = "inputSchema")]
    pub input_schema: Value,
}

struct ToolDefinition {
    schema: &'static [Field],
    handler: ToolHandler,
}

/// Registry of available MCP tools.
///
/// Built once at startup and read-only afterwards, so it can be shared
/// across concurrent requests behind an `Arc` without locking.
pub struct ToolRegistry {
    api: Api,
    /// Tool metadata in registration order (for tools/list)
    tools: Vec<MCPTool>,
    /// Map of tool names to their definitions (for tools/call)
    definitions: HashMap<String, ToolDefinition>,
}

impl ToolRegistry {
    pub fn new(api: Api) -> Self {
        Self {
            api,
            tools: Vec::new(),
            definitions: HashMap::new(),
        }
    }

    /// Register a tool with the registry.
    ///
    /// # Arguments
    /// * `name` - Unique tool name
    /// * `description` - What the tool does, shown to the calling agent
    /// * `schema` - Parameter table the arguments are validated against
    /// * `handler` - Async function invoked with the validated arguments
    ///
    /// # Errors
    /// `RegistryError::Duplicate` when `name` is already taken.
    pub fn register<F, Fut>(
        &mut self,
        name: &str,
        description: &str,
        schema: &'static [Field],
        handler: F,
    ) -> Result<(), RegistryError>
    where
        F: Fn(Api, Arguments) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = Result<Outcome, ToolError>> + Send + 'static,
    {
        if self.definitions.contains_key(name) {
            return Err(RegistryError::Duplicate(name.to_string()));
        }

        self.tools.push(MCPTool {
            name: name.to_string(),
            description: description.to_string(),
            input_schema: schema::json_schema(schema),
        });
        self.definitions.insert(
            name.to_string(),
            ToolDefinition {
                schema,
                handler: Box::new(move |api, args| handler(api, args).boxed()),
            },
        );
        Ok(())
    }

    /// Registered tools in registration order.
    pub fn tools(&self) -> &[MCPTool] {
        &self.tools
    }

    /// Validate arguments, run the named tool and wrap the result.
    ///
    /// The Management API is only called when the tool exists and the
    /// arguments satisfy its schema.
    pub async fn dispatch(&self, name: &str, raw_args: Value) -> ToolResponse {
        let Some(definition) = self.definitions.get(name) else {
            tracing::warn!(tool = name, "call to unknown tool");
            return Outcome::Failure(format!("Unknown tool: {}", name)).into_response();
        };

        let args = match schema::validate(definition.schema, &raw_args) {
            Ok(args) => args,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "rejected tool arguments");
                return Outcome::Failure(e.to_string()).into_response();
            }
        };

        tracing::debug!(tool = name, "invoking tool");
        let outcome = match (definition.handler)(Arc::clone(&self.api), args).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!(tool = name, error = %e, "tool call failed");
                Outcome::Failure(e.to_string())
            }
        };
        outcome.into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth0::{MockManagementApi, Resource};
    use serde::Deserialize;
    use serde_json::json;

    const ID_ONLY: &[Field] = &[Field::string("id").non_empty()];

    #[derive(Deserialize)]
    struct IdParams {
        id: String,
    }

    async fn get_log(api: Api, args: Arguments) -> Result<Outcome, ToolError> {
        let IdParams { id } = parse(args)?;
        let log = api.get(Resource::Logs, &id, Arguments::new()).await?;
        Ok(Outcome::found(log, "No log found with this ID."))
    }

    async fn never(_: Api, _: Arguments) -> Result<Outcome, ToolError> {
        Ok(Outcome::confirmed("never"))
    }

    fn registry(api: MockManagementApi) -> ToolRegistry {
        let mut registry = ToolRegistry::new(Arc::new(api));
        registry
            .register("log-get-by-id", "Retrieve a log.", ID_ONLY, get_log)
            .unwrap();
        registry
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let mut registry = registry(MockManagementApi::new());

        let err = registry
            .register("log-get-by-id", "again", ID_ONLY, never)
            .unwrap_err();

        assert_eq!(err, RegistryError::Duplicate("log-get-by-id".into()));
        assert_eq!(registry.tools().len(), 1);
    }

    #[test]
    fn tools_are_listed_with_rendered_schema() {
        let registry = registry(MockManagementApi::new());

        let tool = serde_json::to_value(&registry.tools()[0]).unwrap();

        assert_eq!(tool["name"], "log-get-by-id");
        assert_eq!(tool["inputSchema"]["required"], json!(["id"]));
    }

    #[tokio::test]
    async fn unknown_tool_never_reaches_the_api() {
        let mut api = MockManagementApi::new();
        api.expect_get().never();

        let response = registry(api).dispatch("log-delete", json!({ "id": "1" })).await;

        assert!(response.is_error);
        assert_eq!(response.first_text(), "Error: Unknown tool: log-delete");
    }

    #[tokio::test]
    async fn invalid_arguments_never_reach_the_api() {
        let mut api = MockManagementApi::new();
        api.expect_get().never();

        let response = registry(api).dispatch("log-get-by-id", json!({ "id": "" })).await;

        assert!(response.is_error);
        assert_eq!(response.first_text(), "Error: parameter `id` must not be empty");
    }

    #[tokio::test]
    async fn remote_faults_are_contained() {
        let mut api = MockManagementApi::new();
        let mut calls = 0;
        api.expect_get().times(2).returning(move |_, _, _| {
            calls += 1;
            if calls == 1 {
                Err(ApiError::Rejected { status: 503, message: "service unavailable".into() })
            } else {
                Ok(Some(json!({ "log_id": "1" })))
            }
        });
        let registry = registry(api);

        let failed = registry.dispatch("log-get-by-id", json!({ "id": "1" })).await;
        let recovered = registry.dispatch("log-get-by-id", json!({ "id": "1" })).await;

        assert!(failed.is_error);
        assert!(failed.first_text().contains("service unavailable"));
        assert!(!recovered.is_error);
        assert_eq!(recovered.first_text(), r#"{"log_id":"1"}"#);
    }
}
