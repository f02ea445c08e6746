/// Auth0 Management API Boundary
///
/// Tools never talk HTTP themselves. They call the `ManagementApi` trait,
/// which the server backs with `ManagementClient` (a `reqwest` client for
/// the Management API v2) and tests back with a mock.
///
/// - mod.rs: the trait, resource names and error type
/// - client.rs: the HTTP implementation with client-credentials auth

pub mod client;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;

pub use client::ManagementClient;

/// Query-string arguments for read operations.
pub type Query = Map<String, Value>;

/// Management API collections the server exposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    Clients,
    Users,
    Logs,
    Forms,
}

impl Resource {
    /// Path segment under `/api/v2/`, also the collection key of
    /// `include_totals` pages.
    pub fn collection(&self) -> &'static str {
        match self {
            Resource::Clients => "clients",
            Resource::Users => "users",
            Resource::Logs => "logs",
            Resource::Forms => "forms",
        }
    }
}

/// Failures raised by a Management API call.
#[derive(Debug, Error)]
pub enum ApiError {
    /// The request never produced a response (DNS, TLS, connection...).
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),

    /// The client-credentials exchange was rejected.
    #[error("failed to obtain access token: {0}")]
    Token(String),

    /// The Management API answered with a non-success status.
    #[error("{message}")]
    Rejected { status: u16, message: String },

    #[error("unexpected response body: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid Management API URL: {0}")]
    InvalidUrl(String),
}

/// RPC-style view of the Management API used by tool handlers.
///
/// Legitimate absence is not an error: `get` yields `None` and `delete`
/// yields `false`. `get_all` and `get_user_logs` yield a page envelope
/// `{"data": <response body>}`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ManagementApi: Send + Sync {
    async fn create(&self, resource: Resource, body: Value) -> Result<Value, ApiError>;

    async fn get(&self, resource: Resource, id: &str, query: Query) -> Result<Option<Value>, ApiError>;

    async fn get_all(&self, resource: Resource, query: Query) -> Result<Value, ApiError>;

    async fn update(&self, resource: Resource, id: &str, body: Value) -> Result<Value, ApiError>;

    async fn delete(&self, resource: Resource, id: &str) -> Result<bool, ApiError>;

    async fn assign_roles(&self, user_id: &str, roles: Vec<String>) -> Result<(), ApiError>;

    async fn delete_roles(&self, user_id: &str, roles: Vec<String>) -> Result<(), ApiError>;

    async fn get_user_logs(&self, user_id: &str, query: Query) -> Result<Value, ApiError>;

    /// Queue a verification email job for the user.
    async fn verify_email(&self, user_id: &str) -> Result<Value, ApiError>;
}
