/// Tools Module
///
/// This module contains the Auth0 Management API tools, one module per
/// resource. Each module declares its parameter tables and exports a
/// `register` function that adds its tools to the registry during server
/// initialization.

pub mod clients;
pub mod forms;
pub mod logs;
pub mod users;

#[cfg(test)]
pub(crate) mod testing {
    use std::sync::Arc;

    use crate::auth0::{ApiError, MockManagementApi};
    use crate::core::registry::ToolRegistry;
    use crate::core::server::initialize_tools;

    /// Full production registry backed by a mock Management API.
    pub fn registry(api: MockManagementApi) -> Arc<ToolRegistry> {
        initialize_tools(Arc::new(api)).unwrap()
    }

    pub fn rejected(message: &str) -> ApiError {
        ApiError::Rejected {
            status: 400,
            message: message.to_string(),
        }
    }
}
