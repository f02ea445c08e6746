/// Server Configuration from Environment Variables
///
/// All settings are read once at startup into a `Config`. Missing Auth0
/// credentials or malformed values are startup errors; everything else has
/// a default.
///
/// Environment Variables:
/// - AUTH0_DOMAIN, AUTH0_CLIENT_ID, AUTH0_CLIENT_SECRET: tenant credentials (required)
/// - SERVER_NAME: Name of the server (default: "auth0-mcp-server")
/// - SERVER_VERSION: Version string (default: "0.0.1")
/// - MCP_TRANSPORT_MODE: "stdio", "http", or "both" (default: "stdio")
/// - HOST: Bind address for HTTP mode (default: "0.0.0.0")
/// - PORT: Port number for HTTP mode (default: 3000)
/// - WORKER_THREADS: HTTP worker count (default: CPU count, max 16)
/// - MCP_LOG_FORMAT: "text" or "json" (default: "text")

use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("environment variable {0} must be set")]
    Missing(&'static str),

    #[error("invalid value '{value}' for {key}: {reason}")]
    Invalid {
        key: &'static str,
        value: String,
        reason: &'static str,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportMode {
    Stdio,
    Http,
    Both,
}

impl FromStr for TransportMode {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "stdio" => Ok(TransportMode::Stdio),
            "http" => Ok(TransportMode::Http),
            "both" => Ok(TransportMode::Both),
            _ => Err("must be 'stdio', 'http', or 'both'"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Json,
}

impl FromStr for LogFormat {
    type Err = &'static str;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "text" => Ok(LogFormat::Text),
            "json" => Ok(LogFormat::Json),
            _ => Err("must be 'text' or 'json'"),
        }
    }
}

/// Credentials for the Management API client-credentials grant.
#[derive(Clone, PartialEq, Eq)]
pub struct Auth0Settings {
    /// Tenant domain, e.g. "my-tenant.eu.auth0.com"
    pub domain: String,
    pub client_id: String,
    pub client_secret: String,
}

impl std::fmt::Debug for Auth0Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Auth0Settings")
            .field("domain", &self.domain)
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub server_name: String,
    pub server_version: String,
    pub transport: TransportMode,
    pub host: String,
    pub port: u16,
    pub workers: usize,
    pub log_format: LogFormat,
    pub auth0: Auth0Settings,
}

impl Config {
    /// Load configuration from the process environment.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let or_default = |key: &str, default: &str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .unwrap_or_else(|| default.to_string())
        };
        let required = |key: &'static str| {
            lookup(key)
                .filter(|value| !value.trim().is_empty())
                .ok_or(ConfigError::Missing(key))
        };

        let workers = match lookup("WORKER_THREADS").filter(|value| !value.trim().is_empty()) {
            Some(value) => parse::<usize>("WORKER_THREADS", &value)?.max(1),
            None => num_cpus::get().clamp(1, 16),
        };

        Ok(Self {
            server_name: or_default("SERVER_NAME", "auth0-mcp-server"),
            server_version: or_default("SERVER_VERSION", "0.0.1"),
            transport: parse_with("MCP_TRANSPORT_MODE", &or_default("MCP_TRANSPORT_MODE", "stdio"))?,
            host: or_default("HOST", "0.0.0.0"),
            port: parse("PORT", &or_default("PORT", "3000"))?,
            workers,
            log_format: parse_with("MCP_LOG_FORMAT", &or_default("MCP_LOG_FORMAT", "text"))?,
            auth0: Auth0Settings {
                domain: required("AUTH0_DOMAIN")?,
                client_id: required("AUTH0_CLIENT_ID")?,
                client_secret: required("AUTH0_CLIENT_SECRET")?,
            },
        })
    }
}

fn parse<T: FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason: "not a valid number",
    })
}

fn parse_with<T>(key: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr<Err = &'static str>,
{
    value.parse().map_err(|reason| ConfigError::Invalid {
        key,
        value: value.to_string(),
        reason,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    const CREDENTIALS: [(&str, &str); 3] = [
        ("AUTH0_DOMAIN", "tenant.auth0.com"),
        ("AUTH0_CLIENT_ID", "abc"),
        ("AUTH0_CLIENT_SECRET", "s3cret"),
    ];

    #[test]
    fn defaults_apply() {
        let config = Config::from_lookup(lookup(&CREDENTIALS)).unwrap();

        assert_eq!(config.server_name, "auth0-mcp-server");
        assert_eq!(config.transport, TransportMode::Stdio);
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_format, LogFormat::Text);
        assert!((1..=16).contains(&config.workers));
        assert_eq!(config.auth0.domain, "tenant.auth0.com");
    }

    #[test]
    fn missing_credentials_are_fatal() {
        let err = Config::from_lookup(lookup(&CREDENTIALS[..2])).unwrap_err();

        assert_eq!(err, ConfigError::Missing("AUTH0_CLIENT_SECRET"));
    }

    #[test]
    fn invalid_values_are_rejected() {
        let mut vars = CREDENTIALS.to_vec();
        vars.push(("MCP_TRANSPORT_MODE", "websocket"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "MCP_TRANSPORT_MODE", .. }));

        let mut vars = CREDENTIALS.to_vec();
        vars.push(("PORT", "http"));
        let err = Config::from_lookup(lookup(&vars)).unwrap_err();
        assert!(matches!(err, ConfigError::Invalid { key: "PORT", .. }));
    }

    #[test]
    fn blank_values_fall_back_to_defaults() {
        let mut vars = CREDENTIALS.to_vec();
        vars.extend([("WORKER_THREADS", " "), ("PORT", ""), ("MCP_LOG_FORMAT", "")]);

        let config = Config::from_lookup(lookup(&vars)).unwrap();

        assert!((1..=16).contains(&config.workers));
        assert_eq!(config.port, 3000);
        assert_eq!(config.log_format, LogFormat::Text);
    }

    #[test]
    fn secret_is_not_debug_printed() {
        let config = Config::from_lookup(lookup(&CREDENTIALS)).unwrap();

        assert!(!format!("{:?}", config).contains("s3cret"));
    }
}
