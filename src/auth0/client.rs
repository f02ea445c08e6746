/// Management API v2 client over `reqwest`.
///
/// Authenticates with the OAuth2 client-credentials grant and keeps the
/// bearer token until shortly before it expires. All calls are plain JSON
/// REST requests; HTTP 404 is reported as absence for reads and deletes.

use async_trait::async_trait;
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use reqwest::{Method, Response, StatusCode, Url};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use tokio::sync::Mutex;

use super::{ApiError, ManagementApi, Query, Resource};
use crate::core::config::Auth0Settings;

/// Tokens are refreshed this long before the server-side expiry.
const TOKEN_EXPIRY_MARGIN: Duration = Duration::from_secs(60);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Everything but unreserved characters is escaped in path segments, so
/// ids like `auth0|abc` reach the API as `auth0%7Cabc`.
const SEGMENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

struct AccessToken {
    value: String,
    expires_at: Instant,
}

#[derive(Deserialize)]
struct TokenGrant {
    access_token: String,
    expires_in: u64,
}

/// Response of a Management API call that may legitimately be absent.
enum Reply {
    Body(Value),
    NotFound,
}

impl Reply {
    fn into_body(self) -> Result<Value, ApiError> {
        match self {
            Reply::Body(body) => Ok(body),
            Reply::NotFound => Err(ApiError::Rejected {
                status: StatusCode::NOT_FOUND.as_u16(),
                message: "Not Found".to_string(),
            }),
        }
    }
}

pub struct ManagementClient {
    http: reqwest::Client,
    /// `https://{domain}/`
    base: Url,
    client_id: String,
    client_secret: String,
    token: Mutex<Option<AccessToken>>,
}

impl ManagementClient {
    /// Build a client for the tenant named in `settings`.
    ///
    /// No network traffic happens here; the first tool call fetches a token.
    pub fn new(settings: &Auth0Settings) -> Result<Self, ApiError> {
        let domain = settings
            .domain
            .trim_start_matches("https://")
            .trim_end_matches('/');
        let base = Url::parse(&format!("https://{}/", domain))
            .map_err(|e| ApiError::InvalidUrl(format!("{}: {}", domain, e)))?;
        let http = reqwest::Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("auth0-mcp-server/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            http,
            base,
            client_id: settings.client_id.clone(),
            client_secret: settings.client_secret.clone(),
            token: Mutex::new(None),
        })
    }

    /// `https://{domain}/api/v2/{segments...}` with each segment percent-encoded.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut path = String::from("/api/v2");
        for segment in segments {
            path.push('/');
            path.extend(utf8_percent_encode(segment, SEGMENT));
        }
        let mut url = self.base.clone();
        url.set_path(&path);
        url
    }

    async fn access_token(&self) -> Result<String, ApiError> {
        let mut cached = self.token.lock().await;
        if let Some(token) = cached.as_ref().filter(|token| token.expires_at > Instant::now()) {
            return Ok(token.value.clone());
        }

        let url = self
            .base
            .join("oauth/token")
            .map_err(|e| ApiError::InvalidUrl(e.to_string()))?;
        let response = self
            .http
            .post(url)
            .json(&json!({
                "grant_type": "client_credentials",
                "client_id": self.client_id,
                "client_secret": self.client_secret,
                "audience": format!("{}api/v2/", self.base),
            }))
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Token(rejection_message(status, &body)));
        }

        let grant: TokenGrant = response.json().await?;
        let lifetime = Duration::from_secs(grant.expires_in).saturating_sub(TOKEN_EXPIRY_MARGIN);
        tracing::debug!(expires_in = grant.expires_in, "obtained management api token");
        *cached = Some(AccessToken {
            value: grant.access_token.clone(),
            expires_at: Instant::now() + lifetime,
        });
        Ok(grant.access_token)
    }

    async fn call(&self, method: Method, url: Url, body: Option<Value>) -> Result<Reply, ApiError> {
        let token = self.access_token().await?;
        tracing::debug!(%method, path = url.path(), "management api request");

        let mut request = self.http.request(method, url).bearer_auth(token);
        if let Some(body) = body {
            request = request.json(&body);
        }
        let response = request.send().await?;

        let status = response.status();
        if status == StatusCode::NOT_FOUND {
            return Ok(Reply::NotFound);
        }
        if status.is_success() {
            return read_body(response).await.map(Reply::Body);
        }
        let body = response.text().await.unwrap_or_default();
        Err(ApiError::Rejected {
            status: status.as_u16(),
            message: rejection_message(status, &body),
        })
    }
}

async fn read_body(response: Response) -> Result<Value, ApiError> {
    let text = response.text().await?;
    if text.trim().is_empty() {
        return Ok(Value::Null);
    }
    serde_json::from_str(&text).map_err(ApiError::from)
}

/// Render query arguments as query pairs. Arrays repeat their key.
fn apply_query(url: &mut Url, query: &Query) {
    if query.is_empty() {
        return;
    }
    let mut pairs = url.query_pairs_mut();
    for (key, value) in query {
        match value {
            Value::Array(items) => {
                for item in items {
                    pairs.append_pair(key, &query_value(item));
                }
            }
            other => {
                pairs.append_pair(key, &query_value(other));
            }
        }
    }
}

fn query_value(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// Prefer the Management API's own `message` (or OAuth `error_description`).
fn rejection_message(status: StatusCode, body: &str) -> String {
    let parsed: Option<Value> = serde_json::from_str(body).ok();
    let reported = parsed.as_ref().and_then(|value| {
        value
            .get("message")
            .or_else(|| value.get("error_description"))
            .and_then(Value::as_str)
    });
    match reported {
        Some(message) => message.to_string(),
        None if body.trim().is_empty() => status
            .canonical_reason()
            .unwrap_or("request rejected")
            .to_string(),
        None => body.to_string(),
    }
}

#[async_trait]
impl ManagementApi for ManagementClient {
    async fn create(&self, resource: Resource, body: Value) -> Result<Value, ApiError> {
        let url = self.endpoint(&[resource.collection()]);
        self.call(Method::POST, url, Some(body)).await?.into_body()
    }

    async fn get(&self, resource: Resource, id: &str, query: Query) -> Result<Option<Value>, ApiError> {
        let mut url = self.endpoint(&[resource.collection(), id]);
        apply_query(&mut url, &query);
        match self.call(Method::GET, url, None).await? {
            Reply::Body(Value::Null) | Reply::NotFound => Ok(None),
            Reply::Body(found) => Ok(Some(found)),
        }
    }

    async fn get_all(&self, resource: Resource, query: Query) -> Result<Value, ApiError> {
        let mut url = self.endpoint(&[resource.collection()]);
        apply_query(&mut url, &query);
        let page = self.call(Method::GET, url, None).await?.into_body()?;
        Ok(json!({ "data": page }))
    }

    async fn update(&self, resource: Resource, id: &str, body: Value) -> Result<Value, ApiError> {
        let url = self.endpoint(&[resource.collection(), id]);
        self.call(Method::PATCH, url, Some(body)).await?.into_body()
    }

    async fn delete(&self, resource: Resource, id: &str) -> Result<bool, ApiError> {
        let url = self.endpoint(&[resource.collection(), id]);
        match self.call(Method::DELETE, url, None).await? {
            Reply::Body(_) => Ok(true),
            Reply::NotFound => Ok(false),
        }
    }

    async fn assign_roles(&self, user_id: &str, roles: Vec<String>) -> Result<(), ApiError> {
        let url = self.endpoint(&["users", user_id, "roles"]);
        self.call(Method::POST, url, Some(json!({ "roles": roles })))
            .await?
            .into_body()
            .map(drop)
    }

    async fn delete_roles(&self, user_id: &str, roles: Vec<String>) -> Result<(), ApiError> {
        let url = self.endpoint(&["users", user_id, "roles"]);
        self.call(Method::DELETE, url, Some(json!({ "roles": roles })))
            .await?
            .into_body()
            .map(drop)
    }

    async fn get_user_logs(&self, user_id: &str, query: Query) -> Result<Value, ApiError> {
        let mut url = self.endpoint(&["users", user_id, "logs"]);
        apply_query(&mut url, &query);
        let page = self.call(Method::GET, url, None).await?.into_body()?;
        Ok(json!({ "data": page }))
    }

    async fn verify_email(&self, user_id: &str) -> Result<Value, ApiError> {
        let url = self.endpoint(&["jobs", "verification-email"]);
        self.call(Method::POST, url, Some(json!({ "user_id": user_id })))
            .await?
            .into_body()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn client(domain: &str) -> ManagementClient {
        ManagementClient::new(&Auth0Settings {
            domain: domain.to_string(),
            client_id: "id".to_string(),
            client_secret: "secret".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn endpoint_encodes_user_ids() {
        let url = client("tenant.eu.auth0.com")
            .endpoint(&["users", "auth0|abc 1", "roles"]);

        assert_eq!(
            url.as_str(),
            "https://tenant.eu.auth0.com/api/v2/users/auth0%7Cabc%201/roles"
        );
    }

    #[test]
    fn domain_may_carry_scheme_and_trailing_slash() {
        let url = client("https://tenant.auth0.com/").endpoint(&["clients"]);

        assert_eq!(url.as_str(), "https://tenant.auth0.com/api/v2/clients");
    }

    #[test]
    fn query_arrays_repeat_their_key() {
        let mut url = Url::parse("https://tenant.auth0.com/api/v2/forms").unwrap();
        let query = json!({ "page": 0, "include_totals": true, "hydrate": ["flow_count", "links"] });

        apply_query(&mut url, query.as_object().unwrap());

        assert_eq!(
            url.query(),
            Some("page=0&include_totals=true&hydrate=flow_count&hydrate=links")
        );
    }

    #[test]
    fn empty_query_leaves_url_untouched() {
        let mut url = Url::parse("https://tenant.auth0.com/api/v2/logs").unwrap();

        apply_query(&mut url, &Query::new());

        assert_eq!(url.as_str(), "https://tenant.auth0.com/api/v2/logs");
    }

    #[test]
    fn rejection_prefers_reported_message() {
        let body = r#"{"statusCode":400,"error":"Bad Request","message":"Payload validation error"}"#;

        assert_eq!(
            rejection_message(StatusCode::BAD_REQUEST, body),
            "Payload validation error"
        );
        assert_eq!(
            rejection_message(StatusCode::FORBIDDEN, r#"{"error":"access_denied","error_description":"Unauthorized"}"#),
            "Unauthorized"
        );
        assert_eq!(rejection_message(StatusCode::TOO_MANY_REQUESTS, ""), "Too Many Requests");
        assert_eq!(rejection_message(StatusCode::BAD_GATEWAY, "upstream down"), "upstream down");
    }
}
