/// Tool Outcomes and the Response Envelope
///
/// Handlers report what happened as an `Outcome`; the registry turns every
/// outcome into the single wire shape MCP clients receive for `tools/call`:
/// `{"content": [{"type": "text", "text": ...}], "isError": bool}`.
///
/// The shaping helpers on `Outcome` hold the result policy shared by all
/// bindings (create, get-by-id, list, delete, confirmation).

use serde::Serialize;
use serde_json::Value;

/// Successful result body.
#[derive(Debug, Clone, PartialEq)]
pub enum Payload {
    /// Remote resource representation, rendered as compact JSON text.
    Json(Value),
    /// Fixed confirmation text, rendered verbatim.
    Message(String),
}

/// Result of a single tool invocation.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Success(Payload),
    /// The remote service legitimately reported nothing. Not an error.
    Empty(String),
    Failure(String),
}

impl Outcome {
    /// Create-style (and update) results are always passed through.
    pub fn created(resource: Value) -> Self {
        Outcome::Success(Payload::Json(resource))
    }

    /// Get-by-id results: absence becomes `Empty(not_found)`.
    pub fn found(resource: Option<Value>, not_found: &str) -> Self {
        match resource {
            Some(resource) if is_present(&resource) => Outcome::Success(Payload::Json(resource)),
            _ => Outcome::Empty(not_found.to_string()),
        }
    }

    /// List results: a page with zero items becomes `Empty(none_found)`.
    ///
    /// `collection` names the key the Management API uses for the item array
    /// when totals are requested (e.g. `users` in `{"users": [...], "total": 3}`).
    pub fn listed(page: Value, collection: &str, none_found: &str) -> Self {
        match item_count(&page, collection) {
            Some(0) => Outcome::Empty(none_found.to_string()),
            _ => Outcome::Success(Payload::Json(page)),
        }
    }

    /// Delete results that honour the remote acknowledgement.
    pub fn deleted(acknowledged: bool, done: &str, not_found: &str) -> Self {
        if acknowledged {
            Outcome::confirmed(done)
        } else {
            Outcome::Empty(not_found.to_string())
        }
    }

    /// Mutations whose return value carries nothing worth reporting.
    pub fn confirmed(message: &str) -> Self {
        Outcome::Success(Payload::Message(message.to_string()))
    }

    /// Translate the outcome into the wire envelope. Never fails.
    pub fn into_response(self) -> ToolResponse {
        match self {
            Outcome::Success(Payload::Json(value)) => match serde_json::to_string(&value) {
                Ok(text) => ToolResponse::text(text, false),
                Err(e) => ToolResponse::text(format!("Error: {}", e), true),
            },
            Outcome::Success(Payload::Message(text)) | Outcome::Empty(text) => {
                ToolResponse::text(text, false)
            }
            Outcome::Failure(message) => ToolResponse::text(format!("Error: {}", message), true),
        }
    }
}

fn is_present(value: &Value) -> bool {
    match value {
        Value::Null => false,
        Value::Object(map) => !map.is_empty(),
        _ => true,
    }
}

/// Count the items of a list page, if its shape is recognised.
///
/// Accepted shapes: `{"data": [...]}`, `{"data": {"<collection>": [...], ...}}`,
/// `{"<collection>": [...], ...}` and a bare array.
fn item_count(page: &Value, collection: &str) -> Option<usize> {
    let body = page.get("data").unwrap_or(page);
    body.as_array()
        .or_else(|| body.get(collection).and_then(Value::as_array))
        .map(Vec::len)
}

/// A single content block of a tool response.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ContentItem {
    /// Content kind, always "text"
    #[serde(rename = "type")]
    pub kind: &'static str,
    pub text: String,
}

/// The envelope returned for every `tools/call`, whatever tool ran.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ToolResponse {
    pub content: Vec<ContentItem>,
    /// True only for Failure outcomes; empty results are not errors.
    #[serde(rename = "isError")]
    pub is_error: bool,
}

impl ToolResponse {
    pub fn text(text: impl Into<String>, is_error: bool) -> Self {
        Self {
            content: vec![ContentItem { kind: "text", text: text.into() }],
            is_error,
        }
    }

    /// Text of the first content block.
    #[cfg(test)]
    pub fn first_text(&self) -> &str {
        self.content.first().map_or("", |item| item.text.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;
    use serde_json::json;

    #[test]
    fn success_renders_compact_json() {
        let response = Outcome::created(json!({ "user_id": "u1", "blocked": false })).into_response();

        assert_eq!(response.first_text(), r#"{"user_id":"u1","blocked":false}"#);
        assert!(!response.is_error);
    }

    #[test]
    fn remote_body_text_is_kept_verbatim() {
        let body = r#"{"user_id":"u1","email":"a@b.com","created_at":"x","identities":[{"provider":"auth0"}]}"#;

        let response = Outcome::created(serde_json::from_str(body).unwrap()).into_response();

        assert_eq!(response.first_text(), body);
    }

    #[test]
    fn failure_is_prefixed_and_flagged() {
        let response = Outcome::Failure("Unauthorized".into()).into_response();

        assert_eq!(response.first_text(), "Error: Unauthorized");
        assert!(response.is_error);
    }

    #[test]
    fn envelope_wire_shape() {
        let response = Outcome::Empty("No logs found.".into()).into_response();

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({ "content": [{ "type": "text", "text": "No logs found." }], "isError": false })
        );
    }

    #[rstest]
    #[case(None)]
    #[case(Some(Value::Null))]
    #[case(Some(json!({})))]
    fn found_reports_absence(#[case] resource: Option<Value>) {
        assert_eq!(
            Outcome::found(resource, "No log found with this ID."),
            Outcome::Empty("No log found with this ID.".into())
        );
    }

    #[rstest]
    #[case(json!({ "data": [] }), true)]
    #[case(json!({ "data": { "users": [], "total": 0 } }), true)]
    #[case(json!({ "users": [], "total": 0, "start": 0 }), true)]
    #[case(json!([]), true)]
    #[case(json!({ "data": [{ "id": "u1" }] }), false)]
    #[case(json!({ "data": { "users": [{ "id": "u1" }], "total": 1 } }), false)]
    #[case(json!({ "unexpected": true }), false)]
    fn listed_detects_empty_pages(#[case] page: Value, #[case] empty: bool) {
        let outcome = Outcome::listed(page, "users", "No users found.");

        assert_eq!(outcome == Outcome::Empty("No users found.".into()), empty);
    }

    #[test]
    fn deleted_honours_acknowledgement() {
        assert_eq!(
            Outcome::deleted(true, "Client deleted successfully.", "No client found with this ID."),
            Outcome::confirmed("Client deleted successfully.")
        );
        assert_eq!(
            Outcome::deleted(false, "Client deleted successfully.", "No client found with this ID."),
            Outcome::Empty("No client found with this ID.".into())
        );
    }
}
