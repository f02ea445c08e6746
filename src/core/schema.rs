/// Declarative Tool Parameter Schemas
///
/// Every tool describes its input as a static table of `Field`s built with
/// `const fn` builders. The same table drives two things:
/// - argument validation before a tool handler runs (`validate`)
/// - the JSON Schema advertised through `tools/list` (`json_schema`)
///
/// Keeping schemas as data means a tool never hand-writes validation
/// branches; adding a parameter is a one-line change to its table.

use serde_json::{json, Map, Value};
use thiserror::Error;

/// Validated tool arguments, restricted to the fields the schema declares.
pub type Arguments = Map<String, Value>;

/// Accepted shape of a single parameter value.
#[derive(Debug, Clone, Copy)]
pub enum Kind {
    String,
    Number,
    Boolean,
    /// String restricted to a fixed set of values.
    Enum(&'static [&'static str]),
    StringArray,
    /// Array whose items are restricted to a fixed set of values.
    EnumArray(&'static [&'static str]),
    /// Nested object with its own field table. Undeclared keys are dropped.
    Object(&'static [Field]),
    /// Free-form JSON object, passed through verbatim.
    Record,
    /// Free-form JSON array, passed through verbatim.
    List,
}

impl Kind {
    fn expected(&self) -> &'static str {
        match self {
            Kind::String | Kind::Enum(_) => "a string",
            Kind::Number => "a number",
            Kind::Boolean => "a boolean",
            Kind::StringArray | Kind::EnumArray(_) => "an array of strings",
            Kind::Object(_) | Kind::Record => "an object",
            Kind::List => "an array",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    Required,
    Optional,
    /// Absent values are replaced by this integer (paging parameters).
    Default(i64),
}

/// One named parameter of a tool's input schema.
#[derive(Debug, Clone, Copy)]
pub struct Field {
    pub name: &'static str,
    pub kind: Kind,
    pub presence: Presence,
    /// Rejects empty strings (or empty arrays) when set.
    pub non_empty: bool,
    pub description: &'static str,
}

impl Field {
    /// A required field of the given kind. Chain `optional()`, `default_integer()`,
    /// `non_empty()` and `describe()` to refine it.
    pub const fn new(name: &'static str, kind: Kind) -> Self {
        Self {
            name,
            kind,
            presence: Presence::Required,
            non_empty: false,
            description: "",
        }
    }

    pub const fn string(name: &'static str) -> Self {
        Self::new(name, Kind::String)
    }

    pub const fn number(name: &'static str) -> Self {
        Self::new(name, Kind::Number)
    }

    pub const fn boolean(name: &'static str) -> Self {
        Self::new(name, Kind::Boolean)
    }

    pub const fn one_of(name: &'static str, allowed: &'static [&'static str]) -> Self {
        Self::new(name, Kind::Enum(allowed))
    }

    pub const fn strings(name: &'static str) -> Self {
        Self::new(name, Kind::StringArray)
    }

    pub const fn object(name: &'static str, fields: &'static [Field]) -> Self {
        Self::new(name, Kind::Object(fields))
    }

    pub const fn optional(self) -> Self {
        Self { presence: Presence::Optional, ..self }
    }

    pub const fn default_integer(self, value: i64) -> Self {
        Self { presence: Presence::Default(value), ..self }
    }

    pub const fn non_empty(self) -> Self {
        Self { non_empty: true, ..self }
    }

    pub const fn describe(self, description: &'static str) -> Self {
        Self { description, ..self }
    }

    fn property(&self) -> Value {
        let mut property = match self.kind {
            Kind::String if self.non_empty => json!({ "type": "string", "minLength": 1 }),
            Kind::String => json!({ "type": "string" }),
            Kind::Number => json!({ "type": "number" }),
            Kind::Boolean => json!({ "type": "boolean" }),
            Kind::Enum(allowed) => json!({ "type": "string", "enum": allowed }),
            Kind::StringArray => json!({ "type": "array", "items": { "type": "string" } }),
            Kind::EnumArray(allowed) => {
                json!({ "type": "array", "items": { "type": "string", "enum": allowed } })
            }
            Kind::Object(fields) => json_schema(fields),
            Kind::Record => json!({ "type": "object", "additionalProperties": {} }),
            Kind::List => json!({ "type": "array" }),
        };
        if let Value::Object(map) = &mut property {
            if let Presence::Default(value) = self.presence {
                map.insert("default".to_string(), Value::from(value));
            }
            if !self.description.is_empty() {
                map.insert("description".to_string(), Value::from(self.description));
            }
        }
        property
    }
}

/// First constraint violated by a set of tool arguments.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("arguments must be a JSON object")]
    NotAnObject,

    #[error("missing required parameter `{0}`")]
    Missing(String),

    #[error("parameter `{path}` must be {expected}")]
    WrongType { path: String, expected: &'static str },

    #[error("parameter `{path}` must be one of: {allowed}")]
    NotAllowed { path: String, allowed: String },

    #[error("parameter `{0}` must not be empty")]
    Empty(String),
}

/// Validate raw tool arguments against a schema table.
///
/// `null` is accepted as "no arguments". Fields are checked in declaration
/// order and the first violation is returned. A `null` field value counts
/// as absent, so defaults still apply to it.
///
/// # Returns
/// The validated arguments: declared fields only, with defaults filled in.
pub fn validate(schema: &[Field], raw: &Value) -> Result<Arguments, ValidationError> {
    match raw {
        Value::Null => validate_object(schema, &Map::new(), None),
        Value::Object(input) => validate_object(schema, input, None),
        _ => Err(ValidationError::NotAnObject),
    }
}

fn validate_object(
    schema: &[Field],
    input: &Map<String, Value>,
    parent: Option<&str>,
) -> Result<Arguments, ValidationError> {
    let mut validated = Map::new();
    for field in schema {
        let path = match parent {
            Some(parent) => format!("{}.{}", parent, field.name),
            None => field.name.to_string(),
        };
        match input.get(field.name).filter(|value| !value.is_null()) {
            Some(value) => {
                validated.insert(field.name.to_string(), check(field, value, &path)?);
            }
            None => match field.presence {
                Presence::Required => return Err(ValidationError::Missing(path)),
                Presence::Optional => {}
                Presence::Default(value) => {
                    validated.insert(field.name.to_string(), Value::from(value));
                }
            },
        }
    }
    Ok(validated)
}

fn check(field: &Field, value: &Value, path: &str) -> Result<Value, ValidationError> {
    let wrong_type = || ValidationError::WrongType {
        path: path.to_string(),
        expected: field.kind.expected(),
    };

    match field.kind {
        Kind::String => {
            let text = value.as_str().ok_or_else(wrong_type)?;
            if field.non_empty && text.is_empty() {
                return Err(ValidationError::Empty(path.to_string()));
            }
        }
        Kind::Number if !value.is_number() => return Err(wrong_type()),
        Kind::Boolean if !value.is_boolean() => return Err(wrong_type()),
        Kind::Enum(allowed) => {
            let text = value.as_str().ok_or_else(wrong_type)?;
            ensure_allowed(allowed, text, path)?;
        }
        Kind::StringArray | Kind::EnumArray(_) => {
            let items = value.as_array().ok_or_else(wrong_type)?;
            if field.non_empty && items.is_empty() {
                return Err(ValidationError::Empty(path.to_string()));
            }
            for item in items {
                let text = item.as_str().ok_or_else(wrong_type)?;
                if let Kind::EnumArray(allowed) = field.kind {
                    ensure_allowed(allowed, text, path)?;
                }
            }
        }
        Kind::Object(fields) => {
            let nested = value.as_object().ok_or_else(wrong_type)?;
            return validate_object(fields, nested, Some(path)).map(Value::Object);
        }
        Kind::Record if !value.is_object() => return Err(wrong_type()),
        Kind::List if !value.is_array() => return Err(wrong_type()),
        Kind::Number | Kind::Boolean | Kind::Record | Kind::List => {}
    }
    Ok(value.clone())
}

fn ensure_allowed(allowed: &[&str], text: &str, path: &str) -> Result<(), ValidationError> {
    if allowed.contains(&text) {
        Ok(())
    } else {
        Err(ValidationError::NotAllowed {
            path: path.to_string(),
            allowed: allowed.join(", "),
        })
    }
}

/// Render a schema table as the JSON Schema object advertised to clients.
pub fn json_schema(schema: &[Field]) -> Value {
    let properties: Map<String, Value> = schema
        .iter()
        .map(|field| (field.name.to_string(), field.property()))
        .collect();
    let required: Vec<&str> = schema
        .iter()
        .filter(|field| field.presence == Presence::Required)
        .map(|field| field.name)
        .collect();

    let mut rendered = json!({
        "type": "object",
        "properties": properties
    });
    if !required.is_empty() {
        rendered["required"] = json!(required);
    }
    rendered
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    const JWT: &[Field] = &[
        Field::number("life_time_in_seconds").optional(),
        Field::one_of("alg", &["HS256", "RS256"]).optional(),
    ];

    const SCHEMA: &[Field] = &[
        Field::string("name").non_empty().describe("Name of the thing."),
        Field::number("page").default_integer(0),
        Field::boolean("sso").optional(),
        Field::strings("callbacks").optional(),
        Field::new("hydrate", Kind::EnumArray(&["flow_count", "links"])).optional(),
        Field::object("jwt_configuration", JWT).optional(),
        Field::new("data", Kind::Record).optional(),
    ];

    #[test]
    fn fills_defaults_and_drops_undeclared_keys() {
        let args = validate(SCHEMA, &json!({ "name": "app", "extra": 1 })).unwrap();

        assert_eq!(Value::Object(args), json!({ "name": "app", "page": 0 }));
    }

    #[test]
    fn null_arguments_are_treated_as_empty() {
        let err = validate(SCHEMA, &Value::Null).unwrap_err();

        assert_eq!(err, ValidationError::Missing("name".to_string()));
    }

    #[test]
    fn null_field_counts_as_absent() {
        let args = validate(SCHEMA, &json!({ "name": "app", "page": null })).unwrap();

        assert_eq!(args["page"], json!(0));
    }

    #[rstest]
    #[case(json!([]), ValidationError::NotAnObject)]
    #[case(json!({ "name": 5 }), ValidationError::WrongType { path: "name".into(), expected: "a string" })]
    #[case(json!({ "name": "" }), ValidationError::Empty("name".into()))]
    #[case(json!({ "name": "a", "page": "1" }), ValidationError::WrongType { path: "page".into(), expected: "a number" })]
    #[case(json!({ "name": "a", "sso": "yes" }), ValidationError::WrongType { path: "sso".into(), expected: "a boolean" })]
    #[case(json!({ "name": "a", "callbacks": ["x", 1] }), ValidationError::WrongType { path: "callbacks".into(), expected: "an array of strings" })]
    #[case(json!({ "name": "a", "hydrate": ["nodes"] }), ValidationError::NotAllowed { path: "hydrate".into(), allowed: "flow_count, links".into() })]
    #[case(json!({ "name": "a", "jwt_configuration": { "alg": "none" } }), ValidationError::NotAllowed { path: "jwt_configuration.alg".into(), allowed: "HS256, RS256".into() })]
    #[case(json!({ "name": "a", "data": [] }), ValidationError::WrongType { path: "data".into(), expected: "an object" })]
    fn reports_first_violation(#[case] raw: Value, #[case] expected: ValidationError) {
        assert_eq!(validate(SCHEMA, &raw).unwrap_err(), expected);
    }

    #[test]
    fn nested_objects_and_records() {
        let raw = json!({
            "name": "app",
            "jwt_configuration": { "alg": "RS256", "unknown": true },
            "data": { "anything": { "goes": [1, 2] } }
        });

        let args = validate(SCHEMA, &raw).unwrap();

        assert_eq!(args["jwt_configuration"], json!({ "alg": "RS256" }));
        assert_eq!(args["data"], json!({ "anything": { "goes": [1, 2] } }));
    }

    #[test]
    fn renders_json_schema() {
        let rendered = json_schema(SCHEMA);

        assert_eq!(rendered["type"], "object");
        assert_eq!(rendered["required"], json!(["name"]));
        assert_eq!(
            rendered["properties"]["name"],
            json!({ "type": "string", "minLength": 1, "description": "Name of the thing." })
        );
        assert_eq!(rendered["properties"]["page"], json!({ "type": "number", "default": 0 }));
        assert_eq!(
            rendered["properties"]["jwt_configuration"]["properties"]["alg"]["enum"],
            json!(["HS256", "RS256"])
        );
        assert!(rendered["properties"]["jwt_configuration"].get("required").is_none());
        // undeclared keys are dropped, not rejected
        assert!(rendered.get("additionalProperties").is_none());
    }
}
