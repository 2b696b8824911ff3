use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::{GuardianError, GuardianResult};

/// Output schema for structured model responses
///
/// A request that carries an `OutputSchema` asks the model to answer with a
/// JSON document of this shape instead of free text. The response is then
/// checked with [`OutputSchema::validate`] before it is deserialized.
///
/// The supported JSON Schema subset is what response constraints need:
/// `type`, `properties`, `required`, `items`, `enum`, `minimum`, `maximum`.
///
/// # Examples
///
/// ```rust
/// use guardian_core::schema::OutputSchema;
/// use serde_json::json;
///
/// let schema = OutputSchema::from_json_schema(json!({
///     "type": "object",
///     "properties": {
///         "verdict": {"type": "string", "enum": ["ok", "block"]}
///     },
///     "required": ["verdict"]
/// }));
///
/// assert!(schema.validate(&json!({"verdict": "ok"})).is_ok());
/// assert!(schema.validate(&json!({"verdict": "maybe"})).is_err());
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputSchema {
    /// JSON Schema definition
    pub schema: Value,

    /// Optional description of what this schema represents
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Whether to use strict mode (enforce exact schema match)
    #[serde(default = "default_strict")]
    pub strict: bool,
}

fn default_strict() -> bool {
    true
}

impl OutputSchema {
    /// Create from a JSON Schema definition
    pub fn from_json_schema(schema: Value) -> Self {
        Self {
            schema,
            description: None,
            strict: true,
        }
    }

    /// Create with description
    pub fn with_description(mut self, desc: impl Into<String>) -> Self {
        self.description = Some(desc.into());
        self
    }

    /// Set strict mode
    pub fn with_strict(mut self, strict: bool) -> Self {
        self.strict = strict;
        self
    }

    /// Validate output against this schema
    pub fn validate(&self, output: &Value) -> GuardianResult<()> {
        if !self.strict {
            return Ok(());
        }
        validate_node(&self.schema, output, "$")
    }

    /// Parse a raw model response and validate it
    pub fn parse_and_validate(&self, raw: &str) -> GuardianResult<Value> {
        let value: Value = serde_json::from_str(raw.trim()).map_err(|e| {
            GuardianError::validation(format!("Response is not valid JSON: {}", e))
        })?;
        self.validate(&value)?;
        Ok(value)
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_i64() || n.is_u64() => "integer",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

fn type_matches(expected: &str, value: &Value) -> bool {
    let actual = type_name(value);
    match expected.to_ascii_lowercase().as_str() {
        // Integers are numbers too
        "number" => actual == "number" || actual == "integer",
        other => other == actual,
    }
}

fn validate_node(schema: &Value, value: &Value, path: &str) -> GuardianResult<()> {
    if let Some(expected) = schema.get("type").and_then(|t| t.as_str()) {
        if !type_matches(expected, value) {
            return Err(GuardianError::validation(format!(
                "Schema validation failed at {}: expected type '{}', got '{}'",
                path,
                expected.to_ascii_lowercase(),
                type_name(value)
            )));
        }
    }

    if let Some(allowed) = schema.get("enum").and_then(|e| e.as_array()) {
        if !allowed.contains(value) {
            return Err(GuardianError::validation(format!(
                "Schema validation failed at {}: {} is not one of {}",
                path,
                value,
                Value::Array(allowed.clone())
            )));
        }
    }

    if let Some(n) = value.as_f64() {
        if let Some(min) = schema.get("minimum").and_then(|m| m.as_f64()) {
            if n < min {
                return Err(GuardianError::validation(format!(
                    "Schema validation failed at {}: {} is below minimum {}",
                    path, n, min
                )));
            }
        }
        if let Some(max) = schema.get("maximum").and_then(|m| m.as_f64()) {
            if n > max {
                return Err(GuardianError::validation(format!(
                    "Schema validation failed at {}: {} is above maximum {}",
                    path, n, max
                )));
            }
        }
    }

    match value {
        Value::Object(map) => {
            if let Some(required) = schema.get("required").and_then(|r| r.as_array()) {
                for field in required.iter().filter_map(|f| f.as_str()) {
                    if !map.contains_key(field) {
                        return Err(GuardianError::validation(format!(
                            "Schema validation failed at {}: missing required field '{}'",
                            path, field
                        )));
                    }
                }
            }
            if let Some(props) = schema.get("properties").and_then(|p| p.as_object()) {
                for (key, prop_schema) in props {
                    if let Some(child) = map.get(key) {
                        validate_node(prop_schema, child, &format!("{}.{}", path, key))?;
                    }
                }
            }
        }
        Value::Array(items) => {
            if let Some(item_schema) = schema.get("items") {
                for (i, item) in items.iter().enumerate() {
                    validate_node(item_schema, item, &format!("{}[{}]", path, i))?;
                }
            }
        }
        _ => {}
    }

    Ok(())
}
