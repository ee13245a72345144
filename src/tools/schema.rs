//! Argument validation against capability input schemas.
//!
//! Covers the JSON Schema subset capabilities declare:
//! - `type`: `"object"`, `"string"`, `"number"`, `"integer"`, `"boolean"`,
//!   `"array"`, `"null"` (or a list of them)
//! - `properties` (checked recursively) and `required`
//! - `additionalProperties: false`
//! - `enum`
//! - `items` for arrays
//!
//! Unknown keywords are ignored.

use serde_json::Value;

/// Validate `value` against `schema`, returning the first violation found.
pub fn validate(schema: &Value, value: &Value) -> Result<(), String> {
    validate_at(schema, value, "arguments")
}

fn validate_at(schema: &Value, value: &Value, path: &str) -> Result<(), String> {
    if let Some(expected) = schema.get("type") {
        let allowed: Vec<&str> = match expected {
            Value::String(t) => vec![t.as_str()],
            Value::Array(types) => types.iter().filter_map(Value::as_str).collect(),
            _ => Vec::new(),
        };
        if !allowed.is_empty() && !allowed.iter().any(|t| matches_type(t, value)) {
            return Err(format!(
                "{} must be of type {}, got {}",
                path,
                allowed.join(" | "),
                type_name(value)
            ));
        }
    }

    if let Some(Value::Array(options)) = schema.get("enum") {
        if !options.contains(value) {
            return Err(format!("{} must be one of {}", path, Value::Array(options.clone())));
        }
    }

    if let Value::Object(fields) = value {
        let properties = schema.get("properties").and_then(Value::as_object);

        if let Some(Value::Array(required)) = schema.get("required") {
            for key in required.iter().filter_map(Value::as_str) {
                if !fields.contains_key(key) {
                    return Err(format!("missing required field '{}'", key));
                }
            }
        }

        for (key, field) in fields {
            match properties.and_then(|p| p.get(key)) {
                Some(field_schema) => {
                    validate_at(field_schema, field, &format!("{}.{}", path, key))?
                }
                None => {
                    if schema.get("additionalProperties") == Some(&Value::Bool(false)) {
                        return Err(format!("unexpected field '{}'", key));
                    }
                }
            }
        }
    }

    if let (Value::Array(items), Some(item_schema)) = (value, schema.get("items")) {
        for (i, item) in items.iter().enumerate() {
            validate_at(item_schema, item, &format!("{}[{}]", path, i))?;
        }
    }

    Ok(())
}

fn matches_type(expected: &str, value: &Value) -> bool {
    match expected {
        "object" => value.is_object(),
        "string" => value.is_string(),
        "number" => value.is_number(),
        "integer" => value.is_i64() || value.is_u64(),
        "boolean" => value.is_boolean(),
        "array" => value.is_array(),
        "null" => value.is_null(),
        _ => true,
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(n) if n.is_f64() => "number",
        Value::Number(_) => "integer",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Build an object schema whose properties are all required strings.
pub fn string_fields(fields: &[(&str, &str)]) -> Value {
    let mut properties = serde_json::Map::new();
    for (name, description) in fields {
        properties.insert(
            name.to_string(),
            serde_json::json!({ "type": "string", "description": description }),
        );
    }

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": fields.iter().map(|(name, _)| *name).collect::<Vec<_>>(),
        "additionalProperties": false,
    })
}
