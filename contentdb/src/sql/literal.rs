// Literal encoding for generated SQL.
//
// Values are inlined into statement text rather than bound as parameters, and
// escaping covers the single quote only. Everything that renders a value into
// SQL goes through this module so that switching to bound parameters later
// touches one place.

use crate::error::{ContentDbError, Result};
use crate::schema::FieldType;
use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use serde_json::Value;

pub const NULL: &str = "NULL";

/// Single-quote a string, doubling any embedded single quotes.
pub fn quote(value: &str) -> String {
    format!("'{}'", value.replace('\'', "''"))
}

/// Render a column `DEFAULT` literal.
pub fn default_literal(value: &Value) -> String {
    match value {
        Value::Null => NULL.to_string(),
        Value::String(s) => quote(s),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        other => quote(&other.to_string()),
    }
}

/// Render the insert-time literal for one field.
///
/// `value` is `None` when the record has no entry for the field (or holds an
/// explicit JSON null). Every other value is considered present, including
/// empty strings, zero and `false`.
pub fn encode(
    field: &str,
    field_type: &FieldType,
    json_field: bool,
    value: Option<&Value>,
) -> Result<String> {
    let value = value.filter(|v| !v.is_null());

    if json_field {
        return match value {
            Some(v) => Ok(quote(&serde_json::to_string(v)?)),
            None => Ok(NULL.to_string()),
        };
    }

    match field_type.underlying() {
        FieldType::String { .. } => match value {
            Some(v) => Ok(quote(&scalar_text(field, "string", v)?)),
            None => Ok(NULL.to_string()),
        },
        FieldType::Enum(allowed) => match value {
            Some(v) => {
                let text = scalar_text(field, "enum value", v)?;
                if !allowed.is_empty() && !allowed.contains(&text) {
                    return Err(ContentDbError::Conversion {
                        field: field.to_string(),
                        expected: format!("one of {allowed:?}"),
                        found: format!("'{text}'"),
                    });
                }
                Ok(quote(&text))
            }
            None => Ok(NULL.to_string()),
        },
        FieldType::Date => match value {
            Some(v) => {
                let date = parse_date(v).ok_or_else(|| mismatch(field, "date", v))?;
                Ok(quote(&date.format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()))
            }
            None => Ok(NULL.to_string()),
        },
        FieldType::Boolean => match value {
            Some(Value::Bool(b)) => Ok(b.to_string()),
            Some(v) => Err(mismatch(field, "boolean", v)),
            None => Ok("false".to_string()),
        },
        FieldType::Number => match value {
            Some(v) => number_text(field, v),
            None => Ok(NULL.to_string()),
        },
        // Compound types are always json fields; reaching here means the caller
        // classified the field differently, so store it the same way.
        FieldType::Object(_)
        | FieldType::Array(_)
        | FieldType::Record(_)
        | FieldType::Intersection(_) => match value {
            Some(v) => Ok(quote(&serde_json::to_string(v)?)),
            None => Ok(NULL.to_string()),
        },
        FieldType::Custom(name) => Err(ContentDbError::UnsupportedType(name.clone())),
        FieldType::Optional(inner) | FieldType::Default(inner, _) => {
            encode(field, inner, json_field, value)
        }
    }
}

fn scalar_text(field: &str, expected: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        other => Err(mismatch(field, expected, other)),
    }
}

fn number_text(field: &str, value: &Value) -> Result<String> {
    match value {
        Value::Number(n) => Ok(n.to_string()),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(int) = trimmed.parse::<i64>() {
                return Ok(int.to_string());
            }
            match trimmed.parse::<f64>() {
                Ok(float) if float.is_finite() => Ok(float.to_string()),
                _ => Err(mismatch(field, "number", value)),
            }
        }
        other => Err(mismatch(field, "number", other)),
    }
}

fn parse_date(value: &Value) -> Option<DateTime<Utc>> {
    match value {
        Value::String(s) => {
            let s = s.trim();
            if let Ok(date) = DateTime::parse_from_rfc3339(s) {
                return Some(date.with_timezone(&Utc));
            }
            for format in [
                "%Y-%m-%dT%H:%M:%S%.f",
                "%Y-%m-%dT%H:%M:%S",
                "%Y-%m-%d %H:%M:%S%.f",
                "%Y-%m-%d %H:%M:%S",
            ] {
                if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
                    return Some(naive.and_utc());
                }
            }
            NaiveDate::parse_from_str(s, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
                .map(|naive| naive.and_utc())
        }
        Value::Number(n) => n.as_i64().and_then(DateTime::from_timestamp_millis),
        _ => None,
    }
}

fn mismatch(field: &str, expected: &str, value: &Value) -> ContentDbError {
    let found = match value {
        Value::Null => "null".to_string(),
        Value::Bool(b) => format!("boolean {b}"),
        Value::Number(n) => format!("number {n}"),
        Value::String(s) => format!("string '{s}'"),
        Value::Array(_) => "array".to_string(),
        Value::Object(_) => "object".to_string(),
    };
    ContentDbError::Conversion {
        field: field.to_string(),
        expected: expected.to_string(),
        found,
    }
}
