//! Dynamic field typing for runtime schema extensions.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde_json::{Number, Value};

use crate::error::CoreError;

/// The closed set of types a schema extension may declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    String,
    Number,
    Boolean,
    Date,
}

impl FieldType {
    pub fn as_str(&self) -> &'static str {
        match self {
            FieldType::String => "string",
            FieldType::Number => "number",
            FieldType::Boolean => "boolean",
            FieldType::Date => "date",
        }
    }
}

impl FromStr for FieldType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "string" => Ok(FieldType::String),
            "number" => Ok(FieldType::Number),
            "boolean" => Ok(FieldType::Boolean),
            "date" => Ok(FieldType::Date),
            other => Err(CoreError::invalid_field_type(format!(
                "'{other}' is not a supported type"
            ))),
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed value for an extension field.
///
/// Stored documents keep plain JSON; this type exists to check extension
/// defaults against their declared type and to derive per-type fallbacks.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    String(String),
    Number(Number),
    Boolean(bool),
    Date(DateTime<Utc>),
}

impl FieldValue {
    /// Interpret a JSON value as the given type.
    pub fn from_json(ty: FieldType, value: &Value) -> Result<Self, CoreError> {
        let parsed = match (ty, value) {
            (FieldType::String, Value::String(s)) => Some(FieldValue::String(s.clone())),
            (FieldType::Number, Value::Number(n)) => Some(FieldValue::Number(n.clone())),
            (FieldType::Boolean, Value::Bool(b)) => Some(FieldValue::Boolean(*b)),
            (FieldType::Date, Value::String(s)) => {
                s.parse::<DateTime<Utc>>().ok().map(FieldValue::Date)
            }
            _ => None,
        };
        parsed.ok_or_else(|| {
            CoreError::invalid_field_type(format!(
                "default value does not conform to declared type '{ty}'"
            ))
        })
    }

    /// Fallback used when an extension is registered without a default.
    pub fn default_for(ty: FieldType) -> Self {
        match ty {
            FieldType::String => FieldValue::String(String::new()),
            FieldType::Number => FieldValue::Number(Number::from(0)),
            FieldType::Boolean => FieldValue::Boolean(false),
            FieldType::Date => FieldValue::Date(Utc::now()),
        }
    }

    pub fn to_json(&self) -> Value {
        match self {
            FieldValue::String(s) => Value::String(s.clone()),
            FieldValue::Number(n) => Value::Number(n.clone()),
            FieldValue::Boolean(b) => Value::Bool(*b),
            FieldValue::Date(dt) => Value::String(dt.to_rfc3339()),
        }
    }

    pub fn field_type(&self) -> FieldType {
        match self {
            FieldValue::String(_) => FieldType::String,
            FieldValue::Number(_) => FieldType::Number,
            FieldValue::Boolean(_) => FieldType::Boolean,
            FieldValue::Date(_) => FieldType::Date,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn parses_the_supported_type_names() {
        assert_eq!("string".parse::<FieldType>().unwrap(), FieldType::String);
        assert_eq!("number".parse::<FieldType>().unwrap(), FieldType::Number);
        assert_eq!("boolean".parse::<FieldType>().unwrap(), FieldType::Boolean);
        assert_eq!("date".parse::<FieldType>().unwrap(), FieldType::Date);
    }

    #[test]
    fn rejects_unknown_type_names() {
        assert!("currency".parse::<FieldType>().is_err());
        // The set is case-sensitive.
        assert!("String".parse::<FieldType>().is_err());
    }

    #[test]
    fn accepts_defaults_matching_the_declared_type() {
        let value = FieldValue::from_json(FieldType::Number, &json!(42)).unwrap();
        assert_eq!(value, FieldValue::Number(Number::from(42)));

        let value = FieldValue::from_json(FieldType::Date, &json!("2026-03-01T08:00:00Z"));
        assert!(value.is_ok());
    }

    #[test]
    fn rejects_defaults_of_the_wrong_type() {
        assert!(FieldValue::from_json(FieldType::Number, &json!("42")).is_err());
        assert!(FieldValue::from_json(FieldType::Boolean, &json!(1)).is_err());
        assert!(FieldValue::from_json(FieldType::Date, &json!("yesterday")).is_err());
    }

    #[test]
    fn derives_per_type_fallbacks() {
        assert_eq!(
            FieldValue::default_for(FieldType::String).to_json(),
            json!("")
        );
        assert_eq!(
            FieldValue::default_for(FieldType::Number).to_json(),
            json!(0)
        );
        assert_eq!(
            FieldValue::default_for(FieldType::Boolean).to_json(),
            json!(false)
        );
        assert_eq!(
            FieldValue::default_for(FieldType::Date).field_type(),
            FieldType::Date
        );
    }
}
