/// Shared types used across the codebase

use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Gateway operations, used for dispatch and logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Operation {
    Read,
    Create,
    Update,
    Delete,
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Operation::Read => "read",
            Operation::Create => "create",
            Operation::Update => "update",
            Operation::Delete => "delete",
        };
        f.write_str(name)
    }
}

/// Opaque record identifier. The API sends ids as JSON numbers or numeric
/// strings depending on the endpoint; both forms compare equal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RecordId {
    Int(i64),
    Text(String),
}

impl RecordId {
    /// Extract an id from a raw JSON value. Numeric strings parse the same
    /// way as `From<&str>`. Null, empty strings, booleans and zero are
    /// treated as "not yet persisted".
    pub fn from_value(value: &Value) -> Option<Self> {
        let id = match value {
            Value::Number(n) => RecordId::Int(n.as_i64()?),
            Value::String(s) if !s.trim().is_empty() => RecordId::from(s.as_str()),
            _ => return None,
        };
        (id != RecordId::Int(0)).then_some(id)
    }

    pub fn to_value(&self) -> Value {
        match self {
            RecordId::Int(n) => Value::from(*n),
            RecordId::Text(s) => Value::from(s.as_str()),
        }
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordId::Int(n) => write!(f, "{}", n),
            RecordId::Text(s) => f.write_str(s),
        }
    }
}

impl PartialEq for RecordId {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (RecordId::Int(a), RecordId::Int(b)) => a == b,
            _ => self.to_string() == other.to_string(),
        }
    }
}

impl Eq for RecordId {}

impl Hash for RecordId {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.to_string().hash(state);
    }
}

impl From<i64> for RecordId {
    fn from(n: i64) -> Self {
        RecordId::Int(n)
    }
}

impl From<&str> for RecordId {
    fn from(s: &str) -> Self {
        match s.trim().parse::<i64>() {
            Ok(n) => RecordId::Int(n),
            Err(_) => RecordId::Text(s.trim().to_string()),
        }
    }
}

/// Deserialize a small integer sent either as a number or a numeric string.
pub fn deserialize_loose_u8<'de, D>(deserializer: D) -> Result<u8, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    match &value {
        Value::Number(n) => n
            .as_u64()
            .and_then(|n| u8::try_from(n).ok())
            .ok_or_else(|| serde::de::Error::custom(format!("integer out of range: {}", n))),
        Value::String(s) => s
            .trim()
            .parse::<u8>()
            .map_err(|_| serde::de::Error::custom(format!("not a small integer: {:?}", s))),
        other => Err(serde::de::Error::custom(format!(
            "expected number or numeric string, got {}",
            other
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn numeric_and_text_ids_compare_equal() {
        assert_eq!(RecordId::from(7), RecordId::from("7"));
        assert_ne!(RecordId::from(7), RecordId::from(8));
    }

    #[test]
    fn from_value_rejects_placeholders() {
        assert_eq!(RecordId::from_value(&json!(12)), Some(RecordId::Int(12)));
        assert_eq!(RecordId::from_value(&json!("12")), Some(RecordId::from(12)));
        assert_eq!(RecordId::from_value(&json!(0)), None);
        assert_eq!(RecordId::from_value(&json!("")), None);
        assert_eq!(RecordId::from_value(&Value::Null), None);
    }

    #[test]
    fn from_value_parses_numeric_strings_like_from_str() {
        for raw in ["07", " 12 ", "abc-1"] {
            assert_eq!(RecordId::from_value(&json!(raw)), Some(RecordId::from(raw)), "{raw}");
        }
        assert_eq!(RecordId::from_value(&json!("07")), Some(RecordId::Int(7)));
        assert_eq!(RecordId::from_value(&json!("0")), None);
        assert_eq!(RecordId::from_value(&json!("abc")), Some(RecordId::Text("abc".into())));
    }
}
