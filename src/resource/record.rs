use serde::Serialize;
use serde_json::{Map, Value};

use crate::resource::descriptor::EntityDescriptor;
use crate::types::RecordId;

/// Normalise a wire status. `1`, `"1"` and `true` are on; everything else,
/// including `0`, `"0"`, `false`, null and a missing field, is off.
pub fn normalize_status(value: Option<&Value>) -> bool {
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_i64() == Some(1) || n.as_f64() == Some(1.0),
        Some(Value::String(s)) => s == "1",
        _ => false,
    }
}

/// One persisted item of a managed content type
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct EntityRecord {
    pub id: Option<RecordId>,
    /// Raw fields as the server sent them
    pub fields: Map<String, Value>,
    pub status: bool,
    /// Stored relative path of the attachment, resolved against the API base
    pub attachment: Option<String>,
}

impl EntityRecord {
    pub fn from_row(row: Map<String, Value>, descriptor: &EntityDescriptor) -> Self {
        let id = row.get("id").and_then(RecordId::from_value);
        let status = descriptor
            .status_field()
            .map(|field| normalize_status(row.get(field)))
            .unwrap_or(false);
        let attachment = descriptor
            .attachment
            .as_ref()
            .and_then(|spec| row.get(spec.stored_field))
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|path| !path.is_empty())
            .map(str::to_string);

        Self {
            id,
            fields: row,
            status,
            attachment,
        }
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    /// Field as display text; null and missing become empty
    pub fn text(&self, field: &str) -> String {
        match self.fields.get(field) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.clone(),
            Some(other) => other.to_string(),
        }
    }

    pub fn is_persisted(&self) -> bool {
        self.id.is_some()
    }
}

/// The list response shapes the API is known to produce
#[derive(Debug, Clone, PartialEq)]
pub enum CollectionShape {
    Bare(Vec<Value>),
    Data(Vec<Value>),
    Named(Vec<Value>),
    Unrecognized,
}

impl CollectionShape {
    pub fn classify(body: Value, plural: &str) -> Self {
        match body {
            Value::Array(rows) => CollectionShape::Bare(rows),
            Value::Object(mut map) => {
                if let Some(Value::Array(rows)) = map.remove("data") {
                    return CollectionShape::Data(rows);
                }
                if let Some(Value::Array(rows)) = map.remove(plural) {
                    return CollectionShape::Named(rows);
                }
                CollectionShape::Unrecognized
            }
            _ => CollectionShape::Unrecognized,
        }
    }

    pub fn into_rows(self) -> Vec<Value> {
        match self {
            CollectionShape::Bare(rows) | CollectionShape::Data(rows) | CollectionShape::Named(rows) => rows,
            CollectionShape::Unrecognized => Vec::new(),
        }
    }
}

/// Decode a list response into records, in server order. Unknown shapes
/// decode to an empty list; rows that are not objects are skipped.
pub fn decode_collection(body: Value, descriptor: &EntityDescriptor) -> Vec<EntityRecord> {
    let shape = CollectionShape::classify(body, descriptor.plural);
    if shape == CollectionShape::Unrecognized {
        tracing::warn!(
            "Unrecognized list response for '{}', treating as empty",
            descriptor.name
        );
    }

    shape
        .into_rows()
        .into_iter()
        .filter_map(|row| match row {
            Value::Object(map) => Some(EntityRecord::from_row(map, descriptor)),
            other => {
                tracing::warn!("Skipping non-object row in '{}' list: {}", descriptor.name, other);
                None
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::catalog;
    use serde_json::json;

    #[test]
    fn status_normalization_table() {
        for on in [json!(1), json!("1"), json!(true), json!(1.0)] {
            assert!(normalize_status(Some(&on)), "{} should be on", on);
        }
        for off in [json!(0), json!("0"), json!(false), Value::Null, json!("true"), json!(2)] {
            assert!(!normalize_status(Some(&off)), "{} should be off", off);
        }
        assert!(!normalize_status(None));
    }

    #[test]
    fn data_wrapper_decodes_with_status() {
        let sections = catalog::sections();
        let records = decode_collection(json!({"data": [{"id": 1, "status": "1", "file_path": "img/a.png"}]}), &sections);
        assert_eq!(records.len(), 1);
        assert!(records[0].status);
        assert_eq!(records[0].id, Some(RecordId::from(1)));
        assert_eq!(records[0].attachment.as_deref(), Some("img/a.png"));
    }

    #[test]
    fn named_collection_and_fallbacks() {
        let users = catalog::users();
        let records = decode_collection(json!({"users": [{"id": 2}, {"id": 3}]}), &users);
        assert_eq!(records.len(), 2);

        assert!(decode_collection(json!({"rows": []}), &users).is_empty());
        assert!(decode_collection(json!("oops"), &users).is_empty());
        assert!(decode_collection(Value::Null, &users).is_empty());
    }

    #[test]
    fn bare_array_keeps_server_order() {
        let products = catalog::products();
        let records = decode_collection(json!([{"id": 9}, {"id": 2}, 5, {"id": 4}]), &products);
        let ids: Vec<String> = records.iter().map(|r| r.id.as_ref().unwrap().to_string()).collect();
        assert_eq!(ids, vec!["9", "2", "4"]);
    }
}
