use std::path::Path;

use serde_json::{Map, Value};

use crate::resource::descriptor::{EntityDescriptor, FieldKind};
use crate::resource::record::{normalize_status, EntityRecord};
use crate::types::RecordId;

/// A local file chosen for upload
#[derive(Clone, PartialEq, Eq)]
pub struct PendingFile {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl std::fmt::Debug for PendingFile {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingFile")
            .field("file_name", &self.file_name)
            .field("mime_type", &self.mime_type)
            .field("size", &self.bytes.len())
            .finish()
    }
}

impl PendingFile {
    pub fn new(file_name: impl Into<String>, mime_type: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            file_name: file_name.into(),
            mime_type: mime_type.into(),
            bytes,
        }
    }

    /// Read a file from disk without blocking the event loop
    pub async fn read(path: impl AsRef<Path>, mime_type: impl Into<String>) -> std::io::Result<Self> {
        let path = path.as_ref();
        let bytes = tokio::fs::read(path).await?;
        let file_name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "upload".to_string());
        Ok(Self::new(file_name, mime_type, bytes))
    }

    pub fn size(&self) -> u64 {
        self.bytes.len() as u64
    }
}

/// What the form shows in its attachment slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Preview {
    /// Stored attachment, relative to the API base
    Stored(String),
    /// Newly chosen local file
    Local(String),
}

/// In-progress copy of a record held by an open form
#[derive(Debug, Clone, PartialEq)]
pub struct FormDraft {
    pub fields: Map<String, Value>,
    pub status: bool,
    pub pending_file: Option<PendingFile>,
    pub existing_attachment: Option<String>,
}

impl FormDraft {
    /// Field defaults: text empty, structured fields empty, status on
    pub fn blank(descriptor: &EntityDescriptor) -> Self {
        let fields = descriptor
            .fields
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default_value()))
            .collect();

        Self {
            fields,
            status: true,
            pending_file: None,
            existing_attachment: None,
        }
    }

    pub fn from_record(record: &EntityRecord, descriptor: &EntityDescriptor) -> Self {
        let mut draft = Self::blank(descriptor);

        for spec in &descriptor.fields {
            let Some(value) = record.get(spec.name) else {
                continue;
            };
            let value = match (&spec.choices, spec.kind, value) {
                (Some(choices), _, Value::String(raw)) => Value::String(choices.normalize(raw)),
                (_, FieldKind::Json, Value::String(raw)) => {
                    // some endpoints return structured fields still encoded
                    serde_json::from_str(raw).unwrap_or_else(|_| spec.default_value())
                }
                (_, _, Value::Null) => spec.default_value(),
                (_, _, other) => other.clone(),
            };
            draft.fields.insert(spec.name.to_string(), value);
        }

        draft.status = descriptor
            .status_field()
            .map(|field| normalize_status(record.get(field)))
            .unwrap_or(true);
        draft.existing_attachment = record.attachment.clone();
        draft
    }

    /// Prefill the parent scope field of a scoped entity
    pub fn scoped(mut self, param: &str, scope: &RecordId) -> Self {
        self.fields.insert(param.to_string(), scope.to_value());
        self
    }

    pub fn set(&mut self, field: impl Into<String>, value: impl Into<Value>) {
        self.fields.insert(field.into(), value.into());
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.fields.get(field)
    }

    pub fn preview(&self) -> Option<Preview> {
        if let Some(file) = &self.pending_file {
            return Some(Preview::Local(file.file_name.clone()));
        }
        self.existing_attachment.clone().map(Preview::Stored)
    }
}

/// Empty for the purpose of required-field checks
pub fn is_blank(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => true,
        Some(Value::String(s)) => s.trim().is_empty(),
        Some(Value::Array(items)) => items.is_empty(),
        Some(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resource::catalog;
    use serde_json::json;

    fn record(descriptor: &EntityDescriptor, value: Value) -> EntityRecord {
        match value {
            Value::Object(map) => EntityRecord::from_row(map, descriptor),
            _ => unreachable!(),
        }
    }

    #[test]
    fn blank_draft_has_defaults() {
        let team = catalog::team_members();
        let draft = FormDraft::blank(&team);
        assert!(draft.status);
        assert_eq!(draft.get("name"), Some(&json!("")));
        assert_eq!(draft.get("social_links"), Some(&json!([])));
        assert!(draft.preview().is_none());
    }

    #[test]
    fn from_record_normalizes_choice_status_and_json() {
        let employees = catalog::employees();
        let rec = record(
            &employees,
            json!({"id": 3, "name": "Sara", "gender": "female", "status": 0, "profile_image": "uploads/s.png"}),
        );
        let draft = FormDraft::from_record(&rec, &employees);
        assert_eq!(draft.get("gender"), Some(&json!("Female")));
        assert!(!draft.status);
        assert_eq!(draft.preview(), Some(Preview::Stored("uploads/s.png".into())));

        let team = catalog::team_members();
        let rec = record(&team, json!({"id": 1, "social_links": "[{\"icon\":\"x\",\"url\":\"u\"}]"}));
        let draft = FormDraft::from_record(&rec, &team);
        assert_eq!(draft.get("social_links"), Some(&json!([{"icon": "x", "url": "u"}])));
    }

    #[test]
    fn edit_open_status_matches_list_status() {
        let cases = [
            (Some(json!(1)), true),
            (Some(json!("1")), true),
            (Some(json!(true)), true),
            (Some(json!(0)), false),
            (Some(json!("0")), false),
            (Some(json!(false)), false),
            (Some(Value::Null), false),
            (None, false),
        ];

        // testimonials send "1"/"0", products send 1/0
        for descriptor in [catalog::testimonials(), catalog::products()] {
            for (status, expected) in &cases {
                let mut row = json!({"id": 1});
                if let Some(status) = status {
                    row["status"] = status.clone();
                }
                let rec = record(&descriptor, row);
                let draft = FormDraft::from_record(&rec, &descriptor);
                assert_eq!(rec.status, *expected, "{} list {:?}", descriptor.name, status);
                assert_eq!(draft.status, *expected, "{} draft {:?}", descriptor.name, status);
            }
        }
    }

    #[test]
    fn pending_file_wins_preview() {
        let blogs = catalog::blogs();
        let mut draft = FormDraft::blank(&blogs);
        draft.existing_attachment = Some("img/old.png".into());
        draft.pending_file = Some(PendingFile::new("new.png", "image/png", vec![1]));
        assert_eq!(draft.preview(), Some(Preview::Local("new.png".into())));
    }

    #[test]
    fn blank_detection() {
        assert!(is_blank(None));
        assert!(is_blank(Some(&json!("  "))));
        assert!(is_blank(Some(&json!([]))));
        assert!(!is_blank(Some(&json!(0))));
        assert!(!is_blank(Some(&json!("x"))));
    }
}
