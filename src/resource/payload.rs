use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{ConsoleError, ConsoleResult};
use crate::resource::descriptor::{EntityDescriptor, PayloadEncoding, Requirement};
use crate::resource::draft::{is_blank, FormDraft, PendingFile};
use crate::types::RecordId;

/// Form field telling the server to treat a POST as an update
pub const METHOD_OVERRIDE_FIELD: &str = "_method";
pub const METHOD_OVERRIDE_UPDATE: &str = "PUT";

#[derive(Debug, Clone, PartialEq)]
pub struct PayloadFile {
    pub field: String,
    pub file: PendingFile,
}

/// Body of a create or update request
#[derive(Debug, Clone, PartialEq)]
pub struct TransferPayload {
    pub fields: Vec<(String, Value)>,
    pub attachment: Option<PayloadFile>,
    pub encoding: PayloadEncoding,
}

impl TransferPayload {
    pub fn new(encoding: PayloadEncoding) -> Self {
        Self {
            fields: Vec::new(),
            attachment: None,
            encoding,
        }
    }

    /// Set a field, replacing any earlier value with the same name
    pub fn insert(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        let name = name.into();
        let value = value.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.fields.push((name, value)),
        }
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn has_binary(&self) -> bool {
        self.attachment.is_some()
    }

    pub fn is_update(&self) -> bool {
        self.get(METHOD_OVERRIDE_FIELD)
            .and_then(Value::as_str)
            .is_some_and(|m| m == METHOD_OVERRIDE_UPDATE)
    }

    /// Add the record id and the update marker
    pub fn mark_update(&mut self, id: &RecordId) {
        self.insert("id", id.to_value());
        self.insert(METHOD_OVERRIDE_FIELD, METHOD_OVERRIDE_UPDATE);
    }

    /// Fields flattened to text as a multipart form sends them
    pub fn text_fields(&self) -> Vec<(String, String)> {
        self.fields
            .iter()
            .map(|(name, value)| (name.clone(), form_text(value)))
            .collect()
    }

    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self.fields.iter().cloned().collect();
        Value::Object(map)
    }
}

fn form_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        structured => structured.to_string(),
    }
}

/// Required fields that are blank in the draft
pub fn missing_required(descriptor: &EntityDescriptor, draft: &FormDraft, editing: bool) -> Vec<String> {
    descriptor
        .fields
        .iter()
        .filter(|spec| spec.is_required(editing))
        .filter(|spec| is_blank(draft.get(spec.name)))
        .map(|spec| spec.name.to_string())
        .collect()
}

/// Filled fields whose value does not match the field's format, with the
/// message for each. Locked fields are skipped while editing.
pub fn invalid_fields(
    descriptor: &EntityDescriptor,
    draft: &FormDraft,
    editing: bool,
) -> HashMap<String, String> {
    descriptor
        .fields
        .iter()
        .filter(|spec| !(editing && spec.locked_on_edit))
        .filter_map(|spec| {
            let format = spec.format?;
            let value = draft.get(spec.name).filter(|v| !is_blank(Some(v)))?;
            format
                .check(value)
                .map(|message| (spec.name.to_string(), message.to_string()))
        })
        .collect()
}

/// Validate the draft and build the request body for create or update.
pub fn build_payload(
    descriptor: &EntityDescriptor,
    draft: &FormDraft,
    editing_id: Option<&RecordId>,
) -> ConsoleResult<TransferPayload> {
    let editing = editing_id.is_some();
    let missing = missing_required(descriptor, draft, editing);
    if !missing.is_empty() {
        return Err(ConsoleError::missing_fields(&missing));
    }
    let invalid = invalid_fields(descriptor, draft, editing);
    if !invalid.is_empty() {
        return Err(ConsoleError::validation("Invalid field values", invalid));
    }

    let mut payload = TransferPayload::new(descriptor.encoding);

    for spec in &descriptor.fields {
        if editing && spec.locked_on_edit {
            continue;
        }
        let value = draft.get(spec.name).cloned().unwrap_or_else(|| spec.default_value());
        if editing && spec.requirement == Requirement::OnCreate && is_blank(Some(&value)) {
            continue;
        }
        payload.insert(spec.name, value);
    }

    if let Some(status) = &descriptor.status {
        payload.insert(status.field, status.encoding.encode(draft.status));
    }

    if let Some(spec) = &descriptor.attachment {
        match (&draft.pending_file, &draft.existing_attachment) {
            (Some(file), _) => {
                payload.attachment = Some(PayloadFile {
                    field: spec.upload_field.to_string(),
                    file: file.clone(),
                });
            }
            (None, Some(existing)) => {
                if let Some(marker) = spec.existing_field {
                    payload.insert(marker, existing.clone());
                }
            }
            (None, None) => {}
        }
    }

    if let Some(id) = editing_id {
        payload.mark_update(id);
    }

    Ok(payload)
}
