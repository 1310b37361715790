//! Static per-entity configuration driving the generic controller.

use serde_json::Value;

use crate::config::UploadConfig;
use crate::error::{ConsoleError, ConsoleResult};
use crate::resource::draft::PendingFile;

/// When a field must be filled before submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    Always,
    /// Required when creating, optional when editing (blank values are then
    /// left out of the payload, e.g. a user's password)
    OnCreate,
    Never,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    /// Structured value, sent as JSON text in multipart bodies
    Json,
}

/// Shape a non-blank value must have before submit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldFormat {
    Email,
    /// Digits only, at least 1
    PositiveInteger,
}

impl FieldFormat {
    /// Error message for a value that does not match
    pub fn check(&self, value: &Value) -> Option<&'static str> {
        match self {
            FieldFormat::Email => {
                let text = value.as_str().map(str::trim).unwrap_or_default();
                (!is_email(text)).then_some("Enter a valid email address")
            }
            FieldFormat::PositiveInteger => {
                let valid = match value {
                    Value::Number(n) => n.as_u64().is_some_and(|n| n >= 1),
                    Value::String(s) => {
                        let s = s.trim();
                        !s.is_empty()
                            && s.bytes().all(|b| b.is_ascii_digit())
                            && !s.trim_start_matches('0').is_empty()
                    }
                    _ => false,
                };
                (!valid).then_some("Enter a whole number of at least 1")
            }
        }
    }
}

/// `local@domain` with no whitespace and a non-empty label on each side of
/// every dot in the domain
fn is_email(text: &str) -> bool {
    let Some((local, domain)) = text.split_once('@') else {
        return false;
    };
    !local.is_empty()
        && !domain.is_empty()
        && !domain.contains('@')
        && !text.chars().any(char::is_whitespace)
        && domain.split('.').all(|label| !label.is_empty())
}

/// Fixed option set normalised case-insensitively on edit-open
#[derive(Debug, Clone)]
pub struct Choices {
    pub options: &'static [&'static str],
    pub fallback: &'static str,
}

impl Choices {
    pub fn normalize(&self, raw: &str) -> String {
        let raw = raw.trim();
        if raw.is_empty() {
            return String::new();
        }
        self.options
            .iter()
            .find(|option| option.eq_ignore_ascii_case(raw))
            .unwrap_or(&self.fallback)
            .to_string()
    }
}

#[derive(Debug, Clone)]
pub struct FieldSpec {
    pub name: &'static str,
    pub requirement: Requirement,
    pub kind: FieldKind,
    /// Disabled while editing; never sent with an update
    pub locked_on_edit: bool,
    pub choices: Option<Choices>,
    pub format: Option<FieldFormat>,
}

impl FieldSpec {
    pub fn required(name: &'static str) -> Self {
        Self {
            name,
            requirement: Requirement::Always,
            kind: FieldKind::Text,
            locked_on_edit: false,
            choices: None,
            format: None,
        }
    }

    pub fn optional(name: &'static str) -> Self {
        Self {
            requirement: Requirement::Never,
            ..Self::required(name)
        }
    }

    pub fn on_create(name: &'static str) -> Self {
        Self {
            requirement: Requirement::OnCreate,
            ..Self::required(name)
        }
    }

    pub fn json(mut self) -> Self {
        self.kind = FieldKind::Json;
        self
    }

    pub fn locked_on_edit(mut self) -> Self {
        self.locked_on_edit = true;
        self
    }

    pub fn choices(mut self, options: &'static [&'static str], fallback: &'static str) -> Self {
        self.choices = Some(Choices { options, fallback });
        self
    }

    pub fn format(mut self, format: FieldFormat) -> Self {
        self.format = Some(format);
        self
    }

    /// Value a fresh draft starts with
    pub fn default_value(&self) -> Value {
        match self.kind {
            FieldKind::Text => Value::String(String::new()),
            FieldKind::Json => Value::Array(Vec::new()),
        }
    }

    pub fn is_required(&self, editing: bool) -> bool {
        if editing && self.locked_on_edit {
            return false;
        }
        match self.requirement {
            Requirement::Always => true,
            Requirement::OnCreate => !editing,
            Requirement::Never => false,
        }
    }
}

/// How the boolean status travels on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StatusEncoding {
    /// `"1"` / `"0"`
    Text,
    /// `1` / `0`
    Numeric,
}

impl StatusEncoding {
    pub fn encode(&self, status: bool) -> Value {
        match (self, status) {
            (StatusEncoding::Text, true) => Value::from("1"),
            (StatusEncoding::Text, false) => Value::from("0"),
            (StatusEncoding::Numeric, true) => Value::from(1),
            (StatusEncoding::Numeric, false) => Value::from(0),
        }
    }
}

#[derive(Debug, Clone)]
pub struct StatusSpec {
    pub field: &'static str,
    pub encoding: StatusEncoding,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadEncoding {
    Multipart,
    Json,
}

/// Allowed MIME types and maximum size for uploaded files
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AttachmentPolicy {
    pub allowed_types: Vec<String>,
    pub max_bytes: u64,
}

impl AttachmentPolicy {
    pub fn new(allowed_types: &[&str], max_bytes: u64) -> Self {
        Self {
            allowed_types: allowed_types.iter().map(|s| s.to_string()).collect(),
            max_bytes,
        }
    }

    pub fn from_config(upload: &UploadConfig) -> Self {
        Self {
            allowed_types: upload.allowed_types.clone(),
            max_bytes: upload.max_bytes,
        }
    }

    pub fn check(&self, file: &PendingFile) -> ConsoleResult<()> {
        let mime = file.mime_type.to_ascii_lowercase();
        if !self.allowed_types.is_empty() && !self.allowed_types.iter().any(|t| *t == mime) {
            let kinds = self
                .allowed_types
                .iter()
                .map(|t| t.rsplit('/').next().unwrap_or(t))
                .collect::<Vec<_>>()
                .join(", ");
            return Err(ConsoleError::attachment_rejected(format!(
                "Only {} files are allowed (got {})",
                kinds, file.mime_type
            )));
        }
        if file.size() > self.max_bytes {
            return Err(ConsoleError::attachment_rejected(format!(
                "File size should not exceed {} MB",
                format_megabytes(self.max_bytes)
            )));
        }
        Ok(())
    }
}

fn format_megabytes(bytes: u64) -> String {
    let mb = bytes as f64 / (1024.0 * 1024.0);
    if mb.fract() == 0.0 {
        format!("{}", mb as u64)
    } else {
        format!("{:.1}", mb)
    }
}

#[derive(Debug, Clone)]
pub struct AttachmentSpec {
    /// Multipart field carrying the binary
    pub upload_field: &'static str,
    /// Record field holding the stored relative path
    pub stored_field: &'static str,
    /// Form field echoing the stored path back when no new file is chosen
    pub existing_field: Option<&'static str>,
    pub policy: Option<AttachmentPolicy>,
}

#[derive(Debug, Clone)]
pub struct EntityDescriptor {
    pub name: &'static str,
    /// Key of the named-collection response shape
    pub plural: &'static str,
    pub endpoint: &'static str,
    /// Console route listing this entity, if it has its own screen
    pub route: Option<&'static str>,
    pub fields: Vec<FieldSpec>,
    pub status: Option<StatusSpec>,
    pub attachment: Option<AttachmentSpec>,
    pub encoding: PayloadEncoding,
    /// Query parameter scoping reads to a parent record
    pub scope_param: Option<&'static str>,
}

impl EntityDescriptor {
    pub fn new(name: &'static str, plural: &'static str, endpoint: &'static str) -> Self {
        Self {
            name,
            plural,
            endpoint,
            route: None,
            fields: Vec::new(),
            status: Some(StatusSpec {
                field: "status",
                encoding: StatusEncoding::Text,
            }),
            attachment: None,
            encoding: PayloadEncoding::Multipart,
            scope_param: None,
        }
    }

    pub fn route(mut self, route: &'static str) -> Self {
        self.route = Some(route);
        self
    }

    pub fn field(mut self, field: FieldSpec) -> Self {
        self.fields.push(field);
        self
    }

    pub fn status(mut self, encoding: StatusEncoding) -> Self {
        self.status = Some(StatusSpec {
            field: "status",
            encoding,
        });
        self
    }

    /// Status is not a boolean toggle for this entity
    pub fn without_status(mut self) -> Self {
        self.status = None;
        self
    }

    pub fn attachment(mut self, spec: AttachmentSpec) -> Self {
        self.attachment = Some(spec);
        self
    }

    pub fn json_body(mut self) -> Self {
        self.encoding = PayloadEncoding::Json;
        self
    }

    pub fn scoped_by(mut self, param: &'static str) -> Self {
        self.scope_param = Some(param);
        self
    }

    pub fn field_spec(&self, name: &str) -> Option<&FieldSpec> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn status_field(&self) -> Option<&'static str> {
        self.status.as_ref().map(|s| s.field)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn image_policy() -> AttachmentPolicy {
        AttachmentPolicy::new(&["image/png", "image/jpeg", "image/jpg", "image/gif"], 2 * 1024 * 1024)
    }

    #[test]
    fn policy_rejects_oversized_file() {
        let file = PendingFile::new("big.png", "image/png", vec![0u8; 3 * 1024 * 1024]);
        let err = image_policy().check(&file).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(err.to_string(), "File size should not exceed 2 MB");
    }

    #[test]
    fn policy_rejects_wrong_type() {
        let file = PendingFile::new("doc.pdf", "application/pdf", vec![1, 2, 3]);
        let err = image_policy().check(&file).unwrap_err();
        assert!(err.to_string().starts_with("Only png, jpeg, jpg, gif files are allowed"));
    }

    #[test]
    fn policy_accepts_small_image_any_case() {
        let file = PendingFile::new("a.PNG", "IMAGE/PNG", vec![0u8; 1024]);
        assert!(image_policy().check(&file).is_ok());
    }

    #[test]
    fn choices_normalize_case_insensitively() {
        let gender = FieldSpec::required("gender").choices(&["Male", "Female", "Other"], "Other");
        let choices = gender.choices.unwrap();
        assert_eq!(choices.normalize(" male "), "Male");
        assert_eq!(choices.normalize("FEMALE"), "Female");
        assert_eq!(choices.normalize("nonbinary"), "Other");
        assert_eq!(choices.normalize(""), "");
    }

    #[test]
    fn email_format() {
        let email = FieldFormat::Email;
        assert_eq!(email.check(&json!("sam@example.com")), None);
        assert_eq!(email.check(&json!(" sam@mail.example.org ")), None);
        for bad in ["not-an-email", "@example.com", "sam@", "sam@@example.com", "sam@example..com", "s am@x.io"] {
            assert!(email.check(&json!(bad)).is_some(), "{bad}");
        }
        assert!(email.check(&json!(42)).is_some());
    }

    #[test]
    fn positive_integer_format() {
        let count = FieldFormat::PositiveInteger;
        for ok in [json!("1"), json!("30"), json!(" 007 "), json!(12)] {
            assert_eq!(count.check(&ok), None, "{ok}");
        }
        for bad in [json!("0"), json!("000"), json!("-3"), json!("2.5"), json!("ten"), json!(0), json!(1.5)] {
            assert!(count.check(&bad).is_some(), "{bad}");
        }
    }

    #[test]
    fn requirement_depends_on_mode() {
        let password = FieldSpec::on_create("password");
        assert!(password.is_required(false));
        assert!(!password.is_required(true));

        let email = FieldSpec::required("email").locked_on_edit();
        assert!(email.is_required(false));
        assert!(!email.is_required(true));
    }
}
