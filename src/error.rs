// Console Error Types
use std::collections::HashMap;

use serde_json::{json, Value};

/// Failures surfaced by the console core. Nothing here is fatal: every variant
/// means "the operation did not happen, try again".
#[derive(Debug, thiserror::Error)]
pub enum ConsoleError {
    // Caught before any network call
    #[error("{message}")]
    Validation {
        message: String,
        field_errors: HashMap<String, String>,
    },

    #[error("{0}")]
    AttachmentRejected(String),

    // Network unreachable, timeout, TLS
    #[error("Transport error: {0}")]
    Transport(String),

    // Non-2xx response
    #[error("Server returned {status}: {message}")]
    ServerStatus { status: u16, message: String },

    // 2xx response carrying `success: false`
    #[error("Server rejected request: {0}")]
    Rejected(String),

    #[error("Could not decode server response: {0}")]
    Decode(String),

    #[error("Unknown entity: {0}")]
    UnknownEntity(String),

    #[error("Record not found: {0}")]
    RecordNotFound(String),

    #[error("No form is open")]
    FormClosed,

    #[error(transparent)]
    Session(#[from] crate::session::SessionError),
}

impl ConsoleError {
    pub fn validation(message: impl Into<String>, field_errors: HashMap<String, String>) -> Self {
        ConsoleError::Validation {
            message: message.into(),
            field_errors,
        }
    }

    pub fn missing_fields(fields: &[String]) -> Self {
        let field_errors = fields
            .iter()
            .map(|f| (f.clone(), "This field is required".to_string()))
            .collect();
        ConsoleError::validation("Missing required fields", field_errors)
    }

    pub fn attachment_rejected(message: impl Into<String>) -> Self {
        ConsoleError::AttachmentRejected(message.into())
    }

    pub fn transport(message: impl Into<String>) -> Self {
        ConsoleError::Transport(message.into())
    }

    pub fn server_status(status: u16, message: impl Into<String>) -> Self {
        ConsoleError::ServerStatus {
            status,
            message: message.into(),
        }
    }

    pub fn rejected(message: impl Into<String>) -> Self {
        ConsoleError::Rejected(message.into())
    }

    pub fn decode(message: impl Into<String>) -> Self {
        ConsoleError::Decode(message.into())
    }

    /// Validation failures keep the form open and never reach the gateway.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            ConsoleError::Validation { .. } | ConsoleError::AttachmentRejected(_)
        )
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ConsoleError::Validation { .. } => "VALIDATION_ERROR",
            ConsoleError::AttachmentRejected(_) => "ATTACHMENT_REJECTED",
            ConsoleError::Transport(_) => "TRANSPORT_ERROR",
            ConsoleError::ServerStatus { .. } => "SERVER_ERROR",
            ConsoleError::Rejected(_) => "REJECTED",
            ConsoleError::Decode(_) => "DECODE_ERROR",
            ConsoleError::UnknownEntity(_) => "UNKNOWN_ENTITY",
            ConsoleError::RecordNotFound(_) => "NOT_FOUND",
            ConsoleError::FormClosed => "FORM_CLOSED",
            ConsoleError::Session(_) => "SESSION_ERROR",
        }
    }

    /// Convert to the JSON shape printed by the CLI
    pub fn to_json(&self) -> Value {
        match self {
            ConsoleError::Validation {
                message,
                field_errors,
            } => json!({
                "error": true,
                "message": message,
                "code": self.error_code(),
                "field_errors": field_errors,
            }),
            _ => json!({
                "error": true,
                "message": self.to_string(),
                "code": self.error_code(),
            }),
        }
    }
}

impl From<reqwest::Error> for ConsoleError {
    fn from(err: reqwest::Error) -> Self {
        if let Some(status) = err.status() {
            return ConsoleError::server_status(status.as_u16(), err.to_string());
        }
        if err.is_decode() {
            return ConsoleError::decode(err.to_string());
        }
        ConsoleError::transport(err.to_string())
    }
}

impl From<serde_json::Error> for ConsoleError {
    fn from(err: serde_json::Error) -> Self {
        ConsoleError::decode(err.to_string())
    }
}

pub type ConsoleResult<T> = Result<T, ConsoleError>;
