use std::sync::Arc;

use serde_json::{json, Value};

use crate::cli::OutputFormat;
use crate::config::config;
use crate::error::ConsoleError;
use crate::gateway::{HttpGateway, ResourceGateway};
use crate::resource::catalog;
use crate::resource::descriptor::{EntityDescriptor, FieldKind};
use crate::session::{FileStore, Session};

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let (Some(Value::Object(extra)), Some(object)) = (data, response.as_object_mut()) {
                object.extend(extra);
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output a console error in the appropriate format
pub fn output_error(output_format: &OutputFormat, error: &ConsoleError) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&error.to_json())?);
        }
        OutputFormat::Text => {
            eprintln!("Error: {}", error);
            if let ConsoleError::Validation { field_errors, .. } = error {
                let mut fields: Vec<_> = field_errors.iter().collect();
                fields.sort();
                for (field, message) in fields {
                    eprintln!("  {}: {}", field, message);
                }
            }
        }
    }
    Ok(())
}

/// Error already printed to the user; the binary exits non-zero without
/// printing it again
#[derive(Debug, thiserror::Error)]
#[error("{code}")]
pub struct ErrorReported {
    pub code: &'static str,
}

/// Render a console error with `output_error` and swap it for
/// `ErrorReported`. Other errors pass through untouched.
pub fn report_console_error(output_format: &OutputFormat, error: anyhow::Error) -> anyhow::Error {
    match error.downcast::<ConsoleError>() {
        Ok(console_error) => match output_error(output_format, &console_error) {
            Ok(()) => ErrorReported {
                code: console_error.error_code(),
            }
            .into(),
            Err(e) => e,
        },
        Err(other) => other,
    }
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Hydrate the durable session from the configured directory
pub fn open_session() -> anyhow::Result<Session> {
    let settings = &config().session;
    let store = FileStore::from_config(settings)?;
    Ok(Session::hydrate(Box::new(store), settings.storage_key.clone()))
}

pub fn http_gateway() -> anyhow::Result<Arc<dyn ResourceGateway>> {
    Ok(Arc::new(HttpGateway::new(&config().gateway)?))
}

pub fn resolve_entity(name: &str) -> anyhow::Result<EntityDescriptor> {
    catalog::find(name).ok_or_else(|| ConsoleError::UnknownEntity(name.to_string()).into())
}

/// Parse `name=value`. JSON-typed fields take a JSON value; everything else
/// is kept as text.
pub fn parse_field(descriptor: &EntityDescriptor, raw: &str) -> anyhow::Result<(String, Value)> {
    let (name, value) = raw
        .split_once('=')
        .ok_or_else(|| anyhow::anyhow!("Expected name=value, got '{}'", raw))?;
    let name = name.trim();
    if name.is_empty() {
        return Err(anyhow::anyhow!("Field name is empty in '{}'", raw));
    }

    let value = match descriptor.field_spec(name).map(|f| f.kind) {
        Some(FieldKind::Json) => serde_json::from_str(value)
            .map_err(|e| anyhow::anyhow!("Field '{}' expects JSON: {}", name, e))?,
        _ => Value::String(value.to_string()),
    };
    Ok((name.to_string(), value))
}

/// Parse a boolean status argument
pub fn parse_status_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "on" | "active" | "yes" => Some(true),
        "0" | "false" | "off" | "inactive" | "no" => Some(false),
        _ => None,
    }
}
