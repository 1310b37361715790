//! Remote resource gateway: the boundary between controllers and the API.

pub mod http;

use async_trait::async_trait;
use serde_json::Value;

use crate::error::{ConsoleError, ConsoleResult};
use crate::resource::descriptor::EntityDescriptor;
use crate::resource::payload::TransferPayload;
use crate::types::RecordId;

pub use http::HttpGateway;

/// Acknowledgement of a create, update or delete
#[derive(Debug, Clone, PartialEq)]
pub struct WriteAck {
    pub id: Option<RecordId>,
    pub message: Option<String>,
}

impl WriteAck {
    /// Interpret a write response body. An explicit `success: false` is a
    /// rejection even on a 2xx status; bodies without a `success` flag are
    /// accepted as-is.
    pub fn from_body(body: &Value) -> ConsoleResult<Self> {
        let message = body
            .get("error")
            .or_else(|| body.get("message"))
            .and_then(Value::as_str)
            .map(str::to_string);

        if body.get("success").is_some_and(|s| s == &Value::Bool(false)) {
            return Err(ConsoleError::rejected(
                message.unwrap_or_else(|| "Something went wrong".to_string()),
            ));
        }

        Ok(Self {
            id: body.get("id").and_then(RecordId::from_value),
            message,
        })
    }
}

#[async_trait]
pub trait ResourceGateway: Send + Sync {
    /// Fetch the raw collection body, optionally scoped to a parent record
    async fn read(&self, entity: &EntityDescriptor, scope: Option<&RecordId>) -> ConsoleResult<Value>;

    async fn create(&self, entity: &EntityDescriptor, payload: TransferPayload) -> ConsoleResult<WriteAck>;

    /// Updates travel as a POST carrying the id and the `_method=PUT` marker
    async fn update(
        &self,
        entity: &EntityDescriptor,
        id: &RecordId,
        payload: TransferPayload,
    ) -> ConsoleResult<WriteAck>;

    async fn delete(&self, entity: &EntityDescriptor, id: &RecordId) -> ConsoleResult<WriteAck>;

    /// Absolute URL for a stored attachment path
    fn asset_url(&self, path: &str) -> String;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn ack_accepts_plain_and_successful_bodies() {
        let ack = WriteAck::from_body(&json!({"success": true, "id": "12"})).unwrap();
        assert_eq!(ack.id, Some(RecordId::from(12)));
        assert!(WriteAck::from_body(&Value::Null).unwrap().id.is_none());
    }

    #[test]
    fn ack_rejects_success_false() {
        let err = WriteAck::from_body(&json!({"success": false, "error": "Duplicate email"})).unwrap_err();
        assert_eq!(err.to_string(), "Server rejected request: Duplicate email");
        let err = WriteAck::from_body(&json!({"success": false})).unwrap_err();
        assert!(err.to_string().ends_with("Something went wrong"));
    }
}
