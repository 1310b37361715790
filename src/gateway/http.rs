use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, RequestBuilder};
use serde_json::Value;
use url::Url;

use crate::config::GatewayConfig;
use crate::error::{ConsoleError, ConsoleResult};
use crate::gateway::{ResourceGateway, WriteAck};
use crate::resource::descriptor::{EntityDescriptor, PayloadEncoding};
use crate::resource::payload::TransferPayload;
use crate::types::{Operation, RecordId};

/// Gateway speaking to the PHP endpoints at `{base}/{endpoint}`
#[derive(Debug, Clone)]
pub struct HttpGateway {
    client: Client,
    base_url: String,
    log_requests: bool,
}

impl HttpGateway {
    pub fn new(config: &GatewayConfig) -> ConsoleResult<Self> {
        let base_url = config.base_url.trim_end_matches('/').to_string();
        Url::parse(&base_url)
            .map_err(|e| ConsoleError::transport(format!("Invalid API base URL '{}': {}", base_url, e)))?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self {
            client,
            base_url,
            log_requests: config.enable_request_logging,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn endpoint_url(&self, endpoint: &str, query: Option<(&str, &RecordId)>) -> ConsoleResult<Url> {
        let raw = format!("{}/{}", self.base_url, endpoint.trim_start_matches('/'));
        let mut url = Url::parse(&raw)
            .map_err(|e| ConsoleError::transport(format!("Invalid endpoint URL '{}': {}", raw, e)))?;
        if let Some((param, id)) = query {
            url.query_pairs_mut().append_pair(param, &id.to_string());
        }
        Ok(url)
    }

    fn body(&self, request: RequestBuilder, payload: TransferPayload) -> ConsoleResult<RequestBuilder> {
        match payload.encoding {
            PayloadEncoding::Json => {
                if payload.has_binary() {
                    tracing::warn!("Dropping attachment from JSON-encoded payload");
                }
                Ok(request.json(&payload.to_json()))
            }
            PayloadEncoding::Multipart => {
                let mut form = Form::new();
                for (name, value) in payload.text_fields() {
                    form = form.text(name, value);
                }
                if let Some(attachment) = payload.attachment {
                    let part = Part::bytes(attachment.file.bytes)
                        .file_name(attachment.file.file_name)
                        .mime_str(&attachment.file.mime_type)?;
                    form = form.part(attachment.field, part);
                }
                Ok(request.multipart(form))
            }
        }
    }

    async fn send(
        &self,
        operation: Operation,
        entity: &EntityDescriptor,
        request: RequestBuilder,
    ) -> ConsoleResult<Value> {
        if self.log_requests {
            tracing::debug!("{} {} ({})", operation, entity.endpoint, entity.name);
        }

        let response = request.send().await.map_err(|e| {
            tracing::error!("{} {} failed: {}", operation, entity.name, e);
            ConsoleError::from(e)
        })?;
        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|body| {
                    body.get("error")
                        .or_else(|| body.get("message"))
                        .and_then(Value::as_str)
                        .map(str::to_string)
                })
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            tracing::error!("{} {} returned {}: {}", operation, entity.name, status, message);
            return Err(ConsoleError::server_status(status.as_u16(), message));
        }

        if text.trim().is_empty() {
            return Ok(Value::Null);
        }
        match serde_json::from_str(&text) {
            Ok(body) => Ok(body),
            Err(e) => {
                tracing::warn!("{} {} returned a non-JSON body: {}", operation, entity.name, e);
                Ok(Value::Null)
            }
        }
    }
}

#[async_trait]
impl ResourceGateway for HttpGateway {
    async fn read(&self, entity: &EntityDescriptor, scope: Option<&RecordId>) -> ConsoleResult<Value> {
        let query = match (entity.scope_param, scope) {
            (Some(param), Some(id)) => Some((param, id)),
            _ => None,
        };
        let url = self.endpoint_url(entity.endpoint, query)?;
        self.send(Operation::Read, entity, self.client.get(url)).await
    }

    async fn create(&self, entity: &EntityDescriptor, payload: TransferPayload) -> ConsoleResult<WriteAck> {
        let url = self.endpoint_url(entity.endpoint, None)?;
        let request = self.body(self.client.post(url), payload)?;
        let body = self.send(Operation::Create, entity, request).await?;
        WriteAck::from_body(&body)
    }

    async fn update(
        &self,
        entity: &EntityDescriptor,
        id: &RecordId,
        mut payload: TransferPayload,
    ) -> ConsoleResult<WriteAck> {
        if !payload.is_update() {
            payload.mark_update(id);
        }
        let url = self.endpoint_url(entity.endpoint, None)?;
        let request = self.body(self.client.post(url), payload)?;
        let body = self.send(Operation::Update, entity, request).await?;
        WriteAck::from_body(&body)
    }

    async fn delete(&self, entity: &EntityDescriptor, id: &RecordId) -> ConsoleResult<WriteAck> {
        let url = self.endpoint_url(entity.endpoint, Some(("id", id)))?;
        let body = self.send(Operation::Delete, entity, self.client.delete(url)).await?;
        WriteAck::from_body(&body)
    }

    fn asset_url(&self, path: &str) -> String {
        if path.starts_with("http://") || path.starts_with("https://") {
            return path.to_string();
        }
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn gateway() -> HttpGateway {
        HttpGateway::new(&GatewayConfig {
            base_url: "https://example.com/api/".to_string(),
            timeout_secs: 5,
            enable_request_logging: false,
        })
        .unwrap()
    }

    #[test]
    fn endpoint_urls_carry_query_ids() {
        let gw = gateway();
        let url = gw.endpoint_url("about_items.php", Some(("section_id", &RecordId::from(3)))).unwrap();
        assert_eq!(url.as_str(), "https://example.com/api/about_items.php?section_id=3");
    }

    #[test]
    fn asset_urls_resolve_against_base() {
        let gw = gateway();
        assert_eq!(gw.asset_url("uploads/a.png"), "https://example.com/api/uploads/a.png");
        assert_eq!(gw.asset_url("/uploads/a.png"), "https://example.com/api/uploads/a.png");
        assert_eq!(gw.asset_url("https://cdn.example.com/a.png"), "https://cdn.example.com/a.png");
    }

    #[test]
    fn invalid_base_url_is_rejected() {
        let result = HttpGateway::new(&GatewayConfig {
            base_url: "not a url".to_string(),
            timeout_secs: 5,
            enable_request_logging: false,
        });
        assert!(result.is_err());
    }
}
