use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};

use async_trait::async_trait;
use serde_json::Value;

use crate::error::ConsoleResult;
use crate::gateway::{ResourceGateway, WriteAck};
use crate::resource::descriptor::EntityDescriptor;
use crate::resource::payload::TransferPayload;
use crate::types::RecordId;

/// Gateway call as recorded by [`ScriptedGateway`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Call {
    Read { scope: Option<String> },
    Create { has_binary: bool },
    Update { id: String, has_binary: bool },
    Delete { id: String },
}

/// In-memory gateway answering from queued responses, in call order.
/// Reads and writes have separate queues; an empty queue answers with an
/// empty list or a bare success.
#[derive(Default)]
pub struct ScriptedGateway {
    reads: Mutex<VecDeque<ConsoleResult<Value>>>,
    writes: Mutex<VecDeque<ConsoleResult<Value>>>,
    calls: Mutex<Vec<Call>>,
    payloads: Mutex<Vec<TransferPayload>>,
}

impl ScriptedGateway {
    pub fn push_read(&self, response: ConsoleResult<Value>) {
        lock(&self.reads).push_back(response);
    }

    pub fn push_write(&self, response: ConsoleResult<Value>) {
        lock(&self.writes).push_back(response);
    }

    pub fn calls(&self) -> Vec<Call> {
        lock(&self.calls).clone()
    }

    pub fn last_payload(&self) -> Option<TransferPayload> {
        lock(&self.payloads).last().cloned()
    }

    fn next_write(&self) -> ConsoleResult<WriteAck> {
        let body = lock(&self.writes)
            .pop_front()
            .unwrap_or_else(|| Ok(Value::Null))?;
        WriteAck::from_body(&body)
    }
}

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

#[async_trait]
impl ResourceGateway for ScriptedGateway {
    async fn read(&self, _entity: &EntityDescriptor, scope: Option<&RecordId>) -> ConsoleResult<Value> {
        lock(&self.calls).push(Call::Read {
            scope: scope.map(ToString::to_string),
        });
        lock(&self.reads)
            .pop_front()
            .unwrap_or_else(|| Ok(Value::Array(Vec::new())))
    }

    async fn create(&self, _entity: &EntityDescriptor, payload: TransferPayload) -> ConsoleResult<WriteAck> {
        lock(&self.calls).push(Call::Create {
            has_binary: payload.has_binary(),
        });
        lock(&self.payloads).push(payload);
        self.next_write()
    }

    async fn update(
        &self,
        _entity: &EntityDescriptor,
        id: &RecordId,
        payload: TransferPayload,
    ) -> ConsoleResult<WriteAck> {
        lock(&self.calls).push(Call::Update {
            id: id.to_string(),
            has_binary: payload.has_binary(),
        });
        lock(&self.payloads).push(payload);
        self.next_write()
    }

    async fn delete(&self, _entity: &EntityDescriptor, id: &RecordId) -> ConsoleResult<WriteAck> {
        lock(&self.calls).push(Call::Delete { id: id.to_string() });
        self.next_write()
    }

    fn asset_url(&self, path: &str) -> String {
        format!("https://api.test/{}", path.trim_start_matches('/'))
    }
}

