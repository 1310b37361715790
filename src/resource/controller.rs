use std::path::Path;
use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use serde_json::Value;

use crate::error::{ConsoleError, ConsoleResult};
use crate::gateway::ResourceGateway;
use crate::resource::descriptor::EntityDescriptor;
use crate::resource::draft::{FormDraft, PendingFile};
use crate::resource::payload::{build_payload, TransferPayload};
use crate::resource::record::{decode_collection, normalize_status, EntityRecord};
use crate::types::{Operation, RecordId};

/// Identifies one issued read. A result is applied only while its ticket is
/// still the newest for the controller's active scope.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    generation: u64,
    scope: Option<RecordId>,
}

impl LoadTicket {
    pub fn scope(&self) -> Option<&RecordId> {
        self.scope.as_ref()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadOutcome {
    /// The list was replaced with this many records
    Applied(usize),
    /// The result belonged to a scope or request that is no longer current
    Stale,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SubmitOutcome {
    pub operation: Operation,
    pub id: Option<RecordId>,
    /// Whether the follow-up reload succeeded
    pub reloaded: bool,
}

/// Manages one entity collection: list, form, delete and status intents.
pub struct ResourceController {
    descriptor: Arc<EntityDescriptor>,
    gateway: Arc<dyn ResourceGateway>,
    records: Vec<EntityRecord>,
    draft: Option<FormDraft>,
    editing_id: Option<RecordId>,
    delete_intent: Option<RecordId>,
    status_intent: Option<(RecordId, Value)>,
    viewing: Option<RecordId>,
    scope: Option<RecordId>,
    generation: u64,
    is_loading: bool,
}

impl ResourceController {
    pub fn new(descriptor: EntityDescriptor, gateway: Arc<dyn ResourceGateway>) -> Self {
        Self {
            descriptor: Arc::new(descriptor),
            gateway,
            records: Vec::new(),
            draft: None,
            editing_id: None,
            delete_intent: None,
            status_intent: None,
            viewing: None,
            scope: None,
            generation: 0,
            is_loading: false,
        }
    }

    pub fn descriptor(&self) -> &EntityDescriptor {
        &self.descriptor
    }

    pub fn records(&self) -> &[EntityRecord] {
        &self.records
    }

    pub fn record(&self, id: &RecordId) -> Option<&EntityRecord> {
        self.records.iter().find(|r| r.id.as_ref() == Some(id))
    }

    pub fn draft(&self) -> Option<&FormDraft> {
        self.draft.as_ref()
    }

    pub fn is_form_open(&self) -> bool {
        self.draft.is_some()
    }

    pub fn editing_id(&self) -> Option<&RecordId> {
        self.editing_id.as_ref()
    }

    pub fn delete_intent(&self) -> Option<&RecordId> {
        self.delete_intent.as_ref()
    }

    pub fn status_intent(&self) -> Option<(&RecordId, &Value)> {
        self.status_intent.as_ref().map(|(id, value)| (id, value))
    }

    pub fn is_loading(&self) -> bool {
        self.is_loading
    }

    pub fn scope(&self) -> Option<&RecordId> {
        self.scope.as_ref()
    }

    // ---------------- Loading ----------------

    /// Switch the parent scope. The list is cleared, open intents are dropped
    /// and any read still in flight becomes stale.
    pub fn set_scope(&mut self, scope: Option<RecordId>) {
        if self.scope == scope {
            return;
        }
        self.scope = scope;
        self.generation += 1;
        self.records.clear();
        self.is_loading = false;
        self.close_form();
        self.delete_intent = None;
        self.status_intent = None;
        self.viewing = None;
    }

    /// Issue a read for the active scope
    pub fn begin_load(&mut self) -> LoadTicket {
        self.generation += 1;
        self.is_loading = true;
        LoadTicket {
            generation: self.generation,
            scope: self.scope.clone(),
        }
    }

    /// The gateway call for a ticket; borrows nothing from the controller so
    /// several reads can be in flight at once.
    pub fn fetch(&self, ticket: &LoadTicket) -> BoxFuture<'static, ConsoleResult<Value>> {
        let gateway = self.gateway.clone();
        let descriptor = self.descriptor.clone();
        let scope = ticket.scope.clone();
        async move { gateway.read(&descriptor, scope.as_ref()).await }.boxed()
    }

    /// Apply a completed read. Success replaces the list wholesale; failure
    /// leaves it untouched and is returned. Stale results are dropped.
    pub fn apply_load(
        &mut self,
        ticket: LoadTicket,
        result: ConsoleResult<Value>,
    ) -> ConsoleResult<LoadOutcome> {
        if ticket.generation != self.generation || ticket.scope != self.scope {
            tracing::debug!(
                "Discarding stale {} list (scope {:?})",
                self.descriptor.name,
                ticket.scope.as_ref().map(ToString::to_string)
            );
            return Ok(LoadOutcome::Stale);
        }

        self.is_loading = false;
        match result {
            Ok(body) => {
                self.records = decode_collection(body, &self.descriptor);
                tracing::debug!("Loaded {} {}", self.records.len(), self.descriptor.plural);
                Ok(LoadOutcome::Applied(self.records.len()))
            }
            Err(e) => {
                tracing::error!("Failed to load {}: {}", self.descriptor.plural, e);
                Err(e)
            }
        }
    }

    pub async fn load(&mut self) -> ConsoleResult<LoadOutcome> {
        let ticket = self.begin_load();
        let result = self.fetch(&ticket).await;
        self.apply_load(ticket, result)
    }

    pub async fn load_scope(&mut self, scope: RecordId) -> ConsoleResult<LoadOutcome> {
        self.set_scope(Some(scope));
        self.load().await
    }

    // ---------------- Form ----------------

    pub fn open_create(&mut self) {
        self.editing_id = None;
        let mut draft = FormDraft::blank(&self.descriptor);
        if let (Some(param), Some(scope)) = (self.descriptor.scope_param, &self.scope) {
            draft = draft.scoped(param, scope);
        }
        self.draft = Some(draft);
    }

    pub fn open_edit(&mut self, record: &EntityRecord) {
        self.editing_id = record.id.clone();
        self.draft = Some(FormDraft::from_record(record, &self.descriptor));
    }

    /// Open the form for a record already in the list
    pub fn edit(&mut self, id: &RecordId) -> ConsoleResult<()> {
        let record = self
            .record(id)
            .cloned()
            .ok_or_else(|| ConsoleError::RecordNotFound(id.to_string()))?;
        self.open_edit(&record);
        Ok(())
    }

    pub fn close_form(&mut self) {
        self.draft = None;
        self.editing_id = None;
    }

    pub fn set_field(&mut self, field: &str, value: impl Into<Value>) -> ConsoleResult<()> {
        let draft = self.draft.as_mut().ok_or(ConsoleError::FormClosed)?;
        draft.set(field, value);
        Ok(())
    }

    pub fn set_status(&mut self, status: bool) -> ConsoleResult<()> {
        let draft = self.draft.as_mut().ok_or(ConsoleError::FormClosed)?;
        draft.status = status;
        Ok(())
    }

    /// Validate and stage a file for upload. A rejected file leaves the
    /// previous attachment in place. Entities without an attachment slot
    /// refuse every file.
    pub fn attach_file(&mut self, file: PendingFile) -> ConsoleResult<()> {
        let draft = self.draft.as_mut().ok_or(ConsoleError::FormClosed)?;
        let Some(attachment) = self.descriptor.attachment.as_ref() else {
            tracing::warn!("Rejected {} attachment '{}': no attachment slot", self.descriptor.name, file.file_name);
            return Err(ConsoleError::attachment_rejected(format!(
                "{} does not take attachments",
                self.descriptor.plural
            )));
        };
        if let Some(policy) = attachment.policy.as_ref() {
            if let Err(e) = policy.check(&file) {
                tracing::warn!("Rejected {} attachment '{}': {}", self.descriptor.name, file.file_name, e);
                return Err(e);
            }
        }
        draft.existing_attachment = None;
        draft.pending_file = Some(file);
        Ok(())
    }

    pub async fn attach_file_from_path(
        &mut self,
        path: impl AsRef<Path>,
        mime_type: &str,
    ) -> ConsoleResult<()> {
        let path = path.as_ref();
        let file = PendingFile::read(path, mime_type).await.map_err(|e| {
            ConsoleError::attachment_rejected(format!("Could not read {}: {}", path.display(), e))
        })?;
        self.attach_file(file)
    }

    /// The request body the current draft would produce
    pub fn payload(&self) -> ConsoleResult<TransferPayload> {
        let draft = self.draft.as_ref().ok_or(ConsoleError::FormClosed)?;
        build_payload(&self.descriptor, draft, self.editing_id.as_ref())
    }

    /// Create or update from the draft, then reload the list. On failure the
    /// form stays open with the draft intact.
    pub async fn submit(&mut self) -> ConsoleResult<SubmitOutcome> {
        let payload = match self.payload() {
            Ok(payload) => payload,
            Err(e) => {
                tracing::warn!("Cannot submit {}: {}", self.descriptor.name, e);
                return Err(e);
            }
        };

        let (operation, result) = match self.editing_id.clone() {
            Some(id) => (
                Operation::Update,
                self.gateway.update(&self.descriptor, &id, payload).await,
            ),
            None => (Operation::Create, self.gateway.create(&self.descriptor, payload).await),
        };

        let ack = match result {
            Ok(ack) => ack,
            Err(e) => {
                tracing::error!("{} {} failed: {}", self.descriptor.name, operation, e);
                return Err(e);
            }
        };

        let id = ack.id.or_else(|| self.editing_id.clone());
        tracing::info!(
            "{} {} succeeded{}",
            self.descriptor.name,
            operation,
            id.as_ref().map(|id| format!(" (id {})", id)).unwrap_or_default()
        );
        self.close_form();

        let reloaded = match self.load().await {
            Ok(_) => true,
            Err(e) => {
                tracing::warn!("Reload after {} failed: {}", operation, e);
                false
            }
        };

        Ok(SubmitOutcome {
            operation,
            id,
            reloaded,
        })
    }

    // ---------------- Delete ----------------

    pub fn request_delete(&mut self, id: RecordId) {
        self.delete_intent = Some(id);
    }

    pub fn cancel_delete(&mut self) {
        self.delete_intent = None;
    }

    /// Delete the record awaiting confirmation. The intent is cleared whether
    /// or not the server accepts; `Ok(None)` means there was nothing to do.
    pub async fn confirm_delete(&mut self) -> ConsoleResult<Option<RecordId>> {
        let Some(id) = self.delete_intent.take() else {
            return Ok(None);
        };

        match self.gateway.delete(&self.descriptor, &id).await {
            Ok(_) => {
                self.records.retain(|r| r.id.as_ref() != Some(&id));
                if self.viewing.as_ref() == Some(&id) {
                    self.viewing = None;
                }
                tracing::info!("{} {} deleted", self.descriptor.name, id);
                Ok(Some(id))
            }
            Err(e) => {
                tracing::error!("Delete of {} {} failed: {}", self.descriptor.name, id, e);
                Err(e)
            }
        }
    }

    // ---------------- Status changes ----------------

    /// Stage a status change for confirmation (contact workflow labels or a
    /// raw wire value)
    pub fn request_status_change(&mut self, id: RecordId, value: impl Into<Value>) {
        self.status_intent = Some((id, value.into()));
    }

    /// Stage flipping a boolean status
    pub fn request_status_toggle(&mut self, id: &RecordId) -> ConsoleResult<()> {
        let record = self
            .record(id)
            .ok_or_else(|| ConsoleError::RecordNotFound(id.to_string()))?;
        let spec = self
            .descriptor
            .status
            .as_ref()
            .ok_or_else(|| ConsoleError::validation(
                format!("{} has no boolean status", self.descriptor.name),
                Default::default(),
            ))?;
        let value = spec.encoding.encode(!record.status);
        self.status_intent = Some((id.clone(), value));
        Ok(())
    }

    pub fn cancel_status_change(&mut self) {
        self.status_intent = None;
    }

    pub async fn confirm_status_change(&mut self) -> ConsoleResult<Option<RecordId>> {
        let Some((id, value)) = self.status_intent.take() else {
            return Ok(None);
        };

        let field = self.descriptor.status_field().unwrap_or("status");
        let mut payload = TransferPayload::new(self.descriptor.encoding);
        payload.insert(field, value.clone());
        payload.mark_update(&id);

        match self.gateway.update(&self.descriptor, &id, payload).await {
            Ok(_) => {
                let has_bool_status = self.descriptor.status.is_some();
                if let Some(record) = self.records.iter_mut().find(|r| r.id.as_ref() == Some(&id)) {
                    record.fields.insert(field.to_string(), value.clone());
                    if has_bool_status {
                        record.status = normalize_status(Some(&value));
                    }
                }
                tracing::info!("{} {} status set to {}", self.descriptor.name, id, value);
                Ok(Some(id))
            }
            Err(e) => {
                tracing::error!("Status update of {} {} failed: {}", self.descriptor.name, id, e);
                Err(e)
            }
        }
    }

    // ---------------- Detail view ----------------

    pub fn view(&mut self, id: &RecordId) -> ConsoleResult<&EntityRecord> {
        if self.record(id).is_none() {
            return Err(ConsoleError::RecordNotFound(id.to_string()));
        }
        self.viewing = Some(id.clone());
        self.record(id)
            .ok_or_else(|| ConsoleError::RecordNotFound(id.to_string()))
    }

    pub fn viewing(&self) -> Option<&EntityRecord> {
        self.viewing.as_ref().and_then(|id| self.record(id))
    }

    pub fn close_view(&mut self) {
        self.viewing = None;
    }

    /// Absolute URL of a record's attachment
    pub fn attachment_url(&self, record: &EntityRecord) -> Option<String> {
        record.attachment.as_deref().map(|path| self.gateway.asset_url(path))
    }
}
