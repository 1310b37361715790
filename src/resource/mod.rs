//! Generic resource management: one controller, configured per entity by a
//! descriptor, drives list loading, the create/edit form, file attachments,
//! guarded deletes and status changes.

pub mod catalog;
pub mod controller;
pub mod descriptor;
pub mod draft;
pub mod payload;
pub mod record;

pub use controller::{LoadOutcome, LoadTicket, ResourceController, SubmitOutcome};
pub use descriptor::{AttachmentPolicy, EntityDescriptor, FieldFormat, FieldSpec, PayloadEncoding, StatusEncoding};
pub use draft::{FormDraft, PendingFile, Preview};
pub use payload::TransferPayload;
pub use record::{normalize_status, EntityRecord};
