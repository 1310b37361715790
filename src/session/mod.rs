//! Session state: the single source of truth for who is signed in.
//!
//! The principal is persisted as JSON under a fixed key so it survives
//! restarts. Consumers register listeners and receive every change in emission
//! order; dropping the returned [`Subscription`] unregisters the listener.

pub mod store;

use std::sync::{Arc, Mutex, PoisonError, Weak};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::types::{deserialize_loose_u8, RecordId};

pub use store::{FileStore, MemoryStore, SessionStore};

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Session storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Session serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("Session storage unavailable: {0}")]
    Unavailable(String),
}

/// The authenticated actor
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Principal {
    pub id: RecordId,
    #[serde(deserialize_with = "deserialize_loose_u8")]
    pub role_id: u8,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub signed_in_at: Option<DateTime<Utc>>,
    /// Any other display fields the API returns with the user
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Principal {
    pub fn new(id: impl Into<RecordId>, role_id: u8) -> Self {
        Self {
            id: id.into(),
            role_id,
            username: None,
            first_name: None,
            last_name: None,
            email: None,
            signed_in_at: None,
            extra: Map::new(),
        }
    }

    /// Name shown in the top bar: full name, then username, then email.
    pub fn display_name(&self) -> String {
        let full = [self.first_name.as_deref(), self.last_name.as_deref()]
            .iter()
            .flatten()
            .map(|s| s.trim())
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(" ");
        if !full.is_empty() {
            return full;
        }
        self.username
            .as_deref()
            .or(self.email.as_deref())
            .map(str::to_string)
            .unwrap_or_else(|| format!("user #{}", self.id))
    }
}

type Listener = Box<dyn FnMut(Option<&Principal>) + Send>;

#[derive(Default)]
struct Listeners {
    next_id: u64,
    entries: Vec<(u64, Listener)>,
}

/// Registration handle returned by [`Session::subscribe`].
#[must_use = "dropping a Subscription unregisters the listener"]
pub struct Subscription {
    id: u64,
    registry: Weak<Mutex<Listeners>>,
}

impl Subscription {
    pub fn unsubscribe(self) {}
}

impl Drop for Subscription {
    fn drop(&mut self) {
        if let Some(registry) = self.registry.upgrade() {
            let mut listeners = registry.lock().unwrap_or_else(PoisonError::into_inner);
            listeners.entries.retain(|(id, _)| *id != self.id);
        }
    }
}

pub struct Session {
    store: Box<dyn SessionStore>,
    key: String,
    current: Option<Principal>,
    listeners: Arc<Mutex<Listeners>>,
}

impl Session {
    /// Hydrate from durable storage. Missing, unreadable or malformed data
    /// yields a signed-out session.
    pub fn hydrate(store: Box<dyn SessionStore>, key: impl Into<String>) -> Self {
        let key = key.into();
        let current = match store.load(&key) {
            Ok(Some(raw)) => match serde_json::from_str::<Principal>(&raw) {
                Ok(principal) => {
                    tracing::debug!("Restored session for principal {}", principal.id);
                    Some(principal)
                }
                Err(e) => {
                    tracing::warn!("Ignoring malformed stored session '{}': {}", key, e);
                    None
                }
            },
            Ok(None) => None,
            Err(e) => {
                tracing::warn!("Could not read stored session '{}': {}", key, e);
                None
            }
        };

        Self {
            store,
            key,
            current,
            listeners: Arc::new(Mutex::new(Listeners::default())),
        }
    }

    pub fn principal(&self) -> Option<&Principal> {
        self.current.as_ref()
    }

    pub fn is_signed_in(&self) -> bool {
        self.current.is_some()
    }

    /// Persist and publish a new principal. A storage failure leaves the
    /// session unchanged and nothing is published.
    pub fn set_principal(&mut self, principal: Principal) -> Result<(), SessionError> {
        let raw = serde_json::to_string(&principal)?;
        self.store.save(&self.key, &raw)?;
        tracing::info!(
            "Signed in as {} (role {})",
            principal.display_name(),
            principal.role_id
        );
        self.current = Some(principal);
        self.publish();
        Ok(())
    }

    /// Erase storage and publish the signed-out state.
    pub fn clear_principal(&mut self) -> Result<(), SessionError> {
        self.store.remove(&self.key)?;
        self.current = None;
        tracing::info!("Session cleared");
        self.publish();
        Ok(())
    }

    /// Register a listener. It is called immediately with the current value,
    /// then once per change, in order.
    pub fn subscribe<F>(&self, listener: F) -> Subscription
    where
        F: FnMut(Option<&Principal>) + Send + 'static,
    {
        let mut listener: Listener = Box::new(listener);
        listener(self.current.as_ref());

        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        let id = listeners.next_id;
        listeners.next_id += 1;
        listeners.entries.push((id, listener));

        Subscription {
            id,
            registry: Arc::downgrade(&self.listeners),
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.listeners
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .entries
            .len()
    }

    fn publish(&self) {
        let mut listeners = self.listeners.lock().unwrap_or_else(PoisonError::into_inner);
        for (_, listener) in listeners.entries.iter_mut() {
            listener(self.current.as_ref());
        }
    }
}
