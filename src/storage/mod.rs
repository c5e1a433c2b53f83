// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Durable client storage (the browser `localStorage` equivalent).
//!
//! Storage is a flat string-to-string map shared by every open client
//! ("tab") of the same profile. Writes made through one handle are announced
//! to the other handles as [`StorageEvent`]s, never to the writer itself.

pub mod local;

pub use local::LocalStorage;

use tokio::sync::broadcast;

/// Storage keys as constants.
pub mod keys {
    /// Serialized session user (JSON)
    pub const CURRENT_USER: &str = "currentUser";
    /// Opaque credential token
    pub const AUTH_TOKEN: &str = "authToken";
    /// Session-scoped landing animation flag
    pub const ANIMATION_PLAYED: &str = "logo-animation-played";
}

/// Storage layer errors.
#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Storage file is not valid JSON: {0}")]
    Json(#[from] serde_json::Error),
}

/// One key change within a batch. `None` removes the key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageChange {
    pub key: String,
    pub value: Option<String>,
}

impl StorageChange {
    pub fn set(key: &str, value: impl Into<String>) -> Self {
        Self {
            key: key.to_string(),
            value: Some(value.into()),
        }
    }

    pub fn remove(key: &str) -> Self {
        Self {
            key: key.to_string(),
            value: None,
        }
    }
}

/// Notification that another handle changed a key.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageEvent {
    pub key: String,
    pub old_value: Option<String>,
    pub new_value: Option<String>,
}

/// Key-value storage that survives restarts.
pub trait ClientStorage: Send + Sync {
    /// Read a key. Absent keys are `None`.
    fn get(&self, key: &str) -> Option<String>;

    /// Read several keys from one consistent state: no batch applied by
    /// another handle lands between the reads.
    fn get_many(&self, keys: &[&str]) -> Vec<Option<String>> {
        keys.iter().map(|key| self.get(key)).collect()
    }

    /// Apply all changes, then announce them. Either every change is
    /// written or the call fails.
    fn apply(&self, changes: Vec<StorageChange>) -> Result<(), StorageError>;

    fn set(&self, key: &str, value: &str) -> Result<(), StorageError> {
        self.apply(vec![StorageChange::set(key, value)])
    }

    fn remove(&self, key: &str) -> Result<(), StorageError> {
        self.apply(vec![StorageChange::remove(key)])
    }
}

/// Source of "key changed elsewhere" notifications.
pub trait StorageEventSource: Send + Sync {
    fn subscribe(&self) -> StorageSubscription;
}

/// Event as broadcast on the shared channel, tagged with the writing handle.
#[derive(Debug, Clone)]
pub(crate) struct Envelope {
    pub(crate) origin: u64,
    pub(crate) event: StorageEvent,
}

/// What a subscription delivers next.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageNotice {
    /// Another handle changed a key.
    Changed(StorageEvent),
    /// The subscriber fell behind and this many events were dropped; any key
    /// may have changed since the last delivered event.
    Lagged(u64),
}

/// Receiving end of a [`StorageEventSource`]. Events written by the
/// subscribing handle itself are filtered out.
pub struct StorageSubscription {
    rx: broadcast::Receiver<Envelope>,
    origin: u64,
}

impl StorageSubscription {
    pub(crate) fn new(rx: broadcast::Receiver<Envelope>, origin: u64) -> Self {
        Self { rx, origin }
    }

    /// Wait for the next foreign event or lag report. `None` once the
    /// storage is gone.
    pub async fn next_notice(&mut self) -> Option<StorageNotice> {
        loop {
            match self.rx.recv().await {
                Ok(envelope) if envelope.origin == self.origin => continue,
                Ok(envelope) => return Some(StorageNotice::Changed(envelope.event)),
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Storage listener lagged; events dropped");
                    return Some(StorageNotice::Lagged(skipped));
                }
                Err(broadcast::error::RecvError::Closed) => return None,
            }
        }
    }

    /// Wait for the next foreign event, skipping lag reports. `None` once
    /// the storage is gone.
    pub async fn recv(&mut self) -> Option<StorageEvent> {
        loop {
            if let StorageNotice::Changed(event) = self.next_notice().await? {
                return Some(event);
            }
        }
    }
}
