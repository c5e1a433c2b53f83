// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process storage area, optionally mirrored to a JSON file.

use super::{
    ClientStorage, Envelope, StorageChange, StorageError, StorageEvent, StorageEventSource,
    StorageNotice, StorageSubscription,
};
use dashmap::DashMap;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::broadcast;

const EVENT_CHANNEL_CAPACITY: usize = 64;

/// Storage area shared by all handles.
struct Area {
    entries: DashMap<String, String>,
    events: broadcast::Sender<Envelope>,
    /// When set, the whole map is rewritten here after every batch.
    path: Option<PathBuf>,
    /// Serializes batches so file contents and events stay in write order.
    write_lock: Mutex<()>,
    next_handle: AtomicU64,
}

/// Handle onto a storage area.
///
/// Cloning keeps the same identity (same "tab"); [`LocalStorage::open_tab`]
/// creates a sibling handle whose writes are announced to this one.
#[derive(Clone)]
pub struct LocalStorage {
    area: Arc<Area>,
    handle: u64,
}

impl LocalStorage {
    /// Fresh, empty, memory-only area.
    pub fn in_memory() -> Self {
        Self::with_area(DashMap::new(), None)
    }

    /// Area backed by a JSON file. A missing file starts empty.
    pub fn open(path: impl AsRef<Path>) -> Result<Self, StorageError> {
        let path = path.as_ref().to_path_buf();
        let mut entries = DashMap::new();

        match std::fs::read_to_string(&path) {
            Ok(contents) if !contents.trim().is_empty() => {
                let map: BTreeMap<String, String> = serde_json::from_str(&contents)?;
                entries.extend(map);
            }
            Ok(_) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
            Err(e) => return Err(e.into()),
        }

        tracing::debug!(path = %path.display(), keys = entries.len(), "Opened storage file");
        Ok(Self::with_area(entries, Some(path)))
    }

    fn with_area(entries: DashMap<String, String>, path: Option<PathBuf>) -> Self {
        let (events, _) = broadcast::channel(EVENT_CHANNEL_CAPACITY);
        Self {
            area: Arc::new(Area {
                entries,
                events,
                path,
                write_lock: Mutex::new(()),
                next_handle: AtomicU64::new(1),
            }),
            handle: 0,
        }
    }

    /// New handle onto the same area, as another browser tab would have.
    pub fn open_tab(&self) -> Self {
        Self {
            area: self.area.clone(),
            handle: self.area.next_handle.fetch_add(1, Ordering::Relaxed),
        }
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.area.path.as_deref()
    }

    fn lock_writes(&self) -> std::sync::MutexGuard<'_, ()> {
        self.area
            .write_lock
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn flush(&self) -> Result<(), StorageError> {
        let Some(path) = &self.area.path else {
            return Ok(());
        };

        let snapshot: BTreeMap<String, String> = self
            .area
            .entries
            .iter()
            .map(|entry| (entry.key().clone(), entry.value().clone()))
            .collect();

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        // Write-then-rename so a crash never leaves a torn file.
        let tmp = path.with_extension("json.tmp");
        std::fs::write(&tmp, serde_json::to_vec_pretty(&snapshot)?)?;
        std::fs::rename(&tmp, path)?;
        Ok(())
    }
}

impl ClientStorage for LocalStorage {
    fn get(&self, key: &str) -> Option<String> {
        self.area.entries.get(key).map(|v| v.value().clone())
    }

    fn get_many(&self, keys: &[&str]) -> Vec<Option<String>> {
        let _guard = self.lock_writes();
        keys.iter().map(|key| self.get(key)).collect()
    }

    fn apply(&self, changes: Vec<StorageChange>) -> Result<(), StorageError> {
        let _guard = self.lock_writes();

        let mut events = Vec::with_capacity(changes.len());
        let mut undo = Vec::with_capacity(changes.len());

        for change in changes {
            let old_value = match &change.value {
                Some(value) => self.area.entries.insert(change.key.clone(), value.clone()),
                None => self.area.entries.remove(&change.key).map(|(_, v)| v),
            };
            undo.push((change.key.clone(), old_value.clone()));

            if old_value != change.value {
                events.push(StorageEvent {
                    key: change.key,
                    old_value,
                    new_value: change.value,
                });
            }
        }

        if let Err(e) = self.flush() {
            for (key, old_value) in undo.into_iter().rev() {
                match old_value {
                    Some(value) => {
                        self.area.entries.insert(key, value);
                    }
                    None => {
                        self.area.entries.remove(&key);
                    }
                }
            }
            return Err(e);
        }

        for event in events {
            // No receivers is fine; nobody is listening yet.
            let _ = self.area.events.send(Envelope {
                origin: self.handle,
                event,
            });
        }

        Ok(())
    }
}

impl StorageEventSource for LocalStorage {
    fn subscribe(&self) -> StorageSubscription {
        StorageSubscription::new(self.area.events.subscribe(), self.handle)
    }
}
