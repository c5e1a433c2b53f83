// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session model: the signed-in user plus its credential token.

use super::User;
use crate::storage::{keys, ClientStorage, StorageChange};

/// The current authenticated (or guest) identity.
///
/// The user record and the token live under two storage keys but always
/// travel together: [`Session::storage_changes`] writes both and
/// [`Session::clear_changes`] removes both.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub user: User,
    pub token: String,
}

impl Session {
    pub fn new(user: User, token: impl Into<String>) -> Self {
        Self {
            user,
            token: token.into(),
        }
    }

    /// Rebuild a session from the two persisted slots.
    pub fn from_stored(user_json: &str, token: &str) -> Result<Self, serde_json::Error> {
        Ok(Self {
            user: serde_json::from_str(user_json)?,
            token: token.to_string(),
        })
    }

    /// Read the session currently persisted in `storage`, if both slots are set.
    /// Both slots come from the same storage state.
    pub fn load(storage: &dyn ClientStorage) -> Option<Result<Self, serde_json::Error>> {
        let mut slots = storage
            .get_many(&[keys::CURRENT_USER, keys::AUTH_TOKEN])
            .into_iter();
        let user_json = slots.next().flatten()?;
        let token = slots.next().flatten()?;
        Some(Self::from_stored(&user_json, &token))
    }

    /// Batch that persists this session.
    pub fn storage_changes(&self) -> Result<Vec<StorageChange>, serde_json::Error> {
        Ok(vec![
            StorageChange::set(keys::CURRENT_USER, serde_json::to_string(&self.user)?),
            StorageChange::set(keys::AUTH_TOKEN, self.token.clone()),
        ])
    }

    /// Batch that removes any persisted session.
    pub fn clear_changes() -> Vec<StorageChange> {
        vec![
            StorageChange::remove(keys::CURRENT_USER),
            StorageChange::remove(keys::AUTH_TOKEN),
        ]
    }
}
