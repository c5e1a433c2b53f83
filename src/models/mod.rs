// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Data models for the board client.

pub mod contact;
pub mod session;
pub mod task;
pub mod user;

pub use contact::{Contact, ContactDraft, ContactGroup};
pub use session::Session;
pub use task::{BoardSummary, Priority, StatusColumns, Subtask, Task, TaskDraft, TaskStatus, TaskUpdate};
pub use user::{Credentials, Registration, User};

use serde::{Deserialize, Deserializer};

/// Deserialize an identifier that the backend may send as a number or a
/// string, normalizing it to a string.
pub(crate) fn id_string<'de, D: Deserializer<'de>>(d: D) -> Result<String, D::Error> {
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum RawId {
        Number(u64),
        Text(String),
    }

    Ok(match RawId::deserialize(d)? {
        RawId::Number(n) => n.to_string(),
        RawId::Text(s) => s,
    })
}

/// Same as [`id_string`] for lists of identifiers.
pub(crate) fn id_strings<'de, D: Deserializer<'de>>(d: D) -> Result<Vec<String>, D::Error> {
    #[derive(Deserialize)]
    struct Wrapped(#[serde(deserialize_with = "id_string")] String);

    Ok(Vec::<Wrapped>::deserialize(d)?
        .into_iter()
        .map(|Wrapped(id)| id)
        .collect())
}
