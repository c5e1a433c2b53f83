// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Address-book contact model and directory helpers.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Avatar background colors, indexed by a hash of the contact ID.
pub const AVATAR_PALETTE: [&str; 16] = [
    "#FF7A00", "#9327FF", "#6E52FF", "#FC71FF", "#FFBB2B", "#1FD7C1", "#462F8A", "#FF4646",
    "#00BEE8", "#FF5EB3", "#FF745E", "#FFA35E", "#FFC701", "#0038FF", "#C3FF2B", "#FFE62B",
];

/// Contact as held by the client.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Contact {
    /// Backend ID, normalized to text
    #[serde(deserialize_with = "super::id_string")]
    pub id: String,
    pub email: String,
    pub firstname: String,
    #[serde(default, deserialize_with = "blank_as_none")]
    pub lastname: Option<String>,
    pub phone: String,
    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Contact {
    /// "First Last", or just the first name.
    pub fn display_name(&self) -> String {
        match &self.lastname {
            Some(last) => format!("{} {}", self.firstname, last),
            None => self.firstname.clone(),
        }
    }

    /// Avatar initials from the first name field: the first letter, or the
    /// first letters of its first and last words.
    pub fn initials(&self) -> String {
        let words: Vec<&str> = self.firstname.split_whitespace().collect();
        let first_letter = |w: &str| w.chars().next().map(|c| c.to_uppercase().collect::<String>());

        match words.as_slice() {
            [] => String::new(),
            [only] => first_letter(only).unwrap_or_default(),
            [first, .., last] => {
                let mut initials = first_letter(first).unwrap_or_default();
                initials.push_str(&first_letter(last).unwrap_or_default());
                initials
            }
        }
    }

    /// Stable avatar color for this contact.
    pub fn avatar_color(&self) -> &'static str {
        avatar_color(&self.id)
    }
}

/// Palette entry for an ID, using the classic `hash * 31 + code unit`
/// string hash with 32-bit shifts so colors match across clients.
pub fn avatar_color(id: &str) -> &'static str {
    let mut hash: i64 = 0;
    for unit in id.encode_utf16() {
        let shifted = (hash as i32).wrapping_shl(5) as i64;
        hash = i64::from(unit) + (shifted - hash);
    }
    let index = (hash.unsigned_abs() % AVATAR_PALETTE.len() as u64) as usize;
    AVATAR_PALETTE[index]
}

fn blank_as_none<'de, D: serde::Deserializer<'de>>(d: D) -> Result<Option<String>, D::Error> {
    let raw = Option::<String>::deserialize(d)?;
    Ok(raw.filter(|s| !s.trim().is_empty()))
}

/// Contact fields sent on create and update.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ContactDraft {
    pub email: String,
    pub firstname: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lastname: Option<String>,
    pub phone: String,
}

impl From<&Contact> for ContactDraft {
    fn from(contact: &Contact) -> Self {
        Self {
            email: contact.email.clone(),
            firstname: contact.firstname.clone(),
            lastname: contact.lastname.clone(),
            phone: contact.phone.clone(),
        }
    }
}

/// Contacts sharing an initial letter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ContactGroup {
    pub letter: String,
    pub contacts: Vec<Contact>,
}

/// Sort contacts by first name and group them under the uppercase first
/// letter; groups come out in letter order.
pub fn group_by_letter(contacts: &[Contact]) -> Vec<ContactGroup> {
    let mut sorted = contacts.to_vec();
    sorted.sort_by(|a, b| {
        a.firstname
            .to_lowercase()
            .cmp(&b.firstname.to_lowercase())
            .then_with(|| a.firstname.cmp(&b.firstname))
    });

    let mut groups: Vec<ContactGroup> = Vec::new();
    for contact in sorted {
        let letter: String = contact
            .firstname
            .chars()
            .next()
            .map(|c| c.to_uppercase().collect())
            .unwrap_or_default();

        match groups.iter_mut().find(|g| g.letter == letter) {
            Some(group) => group.contacts.push(contact),
            None => groups.push(ContactGroup {
                letter,
                contacts: vec![contact],
            }),
        }
    }
    groups.sort_by(|a, b| a.letter.cmp(&b.letter));
    groups
}
