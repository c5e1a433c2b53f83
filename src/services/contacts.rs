// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Contact access. No caching: every read is a fresh fetch.

use super::api::ApiClient;
use crate::error::Result;
use crate::models::{Contact, ContactDraft};
use reqwest::Method;

const CONTACTS_PATH: &str = "contacts/";

/// Contact CRUD over the backend.
#[derive(Clone)]
pub struct ContactStore {
    api: ApiClient,
}

impl ContactStore {
    pub fn new(api: ApiClient) -> Self {
        Self { api }
    }

    /// All contacts. Failures are logged and yield an empty list.
    pub async fn list(&self) -> Vec<Contact> {
        match self.api.get_json(CONTACTS_PATH).await {
            Ok(contacts) => contacts,
            Err(e) => {
                tracing::error!(error = %e, "Error loading contacts");
                Vec::new()
            }
        }
    }

    pub async fn create(&self, contact: &ContactDraft) -> Result<Contact> {
        let created: Contact = self
            .api
            .send_json(Method::POST, CONTACTS_PATH, contact)
            .await?;
        tracing::info!(contact_id = %created.id, "Contact created");
        Ok(created)
    }

    pub async fn update(&self, id: &str, contact: &ContactDraft) -> Result<Contact> {
        self.api
            .send_json(Method::PUT, &contact_path(id), contact)
            .await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.api
            .send_empty::<()>(Method::DELETE, &contact_path(id), None)
            .await
    }
}

fn contact_path(id: &str) -> String {
    format!("{CONTACTS_PATH}{id}/")
}
