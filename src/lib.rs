// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@kernel.org>

//! Taskboard client: session, task-board and contact state for the Kanban
//! board backend.
//!
//! This crate owns the client side of the board: who is signed in (kept in
//! sync across every client sharing one storage area), the task list and
//! its status columns, and contact access. All backend calls carry the
//! stored credential via the token middleware.

pub mod config;
pub mod error;
pub mod middleware;
pub mod models;
pub mod navigation;
pub mod services;
pub mod storage;
pub mod time_utils;
pub mod validation;

use config::Config;
use navigation::Navigator;
use services::{AnimationGate, ApiClient, ContactStore, SessionStore, TaskStore};
use std::sync::Arc;
use storage::{ClientStorage, LocalStorage};

/// Everything one client ("tab") needs, wired together.
pub struct AppContext {
    pub config: Config,
    pub storage: LocalStorage,
    pub api: ApiClient,
    pub session: SessionStore,
    pub tasks: TaskStore,
    pub contacts: ContactStore,
    pub animation: AnimationGate,
    pub navigator: Arc<dyn Navigator>,
}

impl AppContext {
    /// Build the stores over `storage`: restore the session, start the
    /// cross-tab listener and load the task list. Must run inside a Tokio
    /// runtime.
    pub async fn bootstrap(
        config: Config,
        storage: LocalStorage,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let shared: Arc<dyn ClientStorage> = Arc::new(storage.clone());
        let api = ApiClient::new(&config, shared.clone());

        let session = SessionStore::new(api.clone(), shared, &storage, navigator.clone());
        let tasks = TaskStore::load(api.clone()).await;
        let contacts = ContactStore::new(api.clone());
        let animation = AnimationGate::new(Arc::new(LocalStorage::in_memory()));

        tracing::debug!(
            logged_in = session.is_logged_in(),
            tasks = tasks.tasks().len(),
            "Client context ready"
        );

        Self {
            config,
            storage,
            api,
            session,
            tasks,
            contacts,
            animation,
            navigator,
        }
    }
}
