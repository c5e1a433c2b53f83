// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Task store: the board's task list, mirrored from the backend.
//!
//! The backend is the only authority on task shape. Every mutation is one
//! write followed by one full reload; the client never patches its own copy.
//! Reloads are numbered so a slow, older reload cannot overwrite the result
//! of a newer one.

use super::api::ApiClient;
use crate::error::{ClientError, Result};
use crate::models::{Priority, StatusColumns, Subtask, Task, TaskDraft, TaskStatus, TaskUpdate};
use crate::time_utils::truncate_to_millis;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};
use tokio::sync::watch;

const TASKS_PATH: &str = "tasks/";

// ─── Wire format ─────────────────────────────────────────────────────────────

/// Task as returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct TaskRecord {
    #[serde(deserialize_with = "crate::models::id_string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub category: String,
    pub status: TaskStatus,
    #[serde(default, deserialize_with = "crate::models::id_strings")]
    pub assigned_to: Vec<String>,
    #[serde(default)]
    pub subtasks: Vec<SubtaskRecord>,
    #[serde(default)]
    pub order: Option<i64>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

/// Subtask as returned by the backend.
#[derive(Debug, Clone, Deserialize)]
pub struct SubtaskRecord {
    #[serde(deserialize_with = "crate::models::id_string")]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub completed: bool,
    #[serde(default)]
    pub order: i64,
}

impl From<TaskRecord> for Task {
    fn from(record: TaskRecord) -> Self {
        let mut subtasks = record.subtasks;
        subtasks.sort_by_key(|s| s.order);

        Self {
            id: Some(record.id),
            title: record.title,
            description: record.description,
            due_date: truncate_to_millis(record.due_date),
            priority: record.priority,
            category: record.category,
            status: record.status,
            assigned_to: record.assigned_to,
            subtasks: subtasks
                .into_iter()
                .map(|s| Subtask {
                    id: s.id,
                    title: s.title,
                    completed: s.completed,
                })
                .collect(),
            created_at: truncate_to_millis(record.created_at),
            updated_at: record.updated_at.map(truncate_to_millis),
            order: record.order,
        }
    }
}

/// Subtask as sent to the backend: no ID, position as order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubtaskPayload {
    pub title: String,
    pub completed: bool,
    pub order: usize,
}

fn subtask_payloads(subtasks: &[Subtask]) -> Vec<SubtaskPayload> {
    subtasks
        .iter()
        .enumerate()
        .map(|(position, s)| SubtaskPayload {
            title: s.title.clone(),
            completed: s.completed,
            order: position,
        })
        .collect()
}

/// Write body for create and update. Timestamps are never sent.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct TaskPayload {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none", serialize_with = "serialize_due_date")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub priority: Option<Priority>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<TaskStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub assigned_to: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub subtasks: Option<Vec<SubtaskPayload>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub order: Option<i64>,
}

fn serialize_due_date<S: serde::Serializer>(
    date: &Option<DateTime<Utc>>,
    s: S,
) -> std::result::Result<S::Ok, S::Error> {
    match date {
        Some(d) => crate::time_utils::iso::serialize(d, s),
        None => s.serialize_none(),
    }
}

impl From<&TaskDraft> for TaskPayload {
    fn from(draft: &TaskDraft) -> Self {
        Self {
            title: Some(draft.title.clone()),
            description: Some(draft.description.clone()),
            due_date: Some(draft.due_date),
            priority: Some(draft.priority),
            category: Some(draft.category.clone()),
            status: Some(draft.status),
            assigned_to: Some(draft.assigned_to.clone()),
            subtasks: Some(subtask_payloads(&draft.subtasks)),
            order: draft.order,
        }
    }
}

impl From<&TaskUpdate> for TaskPayload {
    fn from(update: &TaskUpdate) -> Self {
        Self {
            title: update.title.clone(),
            description: update.description.clone(),
            due_date: update.due_date,
            priority: update.priority,
            category: update.category.clone(),
            status: update.status,
            assigned_to: update.assigned_to.clone(),
            subtasks: update.subtasks.as_deref().map(subtask_payloads),
            order: update.order,
        }
    }
}

#[derive(Debug, Deserialize)]
struct CreatedTask {
    #[serde(deserialize_with = "crate::models::id_string")]
    id: String,
}

#[derive(Serialize)]
struct StatusBody {
    status: TaskStatus,
}

#[derive(Serialize)]
struct ToggleSubtaskBody<'a> {
    subtask_id: &'a str,
}

// ─── Store ───────────────────────────────────────────────────────────────────

/// Owner of the board's task list.
pub struct TaskStore {
    api: ApiClient,
    state: watch::Sender<Vec<Task>>,
    /// Last reload ticket handed out.
    issued: AtomicU64,
    /// Ticket of the reload whose result is currently published.
    applied: AtomicU64,
}

impl TaskStore {
    /// Create the store and run the initial load. A failed load leaves an
    /// empty board rather than an error.
    pub async fn load(api: ApiClient) -> Self {
        let store = Self {
            api,
            state: watch::channel(Vec::new()).0,
            issued: AtomicU64::new(0),
            applied: AtomicU64::new(0),
        };
        store.refresh().await;
        store
    }

    /// Receiver that sees every published task list.
    pub fn subscribe(&self) -> watch::Receiver<Vec<Task>> {
        self.state.subscribe()
    }

    /// Receiver of the status-column view, recomputed on every change.
    pub fn watch_columns(&self) -> ColumnsWatch {
        ColumnsWatch {
            rx: self.state.subscribe(),
        }
    }

    /// Snapshot of all tasks.
    pub fn tasks(&self) -> Vec<Task> {
        self.state.borrow().clone()
    }

    /// Snapshot of the status columns.
    pub fn columns(&self) -> StatusColumns {
        StatusColumns::partition(&self.state.borrow())
    }

    /// One task by ID.
    pub fn task(&self, id: &str) -> Option<Task> {
        self.state
            .borrow()
            .iter()
            .find(|t| t.id.as_deref() == Some(id))
            .cloned()
    }

    /// Reload from the backend. Failures are logged and leave an empty list.
    pub async fn refresh(&self) {
        if let Err(e) = self.reload(true).await {
            tracing::error!(error = %e, "Error loading tasks");
        }
    }

    /// Create a task; returns the server-assigned ID.
    pub async fn create(&self, draft: &TaskDraft) -> Result<String> {
        let payload = TaskPayload::from(draft);
        let created: CreatedTask = self
            .api
            .send_json(Method::POST, TASKS_PATH, &payload)
            .await
            .inspect_err(|e| tracing::error!(error = %e, "Error creating task"))?;

        self.reload_after_write().await?;
        tracing::info!(task_id = %created.id, "Task created");
        Ok(created.id)
    }

    /// Update the given fields of a task.
    pub async fn update(&self, id: &str, update: &TaskUpdate) -> Result<()> {
        let payload = TaskPayload::from(update);
        self.api
            .send_empty(Method::PUT, &task_path(id, None), Some(&payload))
            .await
            .inspect_err(|e| tracing::error!(error = %e, task_id = id, "Backend update failed"))?;

        self.reload_after_write().await
    }

    /// Move a task to another column.
    pub async fn update_status(&self, id: &str, status: TaskStatus) -> Result<()> {
        self.api
            .send_empty(
                Method::PATCH,
                &task_path(id, Some("update_status")),
                Some(&StatusBody { status }),
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, task_id = id, "Error updating task status"))?;

        self.reload_after_write().await
    }

    /// Drag-and-drop entry point; same as [`TaskStore::update_status`].
    pub async fn move_task(&self, id: &str, status: TaskStatus) -> Result<()> {
        self.update_status(id, status).await
    }

    /// Flip one subtask's completed flag.
    pub async fn toggle_subtask(&self, id: &str, subtask_id: &str) -> Result<()> {
        self.api
            .send_empty(
                Method::PATCH,
                &task_path(id, Some("toggle_subtask")),
                Some(&ToggleSubtaskBody { subtask_id }),
            )
            .await
            .inspect_err(|e| tracing::error!(error = %e, task_id = id, "Error toggling subtask"))?;

        self.reload_after_write().await
    }

    pub async fn delete(&self, id: &str) -> Result<()> {
        self.api
            .send_empty::<()>(Method::DELETE, &task_path(id, None), None)
            .await
            .inspect_err(|e| tracing::error!(error = %e, task_id = id, "Error deleting task"))?;

        self.reload_after_write().await
    }

    /// Reload after a successful write. A failure here means the backend has
    /// the change but the local list does not.
    async fn reload_after_write(&self) -> Result<()> {
        self.reload(false).await.map_err(|e| {
            tracing::error!(error = %e, "Reload after write failed; task list is stale");
            ClientError::Stale(Box::new(e))
        })
    }

    /// Fetch and publish the full list. With `clear_on_error`, a failed
    /// fetch publishes an empty list instead of keeping the old one.
    async fn reload(&self, clear_on_error: bool) -> Result<()> {
        let ticket = self.issued.fetch_add(1, Ordering::SeqCst) + 1;

        match self.fetch().await {
            Ok(tasks) => {
                self.publish(ticket, tasks);
                Ok(())
            }
            Err(e) => {
                if clear_on_error {
                    self.publish(ticket, Vec::new());
                }
                Err(e)
            }
        }
    }

    async fn fetch(&self) -> Result<Vec<Task>> {
        let records: Vec<TaskRecord> = self.api.get_json(TASKS_PATH).await?;
        Ok(records.into_iter().map(Task::from).collect())
    }

    /// Publish unless a newer reload already has.
    fn publish(&self, ticket: u64, tasks: Vec<Task>) {
        let applied = self.state.send_if_modified(|current| {
            if ticket < self.applied.load(Ordering::SeqCst) {
                return false;
            }
            self.applied.store(ticket, Ordering::SeqCst);
            *current = tasks;
            true
        });

        if !applied {
            tracing::debug!(ticket, "Dropped out-of-order task reload");
        }
    }
}

fn task_path(id: &str, action: Option<&str>) -> String {
    match action {
        Some(action) => format!("{TASKS_PATH}{id}/{action}/"),
        None => format!("{TASKS_PATH}{id}/"),
    }
}

/// Live view of the board columns.
pub struct ColumnsWatch {
    rx: watch::Receiver<Vec<Task>>,
}

impl ColumnsWatch {
    /// Columns for the latest list, marking it seen.
    pub fn current(&mut self) -> StatusColumns {
        StatusColumns::partition(&self.rx.borrow_and_update())
    }

    /// Wait for the next list and return its columns. Errors once the store
    /// is gone.
    pub async fn changed(&mut self) -> std::result::Result<StatusColumns, watch::error::RecvError> {
        self.rx.changed().await?;
        Ok(self.current())
    }
}
