// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Board task model and the status-column projection.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Urgent,
    Medium,
    Low,
}

impl Priority {
    pub fn as_str(self) -> &'static str {
        match self {
            Priority::Urgent => "urgent",
            Priority::Medium => "medium",
            Priority::Low => "low",
        }
    }
}

impl FromStr for Priority {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "urgent" => Ok(Priority::Urgent),
            "medium" => Ok(Priority::Medium),
            "low" => Ok(Priority::Low),
            other => Err(format!("unknown priority: {other}")),
        }
    }
}

/// Workflow status; one board column each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TaskStatus {
    #[serde(rename = "todo")]
    Todo,
    #[serde(rename = "inprogress")]
    InProgress,
    #[serde(rename = "awaitfeedback")]
    AwaitFeedback,
    #[serde(rename = "done")]
    Done,
}

impl TaskStatus {
    /// Board column order.
    pub const ALL: [TaskStatus; 4] = [
        TaskStatus::Todo,
        TaskStatus::InProgress,
        TaskStatus::AwaitFeedback,
        TaskStatus::Done,
    ];

    /// Wire name.
    pub fn as_str(self) -> &'static str {
        match self {
            TaskStatus::Todo => "todo",
            TaskStatus::InProgress => "inprogress",
            TaskStatus::AwaitFeedback => "awaitfeedback",
            TaskStatus::Done => "done",
        }
    }

    /// Column heading.
    pub fn title(self) -> &'static str {
        match self {
            TaskStatus::Todo => "To do",
            TaskStatus::InProgress => "In progress",
            TaskStatus::AwaitFeedback => "Await feedback",
            TaskStatus::Done => "Done",
        }
    }
}

impl fmt::Display for TaskStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TaskStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized: String = s
            .chars()
            .filter(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();
        TaskStatus::ALL
            .into_iter()
            .find(|status| status.as_str() == normalized)
            .ok_or_else(|| format!("unknown status: {s}"))
    }
}

/// Checklist item inside a task.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Subtask {
    /// Server-assigned; empty for subtasks not yet saved
    pub id: String,
    pub title: String,
    pub completed: bool,
}

impl Subtask {
    /// Unsaved subtask.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            title: title.into(),
            completed: false,
        }
    }
}

/// Task on the board.
#[derive(Debug, Clone, PartialEq)]
pub struct Task {
    /// Absent until the backend has stored the task
    pub id: Option<String>,
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub category: String,
    pub status: TaskStatus,
    /// Contact IDs
    pub assigned_to: Vec<String>,
    pub subtasks: Vec<Subtask>,
    pub created_at: DateTime<Utc>,
    pub updated_at: Option<DateTime<Utc>>,
    /// Optional sort order
    pub order: Option<i64>,
}

impl Task {
    pub fn completed_subtasks(&self) -> usize {
        self.subtasks.iter().filter(|s| s.completed).count()
    }
}

/// Fields for a task that does not exist yet.
#[derive(Debug, Clone, PartialEq)]
pub struct TaskDraft {
    pub title: String,
    pub description: String,
    pub due_date: DateTime<Utc>,
    pub priority: Priority,
    pub category: String,
    pub status: TaskStatus,
    pub assigned_to: Vec<String>,
    pub subtasks: Vec<Subtask>,
    pub order: Option<i64>,
}

impl TaskDraft {
    /// Draft with the board defaults (medium priority, "todo" column).
    pub fn new(title: impl Into<String>, category: impl Into<String>, due_date: DateTime<Utc>) -> Self {
        Self {
            title: title.into(),
            description: String::new(),
            due_date,
            priority: Priority::Medium,
            category: category.into(),
            status: TaskStatus::Todo,
            assigned_to: Vec::new(),
            subtasks: Vec::new(),
            order: None,
        }
    }
}

/// Partial task update. `None` fields are left out of the request.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TaskUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub priority: Option<Priority>,
    pub category: Option<String>,
    pub status: Option<TaskStatus>,
    pub assigned_to: Option<Vec<String>>,
    pub subtasks: Option<Vec<Subtask>>,
    pub order: Option<i64>,
}

impl From<&Task> for TaskUpdate {
    /// Full update carrying every editable field of `task`.
    fn from(task: &Task) -> Self {
        Self {
            title: Some(task.title.clone()),
            description: Some(task.description.clone()),
            due_date: Some(task.due_date),
            priority: Some(task.priority),
            category: Some(task.category.clone()),
            status: Some(task.status),
            assigned_to: Some(task.assigned_to.clone()),
            subtasks: Some(task.subtasks.clone()),
            order: task.order,
        }
    }
}

/// Tasks split into board columns.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusColumns {
    pub todo: Vec<Task>,
    pub in_progress: Vec<Task>,
    pub await_feedback: Vec<Task>,
    pub done: Vec<Task>,
}

impl StatusColumns {
    /// Split `tasks` by status, keeping input order within each column.
    pub fn partition(tasks: &[Task]) -> Self {
        let mut columns = Self::default();
        for task in tasks {
            columns.column_mut(task.status).push(task.clone());
        }
        columns
    }

    pub fn column(&self, status: TaskStatus) -> &[Task] {
        match status {
            TaskStatus::Todo => &self.todo,
            TaskStatus::InProgress => &self.in_progress,
            TaskStatus::AwaitFeedback => &self.await_feedback,
            TaskStatus::Done => &self.done,
        }
    }

    fn column_mut(&mut self, status: TaskStatus) -> &mut Vec<Task> {
        match status {
            TaskStatus::Todo => &mut self.todo,
            TaskStatus::InProgress => &mut self.in_progress,
            TaskStatus::AwaitFeedback => &mut self.await_feedback,
            TaskStatus::Done => &mut self.done,
        }
    }

    /// Columns in board order.
    pub fn iter(&self) -> impl Iterator<Item = (TaskStatus, &[Task])> {
        TaskStatus::ALL.into_iter().map(|s| (s, self.column(s)))
    }

    pub fn total(&self) -> usize {
        self.iter().map(|(_, tasks)| tasks.len()).sum()
    }

    /// Figures shown on the summary screen.
    pub fn summary(&self) -> BoardSummary {
        let open_urgent = self
            .iter()
            .filter(|(status, _)| *status != TaskStatus::Done)
            .flat_map(|(_, tasks)| tasks)
            .filter(|t| t.priority == Priority::Urgent);

        let (urgent, next_urgent_due) = open_urgent.fold((0, None), |(n, due), task| {
            let due = match due {
                Some(d) if d <= task.due_date => Some(d),
                _ => Some(task.due_date),
            };
            (n + 1, due)
        });

        BoardSummary {
            todo: self.todo.len(),
            in_progress: self.in_progress.len(),
            await_feedback: self.await_feedback.len(),
            done: self.done.len(),
            total: self.total(),
            urgent,
            next_urgent_due,
        }
    }
}

/// Summary counts. `urgent` and `next_urgent_due` only consider tasks that
/// are not done yet.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BoardSummary {
    pub todo: usize,
    pub in_progress: usize,
    pub await_feedback: usize,
    pub done: usize,
    pub total: usize,
    pub urgent: usize,
    pub next_urgent_due: Option<DateTime<Utc>>,
}
