// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Client error types shared by the stores and the API client.

use crate::storage::StorageError;
use reqwest::StatusCode;

/// Error returned by backend calls and store mutations.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Backend returned {status}: {body}")]
    Status { status: StatusCode, body: String },

    #[error("Failed to decode backend response: {0}")]
    Decode(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The write reached the backend but the follow-up reload did not, so
    /// the local task list no longer reflects the server.
    #[error("Write succeeded but reload failed: {0}")]
    Stale(#[source] Box<ClientError>),
}

impl ClientError {
    /// HTTP status of the failed call, if the backend answered at all.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            ClientError::Status { status, .. } => Some(*status),
            ClientError::Http(e) => e.status(),
            ClientError::Stale(inner) => inner.status(),
            _ => None,
        }
    }

    /// True when the failure left the local view out of date with the backend.
    pub fn is_stale(&self) -> bool {
        matches!(self, ClientError::Stale(_))
    }

    /// True for 401/403 answers, meaning the stored credential is no good.
    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED) | Some(StatusCode::FORBIDDEN)
        )
    }
}

/// Result type alias for client operations
pub type Result<T> = std::result::Result<T, ClientError>;
