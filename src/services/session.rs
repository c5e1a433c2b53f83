// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Session store: who is signed in, kept in sync across tabs.
//!
//! Handles:
//! - Restoring a persisted session at startup (corrupt data is cleared)
//! - Register / login / guest login / logout against the backend
//! - Reacting to `currentUser` changes made by other tabs
//!
//! Every change is written to storage first and published second, so a
//! sibling tab reacting to the storage event sees the same value this tab
//! already holds.

use super::api::ApiClient;
use crate::error::{ClientError, Result};
use crate::models::{Credentials, Registration, Session, User};
use crate::navigation::{Navigator, Route};
use crate::storage::{keys, ClientStorage, StorageEvent, StorageEventSource, StorageNotice};
use crate::time_utils::truncate_to_millis;
use chrono::{DateTime, Utc};
use reqwest::Method;
use serde::Deserialize;
use std::sync::Arc;
use tokio::sync::watch;
use tokio::task::JoinHandle;

const REGISTER_FAILED: &str = "Registration failed";
const LOGIN_FAILED: &str = "Invalid email or password";
const GUEST_LOGIN_FAILED: &str = "Guest login failed";

// ─── Backend shapes ──────────────────────────────────────────────────────────

/// User as returned by the auth endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct BackendUser {
    #[serde(deserialize_with = "crate::models::id_string")]
    pub id: String,
    pub email: String,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub username: Option<String>,
    #[serde(rename = "createdAt")]
    pub created_at: DateTime<Utc>,
}

impl From<BackendUser> for User {
    fn from(user: BackendUser) -> Self {
        Self {
            id: user.id,
            email: user.email,
            name: user.name,
            password: String::new(),
            created_at: truncate_to_millis(user.created_at),
        }
    }
}

/// Successful auth response. Both parts must be present to count.
#[derive(Debug, Deserialize)]
struct AuthResponse {
    user: Option<BackendUser>,
    token: Option<String>,
}

/// Field messages arrive either as a list or as a single string.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldMessages {
    Many(Vec<String>),
    One(String),
}

impl FieldMessages {
    fn first(&self) -> Option<&str> {
        match self {
            FieldMessages::Many(v) => v.first().map(String::as_str),
            FieldMessages::One(s) => Some(s.as_str()),
        }
    }
}

/// Error body of the auth endpoints.
#[derive(Debug, Default, Deserialize)]
struct AuthErrorBody {
    email: Option<FieldMessages>,
    password: Option<FieldMessages>,
    error: Option<String>,
}

// ─── Failure type ────────────────────────────────────────────────────────────

/// Form field a backend validation message belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthField {
    Email,
    Password,
}

/// Why an auth call did not produce a session. `Display` is the message to
/// show the user.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AuthFailure {
    /// The backend rejected a specific field.
    #[error("{message}")]
    Field { field: AuthField, message: String },

    /// The backend sent a general error message.
    #[error("{0}")]
    Backend(String),

    /// Nothing more specific is known.
    #[error("{0}")]
    Default(&'static str),
}

/// Which parts of an error body an endpoint may use.
#[derive(Debug, Clone, Copy)]
enum ErrorShape {
    /// email field, then password field, then `error`
    Fields,
    /// `error` only
    Message,
}

impl AuthFailure {
    /// Collapse a failed call into one failure, by precedence.
    fn from_error(error: &ClientError, shape: ErrorShape, default: &'static str) -> Self {
        let body = match error {
            ClientError::Status { body, .. } => {
                serde_json::from_str::<AuthErrorBody>(body).unwrap_or_default()
            }
            _ => AuthErrorBody::default(),
        };

        if let ErrorShape::Fields = shape {
            if let Some(message) = body.email.as_ref().and_then(FieldMessages::first) {
                return AuthFailure::Field {
                    field: AuthField::Email,
                    message: message.to_string(),
                };
            }
            if let Some(message) = body.password.as_ref().and_then(FieldMessages::first) {
                return AuthFailure::Field {
                    field: AuthField::Password,
                    message: message.to_string(),
                };
            }
        }

        match body.error.filter(|e| !e.is_empty()) {
            Some(message) => AuthFailure::Backend(message),
            None => AuthFailure::Default(default),
        }
    }

    /// User-facing message.
    pub fn message(&self) -> String {
        self.to_string()
    }
}

// ─── Store ───────────────────────────────────────────────────────────────────

struct SessionInner {
    api: ApiClient,
    storage: Arc<dyn ClientStorage>,
    navigator: Arc<dyn Navigator>,
    state: watch::Sender<Option<Session>>,
}

/// Owner of the current session.
pub struct SessionStore {
    inner: Arc<SessionInner>,
    listener: JoinHandle<()>,
}

impl SessionStore {
    /// Restore the persisted session and start listening for changes made
    /// by other tabs. Must be called within a Tokio runtime.
    pub fn new(
        api: ApiClient,
        storage: Arc<dyn ClientStorage>,
        events: &dyn StorageEventSource,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        let restored = restore(storage.as_ref());
        let (state, _) = watch::channel(restored);

        let inner = Arc::new(SessionInner {
            api,
            storage,
            navigator,
            state,
        });

        let mut subscription = events.subscribe();
        let listener_inner = inner.clone();
        let listener = tokio::spawn(async move {
            while let Some(notice) = subscription.next_notice().await {
                match notice {
                    StorageNotice::Changed(event) => listener_inner.handle_storage_event(&event),
                    StorageNotice::Lagged(_) => listener_inner.resync_from_storage(),
                }
            }
            tracing::debug!("Storage event source closed");
        });

        Self { inner, listener }
    }

    /// Receiver that sees every session change.
    pub fn subscribe(&self) -> watch::Receiver<Option<Session>> {
        self.inner.state.subscribe()
    }

    pub fn is_logged_in(&self) -> bool {
        self.inner.state.borrow().is_some()
    }

    pub fn current_session(&self) -> Option<Session> {
        self.inner.state.borrow().clone()
    }

    pub fn current_user(&self) -> Option<User> {
        self.inner.state.borrow().as_ref().map(|s| s.user.clone())
    }

    /// Create an account and sign in as it.
    pub async fn register(&self, data: &Registration) -> std::result::Result<Session, AuthFailure> {
        let result = self
            .inner
            .api
            .send_json::<_, AuthResponse>(Method::POST, "auth/register/", data)
            .await;
        self.inner
            .finish_auth(result, ErrorShape::Fields, REGISTER_FAILED, "Registration")
    }

    /// Sign in with email and password.
    pub async fn login(&self, credentials: &Credentials) -> std::result::Result<Session, AuthFailure> {
        let result = self
            .inner
            .api
            .send_json::<_, AuthResponse>(Method::POST, "auth/login/", credentials)
            .await;
        self.inner
            .finish_auth(result, ErrorShape::Message, LOGIN_FAILED, "Login")
    }

    /// Sign in with the shared guest account.
    pub async fn login_as_guest(&self) -> std::result::Result<Session, AuthFailure> {
        let result = self
            .inner
            .api
            .send_json::<_, AuthResponse>(Method::POST, "auth/guest-login/", &serde_json::json!({}))
            .await;
        self.inner
            .finish_auth(result, ErrorShape::Message, GUEST_LOGIN_FAILED, "Guest login")
    }

    /// Sign out. The backend call is best effort; local state is always
    /// cleared and the client is sent to the login screen.
    pub async fn logout(&self) {
        if let Some(token) = self.inner.storage.get(keys::AUTH_TOKEN) {
            if let Err(e) = self.inner.api.post_with_token("auth/logout/", &token).await {
                tracing::error!(error = %e, "Logout API error");
            }
        }

        if let Err(e) = self.inner.storage.apply(Session::clear_changes()) {
            tracing::error!(error = %e, "Failed to clear stored session");
        }
        self.inner.state.send_replace(None);
        self.inner.navigator.navigate(Route::Login);
        tracing::info!("Logged out");
    }

    /// Re-read the signed-in user from the backend and replace the stored
    /// record, keeping the token. `Ok(None)` when nobody is signed in.
    pub async fn refresh_current_user(&self) -> Result<Option<Session>> {
        let Some(token) = self.inner.storage.get(keys::AUTH_TOKEN) else {
            return Ok(None);
        };

        let user: BackendUser = self.inner.api.get_json("auth/me/").await?;
        let session = Session::new(user.into(), token);
        self.inner.persist(&session)?;
        Ok(Some(session))
    }

    /// Apply a storage change notification. The background listener calls
    /// this for every foreign event; exposed for embedders with their own
    /// event plumbing.
    pub fn apply_storage_event(&self, event: &StorageEvent) {
        self.inner.handle_storage_event(event);
    }

    /// Bring the in-memory session in line with storage after change
    /// notifications were lost. The background listener does this on lag.
    pub fn resync_from_storage(&self) {
        self.inner.resync_from_storage();
    }
}

impl Drop for SessionStore {
    fn drop(&mut self) {
        self.listener.abort();
    }
}

impl SessionInner {
    fn finish_auth(
        &self,
        result: Result<AuthResponse>,
        shape: ErrorShape,
        default: &'static str,
        action: &'static str,
    ) -> std::result::Result<Session, AuthFailure> {
        let response = result.map_err(|e| {
            tracing::error!(error = %e, "{action} error");
            AuthFailure::from_error(&e, shape, default)
        })?;

        let (Some(user), Some(token)) = (response.user, response.token) else {
            tracing::warn!("{action} response missing user or token");
            return Err(AuthFailure::Default(default));
        };

        let session = Session::new(user.into(), token);
        self.persist(&session).map_err(|e| {
            tracing::error!(error = %e, "Failed to persist session");
            AuthFailure::Default(default)
        })?;

        tracing::info!(user_id = %session.user.id, "{action} successful");
        Ok(session)
    }

    /// Write both slots, then publish.
    fn persist(&self, session: &Session) -> Result<()> {
        let changes = session
            .storage_changes()
            .map_err(|e| ClientError::InvalidInput(e.to_string()))?;
        self.storage.apply(changes)?;
        self.state.send_replace(Some(session.clone()));
        Ok(())
    }

    fn handle_storage_event(&self, event: &StorageEvent) {
        if event.key != keys::CURRENT_USER {
            return;
        }

        match event.new_value.as_deref().filter(|v| !v.is_empty()) {
            Some(user_json) => self.login_from_storage(user_json),
            None => self.logout_from_storage(),
        }
    }

    fn login_from_storage(&self, user_json: &str) {
        let Some(token) = self.storage.get(keys::AUTH_TOKEN) else {
            tracing::error!("Session changed in another tab but no token is stored");
            return;
        };

        match Session::from_stored(user_json, &token) {
            Ok(session) => self.adopt(session),
            Err(e) => {
                tracing::error!(error = %e, "Error parsing user from storage event");
            }
        }
    }

    /// Take over a session written by another tab.
    fn adopt(&self, session: Session) {
        tracing::info!(user_id = %session.user.id, "Signed in from another tab");
        self.state.send_replace(Some(session));
        if self.navigator.current().is_auth_only() {
            self.navigator.navigate(Route::DEFAULT_AUTHENTICATED);
        }
    }

    /// Events were dropped, so compare against what storage holds now.
    fn resync_from_storage(&self) {
        let current = self.state.borrow().clone();
        match Session::load(self.storage.as_ref()) {
            Some(Ok(stored)) => {
                if current.as_ref() != Some(&stored) {
                    self.adopt(stored);
                }
            }
            Some(Err(e)) => {
                tracing::error!(error = %e, "Error parsing saved user during resync");
            }
            None => {
                if current.is_some() {
                    self.logout_from_storage();
                }
            }
        }
    }

    fn logout_from_storage(&self) {
        tracing::info!("Signed out from another tab");
        self.state.send_replace(None);
        if !self.navigator.current().is_public() {
            self.navigator.navigate(Route::Login);
        }
    }
}

/// Load the persisted session. Unreadable or half-written data is removed.
fn restore(storage: &dyn ClientStorage) -> Option<Session> {
    match Session::load(storage) {
        Some(Ok(session)) => {
            tracing::debug!(user_id = %session.user.id, "Restored session");
            Some(session)
        }
        Some(Err(e)) => {
            tracing::error!(error = %e, "Error parsing saved user");
            clear_stored(storage);
            None
        }
        None => {
            let orphaned = storage
                .get_many(&[keys::CURRENT_USER, keys::AUTH_TOKEN])
                .iter()
                .any(Option::is_some);
            if orphaned {
                tracing::warn!("Stored session is missing its user or token; clearing");
                clear_stored(storage);
            }
            None
        }
    }
}

fn clear_stored(storage: &dyn ClientStorage) {
    if let Err(e) = storage.apply(Session::clear_changes()) {
        tracing::error!(error = %e, "Failed to clear stored session");
    }
}
