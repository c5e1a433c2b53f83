//! One-time landing animation gate, kept in session-scoped storage.

use crate::storage::{keys, ClientStorage};
use std::sync::Arc;

/// Decides whether the landing logo animation should run.
#[derive(Clone)]
pub struct AnimationGate {
    session_storage: Arc<dyn ClientStorage>,
}

impl AnimationGate {
    /// `session_storage` should live only as long as the client session.
    pub fn new(session_storage: Arc<dyn ClientStorage>) -> Self {
        Self { session_storage }
    }

    /// True the first time it is asked in a session, false afterwards.
    pub fn should_play(&self) -> bool {
        if self.session_storage.get(keys::ANIMATION_PLAYED).is_some() {
            return false;
        }
        if let Err(e) = self.session_storage.set(keys::ANIMATION_PLAYED, "true") {
            tracing::warn!(error = %e, "Could not record animation state");
        }
        true
    }

    pub fn reset(&self) {
        if let Err(e) = self.session_storage.remove(keys::ANIMATION_PLAYED) {
            tracing::warn!(error = %e, "Could not reset animation state");
        }
    }
}
