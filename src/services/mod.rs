// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Services module - stores and the backend client.

pub mod animation;
pub mod api;
pub mod contacts;
pub mod session;
pub mod tasks;

pub use animation::AnimationGate;
pub use api::ApiClient;
pub use contacts::ContactStore;
pub use session::{AuthFailure, AuthField, SessionStore};
pub use tasks::{ColumnsWatch, TaskStore};
