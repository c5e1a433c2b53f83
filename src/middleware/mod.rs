// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Request middleware for the backend client.

pub mod token;

pub use token::{authorization_header, ApiRequest, TokenAttachLayer, TokenAttacher};
