// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token attachment middleware.
//!
//! Reads the stored credential on every request and, for requests aimed at
//! the board API, adds `Authorization: Token <value>`. Everything else goes
//! through untouched.

use crate::storage::{keys, ClientStorage};
use http::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::borrow::Cow;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::{Layer, Service};

/// Request types the attacher knows how to inspect and extend.
pub trait ApiRequest {
    /// Full request target (URL or URI) used for the API prefix match.
    fn target(&self) -> Cow<'_, str>;
    fn headers_mut(&mut self) -> &mut HeaderMap;
}

impl ApiRequest for reqwest::Request {
    fn target(&self) -> Cow<'_, str> {
        Cow::Borrowed(self.url().as_str())
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        reqwest::Request::headers_mut(self)
    }
}

impl<B> ApiRequest for http::Request<B> {
    fn target(&self) -> Cow<'_, str> {
        Cow::Owned(self.uri().to_string())
    }

    fn headers_mut(&mut self) -> &mut HeaderMap {
        http::Request::headers_mut(self)
    }
}

/// Header value to attach, if any.
///
/// Pure function of the stored token and the request target. An empty or
/// header-unsafe token counts as no token.
pub fn authorization_header(
    token: Option<&str>,
    target: &str,
    api_prefix: &str,
) -> Option<HeaderValue> {
    let token = token.filter(|t| !t.is_empty())?;
    if !target.contains(api_prefix) {
        return None;
    }
    match HeaderValue::from_str(&format!("Token {token}")) {
        Ok(mut value) => {
            value.set_sensitive(true);
            Some(value)
        }
        Err(_) => {
            tracing::warn!("Stored auth token is not a valid header value; sending request without it");
            None
        }
    }
}

/// Layer producing [`TokenAttacher`] services.
#[derive(Clone)]
pub struct TokenAttachLayer {
    storage: Arc<dyn ClientStorage>,
    api_prefix: Arc<str>,
}

impl TokenAttachLayer {
    pub fn new(storage: Arc<dyn ClientStorage>, api_prefix: &str) -> Self {
        Self {
            storage,
            api_prefix: Arc::from(api_prefix),
        }
    }
}

impl<S> Layer<S> for TokenAttachLayer {
    type Service = TokenAttacher<S>;

    fn layer(&self, inner: S) -> Self::Service {
        TokenAttacher {
            inner,
            storage: self.storage.clone(),
            api_prefix: self.api_prefix.clone(),
        }
    }
}

/// Service wrapper that attaches the stored credential to API requests.
#[derive(Clone)]
pub struct TokenAttacher<S> {
    inner: S,
    storage: Arc<dyn ClientStorage>,
    api_prefix: Arc<str>,
}

impl<S, R> Service<R> for TokenAttacher<S>
where
    S: Service<R>,
    R: ApiRequest,
{
    type Response = S::Response;
    type Error = S::Error;
    type Future = S::Future;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner.poll_ready(cx)
    }

    fn call(&mut self, mut request: R) -> Self::Future {
        let token = self.storage.get(keys::AUTH_TOKEN);
        let header = authorization_header(token.as_deref(), &request.target(), &self.api_prefix);
        if let Some(value) = header {
            request.headers_mut().insert(AUTHORIZATION, value);
        }
        self.inner.call(request)
    }
}
