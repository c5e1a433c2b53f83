// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Board backend REST client.
//!
//! Every request goes through the [`TokenAttacher`] middleware, so callers
//! never handle the credential themselves.

use crate::config::Config;
use crate::error::{ClientError, Result};
use crate::middleware::{TokenAttachLayer, TokenAttacher};
use crate::storage::ClientStorage;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use tower::{Layer, ServiceExt};

/// Backend API client.
#[derive(Clone)]
pub struct ApiClient {
    http: reqwest::Client,
    service: TokenAttacher<reqwest::Client>,
    base_url: String,
    request_log: bool,
}

impl ApiClient {
    /// Create a client for the configured backend, reading the credential
    /// from `storage` on every request.
    pub fn new(config: &Config, storage: Arc<dyn ClientStorage>) -> Self {
        let http = reqwest::Client::new();
        let service = TokenAttachLayer::new(storage, &config.api_prefix).layer(http.clone());
        Self {
            http,
            service,
            base_url: config.api_url.trim_end_matches('/').to_string(),
            request_log: config.request_log,
        }
    }

    /// Absolute URL for an API path such as `tasks/12/`.
    pub fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    /// GET with a JSON response.
    pub async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.http.get(self.url(path)).build()?;
        self.execute_json(request).await
    }

    /// Request with a JSON body and a JSON response.
    pub async fn send_json<B, T>(&self, method: Method, path: &str, body: &B) -> Result<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let request = self.http.request(method, self.url(path)).json(body).build()?;
        self.execute_json(request).await
    }

    /// Request whose response body is ignored.
    pub async fn send_empty<B>(&self, method: Method, path: &str, body: Option<&B>) -> Result<()>
    where
        B: Serialize + ?Sized,
    {
        let mut builder = self.http.request(method, self.url(path));
        if let Some(body) = body {
            builder = builder.json(body);
        }
        let response = self.execute(builder.build()?).await?;
        check_response(response).await?;
        Ok(())
    }

    /// POST with an explicit credential, for calls made while the stored
    /// one may already be gone.
    pub async fn post_with_token(&self, path: &str, token: &str) -> Result<()> {
        let request = self
            .http
            .post(self.url(path))
            .header(reqwest::header::AUTHORIZATION, format!("Token {token}"))
            .json(&serde_json::json!({}))
            .build()?;
        let response = self.execute(request).await?;
        check_response(response).await?;
        Ok(())
    }

    async fn execute(&self, request: reqwest::Request) -> Result<reqwest::Response> {
        if self.request_log {
            tracing::debug!(method = %request.method(), url = %request.url(), "Backend request");
        }
        Ok(self.service.clone().oneshot(request).await?)
    }

    async fn execute_json<T: DeserializeOwned>(&self, request: reqwest::Request) -> Result<T> {
        let response = self.execute(request).await?;
        let response = check_response(response).await?;
        let bytes = response.bytes().await?;
        serde_json::from_slice(&bytes).map_err(|e| ClientError::Decode(e.to_string()))
    }
}

/// Turn non-2xx answers into [`ClientError::Status`], keeping the body for
/// callers that inspect backend error shapes.
async fn check_response(response: reqwest::Response) -> Result<reqwest::Response> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    if status.as_u16() == 401 {
        tracing::warn!("Backend rejected credentials (401)");
    }
    Err(ClientError::Status { status, body })
}
