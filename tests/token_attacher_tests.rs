// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! Token attachment through a tower service stack.

use http::header::{HeaderValue, AUTHORIZATION, CONTENT_TYPE};
use http::{Method, Request};
use std::convert::Infallible;
use std::sync::Arc;
use taskboard_client::middleware::TokenAttachLayer;
use taskboard_client::storage::{keys, ClientStorage, LocalStorage};
use tower::{service_fn, Layer, ServiceExt};

/// Send `uri` through the attacher and return the header the inner service saw.
async fn seen_header(storage: &LocalStorage, uri: &str) -> Option<HeaderValue> {
    let inner = service_fn(|req: Request<()>| async move {
        Ok::<_, Infallible>(req.headers().get(AUTHORIZATION).cloned())
    });
    let service = TokenAttachLayer::new(Arc::new(storage.clone()), "/api/").layer(inner);

    let request = Request::builder().uri(uri).body(()).unwrap();
    service.oneshot(request).await.unwrap()
}

#[tokio::test]
async fn test_attaches_stored_token_to_api_requests() {
    let storage = LocalStorage::in_memory();
    storage.set(keys::AUTH_TOKEN, "abc").unwrap();

    let header = seen_header(&storage, "http://127.0.0.1:8000/api/tasks/").await;
    assert_eq!(header.unwrap(), "Token abc");
}

#[tokio::test]
async fn test_leaves_other_requests_alone() {
    let storage = LocalStorage::in_memory();
    storage.set(keys::AUTH_TOKEN, "abc").unwrap();

    assert!(seen_header(&storage, "http://127.0.0.1:8000/static/logo.svg")
        .await
        .is_none());
}

#[tokio::test]
async fn test_no_token_means_no_header() {
    let storage = LocalStorage::in_memory();
    assert!(seen_header(&storage, "http://127.0.0.1:8000/api/tasks/").await.is_none());

    storage.set(keys::AUTH_TOKEN, "").unwrap();
    assert!(seen_header(&storage, "http://127.0.0.1:8000/api/tasks/").await.is_none());
}

#[tokio::test]
async fn test_token_is_read_per_request() {
    let storage = LocalStorage::in_memory();
    storage.set(keys::AUTH_TOKEN, "first").unwrap();
    assert_eq!(
        seen_header(&storage, "http://h/api/contacts/").await.unwrap(),
        "Token first"
    );

    // Written by another tab sharing the area
    storage.open_tab().set(keys::AUTH_TOKEN, "second").unwrap();
    assert_eq!(
        seen_header(&storage, "http://h/api/contacts/").await.unwrap(),
        "Token second"
    );

    storage.remove(keys::AUTH_TOKEN).unwrap();
    assert!(seen_header(&storage, "http://h/api/contacts/").await.is_none());
}

/// Send a POST with a body and extra headers through the attacher and return
/// the request the inner service received.
async fn passed_through(storage: &LocalStorage, uri: &str) -> (Request<String>, Request<String>) {
    let build = || {
        Request::builder()
            .method(Method::POST)
            .uri(uri)
            .header(CONTENT_TYPE, "application/json")
            .header("x-request-id", "42")
            .body(r#"{"title":"payload"}"#.to_string())
            .unwrap()
    };
    let inner = service_fn(|req: Request<String>| async move { Ok::<_, Infallible>(req) });
    let service = TokenAttachLayer::new(Arc::new(storage.clone()), "/api/").layer(inner);

    let seen = service.oneshot(build()).await.unwrap();
    (build(), seen)
}

#[tokio::test]
async fn test_api_request_only_gains_authorization() {
    let storage = LocalStorage::in_memory();
    storage.set(keys::AUTH_TOKEN, "abc").unwrap();

    let (sent, seen) = passed_through(&storage, "http://h/api/tasks/?view=board").await;

    assert_eq!(seen.method(), sent.method());
    assert_eq!(seen.uri(), sent.uri());
    assert_eq!(seen.version(), sent.version());
    assert_eq!(seen.body(), sent.body());

    let mut expected = sent.headers().clone();
    expected.insert(AUTHORIZATION, HeaderValue::from_static("Token abc"));
    assert_eq!(seen.headers(), &expected);
}

#[tokio::test]
async fn test_other_request_is_untouched() {
    let storage = LocalStorage::in_memory();
    storage.set(keys::AUTH_TOKEN, "abc").unwrap();

    let (sent, seen) = passed_through(&storage, "http://h/upload/avatar").await;

    assert_eq!(seen.method(), sent.method());
    assert_eq!(seen.uri(), sent.uri());
    assert_eq!(seen.version(), sent.version());
    assert_eq!(seen.body(), sent.body());
    assert_eq!(seen.headers(), sent.headers());
}
