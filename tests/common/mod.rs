// SPDX-License-Identifier: MIT
// Copyright 2026 Roland Dreier <roland@rolandd.dev>

//! In-process mock of the board backend.

use axum::{
    extract::{Path, Request, State},
    http::{header, StatusCode},
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, patch, post, put},
    Json, Router,
};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use taskboard_client::config::Config;
use taskboard_client::navigation::{HistoryNavigator, Navigator, Route};
use taskboard_client::storage::LocalStorage;
use taskboard_client::AppContext;

pub const USER_EMAIL: &str = "a@b.com";
pub const USER_PASSWORD: &str = "secret1";
pub const USER_TOKEN: &str = "abc";
pub const GUEST_TOKEN: &str = "guest-token";

/// Request as seen by the mock.
#[derive(Debug, Clone)]
#[allow(dead_code)]
pub struct SeenRequest {
    pub method: String,
    pub path: String,
    pub authorization: Option<String>,
}

#[derive(Default)]
pub struct BackendState {
    pub tokens: BTreeMap<String, u64>,
    pub tasks: Vec<Value>,
    pub contacts: Vec<Value>,
    pub next_id: u64,
    pub requests: Vec<SeenRequest>,
    pub last_task_body: Option<Value>,
}

/// Handle onto the running mock.
#[derive(Clone)]
pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<Mutex<BackendState>>,
    /// While set, `GET /tasks/` and `GET /contacts/` answer 500.
    pub fail_reads: Arc<AtomicBool>,
    /// While set, every non-GET task and contact call answers 500.
    pub fail_writes: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockBackend {
    pub fn requests(&self) -> Vec<SeenRequest> {
        self.state.lock().unwrap().requests.clone()
    }

    pub fn last_task_body(&self) -> Option<Value> {
        self.state.lock().unwrap().last_task_body.clone()
    }

    pub fn token_is_live(&self, token: &str) -> bool {
        self.state.lock().unwrap().tokens.contains_key(token)
    }

    pub fn seed_task(&self, title: &str, status: &str) -> String {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        let task = json!({
            "id": id.to_string(),
            "title": title,
            "description": "",
            "due_date": "2024-06-01T00:00:00Z",
            "priority": "medium",
            "category": "Technical Task",
            "status": status,
            "assigned_to": [],
            "subtasks": [{"id": "1", "title": "step", "completed": false, "order": 0}],
            "order": null,
            "created_at": "2024-05-01T00:00:00Z",
            "updated_at": "2024-05-01T00:00:00Z"
        });
        state.tasks.push(task);
        id.to_string()
    }

    pub fn seed_contact(&self, firstname: &str, email: &str) -> u64 {
        let mut state = self.state.lock().unwrap();
        state.next_id += 1;
        let id = state.next_id;
        state.contacts.push(json!({
            "id": id,
            "email": email,
            "firstname": firstname,
            "lastname": "",
            "phone": "+49 123",
            "created_at": "2024-05-01T00:00:00Z",
            "updated_at": "2024-05-01T00:00:00Z"
        }));
        id
    }
}

/// Start the mock on an ephemeral port.
pub async fn spawn_backend() -> MockBackend {
    let state = Arc::new(Mutex::new(BackendState {
        next_id: 100,
        ..Default::default()
    }));
    let backend = MockBackend {
        base_url: String::new(),
        state: state.clone(),
        fail_reads: Arc::new(AtomicBool::new(false)),
        fail_writes: Arc::new(AtomicBool::new(false)),
    };

    let app = Router::new()
        .route("/api/auth/register/", post(register))
        .route("/api/auth/login/", post(login))
        .route("/api/auth/guest-login/", post(guest_login))
        .route("/api/auth/logout/", post(logout))
        .route("/api/auth/me/", get(me))
        .route("/api/tasks/", get(list_tasks).post(create_task))
        .route("/api/tasks/{id}/", put(update_task).delete(delete_task))
        .route("/api/tasks/{id}/update_status/", patch(update_status))
        .route("/api/tasks/{id}/toggle_subtask/", patch(toggle_subtask))
        .route("/api/contacts/", get(list_contacts).post(create_contact))
        .route("/api/contacts/{id}/", put(update_contact).delete(delete_contact))
        .layer(middleware::from_fn_with_state(backend.clone(), record))
        .with_state(backend.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        base_url: format!("http://{addr}/api"),
        ..backend
    }
}

/// Client context over `storage`, pointed at the mock.
#[allow(dead_code)]
pub async fn client(
    backend: &MockBackend,
    storage: LocalStorage,
    start: Route,
) -> (AppContext, Arc<HistoryNavigator>) {
    let navigator = Arc::new(HistoryNavigator::new(start));
    let config = Config::test_default().with_api_url(&backend.base_url);
    let nav: Arc<dyn Navigator> = navigator.clone();
    (AppContext::bootstrap(config, storage, nav).await, navigator)
}

/// Client that is already signed in as the test user.
#[allow(dead_code)]
pub async fn signed_in_client(backend: &MockBackend) -> AppContext {
    let (ctx, _) = client(backend, LocalStorage::in_memory(), Route::Login).await;
    ctx.session
        .login(&taskboard_client::models::Credentials::new(USER_EMAIL, USER_PASSWORD))
        .await
        .expect("test login should succeed");
    ctx.tasks.refresh().await;
    ctx
}

/// Wait until `cond` holds, polling briefly.
#[allow(dead_code)]
pub async fn eventually(mut cond: impl FnMut() -> bool) -> bool {
    for _ in 0..100 {
        if cond() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    cond()
}

// ─── Handlers ────────────────────────────────────────────────────────────────

async fn record(State(backend): State<MockBackend>, request: Request, next: Next) -> Response {
    let seen = SeenRequest {
        method: request.method().to_string(),
        path: request.uri().path().to_string(),
        authorization: request
            .headers()
            .get(header::AUTHORIZATION)
            .and_then(|h| h.to_str().ok())
            .map(str::to_string),
    };
    backend.state.lock().unwrap().requests.push(seen);
    next.run(request).await
}

fn user_json(id: u64, email: &str, name: &str) -> Value {
    json!({
        "id": id,
        "email": email,
        "name": name,
        "username": email.split('@').next().unwrap_or_default(),
        "createdAt": "2024-01-01T00:00:00Z"
    })
}

fn authorized(backend: &MockBackend, headers: &axum::http::HeaderMap) -> Option<u64> {
    let value = headers.get(header::AUTHORIZATION)?.to_str().ok()?;
    let token = value.strip_prefix("Token ")?;
    backend.state.lock().unwrap().tokens.get(token).copied()
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"detail": "Authentication credentials were not provided."})),
    )
        .into_response()
}

fn server_error() -> Response {
    (StatusCode::INTERNAL_SERVER_ERROR, "boom").into_response()
}

async fn register(State(backend): State<MockBackend>, Json(body): Json<Value>) -> Response {
    if body["email"] == USER_EMAIL {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"email": ["already taken"]})),
        )
            .into_response();
    }
    if body["password"] != body["confirm_password"] {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"password": "Passwords must match."})),
        )
            .into_response();
    }

    let email = body["email"].as_str().unwrap_or_default().to_string();
    let name = body["name"].as_str().unwrap_or_default().to_string();
    let mut state = backend.state.lock().unwrap();
    state.next_id += 1;
    let id = state.next_id;
    let token = format!("token-{id}");
    state.tokens.insert(token.clone(), id);

    (
        StatusCode::CREATED,
        Json(json!({"user": user_json(id, &email, &name), "token": token})),
    )
        .into_response()
}

async fn login(State(backend): State<MockBackend>, Json(body): Json<Value>) -> Response {
    if body["email"] == USER_EMAIL && body["password"] == USER_PASSWORD {
        backend
            .state
            .lock()
            .unwrap()
            .tokens
            .insert(USER_TOKEN.to_string(), 1);
        return Json(json!({"user": user_json(1, USER_EMAIL, "A"), "token": USER_TOKEN}))
            .into_response();
    }
    if body["email"] == "nouser@b.com" {
        // 200 without a token
        return Json(json!({"user": user_json(9, "nouser@b.com", "N")})).into_response();
    }
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({"error": "Invalid credentials"})),
    )
        .into_response()
}

async fn guest_login(State(backend): State<MockBackend>) -> Response {
    backend
        .state
        .lock()
        .unwrap()
        .tokens
        .insert(GUEST_TOKEN.to_string(), 2);
    Json(json!({"user": user_json(2, "guest@example.com", "Guest"), "token": GUEST_TOKEN}))
        .into_response()
}

async fn logout(State(backend): State<MockBackend>, headers: axum::http::HeaderMap) -> Response {
    let token = headers
        .get(header::AUTHORIZATION)
        .and_then(|h| h.to_str().ok())
        .and_then(|v| v.strip_prefix("Token "))
        .map(str::to_string);
    let removed = token
        .and_then(|token| backend.state.lock().unwrap().tokens.remove(&token))
        .is_some();
    if removed {
        Json(json!({"message": "Successfully logged out."})).into_response()
    } else {
        (StatusCode::BAD_REQUEST, Json(json!({"error": "Not authenticated."}))).into_response()
    }
}

async fn me(State(backend): State<MockBackend>, headers: axum::http::HeaderMap) -> Response {
    match authorized(&backend, &headers) {
        Some(id) => Json(user_json(id, USER_EMAIL, "A (renamed)")).into_response(),
        None => unauthorized(),
    }
}

async fn list_tasks(State(backend): State<MockBackend>, headers: axum::http::HeaderMap) -> Response {
    if authorized(&backend, &headers).is_none() {
        return unauthorized();
    }
    if backend.fail_reads.load(Ordering::SeqCst) {
        return server_error();
    }
    Json(Value::Array(backend.state.lock().unwrap().tasks.clone())).into_response()
}

fn subtasks_from(body: &Value) -> Vec<Value> {
    body["subtasks"]
        .as_array()
        .cloned()
        .unwrap_or_default()
        .into_iter()
        .enumerate()
        .map(|(i, mut s)| {
            s["id"] = json!(format!("s{i}"));
            s
        })
        .collect()
}

async fn create_task(
    State(backend): State<MockBackend>,
    headers: axum::http::HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if authorized(&backend, &headers).is_none() {
        return unauthorized();
    }
    if backend.fail_writes.load(Ordering::SeqCst) {
        return server_error();
    }

    let mut state = backend.state.lock().unwrap();
    state.last_task_body = Some(body.clone());
    state.next_id += 1;
    let id = state.next_id;
    let task = json!({
        "id": id.to_string(),
        "title": body["title"],
        "description": body["description"],
        "due_date": body["due_date"],
        "priority": body["priority"],
        "category": body["category"],
        "status": body["status"],
        "assigned_to": body["assigned_to"],
        "subtasks": subtasks_from(&body),
        "order": body.get("order").cloned().unwrap_or(Value::Null),
        "created_at": "2024-05-01T00:00:00Z",
        "updated_at": "2024-05-01T00:00:00Z"
    });
    state.tasks.push(task.clone());
    (StatusCode::CREATED, Json(task)).into_response()
}

async fn update_task(
    State(backend): State<MockBackend>,
    headers: axum::http::HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if authorized(&backend, &headers).is_none() {
        return unauthorized();
    }
    if backend.fail_writes.load(Ordering::SeqCst) {
        return server_error();
    }

    let mut state = backend.state.lock().unwrap();
    state.last_task_body = Some(body.clone());
    let Some(task) = state.tasks.iter_mut().find(|t| t["id"] == id.as_str()) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    if let Some(fields) = body.as_object() {
        for (key, value) in fields {
            if key == "subtasks" {
                task["subtasks"] = json!(subtasks_from(&body));
            } else {
                task[key] = value.clone();
            }
        }
    }
    Json(task.clone()).into_response()
}

async fn update_status(
    State(backend): State<MockBackend>,
    headers: axum::http::HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if authorized(&backend, &headers).is_none() {
        return unauthorized();
    }
    if backend.fail_writes.load(Ordering::SeqCst) {
        return server_error();
    }

    let valid = ["todo", "inprogress", "awaitfeedback", "done"];
    if !body["status"].as_str().is_some_and(|s| valid.contains(&s)) {
        return (StatusCode::BAD_REQUEST, Json(json!({"error": "Invalid status"}))).into_response();
    }

    let mut state = backend.state.lock().unwrap();
    let Some(task) = state.tasks.iter_mut().find(|t| t["id"] == id.as_str()) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    task["status"] = body["status"].clone();
    Json(task.clone()).into_response()
}

async fn toggle_subtask(
    State(backend): State<MockBackend>,
    headers: axum::http::HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if authorized(&backend, &headers).is_none() {
        return unauthorized();
    }

    let mut state = backend.state.lock().unwrap();
    let Some(task) = state.tasks.iter_mut().find(|t| t["id"] == id.as_str()) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(subtasks) = task["subtasks"].as_array_mut() else {
        return StatusCode::NOT_FOUND.into_response();
    };
    let Some(subtask) = subtasks.iter_mut().find(|s| s["id"] == body["subtask_id"]) else {
        return (StatusCode::NOT_FOUND, Json(json!({"error": "Subtask not found"}))).into_response();
    };
    let completed = subtask["completed"].as_bool().unwrap_or(false);
    subtask["completed"] = json!(!completed);
    Json(task.clone()).into_response()
}

async fn delete_task(
    State(backend): State<MockBackend>,
    headers: axum::http::HeaderMap,
    Path(id): Path<String>,
) -> Response {
    if authorized(&backend, &headers).is_none() {
        return unauthorized();
    }
    if backend.fail_writes.load(Ordering::SeqCst) {
        return server_error();
    }

    let mut state = backend.state.lock().unwrap();
    let before = state.tasks.len();
    state.tasks.retain(|t| t["id"] != id.as_str());
    if state.tasks.len() == before {
        return StatusCode::NOT_FOUND.into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

async fn list_contacts(State(backend): State<MockBackend>, headers: axum::http::HeaderMap) -> Response {
    if authorized(&backend, &headers).is_none() {
        return unauthorized();
    }
    if backend.fail_reads.load(Ordering::SeqCst) {
        return server_error();
    }
    Json(Value::Array(backend.state.lock().unwrap().contacts.clone())).into_response()
}

async fn create_contact(
    State(backend): State<MockBackend>,
    headers: axum::http::HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    if authorized(&backend, &headers).is_none() {
        return unauthorized();
    }
    if backend.fail_writes.load(Ordering::SeqCst) {
        return server_error();
    }

    let mut state = backend.state.lock().unwrap();
    if state.contacts.iter().any(|c| c["email"] == body["email"]) {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({"email": ["contact with this email already exists."]})),
        )
            .into_response();
    }
    state.next_id += 1;
    let contact = json!({
        "id": state.next_id,
        "email": body["email"],
        "firstname": body["firstname"],
        "lastname": body.get("lastname").cloned().unwrap_or(json!("")),
        "phone": body["phone"],
        "created_at": "2024-05-01T00:00:00Z",
        "updated_at": "2024-05-01T00:00:00Z"
    });
    state.contacts.push(contact.clone());
    (StatusCode::CREATED, Json(contact)).into_response()
}

async fn update_contact(
    State(backend): State<MockBackend>,
    headers: axum::http::HeaderMap,
    Path(id): Path<u64>,
    Json(body): Json<Value>,
) -> Response {
    if authorized(&backend, &headers).is_none() {
        return unauthorized();
    }
    if backend.fail_writes.load(Ordering::SeqCst) {
        return server_error();
    }

    let mut state = backend.state.lock().unwrap();
    let Some(contact) = state.contacts.iter_mut().find(|c| c["id"] == id) else {
        return StatusCode::NOT_FOUND.into_response();
    };
    for key in ["email", "firstname", "lastname", "phone"] {
        if let Some(value) = body.get(key) {
            contact[key] = value.clone();
        }
    }
    Json(contact.clone()).into_response()
}

async fn delete_contact(
    State(backend): State<MockBackend>,
    headers: axum::http::HeaderMap,
    Path(id): Path<u64>,
) -> Response {
    if authorized(&backend, &headers).is_none() {
        return unauthorized();
    }
    if backend.fail_writes.load(Ordering::SeqCst) {
        return server_error();
    }

    let mut state = backend.state.lock().unwrap();
    let before = state.contacts.len();
    state.contacts.retain(|c| c["id"] != id);
    if state.contacts.len() == before {
        return StatusCode::NOT_FOUND.into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}
