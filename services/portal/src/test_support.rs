//! In-process stand-in for the profile REST collaborator, used by tests

use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::{
    Json, Router,
    extract::{Path, State},
    http::{HeaderMap, Method, StatusCode, Uri, header::CONTENT_TYPE},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use common::{UserProfile, config::ApiConfig};
use serde_json::Value;
use tokio::net::TcpListener;

#[derive(Clone, Default)]
struct StubState {
    users: Arc<Mutex<HashMap<String, Value>>>,
    forced_status: Arc<Mutex<Option<StatusCode>>>,
    requests: Arc<Mutex<Vec<String>>>,
    last_body: Arc<Mutex<Option<Value>>>,
    content_types: Arc<Mutex<Vec<Option<String>>>>,
    delay: Arc<Mutex<Option<Duration>>>,
}

impl StubState {
    /// Record the call and return the forced failure, if any
    fn record(
        &self,
        method: &Method,
        uri: &Uri,
        headers: &HeaderMap,
        body: Option<&Value>,
    ) -> Option<Response> {
        self.requests
            .lock()
            .unwrap()
            .push(format!("{} {}", method, uri.path()));
        self.content_types.lock().unwrap().push(
            headers
                .get(CONTENT_TYPE)
                .and_then(|value| value.to_str().ok())
                .map(str::to_string),
        );
        if let Some(body) = body {
            *self.last_body.lock().unwrap() = Some(body.clone());
        }

        self.forced_status
            .lock()
            .unwrap()
            .map(|status| (status, "stub failure").into_response())
    }
}

/// Running stub server
pub struct StubServer {
    url: String,
    state: StubState,
}

impl StubServer {
    /// Bind to an ephemeral port and serve in the background
    pub async fn start() -> Self {
        let state = StubState::default();
        let app = Router::new()
            .route("/api/user", post(create_user))
            .route("/api/user/:email", get(get_user).put(update_user))
            .with_state(state.clone());

        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self {
            url: format!("http://{}", addr),
            state,
        }
    }

    /// Client configuration pointing at this server, without retries
    pub fn config(&self) -> ApiConfig {
        ApiConfig {
            api_url: self.url.clone(),
            request_timeout_secs: 5,
            fetch_max_attempts: 1,
            fetch_retry_backoff_ms: 0,
        }
    }

    pub fn seed(&self, profile: &UserProfile) {
        self.seed_raw(&profile.email, serde_json::to_value(profile).unwrap());
    }

    pub fn seed_raw(&self, email: &str, record: Value) {
        self.state
            .users
            .lock()
            .unwrap()
            .insert(email.to_string(), record);
    }

    /// Answer every request with `status`
    pub fn fail_with(&self, status: StatusCode) {
        *self.state.forced_status.lock().unwrap() = Some(status);
    }

    pub fn stored(&self, email: &str) -> Option<Value> {
        self.state.users.lock().unwrap().get(email).cloned()
    }

    /// `METHOD /raw/path` for every request received so far
    pub fn requests(&self) -> Vec<String> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn last_body(&self) -> Option<Value> {
        self.state.last_body.lock().unwrap().clone()
    }

    /// `Content-Type` of every request received so far
    pub fn content_types(&self) -> Vec<Option<String>> {
        self.state.content_types.lock().unwrap().clone()
    }

    /// Hold every GET for `delay` before answering
    pub fn delay_gets(&self, delay: Duration) {
        *self.state.delay.lock().unwrap() = Some(delay);
    }
}

async fn get_user(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(email): Path<String>,
) -> Response {
    if let Some(failure) = state.record(&method, &uri, &headers, None) {
        return failure;
    }

    let delay = *state.delay.lock().unwrap();
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }

    match state.users.lock().unwrap().get(&email) {
        Some(record) => Json(record.clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn create_user(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Json(mut body): Json<Value>,
) -> Response {
    if let Some(failure) = state.record(&method, &uri, &headers, Some(&body)) {
        return failure;
    }

    let Some(email) = body["email"].as_str().map(str::to_string) else {
        return StatusCode::BAD_REQUEST.into_response();
    };

    // Server-assigned field the client does not model
    body["_id"] = Value::String(format!("srv-{}", email));
    state
        .users
        .lock()
        .unwrap()
        .insert(email, body.clone());

    (StatusCode::CREATED, Json(body)).into_response()
}

async fn update_user(
    State(state): State<StubState>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    Path(email): Path<String>,
    Json(body): Json<Value>,
) -> Response {
    if let Some(failure) = state.record(&method, &uri, &headers, Some(&body)) {
        return failure;
    }

    let mut users = state.users.lock().unwrap();
    let Some(Value::Object(record)) = users.get_mut(&email) else {
        return StatusCode::NOT_FOUND.into_response();
    };

    if let Value::Object(fields) = body {
        record.extend(fields);
    }

    Json(Value::Object(record.clone())).into_response()
}
