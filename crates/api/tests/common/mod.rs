//! Shared helpers for the API integration tests: a fake upstream API bound
//! to `127.0.0.1:0` and the production router pointed at it.

#![allow(dead_code)]

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

use axum::body::{Body, Bytes};
use axum::extract::State;
use axum::http::{header, HeaderMap, Method, Request, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::Router;
use carehub_api::config::ServerConfig;
use carehub_api::router::build_app_router;
use carehub_api::state::AppState;
use carehub_core::calendar::DayCalendar;
use carehub_upstream::UpstreamApi;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use tower::ServiceExt;

pub const EMPLOYEE_TOKEN: &str = "employee-token";
pub const ADMIN_TOKEN: &str = "admin-token";

// ---------------------------------------------------------------------------
// Fake upstream
// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct Call {
    pub method: Method,
    pub path: String,
    pub query: Option<String>,
    pub authorization: Option<String>,
    pub body: Value,
}

#[derive(Clone)]
pub struct FakeUpstream {
    calls: Arc<Mutex<Vec<Call>>>,
    statuses: Arc<Mutex<HashMap<String, String>>>,
    signed: Arc<Mutex<HashSet<String>>>,
}

impl Default for FakeUpstream {
    fn default() -> Self {
        let statuses = [
            ("planned", "PLANNED"),
            ("assigned", "ASSIGNED"),
            ("confirmed", "CONFIRMED"),
            ("done", "DONE"),
            ("signed", "DONE"),
            ("cancelled", "CANCELLED"),
            ("rejected", "REJECTED"),
        ]
        .into_iter()
        .map(|(id, status)| (id.to_string(), status.to_string()))
        .collect();

        Self {
            calls: Arc::default(),
            statuses: Arc::new(Mutex::new(statuses)),
            signed: Arc::new(Mutex::new(HashSet::from(["signed".to_string()]))),
        }
    }
}

impl FakeUpstream {
    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, method: Method, path: &str) -> usize {
        self.calls()
            .iter()
            .filter(|c| c.method == method && c.path == path)
            .count()
    }

    pub fn last(&self, method: Method, path: &str) -> Option<Call> {
        self.calls()
            .into_iter()
            .rev()
            .find(|c| c.method == method && c.path == path)
    }

    fn assignment(&self, id: &str) -> Option<Value> {
        let status = self.statuses.lock().unwrap().get(id).cloned()?;
        let signed = self.signed.lock().unwrap().contains(id);
        let mut value = json!({
            "id": id,
            "customerId": "c1",
            "employeeId": "u1",
            "startAt": "2026-03-02T08:00:00Z",
            "endAt": "2026-03-02T16:00:00Z",
            "status": status,
            "kilometers": 42,
        });
        if signed {
            value["latestSignature"] = json!({ "id": "sig-1", "signedAt": "2026-03-02T16:05:00Z" });
        }
        Some(value)
    }
}

fn user_for(headers: &HeaderMap) -> Option<Value> {
    match headers.get(header::AUTHORIZATION)?.to_str().ok()? {
        "Bearer employee-token" => Some(json!({
            "id": "u1", "email": "anna@example.com", "name": "Anna", "role": "EMPLOYEE"
        })),
        "Bearer admin-token" => Some(json!({
            "id": "admin-1", "email": "admin@example.com", "name": "Admin", "role": "ADMIN"
        })),
        _ => None,
    }
}

fn day_bundle() -> Value {
    json!({
        "assignments": [{
            "id": "signed",
            "employeeId": "u1",
            "startAt": "2026-03-02T08:00:00Z",
            "endAt": "2026-03-02T16:00:00Z",
            "status": "DONE",
            "kilometers": 42
        }],
        "timeEntries": [{ "id": "t1", "assignmentId": "signed", "minutes": 450 }],
        "timeAdjustments": [{ "id": "ta1", "deltaMinutes": 15, "reason": "Übergabe" }],
        "kmAdjustments": [{ "id": "ka1", "deltaKm": -2, "reason": "Umweg" }],
        "auditLogs": [
            { "id": "l1", "action": "CREATE", "createdAt": "2026-03-02T17:00:00Z" },
            { "id": "l2", "action": "UPDATE", "createdAt": "2026-03-03T09:00:00Z" }
        ],
        "lockedBySignature": true
    })
}

async fn handle(
    State(fake): State<FakeUpstream>,
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body: Value = serde_json::from_slice(&body).unwrap_or(Value::Null);
    fake.calls.lock().unwrap().push(Call {
        method: method.clone(),
        path: uri.path().to_string(),
        query: uri.query().map(str::to_string),
        authorization: headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string),
        body: body.clone(),
    });

    if method == Method::POST && uri.path() == "/auth/login" {
        return match (body["email"].as_str(), body["password"].as_str()) {
            (Some("anna@example.com"), Some("secret-pass")) => {
                axum::Json(json!({ "accessToken": EMPLOYEE_TOKEN })).into_response()
            }
            (Some("admin@example.com"), Some("admin-pass")) => {
                axum::Json(json!({ "data": { "access_token": ADMIN_TOKEN } })).into_response()
            }
            _ => (
                StatusCode::UNAUTHORIZED,
                axum::Json(json!({ "message": "Invalid credentials" })),
            )
                .into_response(),
        };
    }

    let Some(user) = user_for(&headers) else {
        return (
            StatusCode::UNAUTHORIZED,
            axum::Json(json!({ "message": "Unauthorized" })),
        )
            .into_response();
    };

    let segments: Vec<&str> = uri.path().trim_start_matches('/').split('/').collect();
    match (method.as_str(), segments.as_slice()) {
        ("GET", ["users", "me"]) => axum::Json(user).into_response(),

        ("GET", ["me", "assignments"]) | ("GET", ["assignments"]) => {
            let ids = ["planned", "assigned", "confirmed"];
            let items: Vec<Value> = ids.iter().filter_map(|id| fake.assignment(id)).collect();
            axum::Json(json!({ "items": items })).into_response()
        }
        ("GET", ["me", "assignments", id]) | ("GET", ["assignments", id]) => {
            match fake.assignment(id) {
                Some(a) => axum::Json(json!({ "data": a })).into_response(),
                None => (StatusCode::NOT_FOUND, axum::Json(json!({ "message": "Not found" })))
                    .into_response(),
            }
        }
        ("POST", ["me", "assignments", id, "ack"]) => {
            let next = match body["action"].as_str() {
                Some("CONFIRM") => "CONFIRMED",
                _ => "CANCELLED",
            };
            fake.statuses
                .lock()
                .unwrap()
                .insert(id.to_string(), next.to_string());
            StatusCode::CREATED.into_response()
        }
        ("POST", ["me", "assignments", id, "done"]) => {
            fake.statuses
                .lock()
                .unwrap()
                .insert(id.to_string(), "DONE".to_string());
            StatusCode::OK.into_response()
        }
        ("POST", ["me", "assignments", id, "signatures"]) => {
            fake.signed.lock().unwrap().insert(id.to_string());
            (StatusCode::CREATED, axum::Json(json!({ "id": "sig-2" }))).into_response()
        }
        ("POST", ["me", "time-entries"]) => {
            (StatusCode::CREATED, axum::Json(json!({ "id": "t-new", "minutes": body["minutes"] })))
                .into_response()
        }
        ("DELETE", ["me", "time-entries"]) => StatusCode::NO_CONTENT.into_response(),
        ("POST", ["me", "km-entries"]) => {
            if body["date"] == "2026-03-01" {
                (
                    StatusCode::FORBIDDEN,
                    axum::Json(json!({ "statusCode": 403, "message": "LOCKED_AFTER_SIGNATURE" })),
                )
                    .into_response()
            } else {
                (StatusCode::CREATED, axum::Json(json!({ "id": "k-new" }))).into_response()
            }
        }
        ("GET", ["admin", "corrections", "day"]) => axum::Json(day_bundle()).into_response(),
        ("POST", ["admin", "time-adjustments"]) | ("POST", ["admin", "km-adjustments"]) => {
            (StatusCode::CREATED, axum::Json(json!({ "id": "adj-1" }))).into_response()
        }
        ("POST", ["assignments"]) => {
            let mut created = body.clone();
            created["id"] = json!("new-1");
            (StatusCode::CREATED, axum::Json(created)).into_response()
        }
        ("PATCH", ["assignments", id]) => {
            let mut updated = fake.assignment(id).unwrap_or_else(|| json!({ "id": id }));
            if let Some(status) = body["status"].as_str() {
                updated["status"] = json!(status);
            }
            axum::Json(updated).into_response()
        }
        ("GET", ["customers"]) => {
            axum::Json(json!({ "items": [{ "id": "c1", "name": "Frau Meier" }] })).into_response()
        }
        _ => (StatusCode::NOT_FOUND, axum::Json(json!({ "message": "Not found" }))).into_response(),
    }
}

/// Start a fake upstream on an ephemeral port and return its base URL.
pub async fn spawn_fake_upstream() -> (FakeUpstream, String) {
    let fake = FakeUpstream::default();
    let app = Router::new().fallback(handle).with_state(fake.clone());
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (fake, format!("http://{addr}"))
}

// ---------------------------------------------------------------------------
// App under test
// ---------------------------------------------------------------------------

/// Build a test `ServerConfig` pointing at `upstream_base_url`.
pub fn test_config(upstream_base_url: &str) -> ServerConfig {
    ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        cors_origins: vec!["http://localhost:5173".to_string()],
        request_timeout_secs: 30,
        upstream_base_url: upstream_base_url.to_string(),
        upstream_timeout_secs: 5,
        upstream_max_retries: 0,
        session_cookie_secure: true,
        calendar: DayCalendar::parse("UTC").unwrap(),
    }
}

/// Build the full application router with all middleware layers.
pub fn build_test_app(upstream_base_url: &str) -> Router {
    let config = test_config(upstream_base_url);
    let upstream = UpstreamApi::new(config.upstream()).unwrap();
    let state = AppState {
        upstream: Arc::new(upstream),
        config: Arc::new(config.clone()),
    };
    build_app_router(state, &config)
}

/// Fake upstream plus an app wired to it.
pub async fn setup() -> (FakeUpstream, Router) {
    let (fake, url) = spawn_fake_upstream().await;
    (fake, build_test_app(&url))
}

// ---------------------------------------------------------------------------
// Request helpers
// ---------------------------------------------------------------------------

fn request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::COOKIE, format!("be_access={token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn send(app: Router, request: Request<Body>) -> Response {
    app.oneshot(request).await.unwrap()
}

pub async fn get(app: Router, uri: &str, token: Option<&str>) -> Response {
    send(app, request(Method::GET, uri, token, None)).await
}

pub async fn post_json(app: Router, uri: &str, token: Option<&str>, body: Value) -> Response {
    send(app, request(Method::POST, uri, token, Some(body))).await
}

pub async fn patch_json(app: Router, uri: &str, token: Option<&str>, body: Value) -> Response {
    send(app, request(Method::PATCH, uri, token, Some(body))).await
}

pub async fn delete(app: Router, uri: &str, token: Option<&str>) -> Response {
    send(app, request(Method::DELETE, uri, token, None)).await
}

/// Read the response body as JSON (`Null` for an empty body).
pub async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    if bytes.is_empty() {
        return Value::Null;
    }
    serde_json::from_slice(&bytes).unwrap()
}

pub fn set_cookie(response: &Response) -> Option<String> {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
}
