//! In-process stand-in for the vendor gateway and fleet API.
//!
//! Fleet endpoints accept exactly one bearer token (`valid_token`); every
//! other token gets the endpoint's "rejected" status. Each route counts its
//! hits so tests can assert on the number of attempts. Requests missing the
//! `x-app-id` header or the car paging query get a 400.

#![allow(dead_code)]

use axum::body::Body;
use axum::extract::{Path, Query, State};
use axum::http::header::{AUTHORIZATION, COOKIE, SET_COOKIE};
use axum::http::{HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use electrocars::config::ApiConfig;
use serde_json::{Value, json};
use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub const VALID_CODE: &str = "1234";

pub struct MockVendor {
    pub send_code_hits: AtomicUsize,
    pub token_hits: AtomicUsize,
    pub refresh_hits: AtomicUsize,
    pub cars_hits: AtomicUsize,
    pub list_commands_hits: AtomicUsize,
    pub send_command_hits: AtomicUsize,

    /// Reject every fleet request regardless of token
    pub always_reject: AtomicBool,
    pub refresh_ok: AtomicBool,
    /// Put a new `refresh_token` cookie on refresh responses
    pub rotate_refresh: AtomicBool,
    pub refresh_without_access: AtomicBool,
    pub login_without_cookie: AtomicBool,
    pub send_code_ok: AtomicBool,
    /// Non-rejection failure status for `GET /car`
    pub cars_failure: Mutex<Option<StatusCode>>,
    /// Hold `GET /car` before sending any headers
    pub cars_stall: AtomicBool,
    /// Send headers and half a body for `GET /car`, then hold
    pub cars_stall_body: AtomicBool,

    pub valid_token: Mutex<String>,
    pub last_refresh_cookie: Mutex<Option<String>>,
    pub last_command: Mutex<Option<Value>>,
    pub cars: Mutex<Value>,
    pub commands: Mutex<Value>,
}

impl Default for MockVendor {
    fn default() -> Self {
        Self {
            send_code_hits: AtomicUsize::new(0),
            token_hits: AtomicUsize::new(0),
            refresh_hits: AtomicUsize::new(0),
            cars_hits: AtomicUsize::new(0),
            list_commands_hits: AtomicUsize::new(0),
            send_command_hits: AtomicUsize::new(0),
            always_reject: AtomicBool::new(false),
            refresh_ok: AtomicBool::new(true),
            rotate_refresh: AtomicBool::new(true),
            refresh_without_access: AtomicBool::new(false),
            login_without_cookie: AtomicBool::new(false),
            send_code_ok: AtomicBool::new(true),
            cars_failure: Mutex::new(None),
            cars_stall: AtomicBool::new(false),
            cars_stall_body: AtomicBool::new(false),
            valid_token: Mutex::new("access-0".to_string()),
            last_refresh_cookie: Mutex::new(None),
            last_command: Mutex::new(None),
            cars: Mutex::new(json!([])),
            commands: Mutex::new(json!([])),
        }
    }
}

impl MockVendor {
    pub fn hits(counter: &AtomicUsize) -> usize {
        counter.load(Ordering::SeqCst)
    }

    pub fn set_cars(&self, cars: Value) {
        *self.cars.lock().unwrap() = cars;
    }

    pub fn set_commands(&self, commands: Value) {
        *self.commands.lock().unwrap() = commands;
    }

    fn accepts(&self, headers: &HeaderMap) -> bool {
        if self.always_reject.load(Ordering::SeqCst) {
            return false;
        }
        let expected = format!("Bearer {}", self.valid_token.lock().unwrap());
        headers
            .get(AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .is_some_and(|v| v == expected)
    }
}

/// Longer than any client timeout used in the tests
const STALL: Duration = Duration::from_secs(3);

fn has_app_id(headers: &HeaderMap) -> bool {
    headers.get("x-app-id").is_some_and(|v| !v.is_empty())
}

fn with_refresh_cookie(mut response: Response, token: &str) -> Response {
    response.headers_mut().insert(
        SET_COOKIE,
        HeaderValue::from_str(&format!("refresh_token={token}; Path=/; HttpOnly")).unwrap(),
    );
    response
}

async fn send_code(State(vendor): State<Arc<MockVendor>>, headers: HeaderMap) -> StatusCode {
    vendor.send_code_hits.fetch_add(1, Ordering::SeqCst);
    if !has_app_id(&headers) || !vendor.send_code_ok.load(Ordering::SeqCst) {
        return StatusCode::BAD_REQUEST;
    }
    StatusCode::OK
}

async fn token_sms(
    State(vendor): State<Arc<MockVendor>>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    vendor.token_hits.fetch_add(1, Ordering::SeqCst);
    if !has_app_id(&headers) {
        return StatusCode::BAD_REQUEST.into_response();
    }
    if body["code"] != json!(VALID_CODE) || body["phone_number"].as_str().is_none() {
        return StatusCode::BAD_REQUEST.into_response();
    }
    let access = vendor.valid_token.lock().unwrap().clone();
    let response = (StatusCode::CREATED, Json(json!({ "access_token": access }))).into_response();
    if vendor.login_without_cookie.load(Ordering::SeqCst) {
        response
    } else {
        with_refresh_cookie(response, "rt-login")
    }
}

async fn refresh(State(vendor): State<Arc<MockVendor>>, headers: HeaderMap) -> Response {
    let n = vendor.refresh_hits.fetch_add(1, Ordering::SeqCst) + 1;
    *vendor.last_refresh_cookie.lock().unwrap() = headers
        .get(COOKIE)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string);
    if !has_app_id(&headers) {
        return StatusCode::BAD_REQUEST.into_response();
    }

    // Wide enough for concurrent callers to queue behind this refresh
    tokio::time::sleep(Duration::from_millis(50)).await;

    if !vendor.refresh_ok.load(Ordering::SeqCst) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if vendor.refresh_without_access.load(Ordering::SeqCst) {
        return with_refresh_cookie(Json(json!({})).into_response(), &format!("rt-{n}"));
    }

    let access = format!("access-{n}");
    *vendor.valid_token.lock().unwrap() = access.clone();
    let response = Json(json!({ "access_token": access })).into_response();
    if vendor.rotate_refresh.load(Ordering::SeqCst) {
        with_refresh_cookie(response, &format!("rt-{n}"))
    } else {
        response
    }
}

async fn cars(
    State(vendor): State<Arc<MockVendor>>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Response {
    vendor.cars_hits.fetch_add(1, Ordering::SeqCst);
    let paged = query.get("limit").map(String::as_str) == Some("100")
        && query.get("offset").map(String::as_str) == Some("0")
        && query.get("filter").map(String::as_str) == Some("[]");
    if !paged {
        return StatusCode::BAD_REQUEST.into_response();
    }
    if !vendor.accepts(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    if let Some(status) = *vendor.cars_failure.lock().unwrap() {
        return status.into_response();
    }
    if vendor.cars_stall.load(Ordering::SeqCst) {
        tokio::time::sleep(STALL).await;
    }

    let items = vendor.cars.lock().unwrap().clone();
    let body = json!({ "result": { "items": items } }).to_string();
    if vendor.cars_stall_body.load(Ordering::SeqCst) {
        return stalled_body(body);
    }
    (StatusCode::OK, body).into_response()
}

/// 200 response whose body stops halfway for [`STALL`]
fn stalled_body(body: String) -> Response {
    let (tx, rx) = tokio::sync::mpsc::channel::<Result<String, std::io::Error>>(2);
    tokio::spawn(async move {
        let (head, tail) = body.split_at(body.len() / 2);
        let _ = tx.send(Ok(head.to_string())).await;
        tokio::time::sleep(STALL).await;
        let _ = tx.send(Ok(tail.to_string())).await;
    });
    Response::new(Body::from_stream(
        tokio_stream::wrappers::ReceiverStream::new(rx),
    ))
}

async fn list_commands(
    State(vendor): State<Arc<MockVendor>>,
    Path(_device): Path<String>,
    headers: HeaderMap,
) -> Response {
    vendor.list_commands_hits.fetch_add(1, Ordering::SeqCst);
    if !vendor.accepts(&headers) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    let commands = vendor.commands.lock().unwrap().clone();
    Json(json!({ "result": commands })).into_response()
}

async fn send_command(
    State(vendor): State<Arc<MockVendor>>,
    Path(device): Path<String>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Response {
    vendor.send_command_hits.fetch_add(1, Ordering::SeqCst);
    if !vendor.accepts(&headers) {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    }
    *vendor.last_command.lock().unwrap() = Some(json!({ "device": device, "body": body }));
    Json(json!({})).into_response()
}

/// Start the mock on an ephemeral port
pub async fn start() -> (Arc<MockVendor>, SocketAddr) {
    let vendor = Arc::new(MockVendor::default());
    let router = Router::new()
        .route("/api/auth/send-code", post(send_code))
        .route("/api/auth/token/sms", post(token_sms))
        .route("/api/auth/refresh", post(refresh))
        .route("/car", get(cars))
        .route(
            "/telematics/devices/{device}/commands",
            get(list_commands).post(send_command),
        )
        .with_state(vendor.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (vendor, addr)
}

/// Client config whose timeout is shorter than [`STALL`]
pub fn short_timeout_config(addr: SocketAddr) -> ApiConfig {
    ApiConfig {
        request_timeout_secs: 1,
        ..api_config(addr)
    }
}

pub fn api_config(addr: SocketAddr) -> ApiConfig {
    ApiConfig {
        auth_base: format!("http://{addr}/api/auth"),
        fleet_base: format!("http://{addr}"),
        request_timeout_secs: 5,
        ..ApiConfig::default()
    }
}
