#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use axum::{
    Json, Router,
    body::Bytes,
    extract::{Path, Query, State},
    http::{StatusCode, Uri},
    response::{IntoResponse, Response},
    routing::{get, post},
};
use journey_session::Config;
use journey_session::config::StoreKind;
use parking_lot::Mutex;
use serde_json::{Value, json};

/// 测试用的后端替身
#[derive(Clone, Default)]
pub struct MockBackend {
    inner: Arc<Mutex<MockState>>,
}

#[derive(Default)]
pub struct MockState {
    pub me_status: u16,
    pub me_body: Value,
    pub me_delay: Option<Duration>,
    pub me_calls: usize,
    pub login_calls: usize,
    pub landmark_calls: usize,
    pub logout_status: HashMap<String, u16>,
    pub logout_calls: Vec<String>,
    pub session_expired: bool,
    pub tokens: i64,
}

pub fn full_user() -> Value {
    json!({
        "id": 1,
        "name": "Ada Lovelace",
        "email": "a@b.com",
        "password": "$2a$07$hash",
        "token": 20,
        "tours": [{
            "id": 4,
            "destination": "Bandarban",
            "days": [{ "id": 11, "activities": [], "photos": [] }]
        }]
    })
}

impl MockBackend {
    pub fn new() -> Self {
        let backend = Self::default();
        {
            let mut state = backend.inner.lock();
            state.me_status = 200;
            state.me_body = full_user();
            state.tokens = 20;
        }
        backend
    }

    pub fn state(&self) -> parking_lot::MutexGuard<'_, MockState> {
        self.inner.lock()
    }

    pub fn respond_me(&self, status: u16, body: Value) {
        let mut state = self.inner.lock();
        state.me_status = status;
        state.me_body = body;
    }

    pub fn set_logout(&self, path: &str, status: u16) {
        self.inner.lock().logout_status.insert(path.to_string(), status);
    }

    pub fn me_calls(&self) -> usize {
        self.inner.lock().me_calls
    }

    pub async fn spawn(&self) -> String {
        let app = Router::new()
            .route("/user/me", get(me))
            .route("/user/login", post(login))
            .route("/user/signup", post(signup))
            .route("/user/logout", post(logout))
            .route("/logout", post(logout))
            .route("/auth/logout", post(logout))
            .route("/activity/add", post(add_activity))
            .route("/activity/{id}/complete", post(complete_activity))
            .route("/photo/upload", post(upload_photo))
            .route("/tour/title", post(tour_title))
            .route("/api/landmark/predict", post(predict_landmark))
            .route("/token/balance", get(balance))
            .route("/token/add", post(add_tokens))
            .route("/token/apply-coupon", post(apply_coupon))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind mock backend");
        let addr = listener.local_addr().expect("mock backend addr");
        tokio::spawn(async move { axum::serve(listener, app).await.expect("serve mock backend") });
        format!("http://{}", addr)
    }
}

/// 一个拒绝连接的地址
pub async fn dead_base_url() -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
        .await
        .expect("bind");
    let addr = listener.local_addr().expect("addr");
    drop(listener);
    format!("http://{}", addr)
}

pub fn test_config(base_url: &str) -> Config {
    Config {
        api_base_url: base_url.to_string(),
        http_timeout_secs: 5,
        store: StoreKind::Memory,
        ..Config::default()
    }
}

fn status(code: u16) -> StatusCode {
    StatusCode::from_u16(code).expect("valid status")
}

async fn me(State(backend): State<MockBackend>) -> Response {
    let (code, body, delay) = {
        let mut state = backend.inner.lock();
        state.me_calls += 1;
        (state.me_status, state.me_body.clone(), state.me_delay)
    };
    if let Some(delay) = delay {
        tokio::time::sleep(delay).await;
    }
    if code == 200 {
        Json(body).into_response()
    } else {
        (status(code), "Invalid token").into_response()
    }
}

async fn login(State(backend): State<MockBackend>, Json(req): Json<Value>) -> Response {
    backend.inner.lock().login_calls += 1;
    if req["password"] == "hunter22" {
        Json(full_user()).into_response()
    } else {
        (StatusCode::UNAUTHORIZED, "Login failed").into_response()
    }
}

async fn signup(Json(req): Json<Value>) -> Response {
    if req["email"] == "taken@b.com" {
        return (StatusCode::CONFLICT, "User with this email already exists").into_response();
    }
    Json(json!({
        "id": 2,
        "name": req["name"],
        "email": req["email"],
        "password": "$2a$07$hash",
        "tours": []
    }))
    .into_response()
}

async fn logout(State(backend): State<MockBackend>, uri: Uri) -> Response {
    let path = uri.path().to_string();
    let mut state = backend.inner.lock();
    state.logout_calls.push(path.clone());
    let code = state.logout_status.get(&path).copied().unwrap_or(404);
    status(code).into_response()
}

fn check_session(backend: &MockBackend) -> Result<(), Response> {
    if backend.inner.lock().session_expired {
        Err((StatusCode::UNAUTHORIZED, "Invalid token").into_response())
    } else {
        Ok(())
    }
}

async fn add_activity(State(backend): State<MockBackend>, Json(req): Json<Value>) -> Response {
    if let Err(resp) = check_session(&backend) {
        return resp;
    }
    let mut user = full_user();
    user["tours"][0]["days"][0]["activities"] = json!([{
        "id": 100,
        "description": req["description"],
        "status": "pending"
    }]);
    Json(user).into_response()
}

async fn complete_activity(State(backend): State<MockBackend>, Path(id): Path<i64>) -> Response {
    if let Err(resp) = check_session(&backend) {
        return resp;
    }
    let mut user = full_user();
    user["tours"][0]["days"][0]["activities"] =
        json!([{ "id": id, "description": "Hike", "status": "done" }]);
    Json(user).into_response()
}

async fn upload_photo(State(backend): State<MockBackend>, _body: Bytes) -> Response {
    if let Err(resp) = check_session(&backend) {
        return resp;
    }
    Json(json!({ "photoId": 77, "photoUrl": "https://cdn.example/77.jpg" })).into_response()
}

async fn predict_landmark(State(backend): State<MockBackend>, _body: Bytes) -> Response {
    backend.inner.lock().landmark_calls += 1;
    if let Err(resp) = check_session(&backend) {
        return resp;
    }
    Json(json!({
        "location": "Ahsan Manzil",
        "link": "https://en.wikipedia.org/wiki/Ahsan_Manzil"
    }))
    .into_response()
}

async fn tour_title(State(backend): State<MockBackend>, Json(_req): Json<Value>) -> Response {
    if let Err(resp) = check_session(&backend) {
        return resp;
    }
    Json(json!({ "status": "ok" })).into_response()
}

async fn balance(State(backend): State<MockBackend>) -> Response {
    let tokens = backend.inner.lock().tokens;
    Json(json!({ "tokens": tokens })).into_response()
}

async fn add_tokens(
    State(backend): State<MockBackend>,
    Query(query): Query<HashMap<String, i64>>,
) -> Response {
    let amount = query.get("tokens").copied().unwrap_or(0);
    let mut state = backend.inner.lock();
    state.tokens += amount;
    Json(json!({
        "tokens": state.tokens,
        "message": format!("{} tokens added successfully", amount)
    }))
    .into_response()
}

async fn apply_coupon(State(backend): State<MockBackend>, Json(req): Json<Value>) -> Response {
    let code = req["couponCode"].as_str().unwrap_or_default();
    if !code.eq_ignore_ascii_case("sizan") {
        return (StatusCode::BAD_REQUEST, "Invalid coupon code.").into_response();
    }
    let mut state = backend.inner.lock();
    state.tokens += 10;
    Json(json!({
        "tokens": state.tokens,
        "message": "10 tokens added successfully"
    }))
    .into_response()
}
