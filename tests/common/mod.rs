//! Shared harness: the full router over an in-memory database and session
//! store, plus a tiny cookie-keeping client.

use axum::{
    body::Body,
    http::{header, Method, Request, StatusCode},
    Router,
};
use http_body_util::BodyExt;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use todo_api::{config::Config, db, state::AppState};
use tower::ServiceExt;
use tower_sessions::MemoryStore;

pub const SESSION_COOKIE: &str = "session";
pub const CSRF_COOKIE: &str = "csrf_token";

pub async fn test_state() -> AppState {
    let pool = db::connect_in_memory().await.expect("in-memory database");
    AppState::new(Config::default(), pool, Arc::new(MemoryStore::default()))
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: axum::http::HeaderMap,
    pub body: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.body).unwrap_or_else(|e| panic!("not JSON ({e}): {}", self.body))
    }

    /// Value of a cookie set by this response, if any.
    pub fn set_cookie(&self, name: &str) -> Option<String> {
        self.headers
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .filter_map(|v| cookie::Cookie::parse(v.to_string()).ok())
            .find(|c| c.name() == name)
            .map(|c| c.value().to_string())
    }
}

/// Browser stand-in: remembers cookies and echoes the CSRF token on unsafe
/// requests, like a well-behaved frontend would.
pub struct TestClient {
    pub app: Router,
    pub state: AppState,
    pub cookies: HashMap<String, String>,
    pub send_csrf: bool,
}

impl TestClient {
    pub async fn new() -> Self {
        let state = test_state().await;
        Self {
            app: todo_api::app(state.clone()),
            state,
            cookies: HashMap::new(),
            send_csrf: true,
        }
    }

    pub fn cookie(&self, name: &str) -> Option<String> {
        self.cookies.get(name).cloned()
    }

    pub async fn get(&mut self, path: &str) -> TestResponse {
        self.request(Method::GET, path, None).await
    }

    pub async fn post(&mut self, path: &str, body: Value) -> TestResponse {
        self.request(Method::POST, path, Some(body)).await
    }

    pub async fn request(&mut self, method: Method, path: &str, body: Option<Value>) -> TestResponse {
        let mut builder = Request::builder().method(method.clone()).uri(path);

        if !self.cookies.is_empty() {
            let cookie_header = self
                .cookies
                .iter()
                .map(|(k, v)| format!("{k}={v}"))
                .collect::<Vec<_>>()
                .join("; ");
            builder = builder.header(header::COOKIE, cookie_header);
        }
        if self.send_csrf && method != Method::GET {
            if let Some(token) = self.cookies.get(CSRF_COOKIE) {
                builder = builder.header("x-csrf-token", token);
            }
        }

        let request = match body {
            Some(json) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(json.to_string())),
            None => builder.body(Body::empty()),
        }
        .unwrap();

        let response = self.app.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();

        let response = TestResponse {
            status,
            headers,
            body: String::from_utf8_lossy(&bytes).into_owned(),
        };
        for name in [SESSION_COOKIE, CSRF_COOKIE] {
            if let Some(value) = response.set_cookie(name) {
                self.cookies.insert(name.to_string(), value);
            }
        }
        response
    }

    /// Fetch a CSRF cookie the way a browser frontend does on startup.
    pub async fn prime_csrf(&mut self) -> String {
        let response = self.get("/api/csrf-token").await;
        assert_eq!(response.status, StatusCode::OK);
        response.json()["csrf_token"].as_str().unwrap().to_string()
    }

    pub async fn signup(&mut self, name: &str, email: &str, password: &str) -> TestResponse {
        self.post(
            "/api/user/signup",
            serde_json::json!({ "name": name, "email": email, "password": password }),
        )
        .await
    }

    pub async fn login(&mut self, email: &str, password: &str) -> TestResponse {
        self.post(
            "/api/user/login",
            serde_json::json!({ "email": email, "password": password }),
        )
        .await
    }

    /// Signed up and logged in as ann@example.com.
    pub async fn logged_in() -> Self {
        let mut client = Self::new().await;
        client.prime_csrf().await;
        assert_eq!(
            client.signup("Ann", "ann@example.com", "longenough").await.status,
            StatusCode::OK
        );
        assert_eq!(
            client.login("ann@example.com", "longenough").await.status,
            StatusCode::OK
        );
        client
    }
}
