//! Shared harness for router-level tests.

#![allow(dead_code)]

use axum::{
    Router,
    body::Body,
    http::{HeaderMap, Method, Request, StatusCode, header},
};
use chrono::Duration;
use serde_json::{Value, json};
use tower::ServiceExt;

use helpdesk::api::{AppState, create_router};
use helpdesk::auth::{AuthConfig, Identity, TokenCodec};
use helpdesk::db::Database;
use helpdesk::user::CreateUserRequest;

pub const SECRET: &str = "integration-test-secret-at-least-32-characters";
pub const STAFF_TOKEN: &str = "let-me-in-as-staff";
pub const PASSWORD: &str = "password123";

pub struct TestApp {
    pub router: Router,
    pub state: AppState,
    _db: Database,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

impl TestResponse {
    /// `name=value` pair of the first `Set-Cookie` header.
    pub fn session_cookie(&self) -> Option<String> {
        self.headers
            .get(header::SET_COOKIE)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.split(';').next())
            .map(str::to_string)
    }
}

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: Some(SECRET.to_string()),
        staff_token: Some(STAFF_TOKEN.to_string()),
        ..Default::default()
    }
}

pub fn codec() -> TokenCodec {
    TokenCodec::new(SECRET.as_bytes()).unwrap()
}

/// Cookie header carrying a token for `identity` that expires in `ttl`.
pub fn cookie_for(identity: &Identity, ttl: Duration) -> String {
    format!("token={}", codec().issue(identity, ttl).unwrap().token)
}

impl TestApp {
    pub async fn new() -> Self {
        let db = Database::in_memory().await.unwrap();
        let state = AppState::new(&db, &auth_config()).unwrap();
        let router = create_router(state.clone(), 64);
        Self {
            router,
            state,
            _db: db,
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        body: Option<Value>,
    ) -> TestResponse {
        self.request_with_headers(method, uri, cookie, &[], body)
            .await
    }

    pub async fn request_with_headers(
        &self,
        method: Method,
        uri: &str,
        cookie: Option<&str>,
        extra_headers: &[(&str, &str)],
        body: Option<Value>,
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(cookie) = cookie {
            builder = builder.header(header::COOKIE, cookie);
        }
        for (name, value) in extra_headers {
            builder = builder.header(*name, *value);
        }

        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };

        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = axum::body::to_bytes(response.into_body(), 1024 * 1024)
            .await
            .unwrap();
        let body = if bytes.is_empty() {
            Value::Null
        } else {
            serde_json::from_slice(&bytes)
                .unwrap_or_else(|_| Value::String(String::from_utf8_lossy(&bytes).into()))
        };

        TestResponse {
            status,
            headers,
            body,
        }
    }

    /// Create a user straight through the service layer.
    pub async fn seed_user(&self, name: &str, is_staff: bool, is_superuser: bool) -> Identity {
        let user = self
            .state
            .users
            .create_user(CreateUserRequest {
                email: format!("{name}@example.com"),
                password: PASSWORD.to_string(),
                username: name.to_string(),
                is_staff,
                is_superuser,
            })
            .await
            .unwrap();
        user.identity()
    }

    /// Log in through the API and return the session cookie pair.
    pub async fn login(&self, email: &str) -> String {
        let response = self
            .request(
                Method::POST,
                "/login",
                None,
                Some(json!({ "email": email, "password": PASSWORD })),
            )
            .await;
        assert_eq!(response.status, StatusCode::OK, "{:?}", response.body);
        response.session_cookie().unwrap()
    }

    /// Open a ticket as the holder of `cookie` and return its id.
    pub async fn open_ticket(&self, cookie: &str, topic: &str) -> i64 {
        let response = self
            .request(
                Method::POST,
                "/tickets",
                Some(cookie),
                Some(json!({ "topic": topic, "text": "Please help" })),
            )
            .await;
        assert_eq!(response.status, StatusCode::CREATED, "{:?}", response.body);
        response.body["id"].as_i64().unwrap()
    }
}
