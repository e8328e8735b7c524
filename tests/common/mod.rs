//! Shared fixtures for the HTTP-level tests: a router wired to in-memory
//! collaborators, plus request and response helpers.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{header, Request, Response},
    Router,
};
use serde_json::Value;
use tower::ServiceExt;

use quill_auth::db::MemoryAccountStore;
use quill_auth::routes;
use quill_auth::security::token_revocation::MemoryRevocationRegistry;
use quill_auth::security::{SecretBox, TokenIssuer};
use quill_auth::services::{AuthService, MemoryCodeDelivery, TwoFaService};
use quill_auth::AppState;

/// Fixed anti-forgery token used by [`post_json`]; the double-submit check
/// only cares that cookie and header agree.
pub const CSRF_TOKEN: &str = "test-csrf-token";

pub struct TestApp {
    pub router: Router,
    pub accounts: Arc<MemoryAccountStore>,
    pub registry: Arc<MemoryRevocationRegistry>,
    pub delivery: Arc<MemoryCodeDelivery>,
}

pub fn test_app() -> TestApp {
    let accounts = Arc::new(MemoryAccountStore::new());
    let registry = Arc::new(MemoryRevocationRegistry::new());
    let delivery = Arc::new(MemoryCodeDelivery::new());

    let two_fa = TwoFaService::new(
        accounts.clone(),
        delivery.clone(),
        SecretBox::new(&[11u8; 32]),
    );
    let auth = AuthService::new(
        accounts.clone(),
        registry.clone(),
        Arc::new(TokenIssuer::new("integration-test-secret")),
        two_fa.clone(),
    );

    let state = AppState {
        auth,
        two_fa,
        cookie_secure: false,
    };

    TestApp {
        router: routes::router(state),
        accounts,
        registry,
        delivery,
    }
}

impl TestApp {
    pub async fn send(&self, req: Request<Body>) -> Response<Body> {
        self.router
            .clone()
            .oneshot(req)
            .await
            .expect("infallible service")
    }
}

fn cookie_header(cookies: &[(String, String)]) -> String {
    cookies
        .iter()
        .map(|(name, value)| format!("{name}={value}"))
        .collect::<Vec<_>>()
        .join("; ")
}

/// A JSON POST carrying a matching anti-forgery cookie/header pair plus any
/// session cookies.
pub fn post_json(path: &str, body: &Value, session_cookies: &[(String, String)]) -> Request<Body> {
    let mut cookies = vec![("quill-csrf".to_string(), CSRF_TOKEN.to_string())];
    cookies.extend_from_slice(session_cookies);

    Request::builder()
        .method("POST")
        .uri(path)
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, cookie_header(&cookies))
        .header("x-csrf-token", CSRF_TOKEN)
        .body(Body::from(body.to_string()))
        .expect("request builds")
}

pub fn get(path: &str, session_cookies: &[(String, String)]) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(path);
    if !session_cookies.is_empty() {
        builder = builder.header(header::COOKIE, cookie_header(session_cookies));
    }
    builder.body(Body::empty()).expect("request builds")
}

pub async fn body_json(response: Response<Body>) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("body reads");
    serde_json::from_slice(&bytes).expect("body is json")
}

/// All `Set-Cookie` headers on a response, raw.
pub fn set_cookies(response: &Response<Body>) -> Vec<String> {
    response
        .headers()
        .get_all(header::SET_COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .map(str::to_string)
        .collect()
}

/// The value assigned to `name` by a `Set-Cookie` header, if any.
pub fn set_cookie_value(response: &Response<Body>, name: &str) -> Option<String> {
    set_cookies(response).iter().find_map(|raw| {
        let (pair, _) = raw.split_once(';')?;
        let (cookie_name, value) = pair.split_once('=')?;
        (cookie_name == name).then(|| value.to_string())
    })
}

/// Extract the session cookie pair issued by a login-style response.
pub fn session_cookies(response: &Response<Body>) -> Vec<(String, String)> {
    ["access_token", "refresh_token"]
        .iter()
        .filter_map(|name| set_cookie_value(response, name).map(|v| (name.to_string(), v)))
        .collect()
}

pub async fn signup(app: &TestApp, email: &str, password: &str) {
    let response = app
        .send(post_json(
            "/auth/signup",
            &serde_json::json!({ "email": email, "name": "Test User", "password": password }),
            &[],
        ))
        .await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
}

/// Log in and return the issued session cookies, asserting no challenge.
pub async fn login(app: &TestApp, email: &str, password: &str) -> Vec<(String, String)> {
    let response = app
        .send(post_json(
            "/auth/login",
            &serde_json::json!({ "email": email, "password": password }),
            &[],
        ))
        .await;
    assert_eq!(response.status(), axum::http::StatusCode::OK);
    let cookies = session_cookies(&response);
    assert_eq!(cookies.len(), 2, "expected access and refresh cookies");
    cookies
}
