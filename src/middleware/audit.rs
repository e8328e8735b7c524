//! One structured log line per request: method, path, subject, status, and
//! latency.

use std::time::Instant;

use axum::{extract::Request, middleware::Next, response::Response};

use crate::middleware::CurrentUser;

pub async fn audit_log(req: Request, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let start = Instant::now();

    let response = next.run(req).await;

    let subject = response
        .extensions()
        .get::<CurrentUser>()
        .map(|u| u.0.clone())
        .unwrap_or_else(|| "anonymous".to_string());
    tracing::info!(
        %method,
        path = %path,
        subject = %subject,
        status = response.status().as_u16(),
        latency_ms = start.elapsed().as_millis() as u64,
        "request completed"
    );

    response
}
