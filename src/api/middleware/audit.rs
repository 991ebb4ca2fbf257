//! Request logging middleware.
//!
//! Logs every request with method, path, status and latency. Runs
//! outermost, so it reads the session identity from the response
//! extensions the gate left behind.

use std::time::Instant;

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::api::types::SessionContext;

pub async fn log_request(req: Request<Body>, next: Next) -> Response {
    let method = req.method().clone();
    let path = req.uri().path().to_string();
    let started = Instant::now();

    let response = next.run(req).await;

    let status = response.status().as_u16();
    let elapsed_ms = started.elapsed().as_millis() as u64;
    match response.extensions().get::<SessionContext>() {
        Some(session) => tracing::info!(
            %method,
            path = %path,
            status,
            elapsed_ms,
            role = session.identity.role().as_str(),
            user = session.identity.display_name(),
            "request"
        ),
        None => tracing::info!(%method, path = %path, status, elapsed_ms, "request"),
    }

    response
}
