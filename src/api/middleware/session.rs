//! Session gate.
//!
//! The single place where protected routes check for a live session of
//! the right kind. Requests without one are redirected to `/login`
//! before any handler runs. On success the `SessionContext` is injected
//! into request extensions (for handlers) and response extensions (for
//! the audit log).

use axum::body::Body;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Redirect, Response};

use crate::api::error::ApiError;
use crate::api::types::ApiContext;
use crate::session::Identity;

/// Allow patient and caregiver sessions.
pub async fn require_patient(req: Request<Body>, next: Next) -> Response {
    gate(req, next, |identity| matches!(identity, Identity::Patient { .. })).await
}

/// Allow doctor sessions.
pub async fn require_doctor(req: Request<Body>, next: Next) -> Response {
    gate(req, next, |identity| matches!(identity, Identity::Doctor { .. })).await
}

async fn gate(req: Request<Body>, next: Next, allowed: fn(&Identity) -> bool) -> Response {
    match gate_inner(req, next, allowed).await {
        Ok(resp) => resp,
        Err(err) => err.into_response(),
    }
}

async fn gate_inner(
    mut req: Request<Body>,
    next: Next,
    allowed: fn(&Identity) -> bool,
) -> Result<Response, ApiError> {
    let ctx: ApiContext = req
        .extensions()
        .get::<ApiContext>()
        .cloned()
        .ok_or(ApiError::Internal("missing API context".into()))?;

    // Lock released inside resolve_session, before any .await
    let session = match ctx.resolve_session(req.headers())? {
        Some(session) if allowed(&session.identity) => session,
        Some(session) => {
            tracing::debug!(
                path = %req.uri().path(),
                role = session.identity.role().as_str(),
                "Session role not allowed here"
            );
            return Ok(Redirect::to("/login").into_response());
        }
        None => {
            tracing::debug!(path = %req.uri().path(), "No live session, redirecting to login");
            return Ok(Redirect::to("/login").into_response());
        }
    };

    req.extensions_mut().insert(session.clone());
    let mut response = next.run(req).await;
    response.extensions_mut().insert(session);
    Ok(response)
}
