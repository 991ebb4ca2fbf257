//! Login, logout and the root redirect.
//!
//! - `GET /`: redirect to `/login`
//! - `GET /login`: login view
//! - `POST /login`: role/email/password form
//! - `GET /logout`: end the session

use std::str::FromStr;

use axum::extract::State;
use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use axum::{Form, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{expired_session_cookie, session_cookie, session_token, ApiContext, Page};
use crate::auth;
use crate::core_state::CoreError;
use crate::models::enums::Role;
use crate::session::Identity;

const ROLES: [Role; 3] = [Role::Patient, Role::Caregiver, Role::Doctor];

#[derive(Serialize)]
pub struct LoginView {
    pub roles: Vec<&'static str>,
    /// Present when the browser already holds a live session.
    pub signed_in_as: Option<Identity>,
}

#[derive(Deserialize)]
pub struct LoginForm {
    pub role: String,
    pub email: String,
    pub password: String,
}

fn login_page(flashes: Vec<String>, signed_in_as: Option<Identity>) -> Response {
    Json(Page {
        flashes,
        view: LoginView {
            roles: ROLES.iter().map(Role::as_str).collect(),
            signed_in_as,
        },
    })
    .into_response()
}

/// `GET /`
pub async fn index() -> Redirect {
    Redirect::to("/login")
}

/// `GET /login`
pub async fn page(State(ctx): State<ApiContext>, headers: HeaderMap) -> Result<Response, ApiError> {
    match ctx.resolve_session(&headers)? {
        Some(session) => {
            let flashes = ctx.take_flashes(&session)?;
            Ok(login_page(flashes, Some(session.identity)))
        }
        None => Ok(login_page(Vec::new(), None)),
    }
}

/// `POST /login`
pub async fn submit(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
    Form(form): Form<LoginForm>,
) -> Result<Response, ApiError> {
    let Ok(role) = Role::from_str(form.role.trim()) else {
        return Ok(login_page(vec![auth::INVALID_ROLE.to_string()], None));
    };

    // Password hashing is CPU-bound; keep it off the async workers.
    let core = ctx.core.clone();
    let LoginForm { email, password, .. } = form;
    let identity = tokio::task::spawn_blocking(move || -> Result<Option<Identity>, CoreError> {
        let conn = core.open_db()?;
        let mut rng = rand::thread_rng();
        Ok(auth::login(&conn, role, &email, &password, &mut rng)?)
    })
    .await
    .map_err(|e| ApiError::Internal(format!("login task failed: {e}")))??;

    let Some(identity) = identity else {
        tracing::info!(role = role.as_str(), "Login rejected");
        return Ok(login_page(vec![auth::rejection_message(role).to_string()], None));
    };

    let token = {
        let mut sessions = ctx.core.lock_sessions()?;
        // A fresh token on every login; any previous session is dropped.
        if let Some(old) = session_token(&headers) {
            sessions.remove(&old);
        }
        sessions.create(identity.clone())
    };

    tracing::info!(role = identity.role().as_str(), user = identity.display_name(), "Login succeeded");

    Ok((
        [(header::SET_COOKIE, session_cookie(&token))],
        Redirect::to(identity.home_path()),
    )
        .into_response())
}

/// `GET /logout`
pub async fn logout(State(ctx): State<ApiContext>, headers: HeaderMap) -> Result<Response, ApiError> {
    if let Some(token) = session_token(&headers) {
        if ctx.core.lock_sessions()?.remove(&token) {
            tracing::debug!("Session ended");
        }
    }
    Ok((
        [(header::SET_COOKIE, expired_session_cookie())],
        Redirect::to("/login"),
    )
        .into_response())
}
