//! Shared types for the HTTP layer: context, session cookie, page wrapper.

use std::sync::Arc;

use axum::http::{header, HeaderMap};
use axum::response::{IntoResponse, Redirect, Response};
use serde::Serialize;

use crate::api::error::ApiError;
use crate::core_state::CoreState;
use crate::session::Identity;

pub const SESSION_COOKIE: &str = "telecare_session";

// ═══════════════════════════════════════════════════════════
// API context: shared state for the router
// ═══════════════════════════════════════════════════════════

/// Shared context for all routes and middleware.
#[derive(Clone)]
pub struct ApiContext {
    pub core: Arc<CoreState>,
}

impl ApiContext {
    pub fn new(core: Arc<CoreState>) -> Self {
        Self { core }
    }

    /// Resolve the request's session cookie, if any, to a live session.
    pub fn resolve_session(&self, headers: &HeaderMap) -> Result<Option<SessionContext>, ApiError> {
        let Some(token) = session_token(headers) else {
            return Ok(None);
        };
        let identity = self.core.lock_sessions()?.get(&token);
        Ok(identity.map(|identity| SessionContext { token, identity }))
    }

    pub fn flash(&self, session: &SessionContext, message: &str) -> Result<(), ApiError> {
        self.core.lock_sessions()?.push_flash(&session.token, message);
        Ok(())
    }

    pub fn take_flashes(&self, session: &SessionContext) -> Result<Vec<String>, ApiError> {
        Ok(self.core.lock_sessions()?.take_flashes(&session.token))
    }

    /// Queue a flash and redirect (the usual ending of a form POST).
    pub fn flash_redirect(
        &self,
        session: &SessionContext,
        message: &str,
        to: &str,
    ) -> Result<Response, ApiError> {
        self.flash(session, message)?;
        Ok(Redirect::to(to).into_response())
    }
}

// ═══════════════════════════════════════════════════════════
// Session context: injected by the session gate
// ═══════════════════════════════════════════════════════════

/// Authenticated session, injected into request extensions by the gate.
#[derive(Debug, Clone)]
pub struct SessionContext {
    pub token: String,
    pub identity: Identity,
}

impl SessionContext {
    /// `(patient_id, is_caregiver)` for patient-side sessions.
    pub fn patient(&self) -> Result<(i64, bool), ApiError> {
        match self.identity {
            Identity::Patient {
                patient_id,
                is_caregiver,
                ..
            } => Ok((patient_id, is_caregiver)),
            Identity::Doctor { .. } => Err(ApiError::Unauthorized),
        }
    }

    pub fn doctor_id(&self) -> Result<i64, ApiError> {
        match self.identity {
            Identity::Doctor { doctor_id, .. } => Ok(doctor_id),
            Identity::Patient { .. } => Err(ApiError::Unauthorized),
        }
    }
}

// ═══════════════════════════════════════════════════════════
// Cookie helpers
// ═══════════════════════════════════════════════════════════

/// Extract the session token from the `Cookie` header(s).
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|v| v.to_str().ok())
        .flat_map(|v| v.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

pub fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; HttpOnly; SameSite=Lax; Path=/")
}

pub fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; HttpOnly; SameSite=Lax; Path=/; Max-Age=0")
}

// ═══════════════════════════════════════════════════════════
// Page wrapper
// ═══════════════════════════════════════════════════════════

/// A view model plus the flash messages drained for this view.
#[derive(Debug, Serialize)]
pub struct Page<T: Serialize> {
    pub flashes: Vec<String>,
    #[serde(flatten)]
    pub view: T,
}
