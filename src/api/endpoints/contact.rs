//! Care-team directory and messaging.
//!
//! - `GET /contact`: doctors and nurses (public)
//! - `POST /message_care_team`: patient sends a message

use axum::extract::State;
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Page, SessionContext};
use crate::db::repository::{insert_message, list_doctors, list_messages_for_patient, list_nurses};
use crate::models::{Message, StaffContact};
use crate::session::Identity;

pub const MESSAGE_SENT: &str = "Message sent to your care team.";

#[derive(Serialize)]
pub struct ContactView {
    pub doctors: Vec<StaffContact>,
    pub nurses: Vec<StaffContact>,
    /// Messages the signed-in patient has sent; empty otherwise.
    pub sent_messages: Vec<Message>,
}

#[derive(Deserialize)]
pub struct MessageForm {
    pub recipient_id: i64,
    pub subject: String,
    pub body: String,
}

/// `GET /contact`
pub async fn directory(
    State(ctx): State<ApiContext>,
    headers: HeaderMap,
) -> Result<Response, ApiError> {
    let session = ctx.resolve_session(&headers)?;
    let patient_id = match session.as_ref().map(|s| &s.identity) {
        Some(Identity::Patient { patient_id, .. }) => Some(*patient_id),
        _ => None,
    };

    let view = {
        let conn = ctx.core.open_db()?;
        ContactView {
            doctors: list_doctors(&conn)?.into_iter().map(StaffContact::from).collect(),
            nurses: list_nurses(&conn)?.into_iter().map(StaffContact::from).collect(),
            sent_messages: match patient_id {
                Some(id) => list_messages_for_patient(&conn, id)?,
                None => Vec::new(),
            },
        }
    };

    let flashes = match &session {
        Some(session) => ctx.take_flashes(session)?,
        None => Vec::new(),
    };
    Ok(Json(Page { flashes, view }).into_response())
}

/// `POST /message_care_team`
pub async fn send_message(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Form(form): Form<MessageForm>,
) -> Result<Response, ApiError> {
    let (patient_id, _) = session.patient()?;
    let now = chrono::Local::now().naive_local();
    let message_id = {
        let conn = ctx.core.open_db()?;
        insert_message(&conn, patient_id, form.recipient_id, &form.subject, &form.body, &now)?
    };
    tracing::info!(patient_id, recipient_id = form.recipient_id, message_id, "Message sent");
    ctx.flash_redirect(&session, MESSAGE_SENT, "/contact")
}
