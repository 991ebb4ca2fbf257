//! Patient dashboard and health log submission.
//!
//! - `GET /patient`: dashboard with recent logs, advisory, recommendation
//! - `POST /log`: append a health log entry

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form, Json};
use serde::Deserialize;

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Page, SessionContext};
use crate::dashboard;
use crate::db::repository::insert_health_log;

pub const LOG_SAVED: &str = "Health status logged successfully.";

#[derive(Deserialize)]
pub struct HealthLogForm {
    pub symptoms: String,
    pub medication: String,
}

/// `GET /patient`
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Response, ApiError> {
    let (patient_id, is_caregiver) = session.patient()?;
    let view = dashboard::patient_dashboard(&ctx.core, patient_id, is_caregiver).await?;
    let flashes = ctx.take_flashes(&session)?;
    Ok(Json(Page { flashes, view }).into_response())
}

/// `POST /log`
pub async fn log_health(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Form(form): Form<HealthLogForm>,
) -> Result<Response, ApiError> {
    let (patient_id, _) = session.patient()?;
    let now = chrono::Local::now().naive_local();
    let log_id = {
        let conn = ctx.core.open_db()?;
        insert_health_log(&conn, patient_id, &form.symptoms, &form.medication, &now)?
    };
    tracing::debug!(patient_id, log_id, "Health log recorded");
    ctx.flash_redirect(&session, LOG_SAVED, "/patient")
}
