//! Doctor dashboard and recommendations.
//!
//! - `GET /doctor`: assigned patients with logs and advisories
//! - `GET /recommend/:patient_id`: previous recommendations for a patient
//! - `POST /recommend/:patient_id`: write a new recommendation

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form, Json};
use rusqlite::Connection;
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Page, SessionContext};
use crate::dashboard;
use crate::db::repository::{get_patient, insert_recommendation, list_recommendations};
use crate::db::DatabaseError;
use crate::models::{Patient, Recommendation};

pub const RECOMMENDATION_SAVED: &str = "Recommendation saved.";
pub const PATIENT_NOT_ASSIGNED: &str = "That patient is not assigned to you.";

#[derive(Serialize)]
pub struct RecommendView {
    pub patient_id: i64,
    pub patient_name: String,
    /// Newest first.
    pub recommendations: Vec<Recommendation>,
}

#[derive(Deserialize)]
pub struct RecommendForm {
    pub advice: String,
}

/// The patient, if it exists and is assigned to `doctor_id`.
fn assigned_patient(
    conn: &Connection,
    doctor_id: i64,
    patient_id: i64,
) -> Result<Option<Patient>, DatabaseError> {
    Ok(get_patient(conn, patient_id)?.filter(|p| p.doctor_id == Some(doctor_id)))
}

/// `GET /doctor`
pub async fn dashboard(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Response, ApiError> {
    let doctor_id = session.doctor_id()?;
    let view = dashboard::doctor_dashboard(&ctx.core, doctor_id).await?;
    let flashes = ctx.take_flashes(&session)?;
    Ok(Json(Page { flashes, view }).into_response())
}

/// `GET /recommend/:patient_id`
pub async fn recommend_page(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Path(patient_id): Path<i64>,
) -> Result<Response, ApiError> {
    let doctor_id = session.doctor_id()?;
    let view = {
        let conn = ctx.core.open_db()?;
        match assigned_patient(&conn, doctor_id, patient_id)? {
            Some(patient) => Some(RecommendView {
                patient_id,
                patient_name: patient.name,
                recommendations: list_recommendations(&conn, patient_id)?,
            }),
            None => None,
        }
    };

    let Some(view) = view else {
        tracing::warn!(doctor_id, patient_id, "Recommendation view for unassigned patient");
        return ctx.flash_redirect(&session, PATIENT_NOT_ASSIGNED, "/doctor");
    };
    let flashes = ctx.take_flashes(&session)?;
    Ok(Json(Page { flashes, view }).into_response())
}

/// `POST /recommend/:patient_id`
pub async fn recommend(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Path(patient_id): Path<i64>,
    Form(form): Form<RecommendForm>,
) -> Result<Response, ApiError> {
    let doctor_id = session.doctor_id()?;
    let now = chrono::Local::now().naive_local();

    let saved = {
        let conn = ctx.core.open_db()?;
        match assigned_patient(&conn, doctor_id, patient_id)? {
            Some(_) => Some(insert_recommendation(&conn, patient_id, doctor_id, &form.advice, &now)?),
            None => None,
        }
    };

    match saved {
        Some(recommendation_id) => {
            tracing::info!(doctor_id, patient_id, recommendation_id, "Recommendation saved");
            ctx.flash_redirect(&session, RECOMMENDATION_SAVED, "/doctor")
        }
        None => {
            tracing::warn!(doctor_id, patient_id, "Recommendation for unassigned patient refused");
            ctx.flash_redirect(&session, PATIENT_NOT_ASSIGNED, "/doctor")
        }
    }
}
