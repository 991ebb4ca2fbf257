//! Lab results endpoint.
//!
//! `GET /labs?test=<name>`: the patient's lab results, newest first,
//! optionally narrowed to one test, plus the names to filter by.

use axum::extract::{Query, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Page, SessionContext};
use crate::db::repository::{distinct_test_names, list_lab_results};
use crate::models::LabResult;

#[derive(Deserialize)]
pub struct LabsQuery {
    pub test: Option<String>,
}

#[derive(Serialize)]
pub struct LabsView {
    pub selected_test: Option<String>,
    pub test_names: Vec<String>,
    pub results: Vec<LabResult>,
}

/// `GET /labs`
pub async fn list(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Query(query): Query<LabsQuery>,
) -> Result<Response, ApiError> {
    let (patient_id, _) = session.patient()?;
    // An empty `?test=` (the "all tests" option) means no filter.
    let selected_test = query
        .test
        .map(|t| t.trim().to_string())
        .filter(|t| !t.is_empty());

    let view = {
        let conn = ctx.core.open_db()?;
        LabsView {
            test_names: distinct_test_names(&conn, patient_id)?,
            results: list_lab_results(&conn, patient_id, selected_test.as_deref())?,
            selected_test,
        }
    };

    let flashes = ctx.take_flashes(&session)?;
    Ok(Json(Page { flashes, view }).into_response())
}
