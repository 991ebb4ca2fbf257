//! Appointment endpoints.
//!
//! - `GET /book`: assigned doctor and the patient's appointments
//! - `POST /book`: request a `pending` appointment with the assigned doctor
//! - `POST /appointments/:id/status`: doctor updates one of their appointments

use std::str::FromStr;

use axum::extract::{Path, State};
use axum::response::{IntoResponse, Response};
use axum::{Extension, Form, Json};
use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use crate::api::error::ApiError;
use crate::api::types::{ApiContext, Page, SessionContext};
use crate::db::repository::{
    get_doctor, get_patient, insert_appointment, list_patient_appointments,
    update_appointment_status,
};
use crate::db::DatabaseError;
use crate::models::enums::AppointmentStatus;
use crate::models::{Appointment, StaffContact};

pub const APPOINTMENT_BOOKED: &str = "Appointment booked successfully.";
pub const NO_DOCTOR_ASSIGNED: &str = "No doctor assigned to your account yet.";
pub const INVALID_SLOT: &str = "Please choose a valid date and time.";
pub const APPOINTMENT_UPDATED: &str = "Appointment updated.";
pub const INVALID_STATUS: &str = "Please choose a valid appointment status.";
pub const APPOINTMENT_NOT_FOUND: &str = "That appointment is not one of yours.";

#[derive(Serialize)]
pub struct BookingView {
    pub doctor: Option<StaffContact>,
    pub appointments: Vec<Appointment>,
}

#[derive(Deserialize)]
pub struct BookingForm {
    /// `YYYY-MM-DD`
    pub date: String,
    /// `HH:MM`
    pub time: String,
}

#[derive(Deserialize)]
pub struct StatusForm {
    pub status: String,
}

fn parse_slot(form: &BookingForm) -> Option<(NaiveDate, NaiveTime)> {
    let date = NaiveDate::parse_from_str(form.date.trim(), "%Y-%m-%d").ok()?;
    let time = form.time.trim();
    let time = NaiveTime::parse_from_str(time, "%H:%M")
        .or_else(|_| NaiveTime::parse_from_str(time, "%H:%M:%S"))
        .ok()?;
    Some((date, time))
}

fn patient_not_found(patient_id: i64) -> DatabaseError {
    DatabaseError::NotFound {
        entity_type: "patient".into(),
        id: patient_id.to_string(),
    }
}

/// `GET /book`
pub async fn booking_page(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
) -> Result<Response, ApiError> {
    let (patient_id, _) = session.patient()?;
    let view = {
        let conn = ctx.core.open_db()?;
        let patient = get_patient(&conn, patient_id)?.ok_or_else(|| patient_not_found(patient_id))?;
        let doctor = match patient.doctor_id {
            Some(id) => get_doctor(&conn, id)?.map(StaffContact::from),
            None => None,
        };
        BookingView {
            doctor,
            appointments: list_patient_appointments(&conn, patient_id)?,
        }
    };
    let flashes = ctx.take_flashes(&session)?;
    Ok(Json(Page { flashes, view }).into_response())
}

/// `POST /book`
pub async fn book(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Form(form): Form<BookingForm>,
) -> Result<Response, ApiError> {
    let (patient_id, _) = session.patient()?;

    let conn = ctx.core.open_db()?;
    let patient = get_patient(&conn, patient_id)?.ok_or_else(|| patient_not_found(patient_id))?;
    let Some(doctor_id) = patient.doctor_id else {
        return ctx.flash_redirect(&session, NO_DOCTOR_ASSIGNED, "/patient");
    };
    let Some((date, time)) = parse_slot(&form) else {
        return ctx.flash_redirect(&session, INVALID_SLOT, "/book");
    };
    let appointment_id = insert_appointment(&conn, patient_id, doctor_id, &date, &time)?;

    tracing::info!(patient_id, doctor_id, appointment_id, "Appointment requested");
    ctx.flash_redirect(&session, APPOINTMENT_BOOKED, "/patient")
}

/// `POST /appointments/:id/status`
pub async fn update_status(
    State(ctx): State<ApiContext>,
    Extension(session): Extension<SessionContext>,
    Path(appointment_id): Path<i64>,
    Form(form): Form<StatusForm>,
) -> Result<Response, ApiError> {
    let doctor_id = session.doctor_id()?;

    let status = match AppointmentStatus::from_str(form.status.trim()) {
        Ok(AppointmentStatus::Pending) | Err(_) => {
            return ctx.flash_redirect(&session, INVALID_STATUS, "/doctor");
        }
        Ok(status) => status,
    };

    let updated = {
        let conn = ctx.core.open_db()?;
        update_appointment_status(&conn, appointment_id, doctor_id, status)?
    };

    if !updated {
        tracing::debug!(doctor_id, appointment_id, "Status change refused");
        return ctx.flash_redirect(&session, APPOINTMENT_NOT_FOUND, "/doctor");
    }
    tracing::info!(doctor_id, appointment_id, status = status.as_str(), "Appointment status changed");
    ctx.flash_redirect(&session, APPOINTMENT_UPDATED, "/doctor")
}
