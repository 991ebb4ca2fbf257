//! Patient and doctor dashboards.
//!
//! Both builders read everything they need from a short-lived connection
//! first, drop it, and only then await the advisory collaborator.

use chrono::NaiveDateTime;
use futures_util::future::join_all;
use serde::Serialize;

use crate::advisory::{self, Advisory, ADVISORY_LOG_WINDOW};
use crate::core_state::{CoreError, CoreState};
use crate::db::repository::{
    get_doctor, get_patient, latest_recommendation, list_patients_for_doctor,
    pending_appointments_for_doctor, recent_health_logs,
};
use crate::db::DatabaseError;
use crate::models::{DoctorAppointment, HealthLog};

/// Logs shown on the patient's own dashboard.
pub const PATIENT_LOG_LIMIT: u32 = 7;

pub const NO_RECOMMENDATION_MESSAGE: &str = "No recommendations from your doctor yet.";

#[derive(Debug, Serialize)]
pub struct PatientDashboard {
    pub patient_id: i64,
    pub patient_name: String,
    pub is_caregiver: bool,
    pub doctor_name: Option<String>,
    /// Most recent first.
    pub logs: Vec<HealthLog>,
    pub advisory: Advisory,
    pub recommendation: String,
    pub recommended_at: Option<NaiveDateTime>,
}

#[derive(Debug, Serialize)]
pub struct PatientSummary {
    pub patient_id: i64,
    pub name: String,
    pub email: String,
    pub logs: Vec<HealthLog>,
    pub advisory: Advisory,
}

#[derive(Debug, Serialize)]
pub struct DoctorDashboard {
    pub doctor_id: i64,
    pub doctor_name: String,
    pub patients: Vec<PatientSummary>,
    pub pending_appointments: Vec<DoctorAppointment>,
}

fn not_found(entity_type: &str, id: i64) -> CoreError {
    CoreError::Database(DatabaseError::NotFound {
        entity_type: entity_type.into(),
        id: id.to_string(),
    })
}

pub async fn patient_dashboard(
    core: &CoreState,
    patient_id: i64,
    is_caregiver: bool,
) -> Result<PatientDashboard, CoreError> {
    let (patient, doctor_name, logs, recommendation) = {
        let conn = core.open_db()?;
        let patient = get_patient(&conn, patient_id)?.ok_or_else(|| not_found("patient", patient_id))?;
        let doctor_name = match patient.doctor_id {
            Some(id) => get_doctor(&conn, id)?.map(|d| d.name),
            None => None,
        };
        let logs = recent_health_logs(&conn, patient_id, PATIENT_LOG_LIMIT)?;
        let recommendation = latest_recommendation(&conn, patient_id)?;
        (patient, doctor_name, logs, recommendation)
    };

    let advisor = core.advisor();
    let advisory = advisory::advise(advisor.as_ref(), &logs).await;

    let (recommendation, recommended_at) = match recommendation {
        Some(r) => (r.advice, Some(r.date)),
        None => (NO_RECOMMENDATION_MESSAGE.to_string(), None),
    };

    Ok(PatientDashboard {
        patient_id,
        patient_name: patient.name,
        is_caregiver,
        doctor_name,
        logs,
        advisory,
        recommendation,
        recommended_at,
    })
}

/// Dashboard for a doctor: one advisory per assigned patient, requested
/// concurrently. Output keeps the patient list order.
pub async fn doctor_dashboard(core: &CoreState, doctor_id: i64) -> Result<DoctorDashboard, CoreError> {
    let (doctor, patients, pending_appointments) = {
        let conn = core.open_db()?;
        let doctor = get_doctor(&conn, doctor_id)?.ok_or_else(|| not_found("doctor", doctor_id))?;
        let mut patients = Vec::new();
        for patient in list_patients_for_doctor(&conn, doctor_id)? {
            let logs = recent_health_logs(&conn, patient.id, ADVISORY_LOG_WINDOW)?;
            patients.push((patient, logs));
        }
        let pending = pending_appointments_for_doctor(&conn, doctor_id)?;
        (doctor, patients, pending)
    };

    let advisor = core.advisor();
    let advisories = join_all(
        patients
            .iter()
            .map(|(_, logs)| advisory::advise(advisor.as_ref(), logs)),
    )
    .await;

    tracing::debug!(doctor_id, patients = patients.len(), "Doctor dashboard built");

    let patients = patients
        .into_iter()
        .zip(advisories)
        .map(|((patient, logs), advisory)| PatientSummary {
            patient_id: patient.id,
            name: patient.name,
            email: patient.email,
            logs,
            advisory,
        })
        .collect();

    Ok(DoctorDashboard {
        doctor_id,
        doctor_name: doctor.name,
        patients,
        pending_appointments,
    })
}
