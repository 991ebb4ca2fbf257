//! Bulk import of accounts and lab results from a JSON file.
//!
//! Passwords arrive in plaintext and are hashed on the way in. Accounts
//! whose email already exists and lab results already on file are
//! skipped, so the same file can be imported on every startup.

use std::path::Path;

use chrono::NaiveDate;
use rusqlite::Connection;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::crypto::{hash_password_with_iterations, PBKDF2_ITERATIONS};
use crate::db::repository::{
    find_doctor_by_email, find_patient_by_email, insert_doctor, insert_lab_result, insert_nurse,
    insert_patient, lab_result_exists, list_nurses, NewLabResult,
};
use crate::db::DatabaseError;

#[derive(Error, Debug)]
pub enum SeedError {
    #[error("Cannot read seed file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Malformed seed file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),

    #[error("Unknown {entity} email in seed file: {email}")]
    UnknownReference { entity: &'static str, email: String },

    #[error("Invalid date in seed file: {0}")]
    InvalidDate(String),
}

impl From<rusqlite::Error> for SeedError {
    fn from(err: rusqlite::Error) -> Self {
        SeedError::Database(DatabaseError::Sqlite(err))
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct SeedFile {
    #[serde(default)]
    pub doctors: Vec<SeedDoctor>,
    #[serde(default)]
    pub nurses: Vec<SeedNurse>,
    #[serde(default)]
    pub patients: Vec<SeedPatient>,
    #[serde(default)]
    pub lab_results: Vec<SeedLabResult>,
}

#[derive(Debug, Deserialize)]
pub struct SeedDoctor {
    pub name: String,
    pub email: String,
    pub password: String,
    pub specialization: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedNurse {
    pub name: String,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedPatient {
    pub name: String,
    pub email: String,
    pub password: String,
    /// Pre-assign a doctor; otherwise one is picked at first login.
    pub doctor_email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct SeedLabResult {
    pub patient_email: String,
    /// `YYYY-MM-DD`
    pub date: String,
    pub test_name: String,
    pub value: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub status: Option<String>,
    pub clinician_notes: Option<String>,
}

/// Rows written per entity.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SeedCounts {
    pub doctors: usize,
    pub nurses: usize,
    pub patients: usize,
    pub lab_results: usize,
}

/// Read and import a seed file with production-strength password hashing.
pub fn import_seed_file(conn: &mut Connection, path: &Path) -> Result<SeedCounts, SeedError> {
    let raw = std::fs::read_to_string(path)?;
    let seed: SeedFile = serde_json::from_str(&raw)?;
    let counts = import_seed(conn, &seed, PBKDF2_ITERATIONS)?;
    tracing::info!(
        path = %path.display(),
        doctors = counts.doctors,
        nurses = counts.nurses,
        patients = counts.patients,
        lab_results = counts.lab_results,
        "Seed import complete"
    );
    Ok(counts)
}

/// Import in a single transaction; any error leaves the database untouched.
pub fn import_seed(
    conn: &mut Connection,
    seed: &SeedFile,
    iterations: u32,
) -> Result<SeedCounts, SeedError> {
    let tx = conn.transaction()?;
    let mut counts = SeedCounts::default();

    for doctor in &seed.doctors {
        if find_doctor_by_email(&tx, &doctor.email)?.is_some() {
            tracing::debug!(email = %doctor.email, "Doctor already exists, skipping");
            continue;
        }
        insert_doctor(
            &tx,
            &doctor.name,
            &doctor.email,
            &hash_password_with_iterations(&doctor.password, iterations),
            doctor.specialization.as_deref(),
            doctor.phone.as_deref(),
        )?;
        counts.doctors += 1;
    }

    // Nurses have no unique key; match on name + email, including rows
    // inserted earlier in this file.
    let mut known_nurses: Vec<(String, Option<String>)> = list_nurses(&tx)?
        .into_iter()
        .map(|n| (n.name, n.email))
        .collect();
    for nurse in &seed.nurses {
        let key = (nurse.name.clone(), nurse.email.clone());
        if known_nurses.contains(&key) {
            continue;
        }
        insert_nurse(
            &tx,
            &nurse.name,
            nurse.specialization.as_deref(),
            nurse.phone.as_deref(),
            nurse.email.as_deref(),
        )?;
        known_nurses.push(key);
        counts.nurses += 1;
    }

    for patient in &seed.patients {
        if find_patient_by_email(&tx, &patient.email)?.is_some() {
            tracing::debug!(email = %patient.email, "Patient already exists, skipping");
            continue;
        }
        let doctor_id = match &patient.doctor_email {
            Some(email) => Some(
                find_doctor_by_email(&tx, email)?
                    .ok_or_else(|| SeedError::UnknownReference {
                        entity: "doctor",
                        email: email.clone(),
                    })?
                    .id,
            ),
            None => None,
        };
        insert_patient(
            &tx,
            &patient.name,
            &patient.email,
            &hash_password_with_iterations(&patient.password, iterations),
            doctor_id,
        )?;
        counts.patients += 1;
    }

    for lab in &seed.lab_results {
        let patient = find_patient_by_email(&tx, &lab.patient_email)?.ok_or_else(|| {
            SeedError::UnknownReference {
                entity: "patient",
                email: lab.patient_email.clone(),
            }
        })?;
        let date = NaiveDate::parse_from_str(&lab.date, "%Y-%m-%d")
            .map_err(|_| SeedError::InvalidDate(lab.date.clone()))?;
        let new_lab = NewLabResult {
            patient_id: patient.id,
            date,
            test_name: lab.test_name.clone(),
            value: lab.value.clone(),
            unit: lab.unit.clone(),
            reference_range: lab.reference_range.clone(),
            status: lab.status.clone(),
            clinician_notes: lab.clinician_notes.clone(),
        };
        if lab_result_exists(&tx, &new_lab)? {
            continue;
        }
        insert_lab_result(&tx, &new_lab)?;
        counts.lab_results += 1;
    }

    tx.commit()?;
    Ok(counts)
}
