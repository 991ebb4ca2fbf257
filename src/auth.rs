//! Role login and doctor auto-assignment.
//!
//! Patients and caregivers authenticate against the patients table,
//! doctors against the doctors table. A patient without a doctor gets one
//! picked uniformly at random on login.

use rand::seq::SliceRandom;
use rand::Rng;
use rusqlite::Connection;

use crate::crypto::verify_password;
use crate::db::repository::{
    assign_doctor_if_unset, find_doctor_by_email, find_patient_by_email, list_doctor_ids,
};
use crate::db::DatabaseError;
use crate::models::enums::Role;
use crate::session::Identity;

pub const INVALID_PATIENT_CREDENTIALS: &str = "Invalid credentials for patient.";
pub const INVALID_DOCTOR_CREDENTIALS: &str = "Invalid doctor credentials.";
pub const INVALID_ROLE: &str = "Please choose a valid role.";

/// Generic rejection message for a failed login as `role`.
pub fn rejection_message(role: Role) -> &'static str {
    if role.uses_patient_table() {
        INVALID_PATIENT_CREDENTIALS
    } else {
        INVALID_DOCTOR_CREDENTIALS
    }
}

/// Check credentials for `role`. `Ok(None)` on unknown email or wrong password.
pub fn authenticate(
    conn: &Connection,
    role: Role,
    email: &str,
    password: &str,
) -> Result<Option<Identity>, DatabaseError> {
    let email = email.trim();
    if role.uses_patient_table() {
        let Some(patient) = find_patient_by_email(conn, email)? else {
            return Ok(None);
        };
        if !verify_password(password, &patient.password_hash) {
            return Ok(None);
        }
        Ok(Some(Identity::Patient {
            patient_id: patient.id,
            name: patient.name,
            is_caregiver: role == Role::Caregiver,
        }))
    } else {
        let Some(doctor) = find_doctor_by_email(conn, email)? else {
            return Ok(None);
        };
        if !verify_password(password, &doctor.password_hash) {
            return Ok(None);
        }
        Ok(Some(Identity::Doctor {
            doctor_id: doctor.id,
            name: doctor.name,
        }))
    }
}

/// Give the patient a random doctor if they have none.
///
/// Returns the newly assigned doctor id, or `None` when the patient was
/// already assigned or no doctors exist.
pub fn assign_doctor_if_missing<R: Rng + ?Sized>(
    conn: &Connection,
    patient_id: i64,
    rng: &mut R,
) -> Result<Option<i64>, DatabaseError> {
    let doctor_ids = list_doctor_ids(conn)?;
    let Some(&doctor_id) = doctor_ids.choose(rng) else {
        tracing::debug!(patient_id, "No doctors on record, skipping assignment");
        return Ok(None);
    };

    if assign_doctor_if_unset(conn, patient_id, doctor_id)? {
        tracing::info!(patient_id, doctor_id, "Assigned doctor to patient");
        Ok(Some(doctor_id))
    } else {
        Ok(None)
    }
}

/// Full login step: authenticate, then ensure patients have a doctor.
pub fn login<R: Rng + ?Sized>(
    conn: &Connection,
    role: Role,
    email: &str,
    password: &str,
    rng: &mut R,
) -> Result<Option<Identity>, DatabaseError> {
    let identity = authenticate(conn, role, email, password)?;
    if let Some(Identity::Patient { patient_id, .. }) = &identity {
        assign_doctor_if_missing(conn, *patient_id, rng)?;
    }
    Ok(identity)
}
