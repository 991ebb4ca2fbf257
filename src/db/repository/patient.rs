use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

const PATIENT_COLUMNS: &str = "id, name, email, password_hash, doctor_id";

pub fn insert_patient(
    conn: &Connection,
    name: &str,
    email: &str,
    password_hash: &str,
    doctor_id: Option<i64>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO patients (name, email, password_hash, doctor_id)
         VALUES (?1, ?2, ?3, ?4)",
        params![name, email, password_hash, doctor_id],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_patient(conn: &Connection, id: i64) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE id = ?1");
    let patient = conn
        .query_row(&sql, params![id], patient_from_row)
        .optional()?;
    Ok(patient)
}

pub fn find_patient_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Patient>, DatabaseError> {
    let sql = format!("SELECT {PATIENT_COLUMNS} FROM patients WHERE email = ?1");
    let patient = conn
        .query_row(&sql, params![email], patient_from_row)
        .optional()?;
    Ok(patient)
}

/// Set a patient's doctor only if none is assigned yet.
///
/// Returns `true` when the row changed. An existing assignment is never
/// overwritten, even if two logins race.
pub fn assign_doctor_if_unset(
    conn: &Connection,
    patient_id: i64,
    doctor_id: i64,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE patients SET doctor_id = ?1 WHERE id = ?2 AND doctor_id IS NULL",
        params![doctor_id, patient_id],
    )?;
    Ok(changed > 0)
}

/// Patients assigned to a doctor, ordered by name.
pub fn list_patients_for_doctor(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Vec<Patient>, DatabaseError> {
    let sql = format!(
        "SELECT {PATIENT_COLUMNS} FROM patients WHERE doctor_id = ?1 ORDER BY name, id"
    );
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map(params![doctor_id], patient_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

fn patient_from_row(row: &rusqlite::Row<'_>) -> Result<Patient, rusqlite::Error> {
    Ok(Patient {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        doctor_id: row.get(4)?,
    })
}
