use chrono::NaiveDate;
use rusqlite::{params, Connection};

use super::parse_date;
use crate::db::DatabaseError;
use crate::models::*;

/// Lab result as received from an external source, before it has an id.
#[derive(Debug, Clone)]
pub struct NewLabResult {
    pub patient_id: i64,
    pub date: NaiveDate,
    pub test_name: String,
    pub value: String,
    pub unit: Option<String>,
    pub reference_range: Option<String>,
    pub status: Option<String>,
    pub clinician_notes: Option<String>,
}

pub fn insert_lab_result(conn: &Connection, lab: &NewLabResult) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO lab_results (patient_id, date, test_name, value, unit,
         reference_range, status, clinician_notes)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            lab.patient_id,
            lab.date.to_string(),
            lab.test_name,
            lab.value,
            lab.unit,
            lab.reference_range,
            lab.status,
            lab.clinician_notes,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Whether the patient already has this exact result (same day, test and value).
pub fn lab_result_exists(conn: &Connection, lab: &NewLabResult) -> Result<bool, DatabaseError> {
    let found = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM lab_results
         WHERE patient_id = ?1 AND date = ?2 AND test_name = ?3 AND value = ?4)",
        params![lab.patient_id, lab.date.to_string(), lab.test_name, lab.value],
        |row| row.get::<_, bool>(0),
    )?;
    Ok(found)
}

/// A patient's lab results, newest first, optionally restricted to one test.
pub fn list_lab_results(
    conn: &Connection,
    patient_id: i64,
    test_name: Option<&str>,
) -> Result<Vec<LabResult>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, date, test_name, value, unit,
         reference_range, status, clinician_notes
         FROM lab_results
         WHERE patient_id = ?1 AND (?2 IS NULL OR test_name = ?2)
         ORDER BY date DESC, id DESC",
    )?;

    let rows = stmt.query_map(params![patient_id, test_name], |row| Ok(lab_row_from_rusqlite(row)))?;

    let mut labs = Vec::new();
    for row in rows {
        labs.push(lab_from_row(row??)?);
    }
    Ok(labs)
}

/// Distinct test names for a patient, sorted, for the filter list.
pub fn distinct_test_names(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<String>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT DISTINCT test_name FROM lab_results WHERE patient_id = ?1 ORDER BY test_name",
    )?;
    let rows = stmt.query_map(params![patient_id], |row| row.get::<_, String>(0))?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

// Internal row type for LabResult mapping
struct LabRow {
    id: i64,
    patient_id: i64,
    date: String,
    test_name: String,
    value: String,
    unit: Option<String>,
    reference_range: Option<String>,
    status: Option<String>,
    clinician_notes: Option<String>,
}

fn lab_row_from_rusqlite(row: &rusqlite::Row<'_>) -> Result<LabRow, rusqlite::Error> {
    Ok(LabRow {
        id: row.get(0)?,
        patient_id: row.get(1)?,
        date: row.get(2)?,
        test_name: row.get(3)?,
        value: row.get(4)?,
        unit: row.get(5)?,
        reference_range: row.get(6)?,
        status: row.get(7)?,
        clinician_notes: row.get(8)?,
    })
}

fn lab_from_row(row: LabRow) -> Result<LabResult, DatabaseError> {
    Ok(LabResult {
        id: row.id,
        patient_id: row.patient_id,
        date: parse_date("lab_results.date", &row.date)?,
        test_name: row.test_name,
        value: row.value,
        unit: row.unit,
        reference_range: row.reference_range,
        status: row.status,
        clinician_notes: row.clinician_notes,
    })
}
