use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use super::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_recommendation(
    conn: &Connection,
    patient_id: i64,
    doctor_id: i64,
    advice: &str,
    date: &NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO recommendations (patient_id, doctor_id, advice, date)
         VALUES (?1, ?2, ?3, ?4)",
        params![patient_id, doctor_id, advice, format_timestamp(date)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent recommendation for a patient, from any doctor.
pub fn latest_recommendation(
    conn: &Connection,
    patient_id: i64,
) -> Result<Option<Recommendation>, DatabaseError> {
    Ok(query_recommendations(conn, patient_id, Some(1))?.into_iter().next())
}

/// All recommendations for a patient, newest first.
pub fn list_recommendations(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Recommendation>, DatabaseError> {
    query_recommendations(conn, patient_id, None)
}

fn query_recommendations(
    conn: &Connection,
    patient_id: i64,
    limit: Option<u32>,
) -> Result<Vec<Recommendation>, DatabaseError> {
    // SQLite treats a negative LIMIT as unbounded.
    let limit = limit.map(i64::from).unwrap_or(-1);
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, doctor_id, advice, date
         FROM recommendations WHERE patient_id = ?1
         ORDER BY date DESC, id DESC
         LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![patient_id, limit], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
        ))
    })?;

    let mut recommendations = Vec::new();
    for row in rows {
        let (id, patient_id, doctor_id, advice, date) = row?;
        recommendations.push(Recommendation {
            id,
            patient_id,
            doctor_id,
            advice,
            date: parse_timestamp("recommendations.date", &date)?,
        });
    }
    Ok(recommendations)
}
