use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use super::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_message(
    conn: &Connection,
    patient_id: i64,
    recipient_id: i64,
    subject: &str,
    body: &str,
    sent_at: &NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO messages (patient_id, recipient_id, subject, body, sent_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![patient_id, recipient_id, subject, body, format_timestamp(sent_at)],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Messages a patient has sent, newest first.
pub fn list_messages_for_patient(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Message>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, recipient_id, subject, body, sent_at
         FROM messages WHERE patient_id = ?1
         ORDER BY sent_at DESC, id DESC",
    )?;

    let rows = stmt.query_map(params![patient_id], |row| {
        Ok((
            row.get::<_, i64>(0)?,
            row.get::<_, i64>(1)?,
            row.get::<_, i64>(2)?,
            row.get::<_, String>(3)?,
            row.get::<_, String>(4)?,
            row.get::<_, String>(5)?,
        ))
    })?;

    let mut messages = Vec::new();
    for row in rows {
        let (id, patient_id, recipient_id, subject, body, sent_at) = row?;
        messages.push(Message {
            id,
            patient_id,
            recipient_id,
            subject,
            body,
            sent_at: parse_timestamp("messages.sent_at", &sent_at)?,
        });
    }
    Ok(messages)
}
