use chrono::NaiveDateTime;
use rusqlite::{params, Connection};

use super::{format_timestamp, parse_timestamp};
use crate::db::DatabaseError;
use crate::models::*;

pub fn insert_health_log(
    conn: &Connection,
    patient_id: i64,
    symptoms: &str,
    medication: &str,
    date: &NaiveDateTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO health_logs (patient_id, date, symptoms, medication)
         VALUES (?1, ?2, ?3, ?4)",
        params![patient_id, format_timestamp(date), symptoms, medication],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Most recent logs first. Same-second entries fall back to insertion order.
pub fn recent_health_logs(
    conn: &Connection,
    patient_id: i64,
    limit: u32,
) -> Result<Vec<HealthLog>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, date, symptoms, medication
         FROM health_logs WHERE patient_id = ?1
         ORDER BY date DESC, id DESC
         LIMIT ?2",
    )?;

    let rows = stmt.query_map(params![patient_id, limit], |row| {
        Ok(LogRow {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            date: row.get(2)?,
            symptoms: row.get(3)?,
            medication: row.get(4)?,
        })
    })?;

    let mut logs = Vec::new();
    for row in rows {
        logs.push(log_from_row(row?)?);
    }
    Ok(logs)
}

// Internal row type for HealthLog mapping
struct LogRow {
    id: i64,
    patient_id: i64,
    date: String,
    symptoms: String,
    medication: String,
}

fn log_from_row(row: LogRow) -> Result<HealthLog, DatabaseError> {
    Ok(HealthLog {
        id: row.id,
        patient_id: row.patient_id,
        date: parse_timestamp("health_logs.date", &row.date)?,
        symptoms: row.symptoms,
        medication: row.medication,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repository::test_support::*;

    #[test]
    fn recent_logs_newest_first_and_limited() {
        let conn = test_db();
        let pat = make_patient(&conn, "Ann", None);
        for day in 1..=9 {
            let ts = at(&format!("2024-03-0{day} 08:00:00"));
            insert_health_log(&conn, pat, &format!("day {day}"), "ibuprofen", &ts).unwrap();
        }

        let logs = recent_health_logs(&conn, pat, 7).unwrap();
        assert_eq!(logs.len(), 7);
        assert_eq!(logs[0].symptoms, "day 9");
        assert_eq!(logs[6].symptoms, "day 3");
    }

    #[test]
    fn same_timestamp_orders_by_insertion() {
        let conn = test_db();
        let pat = make_patient(&conn, "Ann", None);
        let ts = at("2024-03-01 08:00:00");
        insert_health_log(&conn, pat, "first", "-", &ts).unwrap();
        insert_health_log(&conn, pat, "second", "-", &ts).unwrap();

        let logs = recent_health_logs(&conn, pat, 5).unwrap();
        assert_eq!(logs[0].symptoms, "second");
    }

    #[test]
    fn logs_are_scoped_to_patient() {
        let conn = test_db();
        let ann = make_patient(&conn, "Ann", None);
        let ben = make_patient(&conn, "Ben", None);
        insert_health_log(&conn, ann, "headache", "-", &at("2024-03-01 08:00:00")).unwrap();

        assert_eq!(recent_health_logs(&conn, ann, 5).unwrap().len(), 1);
        assert!(recent_health_logs(&conn, ben, 5).unwrap().is_empty());
    }

    #[test]
    fn corrupt_date_surfaces_as_error() {
        let conn = test_db();
        let pat = make_patient(&conn, "Ann", None);
        conn.execute(
            "INSERT INTO health_logs (patient_id, date, symptoms, medication)
             VALUES (?1, 'not a date', 'x', 'y')",
            [pat],
        )
        .unwrap();
        let err = recent_health_logs(&conn, pat, 5).unwrap_err();
        assert!(matches!(err, DatabaseError::InvalidTimestamp { .. }));
    }
}
