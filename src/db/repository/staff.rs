use rusqlite::{params, Connection, OptionalExtension};

use crate::db::DatabaseError;
use crate::models::*;

const DOCTOR_COLUMNS: &str = "id, name, email, password_hash, specialization, phone";

pub fn insert_doctor(
    conn: &Connection,
    name: &str,
    email: &str,
    password_hash: &str,
    specialization: Option<&str>,
    phone: Option<&str>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO doctors (name, email, password_hash, specialization, phone)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![name, email, password_hash, specialization, phone],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn get_doctor(conn: &Connection, id: i64) -> Result<Option<Doctor>, DatabaseError> {
    let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE id = ?1");
    let doctor = conn.query_row(&sql, params![id], doctor_from_row).optional()?;
    Ok(doctor)
}

pub fn find_doctor_by_email(
    conn: &Connection,
    email: &str,
) -> Result<Option<Doctor>, DatabaseError> {
    let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors WHERE email = ?1");
    let doctor = conn
        .query_row(&sql, params![email], doctor_from_row)
        .optional()?;
    Ok(doctor)
}

pub fn list_doctors(conn: &Connection) -> Result<Vec<Doctor>, DatabaseError> {
    let sql = format!("SELECT {DOCTOR_COLUMNS} FROM doctors ORDER BY name, id");
    let mut stmt = conn.prepare(&sql)?;
    let rows = stmt.query_map([], doctor_from_row)?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

/// All doctor ids, for random assignment.
pub fn list_doctor_ids(conn: &Connection) -> Result<Vec<i64>, DatabaseError> {
    let mut stmt = conn.prepare("SELECT id FROM doctors ORDER BY id")?;
    let rows = stmt.query_map([], |row| row.get::<_, i64>(0))?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

pub fn insert_nurse(
    conn: &Connection,
    name: &str,
    specialization: Option<&str>,
    phone: Option<&str>,
    email: Option<&str>,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO nurses (name, specialization, phone, email) VALUES (?1, ?2, ?3, ?4)",
        params![name, specialization, phone, email],
    )?;
    Ok(conn.last_insert_rowid())
}

pub fn list_nurses(conn: &Connection) -> Result<Vec<Nurse>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, name, specialization, phone, email FROM nurses ORDER BY name, id",
    )?;
    let rows = stmt.query_map([], |row| {
        Ok(Nurse {
            id: row.get(0)?,
            name: row.get(1)?,
            specialization: row.get(2)?,
            phone: row.get(3)?,
            email: row.get(4)?,
        })
    })?;
    rows.map(|r| r.map_err(DatabaseError::from)).collect()
}

fn doctor_from_row(row: &rusqlite::Row<'_>) -> Result<Doctor, rusqlite::Error> {
    Ok(Doctor {
        id: row.get(0)?,
        name: row.get(1)?,
        email: row.get(2)?,
        password_hash: row.get(3)?,
        specialization: row.get(4)?,
        phone: row.get(5)?,
    })
}
