use std::str::FromStr;

use chrono::{NaiveDate, NaiveTime};
use rusqlite::{params, Connection};

use super::parse_date;
use crate::db::DatabaseError;
use crate::models::enums::AppointmentStatus;
use crate::models::*;

const TIME_FORMAT: &str = "%H:%M";

/// Insert a new `pending` appointment.
pub fn insert_appointment(
    conn: &Connection,
    patient_id: i64,
    doctor_id: i64,
    date: &NaiveDate,
    time: &NaiveTime,
) -> Result<i64, DatabaseError> {
    conn.execute(
        "INSERT INTO appointments (patient_id, doctor_id, date, time, status)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        params![
            patient_id,
            doctor_id,
            date.to_string(),
            time.format(TIME_FORMAT).to_string(),
            AppointmentStatus::Pending.as_str(),
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// A patient's appointments, soonest first.
pub fn list_patient_appointments(
    conn: &Connection,
    patient_id: i64,
) -> Result<Vec<Appointment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT id, patient_id, doctor_id, date, time, status
         FROM appointments WHERE patient_id = ?1
         ORDER BY date, time, id",
    )?;

    let rows = stmt.query_map(params![patient_id], |row| {
        Ok(AppointmentRow {
            id: row.get(0)?,
            patient_id: row.get(1)?,
            doctor_id: row.get(2)?,
            date: row.get(3)?,
            time: row.get(4)?,
            status: row.get(5)?,
        })
    })?;

    let mut appointments = Vec::new();
    for row in rows {
        appointments.push(appointment_from_row(row?)?);
    }
    Ok(appointments)
}

/// Pending appointments for a doctor, with patient names, soonest first.
pub fn pending_appointments_for_doctor(
    conn: &Connection,
    doctor_id: i64,
) -> Result<Vec<DoctorAppointment>, DatabaseError> {
    let mut stmt = conn.prepare(
        "SELECT a.id, a.patient_id, p.name, a.date, a.time, a.status
         FROM appointments a
         JOIN patients p ON p.id = a.patient_id
         WHERE a.doctor_id = ?1 AND a.status = ?2
         ORDER BY a.date, a.time, a.id",
    )?;

    let rows = stmt.query_map(
        params![doctor_id, AppointmentStatus::Pending.as_str()],
        |row| {
            Ok((
                row.get::<_, i64>(0)?,
                row.get::<_, i64>(1)?,
                row.get::<_, String>(2)?,
                row.get::<_, String>(3)?,
                row.get::<_, String>(4)?,
                row.get::<_, String>(5)?,
            ))
        },
    )?;

    let mut appointments = Vec::new();
    for row in rows {
        let (id, patient_id, patient_name, date, time, status) = row?;
        appointments.push(DoctorAppointment {
            id,
            patient_id,
            patient_name,
            date: parse_date("appointments.date", &date)?,
            time: parse_time(&time)?,
            status: AppointmentStatus::from_str(&status)?,
        });
    }
    Ok(appointments)
}

/// Change the status of an appointment owned by `doctor_id`.
///
/// Returns `false` when the appointment does not exist or belongs to
/// another doctor; nothing is written in that case.
pub fn update_appointment_status(
    conn: &Connection,
    appointment_id: i64,
    doctor_id: i64,
    status: AppointmentStatus,
) -> Result<bool, DatabaseError> {
    let changed = conn.execute(
        "UPDATE appointments SET status = ?1 WHERE id = ?2 AND doctor_id = ?3",
        params![status.as_str(), appointment_id, doctor_id],
    )?;
    Ok(changed > 0)
}

// Internal row type for Appointment mapping
struct AppointmentRow {
    id: i64,
    patient_id: i64,
    doctor_id: i64,
    date: String,
    time: String,
    status: String,
}

fn appointment_from_row(row: AppointmentRow) -> Result<Appointment, DatabaseError> {
    Ok(Appointment {
        id: row.id,
        patient_id: row.patient_id,
        doctor_id: row.doctor_id,
        date: parse_date("appointments.date", &row.date)?,
        time: parse_time(&row.time)?,
        status: AppointmentStatus::from_str(&row.status)?,
    })
}

fn parse_time(value: &str) -> Result<NaiveTime, DatabaseError> {
    NaiveTime::parse_from_str(value, TIME_FORMAT).map_err(|_| DatabaseError::InvalidTimestamp {
        field: "appointments.time".into(),
        value: value.into(),
    })
}
