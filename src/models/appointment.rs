use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};

use super::enums::AppointmentStatus;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Appointment {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
}

/// Appointment joined with the patient's display name (doctor dashboard).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DoctorAppointment {
    pub id: i64,
    pub patient_id: i64,
    pub patient_name: String,
    pub date: NaiveDate,
    pub time: NaiveTime,
    pub status: AppointmentStatus,
}
