use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Doctor {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub specialization: Option<String>,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Nurse {
    pub id: i64,
    pub name: String,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

/// Public contact card for the care-team directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffContact {
    pub id: i64,
    pub name: String,
    pub specialization: Option<String>,
    pub phone: Option<String>,
    pub email: Option<String>,
}

impl From<Doctor> for StaffContact {
    fn from(doctor: Doctor) -> Self {
        Self {
            id: doctor.id,
            name: doctor.name,
            specialization: doctor.specialization,
            phone: doctor.phone,
            email: Some(doctor.email),
        }
    }
}

impl From<Nurse> for StaffContact {
    fn from(nurse: Nurse) -> Self {
        Self {
            id: nurse.id,
            name: nurse.name,
            specialization: nurse.specialization,
            phone: nurse.phone,
            email: nurse.email,
        }
    }
}
