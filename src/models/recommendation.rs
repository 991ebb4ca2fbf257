use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub id: i64,
    pub patient_id: i64,
    pub doctor_id: i64,
    pub advice: String,
    pub date: NaiveDateTime,
}
