use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// One symptom/medication entry. Immutable once written.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthLog {
    pub id: i64,
    pub patient_id: i64,
    pub date: NaiveDateTime,
    pub symptoms: String,
    pub medication: String,
}
