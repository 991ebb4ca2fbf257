use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Patient → care team message. `recipient_id` names a doctor or nurse.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub id: i64,
    pub patient_id: i64,
    pub recipient_id: i64,
    pub subject: String,
    pub body: String,
    pub sent_at: NaiveDateTime,
}
