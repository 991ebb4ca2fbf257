use serde::{Deserialize, Serialize};

/// Patient account. `password_hash` never leaves the server.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Patient {
    pub id: i64,
    pub name: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub doctor_id: Option<i64>,
}
