use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const SUBMISSION_STATUSES: [&str; 5] =
    ["submitted", "checked", "accepted", "rejected", "needs-fix"];

#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Submission {
    pub id: i32,
    pub user_id: i32,
    pub block_id: i32,
    pub original_name: String,
    pub stored_path: String,
    pub mimetype: Option<String>,
    pub size_bytes: Option<i64>,
    pub comment: String,
    pub status: String,
    pub created_at: DateTime<Utc>,
}
