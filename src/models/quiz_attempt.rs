use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use sqlx::FromRow;

/// One graded quiz submission. Rows are append-only: a learner re-taking a
/// quiz produces a new row, never an update.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct QuizAttempt {
    pub id: i32,
    pub user_id: i32,
    pub block_id: i32,
    pub score: f64,
    pub passed: bool,
    pub details: JsonValue,
    pub created_at: DateTime<Utc>,
}
