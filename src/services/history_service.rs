use crate::error::Result;
use crate::models::quiz_attempt::QuizAttempt;
use crate::models::submission::Submission;
use sqlx::PgPool;

/// Read-only lookups of a learner's latest interactions with a block.
/// Absence is a normal answer here, never an error.
#[derive(Clone)]
pub struct HistoryService {
    pool: PgPool,
}

impl HistoryService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn last_attempt(&self, user_id: i32, block_id: i32) -> Result<Option<QuizAttempt>> {
        let attempt = sqlx::query_as::<_, QuizAttempt>(
            r#"
            SELECT id, user_id, block_id, score, passed, details, created_at
            FROM quiz_attempts
            WHERE user_id = $1 AND block_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(block_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(attempt)
    }

    pub async fn last_submission(&self, user_id: i32, block_id: i32) -> Result<Option<Submission>> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, user_id, block_id, original_name, stored_path, mimetype,
                   size_bytes, comment, status, created_at
            FROM submissions
            WHERE user_id = $1 AND block_id = $2
            ORDER BY created_at DESC, id DESC
            LIMIT 1
            "#,
        )
        .bind(user_id)
        .bind(block_id)
        .fetch_optional(&self.pool)
        .await?;
        Ok(submission)
    }

    /// Whether the learner has passed any of the given quiz blocks.
    pub async fn has_passed_any(&self, user_id: i32, block_ids: &[i32]) -> Result<bool> {
        if block_ids.is_empty() {
            return Ok(false);
        }
        let passed: bool = sqlx::query_scalar(
            r#"
            SELECT EXISTS(
                SELECT 1 FROM quiz_attempts
                WHERE user_id = $1 AND passed = TRUE AND block_id = ANY($2)
            )
            "#,
        )
        .bind(user_id)
        .bind(block_ids)
        .fetch_one(&self.pool)
        .await?;
        Ok(passed)
    }
}
