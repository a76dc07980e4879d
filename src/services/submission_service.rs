use crate::error::{Error, Result};
use crate::models::block::Block;
use crate::models::payload::{self, BlockKind};
use crate::models::submission::{Submission, SUBMISSION_STATUSES};
use crate::services::history_service::HistoryService;
use sqlx::PgPool;

/// File metadata handed back by the storage collaborator after an upload.
#[derive(Debug, Clone)]
pub struct StoredUpload {
    pub original_name: String,
    pub stored_path: String,
    pub mimetype: Option<String>,
    pub size_bytes: i64,
}

#[derive(Clone)]
pub struct SubmissionService {
    pool: PgPool,
}

impl SubmissionService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Records a learner's upload against an assignment block. When the
    /// block's module carries gating quizzes, the learner must have passed
    /// one of them first.
    pub async fn create_submission(
        &self,
        user_id: i32,
        block_id: i32,
        upload: StoredUpload,
    ) -> Result<Submission> {
        let block = sqlx::query_as::<_, Block>(
            r#"SELECT id, module_id, kind, "order", payload, created_at, updated_at
               FROM blocks WHERE id = $1"#,
        )
        .bind(block_id)
        .fetch_one(&self.pool)
        .await?;

        if BlockKind::parse(&block.kind) != Some(BlockKind::Assignment) {
            return Err(Error::BadRequest("Block is not an assignment".to_string()));
        }

        self.ensure_module_quiz_passed(user_id, &block).await?;

        let submission = sqlx::query_as::<_, Submission>(
            r#"
            INSERT INTO submissions
                (user_id, block_id, original_name, stored_path, mimetype, size_bytes, status)
            VALUES ($1, $2, $3, $4, $5, $6, 'submitted')
            RETURNING id, user_id, block_id, original_name, stored_path, mimetype,
                      size_bytes, comment, status, created_at
            "#,
        )
        .bind(user_id)
        .bind(block_id)
        .bind(&upload.original_name)
        .bind(&upload.stored_path)
        .bind(&upload.mimetype)
        .bind(upload.size_bytes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::Storage(e.to_string()))?;

        tracing::info!(user_id, block_id, submission_id = submission.id, "submission stored");
        Ok(submission)
    }

    pub async fn get_submission(&self, submission_id: i32) -> Result<Submission> {
        let submission = sqlx::query_as::<_, Submission>(
            r#"SELECT id, user_id, block_id, original_name, stored_path, mimetype,
                      size_bytes, comment, status, created_at
               FROM submissions WHERE id = $1"#,
        )
        .bind(submission_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(submission)
    }

    pub async fn list_submissions(&self, block_id: Option<i32>) -> Result<Vec<Submission>> {
        let submissions = sqlx::query_as::<_, Submission>(
            r#"
            SELECT id, user_id, block_id, original_name, stored_path, mimetype,
                   size_bytes, comment, status, created_at
            FROM submissions
            WHERE ($1::int4 IS NULL OR block_id = $1)
            ORDER BY created_at DESC, id DESC
            "#,
        )
        .bind(block_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(submissions)
    }

    /// Admin review: status must come from the closed set; the comment is
    /// free text. Learners never mutate a submission after upload.
    pub async fn review_submission(
        &self,
        submission_id: i32,
        status: &str,
        comment: &str,
    ) -> Result<Submission> {
        if !SUBMISSION_STATUSES.contains(&status) {
            return Err(Error::BadRequest(format!(
                "Unknown submission status: {}",
                status
            )));
        }

        let submission = sqlx::query_as::<_, Submission>(
            r#"
            UPDATE submissions SET status = $2, comment = $3
            WHERE id = $1
            RETURNING id, user_id, block_id, original_name, stored_path, mimetype,
                      size_bytes, comment, status, created_at
            "#,
        )
        .bind(submission_id)
        .bind(status)
        .bind(comment)
        .fetch_one(&self.pool)
        .await?;

        Ok(submission)
    }

    pub async fn delete_submission(&self, submission_id: i32) -> Result<Submission> {
        let submission = self.get_submission(submission_id).await?;
        sqlx::query(r#"DELETE FROM submissions WHERE id = $1"#)
            .bind(submission_id)
            .execute(&self.pool)
            .await?;
        Ok(submission)
    }

    async fn ensure_module_quiz_passed(&self, user_id: i32, block: &Block) -> Result<()> {
        let quizzes = sqlx::query_as::<_, Block>(
            r#"SELECT id, module_id, kind, "order", payload, created_at, updated_at
               FROM blocks WHERE module_id = $1 AND kind = 'quiz'"#,
        )
        .bind(block.module_id)
        .fetch_all(&self.pool)
        .await?;

        let gating: Vec<i32> = quizzes
            .iter()
            .filter(|quiz| payload::require_pass(&quiz.payload))
            .map(|quiz| quiz.id)
            .collect();

        if gating.is_empty() {
            return Ok(());
        }

        let history = HistoryService::new(self.pool.clone());
        if history.has_passed_any(user_id, &gating).await? {
            Ok(())
        } else {
            Err(Error::Conflict(
                "Pass the module quiz before submitting this assignment".to_string(),
            ))
        }
    }
}
