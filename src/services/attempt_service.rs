use crate::error::{Error, Result};
use crate::models::block::Block;
use crate::models::payload::{self, BlockKind};
use crate::models::quiz::{QuestionWithOptions, QuizOption, QuizQuestion};
use crate::models::quiz_attempt::QuizAttempt;
use crate::services::grading_service::GradingService;
use sqlx::PgPool;
use std::collections::HashMap;

#[derive(Clone)]
pub struct AttemptService {
    pool: PgPool,
}

impl AttemptService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Grades one quiz submission and appends the attempt. Re-submitting the
    /// same answers yields the same score but always a fresh row; earlier
    /// attempts are never touched.
    pub async fn submit_quiz(
        &self,
        user_id: i32,
        block_id: i32,
        answers: &HashMap<i32, i32>,
    ) -> Result<(QuizAttempt, f64)> {
        let block = sqlx::query_as::<_, Block>(
            r#"SELECT id, module_id, kind, "order", payload, created_at, updated_at
               FROM blocks WHERE id = $1"#,
        )
        .bind(block_id)
        .fetch_one(&self.pool)
        .await?;

        if BlockKind::parse(&block.kind) != Some(BlockKind::Quiz) {
            return Err(Error::BadRequest("Block is not a quiz".to_string()));
        }

        let questions = self.load_questions(block_id).await?;
        if questions.is_empty() {
            return Err(Error::EmptyQuiz);
        }

        let graded = GradingService::score_quiz(&questions, answers);
        let pass_score = payload::effective_pass_score(&block.payload);
        let passed = graded.score >= pass_score;

        let attempt = sqlx::query_as::<_, QuizAttempt>(
            r#"
            INSERT INTO quiz_attempts (user_id, block_id, score, passed, details)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, user_id, block_id, score, passed, details, created_at
            "#,
        )
        .bind(user_id)
        .bind(block_id)
        .bind(graded.score)
        .bind(passed)
        .bind(&graded.details)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| Error::Storage(e.to_string()))?;

        tracing::info!(
            user_id,
            block_id,
            score = graded.score,
            passed,
            "quiz attempt recorded"
        );

        Ok((attempt, pass_score))
    }

    /// Attempts against every quiz block of a course, newest first.
    pub async fn list_attempts_for_course(&self, course_id: i32) -> Result<Vec<QuizAttempt>> {
        let attempts = sqlx::query_as::<_, QuizAttempt>(
            r#"
            SELECT a.id, a.user_id, a.block_id, a.score, a.passed, a.details, a.created_at
            FROM quiz_attempts a
            JOIN blocks b ON b.id = a.block_id
            JOIN modules m ON m.id = b.module_id
            WHERE m.course_id = $1
            ORDER BY a.created_at DESC, a.id DESC
            "#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(attempts)
    }

    async fn load_questions(&self, block_id: i32) -> Result<Vec<QuestionWithOptions>> {
        let questions = sqlx::query_as::<_, QuizQuestion>(
            r#"SELECT id, block_id, text, "order", created_at
               FROM quiz_questions WHERE block_id = $1
               ORDER BY "order" ASC, id ASC"#,
        )
        .bind(block_id)
        .fetch_all(&self.pool)
        .await?;

        let options = sqlx::query_as::<_, QuizOption>(
            r#"SELECT id, question_id, text, is_correct, created_at
               FROM quiz_options
               WHERE question_id IN (SELECT id FROM quiz_questions WHERE block_id = $1)
               ORDER BY id ASC"#,
        )
        .bind(block_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(questions
            .into_iter()
            .map(|question| {
                let options = options
                    .iter()
                    .filter(|opt| opt.question_id == question.id)
                    .cloned()
                    .collect();
                QuestionWithOptions { question, options }
            })
            .collect())
    }
}
