use crate::error::{Error, Result};
use crate::models::block::Block;
use crate::models::payload::BlockKind;
use crate::models::quiz::{QuestionWithOptions, QuizOption, QuizQuestion};
use sqlx::PgPool;

#[derive(Clone)]
pub struct QuizService {
    pool: PgPool,
}

impl QuizService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Loads a block and checks it is quiz-kind.
    pub async fn get_quiz_block(&self, block_id: i32) -> Result<Block> {
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
        Ok(block)
    }

    /// Questions of a quiz block in display order, each with its options.
    pub async fn list_questions(&self, block_id: i32) -> Result<Vec<QuestionWithOptions>> {
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

        let with_options = questions
            .into_iter()
            .map(|question| {
                let options = options
                    .iter()
                    .filter(|opt| opt.question_id == question.id)
                    .cloned()
                    .collect();
                QuestionWithOptions { question, options }
            })
            .collect();

        Ok(with_options)
    }

    pub async fn create_question(&self, block_id: i32, text: &str) -> Result<QuizQuestion> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::BadRequest("Question text is required".to_string()));
        }
        self.get_quiz_block(block_id).await?;

        let next_order: i32 = sqlx::query_scalar(
            r#"SELECT COALESCE(MAX("order"), 0) + 1 FROM quiz_questions WHERE block_id = $1"#,
        )
        .bind(block_id)
        .fetch_one(&self.pool)
        .await?;

        let question = sqlx::query_as::<_, QuizQuestion>(
            r#"
            INSERT INTO quiz_questions (block_id, text, "order")
            VALUES ($1, $2, $3)
            RETURNING id, block_id, text, "order", created_at
            "#,
        )
        .bind(block_id)
        .bind(text)
        .bind(next_order)
        .fetch_one(&self.pool)
        .await?;

        Ok(question)
    }

    pub async fn update_question(&self, question_id: i32, text: &str) -> Result<QuizQuestion> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::BadRequest("Question text is required".to_string()));
        }

        let question = sqlx::query_as::<_, QuizQuestion>(
            r#"
            UPDATE quiz_questions SET text = $2
            WHERE id = $1
            RETURNING id, block_id, text, "order", created_at
            "#,
        )
        .bind(question_id)
        .bind(text)
        .fetch_one(&self.pool)
        .await?;

        Ok(question)
    }

    pub async fn get_question(&self, question_id: i32) -> Result<QuizQuestion> {
        let question = sqlx::query_as::<_, QuizQuestion>(
            r#"SELECT id, block_id, text, "order", created_at
               FROM quiz_questions WHERE id = $1"#,
        )
        .bind(question_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(question)
    }

    pub async fn delete_question(&self, question_id: i32) -> Result<()> {
        self.get_question(question_id).await?;

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        sqlx::query(r#"DELETE FROM quiz_options WHERE question_id = $1"#)
            .bind(question_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        sqlx::query(r#"DELETE FROM quiz_questions WHERE id = $1"#)
            .bind(question_id)
            .execute(&mut *tx)
            .await
            .map_err(|e| Error::Storage(e.to_string()))?;

        tx.commit().await.map_err(|e| Error::Storage(e.to_string()))?;
        Ok(())
    }

    /// Adds an option. Marking it correct is checked inside a transaction
    /// that locks the parent question row, so two concurrent edits cannot
    /// both end up correct: the loser gets a conflict.
    pub async fn create_option(
        &self,
        question_id: i32,
        text: &str,
        is_correct: bool,
    ) -> Result<QuizOption> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::BadRequest("Option text is required".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        sqlx::query_scalar::<_, i32>(r#"SELECT id FROM quiz_questions WHERE id = $1 FOR UPDATE"#)
            .bind(question_id)
            .fetch_one(&mut *tx)
            .await?;

        if is_correct {
            self.ensure_no_other_correct(&mut tx, question_id, None)
                .await?;
        }

        let option = sqlx::query_as::<_, QuizOption>(
            r#"
            INSERT INTO quiz_options (question_id, text, is_correct)
            VALUES ($1, $2, $3)
            RETURNING id, question_id, text, is_correct, created_at
            "#,
        )
        .bind(question_id)
        .bind(text)
        .bind(is_correct)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(option)
    }

    pub async fn update_option(
        &self,
        option_id: i32,
        text: &str,
        is_correct: bool,
    ) -> Result<QuizOption> {
        let text = text.trim();
        if text.is_empty() {
            return Err(Error::BadRequest("Option text is required".to_string()));
        }

        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, QuizOption>(
            r#"SELECT id, question_id, text, is_correct, created_at
               FROM quiz_options WHERE id = $1"#,
        )
        .bind(option_id)
        .fetch_one(&mut *tx)
        .await?;

        sqlx::query_scalar::<_, i32>(r#"SELECT id FROM quiz_questions WHERE id = $1 FOR UPDATE"#)
            .bind(current.question_id)
            .fetch_one(&mut *tx)
            .await?;

        if is_correct && !current.is_correct {
            self.ensure_no_other_correct(&mut tx, current.question_id, Some(option_id))
                .await?;
        }

        let option = sqlx::query_as::<_, QuizOption>(
            r#"
            UPDATE quiz_options SET text = $2, is_correct = $3
            WHERE id = $1
            RETURNING id, question_id, text, is_correct, created_at
            "#,
        )
        .bind(option_id)
        .bind(text)
        .bind(is_correct)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;
        Ok(option)
    }

    pub async fn delete_option(&self, option_id: i32) -> Result<()> {
        let deleted = sqlx::query(r#"DELETE FROM quiz_options WHERE id = $1"#)
            .bind(option_id)
            .execute(&self.pool)
            .await?;
        if deleted.rows_affected() == 0 {
            return Err(Error::NotFound("Option not found".to_string()));
        }
        Ok(())
    }

    async fn ensure_no_other_correct(
        &self,
        tx: &mut sqlx::Transaction<'_, sqlx::Postgres>,
        question_id: i32,
        exclude_option_id: Option<i32>,
    ) -> Result<()> {
        let existing: i64 = sqlx::query_scalar(
            r#"SELECT COUNT(*) FROM quiz_options
               WHERE question_id = $1 AND is_correct = TRUE AND id <> $2"#,
        )
        .bind(question_id)
        .bind(exclude_option_id.unwrap_or(0))
        .fetch_one(&mut **tx)
        .await?;

        if existing > 0 {
            return Err(Error::Conflict(
                "This question already has a correct option".to_string(),
            ));
        }
        Ok(())
    }
}
