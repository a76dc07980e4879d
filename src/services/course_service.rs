use crate::error::{Error, Result};
use crate::models::block::Block;
use crate::models::course::Course;
use crate::models::course_module::CourseModule;
use crate::models::payload::{BlockKind, BlockPayload, PayloadFields};
use sqlx::PgPool;

#[derive(Clone)]
pub struct CourseService {
    pool: PgPool,
}

impl CourseService {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub async fn create_course(
        &self,
        title: &str,
        short_desc: &str,
        status: Option<String>,
    ) -> Result<Course> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::BadRequest("Course title is required".to_string()));
        }
        let status = status
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or_else(|| "draft".to_string());

        let course = sqlx::query_as::<_, Course>(
            r#"
            INSERT INTO courses (title, short_desc, status)
            VALUES ($1, $2, $3)
            RETURNING id, title, short_desc, status, created_at, updated_at
            "#,
        )
        .bind(title)
        .bind(short_desc.trim())
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(course)
    }

    pub async fn update_course(
        &self,
        course_id: i32,
        title: &str,
        short_desc: &str,
        status: Option<String>,
    ) -> Result<Course> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::BadRequest("Course title is required".to_string()));
        }
        let current = self.get_course(course_id).await?;
        let status = status
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .unwrap_or(current.status);

        let course = sqlx::query_as::<_, Course>(
            r#"
            UPDATE courses
            SET title = $2, short_desc = $3, status = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, short_desc, status, created_at, updated_at
            "#,
        )
        .bind(course_id)
        .bind(title)
        .bind(short_desc.trim())
        .bind(status)
        .fetch_one(&self.pool)
        .await?;

        Ok(course)
    }

    pub async fn get_course(&self, course_id: i32) -> Result<Course> {
        let course = sqlx::query_as::<_, Course>(
            r#"SELECT id, title, short_desc, status, created_at, updated_at
               FROM courses WHERE id = $1"#,
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(course)
    }

    pub async fn list_courses(&self) -> Result<Vec<Course>> {
        let courses = sqlx::query_as::<_, Course>(
            r#"SELECT id, title, short_desc, status, created_at, updated_at
               FROM courses ORDER BY created_at DESC, id DESC"#,
        )
        .fetch_all(&self.pool)
        .await?;
        Ok(courses)
    }

    /// Removes the course and everything beneath it. The whole cascade runs
    /// in one transaction: either every descendant row goes, or none do.
    pub async fn delete_course(&self, course_id: i32) -> Result<()> {
        self.get_course(course_id).await?;

        let mut tx = self.pool.begin().await.map_err(storage)?;

        sqlx::query(
            r#"DELETE FROM quiz_attempts WHERE block_id IN (
                   SELECT b.id FROM blocks b
                   JOIN modules m ON m.id = b.module_id
                   WHERE m.course_id = $1)"#,
        )
        .bind(course_id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        sqlx::query(
            r#"DELETE FROM submissions WHERE block_id IN (
                   SELECT b.id FROM blocks b
                   JOIN modules m ON m.id = b.module_id
                   WHERE m.course_id = $1)"#,
        )
        .bind(course_id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        sqlx::query(
            r#"DELETE FROM quiz_options WHERE question_id IN (
                   SELECT q.id FROM quiz_questions q
                   JOIN blocks b ON b.id = q.block_id
                   JOIN modules m ON m.id = b.module_id
                   WHERE m.course_id = $1)"#,
        )
        .bind(course_id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        sqlx::query(
            r#"DELETE FROM quiz_questions WHERE block_id IN (
                   SELECT b.id FROM blocks b
                   JOIN modules m ON m.id = b.module_id
                   WHERE m.course_id = $1)"#,
        )
        .bind(course_id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        sqlx::query(
            r#"DELETE FROM blocks WHERE module_id IN (
                   SELECT id FROM modules WHERE course_id = $1)"#,
        )
        .bind(course_id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        sqlx::query(r#"DELETE FROM modules WHERE course_id = $1"#)
            .bind(course_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        sqlx::query(r#"DELETE FROM courses WHERE id = $1"#)
            .bind(course_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        tracing::info!(course_id, "course deleted with all descendants");
        Ok(())
    }

    pub async fn create_module(&self, course_id: i32, title: &str) -> Result<CourseModule> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::BadRequest("Module title is required".to_string()));
        }
        self.get_course(course_id).await?;

        let next_order: i32 = sqlx::query_scalar(
            r#"SELECT COALESCE(MAX("order"), 0) + 1 FROM modules WHERE course_id = $1"#,
        )
        .bind(course_id)
        .fetch_one(&self.pool)
        .await?;

        let module = sqlx::query_as::<_, CourseModule>(
            r#"
            INSERT INTO modules (course_id, title, "order")
            VALUES ($1, $2, $3)
            RETURNING id, course_id, title, "order", created_at, updated_at
            "#,
        )
        .bind(course_id)
        .bind(title)
        .bind(next_order)
        .fetch_one(&self.pool)
        .await?;

        Ok(module)
    }

    pub async fn update_module(&self, module_id: i32, title: &str) -> Result<CourseModule> {
        let title = title.trim();
        if title.is_empty() {
            return Err(Error::BadRequest("Module title is required".to_string()));
        }

        let module = sqlx::query_as::<_, CourseModule>(
            r#"
            UPDATE modules SET title = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, course_id, title, "order", created_at, updated_at
            "#,
        )
        .bind(module_id)
        .bind(title)
        .fetch_one(&self.pool)
        .await?;

        Ok(module)
    }

    pub async fn get_module(&self, module_id: i32) -> Result<CourseModule> {
        let module = sqlx::query_as::<_, CourseModule>(
            r#"SELECT id, course_id, title, "order", created_at, updated_at
               FROM modules WHERE id = $1"#,
        )
        .bind(module_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(module)
    }

    pub async fn list_modules(&self, course_id: i32) -> Result<Vec<CourseModule>> {
        let modules = sqlx::query_as::<_, CourseModule>(
            r#"SELECT id, course_id, title, "order", created_at, updated_at
               FROM modules WHERE course_id = $1
               ORDER BY "order" ASC, id ASC"#,
        )
        .bind(course_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(modules)
    }

    /// Deletes a module and its blocks, question/option rows, submissions
    /// and attempts, all-or-nothing.
    pub async fn delete_module(&self, module_id: i32) -> Result<()> {
        self.get_module(module_id).await?;

        let mut tx = self.pool.begin().await.map_err(storage)?;

        sqlx::query(
            r#"DELETE FROM quiz_attempts WHERE block_id IN (
                   SELECT id FROM blocks WHERE module_id = $1)"#,
        )
        .bind(module_id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        sqlx::query(
            r#"DELETE FROM submissions WHERE block_id IN (
                   SELECT id FROM blocks WHERE module_id = $1)"#,
        )
        .bind(module_id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        sqlx::query(
            r#"DELETE FROM quiz_options WHERE question_id IN (
                   SELECT q.id FROM quiz_questions q
                   JOIN blocks b ON b.id = q.block_id
                   WHERE b.module_id = $1)"#,
        )
        .bind(module_id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        sqlx::query(
            r#"DELETE FROM quiz_questions WHERE block_id IN (
                   SELECT id FROM blocks WHERE module_id = $1)"#,
        )
        .bind(module_id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        sqlx::query(r#"DELETE FROM blocks WHERE module_id = $1"#)
            .bind(module_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        sqlx::query(r#"DELETE FROM modules WHERE id = $1"#)
            .bind(module_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        tracing::info!(module_id, "module deleted with all descendants");
        Ok(())
    }

    pub async fn create_block(
        &self,
        module_id: i32,
        kind: Option<String>,
        order: Option<i32>,
        fields: &PayloadFields,
    ) -> Result<Block> {
        self.get_module(module_id).await?;

        let kind = parse_kind(kind.as_deref(), BlockKind::Text)?;

        let order = match order {
            Some(o) if o > 0 => o,
            Some(_) => {
                return Err(Error::BadRequest(
                    "Block order must be a positive integer".to_string(),
                ))
            }
            None => {
                sqlx::query_scalar::<_, i32>(
                    r#"SELECT COALESCE(MAX("order"), 0) + 1 FROM blocks WHERE module_id = $1"#,
                )
                .bind(module_id)
                .fetch_one(&self.pool)
                .await?
            }
        };

        let payload = BlockPayload::from_fields(kind, fields).encode();

        let block = sqlx::query_as::<_, Block>(
            r#"
            INSERT INTO blocks (module_id, kind, "order", payload)
            VALUES ($1, $2, $3, $4)
            RETURNING id, module_id, kind, "order", payload, created_at, updated_at
            "#,
        )
        .bind(module_id)
        .bind(kind.as_str())
        .bind(order)
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(block)
    }

    pub async fn update_block(
        &self,
        block_id: i32,
        kind: Option<String>,
        order: Option<i32>,
        fields: &PayloadFields,
    ) -> Result<Block> {
        let current = self.get_block(block_id).await?;

        let fallback = BlockKind::parse(&current.kind).unwrap_or(BlockKind::Text);
        let kind = parse_kind(kind.as_deref(), fallback)?;

        let order = match order {
            Some(o) if o > 0 => o,
            Some(_) => {
                return Err(Error::BadRequest(
                    "Block order must be a positive integer".to_string(),
                ))
            }
            None => current.order,
        };

        let payload = BlockPayload::from_fields(kind, fields).encode();

        let block = sqlx::query_as::<_, Block>(
            r#"
            UPDATE blocks
            SET kind = $2, "order" = $3, payload = $4, updated_at = NOW()
            WHERE id = $1
            RETURNING id, module_id, kind, "order", payload, created_at, updated_at
            "#,
        )
        .bind(block_id)
        .bind(kind.as_str())
        .bind(order)
        .bind(payload)
        .fetch_one(&self.pool)
        .await?;

        Ok(block)
    }

    pub async fn get_block(&self, block_id: i32) -> Result<Block> {
        let block = sqlx::query_as::<_, Block>(
            r#"SELECT id, module_id, kind, "order", payload, created_at, updated_at
               FROM blocks WHERE id = $1"#,
        )
        .bind(block_id)
        .fetch_one(&self.pool)
        .await?;
        Ok(block)
    }

    pub async fn list_blocks(&self, module_id: i32) -> Result<Vec<Block>> {
        let blocks = sqlx::query_as::<_, Block>(
            r#"SELECT id, module_id, kind, "order", payload, created_at, updated_at
               FROM blocks WHERE module_id = $1
               ORDER BY "order" ASC, id ASC"#,
        )
        .bind(module_id)
        .fetch_all(&self.pool)
        .await?;
        Ok(blocks)
    }

    pub async fn delete_block(&self, block_id: i32) -> Result<()> {
        self.get_block(block_id).await?;

        let mut tx = self.pool.begin().await.map_err(storage)?;

        sqlx::query(r#"DELETE FROM quiz_attempts WHERE block_id = $1"#)
            .bind(block_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        sqlx::query(r#"DELETE FROM submissions WHERE block_id = $1"#)
            .bind(block_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        sqlx::query(
            r#"DELETE FROM quiz_options WHERE question_id IN (
                   SELECT id FROM quiz_questions WHERE block_id = $1)"#,
        )
        .bind(block_id)
        .execute(&mut *tx)
        .await
        .map_err(storage)?;

        sqlx::query(r#"DELETE FROM quiz_questions WHERE block_id = $1"#)
            .bind(block_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        sqlx::query(r#"DELETE FROM blocks WHERE id = $1"#)
            .bind(block_id)
            .execute(&mut *tx)
            .await
            .map_err(storage)?;

        tx.commit().await.map_err(storage)?;
        Ok(())
    }

    /// Loads a course with its modules and blocks in display order.
    pub async fn load_course_tree(
        &self,
        course_id: i32,
    ) -> Result<(Course, Vec<(CourseModule, Vec<Block>)>)> {
        let course = self.get_course(course_id).await?;
        let modules = self.list_modules(course_id).await?;

        let mut tree = Vec::with_capacity(modules.len());
        for module in modules {
            let blocks = self.list_blocks(module.id).await?;
            tree.push((module, blocks));
        }

        Ok((course, tree))
    }
}

fn parse_kind(kind: Option<&str>, fallback: BlockKind) -> Result<BlockKind> {
    match kind.map(str::trim).filter(|k| !k.is_empty()) {
        None => Ok(fallback),
        Some(raw) => BlockKind::parse(raw)
            .ok_or_else(|| Error::BadRequest(format!("Unknown block kind: {}", raw))),
    }
}

fn storage(err: sqlx::Error) -> Error {
    Error::Storage(err.to_string())
}
