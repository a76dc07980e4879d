use axum::{
    extract::{Path, Query, State},
    response::Json,
};
use serde::Deserialize;
use serde_json::json;
use validator::Validate;

use crate::dto::submission_dto::ReviewSubmissionRequest;
use crate::models::quiz_attempt::QuizAttempt;
use crate::models::submission::Submission;
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct SubmissionListParams {
    pub block_id: Option<i32>,
}

#[axum::debug_handler]
pub async fn list_submissions(
    State(state): State<AppState>,
    Query(params): Query<SubmissionListParams>,
) -> crate::error::Result<Json<Vec<Submission>>> {
    let submissions = state
        .submission_service
        .list_submissions(params.block_id)
        .await?;
    Ok(Json(submissions))
}

#[axum::debug_handler]
pub async fn get_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<i32>,
) -> crate::error::Result<Json<Submission>> {
    let submission = state.submission_service.get_submission(submission_id).await?;
    Ok(Json(submission))
}

#[axum::debug_handler]
pub async fn review_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<i32>,
    Json(req): Json<ReviewSubmissionRequest>,
) -> crate::error::Result<Json<Submission>> {
    req.validate()?;
    let submission = state
        .submission_service
        .review_submission(
            submission_id,
            &req.status,
            req.comment.as_deref().unwrap_or(""),
        )
        .await?;
    Ok(Json(submission))
}

#[axum::debug_handler]
pub async fn delete_submission(
    State(state): State<AppState>,
    Path(submission_id): Path<i32>,
) -> crate::error::Result<Json<serde_json::Value>> {
    let submission = state
        .submission_service
        .delete_submission(submission_id)
        .await?;
    state.storage_service.remove(&submission.stored_path).await;
    Ok(Json(json!({ "deleted": submission_id })))
}

#[axum::debug_handler]
pub async fn list_course_attempts(
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> crate::error::Result<Json<Vec<QuizAttempt>>> {
    state.course_service.get_course(course_id).await?;
    let attempts = state
        .attempt_service
        .list_attempts_for_course(course_id)
        .await?;
    Ok(Json(attempts))
}
