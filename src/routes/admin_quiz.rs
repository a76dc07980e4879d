use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::json;
use validator::Validate;

use crate::dto::quiz_dto::{
    CreateOptionRequest, CreateQuestionRequest, UpdateOptionRequest, UpdateQuestionRequest,
};
use crate::models::quiz::{QuestionWithOptions, QuizOption, QuizQuestion};
use crate::AppState;

#[axum::debug_handler]
pub async fn list_questions(
    State(state): State<AppState>,
    Path(block_id): Path<i32>,
) -> crate::error::Result<Json<Vec<QuestionWithOptions>>> {
    state.quiz_service.get_quiz_block(block_id).await?;
    let questions = state.quiz_service.list_questions(block_id).await?;
    Ok(Json(questions))
}

#[axum::debug_handler]
pub async fn create_question(
    State(state): State<AppState>,
    Path(block_id): Path<i32>,
    Json(req): Json<CreateQuestionRequest>,
) -> crate::error::Result<Json<QuizQuestion>> {
    req.validate()?;
    let question = state
        .quiz_service
        .create_question(block_id, &req.text)
        .await?;
    Ok(Json(question))
}

#[axum::debug_handler]
pub async fn update_question(
    State(state): State<AppState>,
    Path(question_id): Path<i32>,
    Json(req): Json<UpdateQuestionRequest>,
) -> crate::error::Result<Json<QuizQuestion>> {
    req.validate()?;
    let question = state
        .quiz_service
        .update_question(question_id, &req.text)
        .await?;
    Ok(Json(question))
}

#[axum::debug_handler]
pub async fn delete_question(
    State(state): State<AppState>,
    Path(question_id): Path<i32>,
) -> crate::error::Result<Json<serde_json::Value>> {
    state.quiz_service.delete_question(question_id).await?;
    Ok(Json(json!({ "deleted": question_id })))
}

#[axum::debug_handler]
pub async fn create_option(
    State(state): State<AppState>,
    Path(question_id): Path<i32>,
    Json(req): Json<CreateOptionRequest>,
) -> crate::error::Result<Json<QuizOption>> {
    req.validate()?;
    let option = state
        .quiz_service
        .create_option(question_id, &req.text, req.is_correct.unwrap_or(false))
        .await?;
    Ok(Json(option))
}

#[axum::debug_handler]
pub async fn update_option(
    State(state): State<AppState>,
    Path(option_id): Path<i32>,
    Json(req): Json<UpdateOptionRequest>,
) -> crate::error::Result<Json<QuizOption>> {
    req.validate()?;
    let option = state
        .quiz_service
        .update_option(option_id, &req.text, req.is_correct)
        .await?;
    Ok(Json(option))
}

#[axum::debug_handler]
pub async fn delete_option(
    State(state): State<AppState>,
    Path(option_id): Path<i32>,
) -> crate::error::Result<Json<serde_json::Value>> {
    state.quiz_service.delete_option(option_id).await?;
    Ok(Json(json!({ "deleted": option_id })))
}
