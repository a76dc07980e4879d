use axum::{
    extract::{Path, State},
    response::Json,
};
use serde_json::json;
use validator::Validate;

use crate::dto::content_dto::{
    AdminCourseTree, AdminModuleTree, CreateBlockRequest, CreateCourseRequest,
    CreateModuleRequest, UpdateBlockRequest, UpdateCourseRequest, UpdateModuleRequest,
};
use crate::models::block::Block;
use crate::models::course::Course;
use crate::models::course_module::CourseModule;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_courses(
    State(state): State<AppState>,
) -> crate::error::Result<Json<Vec<Course>>> {
    let courses = state.course_service.list_courses().await?;
    Ok(Json(courses))
}

#[axum::debug_handler]
pub async fn create_course(
    State(state): State<AppState>,
    Json(req): Json<CreateCourseRequest>,
) -> crate::error::Result<Json<Course>> {
    req.validate()?;
    let course = state
        .course_service
        .create_course(
            &req.title,
            req.short_desc.as_deref().unwrap_or(""),
            req.status,
        )
        .await?;
    Ok(Json(course))
}

#[axum::debug_handler]
pub async fn get_course_tree(
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> crate::error::Result<Json<AdminCourseTree>> {
    let (course, tree) = state.course_service.load_course_tree(course_id).await?;
    let modules = tree
        .into_iter()
        .map(|(module, blocks)| AdminModuleTree { module, blocks })
        .collect();
    Ok(Json(AdminCourseTree { course, modules }))
}

#[axum::debug_handler]
pub async fn update_course(
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    Json(req): Json<UpdateCourseRequest>,
) -> crate::error::Result<Json<Course>> {
    req.validate()?;
    let course = state
        .course_service
        .update_course(
            course_id,
            &req.title,
            req.short_desc.as_deref().unwrap_or(""),
            req.status,
        )
        .await?;
    Ok(Json(course))
}

#[axum::debug_handler]
pub async fn delete_course(
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
) -> crate::error::Result<Json<serde_json::Value>> {
    state.course_service.delete_course(course_id).await?;
    Ok(Json(json!({ "deleted": course_id })))
}

#[axum::debug_handler]
pub async fn create_module(
    State(state): State<AppState>,
    Path(course_id): Path<i32>,
    Json(req): Json<CreateModuleRequest>,
) -> crate::error::Result<Json<CourseModule>> {
    req.validate()?;
    let module = state
        .course_service
        .create_module(course_id, &req.title)
        .await?;
    Ok(Json(module))
}

#[axum::debug_handler]
pub async fn update_module(
    State(state): State<AppState>,
    Path(module_id): Path<i32>,
    Json(req): Json<UpdateModuleRequest>,
) -> crate::error::Result<Json<CourseModule>> {
    req.validate()?;
    let module = state
        .course_service
        .update_module(module_id, &req.title)
        .await?;
    Ok(Json(module))
}

#[axum::debug_handler]
pub async fn delete_module(
    State(state): State<AppState>,
    Path(module_id): Path<i32>,
) -> crate::error::Result<Json<serde_json::Value>> {
    state.course_service.delete_module(module_id).await?;
    Ok(Json(json!({ "deleted": module_id })))
}

#[axum::debug_handler]
pub async fn create_block(
    State(state): State<AppState>,
    Path(module_id): Path<i32>,
    Json(req): Json<CreateBlockRequest>,
) -> crate::error::Result<Json<Block>> {
    let block = state
        .course_service
        .create_block(module_id, req.kind, req.order, &req.payload)
        .await?;
    Ok(Json(block))
}

#[axum::debug_handler]
pub async fn update_block(
    State(state): State<AppState>,
    Path(block_id): Path<i32>,
    Json(req): Json<UpdateBlockRequest>,
) -> crate::error::Result<Json<Block>> {
    let block = state
        .course_service
        .update_block(block_id, req.kind, req.order, &req.payload)
        .await?;
    Ok(Json(block))
}

#[axum::debug_handler]
pub async fn delete_block(
    State(state): State<AppState>,
    Path(block_id): Path<i32>,
) -> crate::error::Result<Json<serde_json::Value>> {
    state.course_service.delete_block(block_id).await?;
    Ok(Json(json!({ "deleted": block_id })))
}
