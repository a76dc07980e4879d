use axum::{
    extract::{Multipart, Path, State},
    response::Json,
    Extension,
};
use std::collections::HashMap;

use crate::dto::content_dto::{
    AttemptView, BlockView, CourseView, ModuleView, OptionView, QuestionView, SubmissionView,
};
use crate::dto::quiz_dto::{SubmitQuizRequest, SubmitQuizResponse};
use crate::error::Error;
use crate::middleware::auth::Identity;
use crate::models::course::Course;
use crate::models::payload::{self, BlockKind};
use crate::models::quiz::QuestionWithOptions;
use crate::models::quiz_attempt::QuizAttempt;
use crate::models::submission::Submission;
use crate::services::submission_service::StoredUpload;
use crate::AppState;

#[axum::debug_handler]
pub async fn list_courses(
    State(state): State<AppState>,
) -> crate::error::Result<Json<Vec<Course>>> {
    let courses = state.course_service.list_courses().await?;
    Ok(Json(courses))
}

/// The full course tree for the player: modules and blocks in display
/// order, payloads decoded into view maps, and (for a known viewer) the
/// latest attempt or submission per block.
#[axum::debug_handler]
pub async fn view_course(
    State(state): State<AppState>,
    identity: Option<Extension<Identity>>,
    Path(course_id): Path<i32>,
) -> crate::error::Result<Json<CourseView>> {
    let viewer = identity.map(|Extension(identity)| identity);
    let (course, tree) = state.course_service.load_course_tree(course_id).await?;

    let mut modules = Vec::with_capacity(tree.len());
    for (module, blocks) in tree {
        let mut block_views = Vec::with_capacity(blocks.len());
        for block in blocks {
            let mut view = BlockView {
                id: block.id,
                kind: block.kind.clone(),
                order: block.order,
                payload: payload::view_map(&block.payload),
                questions: None,
                last_attempt: None,
                last_submission: None,
            };

            match BlockKind::parse(&block.kind) {
                Some(BlockKind::Quiz) => {
                    let questions = state.quiz_service.list_questions(block.id).await?;
                    view.questions =
                        Some(questions.into_iter().map(question_view).collect());
                    if let Some(viewer) = &viewer {
                        view.last_attempt = state
                            .history_service
                            .last_attempt(viewer.user_id, block.id)
                            .await?
                            .map(attempt_view);
                    }
                }
                Some(BlockKind::Assignment) => {
                    if let Some(viewer) = &viewer {
                        view.last_submission = state
                            .history_service
                            .last_submission(viewer.user_id, block.id)
                            .await?
                            .map(submission_view);
                    }
                }
                _ => {}
            }

            block_views.push(view);
        }

        modules.push(ModuleView {
            id: module.id,
            title: module.title,
            order: module.order,
            blocks: block_views,
        });
    }

    Ok(Json(CourseView {
        id: course.id,
        title: course.title,
        short_desc: course.short_desc,
        status: course.status,
        modules,
    }))
}

#[axum::debug_handler]
pub async fn submit_quiz(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(block_id): Path<i32>,
    Json(req): Json<SubmitQuizRequest>,
) -> crate::error::Result<Json<SubmitQuizResponse>> {
    let mut answers: HashMap<i32, i32> = HashMap::with_capacity(req.answers.len());
    for answer in &req.answers {
        answers.insert(answer.question_id, answer.option_id);
    }

    let (attempt, pass_score) = state
        .attempt_service
        .submit_quiz(identity.user_id, block_id, &answers)
        .await?;

    Ok(Json(SubmitQuizResponse {
        attempt_id: attempt.id,
        score: attempt.score,
        passed: attempt.passed,
        pass_score,
    }))
}

#[axum::debug_handler]
pub async fn submit_assignment(
    State(state): State<AppState>,
    Extension(identity): Extension<Identity>,
    Path(block_id): Path<i32>,
    mut multipart: Multipart,
) -> crate::error::Result<Json<Submission>> {
    let mut upload: Option<StoredUpload> = None;

    while let Some(field) = multipart.next_field().await? {
        if field.name() != Some("file") {
            continue;
        }
        let original_name = field
            .file_name()
            .map(|name| name.to_string())
            .unwrap_or_else(|| "upload".to_string());
        let mimetype = field.content_type().map(|m| m.to_string());
        let data = field.bytes().await?;

        let (stored_path, size_bytes) = state
            .storage_service
            .store_submission_file(&original_name, data)
            .await?;

        upload = Some(StoredUpload {
            original_name,
            stored_path,
            mimetype,
            size_bytes,
        });
        break;
    }

    let Some(upload) = upload else {
        return Err(Error::BadRequest("A 'file' field is required".to_string()));
    };

    let stored_path = upload.stored_path.clone();
    match state
        .submission_service
        .create_submission(identity.user_id, block_id, upload)
        .await
    {
        Ok(submission) => Ok(Json(submission)),
        Err(err) => {
            // The row never landed; don't keep the bytes around either.
            state.storage_service.remove(&stored_path).await;
            Err(err)
        }
    }
}

fn question_view(q: QuestionWithOptions) -> QuestionView {
    QuestionView {
        id: q.question.id,
        text: q.question.text,
        options: q
            .options
            .into_iter()
            .map(|opt| OptionView {
                id: opt.id,
                text: opt.text,
            })
            .collect(),
    }
}

fn attempt_view(attempt: QuizAttempt) -> AttemptView {
    AttemptView {
        id: attempt.id,
        score: attempt.score,
        passed: attempt.passed,
        details: attempt.details,
        created_at: attempt.created_at,
    }
}

fn submission_view(submission: Submission) -> SubmissionView {
    SubmissionView {
        id: submission.id,
        original_name: submission.original_name,
        status: submission.status,
        comment: submission.comment,
        created_at: submission.created_at,
    }
}
