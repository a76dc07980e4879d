pub mod config;
pub mod database;
pub mod dto;
pub mod error;
pub mod middleware;
pub mod models;
pub mod routes;
pub mod services;

use crate::services::{
    attempt_service::AttemptService, course_service::CourseService,
    history_service::HistoryService, quiz_service::QuizService,
    storage_service::StorageService, submission_service::SubmissionService,
};
use sqlx::PgPool;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub course_service: CourseService,
    pub quiz_service: QuizService,
    pub attempt_service: AttemptService,
    pub history_service: HistoryService,
    pub submission_service: SubmissionService,
    pub storage_service: StorageService,
}

impl AppState {
    pub fn new(pool: PgPool) -> Self {
        let config = crate::config::get_config();

        let course_service = CourseService::new(pool.clone());
        let quiz_service = QuizService::new(pool.clone());
        let attempt_service = AttemptService::new(pool.clone());
        let history_service = HistoryService::new(pool.clone());
        let submission_service = SubmissionService::new(pool.clone());
        let storage_service = StorageService::new(config.uploads_dir.clone());

        Self {
            pool,
            course_service,
            quiz_service,
            attempt_service,
            history_service,
            submission_service,
            storage_service,
        }
    }
}
