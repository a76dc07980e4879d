pub mod attempt_service;
pub mod course_service;
pub mod grading_service;
pub mod history_service;
pub mod quiz_service;
pub mod storage_service;
pub mod submission_service;
