pub mod block;
pub mod course;
pub mod course_module;
pub mod payload;
pub mod quiz;
pub mod quiz_attempt;
pub mod submission;
