use crate::models::block::Block;
use crate::models::course::Course;
use crate::models::course_module::CourseModule;
use crate::models::payload::PayloadFields;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value as JsonValue};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub short_desc: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateCourseRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
    pub short_desc: Option<String>,
    pub status: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateModuleRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdateModuleRequest {
    #[validate(length(min = 1, max = 255))]
    pub title: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateBlockRequest {
    pub kind: Option<String>,
    pub order: Option<i32>,
    #[serde(flatten)]
    pub payload: PayloadFields,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateBlockRequest {
    pub kind: Option<String>,
    pub order: Option<i32>,
    #[serde(flatten)]
    pub payload: PayloadFields,
}

/// Admin view of a course with its full authoring tree.
#[derive(Debug, Clone, Serialize)]
pub struct AdminCourseTree {
    pub course: Course,
    pub modules: Vec<AdminModuleTree>,
}

#[derive(Debug, Clone, Serialize)]
pub struct AdminModuleTree {
    pub module: CourseModule,
    pub blocks: Vec<Block>,
}

/// Learner-facing course tree. Blocks carry the decoded payload view and,
/// when the viewer is known, their latest attempt/submission. None of this
/// is ever written back to storage.
#[derive(Debug, Clone, Serialize)]
pub struct CourseView {
    pub id: i32,
    pub title: String,
    pub short_desc: String,
    pub status: String,
    pub modules: Vec<ModuleView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ModuleView {
    pub id: i32,
    pub title: String,
    pub order: i32,
    pub blocks: Vec<BlockView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct BlockView {
    pub id: i32,
    pub kind: String,
    pub order: i32,
    pub payload: Map<String, JsonValue>,
    pub questions: Option<Vec<QuestionView>>,
    pub last_attempt: Option<AttemptView>,
    pub last_submission: Option<SubmissionView>,
}

/// Question as shown to a learner: option correctness stays server-side.
#[derive(Debug, Clone, Serialize)]
pub struct QuestionView {
    pub id: i32,
    pub text: String,
    pub options: Vec<OptionView>,
}

#[derive(Debug, Clone, Serialize)]
pub struct OptionView {
    pub id: i32,
    pub text: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct AttemptView {
    pub id: i32,
    pub score: f64,
    pub passed: bool,
    pub details: JsonValue,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SubmissionView {
    pub id: i32,
    pub original_name: String,
    pub status: String,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}
