use serde::{Deserialize, Serialize};
use validator::Validate;

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct ReviewSubmissionRequest {
    #[validate(length(min = 1))]
    pub status: String,
    pub comment: Option<String>,
}
