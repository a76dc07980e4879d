use crate::models::quiz::QuestionWithOptions;
use serde_json::{Map, Value as JsonValue};
use std::collections::HashMap;

/// Result of scoring one set of submitted answers against a quiz.
#[derive(Debug, Clone)]
pub struct GradedQuiz {
    /// Percentage in [0, 100]. The denominator is the full question count,
    /// so unanswered questions pull the score down.
    pub score: f64,
    pub correct_count: usize,
    pub total_questions: usize,
    /// `{"<question id>": <chosen option id>}`, answered questions only.
    pub details: JsonValue,
}

pub struct GradingService;

impl GradingService {
    /// Scores `answers` (question id -> chosen option id) against the quiz's
    /// questions. An answer is correct only when the chosen option belongs to
    /// that question and is flagged correct; every submitted choice lands in
    /// `details` verbatim, even when it matches no option.
    pub fn score_quiz(
        questions: &[QuestionWithOptions],
        answers: &HashMap<i32, i32>,
    ) -> GradedQuiz {
        let total_questions = questions.len();
        let mut correct_count = 0usize;
        let mut details = Map::new();

        for q in questions {
            let Some(&chosen) = answers.get(&q.question.id) else {
                continue;
            };
            details.insert(q.question.id.to_string(), JsonValue::from(chosen));

            if q.options
                .iter()
                .any(|opt| opt.id == chosen && opt.is_correct)
            {
                correct_count += 1;
            }
        }

        let score = if total_questions > 0 {
            correct_count as f64 / total_questions as f64 * 100.0
        } else {
            0.0
        };

        GradedQuiz {
            score,
            correct_count,
            total_questions,
            details: JsonValue::Object(details),
        }
    }
}
