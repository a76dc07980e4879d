use coursecraft_backend::error::Error;
use coursecraft_backend::models::payload::PayloadFields;
use coursecraft_backend::services::attempt_service::AttemptService;
use coursecraft_backend::services::course_service::CourseService;
use coursecraft_backend::services::history_service::HistoryService;
use coursecraft_backend::services::quiz_service::QuizService;
use coursecraft_backend::services::submission_service::{StoredUpload, SubmissionService};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use std::collections::HashMap;

async fn setup_test_db() -> Option<PgPool> {
    dotenvy::dotenv().ok();
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        eprintln!("DATABASE_URL not set; skipping database test");
        return None;
    };
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("Failed to create test pool");

    sqlx::migrate!("./migrations")
        .run(&pool)
        .await
        .expect("Failed to run migrations");

    Some(pool)
}

struct SeededQuiz {
    course_id: i32,
    module_id: i32,
    block_id: i32,
    /// (question id, correct option id, wrong option id) per question.
    questions: Vec<(i32, i32, i32)>,
}

async fn seed_quiz(pool: &PgPool, question_count: usize, pass_score: Option<f64>) -> SeededQuiz {
    let courses = CourseService::new(pool.clone());
    let quizzes = QuizService::new(pool.clone());

    let course = courses
        .create_course("Quiz course", "", None)
        .await
        .expect("create course");
    let module = courses
        .create_module(course.id, "M1")
        .await
        .expect("create module");
    let block = courses
        .create_block(
            module.id,
            Some("quiz".to_string()),
            None,
            &PayloadFields {
                pass_score,
                ..Default::default()
            },
        )
        .await
        .expect("quiz block");

    let mut questions = Vec::with_capacity(question_count);
    for i in 0..question_count {
        let question = quizzes
            .create_question(block.id, &format!("Question {}", i + 1))
            .await
            .expect("question");
        let correct = quizzes
            .create_option(question.id, "right", true)
            .await
            .expect("correct option");
        let wrong = quizzes
            .create_option(question.id, "wrong", false)
            .await
            .expect("wrong option");
        questions.push((question.id, correct.id, wrong.id));
    }

    SeededQuiz {
        course_id: course.id,
        module_id: module.id,
        block_id: block.id,
        questions,
    }
}

#[tokio::test]
async fn three_of_four_passes_with_default_threshold() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let attempts = AttemptService::new(pool.clone());
    let quiz = seed_quiz(&pool, 4, None).await;

    let mut answers = HashMap::new();
    for (qid, correct, _wrong) in &quiz.questions[..3] {
        answers.insert(*qid, *correct);
    }
    answers.insert(quiz.questions[3].0, quiz.questions[3].2);

    let (attempt, pass_score) = attempts
        .submit_quiz(1001, quiz.block_id, &answers)
        .await
        .expect("submit");

    assert_eq!(attempt.score, 75.0);
    assert_eq!(pass_score, 60.0);
    assert!(attempt.passed);

    CourseService::new(pool).delete_course(quiz.course_id).await.expect("cleanup");
}

#[tokio::test]
async fn half_right_fails_a_stricter_threshold() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let attempts = AttemptService::new(pool.clone());
    let quiz = seed_quiz(&pool, 2, Some(80.0)).await;

    let mut answers = HashMap::new();
    answers.insert(quiz.questions[0].0, quiz.questions[0].1);
    answers.insert(quiz.questions[1].0, quiz.questions[1].2);

    let (attempt, pass_score) = attempts
        .submit_quiz(1002, quiz.block_id, &answers)
        .await
        .expect("submit");

    assert_eq!(attempt.score, 50.0);
    assert_eq!(pass_score, 80.0);
    assert!(!attempt.passed);

    CourseService::new(pool).delete_course(quiz.course_id).await.expect("cleanup");
}

#[tokio::test]
async fn empty_quiz_records_nothing() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let attempts = AttemptService::new(pool.clone());
    let quiz = seed_quiz(&pool, 0, None).await;

    let err = attempts
        .submit_quiz(1003, quiz.block_id, &HashMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::EmptyQuiz));

    let recorded: i64 =
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM quiz_attempts WHERE block_id = $1"#)
            .bind(quiz.block_id)
            .fetch_one(&pool)
            .await
            .expect("count");
    assert_eq!(recorded, 0);

    CourseService::new(pool).delete_course(quiz.course_id).await.expect("cleanup");
}

#[tokio::test]
async fn non_quiz_blocks_cannot_be_graded() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let courses = CourseService::new(pool.clone());
    let attempts = AttemptService::new(pool.clone());

    let course = courses.create_course("Texts", "", None).await.expect("course");
    let module = courses.create_module(course.id, "M1").await.expect("module");
    let block = courses
        .create_block(module.id, None, None, &PayloadFields::default())
        .await
        .expect("text block");

    let err = attempts
        .submit_quiz(1004, block.id, &HashMap::new())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    courses.delete_course(course.id).await.expect("cleanup");
}

#[tokio::test]
async fn details_hold_answered_questions_and_unanswered_lower_the_score() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let attempts = AttemptService::new(pool.clone());
    let quiz = seed_quiz(&pool, 2, None).await;

    let mut answers = HashMap::new();
    answers.insert(quiz.questions[0].0, quiz.questions[0].1);

    let (attempt, _) = attempts
        .submit_quiz(1005, quiz.block_id, &answers)
        .await
        .expect("submit");

    assert_eq!(attempt.score, 50.0);
    let details = attempt.details.as_object().expect("details object");
    assert_eq!(details.len(), 1);
    assert_eq!(
        details[&quiz.questions[0].0.to_string()],
        serde_json::json!(quiz.questions[0].1)
    );

    CourseService::new(pool).delete_course(quiz.course_id).await.expect("cleanup");
}

#[tokio::test]
async fn last_attempt_is_the_newest_and_history_is_append_only() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let attempts = AttemptService::new(pool.clone());
    let history = HistoryService::new(pool.clone());
    let quiz = seed_quiz(&pool, 1, None).await;
    let learner = 1006;

    assert!(history
        .last_attempt(learner, quiz.block_id)
        .await
        .expect("lookup")
        .is_none());

    let mut wrong = HashMap::new();
    wrong.insert(quiz.questions[0].0, quiz.questions[0].2);
    let (first, _) = attempts
        .submit_quiz(learner, quiz.block_id, &wrong)
        .await
        .expect("first attempt");

    let mut right = HashMap::new();
    right.insert(quiz.questions[0].0, quiz.questions[0].1);
    let (second, _) = attempts
        .submit_quiz(learner, quiz.block_id, &right)
        .await
        .expect("second attempt");

    let last = history
        .last_attempt(learner, quiz.block_id)
        .await
        .expect("lookup")
        .expect("attempt present");
    assert_eq!(last.id, second.id);
    assert!(last.passed);

    let total: i64 =
        sqlx::query_scalar(r#"SELECT COUNT(*) FROM quiz_attempts WHERE user_id = $1 AND block_id = $2"#)
            .bind(learner)
            .bind(quiz.block_id)
            .fetch_one(&pool)
            .await
            .expect("count");
    assert_eq!(total, 2);
    assert_ne!(first.id, second.id);

    CourseService::new(pool).delete_course(quiz.course_id).await.expect("cleanup");
}

#[tokio::test]
async fn assignment_uploads_are_gated_on_the_module_quiz() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let courses = CourseService::new(pool.clone());
    let attempts = AttemptService::new(pool.clone());
    let submissions = SubmissionService::new(pool.clone());
    let history = HistoryService::new(pool.clone());
    let quiz = seed_quiz(&pool, 1, None).await;
    let learner = 1007;

    let assignment = courses
        .create_block(
            quiz.module_id,
            Some("assignment".to_string()),
            None,
            &PayloadFields {
                prompt: Some("Upload your work".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("assignment block");

    let upload = || StoredUpload {
        original_name: "hw.pdf".to_string(),
        stored_path: "submissions/hw.pdf".to_string(),
        mimetype: Some("application/pdf".to_string()),
        size_bytes: 1024,
    };

    // No passed attempt yet: the upload is turned away.
    let err = submissions
        .create_submission(learner, assignment.id, upload())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let mut right = HashMap::new();
    right.insert(quiz.questions[0].0, quiz.questions[0].1);
    attempts
        .submit_quiz(learner, quiz.block_id, &right)
        .await
        .expect("passing attempt");

    let submission = submissions
        .create_submission(learner, assignment.id, upload())
        .await
        .expect("submission accepted");
    assert_eq!(submission.status, "submitted");

    let last = history
        .last_submission(learner, assignment.id)
        .await
        .expect("lookup")
        .expect("submission present");
    assert_eq!(last.id, submission.id);

    // Review moves it through the closed status set; anything else bounces.
    let reviewed = submissions
        .review_submission(submission.id, "accepted", "good work")
        .await
        .expect("review");
    assert_eq!(reviewed.status, "accepted");
    assert_eq!(reviewed.comment, "good work");

    let err = submissions
        .review_submission(submission.id, "archived", "")
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    courses.delete_course(quiz.course_id).await.expect("cleanup");
}

#[tokio::test]
async fn uploads_to_non_assignment_blocks_are_rejected() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let submissions = SubmissionService::new(pool.clone());
    let quiz = seed_quiz(&pool, 1, None).await;

    let err = submissions
        .create_submission(
            1008,
            quiz.block_id,
            StoredUpload {
                original_name: "hw.pdf".to_string(),
                stored_path: "submissions/hw.pdf".to_string(),
                mimetype: None,
                size_bytes: 10,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    CourseService::new(pool).delete_course(quiz.course_id).await.expect("cleanup");
}
