use coursecraft_backend::error::Error;
use coursecraft_backend::models::payload::PayloadFields;
use coursecraft_backend::services::course_service::CourseService;
use coursecraft_backend::services::quiz_service::QuizService;
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;

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

#[tokio::test]
async fn module_order_is_assigned_and_keeps_gaps() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let courses = CourseService::new(pool);

    let course = courses
        .create_course("Ordering", "", None)
        .await
        .expect("create course");

    let m1 = courses.create_module(course.id, "One").await.expect("m1");
    let m2 = courses.create_module(course.id, "Two").await.expect("m2");
    let m3 = courses.create_module(course.id, "Three").await.expect("m3");
    assert_eq!((m1.order, m2.order, m3.order), (1, 2, 3));

    // Deleting the middle module leaves a gap; the next module fills in
    // after the highest surviving order, not the hole.
    courses.delete_module(m2.id).await.expect("delete m2");
    let m4 = courses.create_module(course.id, "Four").await.expect("m4");
    assert_eq!(m4.order, 4);

    let modules = courses.list_modules(course.id).await.expect("list");
    let orders: Vec<i32> = modules.iter().map(|m| m.order).collect();
    assert_eq!(orders, vec![1, 3, 4]);

    courses.delete_course(course.id).await.expect("cleanup");
}

#[tokio::test]
async fn empty_titles_are_rejected() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let courses = CourseService::new(pool);

    let err = courses.create_course("   ", "", None).await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    let course = courses
        .create_course("Valid", "", None)
        .await
        .expect("create course");
    let err = courses.create_module(course.id, "  ").await.unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    courses.delete_course(course.id).await.expect("cleanup");
}

#[tokio::test]
async fn block_kind_defaults_and_order_validation() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let courses = CourseService::new(pool);

    let course = courses
        .create_course("Blocks", "", None)
        .await
        .expect("create course");
    let module = courses
        .create_module(course.id, "M1")
        .await
        .expect("create module");

    let block = courses
        .create_block(module.id, None, None, &PayloadFields::default())
        .await
        .expect("default block");
    assert_eq!(block.kind, "text");
    assert_eq!(block.order, 1);

    let err = courses
        .create_block(module.id, None, Some(0), &PayloadFields::default())
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    let err = courses
        .create_block(
            module.id,
            Some("podcast".to_string()),
            None,
            &PayloadFields::default(),
        )
        .await
        .unwrap_err();
    assert!(matches!(err, Error::BadRequest(_)));

    let explicit = courses
        .create_block(
            module.id,
            Some("video".to_string()),
            Some(7),
            &PayloadFields {
                url: Some("https://video.example/v/1".to_string()),
                ..Default::default()
            },
        )
        .await
        .expect("video block");
    assert_eq!(explicit.kind, "video");
    assert_eq!(explicit.order, 7);
    assert_eq!(explicit.payload["url"], explicit.payload["video_url"]);

    // Next auto-assigned order continues after the explicit one.
    let next = courses
        .create_block(module.id, None, None, &PayloadFields::default())
        .await
        .expect("next block");
    assert_eq!(next.order, 8);

    courses.delete_course(course.id).await.expect("cleanup");
}

#[tokio::test]
async fn question_can_have_at_most_one_correct_option() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let courses = CourseService::new(pool.clone());
    let quizzes = QuizService::new(pool);

    let course = courses
        .create_course("Invariant", "", None)
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
            &PayloadFields::default(),
        )
        .await
        .expect("quiz block");

    let question = quizzes
        .create_question(block.id, "Pick one")
        .await
        .expect("question");

    let a = quizzes
        .create_option(question.id, "A", true)
        .await
        .expect("option A");

    // A second correct option must be rejected, leaving A authoritative.
    let err = quizzes
        .create_option(question.id, "B", true)
        .await
        .unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    let b = quizzes
        .create_option(question.id, "B", false)
        .await
        .expect("option B (incorrect)");

    let err = quizzes.update_option(b.id, "B", true).await.unwrap_err();
    assert!(matches!(err, Error::Conflict(_)));

    // Re-saving the already-correct option stays legal.
    let a = quizzes
        .update_option(a.id, "A v2", true)
        .await
        .expect("edit correct option");
    assert!(a.is_correct);

    let questions = quizzes.list_questions(block.id).await.expect("list");
    let correct: Vec<&str> = questions[0]
        .options
        .iter()
        .filter(|opt| opt.is_correct)
        .map(|opt| opt.text.as_str())
        .collect();
    assert_eq!(correct, vec!["A v2"]);

    // Demoting A frees the slot for B.
    quizzes.update_option(a.id, "A v2", false).await.expect("demote A");
    quizzes.update_option(b.id, "B", true).await.expect("promote B");

    courses.delete_course(course.id).await.expect("cleanup");
}

#[tokio::test]
async fn deleting_a_course_removes_every_descendant_row() {
    let Some(pool) = setup_test_db().await else {
        return;
    };
    let courses = CourseService::new(pool.clone());
    let quizzes = QuizService::new(pool.clone());

    let course = courses
        .create_course("Cascade", "", None)
        .await
        .expect("create course");
    let module = courses
        .create_module(course.id, "M1")
        .await
        .expect("create module");
    let quiz = courses
        .create_block(
            module.id,
            Some("quiz".to_string()),
            None,
            &PayloadFields::default(),
        )
        .await
        .expect("quiz block");
    let assignment = courses
        .create_block(
            module.id,
            Some("assignment".to_string()),
            None,
            &PayloadFields {
                prompt: Some("Upload".to_string()),
                require_pass: Some(false),
                ..Default::default()
            },
        )
        .await
        .expect("assignment block");

    let question = quizzes
        .create_question(quiz.id, "Q1")
        .await
        .expect("question");
    quizzes
        .create_option(question.id, "A", true)
        .await
        .expect("option");

    sqlx::query(
        r#"INSERT INTO quiz_attempts (user_id, block_id, score, passed, details)
           VALUES (4242, $1, 100, TRUE, '{}'::jsonb)"#,
    )
    .bind(quiz.id)
    .execute(&pool)
    .await
    .expect("seed attempt");

    sqlx::query(
        r#"INSERT INTO submissions (user_id, block_id, original_name, stored_path)
           VALUES (4242, $1, 'hw.pdf', 'submissions/hw.pdf')"#,
    )
    .bind(assignment.id)
    .execute(&pool)
    .await
    .expect("seed submission");

    courses.delete_course(course.id).await.expect("delete course");

    let counts: (i64, i64, i64, i64, i64, i64) = (
        count(&pool, "SELECT COUNT(*) FROM courses WHERE id = $1", course.id).await,
        count(&pool, "SELECT COUNT(*) FROM modules WHERE course_id = $1", course.id).await,
        count(&pool, "SELECT COUNT(*) FROM blocks WHERE module_id = $1", module.id).await,
        count(&pool, "SELECT COUNT(*) FROM quiz_questions WHERE block_id = $1", quiz.id).await,
        count(&pool, "SELECT COUNT(*) FROM quiz_attempts WHERE block_id = $1", quiz.id).await,
        count(&pool, "SELECT COUNT(*) FROM submissions WHERE block_id = $1", assignment.id).await,
    );
    assert_eq!(counts, (0, 0, 0, 0, 0, 0));

    let orphan_options: i64 = sqlx::query_scalar(
        r#"SELECT COUNT(*) FROM quiz_options WHERE question_id = $1"#,
    )
    .bind(question.id)
    .fetch_one(&pool)
    .await
    .expect("count options");
    assert_eq!(orphan_options, 0);
}

async fn count(pool: &PgPool, sql: &str, id: i32) -> i64 {
    sqlx::query_scalar(sql)
        .bind(id)
        .fetch_one(pool)
        .await
        .expect("count query")
}
