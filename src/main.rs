use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use coursecraft_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
    middleware::auth,
    routes, AppState,
};
use std::net::SocketAddr;
use tokio::net::TcpListener;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing::info;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt::init();
    init_config()?;
    let config = get_config();

    let pool = create_pool().await?;
    sqlx::migrate!("./migrations").run(&pool).await?;

    let app_state = AppState::new(pool);

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let public_api = Router::new()
        .route("/api/courses", get(routes::courses::list_courses))
        .route("/api/courses/:course_id", get(routes::courses::view_course))
        .layer(axum::middleware::from_fn(auth::attach_identity));

    let learner_api = Router::new()
        .route(
            "/api/courses/blocks/:block_id/quiz",
            post(routes::courses::submit_quiz),
        )
        .route(
            "/api/courses/blocks/:block_id/submission",
            post(routes::courses::submit_assignment),
        )
        .layer(axum::middleware::from_fn(auth::require_identity));

    let admin_api = Router::new()
        .route(
            "/api/admin/courses",
            get(routes::admin_content::list_courses).post(routes::admin_content::create_course),
        )
        .route(
            "/api/admin/courses/:course_id",
            get(routes::admin_content::get_course_tree)
                .patch(routes::admin_content::update_course)
                .delete(routes::admin_content::delete_course),
        )
        .route(
            "/api/admin/courses/:course_id/modules",
            post(routes::admin_content::create_module),
        )
        .route(
            "/api/admin/courses/:course_id/attempts",
            get(routes::admin_review::list_course_attempts),
        )
        .route(
            "/api/admin/modules/:module_id",
            axum::routing::patch(routes::admin_content::update_module)
                .delete(routes::admin_content::delete_module),
        )
        .route(
            "/api/admin/modules/:module_id/blocks",
            post(routes::admin_content::create_block),
        )
        .route(
            "/api/admin/blocks/:block_id",
            axum::routing::patch(routes::admin_content::update_block)
                .delete(routes::admin_content::delete_block),
        )
        .route(
            "/api/admin/blocks/:block_id/questions",
            get(routes::admin_quiz::list_questions).post(routes::admin_quiz::create_question),
        )
        .route(
            "/api/admin/questions/:question_id",
            axum::routing::patch(routes::admin_quiz::update_question)
                .delete(routes::admin_quiz::delete_question),
        )
        .route(
            "/api/admin/questions/:question_id/options",
            post(routes::admin_quiz::create_option),
        )
        .route(
            "/api/admin/options/:option_id",
            axum::routing::patch(routes::admin_quiz::update_option)
                .delete(routes::admin_quiz::delete_option),
        )
        .route(
            "/api/admin/submissions",
            get(routes::admin_review::list_submissions),
        )
        .route(
            "/api/admin/submissions/:submission_id",
            get(routes::admin_review::get_submission)
                .patch(routes::admin_review::review_submission)
                .delete(routes::admin_review::delete_submission),
        )
        .layer(axum::middleware::from_fn(auth::require_admin));

    info!("Serving uploads from: {}", config.uploads_dir);

    let app = base_routes
        .merge(public_api)
        .merge(learner_api)
        .merge(admin_api)
        .nest_service(
            "/uploads",
            tower_http::services::ServeDir::new(&config.uploads_dir),
        )
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .layer(DefaultBodyLimit::max(50 * 1024 * 1024));

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
