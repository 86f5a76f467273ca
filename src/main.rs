use axum::{
    routing::{get, post},
    Router,
};
use questgen_backend::{
    config::{get_config, init_config},
    database::pool::create_pool,
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

    let app_state = AppState::new(pool)?;

    let base_routes = Router::new().route("/health", get(routes::health::health));

    let catalog_api = Router::new()
        .route("/api/catalog/exams", get(routes::catalog::list_exams))
        .route(
            "/api/catalog/exams/:id/courses",
            get(routes::catalog::list_courses),
        )
        .route(
            "/api/catalog/courses/:id/subjects",
            get(routes::catalog::list_subjects),
        )
        .route(
            "/api/catalog/courses/:id/parts",
            get(routes::catalog::list_parts),
        )
        .route(
            "/api/catalog/courses/:id/slots",
            get(routes::catalog::list_slots),
        )
        .route(
            "/api/catalog/courses/:id/topics",
            get(routes::catalog::list_course_topics),
        )
        .route(
            "/api/catalog/subjects/:id/units",
            get(routes::catalog::list_units),
        )
        .route(
            "/api/catalog/units/:id/chapters",
            get(routes::catalog::list_chapters),
        )
        .route(
            "/api/catalog/chapters/:id/topics",
            get(routes::catalog::list_topics),
        );

    let generation_api = Router::new()
        .route(
            "/api/generation/distribution",
            post(routes::generation::preview_distribution),
        )
        .route(
            "/api/generation/question",
            post(routes::generation::generate_question),
        )
        .route(
            "/api/generation/questions",
            post(routes::generation::save_questions),
        )
        .route(
            "/api/generation/auto",
            post(routes::generation::start_auto_generation),
        )
        .route(
            "/api/generation/auto/pause",
            post(routes::generation::pause_generation),
        )
        .route(
            "/api/generation/status",
            get(routes::generation::generation_status),
        )
        .route(
            "/api/generation/pyq",
            post(routes::generation::start_pyq_solutions),
        );

    let app = base_routes
        .merge(catalog_api)
        .merge(generation_api)
        .with_state(app_state)
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http());

    let addr: SocketAddr = config.server_address.parse()?;
    info!("Server listening on {}", addr);
    let listener = TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
