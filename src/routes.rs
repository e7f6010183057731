// src/routes.rs

use axum::{Router, http::Method, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{handlers::progress, state::AppState};

/// Assembles the main application router.
///
/// * Mounts the progress API under /api/progress.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (Database Pool).
pub fn create_router(state: AppState) -> Router {
    let origins = [
        "http://localhost:3000".parse().unwrap(),
        "http://127.0.0.1:3000".parse().unwrap(),
    ];

    let cors = CorsLayer::new()
        .allow_origin(origins)
        .allow_methods([Method::GET])
        .allow_headers([
            axum::http::header::AUTHORIZATION,
            axum::http::header::CONTENT_TYPE,
        ]);

    let progress_routes = Router::new()
        .route("/sessions", get(progress::get_sessions))
        .route("/summary", get(progress::get_summary))
        .route("/session/{type}/{id}", get(progress::get_session_by_id))
        .route("/leaderboard", get(progress::get_leaderboard))
        .route("/badges", get(progress::get_badges));

    Router::new()
        .nest("/api/progress", progress_routes)
        // Global Middleware (applied from outside in)
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}
