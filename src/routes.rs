// src/routes.rs

use axum::{
    Router,
    http::{HeaderValue, Method, header},
    middleware,
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    handlers::{attempt, health, quiz},
    state::AppState,
    utils::jwt::auth_middleware,
};

/// Assembles the main application router.
///
/// * Quiz routes: take-quiz view, starting attempts, instructor results.
/// * Attempt routes: history, detail, answering and closing.
/// * Everything except the health check sits behind the JWT middleware.
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin([
            HeaderValue::from_static("http://localhost:3000"),
            HeaderValue::from_static("http://127.0.0.1:3000"),
        ])
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE]);

    let quiz_routes = Router::new()
        .route("/{quiz_id}", get(quiz::get_quiz))
        .route("/{quiz_id}/attempts", post(quiz::start_attempt))
        .route("/{quiz_id}/results", get(quiz::get_results));

    let attempt_routes = Router::new()
        .route("/", get(attempt::list_attempts))
        .route("/{attempt_id}", get(attempt::get_attempt))
        .route("/{attempt_id}/responses", post(attempt::submit_responses))
        .route("/{attempt_id}/close", post(attempt::close_attempt))
        .route("/{attempt_id}/submit", post(attempt::submit_and_close));

    let protected = Router::new()
        .nest("/api/quizzes", quiz_routes)
        .nest("/api/attempts", attempt_routes)
        .layer(middleware::from_fn_with_state(state.clone(), auth_middleware));

    Router::new()
        .route("/api/health", get(health::health))
        .merge(protected)
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
