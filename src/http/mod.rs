pub mod handlers;

use axum::{routing::get, Router};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::AppState;

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(handlers::health_check))
        .route("/health", get(handlers::health_check))
        .route(
            "/proxy-game",
            get(handlers::proxy_game).options(handlers::proxy_preflight),
        )
        // Legacy serverless function path; existing pages still link to it.
        .route(
            "/.netlify/functions/proxy-game",
            get(handlers::proxy_game).options(handlers::proxy_preflight),
        )
        .route("/proxy-game/envelope", get(handlers::proxy_game_envelope))
        .route("/config", get(handlers::game_config))
        .route("/launch", get(handlers::launch_plan))
        .route("/search", get(handlers::search_games))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
