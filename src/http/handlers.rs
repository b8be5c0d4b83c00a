use axum::{
    body::Body,
    extract::{Query, State},
    http::{HeaderMap, StatusCode},
    response::{IntoResponse, Json, Response},
};
use std::sync::Arc;
use tracing::{error, info, warn};

use crate::core::types::{
    ErrorResponse, GameConfig, GameQuery, GameSlug, SearchQuery, SearchResponse, TargetQuery,
};
use crate::features::launch::{exhausted_message, LaunchPlan};
use crate::features::search;
use crate::relay::{headers::cors_headers, ForwardedHeaders, FunctionEnvelope, RelayResponse};
use crate::resolver::{RelayFailure, ResolutionOutcome};
use crate::AppState;

type ApiError = (StatusCode, Json<serde_json::Value>);

impl IntoResponse for RelayResponse {
    fn into_response(self) -> Response {
        let mut response = Response::new(Body::from(self.body.into_bytes()));
        *response.status_mut() = self.status;
        *response.headers_mut() = self.headers;
        response
    }
}

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "healthy",
        "service": "sanegames",
        "version": env!("CARGO_PKG_VERSION"),
        "time": chrono::Utc::now().to_rfc3339(),
    }))
}

pub async fn proxy_game(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TargetQuery>,
) -> RelayResponse {
    let forwarded = ForwardedHeaders::from_headers(&headers);
    // A closed semaphore only happens during shutdown; relay anyway.
    let _permit = state.outbound_limit.acquire().await.ok();
    state.relay.handle(query.target.as_deref(), &forwarded).await
}

pub async fn proxy_game_envelope(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<TargetQuery>,
) -> Json<FunctionEnvelope> {
    let forwarded = ForwardedHeaders::from_headers(&headers);
    let _permit = state.outbound_limit.acquire().await.ok();
    Json(
        state
            .relay
            .handle(query.target.as_deref(), &forwarded)
            .await
            .into_envelope(),
    )
}

pub async fn proxy_preflight() -> impl IntoResponse {
    (StatusCode::NO_CONTENT, cors_headers())
}

pub async fn game_config(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GameQuery>,
) -> Result<Json<GameConfig>, ApiError> {
    let slug = parse_slug(&query)?;
    resolve(&state, &slug).await.map(Json)
}

pub async fn launch_plan(
    State(state): State<Arc<AppState>>,
    Query(query): Query<GameQuery>,
) -> Result<Json<LaunchPlan>, ApiError> {
    let slug = parse_slug(&query)?;
    let config = resolve(&state, &slug).await?;

    match LaunchPlan::from_config(&slug, &config, &state.relay_public_url) {
        Ok(plan) => {
            info!("Launch plan ready for '{}': {}", slug, plan.game_url);
            Ok(Json(plan))
        }
        Err(e) => {
            warn!("Config for '{}' is not launchable: {}", slug, e);
            Err(error_json(StatusCode::UNPROCESSABLE_ENTITY, e.to_string()))
        }
    }
}

pub async fn search_games(
    State(state): State<Arc<AppState>>,
    Query(query): Query<SearchQuery>,
) -> Result<Json<SearchResponse>, (StatusCode, Json<ErrorResponse>)> {
    let q = query.q.unwrap_or_default();
    match search::search_games_cached(&state, &q).await {
        Ok(results) => Ok(Json(SearchResponse { results })),
        Err(e) => {
            error!("Search error: {}", e);
            Err((
                StatusCode::BAD_GATEWAY,
                Json(ErrorResponse {
                    error: e.to_string(),
                }),
            ))
        }
    }
}

fn parse_slug(query: &GameQuery) -> Result<GameSlug, ApiError> {
    GameSlug::parse(query.game.as_deref().unwrap_or_default())
        .map_err(|_| error_json(StatusCode::BAD_REQUEST, "Missing required parameter: game"))
}

async fn resolve(state: &AppState, slug: &GameSlug) -> Result<GameConfig, ApiError> {
    match state.resolver.resolve(slug).await {
        ResolutionOutcome::Success(config) => Ok(config),
        ResolutionOutcome::Exhausted(failures) => Err(exhausted_error(&failures)),
    }
}

fn exhausted_error(failures: &[RelayFailure]) -> ApiError {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(serde_json::json!({
            "error": exhausted_message(),
            "failures": failures,
        })),
    )
}

fn error_json(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(serde_json::json!({ "error": message.into() })),
    )
}
