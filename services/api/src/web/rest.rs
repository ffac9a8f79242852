//! services/api/src/web/rest.rs
//!
//! Builds the REST router and holds the master definition for the OpenAPI
//! specification.

use crate::web::middleware::require_user;
use crate::web::protocol::{
    CreateQuestRequest, CreateReflectionRequest, ExperienceResponse, LevelProgressResponse,
    NextTierResponse, ProfileResponse, ProgressionEventPayload, ProgressionResponse,
    QuestResponse, ReflectionResponse, SkillResponse, StatsResponse, StreakResponse, TierResponse,
    UpdateProfileRequest, UpdateReflectionRequest,
};
use crate::web::state::AppState;
use crate::web::{profile, quests, reflections, stats};
use axum::{
    http::StatusCode,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use quest_core::ports::PortError;
use std::sync::Arc;
use tracing::error;
use utoipa::OpenApi;

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        health_handler,
        quests::list_quests_handler,
        quests::create_quest_handler,
        quests::complete_quest_handler,
        quests::uncomplete_quest_handler,
        quests::toggle_quest_handler,
        stats::stats_handler,
        reflections::list_reflections_handler,
        reflections::create_reflection_handler,
        reflections::update_reflection_handler,
        profile::get_profile_handler,
        profile::update_profile_handler,
    ),
    components(
        schemas(
            CreateQuestRequest,
            CreateReflectionRequest,
            UpdateReflectionRequest,
            QuestResponse,
            ExperienceResponse,
            StreakResponse,
            SkillResponse,
            ProgressionEventPayload,
            ProgressionResponse,
            LevelProgressResponse,
            TierResponse,
            NextTierResponse,
            StatsResponse,
            ReflectionResponse,
            UpdateProfileRequest,
            ProfileResponse,
        )
    ),
    tags(
        (name = "Quest Progression API", description = "Quests, experience, streaks, skills, reflections and profiles.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Error Mapping
//=========================================================================================

/// Maps a port failure onto the status code and body returned to the client.
pub(crate) fn port_error(e: PortError) -> (StatusCode, String) {
    match e {
        PortError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
        PortError::Conflict(msg) => (StatusCode::CONFLICT, msg),
        PortError::InvalidInput(msg) => (StatusCode::BAD_REQUEST, msg),
        PortError::Unexpected(msg) => {
            error!("Request failed: {}", msg);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                "Internal server error".to_string(),
            )
        }
    }
}

//=========================================================================================
// Router
//=========================================================================================

#[utoipa::path(
    get,
    path = "/health",
    responses((status = 200, description = "Server is up", body = String))
)]
pub async fn health_handler() -> &'static str {
    "ok"
}

/// All API routes. Every route except `/health` requires the `x-user-id` header.
pub fn router(state: Arc<AppState>) -> Router {
    let protected_routes = Router::new()
        .route(
            "/quests",
            get(quests::list_quests_handler).post(quests::create_quest_handler),
        )
        .route("/quests/{quest_id}/complete", post(quests::complete_quest_handler))
        .route("/quests/{quest_id}/uncomplete", post(quests::uncomplete_quest_handler))
        .route("/quests/{quest_id}/toggle", post(quests::toggle_quest_handler))
        .route("/stats", get(stats::stats_handler))
        .route(
            "/reflections",
            get(reflections::list_reflections_handler).post(reflections::create_reflection_handler),
        )
        .route(
            "/reflections/{reflection_id}",
            put(reflections::update_reflection_handler),
        )
        .route(
            "/profile",
            get(profile::get_profile_handler).put(profile::update_profile_handler),
        )
        .layer(axum_middleware::from_fn(require_user));

    Router::new()
        .route("/health", get(health_handler))
        .merge(protected_routes)
        .with_state(state)
}
