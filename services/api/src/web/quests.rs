//! services/api/src/web/quests.rs
//!
//! Axum handlers for creating, listing and progressing quests.

use crate::web::middleware::CurrentUser;
use crate::web::protocol::{CreateQuestRequest, ProgressionResponse, QuestResponse};
use crate::web::rest::port_error;
use crate::web::state::AppState;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use quest_core::domain::SkillCategory;
use std::sync::Arc;
use uuid::Uuid;

/// List the caller's quests, newest first.
#[utoipa::path(
    get,
    path = "/quests",
    responses(
        (status = 200, description = "The caller's quests", body = [QuestResponse]),
        (status = 401, description = "Missing or invalid x-user-id header"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_quests_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<QuestResponse>>, (StatusCode, String)> {
    let quests = app_state
        .progression
        .list_quests(user_id)
        .await
        .map_err(port_error)?;
    Ok(Json(quests.iter().map(QuestResponse::from).collect()))
}

/// Create a new pending quest.
#[utoipa::path(
    post,
    path = "/quests",
    request_body = CreateQuestRequest,
    responses(
        (status = 201, description = "Quest created successfully", body = QuestResponse),
        (status = 400, description = "Unknown category, empty title or zero reward"),
        (status = 401, description = "Missing or invalid x-user-id header"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn create_quest_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<CreateQuestRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let category = req
        .category
        .parse::<SkillCategory>()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;

    let quest = app_state
        .progression
        .create_quest(user_id, &req.title, category, req.xp_reward)
        .await
        .map_err(port_error)?;

    Ok((StatusCode::CREATED, Json(QuestResponse::from(&quest))))
}

/// Complete a pending quest. Completing a completed quest is a no-op.
#[utoipa::path(
    post,
    path = "/quests/{quest_id}/complete",
    responses(
        (status = 200, description = "Updated progression records", body = ProgressionResponse),
        (status = 401, description = "Missing or invalid x-user-id header"),
        (status = 404, description = "Quest not found"),
        (status = 409, description = "Records changed concurrently, retry"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user."),
        ("quest_id" = Uuid, Path, description = "The quest to complete.")
    )
)]
pub async fn complete_quest_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(quest_id): Path<Uuid>,
) -> Result<Json<ProgressionResponse>, (StatusCode, String)> {
    let outcome = app_state
        .progression
        .complete_quest(user_id, quest_id)
        .await
        .map_err(port_error)?;
    Ok(Json(ProgressionResponse::from(&outcome)))
}

/// Return a completed quest to pending and take back its XP.
#[utoipa::path(
    post,
    path = "/quests/{quest_id}/uncomplete",
    responses(
        (status = 200, description = "Updated progression records", body = ProgressionResponse),
        (status = 401, description = "Missing or invalid x-user-id header"),
        (status = 404, description = "Quest not found"),
        (status = 409, description = "Records changed concurrently, retry"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user."),
        ("quest_id" = Uuid, Path, description = "The quest to un-complete.")
    )
)]
pub async fn uncomplete_quest_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(quest_id): Path<Uuid>,
) -> Result<Json<ProgressionResponse>, (StatusCode, String)> {
    let outcome = app_state
        .progression
        .uncomplete_quest(user_id, quest_id)
        .await
        .map_err(port_error)?;
    Ok(Json(ProgressionResponse::from(&outcome)))
}

/// Flip a quest between pending and completed.
#[utoipa::path(
    post,
    path = "/quests/{quest_id}/toggle",
    responses(
        (status = 200, description = "Updated progression records", body = ProgressionResponse),
        (status = 401, description = "Missing or invalid x-user-id header"),
        (status = 404, description = "Quest not found"),
        (status = 409, description = "Records changed concurrently, retry"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user."),
        ("quest_id" = Uuid, Path, description = "The quest to toggle.")
    )
)]
pub async fn toggle_quest_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(quest_id): Path<Uuid>,
) -> Result<Json<ProgressionResponse>, (StatusCode, String)> {
    let outcome = app_state
        .progression
        .toggle_quest(user_id, quest_id)
        .await
        .map_err(port_error)?;
    Ok(Json(ProgressionResponse::from(&outcome)))
}
