//! services/api/src/web/profile.rs
//!
//! The caller's character profile and self-reflection answers.

use crate::web::middleware::CurrentUser;
use crate::web::protocol::{ProfileResponse, UpdateProfileRequest};
use crate::web::rest::port_error;
use crate::web::state::AppState;
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
};
use quest_core::domain::{CharacterClass, ProfileFields};
use std::sync::Arc;
use tracing::debug;

#[utoipa::path(
    get,
    path = "/profile",
    responses(
        (status = 200, description = "The caller's profile, or the defaults if none was saved", body = ProfileResponse),
        (status = 401, description = "Missing or invalid x-user-id header"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn get_profile_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let profile = app_state
        .profiles
        .get_profile(user_id)
        .await
        .map_err(port_error)?;
    Ok(Json(
        profile
            .as_ref()
            .map_or_else(ProfileResponse::unsaved, ProfileResponse::from),
    ))
}

/// Create or replace the caller's profile.
#[utoipa::path(
    put,
    path = "/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Profile saved", body = ProfileResponse),
        (status = 400, description = "Unknown character class or empty avatar"),
        (status = 401, description = "Missing or invalid x-user-id header"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn update_profile_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<ProfileResponse>, (StatusCode, String)> {
    let character_class = req
        .character_class
        .trim()
        .parse::<CharacterClass>()
        .map_err(|e| (StatusCode::BAD_REQUEST, e.to_string()))?;
    let avatar_emoji = req.avatar_emoji.trim();
    if avatar_emoji.is_empty() {
        return Err((StatusCode::BAD_REQUEST, "avatar_emoji must not be empty".to_string()));
    }

    let fields = ProfileFields {
        username: req.username.trim().to_string(),
        character_class,
        avatar_emoji: avatar_emoji.to_string(),
        mission_statement: req.mission_statement,
        biggest_dream: req.biggest_dream,
        daily_routine: req.daily_routine,
        greatest_strength: req.greatest_strength,
        biggest_weakness: req.biggest_weakness,
        ideal_day: req.ideal_day,
        biggest_challenge: req.biggest_challenge,
        motivation_source: req.motivation_source,
    };
    let profile = app_state
        .profiles
        .save_profile(user_id, fields)
        .await
        .map_err(port_error)?;
    debug!(%user_id, class = %profile.fields.character_class, "profile saved");
    Ok(Json(ProfileResponse::from(&profile)))
}
