//! services/api/src/web/stats.rs

use crate::web::middleware::CurrentUser;
use crate::web::protocol::StatsResponse;
use crate::web::rest::port_error;
use crate::web::state::AppState;
use axum::{
    extract::{Extension, State},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;

/// The caller's experience, level, streak and skill progress.
///
/// Users without any records get zero values.
#[utoipa::path(
    get,
    path = "/stats",
    responses(
        (status = 200, description = "Progression summary", body = StatsResponse),
        (status = 401, description = "Missing or invalid x-user-id header"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn stats_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<StatsResponse>, (StatusCode, String)> {
    let stats = app_state
        .progression
        .stats(user_id)
        .await
        .map_err(port_error)?;
    Ok(Json(StatsResponse::from(&stats)))
}
