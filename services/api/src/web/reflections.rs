//! services/api/src/web/reflections.rs
//!
//! Journal entries. Plain CRUD, independent of quest progression.

use crate::web::middleware::CurrentUser;
use crate::web::protocol::{CreateReflectionRequest, ReflectionResponse, UpdateReflectionRequest};
use crate::web::rest::port_error;
use crate::web::state::AppState;
use axum::{
    extract::{Extension, Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use std::sync::Arc;
use uuid::Uuid;

#[utoipa::path(
    get,
    path = "/reflections",
    responses(
        (status = 200, description = "The caller's reflections, newest first", body = [ReflectionResponse]),
        (status = 401, description = "Missing or invalid x-user-id header"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn list_reflections_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Result<Json<Vec<ReflectionResponse>>, (StatusCode, String)> {
    let reflections = app_state
        .reflections
        .list_reflections(user_id)
        .await
        .map_err(port_error)?;
    Ok(Json(reflections.iter().map(ReflectionResponse::from).collect()))
}

#[utoipa::path(
    post,
    path = "/reflections",
    request_body = CreateReflectionRequest,
    responses(
        (status = 201, description = "Reflection created", body = ReflectionResponse),
        (status = 400, description = "Empty question"),
        (status = 401, description = "Missing or invalid x-user-id header"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user.")
    )
)]
pub async fn create_reflection_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<CreateReflectionRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.question.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "question must not be empty".to_string()));
    }

    let reflection = app_state
        .reflections
        .create_reflection(user_id, req.question.trim(), &req.answer)
        .await
        .map_err(port_error)?;
    Ok((StatusCode::CREATED, Json(ReflectionResponse::from(&reflection))))
}

#[utoipa::path(
    put,
    path = "/reflections/{reflection_id}",
    request_body = UpdateReflectionRequest,
    responses(
        (status = 200, description = "Reflection updated", body = ReflectionResponse),
        (status = 401, description = "Missing or invalid x-user-id header"),
        (status = 404, description = "Reflection not found"),
        (status = 500, description = "Internal server error")
    ),
    params(
        ("x-user-id" = Uuid, Header, description = "The unique ID of the user."),
        ("reflection_id" = Uuid, Path, description = "The reflection to update.")
    )
)]
pub async fn update_reflection_handler(
    State(app_state): State<Arc<AppState>>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(reflection_id): Path<Uuid>,
    Json(req): Json<UpdateReflectionRequest>,
) -> Result<Json<ReflectionResponse>, (StatusCode, String)> {
    let reflection = app_state
        .reflections
        .update_reflection(user_id, reflection_id, &req.answer)
        .await
        .map_err(port_error)?;
    Ok(Json(ReflectionResponse::from(&reflection)))
}
