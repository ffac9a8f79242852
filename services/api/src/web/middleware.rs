//! services/api/src/web/middleware.rs
//!
//! Caller identification middleware for protecting routes.

use axum::{extract::Request, http::StatusCode, middleware::Next, response::Response};
use tracing::debug;
use uuid::Uuid;

/// Header carrying the id of the calling user.
pub const USER_ID_HEADER: &str = "x-user-id";

/// The user a request acts for, inserted into request extensions by `require_user`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurrentUser(pub Uuid);

/// Middleware that reads the `x-user-id` header and extracts the user_id.
///
/// If valid, inserts a `CurrentUser` into request extensions for handlers to use.
/// If invalid or missing, returns 401 Unauthorized.
pub async fn require_user(mut req: Request, next: Next) -> Result<Response, StatusCode> {
    let raw = req
        .headers()
        .get(USER_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or(StatusCode::UNAUTHORIZED)?;

    let user_id = Uuid::parse_str(raw.trim()).map_err(|e| {
        debug!("Rejecting malformed {} header: {}", USER_ID_HEADER, e);
        StatusCode::UNAUTHORIZED
    })?;

    req.extensions_mut().insert(CurrentUser(user_id));
    Ok(next.run(req).await)
}
