//! services/api/src/web/middleware.rs
//!
//! Authentication middleware for protecting routes.

use axum::{
    extract::{Request, State},
    http::{header, HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use std::sync::Arc;
use tracing::error;

use crate::web::state::AppState;
use bloodlink_core::domain::{Role, User};

/// The authenticated account, inserted into request extensions by the
/// middleware below.
#[derive(Clone)]
pub struct CurrentUser(pub User);

/// Extracts the session id from the `Cookie` header, if any.
pub(crate) fn session_id_from_headers(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|cookies| {
            cookies
                .split(';')
                .find_map(|c| c.trim().strip_prefix("session="))
        })
}

/// Middleware that validates the auth session cookie and loads the account.
///
/// If valid, inserts a [`CurrentUser`] into request extensions for handlers
/// to use. If invalid or missing, returns 401 Unauthorized.
pub async fn require_auth(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = authenticate(&state, req.headers()).await?;
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Middleware for admin-only routes: authenticates like [`require_auth`],
/// then checks the account's role. Non-admins get 403 Forbidden.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    mut req: Request,
    next: Next,
) -> Result<Response, StatusCode> {
    let user = authenticate(&state, req.headers()).await?;
    if user.role != Role::Admin {
        return Err(StatusCode::FORBIDDEN);
    }
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

async fn authenticate(state: &AppState, headers: &HeaderMap) -> Result<User, StatusCode> {
    // 1. Extract the session id from the cookie header
    let session_id = session_id_from_headers(headers).ok_or(StatusCode::UNAUTHORIZED)?;

    // 2. Validate the auth session in the database, get the user id
    let user_id = state
        .db
        .validate_auth_session(session_id)
        .await
        .map_err(|e| {
            error!("Failed to validate auth session: {:?}", e);
            StatusCode::UNAUTHORIZED
        })?;

    // 3. Load the account so handlers can check user type and role
    state.db.get_user_by_id(user_id).await.map_err(|e| {
        error!("Failed to load authenticated user: {:?}", e);
        StatusCode::UNAUTHORIZED
    })
}
