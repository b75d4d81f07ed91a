//! services/api/src/web/auth.rs
//!
//! Authentication endpoints for account registration, login, and logout.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::{Duration, Utc};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;
use uuid::Uuid;
use utoipa::ToSchema;

use crate::web::middleware::session_id_from_headers;
use crate::web::state::AppState;
use crate::web::users::UserResponse;
use crate::web::port_error;
use bloodlink_core::domain::{BloodType, UserType};
use bloodlink_core::ports::NewUser;

//=========================================================================================
// Request Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct RegisterRequest {
    pub name: String,
    pub email: String,
    pub password: String,
    pub phone: String,
    #[schema(value_type = String, example = "donor")]
    pub user_type: UserType,
    /// Required for donors, ignored for other account types.
    #[schema(value_type = Option<String>, example = "O+")]
    pub blood_type: Option<BloodType>,
    pub location: String,
}

#[derive(Deserialize, ToSchema)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/auth/register - Create a new account
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterRequest,
    responses(
        (status = 201, description = "Account created", body = UserResponse),
        (status = 400, description = "Invalid request or email already registered"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn register_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RegisterRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Validate the request
    if req.name.trim().is_empty()
        || req.email.trim().is_empty()
        || req.phone.trim().is_empty()
        || req.location.trim().is_empty()
    {
        return Err((StatusCode::BAD_REQUEST, "Missing required fields".to_string()));
    }
    if req.password.len() < 6 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Password must be at least 6 characters".to_string(),
        ));
    }

    // 2. Hash the password
    let salt = SaltString::generate(&mut OsRng);
    let argon2 = Argon2::default();
    let password_hash = argon2
        .hash_password(req.password.as_bytes(), &salt)
        .map_err(|e| {
            error!("Failed to hash password: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to hash password".to_string())
        })?
        .to_string();

    // 3. Create the account. Blood type is a donor attribute only.
    let blood_type = if req.user_type == UserType::Donor {
        req.blood_type
    } else {
        None
    };
    let user = state
        .db
        .create_user(NewUser {
            name: req.name.trim().to_string(),
            email: req.email.trim().to_lowercase(),
            hashed_password: password_hash,
            phone: req.phone.trim().to_string(),
            user_type: req.user_type,
            blood_type,
            location: req.location.trim().to_string(),
        })
        .await
        .map_err(|e| port_error("Failed to create user", e))?;

    // 4. Generate auth session ID
    let auth_session_id = Uuid::new_v4().to_string();

    // 5. Set expiration
    let ttl = Duration::days(state.config.session_ttl_days);
    let expires_at = Utc::now() + ttl;

    // 6. Create auth session in database
    state
        .db
        .create_auth_session(&auth_session_id, user.id, expires_at)
        .await
        .map_err(|e| port_error("Failed to create auth session", e))?;

    // 7. Create session cookie
    let cookie = format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        auth_session_id,
        ttl.num_seconds()
    );

    // 8. Return response with cookie
    let response: UserResponse = user.into();
    Ok((
        StatusCode::CREATED,
        [(header::SET_COOKIE, cookie)],
        Json(response),
    ))
}

/// POST /api/auth/login - Login with existing account
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Login successful", body = UserResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 500, description = "Internal server error")
    )
)]
pub async fn login_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LoginRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Get user by email
    let user_creds = state
        .db
        .get_user_by_email(&req.email.trim().to_lowercase())
        .await
        .map_err(|e| {
            error!("Failed to get user: {:?}", e);
            (StatusCode::UNAUTHORIZED, "Invalid email or password".to_string())
        })?;

    // 2. Verify password
    let parsed_hash = PasswordHash::new(&user_creds.hashed_password).map_err(|e| {
        error!("Failed to parse password hash: {:?}", e);
        (StatusCode::INTERNAL_SERVER_ERROR, "Authentication error".to_string())
    })?;

    let valid = Argon2::default()
        .verify_password(req.password.as_bytes(), &parsed_hash)
        .is_ok();

    if !valid {
        return Err((StatusCode::UNAUTHORIZED, "Invalid email or password".to_string()));
    }

    // 3. Generate auth session ID
    let auth_session_id = Uuid::new_v4().to_string();

    // 4. Set expiration
    let ttl = Duration::days(state.config.session_ttl_days);
    let expires_at = Utc::now() + ttl;

    // 5. Create auth session in database
    state
        .db
        .create_auth_session(&auth_session_id, user_creds.user_id, expires_at)
        .await
        .map_err(|e| port_error("Failed to create auth session", e))?;

    // 6. Create session cookie
    let cookie = format!(
        "session={}; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age={}",
        auth_session_id,
        ttl.num_seconds()
    );

    // 7. Load the full profile for the response
    let user = state
        .db
        .get_user_by_id(user_creds.user_id)
        .await
        .map_err(|e| port_error("Failed to load user", e))?;
    let response: UserResponse = user.into();

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie)], Json(response)))
}

/// POST /api/auth/logout - Logout and invalidate session
#[utoipa::path(
    post,
    path = "/api/auth/logout",
    responses(
        (status = 200, description = "Logout successful"),
        (status = 401, description = "No active session")
    )
)]
pub async fn logout_handler(
    State(state): State<Arc<AppState>>,
    headers: axum::http::HeaderMap,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    // 1. Extract session ID from the cookie header
    let auth_session_id = session_id_from_headers(&headers)
        .ok_or((StatusCode::UNAUTHORIZED, "No session found".to_string()))?
        .to_string();

    // 2. Delete auth session from database
    state
        .db
        .delete_auth_session(&auth_session_id)
        .await
        .map_err(|e| {
            error!("Failed to delete auth session: {:?}", e);
            (StatusCode::INTERNAL_SERVER_ERROR, "Failed to logout".to_string())
        })?;

    // 3. Clear cookie
    let cookie = "session=; HttpOnly; Secure; SameSite=Lax; Path=/; Max-Age=0";

    Ok((StatusCode::OK, [(header::SET_COOKIE, cookie.to_string())]))
}
