//! services/api/src/web/users.rs
//!
//! Profile endpoints, the donor directory, and admin user management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::web::middleware::CurrentUser;
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;
use crate::web::port_error;
use bloodlink_core::domain::{BloodType, Role, User, UserType};
use bloodlink_core::eligibility::{is_eligible, next_eligible_date};
use bloodlink_core::ports::{DonorFilter, ProfileUpdate};

//=========================================================================================
// Request/Response Types
//=========================================================================================

/// The public view of an account. Never carries the password hash.
#[derive(Serialize, ToSchema)]
pub struct UserResponse {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub user_type: String,
    pub blood_type: Option<String>,
    pub location: String,
    pub last_donation: Option<DateTime<Utc>>,
    pub role: String,
    pub is_verified: bool,
    pub donation_count: i32,
    pub created_at: DateTime<Utc>,
}

impl From<User> for UserResponse {
    fn from(user: User) -> Self {
        Self {
            id: user.id,
            name: user.name,
            email: user.email,
            phone: user.phone,
            user_type: user.user_type.code().to_string(),
            blood_type: user.blood_type.map(|b| b.code().to_string()),
            location: user.location,
            last_donation: user.last_donation,
            role: user.role.code().to_string(),
            is_verified: user.is_verified,
            donation_count: user.donation_count,
            created_at: user.created_at,
        }
    }
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateProfileRequest {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    /// Only applied to donor accounts.
    #[schema(value_type = Option<String>, example = "O-")]
    pub blood_type: Option<BloodType>,
}

#[derive(Deserialize, IntoParams)]
pub struct DonorsQuery {
    #[param(value_type = Option<String>, example = "A+")]
    pub blood_type: Option<BloodType>,
    /// Case-insensitive substring match.
    pub location: Option<String>,
    pub verified: Option<bool>,
}

#[derive(Serialize, ToSchema)]
pub struct EligibilityResponse {
    pub is_eligible: bool,
    /// Absent when the donor has never donated (eligible right away).
    pub next_eligible_date: Option<DateTime<Utc>>,
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/users/me - The current account's profile
#[utoipa::path(
    get,
    path = "/api/users/me",
    responses(
        (status = 200, description = "The current user", body = UserResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn me_handler(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Json<UserResponse> {
    Json(user.into())
}

/// GET /api/users/me/eligibility - Whether the donor may donate right now
#[utoipa::path(
    get,
    path = "/api/users/me/eligibility",
    responses(
        (status = 200, description = "Eligibility and next eligible date", body = EligibilityResponse),
        (status = 403, description = "Not a donor account")
    )
)]
pub async fn eligibility_handler(
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<EligibilityResponse>, (StatusCode, String)> {
    if user.user_type != UserType::Donor {
        return Err((
            StatusCode::FORBIDDEN,
            "Only donors have donation eligibility".to_string(),
        ));
    }

    let eligible = is_eligible(user.last_donation, Utc::now()).map_err(|e| {
        error!("Eligibility check failed for user {}: {e}", user.id);
        (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
    })?;

    Ok(Json(EligibilityResponse {
        is_eligible: eligible,
        next_eligible_date: user.last_donation.map(next_eligible_date),
    }))
}

/// PUT /api/users/profile - Update profile fields
#[utoipa::path(
    put,
    path = "/api/users/profile",
    request_body = UpdateProfileRequest,
    responses(
        (status = 200, description = "Updated profile", body = UserResponse),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn update_profile_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<UpdateProfileRequest>,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    // Blood type is a donor attribute; silently ignore it for other accounts.
    let blood_type = if user.user_type == UserType::Donor {
        req.blood_type
    } else {
        None
    };

    let updated = state
        .db
        .update_profile(
            user.id,
            ProfileUpdate {
                name: req.name,
                phone: req.phone,
                location: req.location,
                blood_type,
            },
        )
        .await
        .map_err(|e| port_error("Failed to update profile", e))?;

    Ok(Json(updated.into()))
}

/// GET /api/users/donors - Eligible donors, optionally filtered
#[utoipa::path(
    get,
    path = "/api/users/donors",
    params(DonorsQuery),
    responses(
        (status = 200, description = "Eligible donors, verified first", body = [UserResponse]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_donors_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<DonorsQuery>,
) -> Result<Json<Vec<UserResponse>>, (StatusCode, String)> {
    let donors = state
        .db
        .list_donors(DonorFilter {
            blood_type: query.blood_type,
            location: query.location,
            verified_only: query.verified.unwrap_or(false),
        })
        .await
        .map_err(|e| port_error("Failed to list donors", e))?;

    // Eligibility is computed, never stored. A corrupt future timestamp
    // reads as ineligible.
    let now = Utc::now();
    let eligible: Vec<UserResponse> = donors
        .into_iter()
        .filter(|donor| is_eligible(donor.last_donation, now).unwrap_or(false))
        .map(UserResponse::from)
        .collect();

    Ok(Json(eligible))
}

/// GET /api/users/admin/all - Every account (admin only)
#[utoipa::path(
    get,
    path = "/api/users/admin/all",
    responses(
        (status = 200, description = "All users", body = [UserResponse]),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn admin_list_users_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<UserResponse>>, (StatusCode, String)> {
    let users = state
        .db
        .list_users()
        .await
        .map_err(|e| port_error("Failed to list users", e))?;
    Ok(Json(users.into_iter().map(UserResponse::from).collect()))
}

/// PUT /api/users/admin/verify/{id} - Manually verify a donor (admin only)
#[utoipa::path(
    put,
    path = "/api/users/admin/verify/{id}",
    params(("id" = Uuid, Path, description = "The donor's user id")),
    responses(
        (status = 200, description = "Verified donor", body = UserResponse),
        (status = 400, description = "Not a donor account"),
        (status = 404, description = "User not found")
    )
)]
pub async fn admin_verify_donor_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<Json<UserResponse>, (StatusCode, String)> {
    let user = state
        .db
        .get_user_by_id(user_id)
        .await
        .map_err(|e| port_error("Failed to load user", e))?;

    if user.user_type != UserType::Donor {
        return Err((
            StatusCode::BAD_REQUEST,
            "Only donors can be verified".to_string(),
        ));
    }

    let verified = state
        .db
        .set_donor_verified(user_id)
        .await
        .map_err(|e| port_error("Failed to verify donor", e))?;

    Ok(Json(verified.into()))
}

/// DELETE /api/users/admin/{id} - Delete a non-admin account (admin only)
#[utoipa::path(
    delete,
    path = "/api/users/admin/{id}",
    params(("id" = Uuid, Path, description = "The user id")),
    responses(
        (status = 200, description = "User deleted", body = MessageResponse),
        (status = 403, description = "Cannot delete admin users"),
        (status = 404, description = "User not found")
    )
)]
pub async fn admin_delete_user_handler(
    State(state): State<Arc<AppState>>,
    Path(user_id): Path<Uuid>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let user = state
        .db
        .get_user_by_id(user_id)
        .await
        .map_err(|e| port_error("Failed to load user", e))?;

    // Don't allow admins to delete themselves or other admins.
    if user.role == Role::Admin {
        return Err((
            StatusCode::FORBIDDEN,
            "Cannot delete admin users".to_string(),
        ));
    }

    // Related appointments, requests, and sign-ups go with the account
    // through the schema's cascades.
    state
        .db
        .delete_user(user_id)
        .await
        .map_err(|e| port_error("Failed to delete user", e))?;

    Ok(Json(MessageResponse {
        message: "User deleted successfully".to_string(),
    }))
}
