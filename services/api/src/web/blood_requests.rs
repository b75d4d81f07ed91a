//! services/api/src/web/blood_requests.rs
//!
//! Blood request CRUD and the donor-facing "available requests" listing,
//! which runs every approved request through the compatibility resolver.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Reverse;
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::CurrentUser;
use crate::web::port_error;
use crate::web::state::AppState;
use bloodlink_core::compatibility::filter_compatible_requests;
use bloodlink_core::domain::{BloodRequest, BloodType, RequestStatus, Role, Urgency, UserType};
use bloodlink_core::ports::NewBloodRequest;

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateBloodRequestRequest {
    #[schema(value_type = String, example = "B+")]
    pub blood_type: BloodType,
    pub quantity: i32,
    #[schema(value_type = Option<String>, example = "high")]
    pub urgency: Option<Urgency>,
    pub hospital: String,
    pub location: String,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateBloodRequestRequest {
    #[schema(value_type = String, example = "approved")]
    pub status: RequestStatus,
    pub notes: Option<String>,
}

/// What a matching donor gets to see about the recipient.
#[derive(Serialize, ToSchema)]
pub struct RecipientInfo {
    pub name: String,
    pub location: String,
}

/// The fuller contact view reserved for administrators.
#[derive(Serialize, ToSchema)]
pub struct RecipientContact {
    pub name: String,
    pub email: String,
    pub phone: String,
    pub location: String,
}

#[derive(Serialize, ToSchema)]
pub struct BloodRequestResponse {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub blood_type: String,
    pub quantity: i32,
    pub urgency: String,
    pub hospital: String,
    pub location: String,
    pub status: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient: Option<RecipientInfo>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub recipient_contact: Option<RecipientContact>,
}

impl From<BloodRequest> for BloodRequestResponse {
    fn from(request: BloodRequest) -> Self {
        Self {
            id: request.id,
            recipient_id: request.recipient_id,
            blood_type: request.blood_type.code().to_string(),
            quantity: request.quantity,
            urgency: request.urgency.code().to_string(),
            hospital: request.hospital,
            location: request.location,
            status: request.status.code().to_string(),
            notes: request.notes,
            created_at: request.created_at,
            recipient: None,
            recipient_contact: None,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/blood-requests - Create a blood request (recipients only)
#[utoipa::path(
    post,
    path = "/api/blood-requests",
    request_body = CreateBloodRequestRequest,
    responses(
        (status = 201, description = "Request created", body = BloodRequestResponse),
        (status = 400, description = "Invalid quantity"),
        (status = 403, description = "Only recipients can create blood requests")
    )
)]
pub async fn create_request_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateBloodRequestRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if user.user_type != UserType::Recipient && user.role != Role::Admin {
        return Err((
            StatusCode::FORBIDDEN,
            "Only recipients can create blood requests".to_string(),
        ));
    }
    if req.quantity < 1 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Quantity must be at least 1".to_string(),
        ));
    }

    let request = state
        .db
        .create_blood_request(NewBloodRequest {
            recipient_id: user.id,
            blood_type: req.blood_type,
            quantity: req.quantity,
            urgency: req.urgency.unwrap_or(Urgency::Medium),
            hospital: req.hospital,
            location: req.location,
            notes: req.notes.unwrap_or_default(),
        })
        .await
        .map_err(|e| port_error("Failed to create blood request", e))?;

    Ok((StatusCode::CREATED, Json(BloodRequestResponse::from(request))))
}

/// GET /api/blood-requests - The current user's own requests
#[utoipa::path(
    get,
    path = "/api/blood-requests",
    responses(
        (status = 200, description = "Own requests, newest first", body = [BloodRequestResponse]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn my_requests_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<BloodRequestResponse>>, (StatusCode, String)> {
    let requests = state
        .db
        .blood_requests_for_recipient(user.id)
        .await
        .map_err(|e| port_error("Failed to list blood requests", e))?;

    Ok(Json(
        requests.into_iter().map(BloodRequestResponse::from).collect(),
    ))
}

/// GET /api/blood-requests/available - Approved requests compatible with the
/// donor's blood type, most urgent first (donors only)
#[utoipa::path(
    get,
    path = "/api/blood-requests/available",
    responses(
        (status = 200, description = "Compatible approved requests", body = [BloodRequestResponse]),
        (status = 400, description = "Donor has no blood type on file"),
        (status = 403, description = "Only donors can view available requests")
    )
)]
pub async fn available_requests_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<BloodRequestResponse>>, (StatusCode, String)> {
    if user.user_type != UserType::Donor {
        return Err((
            StatusCode::FORBIDDEN,
            "Only donors can view available requests".to_string(),
        ));
    }
    let Some(donor_type) = user.blood_type else {
        return Err((
            StatusCode::BAD_REQUEST,
            "Add your blood type to your profile to see compatible requests".to_string(),
        ));
    };

    // The port hands back every approved request, newest first; the resolver
    // narrows them to compatible ones and orders by urgency.
    let approved = state
        .db
        .approved_blood_requests()
        .await
        .map_err(|e| port_error("Failed to list approved requests", e))?;
    let compatible = filter_compatible_requests(donor_type, approved);

    let mut responses = Vec::with_capacity(compatible.len());
    for request in compatible {
        let recipient = state
            .db
            .get_user_by_id(request.recipient_id)
            .await
            .ok()
            .map(|u| RecipientInfo {
                name: u.name,
                location: u.location,
            });
        let mut response = BloodRequestResponse::from(request);
        response.recipient = recipient;
        responses.push(response);
    }
    Ok(Json(responses))
}

/// PUT /api/blood-requests/{id} - Update request status (admin only)
#[utoipa::path(
    put,
    path = "/api/blood-requests/{id}",
    params(("id" = Uuid, Path, description = "The blood request id")),
    request_body = UpdateBloodRequestRequest,
    responses(
        (status = 200, description = "Updated request", body = BloodRequestResponse),
        (status = 404, description = "Blood request not found")
    )
)]
pub async fn admin_update_request_handler(
    State(state): State<Arc<AppState>>,
    Path(request_id): Path<Uuid>,
    Json(req): Json<UpdateBloodRequestRequest>,
) -> Result<Json<BloodRequestResponse>, (StatusCode, String)> {
    let updated = state
        .db
        .update_blood_request(request_id, req.status, req.notes)
        .await
        .map_err(|e| port_error("Failed to update blood request", e))?;

    Ok(Json(BloodRequestResponse::from(updated)))
}

/// GET /api/blood-requests/admin/all - Every request (admin only)
#[utoipa::path(
    get,
    path = "/api/blood-requests/admin/all",
    responses(
        (status = 200, description = "All requests, most urgent first", body = [BloodRequestResponse]),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn admin_list_requests_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<BloodRequestResponse>>, (StatusCode, String)> {
    let mut requests = state
        .db
        .list_blood_requests()
        .await
        .map_err(|e| port_error("Failed to list blood requests", e))?;

    // Most urgent first; the stable sort keeps newest-first within a level.
    requests.sort_by_key(|r| Reverse(r.urgency));

    let mut responses = Vec::with_capacity(requests.len());
    for request in requests {
        let recipient_contact = state
            .db
            .get_user_by_id(request.recipient_id)
            .await
            .ok()
            .map(|u| RecipientContact {
                name: u.name,
                email: u.email,
                phone: u.phone,
                location: u.location,
            });
        let mut response = BloodRequestResponse::from(request);
        response.recipient_contact = recipient_contact;
        responses.push(response);
    }
    Ok(Json(responses))
}
