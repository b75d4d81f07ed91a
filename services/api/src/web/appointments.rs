//! services/api/src/web/appointments.rs
//!
//! Appointment booking and lifecycle. Creation is gated by the donation
//! eligibility rules; completing an appointment stamps the donor's record.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::CurrentUser;
use crate::web::port_error;
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;
use bloodlink_core::domain::{Appointment, AppointmentStatus, Role, UserType};
use bloodlink_core::eligibility::{is_eligible, next_eligible_date};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CreateAppointmentRequest {
    pub center_id: Uuid,
    pub date: DateTime<Utc>,
    pub notes: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateAppointmentRequest {
    #[schema(value_type = String, example = "completed")]
    pub status: AppointmentStatus,
    pub notes: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct CenterSummary {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
}

#[derive(Serialize, ToSchema)]
pub struct DonorSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub blood_type: Option<String>,
    pub is_verified: bool,
    pub donation_count: i32,
}

#[derive(Serialize, ToSchema)]
pub struct AppointmentResponse {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub date: DateTime<Utc>,
    pub status: String,
    pub notes: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donation_center: Option<CenterSummary>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor: Option<DonorSummary>,
}

/// Attaches the center summary. A center that cannot be loaded just drops
/// the summary rather than failing the whole listing.
async fn with_center(state: &AppState, appointment: Appointment) -> AppointmentResponse {
    let donation_center = state
        .db
        .get_center(appointment.center_id)
        .await
        .ok()
        .map(|c| CenterSummary {
            id: c.id,
            name: c.name,
            address: c.address,
            city: c.city,
            state: c.state,
        });
    AppointmentResponse {
        id: appointment.id,
        donor_id: appointment.donor_id,
        date: appointment.date,
        status: appointment.status.code().to_string(),
        notes: appointment.notes,
        created_at: appointment.created_at,
        donation_center,
        donor: None,
    }
}

async fn with_center_and_donor(state: &AppState, appointment: Appointment) -> AppointmentResponse {
    let mut response = with_center(state, appointment).await;
    response.donor = state
        .db
        .get_user_by_id(response.donor_id)
        .await
        .ok()
        .map(|u| DonorSummary {
            id: u.id,
            name: u.name,
            email: u.email,
            phone: u.phone,
            blood_type: u.blood_type.map(|b| b.code().to_string()),
            is_verified: u.is_verified,
            donation_count: u.donation_count,
        });
    response
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/appointments - Book a donation slot (donors only)
#[utoipa::path(
    post,
    path = "/api/appointments",
    request_body = CreateAppointmentRequest,
    responses(
        (status = 201, description = "Appointment created", body = AppointmentResponse),
        (status = 400, description = "Donor is not eligible yet"),
        (status = 403, description = "Only donors can create appointments"),
        (status = 404, description = "Donation center not found")
    )
)]
pub async fn create_appointment_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CreateAppointmentRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if user.user_type != UserType::Donor {
        return Err((
            StatusCode::FORBIDDEN,
            "Only donors can create appointments".to_string(),
        ));
    }

    // The eligibility engine is the single authority here.
    let eligible = is_eligible(user.last_donation, Utc::now()).map_err(|e| {
        error!("Eligibility check failed for user {}: {e}", user.id);
        (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
    })?;
    if !eligible {
        let message = match user.last_donation.map(next_eligible_date) {
            Some(next) => format!(
                "You are not eligible to donate at this time. Please wait at least 8 weeks \
                 between donations. You can donate again on {}.",
                next.format("%Y-%m-%d")
            ),
            None => "You are not eligible to donate at this time.".to_string(),
        };
        return Err((StatusCode::BAD_REQUEST, message));
    }

    state
        .db
        .get_center(req.center_id)
        .await
        .map_err(|e| port_error("Failed to load donation center", e))?;

    let appointment = state
        .db
        .create_appointment(user.id, req.center_id, req.date, req.notes.unwrap_or_default())
        .await
        .map_err(|e| port_error("Failed to create appointment", e))?;

    Ok((
        StatusCode::CREATED,
        Json(with_center(&state, appointment).await),
    ))
}

/// GET /api/appointments - The current user's appointments
#[utoipa::path(
    get,
    path = "/api/appointments",
    responses(
        (status = 200, description = "Appointments, newest first", body = [AppointmentResponse]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn list_appointments_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<AppointmentResponse>>, (StatusCode, String)> {
    let appointments = state
        .db
        .appointments_for_donor(user.id)
        .await
        .map_err(|e| port_error("Failed to list appointments", e))?;

    let mut responses = Vec::with_capacity(appointments.len());
    for appointment in appointments {
        responses.push(with_center(&state, appointment).await);
    }
    Ok(Json(responses))
}

/// GET /api/appointments/history - Completed donations (donors only)
#[utoipa::path(
    get,
    path = "/api/appointments/history",
    responses(
        (status = 200, description = "Completed appointments, newest first", body = [AppointmentResponse]),
        (status = 403, description = "Only donors can view donation history")
    )
)]
pub async fn donation_history_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<AppointmentResponse>>, (StatusCode, String)> {
    if user.user_type != UserType::Donor {
        return Err((
            StatusCode::FORBIDDEN,
            "Only donors can view donation history".to_string(),
        ));
    }

    let appointments = state
        .db
        .completed_appointments_for_donor(user.id)
        .await
        .map_err(|e| port_error("Failed to load donation history", e))?;

    let mut responses = Vec::with_capacity(appointments.len());
    for appointment in appointments {
        responses.push(with_center(&state, appointment).await);
    }
    Ok(Json(responses))
}

/// PUT /api/appointments/{id} - Update appointment status (owner or admin)
#[utoipa::path(
    put,
    path = "/api/appointments/{id}",
    params(("id" = Uuid, Path, description = "The appointment id")),
    request_body = UpdateAppointmentRequest,
    responses(
        (status = 200, description = "Updated appointment", body = AppointmentResponse),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Appointment not found")
    )
)]
pub async fn update_appointment_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(appointment_id): Path<Uuid>,
    Json(req): Json<UpdateAppointmentRequest>,
) -> Result<Json<AppointmentResponse>, (StatusCode, String)> {
    let appointment = state
        .db
        .get_appointment(appointment_id)
        .await
        .map_err(|e| port_error("Failed to load appointment", e))?;

    if appointment.donor_id != user.id && user.role != Role::Admin {
        return Err((StatusCode::FORBIDDEN, "Not authorized".to_string()));
    }

    let updated = state
        .db
        .update_appointment(appointment_id, req.status, req.notes)
        .await
        .map_err(|e| port_error("Failed to update appointment", e))?;

    // A completed appointment stamps the donor's record.
    if req.status == AppointmentStatus::Completed {
        state
            .db
            .record_donation(updated.donor_id, Utc::now())
            .await
            .map_err(|e| port_error("Failed to record donation", e))?;
    }

    Ok(Json(with_center(&state, updated).await))
}

/// DELETE /api/appointments/{id} - Cancel a future appointment (owner only)
#[utoipa::path(
    delete,
    path = "/api/appointments/{id}",
    params(("id" = Uuid, Path, description = "The appointment id")),
    responses(
        (status = 200, description = "Appointment cancelled", body = MessageResponse),
        (status = 400, description = "Cannot cancel past appointments"),
        (status = 403, description = "Not authorized"),
        (status = 404, description = "Appointment not found")
    )
)]
pub async fn cancel_appointment_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    let appointment = state
        .db
        .get_appointment(appointment_id)
        .await
        .map_err(|e| port_error("Failed to load appointment", e))?;

    if appointment.donor_id != user.id {
        return Err((StatusCode::FORBIDDEN, "Not authorized".to_string()));
    }

    if appointment.date <= Utc::now() {
        return Err((
            StatusCode::BAD_REQUEST,
            "Cannot cancel past appointments".to_string(),
        ));
    }

    // Flip the status instead of deleting; history stays intact.
    state
        .db
        .update_appointment(appointment_id, AppointmentStatus::Cancelled, None)
        .await
        .map_err(|e| port_error("Failed to cancel appointment", e))?;

    Ok(Json(MessageResponse {
        message: "Appointment cancelled".to_string(),
    }))
}

/// GET /api/appointments/admin/all - Every appointment (admin only)
#[utoipa::path(
    get,
    path = "/api/appointments/admin/all",
    responses(
        (status = 200, description = "All appointments", body = [AppointmentResponse]),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn admin_list_appointments_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<AppointmentResponse>>, (StatusCode, String)> {
    let appointments = state
        .db
        .list_appointments()
        .await
        .map_err(|e| port_error("Failed to list appointments", e))?;

    let mut responses = Vec::with_capacity(appointments.len());
    for appointment in appointments {
        responses.push(with_center_and_donor(&state, appointment).await);
    }
    Ok(Json(responses))
}

/// PUT /api/appointments/admin/{id} - Update any appointment (admin only)
#[utoipa::path(
    put,
    path = "/api/appointments/admin/{id}",
    params(("id" = Uuid, Path, description = "The appointment id")),
    request_body = UpdateAppointmentRequest,
    responses(
        (status = 200, description = "Updated appointment", body = AppointmentResponse),
        (status = 404, description = "Appointment not found")
    )
)]
pub async fn admin_update_appointment_handler(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
    Json(req): Json<UpdateAppointmentRequest>,
) -> Result<Json<AppointmentResponse>, (StatusCode, String)> {
    let updated = state
        .db
        .update_appointment(appointment_id, req.status, req.notes)
        .await
        .map_err(|e| port_error("Failed to update appointment", e))?;

    if req.status == AppointmentStatus::Completed {
        state
            .db
            .record_donation(updated.donor_id, Utc::now())
            .await
            .map_err(|e| port_error("Failed to record donation", e))?;
    }

    Ok(Json(with_center(&state, updated).await))
}

/// DELETE /api/appointments/admin/{id} - Delete an appointment (admin only)
#[utoipa::path(
    delete,
    path = "/api/appointments/admin/{id}",
    params(("id" = Uuid, Path, description = "The appointment id")),
    responses(
        (status = 200, description = "Appointment deleted", body = MessageResponse),
        (status = 404, description = "Appointment not found")
    )
)]
pub async fn admin_delete_appointment_handler(
    State(state): State<Arc<AppState>>,
    Path(appointment_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    state
        .db
        .delete_appointment(appointment_id)
        .await
        .map_err(|e| port_error("Failed to delete appointment", e))?;

    Ok(Json(MessageResponse {
        message: "Appointment deleted successfully".to_string(),
    }))
}
