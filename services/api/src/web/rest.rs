//! services/api/src/web/rest.rs
//!
//! The master definition for the OpenAPI specification, the health probe,
//! and the shared message payload.

use axum::response::Json;
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

//=========================================================================================
// OpenAPI Master Definition
//=========================================================================================

#[derive(OpenApi)]
#[openapi(
    paths(
        crate::web::rest::health_handler,
        crate::web::auth::register_handler,
        crate::web::auth::login_handler,
        crate::web::auth::logout_handler,
        crate::web::users::me_handler,
        crate::web::users::eligibility_handler,
        crate::web::users::update_profile_handler,
        crate::web::users::list_donors_handler,
        crate::web::users::admin_list_users_handler,
        crate::web::users::admin_verify_donor_handler,
        crate::web::users::admin_delete_user_handler,
        crate::web::appointments::create_appointment_handler,
        crate::web::appointments::list_appointments_handler,
        crate::web::appointments::donation_history_handler,
        crate::web::appointments::update_appointment_handler,
        crate::web::appointments::cancel_appointment_handler,
        crate::web::appointments::admin_list_appointments_handler,
        crate::web::appointments::admin_update_appointment_handler,
        crate::web::appointments::admin_delete_appointment_handler,
        crate::web::blood_requests::create_request_handler,
        crate::web::blood_requests::my_requests_handler,
        crate::web::blood_requests::available_requests_handler,
        crate::web::blood_requests::admin_update_request_handler,
        crate::web::blood_requests::admin_list_requests_handler,
        crate::web::compatibility::compatibility_handler,
        crate::web::donation_centers::list_centers_handler,
        crate::web::donation_centers::nearby_centers_handler,
        crate::web::donation_centers::get_center_handler,
        crate::web::donation_centers::create_center_handler,
        crate::web::donation_centers::update_center_handler,
        crate::web::campaigns::create_campaign_handler,
        crate::web::campaigns::list_campaigns_handler,
        crate::web::campaigns::get_campaign_handler,
        crate::web::campaigns::update_campaign_handler,
        crate::web::campaigns::delete_campaign_handler,
        crate::web::campaigns::signup_handler,
        crate::web::campaigns::participant_status_handler,
        crate::web::campaigns::signed_campaigns_handler,
        crate::web::feedback::submit_feedback_handler,
        crate::web::feedback::list_feedback_handler,
    ),
    components(schemas(
        MessageResponse,
        crate::web::auth::RegisterRequest,
        crate::web::auth::LoginRequest,
        crate::web::users::UserResponse,
        crate::web::users::UpdateProfileRequest,
        crate::web::users::EligibilityResponse,
        crate::web::appointments::CreateAppointmentRequest,
        crate::web::appointments::UpdateAppointmentRequest,
        crate::web::appointments::AppointmentResponse,
        crate::web::appointments::CenterSummary,
        crate::web::appointments::DonorSummary,
        crate::web::blood_requests::CreateBloodRequestRequest,
        crate::web::blood_requests::UpdateBloodRequestRequest,
        crate::web::blood_requests::BloodRequestResponse,
        crate::web::blood_requests::RecipientInfo,
        crate::web::blood_requests::RecipientContact,
        crate::web::compatibility::CompatibilityResponse,
        crate::web::donation_centers::CenterPayload,
        crate::web::donation_centers::CenterResponse,
        crate::web::campaigns::CampaignPayload,
        crate::web::campaigns::UpdateCampaignRequest,
        crate::web::campaigns::ParticipantStatusRequest,
        crate::web::campaigns::CampaignResponse,
        crate::web::campaigns::OrganizerSummary,
        crate::web::campaigns::ParticipantResponse,
        crate::web::campaigns::ParticipantDonor,
        crate::web::feedback::SubmitFeedbackRequest,
        crate::web::feedback::FeedbackResponse,
        crate::web::feedback::SubmitterSummary,
    )),
    tags(
        (name = "BloodLink API", description = "API endpoints for the blood donation coordination service.")
    )
)]
pub struct ApiDoc;

//=========================================================================================
// Shared Payloads and Probes
//=========================================================================================

/// A plain confirmation message.
#[derive(Serialize, ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /api/health - Liveness probe
#[utoipa::path(
    get,
    path = "/api/health",
    responses((status = 200, description = "Service is up", body = MessageResponse))
)]
pub async fn health_handler() -> Json<MessageResponse> {
    Json(MessageResponse {
        message: "ok".to_string(),
    })
}

/// GET /api-docs/openapi.json - The generated OpenAPI document
pub async fn openapi_handler() -> Json<utoipa::openapi::OpenApi> {
    Json(ApiDoc::openapi())
}
