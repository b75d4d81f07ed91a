pub mod appointments;
pub mod auth;
pub mod blood_requests;
pub mod campaigns;
pub mod compatibility;
pub mod donation_centers;
pub mod feedback;
pub mod middleware;
pub mod rest;
pub mod state;
pub mod users;

pub use middleware::{require_admin, require_auth, CurrentUser};
pub use state::AppState;

use crate::error::ApiError;
use axum::{
    http::{
        header::{ACCEPT, AUTHORIZATION, CONTENT_TYPE},
        HeaderValue, Method, StatusCode,
    },
    middleware as axum_middleware,
    routing::{delete, get, post, put},
    Router,
};
use bloodlink_core::ports::PortError;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::error;

/// Maps a port failure to an HTTP response. Unexpected failures are logged
/// here and degraded to a generic message for the client.
pub(crate) fn port_error(context: &str, err: PortError) -> (StatusCode, String) {
    match err {
        PortError::NotFound(message) => (StatusCode::NOT_FOUND, message),
        PortError::Conflict(message) => (StatusCode::BAD_REQUEST, message),
        PortError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string()),
        PortError::Unexpected(message) => {
            error!("{context}: {message}");
            (StatusCode::INTERNAL_SERVER_ERROR, "Server error".to_string())
        }
    }
}

/// Builds the complete application router: public routes, session-protected
/// routes, and admin routes, plus CORS and the OpenAPI document.
///
/// Lives here (rather than in the binary) so the integration tests can mount
/// the same routes over an in-memory port implementation.
pub fn build_router(state: Arc<AppState>) -> Result<Router, ApiError> {
    let origin = state
        .config
        .cors_origin
        .parse::<HeaderValue>()
        .map_err(|e| ApiError::Internal(format!("Invalid CORS origin: {e}")))?;
    let cors = CorsLayer::new()
        .allow_origin(origin)
        .allow_credentials(true)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([AUTHORIZATION, CONTENT_TYPE, ACCEPT]);

    // Public routes (no auth required)
    let public_routes = Router::new()
        .route("/api/health", get(rest::health_handler))
        .route("/api/auth/register", post(auth::register_handler))
        .route("/api/auth/login", post(auth::login_handler))
        .route("/api/auth/logout", post(auth::logout_handler))
        .route(
            "/api/donation-centers",
            get(donation_centers::list_centers_handler),
        )
        .route(
            "/api/donation-centers/nearby",
            get(donation_centers::nearby_centers_handler),
        )
        .route(
            "/api/donation-centers/{id}",
            get(donation_centers::get_center_handler),
        )
        .route("/api/campaigns", get(campaigns::list_campaigns_handler))
        .route("/api/campaigns/{id}", get(campaigns::get_campaign_handler));

    // Protected routes (auth required)
    let protected_routes = Router::new()
        .route("/api/users/me", get(users::me_handler))
        .route("/api/users/me/eligibility", get(users::eligibility_handler))
        .route("/api/users/profile", put(users::update_profile_handler))
        .route("/api/users/donors", get(users::list_donors_handler))
        .route(
            "/api/compatibility/{blood_type}",
            get(compatibility::compatibility_handler),
        )
        .route(
            "/api/appointments",
            post(appointments::create_appointment_handler)
                .get(appointments::list_appointments_handler),
        )
        .route(
            "/api/appointments/history",
            get(appointments::donation_history_handler),
        )
        .route(
            "/api/appointments/{id}",
            put(appointments::update_appointment_handler)
                .delete(appointments::cancel_appointment_handler),
        )
        .route(
            "/api/blood-requests",
            post(blood_requests::create_request_handler).get(blood_requests::my_requests_handler),
        )
        .route(
            "/api/blood-requests/available",
            get(blood_requests::available_requests_handler),
        )
        .route("/api/campaigns/{id}/signup", post(campaigns::signup_handler))
        .route(
            "/api/campaigns/user/signed",
            get(campaigns::signed_campaigns_handler),
        )
        .route("/api/feedback", post(feedback::submit_feedback_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_auth,
        ));

    // Admin routes (auth + admin role required)
    let admin_routes = Router::new()
        .route("/api/users/admin/all", get(users::admin_list_users_handler))
        .route(
            "/api/users/admin/verify/{id}",
            put(users::admin_verify_donor_handler),
        )
        .route(
            "/api/users/admin/{id}",
            delete(users::admin_delete_user_handler),
        )
        .route(
            "/api/appointments/admin/all",
            get(appointments::admin_list_appointments_handler),
        )
        .route(
            "/api/appointments/admin/{id}",
            put(appointments::admin_update_appointment_handler)
                .delete(appointments::admin_delete_appointment_handler),
        )
        .route(
            "/api/blood-requests/admin/all",
            get(blood_requests::admin_list_requests_handler),
        )
        .route(
            "/api/blood-requests/{id}",
            put(blood_requests::admin_update_request_handler),
        )
        .route("/api/campaigns", post(campaigns::create_campaign_handler))
        .route(
            "/api/campaigns/{id}",
            put(campaigns::update_campaign_handler).delete(campaigns::delete_campaign_handler),
        )
        .route(
            "/api/campaigns/{id}/status/{user_id}",
            put(campaigns::participant_status_handler),
        )
        .route(
            "/api/donation-centers",
            post(donation_centers::create_center_handler),
        )
        .route(
            "/api/donation-centers/{id}",
            put(donation_centers::update_center_handler),
        )
        .route("/api/feedback", get(feedback::list_feedback_handler))
        .layer(axum_middleware::from_fn_with_state(
            state.clone(),
            require_admin,
        ));

    Ok(Router::new()
        .merge(public_routes)
        .merge(protected_routes)
        .merge(admin_routes)
        .route("/api-docs/openapi.json", get(rest::openapi_handler))
        .layer(cors)
        .with_state(state))
}
