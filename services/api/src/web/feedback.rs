//! services/api/src/web/feedback.rs
//!
//! Donor/recipient feedback submission and the admin listing.

use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::ToSchema;
use uuid::Uuid;

use crate::web::middleware::CurrentUser;
use crate::web::port_error;
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;

#[derive(Deserialize, ToSchema)]
pub struct SubmitFeedbackRequest {
    /// 1 (worst) to 5 (best).
    pub rating: i32,
    pub comment: Option<String>,
}

#[derive(Serialize, ToSchema)]
pub struct SubmitterSummary {
    pub name: String,
    pub email: String,
}

#[derive(Serialize, ToSchema)]
pub struct FeedbackResponse {
    pub id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub user: Option<SubmitterSummary>,
}

/// POST /api/feedback - Submit feedback
#[utoipa::path(
    post,
    path = "/api/feedback",
    request_body = SubmitFeedbackRequest,
    responses(
        (status = 201, description = "Feedback submitted", body = MessageResponse),
        (status = 400, description = "Rating out of range"),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn submit_feedback_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<SubmitFeedbackRequest>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if !(1..=5).contains(&req.rating) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Rating must be between 1 and 5".to_string(),
        ));
    }

    state
        .db
        .create_feedback(user.id, req.rating, req.comment.unwrap_or_default())
        .await
        .map_err(|e| port_error("Failed to submit feedback", e))?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Feedback submitted successfully".to_string(),
        }),
    ))
}

/// GET /api/feedback - All feedback (admin only)
#[utoipa::path(
    get,
    path = "/api/feedback",
    responses(
        (status = 200, description = "All feedback, newest first", body = [FeedbackResponse]),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn list_feedback_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<FeedbackResponse>>, (StatusCode, String)> {
    let entries = state
        .db
        .list_feedback()
        .await
        .map_err(|e| port_error("Failed to list feedback", e))?;

    let mut responses = Vec::with_capacity(entries.len());
    for entry in entries {
        let user = state
            .db
            .get_user_by_id(entry.user_id)
            .await
            .ok()
            .map(|u| SubmitterSummary {
                name: u.name,
                email: u.email,
            });
        responses.push(FeedbackResponse {
            id: entry.id,
            user_id: entry.user_id,
            rating: entry.rating,
            comment: entry.comment,
            created_at: entry.created_at,
            user,
        });
    }
    Ok(Json(responses))
}
