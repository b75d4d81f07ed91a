//! services/api/src/web/campaigns.rs
//!
//! Campaign management and donor sign-ups.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
    Extension,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::web::middleware::CurrentUser;
use crate::web::port_error;
use crate::web::rest::MessageResponse;
use crate::web::state::AppState;
use bloodlink_core::domain::{BloodType, Campaign, CampaignStatus, ParticipantStatus, UserType};
use bloodlink_core::ports::{CampaignUpdate, NewCampaign, PortError};

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, ToSchema)]
pub struct CampaignPayload {
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    /// Omitted or empty means every blood type is welcome.
    #[schema(value_type = Option<Vec<String>>, example = json!(["O-", "O+"]))]
    pub blood_types_needed: Option<Vec<BloodType>>,
    pub goal: i32,
    pub image: Option<String>,
}

#[derive(Deserialize, ToSchema)]
pub struct UpdateCampaignRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    #[schema(value_type = Option<Vec<String>>)]
    pub blood_types_needed: Option<Vec<BloodType>>,
    pub goal: Option<i32>,
    pub image: Option<String>,
    #[schema(value_type = Option<String>, example = "cancelled")]
    pub status: Option<CampaignStatus>,
}

#[derive(Deserialize, ToSchema)]
pub struct ParticipantStatusRequest {
    #[schema(value_type = String, example = "donated")]
    pub status: ParticipantStatus,
}

#[derive(Deserialize, IntoParams)]
pub struct CampaignsQuery {
    #[param(value_type = Option<String>, example = "active")]
    pub status: Option<CampaignStatus>,
}

#[derive(Serialize, ToSchema)]
pub struct OrganizerSummary {
    pub id: Uuid,
    pub name: String,
}

#[derive(Serialize, ToSchema)]
pub struct ParticipantDonor {
    pub name: String,
    pub blood_type: Option<String>,
    pub is_verified: bool,
}

#[derive(Serialize, ToSchema)]
pub struct ParticipantResponse {
    pub donor_id: Uuid,
    pub signup_date: DateTime<Utc>,
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub donor: Option<ParticipantDonor>,
}

#[derive(Serialize, ToSchema)]
pub struct CampaignResponse {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub blood_types_needed: Vec<String>,
    pub goal: i32,
    pub image: String,
    pub organizer_id: Uuid,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub organizer: Option<OrganizerSummary>,
    pub status: String,
    pub created_at: DateTime<Utc>,
    /// Present on the detail view only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub participants: Option<Vec<ParticipantResponse>>,
}

impl From<Campaign> for CampaignResponse {
    fn from(campaign: Campaign) -> Self {
        Self {
            id: campaign.id,
            title: campaign.title,
            description: campaign.description,
            start_date: campaign.start_date,
            end_date: campaign.end_date,
            location: campaign.location,
            blood_types_needed: campaign
                .blood_types_needed
                .iter()
                .map(|b| b.code().to_string())
                .collect(),
            goal: campaign.goal,
            image: campaign.image,
            organizer_id: campaign.organizer_id,
            organizer: None,
            status: campaign.status.code().to_string(),
            created_at: campaign.created_at,
            participants: None,
        }
    }
}

async fn with_organizer(state: &AppState, campaign: Campaign) -> CampaignResponse {
    let organizer = state
        .db
        .get_user_by_id(campaign.organizer_id)
        .await
        .ok()
        .map(|u| OrganizerSummary { id: u.id, name: u.name });
    let mut response = CampaignResponse::from(campaign);
    response.organizer = organizer;
    response
}

/// The detail view: organizer plus the participant list with donor summaries.
async fn with_details(
    state: &AppState,
    campaign: Campaign,
) -> Result<CampaignResponse, (StatusCode, String)> {
    let participants = state
        .db
        .campaign_participants(campaign.id)
        .await
        .map_err(|e| port_error("Failed to load campaign participants", e))?;

    let mut response = with_organizer(state, campaign).await;
    let mut list = Vec::with_capacity(participants.len());
    for participant in participants {
        let donor = state
            .db
            .get_user_by_id(participant.donor_id)
            .await
            .ok()
            .map(|u| ParticipantDonor {
                name: u.name,
                blood_type: u.blood_type.map(|b| b.code().to_string()),
                is_verified: u.is_verified,
            });
        list.push(ParticipantResponse {
            donor_id: participant.donor_id,
            signup_date: participant.signup_date,
            status: participant.status.code().to_string(),
            donor,
        });
    }
    response.participants = Some(list);
    Ok(response)
}

//=========================================================================================
// Handlers
//=========================================================================================

/// POST /api/campaigns - Create a campaign (admin only)
#[utoipa::path(
    post,
    path = "/api/campaigns",
    request_body = CampaignPayload,
    responses(
        (status = 201, description = "Campaign created", body = CampaignResponse),
        (status = 400, description = "Invalid dates or goal"),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn create_campaign_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(req): Json<CampaignPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    if req.end_date < req.start_date {
        return Err((
            StatusCode::BAD_REQUEST,
            "End date must not be before the start date".to_string(),
        ));
    }
    if req.goal < 1 {
        return Err((StatusCode::BAD_REQUEST, "Goal must be at least 1".to_string()));
    }

    let status = CampaignStatus::from_window(req.start_date, req.end_date, Utc::now());
    let campaign = state
        .db
        .create_campaign(NewCampaign {
            title: req.title,
            description: req.description,
            start_date: req.start_date,
            end_date: req.end_date,
            location: req.location,
            blood_types_needed: req.blood_types_needed.unwrap_or_default(),
            goal: req.goal,
            image: req.image.unwrap_or_default(),
            organizer_id: user.id,
            status,
        })
        .await
        .map_err(|e| port_error("Failed to create campaign", e))?;

    Ok((
        StatusCode::CREATED,
        Json(with_organizer(&state, campaign).await),
    ))
}

/// GET /api/campaigns - All campaigns, optionally filtered by status
#[utoipa::path(
    get,
    path = "/api/campaigns",
    params(CampaignsQuery),
    responses((status = 200, description = "Campaigns by start date", body = [CampaignResponse]))
)]
pub async fn list_campaigns_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<CampaignsQuery>,
) -> Result<Json<Vec<CampaignResponse>>, (StatusCode, String)> {
    let campaigns = state
        .db
        .list_campaigns(query.status)
        .await
        .map_err(|e| port_error("Failed to list campaigns", e))?;

    let mut responses = Vec::with_capacity(campaigns.len());
    for campaign in campaigns {
        responses.push(with_organizer(&state, campaign).await);
    }
    Ok(Json(responses))
}

/// GET /api/campaigns/{id} - One campaign with its participants
#[utoipa::path(
    get,
    path = "/api/campaigns/{id}",
    params(("id" = Uuid, Path, description = "The campaign id")),
    responses(
        (status = 200, description = "The campaign", body = CampaignResponse),
        (status = 404, description = "Campaign not found")
    )
)]
pub async fn get_campaign_handler(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, (StatusCode, String)> {
    let campaign = state
        .db
        .get_campaign(campaign_id)
        .await
        .map_err(|e| port_error("Failed to load campaign", e))?;
    Ok(Json(with_details(&state, campaign).await?))
}

/// PUT /api/campaigns/{id} - Update a campaign (admin only)
#[utoipa::path(
    put,
    path = "/api/campaigns/{id}",
    params(("id" = Uuid, Path, description = "The campaign id")),
    request_body = UpdateCampaignRequest,
    responses(
        (status = 200, description = "Updated campaign", body = CampaignResponse),
        (status = 404, description = "Campaign not found")
    )
)]
pub async fn update_campaign_handler(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
    Json(req): Json<UpdateCampaignRequest>,
) -> Result<Json<CampaignResponse>, (StatusCode, String)> {
    // When both dates move, the status follows the new window; an explicit
    // status only applies otherwise.
    let status = match (req.start_date, req.end_date) {
        (Some(start), Some(end)) => Some(CampaignStatus::from_window(start, end, Utc::now())),
        _ => req.status,
    };

    let campaign = state
        .db
        .update_campaign(
            campaign_id,
            CampaignUpdate {
                title: req.title,
                description: req.description,
                start_date: req.start_date,
                end_date: req.end_date,
                location: req.location,
                blood_types_needed: req.blood_types_needed,
                goal: req.goal,
                image: req.image,
                status,
            },
        )
        .await
        .map_err(|e| port_error("Failed to update campaign", e))?;

    Ok(Json(with_organizer(&state, campaign).await))
}

/// DELETE /api/campaigns/{id} - Delete a campaign (admin only)
#[utoipa::path(
    delete,
    path = "/api/campaigns/{id}",
    params(("id" = Uuid, Path, description = "The campaign id")),
    responses(
        (status = 200, description = "Campaign deleted", body = MessageResponse),
        (status = 404, description = "Campaign not found")
    )
)]
pub async fn delete_campaign_handler(
    State(state): State<Arc<AppState>>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<MessageResponse>, (StatusCode, String)> {
    state
        .db
        .delete_campaign(campaign_id)
        .await
        .map_err(|e| port_error("Failed to delete campaign", e))?;

    Ok(Json(MessageResponse {
        message: "Campaign deleted successfully".to_string(),
    }))
}

/// POST /api/campaigns/{id}/signup - Sign up for a campaign (donors only)
#[utoipa::path(
    post,
    path = "/api/campaigns/{id}/signup",
    params(("id" = Uuid, Path, description = "The campaign id")),
    responses(
        (status = 200, description = "Signed up", body = CampaignResponse),
        (status = 400, description = "Campaign closed or already signed up"),
        (status = 403, description = "Only donors can sign up for campaigns"),
        (status = 404, description = "Campaign not found")
    )
)]
pub async fn signup_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(campaign_id): Path<Uuid>,
) -> Result<Json<CampaignResponse>, (StatusCode, String)> {
    if user.user_type != UserType::Donor {
        return Err((
            StatusCode::FORBIDDEN,
            "Only donors can sign up for campaigns".to_string(),
        ));
    }

    let campaign = state
        .db
        .get_campaign(campaign_id)
        .await
        .map_err(|e| port_error("Failed to load campaign", e))?;

    if matches!(
        campaign.status,
        CampaignStatus::Completed | CampaignStatus::Cancelled
    ) {
        return Err((
            StatusCode::BAD_REQUEST,
            "Cannot sign up for a completed or cancelled campaign".to_string(),
        ));
    }

    state
        .db
        .add_campaign_participant(campaign_id, user.id)
        .await
        .map_err(|e| match e {
            PortError::Conflict(_) => (
                StatusCode::BAD_REQUEST,
                "You are already signed up for this campaign".to_string(),
            ),
            other => port_error("Failed to sign up for campaign", other),
        })?;

    Ok(Json(with_details(&state, campaign).await?))
}

/// PUT /api/campaigns/{id}/status/{user_id} - Update a participant's status
/// (admin only)
#[utoipa::path(
    put,
    path = "/api/campaigns/{id}/status/{user_id}",
    params(
        ("id" = Uuid, Path, description = "The campaign id"),
        ("user_id" = Uuid, Path, description = "The participant's user id")
    ),
    request_body = ParticipantStatusRequest,
    responses(
        (status = 200, description = "Updated campaign", body = CampaignResponse),
        (status = 404, description = "Campaign or participant not found")
    )
)]
pub async fn participant_status_handler(
    State(state): State<Arc<AppState>>,
    Path((campaign_id, user_id)): Path<(Uuid, Uuid)>,
    Json(req): Json<ParticipantStatusRequest>,
) -> Result<Json<CampaignResponse>, (StatusCode, String)> {
    let campaign = state
        .db
        .get_campaign(campaign_id)
        .await
        .map_err(|e| port_error("Failed to load campaign", e))?;

    state
        .db
        .set_participant_status(campaign_id, user_id, req.status)
        .await
        .map_err(|e| port_error("Failed to update participant", e))?;

    // A campaign donation stamps the donor just like a completed appointment.
    if req.status == ParticipantStatus::Donated {
        state
            .db
            .record_donation(user_id, Utc::now())
            .await
            .map_err(|e| port_error("Failed to record donation", e))?;
    }

    Ok(Json(with_details(&state, campaign).await?))
}

/// GET /api/campaigns/user/signed - Campaigns the current user signed up for
#[utoipa::path(
    get,
    path = "/api/campaigns/user/signed",
    responses(
        (status = 200, description = "Signed-up campaigns", body = [CampaignResponse]),
        (status = 401, description = "Not logged in")
    )
)]
pub async fn signed_campaigns_handler(
    State(state): State<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<Vec<CampaignResponse>>, (StatusCode, String)> {
    let campaigns = state
        .db
        .campaigns_for_donor(user.id)
        .await
        .map_err(|e| port_error("Failed to list signed campaigns", e))?;

    let mut responses = Vec::with_capacity(campaigns.len());
    for campaign in campaigns {
        responses.push(with_organizer(&state, campaign).await);
    }
    Ok(Json(responses))
}
