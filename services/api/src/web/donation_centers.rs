//! services/api/src/web/donation_centers.rs
//!
//! Donation center listing, nearby search, and admin management.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::{IntoResponse, Json},
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use utoipa::{IntoParams, ToSchema};
use uuid::Uuid;

use crate::web::port_error;
use crate::web::state::AppState;
use bloodlink_core::domain::{DayHours, DonationCenter};
use bloodlink_core::ports::NewDonationCenter;

/// Radius used when the nearby search does not specify one.
const DEFAULT_NEARBY_RADIUS_KM: f64 = 50.0;
/// Cap on how many nearby centers a single search returns.
const NEARBY_RESULT_LIMIT: usize = 10;

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two coordinates, in kilometers.
fn haversine_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lng = (lng2 - lng1).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lng / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * a.sqrt().atan2((1.0 - a).sqrt())
}

//=========================================================================================
// Request/Response Types
//=========================================================================================

#[derive(Deserialize, IntoParams)]
pub struct NearbyQuery {
    pub lat: f64,
    pub lng: f64,
    /// Search radius in kilometers; defaults to 50.
    pub max_distance: Option<f64>,
}

#[derive(Deserialize, ToSchema)]
pub struct CenterPayload {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: String,
    pub email: String,
    /// Lowercase weekday name to open/close times.
    #[schema(value_type = Object)]
    pub operating_hours: Option<HashMap<String, DayHours>>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize, ToSchema)]
pub struct CenterResponse {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: String,
    pub email: String,
    #[schema(value_type = Object)]
    pub operating_hours: HashMap<String, DayHours>,
    pub latitude: f64,
    pub longitude: f64,
}

impl From<DonationCenter> for CenterResponse {
    fn from(center: DonationCenter) -> Self {
        Self {
            id: center.id,
            name: center.name,
            address: center.address,
            city: center.city,
            state: center.state,
            zip_code: center.zip_code,
            phone: center.phone,
            email: center.email,
            operating_hours: center.operating_hours,
            latitude: center.latitude,
            longitude: center.longitude,
        }
    }
}

//=========================================================================================
// Handlers
//=========================================================================================

/// GET /api/donation-centers - All donation centers
#[utoipa::path(
    get,
    path = "/api/donation-centers",
    responses((status = 200, description = "Centers in name order", body = [CenterResponse]))
)]
pub async fn list_centers_handler(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Vec<CenterResponse>>, (StatusCode, String)> {
    let centers = state
        .db
        .list_centers()
        .await
        .map_err(|e| port_error("Failed to list donation centers", e))?;
    Ok(Json(centers.into_iter().map(CenterResponse::from).collect()))
}

/// GET /api/donation-centers/nearby - Centers within a radius, nearest first
#[utoipa::path(
    get,
    path = "/api/donation-centers/nearby",
    params(NearbyQuery),
    responses(
        (status = 200, description = "Up to 10 nearby centers", body = [CenterResponse]),
        (status = 400, description = "Invalid coordinates or distance")
    )
)]
pub async fn nearby_centers_handler(
    State(state): State<Arc<AppState>>,
    Query(query): Query<NearbyQuery>,
) -> Result<Json<Vec<CenterResponse>>, (StatusCode, String)> {
    let radius = query.max_distance.unwrap_or(DEFAULT_NEARBY_RADIUS_KM);
    if !query.lat.is_finite() || !query.lng.is_finite() || !radius.is_finite() || radius <= 0.0 {
        return Err((
            StatusCode::BAD_REQUEST,
            "Invalid coordinates or distance".to_string(),
        ));
    }

    let centers = state
        .db
        .list_centers()
        .await
        .map_err(|e| port_error("Failed to list donation centers", e))?;

    let mut nearby: Vec<(f64, DonationCenter)> = centers
        .into_iter()
        .map(|c| {
            let distance = haversine_km(query.lat, query.lng, c.latitude, c.longitude);
            (distance, c)
        })
        .filter(|(distance, _)| *distance <= radius)
        .collect();
    nearby.sort_by(|a, b| a.0.total_cmp(&b.0));

    Ok(Json(
        nearby
            .into_iter()
            .take(NEARBY_RESULT_LIMIT)
            .map(|(_, center)| center.into())
            .collect(),
    ))
}

/// GET /api/donation-centers/{id} - One donation center
#[utoipa::path(
    get,
    path = "/api/donation-centers/{id}",
    params(("id" = Uuid, Path, description = "The center id")),
    responses(
        (status = 200, description = "The center", body = CenterResponse),
        (status = 404, description = "Donation center not found")
    )
)]
pub async fn get_center_handler(
    State(state): State<Arc<AppState>>,
    Path(center_id): Path<Uuid>,
) -> Result<Json<CenterResponse>, (StatusCode, String)> {
    let center = state
        .db
        .get_center(center_id)
        .await
        .map_err(|e| port_error("Failed to load donation center", e))?;
    Ok(Json(center.into()))
}

/// POST /api/donation-centers - Create a donation center (admin only)
#[utoipa::path(
    post,
    path = "/api/donation-centers",
    request_body = CenterPayload,
    responses(
        (status = 201, description = "Center created", body = CenterResponse),
        (status = 403, description = "Admin privileges required")
    )
)]
pub async fn create_center_handler(
    State(state): State<Arc<AppState>>,
    Json(req): Json<CenterPayload>,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let center = state
        .db
        .create_center(payload_to_new_center(req))
        .await
        .map_err(|e| port_error("Failed to create donation center", e))?;
    Ok((StatusCode::CREATED, Json(CenterResponse::from(center))))
}

/// PUT /api/donation-centers/{id} - Replace a donation center (admin only)
#[utoipa::path(
    put,
    path = "/api/donation-centers/{id}",
    params(("id" = Uuid, Path, description = "The center id")),
    request_body = CenterPayload,
    responses(
        (status = 200, description = "Updated center", body = CenterResponse),
        (status = 404, description = "Donation center not found")
    )
)]
pub async fn update_center_handler(
    State(state): State<Arc<AppState>>,
    Path(center_id): Path<Uuid>,
    Json(req): Json<CenterPayload>,
) -> Result<Json<CenterResponse>, (StatusCode, String)> {
    let center = state
        .db
        .update_center(center_id, payload_to_new_center(req))
        .await
        .map_err(|e| port_error("Failed to update donation center", e))?;
    Ok(Json(center.into()))
}

fn payload_to_new_center(req: CenterPayload) -> NewDonationCenter {
    NewDonationCenter {
        name: req.name,
        address: req.address,
        city: req.city,
        state: req.state,
        zip_code: req.zip_code,
        phone: req.phone,
        email: req.email,
        operating_hours: req.operating_hours.unwrap_or_default(),
        latitude: req.latitude,
        longitude: req.longitude,
    }
}
