//! services/api/src/web/compatibility.rs
//!
//! Informational endpoint: which types a given blood type can donate to and
//! receive from. Both views come from the one canonical table in the core.

use axum::{extract::Path, http::StatusCode, response::Json};
use serde::Serialize;
use utoipa::ToSchema;

use bloodlink_core::compatibility::{can_donate_to, can_receive_from};
use bloodlink_core::domain::{BloodType, DomainError};

#[derive(Serialize, ToSchema)]
pub struct CompatibilityResponse {
    pub blood_type: String,
    pub can_donate_to: Vec<String>,
    pub can_receive_from: Vec<String>,
}

/// GET /api/compatibility/{blood_type} - Compatibility sets for one type
#[utoipa::path(
    get,
    path = "/api/compatibility/{blood_type}",
    params(("blood_type" = String, Path, description = "Canonical code, e.g. O- or AB+")),
    responses(
        (status = 200, description = "Donate-to and receive-from sets", body = CompatibilityResponse),
        (status = 400, description = "Unrecognized blood type")
    )
)]
pub async fn compatibility_handler(
    Path(code): Path<String>,
) -> Result<Json<CompatibilityResponse>, (StatusCode, String)> {
    let blood_type: BloodType = code
        .parse()
        .map_err(|e: DomainError| (StatusCode::BAD_REQUEST, e.to_string()))?;

    Ok(Json(CompatibilityResponse {
        blood_type: blood_type.code().to_string(),
        can_donate_to: can_donate_to(blood_type)
            .iter()
            .map(|b| b.code().to_string())
            .collect(),
        can_receive_from: can_receive_from(blood_type)
            .iter()
            .map(|b| b.code().to_string())
            .collect(),
    }))
}
