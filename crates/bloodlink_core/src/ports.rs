//! crates/bloodlink_core/src/ports.rs
//!
//! Defines the service contracts (traits) for the application's core logic.
//! These traits form the boundary of the hexagonal architecture, allowing the core
//! to be independent of specific external implementations like databases or APIs.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use uuid::Uuid;

use crate::domain::{
    Appointment, AppointmentStatus, BloodRequest, BloodType, Campaign, CampaignParticipant,
    CampaignStatus, DayHours, DonationCenter, Feedback, ParticipantStatus, RequestStatus, Urgency,
    User, UserCredentials, UserType,
};

//=========================================================================================
// Generic Port Error and Result Types
//=========================================================================================

/// A generic error type for all port operations.
/// This abstracts away the specific errors from external services (e.g., database, network).
#[derive(Debug, thiserror::Error)]
pub enum PortError {
    #[error("Item not found: {0}")]
    NotFound(String),
    #[error("Conflict: {0}")]
    Conflict(String),
    #[error("An unexpected error occurred: {0}")]
    Unexpected(String),
    #[error("Unauthorized")]
    Unauthorized,
}

/// A convenience type alias for `Result<T, PortError>`.
pub type PortResult<T> = Result<T, PortError>;

//=========================================================================================
// Port Input Values
//=========================================================================================

/// Everything needed to create an account. The password arrives already
/// hashed; the core never sees plaintext credentials.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub hashed_password: String,
    pub phone: String,
    pub user_type: UserType,
    pub blood_type: Option<BloodType>,
    pub location: String,
}

/// Partial profile update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct ProfileUpdate {
    pub name: Option<String>,
    pub phone: Option<String>,
    pub location: Option<String>,
    pub blood_type: Option<BloodType>,
}

/// Filters for the donor directory.
#[derive(Debug, Clone, Default)]
pub struct DonorFilter {
    pub blood_type: Option<BloodType>,
    /// Case-insensitive substring match on the donor's location.
    pub location: Option<String>,
    pub verified_only: bool,
}

#[derive(Debug, Clone)]
pub struct NewBloodRequest {
    pub recipient_id: Uuid,
    pub blood_type: BloodType,
    pub quantity: i32,
    pub urgency: Urgency,
    pub hospital: String,
    pub location: String,
    pub notes: String,
}

#[derive(Debug, Clone)]
pub struct NewDonationCenter {
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: String,
    pub email: String,
    pub operating_hours: HashMap<String, DayHours>,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone)]
pub struct NewCampaign {
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    pub blood_types_needed: Vec<BloodType>,
    pub goal: i32,
    pub image: String,
    pub organizer_id: Uuid,
    pub status: CampaignStatus,
}

/// Partial campaign update; `None` fields are left unchanged.
#[derive(Debug, Clone, Default)]
pub struct CampaignUpdate {
    pub title: Option<String>,
    pub description: Option<String>,
    pub start_date: Option<DateTime<Utc>>,
    pub end_date: Option<DateTime<Utc>>,
    pub location: Option<String>,
    pub blood_types_needed: Option<Vec<BloodType>>,
    pub goal: Option<i32>,
    pub image: Option<String>,
    pub status: Option<CampaignStatus>,
}

//=========================================================================================
// Service Ports (Traits)
//=========================================================================================

#[async_trait]
pub trait DatabaseService: Send + Sync {
    // --- Accounts ---
    /// Creates an account. Fails with [`PortError::Conflict`] when the email
    /// is already registered.
    async fn create_user(&self, new_user: NewUser) -> PortResult<User>;

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User>;

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials>;

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> PortResult<User>;

    async fn list_donors(&self, filter: DonorFilter) -> PortResult<Vec<User>>;

    async fn list_users(&self) -> PortResult<Vec<User>>;

    async fn set_donor_verified(&self, user_id: Uuid) -> PortResult<User>;

    /// Removes the account and, through the schema's cascades, the user's
    /// appointments, blood requests, campaign sign-ups, and feedback.
    async fn delete_user(&self, user_id: Uuid) -> PortResult<()>;

    /// Stamps a completed donation: sets `last_donation`, increments
    /// `donation_count`, and marks the donor verified.
    async fn record_donation(&self, user_id: Uuid, donated_at: DateTime<Utc>) -> PortResult<()>;

    // --- Auth Sessions ---
    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()>;

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid>;

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()>;

    // --- Appointments ---
    async fn create_appointment(
        &self,
        donor_id: Uuid,
        center_id: Uuid,
        date: DateTime<Utc>,
        notes: String,
    ) -> PortResult<Appointment>;

    async fn get_appointment(&self, appointment_id: Uuid) -> PortResult<Appointment>;

    /// All of a donor's appointments, newest date first.
    async fn appointments_for_donor(&self, donor_id: Uuid) -> PortResult<Vec<Appointment>>;

    /// Completed appointments only, newest date first (the donation history).
    async fn completed_appointments_for_donor(
        &self,
        donor_id: Uuid,
    ) -> PortResult<Vec<Appointment>>;

    async fn list_appointments(&self) -> PortResult<Vec<Appointment>>;

    async fn update_appointment(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        notes: Option<String>,
    ) -> PortResult<Appointment>;

    async fn delete_appointment(&self, appointment_id: Uuid) -> PortResult<()>;

    // --- Blood Requests ---
    async fn create_blood_request(&self, new_request: NewBloodRequest) -> PortResult<BloodRequest>;

    /// A recipient's own requests, newest first.
    async fn blood_requests_for_recipient(
        &self,
        recipient_id: Uuid,
    ) -> PortResult<Vec<BloodRequest>>;

    /// Every approved request, newest first. Compatibility filtering is the
    /// caller's concern.
    async fn approved_blood_requests(&self) -> PortResult<Vec<BloodRequest>>;

    async fn list_blood_requests(&self) -> PortResult<Vec<BloodRequest>>;

    async fn update_blood_request(
        &self,
        request_id: Uuid,
        status: RequestStatus,
        notes: Option<String>,
    ) -> PortResult<BloodRequest>;

    // --- Donation Centers ---
    async fn list_centers(&self) -> PortResult<Vec<DonationCenter>>;

    async fn get_center(&self, center_id: Uuid) -> PortResult<DonationCenter>;

    async fn create_center(&self, new_center: NewDonationCenter) -> PortResult<DonationCenter>;

    /// Full replacement of the center's fields.
    async fn update_center(
        &self,
        center_id: Uuid,
        center: NewDonationCenter,
    ) -> PortResult<DonationCenter>;

    // --- Campaigns ---
    async fn create_campaign(&self, new_campaign: NewCampaign) -> PortResult<Campaign>;

    /// Campaigns ordered by start date, optionally filtered by status.
    async fn list_campaigns(&self, status: Option<CampaignStatus>) -> PortResult<Vec<Campaign>>;

    async fn get_campaign(&self, campaign_id: Uuid) -> PortResult<Campaign>;

    async fn update_campaign(
        &self,
        campaign_id: Uuid,
        update: CampaignUpdate,
    ) -> PortResult<Campaign>;

    async fn delete_campaign(&self, campaign_id: Uuid) -> PortResult<()>;

    async fn campaign_participants(
        &self,
        campaign_id: Uuid,
    ) -> PortResult<Vec<CampaignParticipant>>;

    /// Signs a donor up. Fails with [`PortError::Conflict`] when the donor is
    /// already a participant.
    async fn add_campaign_participant(
        &self,
        campaign_id: Uuid,
        donor_id: Uuid,
    ) -> PortResult<CampaignParticipant>;

    async fn set_participant_status(
        &self,
        campaign_id: Uuid,
        donor_id: Uuid,
        status: ParticipantStatus,
    ) -> PortResult<()>;

    /// Campaigns the donor signed up for, ordered by start date.
    async fn campaigns_for_donor(&self, donor_id: Uuid) -> PortResult<Vec<Campaign>>;

    // --- Feedback ---
    async fn create_feedback(&self, user_id: Uuid, rating: i32, comment: String)
        -> PortResult<Feedback>;

    async fn list_feedback(&self) -> PortResult<Vec<Feedback>>;
}
