//! services/api/src/adapters/db.rs
//!
//! This module contains the database adapter, which is the concrete implementation
//! of the `DatabaseService` port from the `core` crate. It handles all interactions
//! with the PostgreSQL database using `sqlx`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool};
use std::collections::HashMap;
use std::str::FromStr;
use uuid::Uuid;

use bloodlink_core::domain::{
    Appointment, AppointmentStatus, BloodRequest, Campaign, CampaignParticipant, CampaignStatus,
    DayHours, DomainError, DonationCenter, Feedback, ParticipantStatus, RequestStatus, User,
    UserCredentials,
};
use bloodlink_core::ports::{
    CampaignUpdate, DatabaseService, DonorFilter, NewBloodRequest, NewCampaign, NewDonationCenter,
    NewUser, PortError, PortResult, ProfileUpdate,
};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// A database adapter that implements the `DatabaseService` port.
#[derive(Clone)]
pub struct DbAdapter {
    pool: PgPool,
}

impl DbAdapter {
    /// Creates a new `DbAdapter`.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// A helper function to run database migrations at startup.
    pub async fn run_migrations(&self) -> Result<(), sqlx::Error> {
        sqlx::migrate!("./migrations").run(&self.pool).await?;
        Ok(())
    }
}

/// Parses an enum stored as TEXT back into its domain type. A code that no
/// longer parses means the stored data is corrupt, never a silent default.
fn parse_stored<T>(value: &str) -> PortResult<T>
where
    T: FromStr<Err = DomainError>,
{
    value
        .parse()
        .map_err(|e: DomainError| PortError::Unexpected(format!("corrupt stored value: {e}")))
}

fn unexpected(e: sqlx::Error) -> PortError {
    PortError::Unexpected(e.to_string())
}

fn not_found_or(e: sqlx::Error, what: &str) -> PortError {
    match e {
        sqlx::Error::RowNotFound => PortError::NotFound(format!("{what} not found")),
        _ => unexpected(e),
    }
}

//=========================================================================================
// "Impure" Database Record Structs
//=========================================================================================

const USER_COLUMNS: &str = "id, name, email, phone, user_type, blood_type, location, \
     last_donation, role, is_verified, donation_count, created_at";

#[derive(FromRow)]
struct UserRecord {
    id: Uuid,
    name: String,
    email: String,
    phone: String,
    user_type: String,
    blood_type: Option<String>,
    location: String,
    last_donation: Option<DateTime<Utc>>,
    role: String,
    is_verified: bool,
    donation_count: i32,
    created_at: DateTime<Utc>,
}
impl UserRecord {
    fn to_domain(self) -> PortResult<User> {
        Ok(User {
            id: self.id,
            user_type: parse_stored(&self.user_type)?,
            blood_type: self.blood_type.as_deref().map(parse_stored).transpose()?,
            role: parse_stored(&self.role)?,
            name: self.name,
            email: self.email,
            phone: self.phone,
            location: self.location,
            last_donation: self.last_donation,
            is_verified: self.is_verified,
            donation_count: self.donation_count,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct CredentialsRecord {
    user_id: Uuid,
    email: String,
    hashed_password: String,
}
impl CredentialsRecord {
    fn to_domain(self) -> UserCredentials {
        UserCredentials {
            user_id: self.user_id,
            email: self.email,
            hashed_password: self.hashed_password,
        }
    }
}

const APPOINTMENT_COLUMNS: &str = "id, donor_id, center_id, date, status, notes, created_at";

#[derive(FromRow)]
struct AppointmentRecord {
    id: Uuid,
    donor_id: Uuid,
    center_id: Uuid,
    date: DateTime<Utc>,
    status: String,
    notes: String,
    created_at: DateTime<Utc>,
}
impl AppointmentRecord {
    fn to_domain(self) -> PortResult<Appointment> {
        Ok(Appointment {
            id: self.id,
            donor_id: self.donor_id,
            center_id: self.center_id,
            date: self.date,
            status: parse_stored(&self.status)?,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

const REQUEST_COLUMNS: &str = "id, recipient_id, blood_type, quantity, urgency, hospital, \
     location, status, notes, created_at";

#[derive(FromRow)]
struct BloodRequestRecord {
    id: Uuid,
    recipient_id: Uuid,
    blood_type: String,
    quantity: i32,
    urgency: String,
    hospital: String,
    location: String,
    status: String,
    notes: String,
    created_at: DateTime<Utc>,
}
impl BloodRequestRecord {
    fn to_domain(self) -> PortResult<BloodRequest> {
        Ok(BloodRequest {
            id: self.id,
            recipient_id: self.recipient_id,
            blood_type: parse_stored(&self.blood_type)?,
            urgency: parse_stored(&self.urgency)?,
            status: parse_stored(&self.status)?,
            quantity: self.quantity,
            hospital: self.hospital,
            location: self.location,
            notes: self.notes,
            created_at: self.created_at,
        })
    }
}

const CENTER_COLUMNS: &str = "id, name, address, city, state, zip_code, phone, email, \
     operating_hours, latitude, longitude";

#[derive(FromRow)]
struct CenterRecord {
    id: Uuid,
    name: String,
    address: String,
    city: String,
    state: String,
    zip_code: String,
    phone: String,
    email: String,
    operating_hours: String,
    latitude: f64,
    longitude: f64,
}
impl CenterRecord {
    fn to_domain(self) -> PortResult<DonationCenter> {
        let operating_hours: HashMap<String, DayHours> =
            serde_json::from_str(&self.operating_hours).map_err(|e| {
                PortError::Unexpected(format!("corrupt operating hours for center {}: {e}", self.id))
            })?;
        Ok(DonationCenter {
            id: self.id,
            name: self.name,
            address: self.address,
            city: self.city,
            state: self.state,
            zip_code: self.zip_code,
            phone: self.phone,
            email: self.email,
            operating_hours,
            latitude: self.latitude,
            longitude: self.longitude,
        })
    }
}

const CAMPAIGN_COLUMNS: &str = "id, title, description, start_date, end_date, location, \
     blood_types_needed, goal, image, organizer_id, status, created_at";

#[derive(FromRow)]
struct CampaignRecord {
    id: Uuid,
    title: String,
    description: String,
    start_date: DateTime<Utc>,
    end_date: DateTime<Utc>,
    location: String,
    blood_types_needed: Vec<String>,
    goal: i32,
    image: String,
    organizer_id: Uuid,
    status: String,
    created_at: DateTime<Utc>,
}
impl CampaignRecord {
    fn to_domain(self) -> PortResult<Campaign> {
        let blood_types_needed = self
            .blood_types_needed
            .iter()
            .map(|code| parse_stored(code))
            .collect::<PortResult<Vec<_>>>()?;
        Ok(Campaign {
            id: self.id,
            status: parse_stored(&self.status)?,
            title: self.title,
            description: self.description,
            start_date: self.start_date,
            end_date: self.end_date,
            location: self.location,
            blood_types_needed,
            goal: self.goal,
            image: self.image,
            organizer_id: self.organizer_id,
            created_at: self.created_at,
        })
    }
}

#[derive(FromRow)]
struct ParticipantRecord {
    campaign_id: Uuid,
    donor_id: Uuid,
    signup_date: DateTime<Utc>,
    status: String,
}
impl ParticipantRecord {
    fn to_domain(self) -> PortResult<CampaignParticipant> {
        Ok(CampaignParticipant {
            campaign_id: self.campaign_id,
            donor_id: self.donor_id,
            signup_date: self.signup_date,
            status: parse_stored(&self.status)?,
        })
    }
}

#[derive(FromRow)]
struct FeedbackRecord {
    id: Uuid,
    user_id: Uuid,
    rating: i32,
    comment: String,
    created_at: DateTime<Utc>,
}
impl FeedbackRecord {
    fn to_domain(self) -> Feedback {
        Feedback {
            id: self.id,
            user_id: self.user_id,
            rating: self.rating,
            comment: self.comment,
            created_at: self.created_at,
        }
    }
}

//=========================================================================================
// `DatabaseService` Trait Implementation
//=========================================================================================

#[async_trait]
impl DatabaseService for DbAdapter {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "INSERT INTO users (id, name, email, hashed_password, phone, user_type, blood_type, location) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {USER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new_user.name)
        .bind(&new_user.email)
        .bind(&new_user.hashed_password)
        .bind(&new_user.phone)
        .bind(new_user.user_type.code())
        .bind(new_user.blood_type.map(|b| b.code()))
        .bind(&new_user.location)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::Conflict("User already exists".to_string())
            }
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users WHERE id = $1"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "User"))?;
        record.to_domain()
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        let record = sqlx::query_as::<_, CredentialsRecord>(
            "SELECT id AS user_id, email, hashed_password FROM users WHERE email = $1",
        )
        .bind(email)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "User"))?;
        Ok(record.to_domain())
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET \
                name = COALESCE($2, name), \
                phone = COALESCE($3, phone), \
                location = COALESCE($4, location), \
                blood_type = COALESCE($5, blood_type) \
             WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .bind(update.name)
        .bind(update.phone)
        .bind(update.location)
        .bind(update.blood_type.map(|b| b.code()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "User"))?;
        record.to_domain()
    }

    async fn list_donors(&self, filter: DonorFilter) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users \
             WHERE user_type = 'donor' \
               AND ($1::text IS NULL OR blood_type = $1) \
               AND ($2::text IS NULL OR location ILIKE '%' || $2 || '%') \
               AND (NOT $3 OR is_verified) \
             ORDER BY is_verified DESC, name ASC"
        ))
        .bind(filter.blood_type.map(|b| b.code()))
        .bind(filter.location)
        .bind(filter.verified_only)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        let records = sqlx::query_as::<_, UserRecord>(&format!(
            "SELECT {USER_COLUMNS} FROM users ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn set_donor_verified(&self, user_id: Uuid) -> PortResult<User> {
        let record = sqlx::query_as::<_, UserRecord>(&format!(
            "UPDATE users SET is_verified = TRUE WHERE id = $1 RETURNING {USER_COLUMNS}"
        ))
        .bind(user_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "User"))?;
        record.to_domain()
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = $1")
            .bind(user_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {user_id} not found")));
        }
        Ok(())
    }

    async fn record_donation(&self, user_id: Uuid, donated_at: DateTime<Utc>) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE users SET last_donation = $2, donation_count = donation_count + 1, \
             is_verified = TRUE WHERE id = $1",
        )
        .bind(user_id)
        .bind(donated_at)
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!("User {user_id} not found")));
        }
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        sqlx::query("INSERT INTO auth_sessions (id, user_id, expires_at) VALUES ($1, $2, $3)")
            .bind(session_id)
            .bind(user_id)
            .bind(expires_at)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        sqlx::query_scalar::<_, Uuid>(
            "SELECT user_id FROM auth_sessions WHERE id = $1 AND expires_at > now()",
        )
        .bind(session_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::RowNotFound => PortError::Unauthorized,
            _ => unexpected(e),
        })
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        sqlx::query("DELETE FROM auth_sessions WHERE id = $1")
            .bind(session_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        Ok(())
    }

    async fn create_appointment(
        &self,
        donor_id: Uuid,
        center_id: Uuid,
        date: DateTime<Utc>,
        notes: String,
    ) -> PortResult<Appointment> {
        let record = sqlx::query_as::<_, AppointmentRecord>(&format!(
            "INSERT INTO appointments (id, donor_id, center_id, date, notes) \
             VALUES ($1, $2, $3, $4, $5) RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(donor_id)
        .bind(center_id)
        .bind(date)
        .bind(notes)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> PortResult<Appointment> {
        let record = sqlx::query_as::<_, AppointmentRecord>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE id = $1"
        ))
        .bind(appointment_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "Appointment"))?;
        record.to_domain()
    }

    async fn appointments_for_donor(&self, donor_id: Uuid) -> PortResult<Vec<Appointment>> {
        let records = sqlx::query_as::<_, AppointmentRecord>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments WHERE donor_id = $1 ORDER BY date DESC"
        ))
        .bind(donor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn completed_appointments_for_donor(
        &self,
        donor_id: Uuid,
    ) -> PortResult<Vec<Appointment>> {
        let records = sqlx::query_as::<_, AppointmentRecord>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments \
             WHERE donor_id = $1 AND status = 'completed' ORDER BY date DESC"
        ))
        .bind(donor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn list_appointments(&self) -> PortResult<Vec<Appointment>> {
        let records = sqlx::query_as::<_, AppointmentRecord>(&format!(
            "SELECT {APPOINTMENT_COLUMNS} FROM appointments ORDER BY date DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_appointment(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        notes: Option<String>,
    ) -> PortResult<Appointment> {
        let record = sqlx::query_as::<_, AppointmentRecord>(&format!(
            "UPDATE appointments SET status = $2, notes = COALESCE($3, notes) \
             WHERE id = $1 RETURNING {APPOINTMENT_COLUMNS}"
        ))
        .bind(appointment_id)
        .bind(status.code())
        .bind(notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "Appointment"))?;
        record.to_domain()
    }

    async fn delete_appointment(&self, appointment_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM appointments WHERE id = $1")
            .bind(appointment_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Appointment {appointment_id} not found"
            )));
        }
        Ok(())
    }

    async fn create_blood_request(&self, new_request: NewBloodRequest) -> PortResult<BloodRequest> {
        let record = sqlx::query_as::<_, BloodRequestRecord>(&format!(
            "INSERT INTO blood_requests \
                (id, recipient_id, blood_type, quantity, urgency, hospital, location, notes) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8) RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(new_request.recipient_id)
        .bind(new_request.blood_type.code())
        .bind(new_request.quantity)
        .bind(new_request.urgency.code())
        .bind(&new_request.hospital)
        .bind(&new_request.location)
        .bind(&new_request.notes)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn blood_requests_for_recipient(
        &self,
        recipient_id: Uuid,
    ) -> PortResult<Vec<BloodRequest>> {
        let records = sqlx::query_as::<_, BloodRequestRecord>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM blood_requests \
             WHERE recipient_id = $1 ORDER BY created_at DESC"
        ))
        .bind(recipient_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn approved_blood_requests(&self) -> PortResult<Vec<BloodRequest>> {
        let records = sqlx::query_as::<_, BloodRequestRecord>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM blood_requests \
             WHERE status = 'approved' ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn list_blood_requests(&self) -> PortResult<Vec<BloodRequest>> {
        let records = sqlx::query_as::<_, BloodRequestRecord>(&format!(
            "SELECT {REQUEST_COLUMNS} FROM blood_requests ORDER BY created_at DESC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn update_blood_request(
        &self,
        request_id: Uuid,
        status: RequestStatus,
        notes: Option<String>,
    ) -> PortResult<BloodRequest> {
        let record = sqlx::query_as::<_, BloodRequestRecord>(&format!(
            "UPDATE blood_requests SET status = $2, notes = COALESCE($3, notes) \
             WHERE id = $1 RETURNING {REQUEST_COLUMNS}"
        ))
        .bind(request_id)
        .bind(status.code())
        .bind(notes)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "Blood request"))?;
        record.to_domain()
    }

    async fn list_centers(&self) -> PortResult<Vec<DonationCenter>> {
        let records = sqlx::query_as::<_, CenterRecord>(&format!(
            "SELECT {CENTER_COLUMNS} FROM donation_centers ORDER BY name ASC"
        ))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_center(&self, center_id: Uuid) -> PortResult<DonationCenter> {
        let record = sqlx::query_as::<_, CenterRecord>(&format!(
            "SELECT {CENTER_COLUMNS} FROM donation_centers WHERE id = $1"
        ))
        .bind(center_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "Donation center"))?;
        record.to_domain()
    }

    async fn create_center(&self, new_center: NewDonationCenter) -> PortResult<DonationCenter> {
        let operating_hours = serde_json::to_string(&new_center.operating_hours)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let record = sqlx::query_as::<_, CenterRecord>(&format!(
            "INSERT INTO donation_centers \
                (id, name, address, city, state, zip_code, phone, email, operating_hours, latitude, longitude) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {CENTER_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new_center.name)
        .bind(&new_center.address)
        .bind(&new_center.city)
        .bind(&new_center.state)
        .bind(&new_center.zip_code)
        .bind(&new_center.phone)
        .bind(&new_center.email)
        .bind(operating_hours)
        .bind(new_center.latitude)
        .bind(new_center.longitude)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn update_center(
        &self,
        center_id: Uuid,
        center: NewDonationCenter,
    ) -> PortResult<DonationCenter> {
        let operating_hours = serde_json::to_string(&center.operating_hours)
            .map_err(|e| PortError::Unexpected(e.to_string()))?;
        let record = sqlx::query_as::<_, CenterRecord>(&format!(
            "UPDATE donation_centers SET \
                name = $2, address = $3, city = $4, state = $5, zip_code = $6, \
                phone = $7, email = $8, operating_hours = $9, latitude = $10, longitude = $11 \
             WHERE id = $1 RETURNING {CENTER_COLUMNS}"
        ))
        .bind(center_id)
        .bind(&center.name)
        .bind(&center.address)
        .bind(&center.city)
        .bind(&center.state)
        .bind(&center.zip_code)
        .bind(&center.phone)
        .bind(&center.email)
        .bind(operating_hours)
        .bind(center.latitude)
        .bind(center.longitude)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "Donation center"))?;
        record.to_domain()
    }

    async fn create_campaign(&self, new_campaign: NewCampaign) -> PortResult<Campaign> {
        let codes: Vec<String> = new_campaign
            .blood_types_needed
            .iter()
            .map(|b| b.code().to_string())
            .collect();
        let record = sqlx::query_as::<_, CampaignRecord>(&format!(
            "INSERT INTO campaigns \
                (id, title, description, start_date, end_date, location, blood_types_needed, \
                 goal, image, organizer_id, status) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11) RETURNING {CAMPAIGN_COLUMNS}"
        ))
        .bind(Uuid::new_v4())
        .bind(&new_campaign.title)
        .bind(&new_campaign.description)
        .bind(new_campaign.start_date)
        .bind(new_campaign.end_date)
        .bind(&new_campaign.location)
        .bind(codes)
        .bind(new_campaign.goal)
        .bind(&new_campaign.image)
        .bind(new_campaign.organizer_id)
        .bind(new_campaign.status.code())
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        record.to_domain()
    }

    async fn list_campaigns(&self, status: Option<CampaignStatus>) -> PortResult<Vec<Campaign>> {
        let records = sqlx::query_as::<_, CampaignRecord>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns \
             WHERE ($1::text IS NULL OR status = $1) ORDER BY start_date ASC"
        ))
        .bind(status.map(|s| s.code()))
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn get_campaign(&self, campaign_id: Uuid) -> PortResult<Campaign> {
        let record = sqlx::query_as::<_, CampaignRecord>(&format!(
            "SELECT {CAMPAIGN_COLUMNS} FROM campaigns WHERE id = $1"
        ))
        .bind(campaign_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "Campaign"))?;
        record.to_domain()
    }

    async fn update_campaign(
        &self,
        campaign_id: Uuid,
        update: CampaignUpdate,
    ) -> PortResult<Campaign> {
        let codes: Option<Vec<String>> = update
            .blood_types_needed
            .map(|types| types.iter().map(|b| b.code().to_string()).collect());
        let record = sqlx::query_as::<_, CampaignRecord>(&format!(
            "UPDATE campaigns SET \
                title = COALESCE($2, title), \
                description = COALESCE($3, description), \
                start_date = COALESCE($4, start_date), \
                end_date = COALESCE($5, end_date), \
                location = COALESCE($6, location), \
                blood_types_needed = COALESCE($7::text[], blood_types_needed), \
                goal = COALESCE($8, goal), \
                image = COALESCE($9, image), \
                status = COALESCE($10, status) \
             WHERE id = $1 RETURNING {CAMPAIGN_COLUMNS}"
        ))
        .bind(campaign_id)
        .bind(update.title)
        .bind(update.description)
        .bind(update.start_date)
        .bind(update.end_date)
        .bind(update.location)
        .bind(codes)
        .bind(update.goal)
        .bind(update.image)
        .bind(update.status.map(|s| s.code()))
        .fetch_one(&self.pool)
        .await
        .map_err(|e| not_found_or(e, "Campaign"))?;
        record.to_domain()
    }

    async fn delete_campaign(&self, campaign_id: Uuid) -> PortResult<()> {
        let result = sqlx::query("DELETE FROM campaigns WHERE id = $1")
            .bind(campaign_id)
            .execute(&self.pool)
            .await
            .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound(format!(
                "Campaign {campaign_id} not found"
            )));
        }
        Ok(())
    }

    async fn campaign_participants(
        &self,
        campaign_id: Uuid,
    ) -> PortResult<Vec<CampaignParticipant>> {
        let records = sqlx::query_as::<_, ParticipantRecord>(
            "SELECT campaign_id, donor_id, signup_date, status FROM campaign_participants \
             WHERE campaign_id = $1 ORDER BY signup_date ASC",
        )
        .bind(campaign_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn add_campaign_participant(
        &self,
        campaign_id: Uuid,
        donor_id: Uuid,
    ) -> PortResult<CampaignParticipant> {
        let record = sqlx::query_as::<_, ParticipantRecord>(
            "INSERT INTO campaign_participants (campaign_id, donor_id) VALUES ($1, $2) \
             RETURNING campaign_id, donor_id, signup_date, status",
        )
        .bind(campaign_id)
        .bind(donor_id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match &e {
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                PortError::Conflict("Donor is already signed up for this campaign".to_string())
            }
            _ => unexpected(e),
        })?;
        record.to_domain()
    }

    async fn set_participant_status(
        &self,
        campaign_id: Uuid,
        donor_id: Uuid,
        status: ParticipantStatus,
    ) -> PortResult<()> {
        let result = sqlx::query(
            "UPDATE campaign_participants SET status = $3 \
             WHERE campaign_id = $1 AND donor_id = $2",
        )
        .bind(campaign_id)
        .bind(donor_id)
        .bind(status.code())
        .execute(&self.pool)
        .await
        .map_err(unexpected)?;
        if result.rows_affected() == 0 {
            return Err(PortError::NotFound("Participant not found".to_string()));
        }
        Ok(())
    }

    async fn campaigns_for_donor(&self, donor_id: Uuid) -> PortResult<Vec<Campaign>> {
        let records = sqlx::query_as::<_, CampaignRecord>(
            "SELECT c.id, c.title, c.description, c.start_date, c.end_date, c.location, \
                    c.blood_types_needed, c.goal, c.image, c.organizer_id, c.status, c.created_at \
             FROM campaigns c \
             JOIN campaign_participants p ON p.campaign_id = c.id \
             WHERE p.donor_id = $1 ORDER BY c.start_date ASC",
        )
        .bind(donor_id)
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        records.into_iter().map(|r| r.to_domain()).collect()
    }

    async fn create_feedback(
        &self,
        user_id: Uuid,
        rating: i32,
        comment: String,
    ) -> PortResult<Feedback> {
        let record = sqlx::query_as::<_, FeedbackRecord>(
            "INSERT INTO feedback (id, user_id, rating, comment) VALUES ($1, $2, $3, $4) \
             RETURNING id, user_id, rating, comment, created_at",
        )
        .bind(Uuid::new_v4())
        .bind(user_id)
        .bind(rating)
        .bind(comment)
        .fetch_one(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(record.to_domain())
    }

    async fn list_feedback(&self) -> PortResult<Vec<Feedback>> {
        let records = sqlx::query_as::<_, FeedbackRecord>(
            "SELECT id, user_id, rating, comment, created_at FROM feedback \
             ORDER BY created_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(unexpected)?;
        Ok(records.into_iter().map(|r| r.to_domain()).collect())
    }
}
