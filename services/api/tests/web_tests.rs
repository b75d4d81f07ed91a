//! Handler tests over the full router, mounted on an in-memory
//! implementation of the `DatabaseService` port. No database or network is
//! involved; requests go through `tower::ServiceExt::oneshot`.

use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    response::Response,
    Router,
};
use chrono::{DateTime, Duration, Utc};
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tower::ServiceExt;
use tracing::Level;
use uuid::Uuid;

use api_lib::config::Config;
use api_lib::web::{build_router, state::AppState};
use bloodlink_core::domain::{
    Appointment, AppointmentStatus, AuthSession, BloodRequest, BloodType, Campaign,
    CampaignParticipant, CampaignStatus, DonationCenter, Feedback, ParticipantStatus,
    RequestStatus, Role, Urgency, User, UserCredentials, UserType,
};
use bloodlink_core::ports::{
    CampaignUpdate, DatabaseService, DonorFilter, NewBloodRequest, NewCampaign, NewDonationCenter,
    NewUser, PortError, PortResult, ProfileUpdate,
};

//=========================================================================================
// In-Memory Port Double
//=========================================================================================

/// Backs the router with plain vectors behind mutexes. Each method mirrors
/// the Postgres adapter's observable behavior (orderings, conflicts,
/// cascades) without any I/O.
#[derive(Default)]
struct MemoryDb {
    users: Mutex<Vec<User>>,
    credentials: Mutex<Vec<UserCredentials>>,
    sessions: Mutex<Vec<AuthSession>>,
    appointments: Mutex<Vec<Appointment>>,
    blood_requests: Mutex<Vec<BloodRequest>>,
    centers: Mutex<Vec<DonationCenter>>,
    campaigns: Mutex<Vec<Campaign>>,
    participants: Mutex<Vec<CampaignParticipant>>,
    feedback_entries: Mutex<Vec<Feedback>>,
}

#[async_trait]
impl DatabaseService for MemoryDb {
    async fn create_user(&self, new_user: NewUser) -> PortResult<User> {
        let mut users = self.users.lock().unwrap();
        if users.iter().any(|u| u.email == new_user.email) {
            return Err(PortError::Conflict("User already exists".to_string()));
        }
        let user = User {
            id: Uuid::new_v4(),
            name: new_user.name,
            email: new_user.email.clone(),
            phone: new_user.phone,
            user_type: new_user.user_type,
            blood_type: new_user.blood_type,
            location: new_user.location,
            last_donation: None,
            role: Role::User,
            is_verified: false,
            donation_count: 0,
            created_at: Utc::now(),
        };
        self.credentials.lock().unwrap().push(UserCredentials {
            user_id: user.id,
            email: new_user.email,
            hashed_password: new_user.hashed_password,
        });
        users.push(user.clone());
        Ok(user)
    }

    async fn get_user_by_id(&self, user_id: Uuid) -> PortResult<User> {
        self.users
            .lock()
            .unwrap()
            .iter()
            .find(|u| u.id == user_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))
    }

    async fn get_user_by_email(&self, email: &str) -> PortResult<UserCredentials> {
        self.credentials
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.email == email)
            .cloned()
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))
    }

    async fn update_profile(&self, user_id: Uuid, update: ProfileUpdate) -> PortResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))?;
        if let Some(name) = update.name {
            user.name = name;
        }
        if let Some(phone) = update.phone {
            user.phone = phone;
        }
        if let Some(location) = update.location {
            user.location = location;
        }
        if let Some(blood_type) = update.blood_type {
            user.blood_type = Some(blood_type);
        }
        Ok(user.clone())
    }

    async fn list_donors(&self, filter: DonorFilter) -> PortResult<Vec<User>> {
        let mut donors: Vec<User> = self
            .users
            .lock()
            .unwrap()
            .iter()
            .filter(|u| u.user_type == UserType::Donor)
            .filter(|u| filter.blood_type.is_none() || u.blood_type == filter.blood_type)
            .filter(|u| match &filter.location {
                Some(needle) => u.location.to_lowercase().contains(&needle.to_lowercase()),
                None => true,
            })
            .filter(|u| !filter.verified_only || u.is_verified)
            .cloned()
            .collect();
        donors.sort_by(|a, b| {
            b.is_verified
                .cmp(&a.is_verified)
                .then_with(|| a.name.cmp(&b.name))
        });
        Ok(donors)
    }

    async fn list_users(&self) -> PortResult<Vec<User>> {
        Ok(self.users.lock().unwrap().clone())
    }

    async fn set_donor_verified(&self, user_id: Uuid) -> PortResult<User> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| PortError::NotFound("User not found".to_string()))?;
        user.is_verified = true;
        Ok(user.clone())
    }

    async fn delete_user(&self, user_id: Uuid) -> PortResult<()> {
        let mut users = self.users.lock().unwrap();
        let before = users.len();
        users.retain(|u| u.id != user_id);
        if users.len() == before {
            return Err(PortError::NotFound(format!("User {user_id} not found")));
        }
        // Mirror the schema's ON DELETE CASCADE.
        self.credentials.lock().unwrap().retain(|c| c.user_id != user_id);
        self.sessions.lock().unwrap().retain(|s| s.user_id != user_id);
        self.appointments.lock().unwrap().retain(|a| a.donor_id != user_id);
        self.blood_requests
            .lock()
            .unwrap()
            .retain(|r| r.recipient_id != user_id);
        self.participants
            .lock()
            .unwrap()
            .retain(|p| p.donor_id != user_id);
        self.feedback_entries
            .lock()
            .unwrap()
            .retain(|f| f.user_id != user_id);
        Ok(())
    }

    async fn record_donation(&self, user_id: Uuid, donated_at: DateTime<Utc>) -> PortResult<()> {
        let mut users = self.users.lock().unwrap();
        let user = users
            .iter_mut()
            .find(|u| u.id == user_id)
            .ok_or_else(|| PortError::NotFound(format!("User {user_id} not found")))?;
        user.last_donation = Some(donated_at);
        user.donation_count += 1;
        user.is_verified = true;
        Ok(())
    }

    async fn create_auth_session(
        &self,
        session_id: &str,
        user_id: Uuid,
        expires_at: DateTime<Utc>,
    ) -> PortResult<()> {
        self.sessions.lock().unwrap().push(AuthSession {
            id: session_id.to_string(),
            user_id,
            expires_at,
        });
        Ok(())
    }

    async fn validate_auth_session(&self, session_id: &str) -> PortResult<Uuid> {
        self.sessions
            .lock()
            .unwrap()
            .iter()
            .find(|s| s.id == session_id && s.expires_at > Utc::now())
            .map(|s| s.user_id)
            .ok_or(PortError::Unauthorized)
    }

    async fn delete_auth_session(&self, session_id: &str) -> PortResult<()> {
        self.sessions.lock().unwrap().retain(|s| s.id != session_id);
        Ok(())
    }

    async fn create_appointment(
        &self,
        donor_id: Uuid,
        center_id: Uuid,
        date: DateTime<Utc>,
        notes: String,
    ) -> PortResult<Appointment> {
        let appointment = Appointment {
            id: Uuid::new_v4(),
            donor_id,
            center_id,
            date,
            status: AppointmentStatus::Scheduled,
            notes,
            created_at: Utc::now(),
        };
        self.appointments.lock().unwrap().push(appointment.clone());
        Ok(appointment)
    }

    async fn get_appointment(&self, appointment_id: Uuid) -> PortResult<Appointment> {
        self.appointments
            .lock()
            .unwrap()
            .iter()
            .find(|a| a.id == appointment_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Appointment not found".to_string()))
    }

    async fn appointments_for_donor(&self, donor_id: Uuid) -> PortResult<Vec<Appointment>> {
        let mut appointments: Vec<Appointment> = self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.donor_id == donor_id)
            .cloned()
            .collect();
        appointments.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(appointments)
    }

    async fn completed_appointments_for_donor(
        &self,
        donor_id: Uuid,
    ) -> PortResult<Vec<Appointment>> {
        let mut appointments: Vec<Appointment> = self
            .appointments
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.donor_id == donor_id && a.status == AppointmentStatus::Completed)
            .cloned()
            .collect();
        appointments.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(appointments)
    }

    async fn list_appointments(&self) -> PortResult<Vec<Appointment>> {
        let mut appointments = self.appointments.lock().unwrap().clone();
        appointments.sort_by(|a, b| b.date.cmp(&a.date));
        Ok(appointments)
    }

    async fn update_appointment(
        &self,
        appointment_id: Uuid,
        status: AppointmentStatus,
        notes: Option<String>,
    ) -> PortResult<Appointment> {
        let mut appointments = self.appointments.lock().unwrap();
        let appointment = appointments
            .iter_mut()
            .find(|a| a.id == appointment_id)
            .ok_or_else(|| PortError::NotFound("Appointment not found".to_string()))?;
        appointment.status = status;
        if let Some(notes) = notes {
            appointment.notes = notes;
        }
        Ok(appointment.clone())
    }

    async fn delete_appointment(&self, appointment_id: Uuid) -> PortResult<()> {
        let mut appointments = self.appointments.lock().unwrap();
        let before = appointments.len();
        appointments.retain(|a| a.id != appointment_id);
        if appointments.len() == before {
            return Err(PortError::NotFound(format!(
                "Appointment {appointment_id} not found"
            )));
        }
        Ok(())
    }

    async fn create_blood_request(&self, new_request: NewBloodRequest) -> PortResult<BloodRequest> {
        let request = BloodRequest {
            id: Uuid::new_v4(),
            recipient_id: new_request.recipient_id,
            blood_type: new_request.blood_type,
            quantity: new_request.quantity,
            urgency: new_request.urgency,
            hospital: new_request.hospital,
            location: new_request.location,
            status: RequestStatus::Pending,
            notes: new_request.notes,
            created_at: Utc::now(),
        };
        self.blood_requests.lock().unwrap().push(request.clone());
        Ok(request)
    }

    async fn blood_requests_for_recipient(
        &self,
        recipient_id: Uuid,
    ) -> PortResult<Vec<BloodRequest>> {
        let mut requests: Vec<BloodRequest> = self
            .blood_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.recipient_id == recipient_id)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn approved_blood_requests(&self) -> PortResult<Vec<BloodRequest>> {
        let mut requests: Vec<BloodRequest> = self
            .blood_requests
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.status == RequestStatus::Approved)
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn list_blood_requests(&self) -> PortResult<Vec<BloodRequest>> {
        let mut requests = self.blood_requests.lock().unwrap().clone();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(requests)
    }

    async fn update_blood_request(
        &self,
        request_id: Uuid,
        status: RequestStatus,
        notes: Option<String>,
    ) -> PortResult<BloodRequest> {
        let mut requests = self.blood_requests.lock().unwrap();
        let request = requests
            .iter_mut()
            .find(|r| r.id == request_id)
            .ok_or_else(|| PortError::NotFound("Blood request not found".to_string()))?;
        request.status = status;
        if let Some(notes) = notes {
            request.notes = notes;
        }
        Ok(request.clone())
    }

    async fn list_centers(&self) -> PortResult<Vec<DonationCenter>> {
        let mut centers = self.centers.lock().unwrap().clone();
        centers.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(centers)
    }

    async fn get_center(&self, center_id: Uuid) -> PortResult<DonationCenter> {
        self.centers
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == center_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Donation center not found".to_string()))
    }

    async fn create_center(&self, new_center: NewDonationCenter) -> PortResult<DonationCenter> {
        let center = DonationCenter {
            id: Uuid::new_v4(),
            name: new_center.name,
            address: new_center.address,
            city: new_center.city,
            state: new_center.state,
            zip_code: new_center.zip_code,
            phone: new_center.phone,
            email: new_center.email,
            operating_hours: new_center.operating_hours,
            latitude: new_center.latitude,
            longitude: new_center.longitude,
        };
        self.centers.lock().unwrap().push(center.clone());
        Ok(center)
    }

    async fn update_center(
        &self,
        center_id: Uuid,
        center: NewDonationCenter,
    ) -> PortResult<DonationCenter> {
        let mut centers = self.centers.lock().unwrap();
        let existing = centers
            .iter_mut()
            .find(|c| c.id == center_id)
            .ok_or_else(|| PortError::NotFound("Donation center not found".to_string()))?;
        *existing = DonationCenter {
            id: center_id,
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
        };
        Ok(existing.clone())
    }

    async fn create_campaign(&self, new_campaign: NewCampaign) -> PortResult<Campaign> {
        let campaign = Campaign {
            id: Uuid::new_v4(),
            title: new_campaign.title,
            description: new_campaign.description,
            start_date: new_campaign.start_date,
            end_date: new_campaign.end_date,
            location: new_campaign.location,
            blood_types_needed: new_campaign.blood_types_needed,
            goal: new_campaign.goal,
            image: new_campaign.image,
            organizer_id: new_campaign.organizer_id,
            status: new_campaign.status,
            created_at: Utc::now(),
        };
        self.campaigns.lock().unwrap().push(campaign.clone());
        Ok(campaign)
    }

    async fn list_campaigns(&self, status: Option<CampaignStatus>) -> PortResult<Vec<Campaign>> {
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .lock()
            .unwrap()
            .iter()
            .filter(|c| status.is_none() || Some(c.status) == status)
            .cloned()
            .collect();
        campaigns.sort_by(|a, b| a.start_date.cmp(&b.start_date));
        Ok(campaigns)
    }

    async fn get_campaign(&self, campaign_id: Uuid) -> PortResult<Campaign> {
        self.campaigns
            .lock()
            .unwrap()
            .iter()
            .find(|c| c.id == campaign_id)
            .cloned()
            .ok_or_else(|| PortError::NotFound("Campaign not found".to_string()))
    }

    async fn update_campaign(
        &self,
        campaign_id: Uuid,
        update: CampaignUpdate,
    ) -> PortResult<Campaign> {
        let mut campaigns = self.campaigns.lock().unwrap();
        let campaign = campaigns
            .iter_mut()
            .find(|c| c.id == campaign_id)
            .ok_or_else(|| PortError::NotFound("Campaign not found".to_string()))?;
        if let Some(title) = update.title {
            campaign.title = title;
        }
        if let Some(description) = update.description {
            campaign.description = description;
        }
        if let Some(start_date) = update.start_date {
            campaign.start_date = start_date;
        }
        if let Some(end_date) = update.end_date {
            campaign.end_date = end_date;
        }
        if let Some(location) = update.location {
            campaign.location = location;
        }
        if let Some(blood_types_needed) = update.blood_types_needed {
            campaign.blood_types_needed = blood_types_needed;
        }
        if let Some(goal) = update.goal {
            campaign.goal = goal;
        }
        if let Some(image) = update.image {
            campaign.image = image;
        }
        if let Some(status) = update.status {
            campaign.status = status;
        }
        Ok(campaign.clone())
    }

    async fn delete_campaign(&self, campaign_id: Uuid) -> PortResult<()> {
        let mut campaigns = self.campaigns.lock().unwrap();
        let before = campaigns.len();
        campaigns.retain(|c| c.id != campaign_id);
        if campaigns.len() == before {
            return Err(PortError::NotFound(format!(
                "Campaign {campaign_id} not found"
            )));
        }
        self.participants
            .lock()
            .unwrap()
            .retain(|p| p.campaign_id != campaign_id);
        Ok(())
    }

    async fn campaign_participants(
        &self,
        campaign_id: Uuid,
    ) -> PortResult<Vec<CampaignParticipant>> {
        let mut participants: Vec<CampaignParticipant> = self
            .participants
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.campaign_id == campaign_id)
            .cloned()
            .collect();
        participants.sort_by(|a, b| a.signup_date.cmp(&b.signup_date));
        Ok(participants)
    }

    async fn add_campaign_participant(
        &self,
        campaign_id: Uuid,
        donor_id: Uuid,
    ) -> PortResult<CampaignParticipant> {
        let mut participants = self.participants.lock().unwrap();
        if participants
            .iter()
            .any(|p| p.campaign_id == campaign_id && p.donor_id == donor_id)
        {
            return Err(PortError::Conflict(
                "Donor is already signed up for this campaign".to_string(),
            ));
        }
        let participant = CampaignParticipant {
            campaign_id,
            donor_id,
            signup_date: Utc::now(),
            status: ParticipantStatus::Signed,
        };
        participants.push(participant.clone());
        Ok(participant)
    }

    async fn set_participant_status(
        &self,
        campaign_id: Uuid,
        donor_id: Uuid,
        status: ParticipantStatus,
    ) -> PortResult<()> {
        let mut participants = self.participants.lock().unwrap();
        let participant = participants
            .iter_mut()
            .find(|p| p.campaign_id == campaign_id && p.donor_id == donor_id)
            .ok_or_else(|| PortError::NotFound("Participant not found".to_string()))?;
        participant.status = status;
        Ok(())
    }

    async fn campaigns_for_donor(&self, donor_id: Uuid) -> PortResult<Vec<Campaign>> {
        let signed: Vec<Uuid> = self
            .participants
            .lock()
            .unwrap()
            .iter()
            .filter(|p| p.donor_id == donor_id)
            .map(|p| p.campaign_id)
            .collect();
        let mut campaigns: Vec<Campaign> = self
            .campaigns
            .lock()
            .unwrap()
            .iter()
            .filter(|c| signed.contains(&c.id))
            .cloned()
            .collect();
        campaigns.sort_by(|a, b| a.start_date.cmp(&b.start_date));
        Ok(campaigns)
    }

    async fn create_feedback(
        &self,
        user_id: Uuid,
        rating: i32,
        comment: String,
    ) -> PortResult<Feedback> {
        let entry = Feedback {
            id: Uuid::new_v4(),
            user_id,
            rating,
            comment,
            created_at: Utc::now(),
        };
        self.feedback_entries.lock().unwrap().push(entry.clone());
        Ok(entry)
    }

    async fn list_feedback(&self) -> PortResult<Vec<Feedback>> {
        let mut entries = self.feedback_entries.lock().unwrap().clone();
        entries.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(entries)
    }
}

//=========================================================================================
// Test Harness
//=========================================================================================

fn test_config() -> Config {
    Config {
        bind_address: "127.0.0.1:0".parse().unwrap(),
        database_url: String::new(),
        log_level: Level::INFO,
        cors_origin: "http://localhost:5173".to_string(),
        session_ttl_days: 7,
    }
}

fn test_app() -> (Router, Arc<MemoryDb>) {
    let db = Arc::new(MemoryDb::default());
    let state = Arc::new(AppState {
        db: db.clone(),
        config: Arc::new(test_config()),
    });
    (build_router(state).unwrap(), db)
}

fn seed_user(
    db: &MemoryDb,
    user_type: UserType,
    role: Role,
    blood_type: Option<BloodType>,
    last_donation: Option<DateTime<Utc>>,
) -> (Uuid, String) {
    let id = Uuid::new_v4();
    db.users.lock().unwrap().push(User {
        id,
        name: format!("user-{id}"),
        email: format!("{id}@example.com"),
        phone: "555-0100".to_string(),
        user_type,
        blood_type,
        location: "Springfield".to_string(),
        last_donation,
        role,
        is_verified: false,
        donation_count: 0,
        created_at: Utc::now(),
    });
    let session_id = Uuid::new_v4().to_string();
    db.sessions.lock().unwrap().push(AuthSession {
        id: session_id.clone(),
        user_id: id,
        expires_at: Utc::now() + Duration::days(1),
    });
    (id, format!("session={session_id}"))
}

fn seed_center(db: &MemoryDb) -> Uuid {
    let id = Uuid::new_v4();
    db.centers.lock().unwrap().push(DonationCenter {
        id,
        name: "Central Blood Bank".to_string(),
        address: "1 Main St".to_string(),
        city: "Springfield".to_string(),
        state: "IL".to_string(),
        zip_code: "62701".to_string(),
        phone: "555-0101".to_string(),
        email: "central@example.com".to_string(),
        operating_hours: HashMap::new(),
        latitude: 39.8,
        longitude: -89.6,
    });
    id
}

fn seed_request(db: &MemoryDb, blood_type: BloodType, urgency: Urgency, created_at: DateTime<Utc>) {
    db.blood_requests.lock().unwrap().push(BloodRequest {
        id: Uuid::new_v4(),
        recipient_id: Uuid::new_v4(),
        blood_type,
        quantity: 2,
        urgency,
        hospital: "General Hospital".to_string(),
        location: "Springfield".to_string(),
        status: RequestStatus::Approved,
        notes: String::new(),
        created_at,
    });
}

fn get(uri: &str, cookie: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().method("GET").uri(uri);
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::empty()).unwrap()
}

fn post_json(uri: &str, cookie: Option<&str>, body: &Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(cookie) = cookie {
        builder = builder.header(header::COOKIE, cookie);
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn send(app: &Router, request: Request<Body>) -> Response {
    app.clone().oneshot(request).await.unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap_or(Value::Null)
}

/// The `session=<id>` pair from a Set-Cookie header.
fn session_cookie(response: &Response) -> String {
    response
        .headers()
        .get(header::SET_COOKIE)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(';').next())
        .expect("response should carry a session cookie")
        .to_string()
}

//=========================================================================================
// Tests
//=========================================================================================

#[tokio::test]
async fn register_login_logout_round_trip() {
    let (app, _db) = test_app();

    let response = send(
        &app,
        post_json(
            "/api/auth/register",
            None,
            &json!({
                "name": "Avery Donor",
                "email": "Avery@Example.com",
                "password": "hunter22",
                "phone": "555-0102",
                "user_type": "donor",
                "blood_type": "O-",
                "location": "Springfield"
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let cookie = session_cookie(&response);
    let body = body_json(response).await;
    // Emails are stored lowercased.
    assert_eq!(body["email"], "avery@example.com");
    assert_eq!(body["blood_type"], "O-");

    let response = send(&app, get("/api/users/me", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["name"], "Avery Donor");

    // A fresh session from login works too.
    let response = send(
        &app,
        post_json(
            "/api/auth/login",
            None,
            &json!({"email": "avery@example.com", "password": "hunter22"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let login_cookie = session_cookie(&response);

    let response = send(
        &app,
        post_json(
            "/api/auth/login",
            None,
            &json!({"email": "avery@example.com", "password": "wrong"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Logout invalidates the session.
    let response = send(&app, post_json("/api/auth/logout", Some(&login_cookie), &json!({}))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let response = send(&app, get("/api/users/me", Some(&login_cookie))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_routes_require_a_session() {
    let (app, _db) = test_app();

    let response = send(&app, get("/api/users/me", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = send(&app, get("/api/users/me", Some("session=bogus"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    // Public routes stay open.
    let response = send(&app, get("/api/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn booking_is_gated_by_donation_eligibility() {
    let (app, db) = test_app();
    let center_id = seed_center(&db);

    // Donated 20 days ago: still inside the 56-day window.
    let (_, recent_cookie) = seed_user(
        &db,
        UserType::Donor,
        Role::User,
        Some(BloodType::APos),
        Some(Utc::now() - Duration::days(20)),
    );
    let payload = json!({
        "center_id": center_id,
        "date": (Utc::now() + Duration::days(3)).to_rfc3339(),
    });
    let response = send(&app, post_json("/api/appointments", Some(&recent_cookie), &payload)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    // Donated 56 days ago: the boundary itself is eligible.
    let (_, boundary_cookie) = seed_user(
        &db,
        UserType::Donor,
        Role::User,
        Some(BloodType::APos),
        Some(Utc::now() - Duration::days(56)),
    );
    let response = send(&app, post_json("/api/appointments", Some(&boundary_cookie), &payload)).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // Never donated: eligible by default.
    let (_, fresh_cookie) = seed_user(&db, UserType::Donor, Role::User, Some(BloodType::ONeg), None);
    let response = send(&app, post_json("/api/appointments", Some(&fresh_cookie), &payload)).await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    assert_eq!(body["status"], "scheduled");
    assert_eq!(body["donation_center"]["name"], "Central Blood Bank");

    // Recipients cannot book at all.
    let (_, recipient_cookie) = seed_user(&db, UserType::Recipient, Role::User, None, None);
    let response = send(&app, post_json("/api/appointments", Some(&recipient_cookie), &payload)).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn completing_an_appointment_stamps_the_donor() {
    let (app, db) = test_app();
    let center_id = seed_center(&db);
    let (donor_id, cookie) = seed_user(&db, UserType::Donor, Role::User, Some(BloodType::BNeg), None);

    let response = send(
        &app,
        post_json(
            "/api/appointments",
            Some(&cookie),
            &json!({
                "center_id": center_id,
                "date": (Utc::now() + Duration::days(1)).to_rfc3339(),
            }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);
    let appointment_id = body_json(response).await["id"].as_str().unwrap().to_string();

    let request = Request::builder()
        .method("PUT")
        .uri(format!("/api/appointments/{appointment_id}"))
        .header(header::CONTENT_TYPE, "application/json")
        .header(header::COOKIE, &cookie)
        .body(Body::from(json!({"status": "completed"}).to_string()))
        .unwrap();
    let response = send(&app, request).await;
    assert_eq!(response.status(), StatusCode::OK);

    let donor = db
        .users
        .lock()
        .unwrap()
        .iter()
        .find(|u| u.id == donor_id)
        .cloned()
        .unwrap();
    assert!(donor.last_donation.is_some());
    assert_eq!(donor.donation_count, 1);
    assert!(donor.is_verified);

    // Freshly stamped, the donor drops out of the eligible directory.
    let response = send(&app, get("/api/users/donors", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let listed = body_json(response).await;
    assert!(listed
        .as_array()
        .unwrap()
        .iter()
        .all(|u| u["id"] != json!(donor_id)));
}

#[tokio::test]
async fn available_requests_are_compatibility_filtered_and_urgency_ordered() {
    let (app, db) = test_app();
    let (_, cookie) = seed_user(&db, UserType::Donor, Role::User, Some(BloodType::OPos), None);

    let base = Utc::now() - Duration::hours(3);
    seed_request(&db, BloodType::OPos, Urgency::Low, base);
    seed_request(&db, BloodType::APos, Urgency::Critical, base + Duration::hours(1));
    seed_request(&db, BloodType::OPos, Urgency::High, base + Duration::hours(2));
    // An O+ donor cannot serve AB- no matter how urgent.
    seed_request(&db, BloodType::AbNeg, Urgency::Critical, base + Duration::minutes(30));

    let response = send(&app, get("/api/blood-requests/available", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let order: Vec<(String, String)> = body
        .as_array()
        .unwrap()
        .iter()
        .map(|r| {
            (
                r["blood_type"].as_str().unwrap().to_string(),
                r["urgency"].as_str().unwrap().to_string(),
            )
        })
        .collect();
    assert_eq!(
        order,
        vec![
            ("A+".to_string(), "critical".to_string()),
            ("O+".to_string(), "high".to_string()),
            ("O+".to_string(), "low".to_string()),
        ]
    );

    // Recipients are turned away from the donor-facing listing.
    let (_, recipient_cookie) = seed_user(&db, UserType::Recipient, Role::User, None, None);
    let response = send(&app, get("/api/blood-requests/available", Some(&recipient_cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn admin_routes_check_the_role_not_the_user_type() {
    let (app, db) = test_app();

    // An "admin" user type without the admin role gets nothing extra.
    let (_, pretender_cookie) = seed_user(&db, UserType::Admin, Role::User, None, None);
    let response = send(&app, get("/api/users/admin/all", Some(&pretender_cookie))).await;
    assert_eq!(response.status(), StatusCode::FORBIDDEN);

    let (_, admin_cookie) = seed_user(&db, UserType::Admin, Role::Admin, None, None);
    let response = send(&app, get("/api/users/admin/all", Some(&admin_cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await.as_array().unwrap().len(), 2);

    let response = send(&app, get("/api/users/admin/all", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn compatibility_endpoint_serves_both_views_from_one_table() {
    let (app, db) = test_app();
    let (_, cookie) = seed_user(&db, UserType::Donor, Role::User, Some(BloodType::ONeg), None);

    let response = send(&app, get("/api/compatibility/O-", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["can_donate_to"].as_array().unwrap().len(), 8);
    assert_eq!(body["can_receive_from"], json!(["O-"]));

    let response = send(&app, get("/api/compatibility/X+", Some(&cookie))).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
