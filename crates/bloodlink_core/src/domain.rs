//! crates/bloodlink_core/src/domain.rs
//!
//! Defines the pure, core data structures for the application.
//! These structs are independent of any database; the enums (de)serialize
//! through their canonical string codes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

//=========================================================================================
// Domain Errors
//=========================================================================================

/// Errors produced by the pure domain logic. These fail fast and are never
/// defaulted away.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DomainError {
    #[error("unrecognized blood type \"{0}\"")]
    InvalidBloodType(String),
    #[error("invalid timestamp: {0}")]
    InvalidTimestamp(String),
    #[error("\"{value}\" is not a valid {field}")]
    InvalidValue { field: &'static str, value: String },
}

//=========================================================================================
// Blood Types
//=========================================================================================

/// The eight standard blood types. The set is closed; an unrecognized code
/// surfaces as [`DomainError::InvalidBloodType`] at the parsing boundary and
/// invalid values are unrepresentable past it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum BloodType {
    ONeg,
    OPos,
    ANeg,
    APos,
    BNeg,
    BPos,
    AbNeg,
    AbPos,
}

impl BloodType {
    /// Every blood type, in canonical display order.
    pub const ALL: [BloodType; 8] = [
        BloodType::ONeg,
        BloodType::OPos,
        BloodType::ANeg,
        BloodType::APos,
        BloodType::BNeg,
        BloodType::BPos,
        BloodType::AbNeg,
        BloodType::AbPos,
    ];

    /// The canonical string code, e.g. `"O-"` or `"AB+"`.
    pub fn code(&self) -> &'static str {
        match self {
            BloodType::ONeg => "O-",
            BloodType::OPos => "O+",
            BloodType::ANeg => "A-",
            BloodType::APos => "A+",
            BloodType::BNeg => "B-",
            BloodType::BPos => "B+",
            BloodType::AbNeg => "AB-",
            BloodType::AbPos => "AB+",
        }
    }
}

impl fmt::Display for BloodType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for BloodType {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "O-" => Ok(BloodType::ONeg),
            "O+" => Ok(BloodType::OPos),
            "A-" => Ok(BloodType::ANeg),
            "A+" => Ok(BloodType::APos),
            "B-" => Ok(BloodType::BNeg),
            "B+" => Ok(BloodType::BPos),
            "AB-" => Ok(BloodType::AbNeg),
            "AB+" => Ok(BloodType::AbPos),
            other => Err(DomainError::InvalidBloodType(other.to_string())),
        }
    }
}

impl TryFrom<String> for BloodType {
    type Error = DomainError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<BloodType> for String {
    fn from(value: BloodType) -> Self {
        value.code().to_string()
    }
}

//=========================================================================================
// String-Coded Enumerations
//=========================================================================================

// Implements `code`/`Display`/`FromStr` plus the `String` conversions that
// serde's `try_from`/`into` attributes rely on, all from one code table.
macro_rules! str_enum {
    ($name:ident, $field:literal, { $($variant:ident => $code:literal),+ $(,)? }) => {
        impl $name {
            /// The canonical string code for this value.
            pub fn code(&self) -> &'static str {
                match self {
                    $($name::$variant => $code,)+
                }
            }
        }

        impl fmt::Display for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.code())
            }
        }

        impl FromStr for $name {
            type Err = DomainError;

            fn from_str(s: &str) -> Result<Self, Self::Err> {
                match s {
                    $($code => Ok($name::$variant),)+
                    other => Err(DomainError::InvalidValue {
                        field: $field,
                        value: other.to_string(),
                    }),
                }
            }
        }

        impl TryFrom<String> for $name {
            type Error = DomainError;

            fn try_from(value: String) -> Result<Self, Self::Error> {
                value.parse()
            }
        }

        impl From<$name> for String {
            fn from(value: $name) -> Self {
                value.code().to_string()
            }
        }
    };
}

/// How time-critical a blood request is. The declaration order gives
/// `low < medium < high < critical`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Urgency {
    Low,
    Medium,
    High,
    Critical,
}

str_enum!(Urgency, "urgency", {
    Low => "low",
    Medium => "medium",
    High => "high",
    Critical => "critical",
});

/// Lifecycle of a blood request, managed by the surrounding CRUD handlers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum RequestStatus {
    Pending,
    Approved,
    Fulfilled,
    Rejected,
}

str_enum!(RequestStatus, "request status", {
    Pending => "pending",
    Approved => "approved",
    Fulfilled => "fulfilled",
    Rejected => "rejected",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AppointmentStatus {
    Scheduled,
    Completed,
    Cancelled,
    NoShow,
}

str_enum!(AppointmentStatus, "appointment status", {
    Scheduled => "scheduled",
    Completed => "completed",
    Cancelled => "cancelled",
    NoShow => "no-show",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum CampaignStatus {
    Upcoming,
    Active,
    Completed,
    Cancelled,
}

str_enum!(CampaignStatus, "campaign status", {
    Upcoming => "upcoming",
    Active => "active",
    Completed => "completed",
    Cancelled => "cancelled",
});

impl CampaignStatus {
    /// The status implied by a campaign's date window at `now`. Cancellation
    /// is a manual state and never derived from dates.
    pub fn from_window(start: DateTime<Utc>, end: DateTime<Utc>, now: DateTime<Utc>) -> Self {
        if now < start {
            CampaignStatus::Upcoming
        } else if now <= end {
            CampaignStatus::Active
        } else {
            CampaignStatus::Completed
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ParticipantStatus {
    Signed,
    Donated,
    Cancelled,
}

str_enum!(ParticipantStatus, "participant status", {
    Signed => "signed",
    Donated => "donated",
    Cancelled => "cancelled",
});

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum UserType {
    Donor,
    Recipient,
    Admin,
}

str_enum!(UserType, "user type", {
    Donor => "donor",
    Recipient => "recipient",
    Admin => "admin",
});

/// Authorization role, independent of [`UserType`]. Admin routes check the
/// role, not the user type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Role {
    User,
    Admin,
}

str_enum!(Role, "role", {
    User => "user",
    Admin => "admin",
});

//=========================================================================================
// Entities
//=========================================================================================

/// Represents an account holder: donor, recipient, or administrator.
#[derive(Debug, Clone)]
pub struct User {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub user_type: UserType,
    /// Present for donors; recipients register without one.
    pub blood_type: Option<BloodType>,
    pub location: String,
    /// `None` means the donor has never donated and is eligible by default.
    pub last_donation: Option<DateTime<Utc>>,
    pub role: Role,
    pub is_verified: bool,
    pub donation_count: i32,
    pub created_at: DateTime<Utc>,
}

// Only used internally for login - contains sensitive data
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user_id: Uuid,
    pub email: String,
    pub hashed_password: String,
}

// Represents a browser login session (auth cookie)
#[derive(Debug, Clone)]
pub struct AuthSession {
    pub id: String,
    pub user_id: Uuid,
    pub expires_at: DateTime<Utc>,
}

/// A booked donation slot at a donation center.
#[derive(Debug, Clone)]
pub struct Appointment {
    pub id: Uuid,
    pub donor_id: Uuid,
    pub center_id: Uuid,
    pub date: DateTime<Utc>,
    pub status: AppointmentStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// An open request for blood of a specific type, owned by a recipient.
#[derive(Debug, Clone)]
pub struct BloodRequest {
    pub id: Uuid,
    pub recipient_id: Uuid,
    pub blood_type: BloodType,
    pub quantity: i32,
    pub urgency: Urgency,
    pub hospital: String,
    pub location: String,
    pub status: RequestStatus,
    pub notes: String,
    pub created_at: DateTime<Utc>,
}

/// Opening and closing time for one weekday, e.g. "08:00" to "18:00".
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DayHours {
    pub open: String,
    pub close: String,
}

#[derive(Debug, Clone)]
pub struct DonationCenter {
    pub id: Uuid,
    pub name: String,
    pub address: String,
    pub city: String,
    pub state: String,
    pub zip_code: String,
    pub phone: String,
    pub email: String,
    /// Keyed by lowercase weekday name; days without an entry are closed.
    pub operating_hours: HashMap<String, DayHours>,
    pub latitude: f64,
    pub longitude: f64,
}

/// A donation drive that donors can sign up for.
#[derive(Debug, Clone)]
pub struct Campaign {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub location: String,
    /// Empty means every blood type is welcome.
    pub blood_types_needed: Vec<BloodType>,
    pub goal: i32,
    pub image: String,
    pub organizer_id: Uuid,
    pub status: CampaignStatus,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct CampaignParticipant {
    pub campaign_id: Uuid,
    pub donor_id: Uuid,
    pub signup_date: DateTime<Utc>,
    pub status: ParticipantStatus,
}

#[derive(Debug, Clone)]
pub struct Feedback {
    pub id: Uuid,
    pub user_id: Uuid,
    pub rating: i32,
    pub comment: String,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn blood_type_codes_round_trip() {
        for blood_type in BloodType::ALL {
            assert_eq!(blood_type.code().parse::<BloodType>(), Ok(blood_type));
        }
    }

    #[test]
    fn unrecognized_blood_type_is_an_error() {
        assert_eq!(
            "X+".parse::<BloodType>(),
            Err(DomainError::InvalidBloodType("X+".to_string()))
        );
        // Codes are case-sensitive; "o-" is not a silent alias for "O-".
        assert!("o-".parse::<BloodType>().is_err());
    }

    #[test]
    fn urgency_is_ordered() {
        assert!(Urgency::Low < Urgency::Medium);
        assert!(Urgency::Medium < Urgency::High);
        assert!(Urgency::High < Urgency::Critical);
    }

    #[test]
    fn campaign_status_follows_the_date_window() {
        let start = Utc.with_ymd_and_hms(2024, 6, 1, 0, 0, 0).unwrap();
        let end = Utc.with_ymd_and_hms(2024, 6, 30, 23, 59, 59).unwrap();

        let before = Utc.with_ymd_and_hms(2024, 5, 15, 12, 0, 0).unwrap();
        let during = Utc.with_ymd_and_hms(2024, 6, 15, 12, 0, 0).unwrap();
        let after = Utc.with_ymd_and_hms(2024, 7, 15, 12, 0, 0).unwrap();

        assert_eq!(
            CampaignStatus::from_window(start, end, before),
            CampaignStatus::Upcoming
        );
        assert_eq!(
            CampaignStatus::from_window(start, end, during),
            CampaignStatus::Active
        );
        assert_eq!(
            CampaignStatus::from_window(start, end, after),
            CampaignStatus::Completed
        );
    }
}
