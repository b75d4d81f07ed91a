pub mod compatibility;
pub mod domain;
pub mod eligibility;
pub mod ports;

pub use compatibility::{can_donate_to, can_receive_from, filter_compatible_requests, is_compatible};
pub use domain::{
    Appointment, AppointmentStatus, AuthSession, BloodRequest, BloodType, Campaign,
    CampaignParticipant, CampaignStatus, DayHours, DomainError, DonationCenter, Feedback,
    ParticipantStatus, RequestStatus, Role, Urgency, User, UserCredentials, UserType,
};
pub use eligibility::{is_eligible, next_eligible_date, DONATION_INTERVAL_DAYS};
pub use ports::{DatabaseService, PortError, PortResult};
