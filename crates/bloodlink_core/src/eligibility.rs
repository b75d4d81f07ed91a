//! crates/bloodlink_core/src/eligibility.rs
//!
//! Donation-eligibility rules. A donor may give blood again once at least
//! [`DONATION_INTERVAL_DAYS`] days have passed since their previous
//! donation. Both functions are pure; callers inject `now`, which keeps the
//! rules deterministic under test.

use chrono::{DateTime, Duration, Utc};

use crate::domain::DomainError;

/// Minimum number of days between two whole-blood donations (8 weeks).
pub const DONATION_INTERVAL_DAYS: i64 = 56;

/// Whether a donor with the given donation history may donate at `now`.
///
/// A donor who has never donated is always eligible. Otherwise the donor is
/// eligible once the full interval has elapsed, inclusive of the boundary:
/// exactly 56 days after the last donation counts as eligible.
///
/// A `last_donation` after `now` is a caller error and is rejected with
/// [`DomainError::InvalidTimestamp`] rather than clamped.
pub fn is_eligible(
    last_donation: Option<DateTime<Utc>>,
    now: DateTime<Utc>,
) -> Result<bool, DomainError> {
    let Some(last) = last_donation else {
        return Ok(true);
    };
    if last > now {
        return Err(DomainError::InvalidTimestamp(format!(
            "last donation {last} is later than the current time {now}"
        )));
    }
    Ok(now - last >= Duration::days(DONATION_INTERVAL_DAYS))
}

/// The first moment the donor may donate again: exactly 56 calendar days
/// (56 x 24 h) after `last_donation`, at the same time of day.
pub fn next_eligible_date(last_donation: DateTime<Utc>) -> DateTime<Utc> {
    last_donation + Duration::days(DONATION_INTERVAL_DAYS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Timelike};

    fn moment(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(y, mo, d, h, mi, 0).unwrap()
    }

    #[test]
    fn never_donated_is_always_eligible() {
        assert_eq!(is_eligible(None, moment(2020, 1, 1, 0, 0)), Ok(true));
        assert_eq!(is_eligible(None, moment(2031, 12, 31, 23, 59)), Ok(true));
    }

    #[test]
    fn eligible_exactly_at_the_56_day_boundary() {
        let last = moment(2024, 1, 10, 9, 30);
        assert_eq!(
            is_eligible(Some(last), last + Duration::days(DONATION_INTERVAL_DAYS)),
            Ok(true)
        );
    }

    #[test]
    fn not_eligible_one_day_before_the_boundary() {
        let last = moment(2024, 1, 10, 9, 30);
        assert_eq!(
            is_eligible(Some(last), last + Duration::days(DONATION_INTERVAL_DAYS - 1)),
            Ok(false)
        );
    }

    #[test]
    fn not_eligible_one_second_before_the_boundary() {
        let last = moment(2024, 1, 10, 9, 30);
        let just_short = last + Duration::days(DONATION_INTERVAL_DAYS) - Duration::seconds(1);
        assert_eq!(is_eligible(Some(last), just_short), Ok(false));
    }

    #[test]
    fn future_last_donation_is_rejected() {
        let now = moment(2024, 3, 1, 12, 0);
        let result = is_eligible(Some(now + Duration::seconds(1)), now);
        assert!(matches!(result, Err(DomainError::InvalidTimestamp(_))));
    }

    #[test]
    fn next_eligible_date_is_56_days_later() {
        let last = moment(2024, 1, 10, 9, 30);
        assert_eq!(next_eligible_date(last), moment(2024, 3, 6, 9, 30));
    }

    #[test]
    fn next_eligible_date_preserves_time_of_day() {
        let last = Utc.with_ymd_and_hms(2024, 11, 2, 18, 45, 17).unwrap();
        let next = next_eligible_date(last);
        assert_eq!(next.hour(), 18);
        assert_eq!(next.minute(), 45);
        assert_eq!(next.second(), 17);
        assert_eq!(next - last, Duration::days(DONATION_INTERVAL_DAYS));
    }
}
