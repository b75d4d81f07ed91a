//! crates/bloodlink_core/src/compatibility.rs
//!
//! Blood-type compatibility rules. One canonical donor table drives
//! everything: the recipient view is derived by scanning it, so the two
//! directions cannot drift apart.

use std::cmp::Reverse;

use crate::domain::{BloodRequest, BloodType};

/// The set of recipient types `donor` can give to.
///
/// O- is the universal donor; AB+ can give only to AB+.
pub fn can_donate_to(donor: BloodType) -> &'static [BloodType] {
    use BloodType::*;
    match donor {
        ONeg => &[ONeg, OPos, ANeg, APos, BNeg, BPos, AbNeg, AbPos],
        OPos => &[OPos, APos, BPos, AbPos],
        ANeg => &[ANeg, APos, AbNeg, AbPos],
        APos => &[APos, AbPos],
        BNeg => &[BNeg, BPos, AbNeg, AbPos],
        BPos => &[BPos, AbPos],
        AbNeg => &[AbNeg, AbPos],
        AbPos => &[AbPos],
    }
}

/// The set of donor types `recipient` can receive from, derived as the
/// structural inverse of [`can_donate_to`].
///
/// AB+ is the universal recipient; O- can receive only from O-.
pub fn can_receive_from(recipient: BloodType) -> Vec<BloodType> {
    BloodType::ALL
        .into_iter()
        .filter(|donor| can_donate_to(*donor).contains(&recipient))
        .collect()
}

/// Whether blood from `donor` can be transfused to `recipient`.
pub fn is_compatible(donor: BloodType, recipient: BloodType) -> bool {
    can_donate_to(donor).contains(&recipient)
}

/// The subset of `requests` a donor of type `donor` can serve, most urgent
/// first. The sort is stable, so requests of equal urgency keep their
/// original relative order.
pub fn filter_compatible_requests(
    donor: BloodType,
    requests: Vec<BloodRequest>,
) -> Vec<BloodRequest> {
    let mut compatible: Vec<BloodRequest> = requests
        .into_iter()
        .filter(|request| is_compatible(donor, request.blood_type))
        .collect();
    compatible.sort_by_key(|request| Reverse(request.urgency));
    compatible
}
