//! Figures derived from a subscriber's profile.

/// Gallons still owed on a subscription.
///
/// `total_gallons - delivered_count × gallons_per_week`. The result is signed
/// and deliberately not clamped, so a schedule that over-delivers shows up as
/// a negative balance instead of silently reading zero.
#[must_use]
pub fn remaining_gallons(total_gallons: u32, delivered_count: usize, gallons_per_week: u32) -> i64 {
    let delivered = i64::try_from(delivered_count).unwrap_or(i64::MAX);
    i64::from(total_gallons) - delivered.saturating_mul(i64::from(gallons_per_week))
}
