//! Customer profile document (`users/{user_id}`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use refill_core::{
    Amount, DeliveryAddress, DeliverySchedule, DeliveryStatus, Email, PaymentMethod,
    PaymentStatus, PlanId, ReferralLedger, SaleId, ScheduleError, SubscriptionStatus, Timestamp,
    remaining_gallons,
};

/// Contact details captured at registration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PersonalDetails {
    pub name: String,
    pub phone_number: String,
    pub email: Email,
    pub address: DeliveryAddress,
}

/// The plan a subscriber is on.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SubscriptionDetails {
    pub subscription_name: String,
    pub plan_id: PlanId,
    pub total_price: Amount,
    pub gallons_per_week: u32,
    /// Sale that bought this subscription.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sale_id: Option<SaleId>,
}

/// Most recent payment on the profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PaymentDetails {
    /// `None` until the first purchase.
    pub payment_method: Option<PaymentMethod>,
    pub amount_paid: Amount,
    pub payment_date: Timestamp,
    pub payment_status: PaymentStatus,
}

/// Loyalty balance. Recorded on plans but not yet credited to customers.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoyaltyPoints {
    #[serde(default)]
    pub points_balance: u64,
    #[serde(default)]
    pub points_history: Vec<serde_json::Value>,
}

/// A customer profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserProfile {
    pub personal_details: PersonalDetails,
    #[serde(default)]
    pub subscription_status: SubscriptionStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription_details: Option<SubscriptionDetails>,
    #[serde(default)]
    pub total_gallons: u32,
    #[serde(default)]
    pub delivery_schedule: Vec<NaiveDate>,
    #[serde(default)]
    pub delivery_status: Vec<DeliveryStatus>,
    pub payment_details: PaymentDetails,
    #[serde(default)]
    pub loyalty_points: LoyaltyPoints,
    #[serde(default)]
    pub referral_details: ReferralLedger,
}

impl UserProfile {
    /// A fresh profile for a newly registered customer.
    #[must_use]
    pub fn new(personal_details: PersonalDetails, now: Timestamp) -> Self {
        Self {
            personal_details,
            subscription_status: SubscriptionStatus::Inactive,
            subscription_details: None,
            total_gallons: 0,
            delivery_schedule: Vec::new(),
            delivery_status: Vec::new(),
            payment_details: PaymentDetails {
                payment_method: None,
                amount_paid: Amount::ZERO,
                payment_date: now,
                payment_status: PaymentStatus::Unpaid,
            },
            loyalty_points: LoyaltyPoints::default(),
            referral_details: ReferralLedger::default(),
        }
    }

    /// The delivery schedule rebuilt from the stored parallel arrays.
    ///
    /// # Errors
    ///
    /// Returns `ScheduleError::LengthMismatch` if the arrays disagree.
    pub fn schedule(&self) -> Result<DeliverySchedule, ScheduleError> {
        DeliverySchedule::from_parts(self.delivery_schedule.clone(), self.delivery_status.clone())
    }

    #[must_use]
    pub fn is_subscribed(&self) -> bool {
        self.subscription_status == SubscriptionStatus::Active
    }

    #[must_use]
    pub fn gallons_per_week(&self) -> u32 {
        self.subscription_details
            .as_ref()
            .map_or(0, |d| d.gallons_per_week)
    }

    /// Gallons still owed given a schedule built from this profile.
    #[must_use]
    pub fn remaining_gallons(&self, schedule: &DeliverySchedule) -> i64 {
        remaining_gallons(
            self.total_gallons,
            schedule.delivered_count(),
            self.gallons_per_week(),
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use serde_json::json;

    use super::*;

    fn profile() -> UserProfile {
        UserProfile::new(
            PersonalDetails {
                name: "Ana Reyes".into(),
                phone_number: "09171234567".into(),
                email: Email::parse("ana@refill.ph").unwrap(),
                address: DeliveryAddress::compose("7", "Poblacion").unwrap(),
            },
            Timestamp {
                seconds: 0,
                nanoseconds: 0,
            },
        )
    }

    #[test]
    fn test_new_profile_is_inactive_and_empty() {
        let p = profile();
        assert!(!p.is_subscribed());
        assert_eq!(p.payment_details.payment_status, PaymentStatus::Unpaid);
        assert!(p.schedule().unwrap().is_empty());
        assert_eq!(p.referral_details, ReferralLedger::default());
    }

    #[test]
    fn test_mismatched_arrays_rejected() {
        let mut p = profile();
        p.delivery_schedule = vec![NaiveDate::from_ymd_opt(2024, 1, 1).unwrap()];
        assert!(matches!(
            p.schedule(),
            Err(ScheduleError::LengthMismatch { .. })
        ));
    }

    #[test]
    fn test_document_shape() {
        let value = serde_json::to_value(profile()).unwrap();
        assert_eq!(value["subscription_status"], "inactive");
        assert_eq!(
            value["personal_details"]["address"],
            "7, Poblacion, Balungao, Pangasinan"
        );
        assert_eq!(value["delivery_schedule"], json!([]));
        assert!(value.get("subscription_details").is_none());
    }
}
