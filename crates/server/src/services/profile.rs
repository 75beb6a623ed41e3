//! Customer profile read path.

use chrono::NaiveDate;
use serde::Serialize;

use refill_core::{DeliverySlot, ReferralLedger, SubscriptionStatus, UserId};

use super::error::{ServiceError, not_found};
use crate::db::UserRepository;
use crate::models::{LoyaltyPoints, PaymentDetails, PersonalDetails, SubscriptionDetails};
use crate::store::DocumentStore;

/// Everything the profile page shows.
#[derive(Debug, Clone, Serialize)]
pub struct ProfileView {
    pub user_id: UserId,
    pub personal_details: PersonalDetails,
    pub subscription_status: SubscriptionStatus,
    pub subscription_details: Option<SubscriptionDetails>,
    pub total_gallons: u32,
    /// May go negative if deliveries exceed the plan.
    pub remaining_gallons: i64,
    pub delivered_count: usize,
    pub pending_count: usize,
    pub next_delivery: Option<NaiveDate>,
    pub deliveries: Vec<DeliverySlot>,
    pub payment_details: PaymentDetails,
    pub loyalty_points: LoyaltyPoints,
    pub referral_details: ReferralLedger,
}

pub struct ProfileService<'a> {
    users: UserRepository<'a>,
}

impl<'a> ProfileService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            users: UserRepository::new(store),
        }
    }

    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user has no profile.
    pub async fn view(&self, user_id: &UserId) -> Result<ProfileView, ServiceError> {
        let profile = self.users.require(user_id).await.map_err(not_found("user"))?;
        let schedule = profile.schedule()?;

        Ok(ProfileView {
            user_id: user_id.clone(),
            remaining_gallons: profile.remaining_gallons(&schedule),
            delivered_count: schedule.delivered_count(),
            pending_count: schedule.pending_count(),
            next_delivery: schedule.next_pending().map(|(_, slot)| slot.date),
            deliveries: schedule.slots().to_vec(),
            personal_details: profile.personal_details,
            subscription_status: profile.subscription_status,
            subscription_details: profile.subscription_details,
            total_gallons: profile.total_gallons,
            payment_details: profile.payment_details,
            loyalty_points: profile.loyalty_points,
            referral_details: profile.referral_details,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use refill_core::{DeliveryAddress, DeliveryStatus, Email, Timestamp};
    use serde_json::json;

    use super::*;
    use crate::models::UserProfile;
    use crate::store::MemoryStore;

    #[tokio::test]
    async fn test_view_aggregates_schedule() {
        let store = MemoryStore::new();
        let id = UserId::new("ana");
        let mut profile = UserProfile::new(
            PersonalDetails {
                name: "Ana".into(),
                phone_number: "0917".into(),
                email: Email::parse("ana@refill.ph").unwrap(),
                address: DeliveryAddress::compose("1", "Pugaro").unwrap(),
            },
            Timestamp::now(),
        );
        profile.total_gallons = 20;
        profile.subscription_details = Some(SubscriptionDetails {
            subscription_name: "Family".into(),
            plan_id: refill_core::PlanId::new("p"),
            total_price: refill_core::Amount::from_pesos(500),
            gallons_per_week: 5,
            sale_id: None,
        });
        profile.delivery_schedule = ["2024-01-01", "2024-01-08", "2024-01-15"]
            .iter()
            .map(|d| d.parse().unwrap())
            .collect();
        profile.delivery_status = vec![
            DeliveryStatus::Delivered,
            DeliveryStatus::Delivered,
            DeliveryStatus::Pending,
        ];
        UserRepository::new(&store).create(&id, &profile).await.unwrap();

        let view = ProfileService::new(&store).view(&id).await.unwrap();
        assert_eq!(view.remaining_gallons, 10);
        assert_eq!(view.delivered_count, 2);
        assert_eq!(view.pending_count, 1);
        assert_eq!(view.next_delivery, NaiveDate::from_ymd_opt(2024, 1, 15));

        let body = serde_json::to_value(&view).unwrap();
        assert_eq!(body["deliveries"][0], json!({"date": "2024-01-01", "status": "Delivered"}));
    }

    #[tokio::test]
    async fn test_view_missing_user() {
        let store = MemoryStore::new();
        assert!(matches!(
            ProfileService::new(&store).view(&UserId::new("ghost")).await,
            Err(ServiceError::NotFound("user"))
        ));
    }
}
