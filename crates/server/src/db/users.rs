//! User profile repository.

use refill_core::{
    Amount, DeliverySchedule, PaymentStatus, ReferralCode, ReferralLedger, SubscriptionStatus,
    UserId,
};

use super::{RepositoryError, decode, encode};
use crate::models::{PaymentDetails, SubscriptionDetails, UserProfile};
use crate::store::{Collection, DocumentStore, FieldFilter, Patch};

const COLLECTION: Collection = Collection::Users;

/// Fields written when a subscription starts.
#[derive(Debug, Clone)]
pub struct SubscriptionUpdate<'a> {
    pub details: &'a SubscriptionDetails,
    pub total_gallons: u32,
    pub schedule: &'a DeliverySchedule,
    pub payment: &'a PaymentDetails,
    pub referred_by: Option<&'a ReferralCode>,
}

/// Repository for customer profiles.
pub struct UserRepository<'a> {
    store: &'a dyn DocumentStore,
}

impl<'a> UserRepository<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self { store }
    }

    /// Get a profile by user ID.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if the document does not
    /// deserialize or its delivery arrays differ in length.
    pub async fn get(&self, id: &UserId) -> Result<Option<UserProfile>, RepositoryError> {
        match self.store.get(COLLECTION, id.as_str()).await? {
            Some(data) => decode_profile(id.as_str(), data).map(Some),
            None => Ok(None),
        }
    }

    /// Get a profile that must exist.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if there is no such user.
    pub async fn require(&self, id: &UserId) -> Result<UserProfile, RepositoryError> {
        self.get(id).await?.ok_or(RepositoryError::NotFound)
    }

    /// Store a new profile.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::Conflict` if the user ID is already taken.
    pub async fn create(&self, id: &UserId, profile: &UserProfile) -> Result<(), RepositoryError> {
        self.store
            .create(COLLECTION, id.as_str(), encode(profile)?)
            .await?;
        Ok(())
    }

    /// Find the user who owns a referral code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if a matching document is invalid.
    pub async fn find_by_referral_code(
        &self,
        code: &ReferralCode,
    ) -> Result<Option<(UserId, UserProfile)>, RepositoryError> {
        let filter = FieldFilter::eq("referral_details.referral_code", code.as_str());
        let docs = self.store.query(COLLECTION, &filter).await?;

        if docs.len() > 1 {
            tracing::warn!(code = %code, matches = docs.len(), "Referral code is not unique");
        }

        docs.into_iter()
            .next()
            .map(|doc| {
                let profile = decode_profile(&doc.id, doc.data)?;
                Ok((UserId::from(doc.id), profile))
            })
            .transpose()
    }

    /// All users whose subscription is active.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::DataCorruption` if any matching document is invalid.
    pub async fn list_active_subscribers(
        &self,
    ) -> Result<Vec<(UserId, UserProfile)>, RepositoryError> {
        let filter = FieldFilter::eq("subscription_status", encode(&SubscriptionStatus::Active)?);
        self.store
            .query(COLLECTION, &filter)
            .await?
            .into_iter()
            .map(|doc| {
                let profile = decode_profile(&doc.id, doc.data)?;
                Ok((UserId::from(doc.id), profile))
            })
            .collect()
    }

    /// Record a newly purchased subscription on the profile.
    ///
    /// Replaces any previous schedule.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn start_subscription(
        &self,
        id: &UserId,
        update: SubscriptionUpdate<'_>,
    ) -> Result<(), RepositoryError> {
        let (dates, statuses) = update.schedule.clone().into_parts();

        let mut patch = Patch::new()
            .set("subscription_status", encode(&SubscriptionStatus::Active)?)
            .set("subscription_details", encode(update.details)?)
            .set("total_gallons", update.total_gallons)
            .set("delivery_schedule", encode(&dates)?)
            .set("delivery_status", encode(&statuses)?)
            .set("payment_details", encode(update.payment)?);
        if let Some(code) = update.referred_by {
            patch = patch.set("referral_details.referred_by", code.as_str());
        }

        self.store.update(COLLECTION, id.as_str(), &patch).await?;
        Ok(())
    }

    /// Overwrite both delivery arrays from one schedule.
    ///
    /// Dates and statuses are written together so the stored arrays always
    /// come from the same schedule.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn save_schedule(
        &self,
        id: &UserId,
        schedule: &DeliverySchedule,
    ) -> Result<(), RepositoryError> {
        let (dates, statuses) = schedule.clone().into_parts();
        let patch = Patch::new()
            .set("delivery_schedule", encode(&dates)?)
            .set("delivery_status", encode(&statuses)?);
        self.store.update(COLLECTION, id.as_str(), &patch).await?;
        Ok(())
    }

    /// Write the point balances of a referral ledger.
    ///
    /// The owner's code and `referred_by` are left as stored.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn save_referral_balances(
        &self,
        id: &UserId,
        ledger: &ReferralLedger,
    ) -> Result<(), RepositoryError> {
        let patch = Patch::new()
            .set("referral_details.referral_points", ledger.referral_points)
            .set(
                "referral_details.referral_points_pending",
                ledger.referral_points_pending,
            )
            .set("referral_details.referrals_count", ledger.referrals_count);
        self.store.update(COLLECTION, id.as_str(), &patch).await?;
        Ok(())
    }

    /// Assign the user's own referral code.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn set_referral_code(
        &self,
        id: &UserId,
        code: &ReferralCode,
    ) -> Result<(), RepositoryError> {
        let patch = Patch::new().set("referral_details.referral_code", code.as_str());
        self.store.update(COLLECTION, id.as_str(), &patch).await?;
        Ok(())
    }

    /// Mark the profile's current payment as settled for `amount_paid`.
    ///
    /// # Errors
    ///
    /// Returns `RepositoryError::NotFound` if the user does not exist.
    pub async fn record_payment(
        &self,
        id: &UserId,
        amount_paid: Amount,
    ) -> Result<(), RepositoryError> {
        let patch = Patch::new()
            .set("payment_details.payment_status", encode(&PaymentStatus::Paid)?)
            .set("payment_details.amount_paid", encode(&amount_paid)?);
        self.store.update(COLLECTION, id.as_str(), &patch).await?;
        Ok(())
    }
}

/// Decode a profile and check the schedule arrays line up.
fn decode_profile(id: &str, data: serde_json::Value) -> Result<UserProfile, RepositoryError> {
    let profile: UserProfile = decode(COLLECTION, id, data)?;
    profile
        .schedule()
        .map_err(|e| RepositoryError::DataCorruption(format!("{COLLECTION}/{id}: {e}")))?;
    Ok(profile)
}
