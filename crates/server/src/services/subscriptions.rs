//! Subscribing to a plan.
//!
//! A purchase writes, in order: the sale, the buyer's profile (schedule and
//! payment), then the referrer's ledger. There is no rollback; a failure after
//! the sale is stored surfaces as a partial write.

use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;
use tracing::instrument;

use refill_core::{
    Amount, DeliverySchedule, GrantKind, PaymentMethod, PaymentStatus, PlanId, PlanStatus,
    ReferralCode, SaleId, SaleStatus, SaleType, Timestamp, UserId, referral_points,
};

use super::error::{ServiceError, not_found};
use super::referrals::ReferralService;
use crate::db::users::SubscriptionUpdate;
use crate::db::{PlanRepository, RepositoryError, SaleRepository, UserRepository};
use crate::models::{PaymentDetails, Sale, SaleReferral, SubscriptionDetails};
use crate::store::DocumentStore;

/// Subscription checkout form.
#[derive(Debug, Clone, Deserialize)]
pub struct SubscribeRequest {
    pub plan_id: PlanId,
    pub payment_method: PaymentMethod,
    /// First delivery; today when omitted.
    #[serde(default)]
    pub start_date: Option<NaiveDate>,
    #[serde(default)]
    pub referral_code: Option<String>,
}

/// Referral credited by a purchase.
#[derive(Debug, Clone, Serialize)]
pub struct GrantedReferral {
    pub referral_code: ReferralCode,
    pub referrer_id: UserId,
    pub points: u64,
    pub kind: GrantKind,
}

/// Result of a successful checkout.
#[derive(Debug, Clone, Serialize)]
pub struct Subscribed {
    pub sale_id: SaleId,
    pub total_gallons: u32,
    pub delivery_schedule: Vec<NaiveDate>,
    pub referral: Option<GrantedReferral>,
}

pub struct SubscriptionService<'a> {
    users: UserRepository<'a>,
    plans: PlanRepository<'a>,
    sales: SaleRepository<'a>,
    referrals: ReferralService<'a>,
    delivery_lock: &'a Mutex<()>,
}

impl<'a> SubscriptionService<'a> {
    /// `delivery_lock` is the lock `DeliveryService` holds while it rewrites
    /// a schedule.
    #[must_use]
    pub const fn new(
        store: &'a dyn DocumentStore,
        ledger_lock: &'a Mutex<()>,
        delivery_lock: &'a Mutex<()>,
    ) -> Self {
        Self {
            users: UserRepository::new(store),
            plans: PlanRepository::new(store),
            sales: SaleRepository::new(store),
            referrals: ReferralService::new(store, ledger_lock),
            delivery_lock,
        }
    }

    /// Subscribe the buyer to a plan.
    ///
    /// Any previous schedule on the profile is replaced.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` for an unknown plan or one owned by
    /// another customer, `ServiceError::Validation` for an inactive catalogue
    /// plan or an invalid referral code, and `ServiceError::PartialWrite` if
    /// the profile or ledger write fails after the sale was stored.
    #[instrument(skip(self, request), fields(plan_id = %request.plan_id))]
    pub async fn subscribe(
        &self,
        buyer_id: &UserId,
        request: &SubscribeRequest,
    ) -> Result<Subscribed, ServiceError> {
        let buyer = self.users.require(buyer_id).await.map_err(not_found("user"))?;

        let plan = self
            .plans
            .get(&request.plan_id)
            .await?
            .ok_or(ServiceError::NotFound("plan"))?;
        match &plan.created_by {
            Some(owner) if owner != buyer_id => return Err(ServiceError::NotFound("plan")),
            Some(_) => {}
            None if plan.terms.status != PlanStatus::Active => {
                return Err(ServiceError::validation("plan is not available"));
            }
            None => {}
        }

        let referrer = match request.referral_code.as_deref().map(str::trim) {
            Some(code) if !code.is_empty() => {
                Some(self.referrals.resolve_referrer(code, buyer_id).await?)
            }
            _ => None,
        };

        let start = request
            .start_date
            .unwrap_or_else(|| Utc::now().date_naive());
        let schedule = DeliverySchedule::generate(start, plan.terms.subscription_duration)?;

        let total_price = plan.terms.total_price;
        let kind = GrantKind::for_payment(request.payment_method);
        let points = referral_points(total_price);
        let now = Timestamp::now();

        let sale_referral = referrer.as_ref().map(|(code, referrer_id, _)| SaleReferral {
            referral_code: code.clone(),
            referral_points: points,
            referral_points_pending: if kind == GrantKind::Pending { points } else { 0 },
            referrer_id: referrer_id.clone(),
            referred_user_name: buyer.personal_details.name.clone(),
        });

        let sale = Sale {
            sale_type: SaleType::Subscription,
            user_id: buyer_id.clone(),
            customer_name: buyer.personal_details.name.clone(),
            product_id: None,
            plan_id: Some(request.plan_id.clone()),
            item_name: plan.terms.subscription_name.clone(),
            quantity: 1,
            total_price,
            total_gallons: Some(plan.terms.total_gallons),
            start_date: Some(start),
            payment_method: request.payment_method,
            payment_status: request.payment_method.initial_status(),
            delivery_address: buyer.personal_details.address.clone(),
            status: SaleStatus::Pending,
            referral_details: sale_referral,
            created_at: now,
        };
        let sale_id = self.sales.create(&sale).await?;

        let details = SubscriptionDetails {
            subscription_name: plan.terms.subscription_name.clone(),
            plan_id: request.plan_id.clone(),
            total_price,
            gallons_per_week: plan.terms.gallons_per_week,
            sale_id: Some(sale_id.clone()),
        };
        let payment_status = request.payment_method.initial_status();
        let payment = PaymentDetails {
            payment_method: Some(request.payment_method),
            amount_paid: if payment_status == PaymentStatus::Paid {
                total_price
            } else {
                Amount::ZERO
            },
            payment_date: now,
            payment_status,
        };
        let schedule_guard = self.delivery_lock.lock().await;
        self.users
            .start_subscription(
                buyer_id,
                SubscriptionUpdate {
                    details: &details,
                    total_gallons: plan.terms.total_gallons,
                    schedule: &schedule,
                    payment: &payment,
                    referred_by: referrer.as_ref().map(|(code, _, _)| code),
                },
            )
            .await
            .map_err(|e| ServiceError::partial(format!("sale {sale_id} recorded"), e))?;
        drop(schedule_guard);

        let mut granted = None;
        if let Some((code, referrer_id, _)) = referrer {
            if let Err(e) = self.referrals.grant(&referrer_id, points, kind).await {
                let source = match e {
                    ServiceError::Repository(e) => e,
                    _ => RepositoryError::NotFound,
                };
                return Err(ServiceError::partial(
                    format!("sale {sale_id} recorded, buyer profile updated"),
                    source,
                ));
            }
            granted = Some(GrantedReferral {
                referral_code: code,
                referrer_id,
                points,
                kind,
            });
        }

        tracing::info!(
            sale_id = %sale_id,
            user_id = %buyer_id,
            deliveries = schedule.len(),
            "Subscription started"
        );

        let (delivery_schedule, _) = schedule.into_parts();
        Ok(Subscribed {
            sale_id,
            total_gallons: plan.terms.total_gallons,
            delivery_schedule,
            referral: granted,
        })
    }
}
