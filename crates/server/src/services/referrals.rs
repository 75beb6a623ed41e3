//! Referral codes and the referral points ledger.
//!
//! Ledger balances live on the referrer's user document. Every
//! read-modify-write of a ledger runs under the shared ledger lock so that two
//! requests in this process cannot lose each other's grant. Nothing spans
//! documents atomically: settling or releasing a grant writes the referrer first
//! and the sale second.

use rand::Rng;
use tokio::sync::Mutex;
use tracing::instrument;

use refill_core::{
    GrantKind, PaymentStatus, ReferralCode, ReferralLedger, SaleId, SaleStatus, SaleType, UserId,
};

use super::error::{ServiceError, not_found};
use crate::db::{SaleRepository, UserRepository};
use crate::models::{Sale, UserProfile};
use crate::store::DocumentStore;

/// Attempts at finding an unused code before giving up.
const CODE_ATTEMPTS: usize = 5;

/// Referral service.
pub struct ReferralService<'a> {
    users: UserRepository<'a>,
    sales: SaleRepository<'a>,
    lock: &'a Mutex<()>,
}

impl<'a> ReferralService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, lock: &'a Mutex<()>) -> Self {
        Self {
            users: UserRepository::new(store),
            sales: SaleRepository::new(store),
            lock,
        }
    }

    /// Return the user's referral code, generating one on first use.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the user has no profile and
    /// `ServiceError::Conflict` if no free code was found.
    #[instrument(skip(self))]
    pub async fn ensure_code(&self, user_id: &UserId) -> Result<ReferralCode, ServiceError> {
        let _guard = self.lock.lock().await;

        let profile = self.users.require(user_id).await.map_err(not_found("user"))?;
        if let Some(code) = profile.referral_details.referral_code {
            return Ok(code);
        }

        for _ in 0..CODE_ATTEMPTS {
            let code = random_code()?;
            if self.users.find_by_referral_code(&code).await?.is_none() {
                self.users.set_referral_code(user_id, &code).await?;
                tracing::info!(user_id = %user_id, code = %code, "Referral code issued");
                return Ok(code);
            }
        }

        Err(ServiceError::conflict("could not allocate a referral code"))
    }

    /// Find the owner of a code quoted by a buyer.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` ("invalid referral code") if the code
    /// is malformed or unknown, and also if the buyer quotes their own code.
    pub async fn resolve_referrer(
        &self,
        raw_code: &str,
        buyer: &UserId,
    ) -> Result<(ReferralCode, UserId, UserProfile), ServiceError> {
        let code = ReferralCode::parse(raw_code)
            .map_err(|_| ServiceError::validation("invalid referral code"))?;

        let (referrer_id, referrer) = self
            .users
            .find_by_referral_code(&code)
            .await?
            .ok_or_else(|| ServiceError::validation("invalid referral code"))?;

        if &referrer_id == buyer {
            return Err(ServiceError::validation(
                "you cannot use your own referral code",
            ));
        }

        Ok((code, referrer_id, referrer))
    }

    /// Add a grant to the referrer's ledger.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::NotFound` if the referrer disappeared.
    #[instrument(skip(self))]
    pub async fn grant(
        &self,
        referrer_id: &UserId,
        points: u64,
        kind: GrantKind,
    ) -> Result<ReferralLedger, ServiceError> {
        let _guard = self.lock.lock().await;

        let mut ledger = self
            .users
            .require(referrer_id)
            .await
            .map_err(not_found("referrer"))?
            .referral_details;
        ledger.grant(points, kind);
        self.users.save_referral_balances(referrer_id, &ledger).await?;

        tracing::info!(
            referrer_id = %referrer_id,
            points,
            kind = ?kind,
            "Referral points granted"
        );
        Ok(ledger)
    }

    /// Mark a sale paid, settling its pending referral grant first.
    ///
    /// The referrer's current code must still match the one recorded on the
    /// sale. For subscription sales the buyer's profile payment is recorded
    /// last, provided the profile's subscription still came from this sale.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Conflict` if the sale is already paid or was
    /// cancelled, `ServiceError::Validation` ("referral code mismatch") if the
    /// referrer's code changed, and `ServiceError::PartialWrite` if a later
    /// write fails after the ledger was updated.
    #[instrument(skip(self))]
    pub async fn mark_sale_paid(&self, sale_id: &SaleId) -> Result<(), ServiceError> {
        let _guard = self.lock.lock().await;

        let sale = self.sales.require(sale_id).await.map_err(not_found("sale"))?;
        if sale.payment_status == PaymentStatus::Paid {
            return Err(ServiceError::conflict("sale is already paid"));
        }
        if sale.status == SaleStatus::Cancelled {
            return Err(ServiceError::conflict("cannot mark a cancelled sale as paid"));
        }

        let mut completed = Vec::new();
        if let Some(referral) = &sale.referral_details
            && referral.referral_points_pending > 0
        {
            let referrer = self
                .users
                .require(&referral.referrer_id)
                .await
                .map_err(not_found("referrer"))?;
            let mut ledger = referrer.referral_details;

            if ledger.referral_code.as_ref() != Some(&referral.referral_code) {
                return Err(ServiceError::validation("referral code mismatch"));
            }

            ledger.settle(referral.referral_points_pending)?;
            self.users
                .save_referral_balances(&referral.referrer_id, &ledger)
                .await?;
            tracing::info!(
                referrer_id = %referral.referrer_id,
                points = referral.referral_points_pending,
                "Pending referral points confirmed"
            );
            completed.push(format!("referrer {} ledger settled", referral.referrer_id));
        }

        self.sales
            .mark_paid(sale_id, sale.referral_details.is_some())
            .await
            .map_err(|e| partial_or(e, &completed))?;
        completed.push(format!("sale {sale_id} marked paid"));

        if sale.sale_type == SaleType::Subscription {
            let buyer = self
                .users
                .require(&sale.user_id)
                .await
                .map_err(|e| partial_or(e, &completed))?;
            let current_sale = buyer
                .subscription_details
                .as_ref()
                .and_then(|d| d.sale_id.as_ref());
            if current_sale == Some(sale_id) {
                self.users
                    .record_payment(&sale.user_id, sale.total_price)
                    .await
                    .map_err(|e| partial_or(e, &completed))?;
            } else {
                tracing::info!(
                    sale_id = %sale_id,
                    user_id = %sale.user_id,
                    "Buyer has since re-subscribed; profile payment left as is"
                );
            }
        }

        tracing::info!(sale_id = %sale_id, "Sale marked paid");
        Ok(())
    }

    /// Cancel a sale and release referral points still pending on it.
    ///
    /// `check` sees the stored sale under the ledger lock and may refuse the
    /// cancellation. The referrer's ledger is written before the sale.
    ///
    /// # Errors
    ///
    /// Returns whatever `check` returns, `ServiceError::Ledger` if the
    /// referrer holds fewer pending points than the sale recorded, and
    /// `ServiceError::PartialWrite` if the sale write fails after the ledger
    /// was updated.
    #[instrument(skip(self, check))]
    pub async fn cancel_sale<F>(&self, sale_id: &SaleId, check: F) -> Result<Sale, ServiceError>
    where
        F: FnOnce(&Sale) -> Result<(), ServiceError>,
    {
        let _guard = self.lock.lock().await;

        let mut sale = self.sales.require(sale_id).await.map_err(not_found("sale"))?;
        check(&sale)?;

        let mut completed = Vec::new();
        if let Some(referral) = &sale.referral_details
            && referral.referral_points_pending > 0
        {
            let referrer = self
                .users
                .require(&referral.referrer_id)
                .await
                .map_err(not_found("referrer"))?;
            let mut ledger = referrer.referral_details;
            ledger.revoke(referral.referral_points_pending)?;
            self.users
                .save_referral_balances(&referral.referrer_id, &ledger)
                .await?;
            tracing::info!(
                referrer_id = %referral.referrer_id,
                points = referral.referral_points_pending,
                "Pending referral points released"
            );
            completed.push(format!(
                "referrer {} pending points released",
                referral.referrer_id
            ));
        }

        self.sales
            .cancel(sale_id, sale.referral_details.is_some())
            .await
            .map_err(|e| partial_or(e, &completed))?;

        sale.status = SaleStatus::Cancelled;
        if let Some(referral) = &mut sale.referral_details {
            referral.referral_points_pending = 0;
        }
        Ok(sale)
    }
}

fn partial_or(err: crate::db::RepositoryError, completed: &[String]) -> ServiceError {
    if completed.is_empty() {
        ServiceError::Repository(err)
    } else {
        ServiceError::partial(completed.join(", "), err)
    }
}

/// A random code: the `REF-` prefix plus uppercase letters and digits.
fn random_code() -> Result<ReferralCode, ServiceError> {
    const CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
    let mut rng = rand::rng();
    let suffix: String = (0..ReferralCode::SUFFIX_LEN)
        .filter_map(|_| CHARSET.get(rng.random_range(0..CHARSET.len())))
        .map(|&b| char::from(b))
        .collect();
    ReferralCode::from_suffix(&suffix)
        .map_err(|e| ServiceError::conflict(format!("generated code rejected: {e}")))
}
