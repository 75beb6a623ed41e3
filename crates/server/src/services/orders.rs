//! One-time purchases and sale status changes.
//!
//! Cancellation goes through the referral ledger so that points still pending
//! on the sale are released.

use serde::Deserialize;
use tokio::sync::Mutex;
use tracing::instrument;

use refill_core::{
    PaymentMethod, ProductId, SaleAction, SaleId, SaleStatus, SaleType, Timestamp, UserId,
};

use super::error::{ServiceError, not_found};
use super::referrals::ReferralService;
use crate::db::{ProductRepository, SaleRepository, UserRepository};
use crate::models::{Sale, SaleRecord};
use crate::store::DocumentStore;

/// One-time purchase form.
#[derive(Debug, Clone, Deserialize)]
pub struct PurchaseRequest {
    pub product_id: ProductId,
    pub quantity: u32,
    pub payment_method: PaymentMethod,
}

pub struct OrderService<'a> {
    users: UserRepository<'a>,
    products: ProductRepository<'a>,
    sales: SaleRepository<'a>,
    referrals: ReferralService<'a>,
}

impl<'a> OrderService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore, ledger_lock: &'a Mutex<()>) -> Self {
        Self {
            users: UserRepository::new(store),
            products: ProductRepository::new(store),
            sales: SaleRepository::new(store),
            referrals: ReferralService::new(store, ledger_lock),
        }
    }

    /// Buy a product, delivered to the address on the buyer's profile.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a zero quantity or a total too
    /// large to represent, and `ServiceError::NotFound` for an unknown product.
    #[instrument(skip(self, request), fields(product_id = %request.product_id))]
    pub async fn purchase(
        &self,
        buyer_id: &UserId,
        request: &PurchaseRequest,
    ) -> Result<SaleRecord, ServiceError> {
        if request.quantity == 0 {
            return Err(ServiceError::validation("quantity must be at least 1"));
        }

        let product = self
            .products
            .get(&request.product_id)
            .await?
            .ok_or(ServiceError::NotFound("product"))?;
        let total_price = product
            .price
            .times(request.quantity)
            .ok_or_else(|| ServiceError::validation("order total is too large"))?;
        let buyer = self.users.require(buyer_id).await.map_err(not_found("user"))?;

        let sale = Sale {
            sale_type: SaleType::OneTime,
            user_id: buyer_id.clone(),
            customer_name: buyer.personal_details.name,
            product_id: Some(request.product_id.clone()),
            plan_id: None,
            item_name: product.name,
            quantity: request.quantity,
            total_price,
            total_gallons: None,
            start_date: None,
            payment_method: request.payment_method,
            payment_status: request.payment_method.initial_status(),
            delivery_address: buyer.personal_details.address,
            status: SaleStatus::Pending,
            referral_details: None,
            created_at: Timestamp::now(),
        };
        let id = self.sales.create(&sale).await?;

        tracing::info!(sale_id = %id, total = %sale.total_price, "One-time purchase recorded");
        Ok(SaleRecord { id, sale })
    }

    /// The caller's own sales, newest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn list_for(&self, user_id: &UserId) -> Result<Vec<SaleRecord>, ServiceError> {
        Ok(self.sales.list_for_user(user_id).await?)
    }

    /// All sales, optionally of one type.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the query fails.
    pub async fn list_all(
        &self,
        sale_type: Option<SaleType>,
    ) -> Result<Vec<SaleRecord>, ServiceError> {
        Ok(self.sales.list(sale_type).await?)
    }

    /// Customer cancellation of their own pending sale.
    ///
    /// Another customer's sale is reported as not found.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Conflict` once the sale has left `Pending`.
    #[instrument(skip(self))]
    pub async fn cancel_own(
        &self,
        user_id: &UserId,
        sale_id: &SaleId,
    ) -> Result<SaleRecord, ServiceError> {
        let sale = self
            .referrals
            .cancel_sale(sale_id, |sale| {
                if &sale.user_id != user_id {
                    return Err(ServiceError::NotFound("sale"));
                }
                if sale.status != SaleStatus::Pending {
                    return Err(ServiceError::conflict(format!(
                        "only pending orders can be cancelled (status is {})",
                        sale.status
                    )));
                }
                Ok(())
            })
            .await?;

        tracing::info!(sale_id = %sale_id, "Order cancelled by customer");
        Ok(SaleRecord {
            id: sale_id.clone(),
            sale,
        })
    }

    /// Apply an admin action to a sale.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Transition` if the action is illegal from the
    /// sale's current status.
    #[instrument(skip(self))]
    pub async fn apply_action(
        &self,
        sale_id: &SaleId,
        action: SaleAction,
    ) -> Result<SaleRecord, ServiceError> {
        if action == SaleAction::Cancel {
            let sale = self
                .referrals
                .cancel_sale(sale_id, |sale| {
                    sale.status.apply(action).map(drop).map_err(ServiceError::from)
                })
                .await?;
            tracing::info!(sale_id = %sale_id, "Sale cancelled");
            return Ok(SaleRecord {
                id: sale_id.clone(),
                sale,
            });
        }

        let mut sale = self.sales.require(sale_id).await.map_err(not_found("sale"))?;
        let next = sale.status.apply(action)?;

        self.sales.set_status(sale_id, next).await?;
        tracing::info!(sale_id = %sale_id, from = %sale.status, to = %next, "Sale status changed");
        sale.status = next;
        Ok(SaleRecord {
            id: sale_id.clone(),
            sale,
        })
    }
}
