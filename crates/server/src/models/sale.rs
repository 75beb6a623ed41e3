//! Sale document (`sales/{sale_id}`).

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use refill_core::{
    Amount, DeliveryAddress, PaymentMethod, PaymentStatus, PlanId, ProductId, ReferralCode,
    SaleId, SaleStatus, SaleType, Timestamp, UserId,
};

/// Referral attached to a subscription sale.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaleReferral {
    pub referral_code: ReferralCode,
    /// Points granted for this sale.
    pub referral_points: u64,
    /// Portion of the grant still waiting on payment.
    pub referral_points_pending: u64,
    pub referrer_id: UserId,
    pub referred_user_name: String,
}

/// A sale record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sale {
    #[serde(rename = "type")]
    pub sale_type: SaleType,
    pub user_id: UserId,
    pub customer_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub plan_id: Option<PlanId>,
    /// Product or plan name at the time of sale.
    pub item_name: String,
    pub quantity: u32,
    pub total_price: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_gallons: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date: Option<NaiveDate>,
    pub payment_method: PaymentMethod,
    pub payment_status: PaymentStatus,
    pub delivery_address: DeliveryAddress,
    pub status: SaleStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referral_details: Option<SaleReferral>,
    pub created_at: Timestamp,
}

/// A sale with its key, as returned by the API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SaleRecord {
    pub id: SaleId,
    #[serde(flatten)]
    pub sale: Sale,
}
