//! Subscription plan pricing.
//!
//! Admins publish catalogue plans with their own per-gallon price. Each
//! customer may also author one "custom" plan at a fixed price. Both kinds
//! share the same arithmetic:
//!
//! ```text
//! total_gallons        = gallons_per_week × 4 × months
//! total_price          = total_gallons × price_per_gallon
//! total_loyalty_points = total_gallons × points_per_gallon + bonus_points
//! ```

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::schedule::WEEKS_PER_MONTH;
use crate::types::{Amount, PlanStatus};

/// Name given to every customer-authored plan.
pub const CUSTOM_PLAN_NAME: &str = "Custom Subscription";

/// Price per gallon for customer-authored plans (22.50).
#[must_use]
pub fn custom_price_per_gallon() -> Amount {
    Amount::from_centavos(2250)
}

/// Errors raised when plan inputs are invalid.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum PlanError {
    #[error("subscription name cannot be empty")]
    EmptyName,
    #[error("gallons per week must be at least 1")]
    ZeroGallons,
    #[error("subscription duration must be at least one month")]
    ZeroDuration,
    #[error("price per gallon must be greater than zero")]
    NonPositivePrice,
    #[error("plan is too large")]
    Overflow,
}

/// Delivery cadence. Only weekly delivery is offered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeliveryFrequency {
    #[default]
    Weekly,
}

/// Computed terms of a subscription plan, as stored on the plan document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanTerms {
    pub subscription_name: String,
    pub gallons_per_week: u32,
    pub total_gallons: u32,
    pub price_per_gallon: Amount,
    pub total_price: Amount,
    pub points_per_gallon: Decimal,
    pub bonus_points: u64,
    pub total_loyalty_points: Decimal,
    /// Months.
    pub subscription_duration: u32,
    #[serde(default)]
    pub delivery_frequency: DeliveryFrequency,
    pub status: PlanStatus,
}

impl PlanTerms {
    /// Terms for an admin catalogue plan: one loyalty point per gallon, active.
    ///
    /// # Errors
    ///
    /// Returns a `PlanError` if the name is blank, a quantity is zero or the
    /// price is not positive.
    pub fn admin(
        name: &str,
        gallons_per_week: u32,
        price_per_gallon: Amount,
        months: u32,
        bonus_points: u64,
    ) -> Result<Self, PlanError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(PlanError::EmptyName);
        }
        Self::compute(
            name.to_owned(),
            gallons_per_week,
            price_per_gallon,
            months,
            Decimal::ONE,
            bonus_points,
            PlanStatus::Active,
        )
    }

    /// Terms for a customer-authored plan.
    ///
    /// Fixed price of 22.50 per gallon and 0.1 loyalty points per gallon.
    /// Custom plans are stored inactive so they never show up as a catalogue
    /// offer for other customers.
    ///
    /// # Errors
    ///
    /// Returns a `PlanError` if a quantity is zero.
    pub fn custom(gallons_per_week: u32, months: u32, bonus_points: u64) -> Result<Self, PlanError> {
        Self::compute(
            CUSTOM_PLAN_NAME.to_owned(),
            gallons_per_week,
            custom_price_per_gallon(),
            months,
            Decimal::new(1, 1),
            bonus_points,
            PlanStatus::Inactive,
        )
    }

    fn compute(
        subscription_name: String,
        gallons_per_week: u32,
        price_per_gallon: Amount,
        months: u32,
        points_per_gallon: Decimal,
        bonus_points: u64,
        status: PlanStatus,
    ) -> Result<Self, PlanError> {
        if gallons_per_week == 0 {
            return Err(PlanError::ZeroGallons);
        }
        if months == 0 {
            return Err(PlanError::ZeroDuration);
        }
        if !price_per_gallon.is_positive() {
            return Err(PlanError::NonPositivePrice);
        }

        let total_gallons = gallons_per_week
            .checked_mul(WEEKS_PER_MONTH)
            .and_then(|g| g.checked_mul(months))
            .ok_or(PlanError::Overflow)?;
        let total_price = price_per_gallon
            .times(total_gallons)
            .ok_or(PlanError::Overflow)?;

        Ok(Self {
            subscription_name,
            gallons_per_week,
            total_gallons,
            price_per_gallon,
            total_price,
            points_per_gallon,
            bonus_points,
            total_loyalty_points: Decimal::from(total_gallons) * points_per_gallon
                + Decimal::from(bonus_points),
            subscription_duration: months,
            delivery_frequency: DeliveryFrequency::Weekly,
            status,
        })
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_admin_plan() {
        let plan = PlanTerms::admin("Family", 5, Amount::from_pesos(25), 2, 10).unwrap();

        assert_eq!(plan.total_gallons, 40);
        assert_eq!(plan.total_price, Amount::from_pesos(1000));
        assert_eq!(plan.points_per_gallon, Decimal::ONE);
        assert_eq!(plan.total_loyalty_points, Decimal::from(50));
        assert_eq!(plan.status, PlanStatus::Active);
    }

    #[test]
    fn test_custom_plan() {
        let plan = PlanTerms::custom(5, 2, 0).unwrap();

        assert_eq!(plan.subscription_name, CUSTOM_PLAN_NAME);
        assert_eq!(plan.total_gallons, 40);
        assert_eq!(plan.total_price, Amount::from_pesos(900));
        assert_eq!(plan.total_loyalty_points, Decimal::from(4));
        assert_eq!(plan.status, PlanStatus::Inactive);
    }

    #[test]
    fn test_custom_loyalty_can_be_fractional() {
        let plan = PlanTerms::custom(1, 1, 3).unwrap();
        assert_eq!(plan.total_loyalty_points, Decimal::new(34, 1));
    }

    #[test]
    fn test_rejects_invalid_inputs() {
        assert_eq!(
            PlanTerms::admin("  ", 1, Amount::from_pesos(1), 1, 0),
            Err(PlanError::EmptyName)
        );
        assert_eq!(PlanTerms::custom(0, 1, 0), Err(PlanError::ZeroGallons));
        assert_eq!(PlanTerms::custom(1, 0, 0), Err(PlanError::ZeroDuration));
        assert_eq!(
            PlanTerms::admin("Zero", 1, Amount::ZERO, 1, 0),
            Err(PlanError::NonPositivePrice)
        );
        assert_eq!(PlanTerms::custom(u32::MAX, 2, 0), Err(PlanError::Overflow));
    }

    #[test]
    fn test_price_overflow_is_an_error() {
        assert_eq!(
            PlanTerms::admin("Big", 1000, Amount::new(Decimal::MAX), 1, 0),
            Err(PlanError::Overflow)
        );
    }

    #[test]
    fn test_document_shape() {
        let plan = PlanTerms::custom(2, 1, 0).unwrap();
        let json = serde_json::to_value(&plan).unwrap();

        assert_eq!(json["price_per_gallon"], "22.50");
        assert_eq!(json["delivery_frequency"], "Weekly");
        assert_eq!(json["status"], "inactive");
    }
}
