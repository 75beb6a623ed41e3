//! Status enums for users, sales, plans and delivery slots.
//!
//! The serialized spellings match the documents already in the store
//! (`"Ready to Deliver"`, `"cash_on_delivery"`, ...), so renames here are
//! data migrations.

use serde::{Deserialize, Serialize};

/// Whether a user currently has a running subscription.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SubscriptionStatus {
    Active,
    #[default]
    Inactive,
}

/// State of a single scheduled delivery slot.
///
/// Slots only move forward: `Pending -> Delivered`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum DeliveryStatus {
    #[default]
    Pending,
    Delivered,
}

/// Kind of sale record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SaleType {
    /// Product bought once, no schedule.
    OneTime,
    /// Derived from a subscription plan purchase.
    Subscription,
}

impl std::str::FromStr for SaleType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "one-time" => Ok(Self::OneTime),
            "subscription" => Ok(Self::Subscription),
            _ => Err(format!("invalid sale type: {s}")),
        }
    }
}

/// Error returned when a sale status change is not allowed.
#[derive(thiserror::Error, Debug, Clone, Copy, PartialEq, Eq)]
#[error("sale cannot move from {from} to {to}")]
pub struct TransitionError {
    /// Current status.
    pub from: SaleStatus,
    /// Requested status.
    pub to: SaleStatus,
}

/// Fulfilment status of a sale.
///
/// ```text
/// Pending ──confirm──> Ready to Deliver ──deliver──> Delivered
///    │                        │
///    └───────cancel───────────┴──────> Cancelled
/// ```
///
/// `Delivered` and `Cancelled` are terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
pub enum SaleStatus {
    #[default]
    Pending,
    #[serde(rename = "Ready to Deliver")]
    ReadyToDeliver,
    Delivered,
    Cancelled,
}

impl SaleStatus {
    /// Whether no further transitions are possible.
    #[must_use]
    pub const fn is_terminal(self) -> bool {
        matches!(self, Self::Delivered | Self::Cancelled)
    }

    /// Whether `self -> next` is a legal transition.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Pending, Self::ReadyToDeliver | Self::Cancelled)
                | (Self::ReadyToDeliver, Self::Delivered | Self::Cancelled)
        )
    }

    /// Validate a transition and return the new status.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` if the move skips a step, goes backwards or
    /// leaves a terminal state.
    pub const fn transition(self, next: Self) -> Result<Self, TransitionError> {
        if self.can_transition_to(next) {
            Ok(next)
        } else {
            Err(TransitionError {
                from: self,
                to: next,
            })
        }
    }

    /// Apply an admin action to this status.
    ///
    /// # Errors
    ///
    /// Returns `TransitionError` if the action is not valid from the current status.
    pub const fn apply(self, action: SaleAction) -> Result<Self, TransitionError> {
        self.transition(action.target())
    }
}

impl std::fmt::Display for SaleStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let label = match self {
            Self::Pending => "Pending",
            Self::ReadyToDeliver => "Ready to Deliver",
            Self::Delivered => "Delivered",
            Self::Cancelled => "Cancelled",
        };
        f.write_str(label)
    }
}

/// Admin action on a sale.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SaleAction {
    Confirm,
    Deliver,
    Cancel,
}

impl SaleAction {
    /// Status this action moves a sale to.
    #[must_use]
    pub const fn target(self) -> SaleStatus {
        match self {
            Self::Confirm => SaleStatus::ReadyToDeliver,
            Self::Deliver => SaleStatus::Delivered,
            Self::Cancel => SaleStatus::Cancelled,
        }
    }
}

/// How a customer pays.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    #[serde(alias = "Cash on Delivery")]
    CashOnDelivery,
    #[serde(alias = "Credit Card")]
    CreditCard,
    #[serde(alias = "Bank Transfer")]
    BankTransfer,
}

impl PaymentMethod {
    /// Payment status a new sale starts with.
    ///
    /// Cash is collected at the door, so it starts pending; every other
    /// method is settled at checkout.
    #[must_use]
    pub const fn initial_status(self) -> PaymentStatus {
        match self {
            Self::CashOnDelivery => PaymentStatus::Pending,
            Self::CreditCard | Self::BankTransfer => PaymentStatus::Paid,
        }
    }
}

/// Settlement status of a payment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    /// Nothing bought yet (fresh registration).
    #[default]
    Unpaid,
    Pending,
    Paid,
}

/// Whether a plan can be subscribed to from the catalogue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    #[default]
    Active,
    Inactive,
}

/// Account role with different permission levels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Buys products and subscriptions.
    #[default]
    Customer,
    /// Manages plans, products, sales and deliveries.
    Admin,
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Customer => write!(f, "customer"),
            Self::Admin => write!(f, "admin"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "customer" => Ok(Self::Customer),
            "admin" => Ok(Self::Admin),
            _ => Err(format!("invalid role: {s}")),
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    const ALL: [SaleStatus; 4] = [
        SaleStatus::Pending,
        SaleStatus::ReadyToDeliver,
        SaleStatus::Delivered,
        SaleStatus::Cancelled,
    ];

    #[test]
    fn test_happy_path() {
        let status = SaleStatus::Pending
            .apply(SaleAction::Confirm)
            .and_then(|s| s.apply(SaleAction::Deliver))
            .unwrap();
        assert_eq!(status, SaleStatus::Delivered);
    }

    #[test]
    fn test_cannot_skip_confirmation() {
        let err = SaleStatus::Pending.apply(SaleAction::Deliver).unwrap_err();
        assert_eq!(err.from, SaleStatus::Pending);
        assert_eq!(err.to, SaleStatus::Delivered);
    }

    #[test]
    fn test_cancel_from_open_states_only() {
        assert!(SaleStatus::Pending.can_transition_to(SaleStatus::Cancelled));
        assert!(SaleStatus::ReadyToDeliver.can_transition_to(SaleStatus::Cancelled));
        assert!(!SaleStatus::Delivered.can_transition_to(SaleStatus::Cancelled));
    }

    #[test]
    fn test_terminal_states_have_no_exits() {
        for from in ALL.into_iter().filter(|s| s.is_terminal()) {
            for to in ALL {
                assert!(!from.can_transition_to(to), "{from} -> {to} should be rejected");
            }
        }
    }

    #[test]
    fn test_never_moves_backwards() {
        let rank = |s: SaleStatus| match s {
            SaleStatus::Pending => 0,
            SaleStatus::ReadyToDeliver => 1,
            SaleStatus::Delivered => 2,
            SaleStatus::Cancelled => 3,
        };
        for from in ALL {
            for to in ALL {
                if from.can_transition_to(to) {
                    assert!(rank(to) > rank(from));
                }
            }
        }
    }

    #[test]
    fn test_serialized_spellings() {
        assert_eq!(
            serde_json::to_string(&SaleStatus::ReadyToDeliver).unwrap(),
            "\"Ready to Deliver\""
        );
        assert_eq!(serde_json::to_string(&SaleType::OneTime).unwrap(), "\"one-time\"");
        assert_eq!(
            serde_json::to_string(&PaymentMethod::CashOnDelivery).unwrap(),
            "\"cash_on_delivery\""
        );
        let legacy: PaymentMethod = serde_json::from_str("\"Cash on Delivery\"").unwrap();
        assert_eq!(legacy, PaymentMethod::CashOnDelivery);
    }

    #[test]
    fn test_initial_payment_status() {
        assert_eq!(
            PaymentMethod::CashOnDelivery.initial_status(),
            PaymentStatus::Pending
        );
        assert_eq!(PaymentMethod::BankTransfer.initial_status(), PaymentStatus::Paid);
    }

    #[test]
    fn test_role_roundtrip() {
        assert_eq!("admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!(Role::Customer.to_string(), "customer");
        assert!("root".parse::<Role>().is_err());
    }
}
