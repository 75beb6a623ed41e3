//! Referral codes and the referral points ledger.
//!
//! A customer who buys a subscription may quote another customer's referral
//! code. The referrer earns [`referral_points`] for the sale. Cash on delivery
//! sales park the grant as *pending* until an admin marks the sale paid;
//! every other payment method credits it straight away.

use core::fmt;

use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;
use serde::{Deserialize, Serialize};

use crate::types::{Amount, PaymentMethod};

/// Points a referrer earns for a sale: 10% of the total price, rounded down.
///
/// Never negative; a non-positive total earns nothing.
///
/// ```
/// use refill_core::{Amount, referral_points};
///
/// assert_eq!(referral_points(Amount::from_pesos(1000)), 100);
/// assert_eq!(referral_points(Amount::from_centavos(99_999)), 99);
/// ```
#[must_use]
pub fn referral_points(total_price: Amount) -> u64 {
    (total_price.value() * Decimal::new(1, 1))
        .floor()
        .to_u64()
        .unwrap_or(0)
}

/// Errors that can occur when parsing a [`ReferralCode`].
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum ReferralCodeError {
    #[error("referral code must start with REF-")]
    MissingPrefix,
    #[error("referral code must have 8 letters or digits after REF-")]
    InvalidSuffix,
}

/// A referral code: `REF-` followed by 8 uppercase letters or digits.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ReferralCode(String);

impl ReferralCode {
    pub const PREFIX: &'static str = "REF-";
    pub const SUFFIX_LEN: usize = 8;

    /// Parse a code typed by a customer. Surrounding whitespace is ignored and
    /// lowercase letters are accepted.
    ///
    /// # Errors
    ///
    /// Returns an error if the prefix is missing or the suffix is malformed.
    pub fn parse(s: &str) -> Result<Self, ReferralCodeError> {
        let upper = s.trim().to_ascii_uppercase();
        let suffix = upper
            .strip_prefix(Self::PREFIX)
            .ok_or(ReferralCodeError::MissingPrefix)?;
        Self::from_suffix(suffix)
    }

    /// Build a code from its 8-character suffix.
    ///
    /// # Errors
    ///
    /// Returns `ReferralCodeError::InvalidSuffix` unless the suffix is exactly
    /// 8 ASCII letters or digits.
    pub fn from_suffix(suffix: &str) -> Result<Self, ReferralCodeError> {
        if suffix.len() != Self::SUFFIX_LEN || !suffix.chars().all(|c| c.is_ascii_alphanumeric())
        {
            return Err(ReferralCodeError::InvalidSuffix);
        }
        Ok(Self(format!(
            "{}{}",
            Self::PREFIX,
            suffix.to_ascii_uppercase()
        )))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ReferralCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for ReferralCode {
    type Error = ReferralCodeError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        Self::parse(&s)
    }
}

impl From<ReferralCode> for String {
    fn from(code: ReferralCode) -> Self {
        code.0
    }
}

/// Errors raised by ledger updates.
#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum LedgerError {
    #[error("referrer has {available} pending points but {requested} were requested")]
    InsufficientPending { available: u64, requested: u64 },
}

/// The `referral_details` block of a user document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferralLedger {
    /// This user's own code, once generated.
    #[serde(default)]
    pub referral_code: Option<ReferralCode>,
    /// Confirmed points.
    #[serde(default)]
    pub referral_points: u64,
    /// Points waiting on a cash on delivery payment.
    #[serde(default)]
    pub referral_points_pending: u64,
    /// Paid sales this user referred.
    #[serde(default)]
    pub referrals_count: u32,
    /// Code this user quoted when subscribing.
    #[serde(default)]
    pub referred_by: Option<ReferralCode>,
}

/// Where a fresh grant landed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GrantKind {
    Pending,
    Confirmed,
}

impl GrantKind {
    /// Cash on delivery grants stay pending until the sale is paid.
    #[must_use]
    pub const fn for_payment(method: PaymentMethod) -> Self {
        match method {
            PaymentMethod::CashOnDelivery => Self::Pending,
            PaymentMethod::CreditCard | PaymentMethod::BankTransfer => Self::Confirmed,
        }
    }
}

impl ReferralLedger {
    /// Record a grant for a newly referred sale.
    ///
    /// Pending grants only add to `referral_points_pending`; the referral is
    /// counted when the grant is settled. Confirmed grants add to
    /// `referral_points` and count the referral immediately.
    pub fn grant(&mut self, points: u64, kind: GrantKind) {
        match kind {
            GrantKind::Pending => {
                self.referral_points_pending = self.referral_points_pending.saturating_add(points);
            }
            GrantKind::Confirmed => {
                self.referral_points = self.referral_points.saturating_add(points);
                self.referrals_count = self.referrals_count.saturating_add(1);
            }
        }
    }

    /// Move a pending grant into confirmed points and count the referral.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InsufficientPending` if fewer than `points`
    /// pending points remain; the ledger is left untouched.
    pub fn settle(&mut self, points: u64) -> Result<(), LedgerError> {
        let remaining = self.referral_points_pending.checked_sub(points).ok_or(
            LedgerError::InsufficientPending {
                available: self.referral_points_pending,
                requested: points,
            },
        )?;

        self.referral_points_pending = remaining;
        self.referral_points = self.referral_points.saturating_add(points);
        self.referrals_count = self.referrals_count.saturating_add(1);
        Ok(())
    }

    /// Drop a pending grant whose sale was cancelled.
    ///
    /// Confirmed points and the referral count are not touched.
    ///
    /// # Errors
    ///
    /// Returns `LedgerError::InsufficientPending` if fewer than `points`
    /// pending points remain; the ledger is left untouched.
    pub fn revoke(&mut self, points: u64) -> Result<(), LedgerError> {
        self.referral_points_pending = self.referral_points_pending.checked_sub(points).ok_or(
            LedgerError::InsufficientPending {
                available: self.referral_points_pending,
                requested: points,
            },
        )?;
        Ok(())
    }

    /// Total points ever granted, pending or confirmed.
    #[must_use]
    pub const fn total_granted(&self) -> u64 {
        self.referral_points.saturating_add(self.referral_points_pending)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_points_round_down() {
        assert_eq!(referral_points(Amount::from_pesos(1000)), 100);
        assert_eq!(referral_points(Amount::from_pesos(1009)), 100);
        assert_eq!(referral_points(Amount::from_centavos(2250)), 2);
        assert_eq!(referral_points(Amount::from_pesos(9)), 0);
    }

    #[test]
    fn test_points_never_negative() {
        assert_eq!(referral_points(Amount::from_pesos(-500)), 0);
        assert_eq!(referral_points(Amount::ZERO), 0);
    }

    #[test]
    fn test_code_parse() {
        let code = ReferralCode::parse(" ref-ab12cd34 ").unwrap();
        assert_eq!(code.as_str(), "REF-AB12CD34");

        assert_eq!(
            ReferralCode::parse("AB12CD34"),
            Err(ReferralCodeError::MissingPrefix)
        );
        assert_eq!(
            ReferralCode::parse("REF-AB12"),
            Err(ReferralCodeError::InvalidSuffix)
        );
        assert_eq!(
            ReferralCode::parse("REF-AB12-D34"),
            Err(ReferralCodeError::InvalidSuffix)
        );
    }

    #[test]
    fn test_cash_on_delivery_then_settle() {
        let mut ledger = ReferralLedger::default();

        ledger.grant(100, GrantKind::for_payment(PaymentMethod::CashOnDelivery));
        assert_eq!(ledger.referral_points_pending, 100);
        assert_eq!(ledger.referral_points, 0);
        assert_eq!(ledger.referrals_count, 0);

        ledger.settle(100).unwrap();
        assert_eq!(ledger.referral_points_pending, 0);
        assert_eq!(ledger.referral_points, 100);
        assert_eq!(ledger.referrals_count, 1);
    }

    #[test]
    fn test_immediate_payment_confirms() {
        let mut ledger = ReferralLedger::default();
        ledger.grant(45, GrantKind::for_payment(PaymentMethod::CreditCard));

        assert_eq!(ledger.referral_points, 45);
        assert_eq!(ledger.referral_points_pending, 0);
        assert_eq!(ledger.referrals_count, 1);
    }

    #[test]
    fn test_settle_more_than_pending_is_rejected() {
        let mut ledger = ReferralLedger::default();
        ledger.grant(10, GrantKind::Pending);

        let before = ledger.clone();
        assert_eq!(
            ledger.settle(50),
            Err(LedgerError::InsufficientPending {
                available: 10,
                requested: 50
            })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_revoke_releases_only_pending() {
        let mut ledger = ReferralLedger::default();
        ledger.grant(40, GrantKind::Pending);
        ledger.grant(15, GrantKind::Confirmed);

        ledger.revoke(40).unwrap();
        assert_eq!(ledger.referral_points_pending, 0);
        assert_eq!(ledger.referral_points, 15);
        assert_eq!(ledger.referrals_count, 1);

        let before = ledger.clone();
        assert_eq!(
            ledger.revoke(1),
            Err(LedgerError::InsufficientPending {
                available: 0,
                requested: 1
            })
        );
        assert_eq!(ledger, before);
    }

    #[test]
    fn test_total_granted_tracks_grants() {
        let mut ledger = ReferralLedger::default();
        ledger.grant(30, GrantKind::Pending);
        ledger.grant(20, GrantKind::Confirmed);
        ledger.settle(30).unwrap();
        assert_eq!(ledger.total_granted(), 50);
    }

    #[test]
    fn test_ledger_defaults_missing_fields() {
        let ledger: ReferralLedger =
            serde_json::from_value(serde_json::json!({"referrals_count": 2})).unwrap();
        assert_eq!(ledger.referrals_count, 2);
        assert!(ledger.referral_code.is_none());
    }
}
