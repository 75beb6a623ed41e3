//! Refill Core - Domain types and rules.
//!
//! This crate provides the delivery-subscription domain shared by all Refill
//! components:
//! - `server` - JSON API over the document store
//! - `cli` - Command-line tools for migrations and catalogue management
//!
//! # Architecture
//!
//! The core crate contains only types and pure functions - no I/O, no database
//! access, no HTTP clients. Every rule that can be checked without touching the
//! store lives here so it can be tested in isolation.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for IDs, money, emails, statuses and timestamps
//! - [`schedule`] - Weekly delivery schedule generation and slot tracking
//! - [`referral`] - Referral codes and the pending/confirmed points ledger
//! - [`plan`] - Subscription plan pricing
//! - [`profile`] - Derived profile figures (remaining gallons, next delivery)

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod plan;
pub mod profile;
pub mod referral;
pub mod schedule;
pub mod types;

pub use plan::{CUSTOM_PLAN_NAME, DeliveryFrequency, PlanError, PlanTerms};
pub use profile::remaining_gallons;
pub use referral::{
    GrantKind, LedgerError, ReferralCode, ReferralCodeError, ReferralLedger, referral_points,
};
pub use schedule::{DeliverySchedule, DeliverySlot, ScheduleError, WEEKS_PER_MONTH};
pub use types::*;
