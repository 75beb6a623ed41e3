//! Business services.
//!
//! Services borrow the document store for the duration of a request and
//! combine repositories into the operations exposed by the HTTP routes and the
//! CLI.

pub mod auth;
pub mod catalogue;
pub mod deliveries;
pub mod error;
pub mod orders;
pub mod profile;
pub mod referrals;
pub mod subscriptions;

pub use auth::{AuthError, AuthService};
pub use catalogue::CatalogueService;
pub use deliveries::DeliveryService;
pub use error::ServiceError;
pub use orders::OrderService;
pub use profile::ProfileService;
pub use referrals::ReferralService;
pub use subscriptions::SubscriptionService;
