//! Document models.

pub mod account;
pub mod plan;
pub mod product;
pub mod sale;
pub mod user;

pub use account::{Account, CurrentUser, Session};
pub use plan::{Plan, PlanRecord};
pub use product::{Product, ProductRecord};
pub use sale::{Sale, SaleRecord, SaleReferral};
pub use user::{LoyaltyPoints, PaymentDetails, PersonalDetails, SubscriptionDetails, UserProfile};
