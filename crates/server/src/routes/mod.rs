//! HTTP route handlers.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                              - Liveness
//! GET  /health/ready                        - Store connectivity
//!
//! # Auth
//! POST /auth/register                       - Create account and profile
//! POST /auth/login                          - Issue bearer token
//! POST /auth/logout                         - End session
//! GET  /auth/session                        - Signed-in user
//!
//! # Customer
//! GET  /plans                               - Admin plans + own custom plan
//! POST /plans/custom                        - Create own custom plan
//! POST /subscriptions                       - Subscribe to a plan
//! GET  /profile                             - Profile with schedule summary
//! POST /referrals/code                      - Get or issue referral code
//! GET  /products                            - Product catalogue
//! GET  /orders                              - Own sales
//! POST /orders                              - One-time purchase
//! POST /orders/{id}/cancel                  - Cancel own pending order
//!
//! # Admin
//! POST /admin/plans                         - Create catalogue plan
//! POST /admin/products                      - Create product
//! GET  /admin/sales?type=                   - All sales
//! POST /admin/sales/{id}/status             - confirm / deliver / cancel
//! POST /admin/sales/{id}/mark-paid          - Mark paid, settle referral
//! GET  /admin/deliveries                    - Active subscribers
//! GET  /admin/deliveries/calendar           - Slots grouped by date
//! POST /admin/deliveries/{user_id}/deliver  - Mark a slot delivered (?index=)
//! ```

pub mod admin;
pub mod auth;
pub mod orders;
pub mod plans;
pub mod profile;

use axum::Router;

use crate::state::AppState;

/// Build the complete API router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .merge(auth::router())
        .merge(plans::router())
        .merge(profile::router())
        .merge(orders::router())
        .merge(admin::router())
}
