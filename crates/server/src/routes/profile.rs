//! Customer profile and referral code.

use axum::{
    Json, Router,
    extract::State,
    routing::{get, post},
};
use serde::Serialize;

use refill_core::ReferralCode;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::services::profile::ProfileView;
use crate::services::{ProfileService, ReferralService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/profile", get(show))
        .route("/referrals/code", post(referral_code))
}

#[derive(Debug, Serialize)]
pub struct ReferralCodeResponse {
    pub referral_code: ReferralCode,
}

pub async fn show(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<ProfileView>> {
    let view = ProfileService::new(state.store())
        .view(&user.user_id)
        .await?;
    Ok(Json(view))
}

/// Issue the caller's referral code, or return the one they already have.
pub async fn referral_code(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<ReferralCodeResponse>> {
    let referral_code = ReferralService::new(state.store(), state.ledger_lock())
        .ensure_code(&user.user_id)
        .await?;
    Ok(Json(ReferralCodeResponse { referral_code }))
}
