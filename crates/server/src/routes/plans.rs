//! Plan catalogue and subscription checkout.

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    routing::{get, post},
};
use tracing::instrument;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::PlanRecord;
use crate::services::catalogue::NewCustomPlan;
use crate::services::subscriptions::{SubscribeRequest, Subscribed};
use crate::services::{CatalogueService, SubscriptionService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/plans", get(list_plans))
        .route("/plans/custom", post(create_custom_plan))
        .route("/subscriptions", post(subscribe))
}

/// Admin plans plus the caller's own custom plan.
pub async fn list_plans(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<PlanRecord>>> {
    let plans = CatalogueService::new(state.store())
        .plans_for(&user.user_id)
        .await?;
    Ok(Json(plans))
}

#[instrument(skip(user, state), fields(user_id = %user.user_id))]
pub async fn create_custom_plan(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(form): Json<NewCustomPlan>,
) -> Result<(StatusCode, Json<PlanRecord>)> {
    let plan = CatalogueService::new(state.store())
        .create_custom_plan(&user.user_id, &form)
        .await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

#[instrument(skip(user, state, request), fields(user_id = %user.user_id))]
pub async fn subscribe(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(request): Json<SubscribeRequest>,
) -> Result<(StatusCode, Json<Subscribed>)> {
    let outcome =
        SubscriptionService::new(state.store(), state.ledger_lock(), state.delivery_lock())
            .subscribe(&user.user_id, &request)
            .await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}
