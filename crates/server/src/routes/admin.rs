//! Admin operations: catalogue, sales and deliveries.

use axum::{
    Json, Router,
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
};
use serde::Deserialize;
use tracing::instrument;

use refill_core::{SaleAction, SaleId, SaleType, UserId};

use crate::error::Result;
use crate::middleware::RequireAdmin;
use crate::models::{PlanRecord, ProductRecord, SaleRecord};
use crate::services::catalogue::{NewPlan, NewProduct};
use crate::services::deliveries::{CalendarDay, DeliveryUpdate, Subscriber};
use crate::services::{CatalogueService, DeliveryService, OrderService, ReferralService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/admin/plans", post(create_plan))
        .route("/admin/products", post(create_product))
        .route("/admin/sales", get(list_sales))
        .route("/admin/sales/{id}/status", post(update_sale_status))
        .route("/admin/sales/{id}/mark-paid", post(mark_paid))
        .route("/admin/deliveries", get(list_subscribers))
        .route("/admin/deliveries/calendar", get(calendar))
        .route("/admin/deliveries/{user_id}/deliver", post(deliver))
}

#[derive(Debug, Deserialize)]
pub struct SalesQuery {
    #[serde(rename = "type")]
    pub sale_type: Option<SaleType>,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub action: SaleAction,
}

#[derive(Debug, Default, Deserialize)]
pub struct DeliverQuery {
    /// Slot to mark; the next pending slot when omitted.
    pub index: Option<usize>,
}

#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn create_plan(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(form): Json<NewPlan>,
) -> Result<(StatusCode, Json<PlanRecord>)> {
    let plan = CatalogueService::new(state.store()).create_plan(&form).await?;
    Ok((StatusCode::CREATED, Json(plan)))
}

#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn create_product(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Json(form): Json<NewProduct>,
) -> Result<(StatusCode, Json<ProductRecord>)> {
    let product = CatalogueService::new(state.store())
        .create_product(&form)
        .await?;
    Ok((StatusCode::CREATED, Json(product)))
}

/// All sales, optionally `?type=one-time` or `?type=subscription`.
pub async fn list_sales(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
    Query(query): Query<SalesQuery>,
) -> Result<Json<Vec<SaleRecord>>> {
    let sales = OrderService::new(state.store(), state.ledger_lock())
        .list_all(query.sale_type)
        .await?;
    Ok(Json(sales))
}

#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn update_sale_status(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<SaleId>,
    Json(body): Json<StatusRequest>,
) -> Result<Json<SaleRecord>> {
    let sale = OrderService::new(state.store(), state.ledger_lock())
        .apply_action(&id, body.action)
        .await?;
    Ok(Json(sale))
}

/// Mark a sale paid, confirming any pending referral points.
#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn mark_paid(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(id): Path<SaleId>,
) -> Result<StatusCode> {
    ReferralService::new(state.store(), state.ledger_lock())
        .mark_sale_paid(&id)
        .await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn list_subscribers(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<Subscriber>>> {
    let subscribers = DeliveryService::new(state.store(), state.delivery_lock())
        .active_subscribers()
        .await?;
    Ok(Json(subscribers))
}

pub async fn calendar(
    RequireAdmin(_admin): RequireAdmin,
    State(state): State<AppState>,
) -> Result<Json<Vec<CalendarDay>>> {
    let days = DeliveryService::new(state.store(), state.delivery_lock())
        .calendar()
        .await?;
    Ok(Json(days))
}

/// Mark one delivery slot delivered, `?index=` or the next pending one.
#[instrument(skip(admin, state), fields(admin = %admin.email))]
pub async fn deliver(
    RequireAdmin(admin): RequireAdmin,
    State(state): State<AppState>,
    Path(user_id): Path<UserId>,
    Query(query): Query<DeliverQuery>,
) -> Result<Json<DeliveryUpdate>> {
    let update = DeliveryService::new(state.store(), state.delivery_lock())
        .mark_delivered(&user_id, query.index)
        .await?;
    Ok(Json(update))
}
