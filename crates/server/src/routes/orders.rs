//! Products and one-time orders.

use axum::{
    Json, Router,
    extract::{Path, State},
    http::StatusCode,
    routing::{get, post},
};
use tracing::instrument;

use refill_core::SaleId;

use crate::error::Result;
use crate::middleware::RequireUser;
use crate::models::{ProductRecord, SaleRecord};
use crate::services::orders::PurchaseRequest;
use crate::services::{CatalogueService, OrderService};
use crate::state::AppState;

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/products", get(list_products))
        .route("/orders", get(list_orders).post(purchase))
        .route("/orders/{id}/cancel", post(cancel))
}

pub async fn list_products(State(state): State<AppState>) -> Result<Json<Vec<ProductRecord>>> {
    let products = CatalogueService::new(state.store()).products().await?;
    Ok(Json(products))
}

#[instrument(skip(user, state, request), fields(user_id = %user.user_id))]
pub async fn purchase(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Json(request): Json<PurchaseRequest>,
) -> Result<(StatusCode, Json<SaleRecord>)> {
    let sale = OrderService::new(state.store(), state.ledger_lock())
        .purchase(&user.user_id, &request)
        .await?;
    Ok((StatusCode::CREATED, Json(sale)))
}

/// The caller's own orders and subscriptions, newest first.
pub async fn list_orders(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
) -> Result<Json<Vec<SaleRecord>>> {
    let sales = OrderService::new(state.store(), state.ledger_lock())
        .list_for(&user.user_id)
        .await?;
    Ok(Json(sales))
}

#[instrument(skip(user, state), fields(user_id = %user.user_id))]
pub async fn cancel(
    RequireUser(user): RequireUser,
    State(state): State<AppState>,
    Path(id): Path<SaleId>,
) -> Result<Json<SaleRecord>> {
    let sale = OrderService::new(state.store(), state.ledger_lock())
        .cancel_own(&user.user_id, &id)
        .await?;
    Ok(Json(sale))
}
