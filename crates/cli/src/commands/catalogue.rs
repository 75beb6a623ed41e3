//! Plan and product catalogue management.

use refill_core::Amount;
use refill_server::services::catalogue::{NewPlan, NewProduct};
use refill_server::services::{CatalogueService, ServiceError};
use rust_decimal::Decimal;
use thiserror::Error;

use super::{CommandError, connect};

#[derive(Debug, Error)]
pub enum CatalogueError {
    #[error(transparent)]
    Connect(#[from] CommandError),

    #[error(transparent)]
    Service(#[from] ServiceError),
}

/// Create an admin-defined subscription plan.
///
/// # Errors
///
/// Returns `CatalogueError::Service` if the terms are invalid or the write
/// fails.
pub async fn create_plan(
    name: String,
    gallons_per_week: u32,
    price_per_gallon: Decimal,
    months: u32,
    bonus_points: u64,
) -> Result<(), CatalogueError> {
    let store = connect().await?;
    let form = NewPlan {
        subscription_name: name,
        gallons_per_week,
        price_per_gallon: Amount::new(price_per_gallon),
        subscription_duration: months,
        bonus_points,
    };

    let record = CatalogueService::new(&store).create_plan(&form).await?;
    tracing::info!(
        "Plan created! ID: {}, Name: {}, Total: {}",
        record.id,
        record.plan.terms.subscription_name,
        record.plan.terms.total_price
    );
    Ok(())
}

/// Create a product for one-time orders.
///
/// # Errors
///
/// Returns `CatalogueError::Service` if the name is blank, the price is not
/// positive, or the write fails.
pub async fn create_product(
    name: String,
    price: Decimal,
    image_url: Option<String>,
) -> Result<(), CatalogueError> {
    let store = connect().await?;
    let form = NewProduct {
        name,
        price: Amount::new(price),
        image_url,
    };

    let record = CatalogueService::new(&store).create_product(&form).await?;
    tracing::info!("Product created! ID: {}, Name: {}", record.id, record.product.name);
    Ok(())
}
