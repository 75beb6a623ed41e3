//! Product document (`products/{product_id}`).

use serde::{Deserialize, Serialize};

use refill_core::{Amount, ProductId, Timestamp};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub name: String,
    pub price: Amount,
    /// Reference to an externally hosted image.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    pub created_at: Timestamp,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProductRecord {
    pub id: ProductId,
    #[serde(flatten)]
    pub product: Product,
}
