//! Plans and products on offer.

use serde::Deserialize;
use tracing::instrument;

use refill_core::{Amount, PlanTerms, Timestamp, UserId};

use super::error::ServiceError;
use crate::db::{PlanRepository, ProductRepository, RepositoryError};
use crate::models::{Plan, PlanRecord, Product, ProductRecord};
use crate::store::DocumentStore;

/// Admin plan form.
#[derive(Debug, Clone, Deserialize)]
pub struct NewPlan {
    pub subscription_name: String,
    pub gallons_per_week: u32,
    pub price_per_gallon: Amount,
    /// Months.
    pub subscription_duration: u32,
    #[serde(default)]
    pub bonus_points: u64,
}

/// Customer-authored plan form. Price is fixed.
#[derive(Debug, Clone, Deserialize)]
pub struct NewCustomPlan {
    pub gallons_per_week: u32,
    pub subscription_duration: u32,
    #[serde(default)]
    pub bonus_points: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct NewProduct {
    pub name: String,
    pub price: Amount,
    #[serde(default)]
    pub image_url: Option<String>,
}

pub struct CatalogueService<'a> {
    plans: PlanRepository<'a>,
    products: ProductRepository<'a>,
}

impl<'a> CatalogueService<'a> {
    #[must_use]
    pub const fn new(store: &'a dyn DocumentStore) -> Self {
        Self {
            plans: PlanRepository::new(store),
            products: ProductRepository::new(store),
        }
    }

    /// Add an admin plan to the catalogue.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Plan` if an input is blank, zero or non-positive.
    #[instrument(skip(self))]
    pub async fn create_plan(&self, form: &NewPlan) -> Result<PlanRecord, ServiceError> {
        let terms = PlanTerms::admin(
            &form.subscription_name,
            form.gallons_per_week,
            form.price_per_gallon,
            form.subscription_duration,
            form.bonus_points,
        )?;
        let plan = Plan {
            terms,
            created_at: Timestamp::now(),
            created_by: None,
        };
        let id = self.plans.create(&plan).await?;
        tracing::info!(plan_id = %id, name = %plan.terms.subscription_name, "Plan created");
        Ok(PlanRecord { id, plan })
    }

    /// Create the caller's one custom plan.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Conflict` if the user already has a custom plan.
    #[instrument(skip(self))]
    pub async fn create_custom_plan(
        &self,
        owner: &UserId,
        form: &NewCustomPlan,
    ) -> Result<PlanRecord, ServiceError> {
        let terms = PlanTerms::custom(
            form.gallons_per_week,
            form.subscription_duration,
            form.bonus_points,
        )?;
        let plan = Plan {
            terms,
            created_at: Timestamp::now(),
            created_by: Some(owner.clone()),
        };
        let id = self
            .plans
            .create_custom(owner, &plan)
            .await
            .map_err(|e| match e {
                RepositoryError::Conflict(_) => {
                    ServiceError::conflict("you already have a custom plan")
                }
                other => other.into(),
            })?;
        Ok(PlanRecord { id, plan })
    }

    /// Admin plans plus the viewer's own custom plan.
    ///
    /// Admin plans come first, oldest first.
    ///
    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the listing fails.
    pub async fn plans_for(&self, viewer: &UserId) -> Result<Vec<PlanRecord>, ServiceError> {
        let mut plans: Vec<PlanRecord> = self
            .plans
            .list()
            .await?
            .into_iter()
            .filter(|p| p.plan.created_by.as_ref().is_none_or(|owner| owner == viewer))
            .collect();
        plans.sort_by_key(|p| (p.plan.is_custom(), p.plan.created_at));
        Ok(plans)
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Validation` for a blank name or non-positive price.
    #[instrument(skip(self))]
    pub async fn create_product(&self, form: &NewProduct) -> Result<ProductRecord, ServiceError> {
        let name = form.name.trim();
        if name.is_empty() {
            return Err(ServiceError::validation("product name cannot be empty"));
        }
        if !form.price.is_positive() {
            return Err(ServiceError::validation("price must be greater than zero"));
        }

        let product = Product {
            name: name.to_owned(),
            price: form.price,
            image_url: form
                .image_url
                .as_deref()
                .map(str::trim)
                .filter(|url| !url.is_empty())
                .map(str::to_owned),
            created_at: Timestamp::now(),
        };
        let id = self.products.create(&product).await?;
        tracing::info!(product_id = %id, name = %product.name, "Product created");
        Ok(ProductRecord { id, product })
    }

    /// # Errors
    ///
    /// Returns `ServiceError::Repository` if the listing fails.
    pub async fn products(&self) -> Result<Vec<ProductRecord>, ServiceError> {
        Ok(self.products.list().await?)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use refill_core::{PlanError, PlanStatus};

    use super::*;
    use crate::store::MemoryStore;

    fn family_plan() -> NewPlan {
        NewPlan {
            subscription_name: "Family".into(),
            gallons_per_week: 5,
            price_per_gallon: Amount::from_pesos(25),
            subscription_duration: 2,
            bonus_points: 10,
        }
    }

    #[tokio::test]
    async fn test_create_plan_computes_terms() {
        let store = MemoryStore::new();
        let catalogue = CatalogueService::new(&store);

        let record = catalogue.create_plan(&family_plan()).await.unwrap();
        assert_eq!(record.plan.terms.total_gallons, 40);
        assert_eq!(record.plan.terms.total_price, Amount::from_pesos(1000));
        assert_eq!(record.plan.terms.status, PlanStatus::Active);

        let mut bad = family_plan();
        bad.subscription_duration = 0;
        assert!(matches!(
            catalogue.create_plan(&bad).await,
            Err(ServiceError::Plan(PlanError::ZeroDuration))
        ));
    }

    #[tokio::test]
    async fn test_custom_plan_is_one_per_user_and_private() {
        let store = MemoryStore::new();
        let catalogue = CatalogueService::new(&store);
        let ana = UserId::new("ana");
        let ben = UserId::new("ben");
        let form = NewCustomPlan {
            gallons_per_week: 2,
            subscription_duration: 1,
            bonus_points: 0,
        };

        catalogue.create_plan(&family_plan()).await.unwrap();
        let custom = catalogue.create_custom_plan(&ana, &form).await.unwrap();
        assert_eq!(custom.id.as_str(), "ana");
        assert_eq!(custom.plan.terms.total_price, Amount::from_pesos(180));
        assert_eq!(custom.plan.terms.status, PlanStatus::Inactive);

        assert!(matches!(
            catalogue.create_custom_plan(&ana, &form).await,
            Err(ServiceError::Conflict(_))
        ));

        let for_ana = catalogue.plans_for(&ana).await.unwrap();
        assert_eq!(for_ana.len(), 2);
        assert!(for_ana[1].plan.is_custom());

        let for_ben = catalogue.plans_for(&ben).await.unwrap();
        assert_eq!(for_ben.len(), 1);
        assert!(!for_ben[0].plan.is_custom());
    }

    #[tokio::test]
    async fn test_products() {
        let store = MemoryStore::new();
        let catalogue = CatalogueService::new(&store);

        let bad = NewProduct {
            name: "Slim gallon".into(),
            price: Amount::ZERO,
            image_url: None,
        };
        assert!(matches!(
            catalogue.create_product(&bad).await,
            Err(ServiceError::Validation(_))
        ));

        catalogue
            .create_product(&NewProduct {
                name: " Round gallon ".into(),
                price: Amount::from_pesos(30),
                image_url: Some("https://cdn.example/round.png".into()),
            })
            .await
            .unwrap();
        let products = catalogue.products().await.unwrap();
        assert_eq!(products.len(), 1);
        assert_eq!(products[0].product.name, "Round gallon");
    }
}
