use crate::auth::BagOwner;
use crate::database::bag::BagRepository;
use crate::database::product::ProductRepository;
use crate::error::app_error::AppError;
use crate::models::bag::{AddOutcome, BagItemResponse, INVALID_ITEM};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, warn};

/// Cart operations for a single [`BagOwner`], layered over the line-item
/// store and the product catalogue.
#[derive(Clone)]
pub struct BagService {
    bags: Arc<dyn BagRepository>,
    products: Arc<dyn ProductRepository>,
}

impl BagService {
    pub fn new(bags: Arc<dyn BagRepository>, products: Arc<dyn ProductRepository>) -> Self {
        Self { bags, products }
    }

    /// Adds `quantity` of an active product, merging with any existing line.
    pub async fn add_item(&self, owner: BagOwner, product_id: i64, quantity: i64) -> Result<AddOutcome, AppError> {
        if product_id < 1 || quantity < 1 {
            return Err(AppError::BadRequest(INVALID_ITEM.to_string()));
        }
        let quantity = i32::try_from(quantity).map_err(|_| AppError::BadRequest(INVALID_ITEM.to_string()))?;

        if self.products.get_product(product_id).await?.is_none() {
            return Err(AppError::BadRequest("Unknown product".to_string()));
        }

        let outcome = self.bags.add_or_merge(owner, product_id, quantity).await?;
        debug!(owner = %owner, product_id, quantity, outcome = ?outcome, "bag item added");
        Ok(outcome)
    }

    /// Overwrites the quantity; zero or below removes the line.
    pub async fn set_quantity(&self, owner: BagOwner, product_id: i64, quantity: i64) -> Result<(), AppError> {
        if quantity <= 0 {
            return self.remove_item(owner, product_id).await;
        }
        let quantity = i32::try_from(quantity).map_err(|_| AppError::BadRequest(INVALID_ITEM.to_string()))?;

        if !self.bags.set_quantity(owner, product_id, quantity).await? {
            return Err(AppError::NotFound("Item not in bag".to_string()));
        }

        debug!(owner = %owner, product_id, quantity, "bag quantity set");
        Ok(())
    }

    pub async fn remove_item(&self, owner: BagOwner, product_id: i64) -> Result<(), AppError> {
        self.bags.remove_item(owner, product_id).await?;
        debug!(owner = %owner, product_id, "bag item removed");
        Ok(())
    }

    pub async fn clear(&self, owner: BagOwner) -> Result<(), AppError> {
        self.bags.clear(owner).await?;
        debug!(owner = %owner, "bag cleared");
        Ok(())
    }

    /// Line items with product name and price, most recently added first.
    pub async fn list(&self, owner: BagOwner) -> Result<Vec<BagItemResponse>, AppError> {
        let items = self.bags.list(owner).await?;
        if items.is_empty() {
            return Ok(Vec::new());
        }

        let ids: Vec<i64> = items.iter().map(|item| item.product_id).collect();
        let products: HashMap<i64, _> = self.products.get_products(&ids).await?.into_iter().map(|p| (p.id, p)).collect();

        let listed = items
            .into_iter()
            .filter_map(|item| match products.get(&item.product_id) {
                Some(product) => Some(BagItemResponse {
                    product_id: item.product_id,
                    name: product.name.clone(),
                    price: product.price,
                    quantity: item.quantity,
                    added_at: item.added_at,
                }),
                None => {
                    warn!(owner = %owner, product_id = item.product_id, "bag references a product that no longer exists");
                    None
                }
            })
            .collect();

        Ok(listed)
    }

    /// Sum of quantities. Lookup failures are logged and read as an empty bag.
    pub async fn total_quantity(&self, owner: BagOwner) -> i64 {
        match self.bags.total_quantity(owner).await {
            Ok(total) => total,
            Err(e) => {
                warn!(owner = %owner, error = ?e, "bag count unavailable, reporting 0");
                0
            }
        }
    }
}
