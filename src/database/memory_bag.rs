use crate::auth::BagOwner;
use crate::clock::Clock;
use crate::database::bag::BagRepository;
use crate::error::app_error::AppError;
use crate::models::bag::{AddOutcome, BagLineItem, INVALID_ITEM};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};

type OwnerBag = Arc<Mutex<Vec<BagLineItem>>>;

/// Process-local bag store.
///
/// Each owner's line items sit behind their own mutex, so a read-modify-write
/// on one bag never interleaves with another on the same bag while different
/// owners proceed independently. Items are kept in insertion order.
pub struct InMemoryBagRepository {
    clock: Arc<dyn Clock>,
    bags: RwLock<HashMap<BagOwner, OwnerBag>>,
}

impl InMemoryBagRepository {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        Self {
            clock,
            bags: RwLock::new(HashMap::new()),
        }
    }

    async fn existing(&self, owner: BagOwner) -> Option<OwnerBag> {
        self.bags.read().await.get(&owner).cloned()
    }

    async fn bag_for(&self, owner: BagOwner) -> OwnerBag {
        if let Some(bag) = self.existing(owner).await {
            return bag;
        }
        self.bags.write().await.entry(owner).or_default().clone()
    }
}

#[async_trait::async_trait]
impl BagRepository for InMemoryBagRepository {
    async fn add_or_merge(&self, owner: BagOwner, product_id: i64, quantity: i32) -> Result<AddOutcome, AppError> {
        let bag = self.bag_for(owner).await;
        let mut items = bag.lock().await;

        if let Some(item) = items.iter_mut().find(|item| item.product_id == product_id) {
            item.quantity = item
                .quantity
                .checked_add(quantity)
                .ok_or_else(|| AppError::BadRequest(INVALID_ITEM.to_string()))?;
            return Ok(AddOutcome::Updated);
        }

        items.push(BagLineItem {
            owner,
            product_id,
            quantity,
            added_at: self.clock.now(),
        });
        Ok(AddOutcome::Inserted)
    }

    async fn set_quantity(&self, owner: BagOwner, product_id: i64, quantity: i32) -> Result<bool, AppError> {
        let Some(bag) = self.existing(owner).await else {
            return Ok(false);
        };
        let mut items = bag.lock().await;

        match items.iter_mut().find(|item| item.product_id == product_id) {
            Some(item) => {
                item.quantity = quantity;
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn remove_item(&self, owner: BagOwner, product_id: i64) -> Result<(), AppError> {
        if let Some(bag) = self.existing(owner).await {
            bag.lock().await.retain(|item| item.product_id != product_id);
        }
        Ok(())
    }

    async fn clear(&self, owner: BagOwner) -> Result<(), AppError> {
        if let Some(bag) = self.existing(owner).await {
            bag.lock().await.clear();
        }
        Ok(())
    }

    async fn list(&self, owner: BagOwner) -> Result<Vec<BagLineItem>, AppError> {
        let Some(bag) = self.existing(owner).await else {
            return Ok(Vec::new());
        };
        let items = bag.lock().await;
        Ok(items.iter().rev().cloned().collect())
    }

    async fn total_quantity(&self, owner: BagOwner) -> Result<i64, AppError> {
        let Some(bag) = self.existing(owner).await else {
            return Ok(0);
        };
        let items = bag.lock().await;
        Ok(items.iter().map(|item| i64::from(item.quantity)).sum())
    }
}
