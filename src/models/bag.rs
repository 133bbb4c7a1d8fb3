use crate::auth::BagOwner;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Rejection message for bad ids, bad quantities, and merges that would not fit
/// in a stored quantity.
pub const INVALID_ITEM: &str = "Invalid product or quantity";

/// One product in one owner's bag. There is at most one per
/// `(owner, product_id)`.
#[derive(Debug, Clone, PartialEq)]
pub struct BagLineItem {
    pub owner: BagOwner,
    pub product_id: i64,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}

/// Whether an add created the line item or merged into an existing one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Inserted,
    Updated,
}

impl AddOutcome {
    pub fn message(self) -> &'static str {
        match self {
            AddOutcome::Inserted => "Added to cart",
            AddOutcome::Updated => "Cart updated",
        }
    }
}

fn default_quantity() -> i64 {
    1
}

#[derive(Deserialize, Debug)]
pub struct BagItemRequest {
    #[serde(default)]
    pub product_id: i64,
    #[serde(default = "default_quantity")]
    pub quantity: i64,
}

#[derive(Deserialize, Debug)]
pub struct BagQuantityRequest {
    pub quantity: i64,
}

#[derive(Serialize, Debug, Clone, PartialEq)]
pub struct BagItemResponse {
    pub product_id: i64,
    pub name: String,
    pub price: f64,
    pub quantity: i32,
    pub added_at: DateTime<Utc>,
}

#[derive(Serialize, Debug)]
pub struct BagMutationResponse {
    pub success: bool,
    pub message: String,
}

impl BagMutationResponse {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}

#[derive(Serialize, Debug)]
pub struct BagCountResponse {
    pub count: i64,
}
