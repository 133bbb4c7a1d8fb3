use crate::auth::BagOwner;
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::bag::{AddOutcome, BagLineItem, INVALID_ITEM};
use chrono::{DateTime, Utc};

/// Line-item storage keyed by [`BagOwner`].
///
/// Every mutation must keep at most one row per `(owner, product_id)`, and
/// `add_or_merge` must be atomic per key: concurrent adds of the same product
/// for the same owner never lose an increment.
#[async_trait::async_trait]
pub trait BagRepository: Send + Sync {
    /// Inserts `quantity` or adds it to the existing line item. A merge whose
    /// sum would not fit in an `i32` leaves the line untouched and fails with
    /// `BadRequest`.
    async fn add_or_merge(&self, owner: BagOwner, product_id: i64, quantity: i32) -> Result<AddOutcome, AppError>;
    /// Overwrites the stored quantity. Returns `false` when there was no line item.
    async fn set_quantity(&self, owner: BagOwner, product_id: i64, quantity: i32) -> Result<bool, AppError>;
    async fn remove_item(&self, owner: BagOwner, product_id: i64) -> Result<(), AppError>;
    async fn clear(&self, owner: BagOwner) -> Result<(), AppError>;
    /// Most recently added first.
    async fn list(&self, owner: BagOwner) -> Result<Vec<BagLineItem>, AppError>;
    async fn total_quantity(&self, owner: BagOwner) -> Result<i64, AppError>;
}

#[derive(Debug, sqlx::FromRow)]
struct BagRow {
    customer_id: Option<i64>,
    employee_id: Option<i64>,
    product_id: i64,
    quantity: i32,
    added_at: DateTime<Utc>,
}

impl TryFrom<BagRow> for BagLineItem {
    type Error = AppError;

    fn try_from(row: BagRow) -> Result<Self, Self::Error> {
        let owner = match (row.customer_id, row.employee_id) {
            (Some(id), None) => BagOwner::Customer(id),
            (None, Some(id)) => BagOwner::Employee(id),
            _ => {
                return Err(AppError::Db {
                    message: format!("bag row for product {} has an ambiguous owner", row.product_id),
                    source: sqlx::Error::Protocol("bag owner columns are not mutually exclusive".to_string()),
                });
            }
        };

        Ok(BagLineItem {
            owner,
            product_id: row.product_id,
            quantity: row.quantity,
            added_at: row.added_at,
        })
    }
}

// The partial unique indexes make each insert an atomic upsert on its own
// owner column; `xmax = 0` only holds for freshly inserted rows. A merge that
// would overflow the INTEGER column matches no row and returns nothing.
const UPSERT_CUSTOMER_LINE: &str = r#"
    INSERT INTO bag (customer_id, employee_id, product_id, quantity, added_at)
    VALUES ($1, NULL, $2, $3, now())
    ON CONFLICT (customer_id, product_id) WHERE employee_id IS NULL
    DO UPDATE SET quantity = bag.quantity + EXCLUDED.quantity
    WHERE bag.quantity::bigint + EXCLUDED.quantity <= 2147483647
    RETURNING (xmax = 0) AS inserted
"#;

const UPSERT_EMPLOYEE_LINE: &str = r#"
    INSERT INTO bag (customer_id, employee_id, product_id, quantity, added_at)
    VALUES (NULL, $1, $2, $3, now())
    ON CONFLICT (employee_id, product_id) WHERE customer_id IS NULL
    DO UPDATE SET quantity = bag.quantity + EXCLUDED.quantity
    WHERE bag.quantity::bigint + EXCLUDED.quantity <= 2147483647
    RETURNING (xmax = 0) AS inserted
"#;

fn owner_id(owner: BagOwner) -> i64 {
    match owner {
        BagOwner::Customer(id) | BagOwner::Employee(id) => id,
    }
}

#[async_trait::async_trait]
impl BagRepository for PostgresRepository {
    async fn add_or_merge(&self, owner: BagOwner, product_id: i64, quantity: i32) -> Result<AddOutcome, AppError> {
        let query = match owner {
            BagOwner::Customer(_) => UPSERT_CUSTOMER_LINE,
            BagOwner::Employee(_) => UPSERT_EMPLOYEE_LINE,
        };

        let inserted = sqlx::query_scalar::<_, bool>(query)
            .bind(owner_id(owner))
            .bind(product_id)
            .bind(quantity)
            .fetch_optional(&self.pool)
            .await
            .map_err(|e| AppError::db("Failed to add bag item", e))?;

        match inserted {
            Some(true) => Ok(AddOutcome::Inserted),
            Some(false) => Ok(AddOutcome::Updated),
            None => Err(AppError::BadRequest(INVALID_ITEM.to_string())),
        }
    }

    async fn set_quantity(&self, owner: BagOwner, product_id: i64, quantity: i32) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            UPDATE bag
            SET quantity = $3
            WHERE customer_id IS NOT DISTINCT FROM $1
              AND employee_id IS NOT DISTINCT FROM $2
              AND product_id = $4
            "#,
        )
        .bind(owner.customer_id())
        .bind(owner.employee_id())
        .bind(quantity)
        .bind(product_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::db("Failed to set bag quantity", e))?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_item(&self, owner: BagOwner, product_id: i64) -> Result<(), AppError> {
        sqlx::query(
            r#"
            DELETE FROM bag
            WHERE customer_id IS NOT DISTINCT FROM $1
              AND employee_id IS NOT DISTINCT FROM $2
              AND product_id = $3
            "#,
        )
        .bind(owner.customer_id())
        .bind(owner.employee_id())
        .bind(product_id)
        .execute(&self.pool)
        .await
        .map_err(|e| AppError::db("Failed to remove bag item", e))?;

        Ok(())
    }

    async fn clear(&self, owner: BagOwner) -> Result<(), AppError> {
        sqlx::query("DELETE FROM bag WHERE customer_id IS NOT DISTINCT FROM $1 AND employee_id IS NOT DISTINCT FROM $2")
            .bind(owner.customer_id())
            .bind(owner.employee_id())
            .execute(&self.pool)
            .await
            .map_err(|e| AppError::db("Failed to clear bag", e))?;

        Ok(())
    }

    async fn list(&self, owner: BagOwner) -> Result<Vec<BagLineItem>, AppError> {
        let rows = sqlx::query_as::<_, BagRow>(
            r#"
            SELECT customer_id, employee_id, product_id, quantity, added_at
            FROM bag
            WHERE customer_id IS NOT DISTINCT FROM $1
              AND employee_id IS NOT DISTINCT FROM $2
            ORDER BY added_at DESC, bag_id DESC
            "#,
        )
        .bind(owner.customer_id())
        .bind(owner.employee_id())
        .fetch_all(&self.pool)
        .await
        .map_err(|e| AppError::db("Failed to list bag", e))?;

        rows.into_iter().map(BagLineItem::try_from).collect()
    }

    async fn total_quantity(&self, owner: BagOwner) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>(
            r#"
            SELECT COALESCE(SUM(quantity), 0)::BIGINT
            FROM bag
            WHERE customer_id IS NOT DISTINCT FROM $1
              AND employee_id IS NOT DISTINCT FROM $2
            "#,
        )
        .bind(owner.customer_id())
        .bind(owner.employee_id())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| AppError::db("Failed to count bag", e))?;

        Ok(total)
    }
}
