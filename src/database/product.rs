use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::product::{Department, Product};

#[async_trait::async_trait]
pub trait ProductRepository: Send + Sync {
    /// An active product, or `None` when it is unknown or withdrawn.
    async fn get_product(&self, id: i64) -> Result<Option<Product>, AppError>;
    /// Products by id regardless of whether they are still listed, so bags
    /// keep rendering items that were withdrawn after being added.
    async fn get_products(&self, ids: &[i64]) -> Result<Vec<Product>, AppError>;
    async fn list_active_products(&self) -> Result<Vec<Product>, AppError>;
    async fn list_departments(&self) -> Result<Vec<Department>, AppError>;
}

const PRODUCT_COLUMNS: &str = r#"
    product_id AS id,
    name,
    description,
    price::float8 AS price,
    quantity_in_stock,
    department_id,
    image_url,
    on_sale
"#;

#[async_trait::async_trait]
impl ProductRepository for PostgresRepository {
    async fn get_product(&self, id: i64) -> Result<Option<Product>, AppError> {
        let product = sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE product_id = $1 AND is_active"))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(product)
    }

    async fn get_products(&self, ids: &[i64]) -> Result<Vec<Product>, AppError> {
        if ids.is_empty() {
            return Ok(Vec::new());
        }

        let products = sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE product_id = ANY($1)"))
            .bind(ids)
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    async fn list_active_products(&self) -> Result<Vec<Product>, AppError> {
        let products = sqlx::query_as::<_, Product>(&format!("SELECT {PRODUCT_COLUMNS} FROM product WHERE is_active ORDER BY name, product_id"))
            .fetch_all(&self.pool)
            .await?;

        Ok(products)
    }

    async fn list_departments(&self) -> Result<Vec<Department>, AppError> {
        let departments = sqlx::query_as::<_, Department>("SELECT department_id AS id, name FROM department ORDER BY name")
            .fetch_all(&self.pool)
            .await?;

        Ok(departments)
    }
}
