use crate::clock::Clock;
use crate::config::{BagStoreKind, DatabaseConfig};
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::service::Services;
use rocket::fairing::AdHoc;
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use std::sync::Arc;
use std::time::Duration;

async fn init_pool(db_config: &DatabaseConfig) -> Result<PgPool, AppError> {
    let pool = PgPoolOptions::new()
        .max_connections(db_config.max_connections)
        .min_connections(db_config.min_connections)
        .acquire_timeout(Duration::from_secs(db_config.acquire_timeout))
        .idle_timeout(Duration::from_secs(30))
        .max_lifetime(Duration::from_secs(1800))
        .connect(&db_config.url)
        .await
        .map_err(|e| AppError::db("Failed to connect to database", e))?;

    if db_config.run_migrations {
        sqlx::migrate!("./migrations").run(&pool).await?;
    }

    Ok(pool)
}

/// Connects to Postgres on ignite and manages the [`Services`] built on it.
pub fn stage_db(db_config: DatabaseConfig, bag_store: BagStoreKind, clock: Arc<dyn Clock>) -> AdHoc {
    AdHoc::try_on_ignite("Postgres (sqlx)", move |rocket| async move {
        match init_pool(&db_config).await {
            Ok(pool) => {
                tracing::info!(bag_store = ?bag_store, "Database pool initialized successfully");
                let services = Services::postgres(PostgresRepository::new(pool), bag_store, clock);
                Ok(rocket.manage(services))
            }
            Err(e) => {
                tracing::error!(error = ?e, "Failed to initialize database");
                Err(rocket)
            }
        }
    })
}
