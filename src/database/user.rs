use crate::auth::{Principal, Role};
use crate::database::postgres_repository::PostgresRepository;
use crate::error::app_error::AppError;
use crate::models::user::{Account, NewCustomer, RegistrationConflict};
use argon2::Argon2;
use password_hash::rand_core::OsRng;
use password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString};
use std::sync::LazyLock;

#[async_trait::async_trait]
pub trait UserRepository: Send + Sync {
    /// Every account whose username matches, administrators first, then
    /// employees, then customers.
    async fn find_accounts(&self, username: &str) -> Result<Vec<Account>, AppError>;
    /// Display name of the principal's row, `None` for guests and missing or
    /// deactivated rows.
    async fn display_name(&self, principal: Principal) -> Result<Option<String>, AppError>;
    /// Email is checked before username.
    async fn registration_conflict(&self, username: &str, email: &str) -> Result<Option<RegistrationConflict>, AppError>;
    async fn create_customer(&self, customer: NewCustomer) -> Result<i64, AppError>;
}

/// A real Argon2 hash generated once, verified against when no account
/// matched so unknown usernames cost the same as wrong passwords.
static DUMMY_HASH: LazyLock<Option<String>> = LazyLock::new(|| hash_password("dummy-never-matches").ok());

pub fn hash_password(password: &str) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Argon2::default().hash_password(password.as_bytes(), &salt)?;
    Ok(hash.to_string())
}

/// `Ok(false)` on a mismatch; an unparsable stored hash is an internal error.
pub fn verify_password(password: &str, stored_hash: &str) -> Result<bool, AppError> {
    let parsed = PasswordHash::new(stored_hash).map_err(|e| AppError::password_hash("Failed to parse stored password hash", e))?;
    Ok(Argon2::default().verify_password(password.as_bytes(), &parsed).is_ok())
}

pub fn dummy_verify(password: &str) {
    if let Some(hash) = DUMMY_HASH.as_deref()
        && let Ok(parsed) = PasswordHash::new(hash)
    {
        let _ = Argon2::default().verify_password(password.as_bytes(), &parsed);
    }
}

#[derive(sqlx::FromRow)]
struct AccountRow {
    id: i64,
    role: String,
    password_hash: String,
}

impl TryFrom<AccountRow> for Account {
    type Error = AppError;

    fn try_from(row: AccountRow) -> Result<Self, Self::Error> {
        let role = row
            .role
            .parse::<Role>()
            .map_err(|e| AppError::db(format!("account query returned role {:?}", e.0), sqlx::Error::Protocol("unexpected role".to_string())))?;

        Ok(Account {
            id: row.id,
            role,
            password_hash: row.password_hash,
        })
    }
}

#[async_trait::async_trait]
impl UserRepository for PostgresRepository {
    async fn find_accounts(&self, username: &str) -> Result<Vec<Account>, AppError> {
        let rows = sqlx::query_as::<_, AccountRow>(
            r#"
            SELECT id, role, password_hash FROM (
                SELECT admin_id AS id, 'admin' AS role, password_hash, 0 AS priority
                FROM administrator WHERE username = $1
                UNION ALL
                SELECT employee_id, 'employee', password_hash, 1
                FROM employee WHERE username = $1 AND is_active
                UNION ALL
                SELECT customer_id, 'customer', password_hash, 2
                FROM customer WHERE username = $1
            ) candidates
            ORDER BY priority
            "#,
        )
        .bind(username)
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Account::try_from).collect()
    }

    async fn display_name(&self, principal: Principal) -> Result<Option<String>, AppError> {
        let (query, id) = match principal {
            Principal::Guest => return Ok(None),
            Principal::Admin { id } => ("SELECT name FROM administrator WHERE admin_id = $1", id),
            Principal::Employee { id } => ("SELECT name FROM employee WHERE employee_id = $1 AND is_active", id),
            Principal::Customer { id } => ("SELECT name FROM customer WHERE customer_id = $1", id),
        };

        let name = sqlx::query_scalar::<_, String>(query).bind(id).fetch_optional(&self.pool).await?;
        Ok(name)
    }

    async fn registration_conflict(&self, username: &str, email: &str) -> Result<Option<RegistrationConflict>, AppError> {
        let email_taken = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM customer WHERE email = $1)")
            .bind(email)
            .fetch_one(&self.pool)
            .await?;
        if email_taken {
            return Ok(Some(RegistrationConflict::Email));
        }

        let username_taken = sqlx::query_scalar::<_, bool>("SELECT EXISTS(SELECT 1 FROM customer WHERE username = $1)")
            .bind(username)
            .fetch_one(&self.pool)
            .await?;

        Ok(username_taken.then_some(RegistrationConflict::Username))
    }

    async fn create_customer(&self, customer: NewCustomer) -> Result<i64, AppError> {
        let id = sqlx::query_scalar::<_, i64>(
            r#"
            INSERT INTO customer (username, name, phone, email, password_hash)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING customer_id
            "#,
        )
        .bind(&customer.username)
        .bind(&customer.name)
        .bind(&customer.phone)
        .bind(&customer.email)
        .bind(&customer.password_hash)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| match e {
            sqlx::Error::Database(db) if db.is_unique_violation() => AppError::Conflict("Username or email already registered".to_string()),
            other => AppError::db("Failed to create customer", other),
        })?;

        Ok(id)
    }
}
