use crate::database::user::{UserRepository, dummy_verify, hash_password, verify_password};
use crate::error::app_error::AppError;
use crate::models::user::{Account, NewCustomer, RegisterRequest};
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserRepository>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserRepository>) -> Self {
        Self { users }
    }

    /// Returns the first account, in admin > employee > customer order, whose
    /// password matches.
    pub async fn login(&self, login: &str, password: &str) -> Result<Account, AppError> {
        let accounts = self.users.find_accounts(login).await?;
        if accounts.is_empty() {
            dummy_verify(password);
            return Err(AppError::InvalidCredentials);
        }

        for account in accounts {
            match verify_password(password, &account.password_hash) {
                Ok(true) => return Ok(account),
                Ok(false) => {}
                Err(e) => warn!(account_id = account.id, role = %account.role, error = ?e, "stored password hash is unreadable"),
            }
        }

        Err(AppError::InvalidCredentials)
    }

    /// Creates a customer account and returns its id.
    pub async fn register(&self, request: RegisterRequest) -> Result<i64, AppError> {
        request.validate()?;

        let username = request.username.trim().to_string();
        let email = request.email.trim().to_lowercase();

        if let Some(conflict) = self.users.registration_conflict(&username, &email).await? {
            return Err(AppError::Conflict(conflict.message().to_string()));
        }

        let customer = NewCustomer {
            password_hash: hash_password(&request.password)?,
            username,
            name: request.name.trim().to_string(),
            email,
            phone: request.phone.map(|p| p.trim().to_string()).filter(|p| !p.is_empty()),
        };

        let id = self.users.create_customer(customer).await?;
        info!(customer_id = id, "customer registered");
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::Role;
    use crate::test_utils::FakeUsers;

    fn register_request(username: &str, email: &str) -> RegisterRequest {
        RegisterRequest {
            name: "Grace Hopper".to_string(),
            email: email.to_string(),
            username: username.to_string(),
            password: "cobol-forever".to_string(),
            phone: Some("  ".to_string()),
        }
    }

    #[tokio::test]
    async fn login_prefers_higher_privilege_accounts() {
        let users = Arc::new(FakeUsers::new());
        users.add(Role::Customer, 30, "shared", "pw-shared");
        users.add(Role::Admin, 1, "shared", "pw-shared");
        let auth = AuthService::new(users);

        let account = auth.login("shared", "pw-shared").await.unwrap();
        assert_eq!((account.role, account.id), (Role::Admin, 1));
    }

    #[tokio::test]
    async fn login_falls_through_to_account_whose_password_matches() {
        let users = Arc::new(FakeUsers::new());
        users.add(Role::Employee, 4, "sam", "staff-pass");
        users.add(Role::Customer, 40, "sam", "customer-pass");
        let auth = AuthService::new(users);

        let account = auth.login("sam", "customer-pass").await.unwrap();
        assert_eq!((account.role, account.id), (Role::Customer, 40));
    }

    #[tokio::test]
    async fn login_rejects_bad_credentials() {
        let users = Arc::new(FakeUsers::new());
        users.add(Role::Customer, 2, "ada", "right");
        let auth = AuthService::new(users);

        assert!(matches!(auth.login("ada", "wrong").await, Err(AppError::InvalidCredentials)));
        assert!(matches!(auth.login("nobody", "right").await, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn register_creates_customer_that_can_log_in() {
        let users = Arc::new(FakeUsers::new());
        let auth = AuthService::new(users.clone());

        let id = auth.register(register_request("grace", "Grace@Example.com")).await.unwrap();
        let account = auth.login("grace", "cobol-forever").await.unwrap();
        assert_eq!((account.role, account.id), (Role::Customer, id));
        assert_eq!(users.customer_email(id).as_deref(), Some("grace@example.com"));
    }

    #[tokio::test]
    async fn register_reports_email_before_username_conflicts() {
        let users = Arc::new(FakeUsers::new());
        let auth = AuthService::new(users);
        auth.register(register_request("grace", "grace@example.com")).await.unwrap();

        let err = auth.register(register_request("grace", "grace@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Email already registered"));

        let err = auth.register(register_request("grace", "other@example.com")).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(ref m) if m == "Username already taken"));
    }

    #[tokio::test]
    async fn register_validates_input() {
        let auth = AuthService::new(Arc::new(FakeUsers::new()));
        let mut request = register_request("grace", "grace@example.com");
        request.password = "short".to_string();

        assert!(matches!(auth.register(request).await, Err(AppError::ValidationError(_))));
    }
}
