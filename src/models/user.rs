use crate::auth::Role;
use rocket::FromForm;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Login candidate: one row per account table whose username matched.
#[derive(Debug, Clone)]
pub struct Account {
    pub id: i64,
    pub role: Role,
    pub password_hash: String,
}

#[derive(Deserialize, Debug, Default, FromForm)]
pub struct LoginRequest {
    pub user_id: Option<String>,
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    /// `user_id` wins over `username`; blank values count as missing.
    pub fn credentials(&self) -> Option<(&str, &str)> {
        let login = [self.user_id.as_deref(), self.username.as_deref()]
            .into_iter()
            .flatten()
            .map(str::trim)
            .find(|value| !value.is_empty())?;
        let password = self.password.as_deref().filter(|value| !value.is_empty())?;
        Some((login, password))
    }
}

#[derive(Serialize, Debug)]
pub struct LoginResponse {
    pub success: bool,
    pub role: Role,
    #[serde(rename = "redirectUrl")]
    pub redirect_url: String,
}

#[derive(Deserialize, Debug, Validate, FromForm)]
pub struct RegisterRequest {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 3, max = 50))]
    pub username: String,
    #[validate(length(min = 8))]
    pub password: String,
    #[validate(length(max = 30))]
    pub phone: Option<String>,
}

#[derive(Serialize, Debug)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
}

/// Customer row to insert; the password is already hashed.
#[derive(Debug, Clone)]
pub struct NewCustomer {
    pub username: String,
    pub name: String,
    pub email: String,
    pub phone: Option<String>,
    pub password_hash: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegistrationConflict {
    Email,
    Username,
}

impl RegistrationConflict {
    pub fn message(self) -> &'static str {
        match self {
            RegistrationConflict::Email => "Email already registered",
            RegistrationConflict::Username => "Username already taken",
        }
    }
}
