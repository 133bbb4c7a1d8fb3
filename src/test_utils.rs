use crate::auth::{BagOwner, Principal, Role};
use crate::clock::ManualClock;
use crate::config::{BagStoreKind, Config};
use crate::database::bag::BagRepository;
use crate::database::dashboard::DashboardRepository;
use crate::database::memory_bag::InMemoryBagRepository;
use crate::database::product::ProductRepository;
use crate::database::user::{UserRepository, hash_password};
use crate::error::app_error::AppError;
use crate::models::bag::{AddOutcome, BagLineItem};
use crate::models::dashboard::{AdminDashboard, CustomerDashboard, EmployeeDashboard, EmployeeSummary};
use crate::models::product::{Department, Product};
use crate::models::user::{Account, NewCustomer, RegistrationConflict};
use crate::service::Services;
use crate::session::{SessionData, SessionManager};
use rocket::http::Cookie;
use rocket::local::asynchronous::Client;
use std::path::PathBuf;
use std::sync::{Arc, LazyLock, Mutex};

pub struct FakeCatalog {
    products: Vec<(Product, bool)>,
    departments: Vec<Department>,
}

impl FakeCatalog {
    pub const INACTIVE_PRODUCT: i64 = 13;

    pub fn sample() -> Self {
        let product = |id: i64, name: &str, price: f64| Product {
            id,
            name: name.to_string(),
            description: None,
            price,
            quantity_in_stock: 25,
            department_id: Some(1),
            image_url: None,
            on_sale: false,
        };

        Self {
            products: vec![
                (product(7, "Espresso Beans", 12.5), true),
                (product(11, "Pour-over Kettle", 39.0), true),
                (product(Self::INACTIVE_PRODUCT, "Discontinued Grinder", 80.0), false),
            ],
            departments: vec![Department { id: 1, name: "Coffee".to_string() }],
        }
    }
}

#[async_trait::async_trait]
impl ProductRepository for FakeCatalog {
    async fn get_product(&self, id: i64) -> Result<Option<Product>, AppError> {
        Ok(self.products.iter().find(|(p, active)| p.id == id && *active).map(|(p, _)| p.clone()))
    }

    async fn get_products(&self, ids: &[i64]) -> Result<Vec<Product>, AppError> {
        Ok(self.products.iter().filter(|(p, _)| ids.contains(&p.id)).map(|(p, _)| p.clone()).collect())
    }

    async fn list_active_products(&self) -> Result<Vec<Product>, AppError> {
        Ok(self.products.iter().filter(|(_, active)| *active).map(|(p, _)| p.clone()).collect())
    }

    async fn list_departments(&self) -> Result<Vec<Department>, AppError> {
        Ok(self.departments.clone())
    }
}

#[derive(Debug, Clone)]
struct FakeAccount {
    role: Role,
    id: i64,
    username: String,
    name: String,
    email: String,
    password_hash: String,
}

/// Accounts every route test can log in with.
pub const ADMIN_LOGIN: (&str, &str) = ("boss", "admin-pass");
pub const EMPLOYEE_LOGIN: (&str, &str) = ("clerk", "clerk-pass");
pub const CUSTOMER_LOGIN: (&str, &str) = ("ada", "ada-pass");

static SEEDED_ACCOUNTS: LazyLock<Vec<FakeAccount>> = LazyLock::new(|| {
    [(Role::Admin, 1, ADMIN_LOGIN), (Role::Employee, 3, EMPLOYEE_LOGIN), (Role::Customer, 42, CUSTOMER_LOGIN)]
        .into_iter()
        .map(|(role, id, (username, password))| FakeAccount {
            role,
            id,
            username: username.to_string(),
            name: format!("{username} ({role})"),
            email: format!("{username}@example.com"),
            password_hash: hash_password(password).unwrap(),
        })
        .collect()
});

pub struct FakeUsers {
    accounts: Mutex<Vec<FakeAccount>>,
}

impl FakeUsers {
    pub fn new() -> Self {
        Self {
            accounts: Mutex::new(Vec::new()),
        }
    }

    pub fn seeded() -> Self {
        Self {
            accounts: Mutex::new(SEEDED_ACCOUNTS.clone()),
        }
    }

    pub fn add(&self, role: Role, id: i64, username: &str, password: &str) {
        self.accounts.lock().unwrap().push(FakeAccount {
            role,
            id,
            username: username.to_string(),
            name: username.to_string(),
            email: format!("{username}-{id}@example.com"),
            password_hash: hash_password(password).unwrap(),
        });
    }

    pub fn customer_email(&self, id: i64) -> Option<String> {
        let accounts = self.accounts.lock().unwrap();
        accounts.iter().find(|a| a.role == Role::Customer && a.id == id).map(|a| a.email.clone())
    }
}

fn priority(role: Role) -> u8 {
    match role {
        Role::Admin => 0,
        Role::Employee => 1,
        Role::Customer => 2,
    }
}

#[async_trait::async_trait]
impl UserRepository for FakeUsers {
    async fn find_accounts(&self, username: &str) -> Result<Vec<Account>, AppError> {
        let mut matches: Vec<Account> = self
            .accounts
            .lock()
            .unwrap()
            .iter()
            .filter(|a| a.username == username)
            .map(|a| Account {
                id: a.id,
                role: a.role,
                password_hash: a.password_hash.clone(),
            })
            .collect();
        matches.sort_by_key(|a| priority(a.role));
        Ok(matches)
    }

    async fn display_name(&self, principal: Principal) -> Result<Option<String>, AppError> {
        let (Some(role), Some(id)) = (principal.role(), principal.user_id()) else {
            return Ok(None);
        };
        let accounts = self.accounts.lock().unwrap();
        Ok(accounts.iter().find(|a| a.role == role && a.id == id).map(|a| a.name.clone()))
    }

    async fn registration_conflict(&self, username: &str, email: &str) -> Result<Option<RegistrationConflict>, AppError> {
        let accounts = self.accounts.lock().unwrap();
        let customers = || accounts.iter().filter(|a| a.role == Role::Customer);

        if customers().any(|a| a.email == email) {
            return Ok(Some(RegistrationConflict::Email));
        }
        Ok(customers().any(|a| a.username == username).then_some(RegistrationConflict::Username))
    }

    async fn create_customer(&self, customer: NewCustomer) -> Result<i64, AppError> {
        let mut accounts = self.accounts.lock().unwrap();
        let id = accounts.iter().map(|a| a.id).max().unwrap_or(0).max(999) + 1;
        accounts.push(FakeAccount {
            role: Role::Customer,
            id,
            username: customer.username,
            name: customer.name,
            email: customer.email,
            password_hash: customer.password_hash,
        });
        Ok(id)
    }
}

/// Dashboards for the seeded accounts; any other id has no row.
pub struct FakeDashboards;

#[async_trait::async_trait]
impl DashboardRepository for FakeDashboards {
    async fn admin_dashboard(&self, _admin_id: i64) -> Result<AdminDashboard, AppError> {
        Ok(AdminDashboard {
            admin_name: "boss".to_string(),
            total_products: 3,
            total_customers: 1,
            todays_revenue: 0.0,
            orders_today: 0,
            employees: vec![EmployeeSummary {
                employee_id: 3,
                name: "clerk".to_string(),
                email: None,
                department_id: Some(1),
            }],
        })
    }

    async fn employee_dashboard(&self, employee_id: i64) -> Result<Option<EmployeeDashboard>, AppError> {
        Ok((employee_id == 3).then(|| EmployeeDashboard {
            name: "clerk".to_string(),
            department_id: Some(1),
            orders_today: 2,
            revenue_today: 51.5,
            low_stock_products: 1,
        }))
    }

    async fn customer_dashboard(&self, customer_id: i64) -> Result<Option<CustomerDashboard>, AppError> {
        Ok((customer_id == 42).then(|| CustomerDashboard {
            name: "ada".to_string(),
            email: "ada@example.com".to_string(),
            orders: Vec::new(),
            total_saved: 0.0,
            total_orders: 0,
        }))
    }
}

/// Bag store whose every call fails like an unreachable database.
pub struct FailingBagRepository;

fn unreachable_store() -> AppError {
    AppError::db("bag store unreachable", sqlx::Error::PoolTimedOut)
}

#[async_trait::async_trait]
impl BagRepository for FailingBagRepository {
    async fn add_or_merge(&self, _owner: BagOwner, _product_id: i64, _quantity: i32) -> Result<AddOutcome, AppError> {
        Err(unreachable_store())
    }

    async fn set_quantity(&self, _owner: BagOwner, _product_id: i64, _quantity: i32) -> Result<bool, AppError> {
        Err(unreachable_store())
    }

    async fn remove_item(&self, _owner: BagOwner, _product_id: i64) -> Result<(), AppError> {
        Err(unreachable_store())
    }

    async fn clear(&self, _owner: BagOwner) -> Result<(), AppError> {
        Err(unreachable_store())
    }

    async fn list(&self, _owner: BagOwner) -> Result<Vec<BagLineItem>, AppError> {
        Err(unreachable_store())
    }

    async fn total_quantity(&self, _owner: BagOwner) -> Result<i64, AppError> {
        Err(unreachable_store())
    }
}

pub fn test_services(clock: Arc<ManualClock>) -> Services {
    Services::new(
        Arc::new(InMemoryBagRepository::new(clock)),
        Arc::new(FakeCatalog::sample()),
        Arc::new(FakeUsers::seeded()),
        Arc::new(FakeDashboards),
    )
}

pub fn test_config() -> Config {
    let mut config = Config::default();
    config.bag.store = BagStoreKind::Memory;
    config.static_files.root = "static".to_string();
    config
}

/// A fully wired Rocket over in-memory fakes, driven through the local client.
pub struct TestApp {
    pub client: Client,
    pub clock: Arc<ManualClock>,
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(test_config()).await
    }

    pub async fn with_static_root(root: PathBuf) -> Self {
        let mut config = test_config();
        config.static_files.root = root.to_string_lossy().into_owned();
        Self::with_config(config).await
    }

    pub async fn with_config(config: Config) -> Self {
        let clock = Arc::new(ManualClock::new());
        let rocket = crate::build_rocket_with_services(config, test_services(clock.clone()), clock.clone());
        let client = Client::tracked(rocket).await.expect("valid rocket instance");
        Self { client, clock }
    }

    pub fn sessions(&self) -> &SessionManager {
        self.client.rocket().state::<SessionManager>().expect("session manager is managed")
    }

    /// Opens a session for `user_id`/`role` directly in the store.
    pub async fn session_cookie(&self, user_id: i64, role: Role) -> Cookie<'static> {
        let token = self.sessions().store().create(SessionData::for_user(user_id, role)).await;
        Cookie::new(crate::config::DEFAULT_SESSION_COOKIE, token)
    }
}
