pub mod auth;
pub mod bag;

use crate::clock::Clock;
use crate::config::BagStoreKind;
use crate::database::bag::BagRepository;
use crate::database::dashboard::DashboardRepository;
use crate::database::memory_bag::InMemoryBagRepository;
use crate::database::postgres_repository::PostgresRepository;
use crate::database::product::ProductRepository;
use crate::database::user::UserRepository;
use auth::AuthService;
use bag::BagService;
use std::sync::Arc;

/// Everything route handlers reach for, managed as one piece of Rocket state.
#[derive(Clone)]
pub struct Services {
    pub bags: BagService,
    pub auth: AuthService,
    pub products: Arc<dyn ProductRepository>,
    pub users: Arc<dyn UserRepository>,
    pub dashboards: Arc<dyn DashboardRepository>,
}

impl Services {
    pub fn new(
        bags: Arc<dyn BagRepository>,
        products: Arc<dyn ProductRepository>,
        users: Arc<dyn UserRepository>,
        dashboards: Arc<dyn DashboardRepository>,
    ) -> Self {
        Self {
            bags: BagService::new(bags, products.clone()),
            auth: AuthService::new(users.clone()),
            products,
            users,
            dashboards,
        }
    }

    pub fn postgres(repo: PostgresRepository, bag_store: BagStoreKind, clock: Arc<dyn Clock>) -> Self {
        let repo = Arc::new(repo);
        let bags: Arc<dyn BagRepository> = match bag_store {
            BagStoreKind::Postgres => repo.clone(),
            BagStoreKind::Memory => Arc::new(InMemoryBagRepository::new(clock)),
        };

        Self::new(bags, repo.clone(), repo.clone(), repo)
    }
}
