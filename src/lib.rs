mod auth;
mod clock;
mod config;
mod database;
mod db;
mod error;
mod middleware;
mod models;
mod render;
mod routes;
mod service;
mod session;

#[cfg(test)]
pub mod test_utils;

pub use config::{Config, LoggingConfig};

use crate::clock::{Clock, SystemClock};
use crate::db::stage_db;
use crate::middleware::RequestLogger;
use crate::render::{Pages, ShellRenderer};
use crate::routes as app_routes;
use crate::routes::static_files::StaticFiles;
use crate::session::{InMemorySessionStore, SessionManager, SessionStore, spawn_cleanup_task};
use rocket::data::{ByteUnit, Limits};
use rocket::fairing::AdHoc;
use rocket::shield::{Frame, NoSniff, Shield};
use rocket::{Build, Rocket};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// Installs the global subscriber. `RUST_LOG` overrides the configured level,
/// e.g. `RUST_LOG=info,storefront::service=debug`.
pub fn init_tracing(logging: &LoggingConfig) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&logging.level));

    let subscriber = tracing_subscriber::fmt().with_env_filter(filter).with_target(true).with_line_number(true);

    let installed = if logging.json_format {
        subscriber.json().try_init()
    } else {
        subscriber.try_init()
    };

    if installed.is_err() {
        tracing::debug!("tracing subscriber already installed");
    }
}

fn rocket_figment(config: &Config) -> rocket::figment::Figment {
    let body_limit = ByteUnit::from(config.limits.body_bytes);
    let limits = Limits::default().limit("json", body_limit).limit("form", body_limit);

    rocket::Config::figment()
        .merge(("port", config.server.port))
        .merge(("address", config.server.address.clone()))
        .merge(("limits", limits))
}

fn stage_session_cleanup(store: Arc<dyn SessionStore>, interval_seconds: u64) -> AdHoc {
    AdHoc::on_liftoff("Session cleanup", move |_| {
        Box::pin(async move {
            spawn_cleanup_task(store, std::time::Duration::from_secs(interval_seconds.max(1)));
        })
    })
}

/// Everything except the storage services: session layer, renderer, static
/// files, routes and catchers.
fn assemble(config: &Config, clock: Arc<dyn Clock>) -> Rocket<Build> {
    let ttl = chrono::Duration::seconds(config.session.ttl_seconds);
    let store: Arc<dyn SessionStore> = Arc::new(InMemorySessionStore::new(ttl, clock.clone()));
    let sessions = SessionManager::new(store, clock, &config.session);

    rocket::custom(rocket_figment(config))
        .attach(Shield::default().enable(NoSniff::Enable).enable(Frame::Deny))
        .attach(RequestLogger)
        .attach(stage_session_cleanup(sessions.store().clone(), config.session.cleanup_interval_seconds))
        .manage(sessions)
        .manage(Pages::new(Arc::new(ShellRenderer::default())))
        .manage(StaticFiles::new(&config.static_files.root))
        .mount("/", app_routes::pages::routes())
        .mount("/", app_routes::auth::routes())
        .mount("/", app_routes::static_files::routes())
        .mount("/api", app_routes::health::routes())
        .mount("/api/bag", app_routes::bag::routes())
        .register("/api", app_routes::error::api_catchers())
        .register("/", app_routes::error::page_catchers())
}

pub fn build_rocket(config: Config) -> Rocket<Build> {
    let clock: Arc<dyn Clock> = Arc::new(SystemClock);

    assemble(&config, clock.clone()).attach(stage_db(config.database.clone(), config.bag.store, clock))
}

/// Builds the app over caller-supplied services instead of Postgres.
#[cfg(test)]
pub(crate) fn build_rocket_with_services(config: Config, services: service::Services, clock: Arc<dyn Clock>) -> Rocket<Build> {
    assemble(&config, clock).manage(services)
}
