use figment::Figment;
use figment::providers::{Env, Format, Serialized, Toml};
use serde::{Deserialize, Serialize};

pub const DEFAULT_SESSION_COOKIE: &str = "sessionId";

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct Config {
    pub database: DatabaseConfig,
    pub server: ServerConfig,
    pub logging: LoggingConfig,
    pub session: SessionConfig,
    pub static_files: StaticFilesConfig,
    pub limits: LimitsConfig,
    pub bag: BagConfig,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct DatabaseConfig {
    pub url: String,
    pub max_connections: u32,
    pub min_connections: u32,
    pub acquire_timeout: u64,
    pub run_migrations: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct ServerConfig {
    pub port: u16,
    pub address: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LoggingConfig {
    pub level: String,
    pub json_format: bool,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct SessionConfig {
    pub cookie_name: String,
    pub ttl_seconds: i64,
    pub cleanup_interval_seconds: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct StaticFilesConfig {
    pub root: String,
}

#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct LimitsConfig {
    /// Hard bound for JSON and form bodies, in bytes.
    pub body_bytes: u64,
}

#[derive(Debug, Deserialize, Serialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum BagStoreKind {
    #[default]
    Postgres,
    Memory,
}

#[derive(Debug, Deserialize, Serialize, Clone, Default)]
pub struct BagConfig {
    pub store: BagStoreKind,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            url: "postgres://localhost/storefront".to_string(),
            max_connections: 16,
            min_connections: 2,
            acquire_timeout: 5,
            run_migrations: true,
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            port: 3000,
            address: "127.0.0.1".to_string(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            json_format: false,
        }
    }
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            cookie_name: DEFAULT_SESSION_COOKIE.to_string(),
            ttl_seconds: 24 * 60 * 60,
            cleanup_interval_seconds: 300,
        }
    }
}

impl Default for StaticFilesConfig {
    fn default() -> Self {
        Self {
            root: "static".to_string(),
        }
    }
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self { body_bytes: 1_000_000 }
    }
}

impl Config {
    /// Load configuration from multiple sources in priority order:
    /// 1. Built-in defaults
    /// 2. Storefront.toml
    /// 3. Environment variables prefixed with STOREFRONT_ (`__` separates sections,
    ///    e.g. STOREFRONT_SESSION__TTL_SECONDS)
    /// 4. DATABASE_URL
    pub fn load() -> Result<Self, figment::Error> {
        Self::figment().extract()
    }

    fn figment() -> Figment {
        Figment::from(Serialized::defaults(Config::default()))
            .merge(Toml::file("Storefront.toml").nested())
            .merge(Env::prefixed("STOREFRONT_").split("__"))
            .merge(Env::raw().only(&["DATABASE_URL"]).map(|_| "database.url".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_match_cookie_and_body_contract() {
        let config = Config::default();
        assert_eq!(config.session.cookie_name, "sessionId");
        assert_eq!(config.session.ttl_seconds, 86_400);
        assert_eq!(config.limits.body_bytes, 1_000_000);
        assert_eq!(config.bag.store, BagStoreKind::Postgres);
    }

    #[test]
    fn environment_overrides_nested_keys() {
        Jail::expect_with(|jail| {
            jail.set_env("STOREFRONT_SESSION__TTL_SECONDS", "60");
            jail.set_env("STOREFRONT_BAG__STORE", "memory");
            jail.set_env("DATABASE_URL", "postgres://db/shop");

            let config = Config::load()?;
            assert_eq!(config.session.ttl_seconds, 60);
            assert_eq!(config.bag.store, BagStoreKind::Memory);
            assert_eq!(config.database.url, "postgres://db/shop");
            Ok(())
        });
    }

    #[test]
    fn toml_file_is_layered_under_environment() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "Storefront.toml",
                r#"
                [default.server]
                port = 8080

                [default.static_files]
                root = "public"
                "#,
            )?;
            jail.set_env("STOREFRONT_SERVER__PORT", "9090");

            let config = Config::load()?;
            assert_eq!(config.server.port, 9090);
            assert_eq!(config.static_files.root, "public");
            Ok(())
        });
    }
}
