//! Cookie-identified, expiring sessions.
//!
//! The store maps an opaque token to a claims payload. Expiry is absolute
//! (`now + ttl`) and is pushed forward only by [`SessionStore::update`];
//! reads never extend a session. Expired entries are evicted lazily on the
//! next read, with a periodic prune to bound memory.

mod cookie;
mod memory_store;

pub use memory_store::InMemorySessionStore;

use crate::auth::Role;
use crate::clock::Clock;
use crate::config::SessionConfig;
use async_trait::async_trait;
use chrono::Duration;
use rocket::http::CookieJar;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::debug;

pub const USER_ID_CLAIM: &str = "user_id";
pub const ROLE_CLAIM: &str = "role";
pub const LAST_SEEN_CLAIM: &str = "last_seen";

/// Claims carried by a session. Merges are shallow: given keys overwrite,
/// the rest persist.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionData(BTreeMap<String, Value>);

impl SessionData {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn for_user(user_id: i64, role: Role) -> Self {
        Self::new().with(USER_ID_CLAIM, user_id).with(ROLE_CLAIM, role.as_str())
    }

    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.0.insert(key.to_string(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Accepts the id either as a JSON number or a numeric string.
    pub fn user_id(&self) -> Option<i64> {
        match self.get(USER_ID_CLAIM)? {
            Value::Number(n) => n.as_i64(),
            Value::String(s) => s.parse().ok(),
            _ => None,
        }
    }

    pub fn role(&self) -> Option<&str> {
        self.get(ROLE_CLAIM)?.as_str()
    }

    pub fn merge(&mut self, partial: SessionData) {
        self.0.extend(partial.0);
    }
}

#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Stores `data` under a fresh random token and returns the token.
    async fn create(&self, data: SessionData) -> String;

    /// Returns the payload, or `None` when the token is unknown or expired.
    /// An expired entry is removed. Does not extend the expiry.
    async fn get(&self, token: &str) -> Option<SessionData>;

    /// Shallow-merges `partial` into the payload and resets the expiry.
    /// No-op for unknown tokens.
    async fn update(&self, token: &str, partial: SessionData);

    async fn destroy(&self, token: &str);

    /// Removes every expired entry, returning how many were dropped.
    async fn prune_expired(&self) -> usize;
}

/// Binds a [`SessionStore`] to the session cookie contract.
pub struct SessionManager {
    store: Arc<dyn SessionStore>,
    clock: Arc<dyn Clock>,
    cookie_name: String,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(store: Arc<dyn SessionStore>, clock: Arc<dyn Clock>, config: &SessionConfig) -> Self {
        Self {
            store,
            clock,
            cookie_name: config.cookie_name.clone(),
            ttl: Duration::seconds(config.ttl_seconds),
        }
    }

    pub fn store(&self) -> &Arc<dyn SessionStore> {
        &self.store
    }

    pub fn token(&self, cookies: &CookieJar<'_>) -> Option<String> {
        cookies
            .get(&self.cookie_name)
            .map(|cookie| cookie.value().trim().to_string())
            .filter(|value| !value.is_empty())
    }

    pub async fn current(&self, cookies: &CookieJar<'_>) -> Option<SessionData> {
        let token = self.token(cookies)?;
        self.store.get(&token).await
    }

    /// Starts a session for `data`, replacing whatever session the request
    /// carried, and sets the cookie.
    pub async fn start(&self, cookies: &CookieJar<'_>, data: SessionData) -> String {
        if let Some(previous) = self.token(cookies) {
            self.store.destroy(&previous).await;
        }

        let token = self.store.create(data).await;
        cookies.add(cookie::session_cookie(&self.cookie_name, &token, self.ttl));
        token
    }

    /// Merges `partial` into the live session and re-issues the cookie so its
    /// max-age matches the refreshed expiry.
    pub async fn refresh(&self, cookies: &CookieJar<'_>, partial: SessionData) {
        let Some(token) = self.token(cookies) else {
            return;
        };

        if self.store.get(&token).await.is_none() {
            return;
        }

        self.store.update(&token, partial).await;
        cookies.add(cookie::session_cookie(&self.cookie_name, &token, self.ttl));
    }

    /// Records activity on the live session, sliding its expiry.
    pub async fn touch(&self, cookies: &CookieJar<'_>) {
        let last_seen = SessionData::new().with(LAST_SEEN_CLAIM, self.clock.now().timestamp());
        self.refresh(cookies, last_seen).await;
    }

    pub async fn end(&self, cookies: &CookieJar<'_>) {
        if let Some(token) = self.token(cookies) {
            self.store.destroy(&token).await;
        }
        cookies.remove(cookie::removal_cookie(&self.cookie_name));
    }
}

pub fn spawn_cleanup_task(store: Arc<dyn SessionStore>, interval: std::time::Duration) {
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let pruned = store.prune_expired().await;
            if pruned > 0 {
                debug!(pruned, "pruned expired sessions");
            }
        }
    });
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_is_shallow() {
        let mut data = SessionData::for_user(7, Role::Customer).with("theme", "dark");
        data.merge(SessionData::new().with("theme", "light").with("last_seen", 10));

        assert_eq!(data.user_id(), Some(7));
        assert_eq!(data.role(), Some("customer"));
        assert_eq!(data.get("theme"), Some(&Value::from("light")));
        assert_eq!(data.get("last_seen"), Some(&Value::from(10)));
    }

    #[test]
    fn user_id_accepts_numeric_strings() {
        let data = SessionData::new().with(USER_ID_CLAIM, "42");
        assert_eq!(data.user_id(), Some(42));

        let data = SessionData::new().with(USER_ID_CLAIM, "forty-two");
        assert_eq!(data.user_id(), None);

        let data = SessionData::new().with(USER_ID_CLAIM, true);
        assert_eq!(data.user_id(), None);
    }
}
