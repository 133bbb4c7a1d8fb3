use super::{SessionData, SessionStore};
use crate::clock::Clock;
use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use rand::distr::{Alphanumeric, SampleString};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::Mutex;

pub const TOKEN_LENGTH: usize = 64;

#[derive(Debug, Clone)]
struct SessionEntry {
    data: SessionData,
    expires_at: DateTime<Utc>,
}

/// Process-local session table. Sessions do not survive a restart.
pub struct InMemorySessionStore {
    ttl: Duration,
    clock: Arc<dyn Clock>,
    sessions: Mutex<HashMap<String, SessionEntry>>,
}

impl InMemorySessionStore {
    pub fn new(ttl: Duration, clock: Arc<dyn Clock>) -> Self {
        Self {
            ttl,
            clock,
            sessions: Mutex::new(HashMap::new()),
        }
    }

    fn new_token() -> String {
        Alphanumeric.sample_string(&mut rand::rng(), TOKEN_LENGTH)
    }
}

#[async_trait]
impl SessionStore for InMemorySessionStore {
    async fn create(&self, data: SessionData) -> String {
        let token = Self::new_token();
        let entry = SessionEntry {
            data,
            expires_at: self.clock.now() + self.ttl,
        };

        self.sessions.lock().await.insert(token.clone(), entry);
        token
    }

    async fn get(&self, token: &str) -> Option<SessionData> {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().await;

        let expired = sessions.get(token)?.expires_at < now;
        if expired {
            sessions.remove(token);
            return None;
        }

        sessions.get(token).map(|entry| entry.data.clone())
    }

    async fn update(&self, token: &str, partial: SessionData) {
        let expires_at = self.clock.now() + self.ttl;
        if let Some(entry) = self.sessions.lock().await.get_mut(token) {
            entry.data.merge(partial);
            entry.expires_at = expires_at;
        }
    }

    async fn destroy(&self, token: &str) {
        self.sessions.lock().await.remove(token);
    }

    async fn prune_expired(&self) -> usize {
        let now = self.clock.now();
        let mut sessions = self.sessions.lock().await;
        let before = sessions.len();
        sessions.retain(|_, entry| entry.expires_at >= now);
        before - sessions.len()
    }
}
