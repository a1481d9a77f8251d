use std::collections::HashMap;
use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::AsyncCommands;
use tokio::sync::RwLock;
use tokio::time::Instant;
use tracing::debug;
use uuid::Uuid;

use super::flow::SessionContext;

#[async_trait]
pub trait SessionStore: Send + Sync {
    async fn load(&self, token: Uuid) -> Result<Option<SessionContext>>;
    async fn save(&self, session: &SessionContext) -> Result<()>;
    async fn remove(&self, token: Uuid) -> Result<()>;
}

fn session_key(token: Uuid) -> String {
    format!("session:{token}")
}

/// Sessions serialised as JSON under `session:<token>`, expiring after `ttl_secs`.
/// Every save refreshes the expiry.
pub struct RedisSessionStore {
    client: redis::Client,
    ttl_secs: u64,
}

impl RedisSessionStore {
    pub fn new(client: redis::Client, ttl_secs: u64) -> Self {
        Self { client, ttl_secs }
    }

    async fn connection(&self) -> Result<redis::aio::MultiplexedConnection> {
        self.client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis")
    }
}

#[async_trait]
impl SessionStore for RedisSessionStore {
    async fn load(&self, token: Uuid) -> Result<Option<SessionContext>> {
        let mut conn = self.connection().await?;
        let raw: Option<String> = conn.get(session_key(token)).await?;
        match raw {
            Some(json) => {
                let session = serde_json::from_str(&json).context("Corrupt session payload")?;
                Ok(Some(session))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, session: &SessionContext) -> Result<()> {
        let mut conn = self.connection().await?;
        let json = serde_json::to_string(session)?;
        redis::cmd("SET")
            .arg(session_key(session.token))
            .arg(json)
            .arg("EX")
            .arg(self.ttl_secs)
            .query_async::<_, ()>(&mut conn)
            .await?;
        debug!(user_id = %session.user_id, state = session.state.name(), "Session saved");
        Ok(())
    }

    async fn remove(&self, token: Uuid) -> Result<()> {
        let mut conn = self.connection().await?;
        conn.del::<_, ()>(session_key(token)).await?;
        Ok(())
    }
}

struct MemoryEntry {
    session: SessionContext,
    expires_at: Instant,
}

/// Process-local sessions, lost on restart. Used when running without Redis and in tests.
/// Same expiry contract as `RedisSessionStore`: `ttl_secs` after the last save.
pub struct MemorySessionStore {
    sessions: RwLock<HashMap<Uuid, MemoryEntry>>,
    ttl: Duration,
}

impl MemorySessionStore {
    pub fn new(ttl_secs: u64) -> Self {
        Self {
            sessions: RwLock::new(HashMap::new()),
            ttl: Duration::from_secs(ttl_secs),
        }
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn load(&self, token: Uuid) -> Result<Option<SessionContext>> {
        let now = Instant::now();
        match self.sessions.read().await.get(&token) {
            Some(entry) if entry.expires_at > now => return Ok(Some(entry.session.clone())),
            Some(_) => {}
            None => return Ok(None),
        }
        // Expired: drop it so the map does not keep dead sessions.
        let mut sessions = self.sessions.write().await;
        if sessions.get(&token).is_some_and(|entry| entry.expires_at <= now) {
            sessions.remove(&token);
            debug!(%token, "Session expired");
        }
        Ok(None)
    }

    async fn save(&self, session: &SessionContext) -> Result<()> {
        let now = Instant::now();
        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, entry| entry.expires_at > now);
        sessions.insert(
            session.token,
            MemoryEntry {
                session: session.clone(),
                expires_at: now + self.ttl,
            },
        );
        Ok(())
    }

    async fn remove(&self, token: Uuid) -> Result<()> {
        self.sessions.write().await.remove(&token);
        Ok(())
    }
}
