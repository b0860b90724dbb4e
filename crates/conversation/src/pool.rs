//! Redis connection and TTL policy.
//!
//! Mirrors the teacher's `LedgerPool`-style wrapper (`voice-agent-ledger`,
//! itself mirroring `ScyllaClient`): one long-lived handle, reused across
//! requests, hidden behind a crate-local newtype so the rest of the crate
//! never imports `redis` directly.

use crate::error::Result;
use redis::aio::ConnectionManager;
use std::time::Duration;
use voice_agent_config::ConversationStoreConfig;

#[derive(Clone)]
pub struct ConversationPool {
    conn: ConnectionManager,
    ttl: Duration,
}

impl ConversationPool {
    pub async fn connect(config: ConversationStoreConfig) -> Result<Self> {
        tracing::info!(ttl_hours = config.ttl_hours, "connecting to Redis conversation store");
        let client = redis::Client::open(config.url)?;
        let conn = client.get_connection_manager().await?;
        Ok(Self { conn, ttl: Duration::from_secs(config.ttl_hours * 3600) })
    }

    pub fn ttl_seconds(&self) -> i64 {
        self.ttl.as_secs() as i64
    }

    pub fn raw(&self) -> ConnectionManager {
        self.conn.clone()
    }
}
