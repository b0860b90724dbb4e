//! `ConversationStore` — the Redis-backed handle every operation in this
//! crate hangs off.

use crate::error::Result;
use crate::memory::SessionMemory;
use crate::pool::ConversationPool;
use redis::AsyncCommands;
use std::sync::Arc;
use voice_agent_core::ids::ShopId;
use voice_agent_text::FuzzyMatcher;

#[derive(Clone)]
pub struct ConversationStore {
    pub(crate) pool: ConversationPool,
    pub(crate) fuzzy: Arc<FuzzyMatcher>,
}

impl ConversationStore {
    pub fn new(pool: ConversationPool, fuzzy: Arc<FuzzyMatcher>) -> Self {
        Self { pool, fuzzy }
    }

    pub(crate) fn session_key(session_id: &str) -> String {
        format!("conv:{session_id}:mem")
    }

    pub(crate) fn pending_invoices_key(shop_id: &ShopId) -> String {
        format!("shop:{}:pending_invoices", shop_id.0)
    }

    pub(crate) fn pending_email_key(shop_id: &ShopId) -> String {
        format!("shop:{}:pending_email", shop_id.0)
    }

    pub(crate) fn pending_send_conf_key(shop_id: &ShopId) -> String {
        format!("shop:{}:pending_send_conf", shop_id.0)
    }

    pub(crate) fn pending_delete_otp_key(shop_id: &ShopId) -> String {
        format!("shop:{}:pending_delete_otp", shop_id.0)
    }

    /// `loadSession` — creates an empty memory on a cache miss, without
    /// writing it back; the first mutation establishes the TTL.
    pub async fn load_session(&self, session_id: &str) -> Result<SessionMemory> {
        let mut conn = self.pool.raw();
        let raw: Option<String> = conn.get(Self::session_key(session_id)).await?;
        match raw {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(SessionMemory::default()),
        }
    }

    /// Persists `memory` and refreshes the session TTL — called after
    /// every mutation in `session.rs`.
    pub(crate) async fn save_session(&self, session_id: &str, memory: &SessionMemory) -> Result<()> {
        let json = serde_json::to_string(memory)?;
        let mut conn = self.pool.raw();
        let _: () = conn.set_ex(Self::session_key(session_id), json, self.pool.ttl_seconds() as u64).await?;
        Ok(())
    }

    /// Refreshes a shop-level key's TTL without altering its value —
    /// "Shop-level keys use the same TTL, refreshed on each access."
    pub(crate) async fn touch_shop_key(&self, key: &str) -> Result<()> {
        let mut conn = self.pool.raw();
        let _: () = conn.expire(key, self.pool.ttl_seconds()).await?;
        Ok(())
    }
}
