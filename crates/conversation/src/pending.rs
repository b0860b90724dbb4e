//! Shop-level `pending_email` / `pending_send_conf` / `pending_delete_otp`
//! get/set/clear.

use crate::error::Result;
use crate::shop_state::{PendingDeleteOtp, PendingEmail, PendingSendConfirm};
use crate::store::ConversationStore;
use redis::AsyncCommands;
use voice_agent_core::ids::ShopId;

impl ConversationStore {
    pub async fn get_pending_email(&self, shop_id: &ShopId) -> Result<Option<PendingEmail>> {
        let mut conn = self.pool.raw();
        let key = Self::pending_email_key(shop_id);
        let raw: Option<String> = conn.get(&key).await?;
        self.touch_shop_key(&key).await?;
        Ok(raw.map(|json| serde_json::from_str(&json)).transpose()?)
    }

    pub async fn set_pending_email(&self, shop_id: &ShopId, pending: &PendingEmail) -> Result<()> {
        let json = serde_json::to_string(pending)?;
        let mut conn = self.pool.raw();
        let _: () = conn.set_ex(Self::pending_email_key(shop_id), json, self.pool.ttl_seconds() as u64).await?;
        Ok(())
    }

    pub async fn clear_pending_email(&self, shop_id: &ShopId) -> Result<()> {
        let mut conn = self.pool.raw();
        let _: () = conn.del(Self::pending_email_key(shop_id)).await?;
        Ok(())
    }

    pub async fn get_pending_send_conf(&self, shop_id: &ShopId) -> Result<Option<PendingSendConfirm>> {
        let mut conn = self.pool.raw();
        let key = Self::pending_send_conf_key(shop_id);
        let raw: Option<String> = conn.get(&key).await?;
        self.touch_shop_key(&key).await?;
        Ok(raw.map(|json| serde_json::from_str(&json)).transpose()?)
    }

    pub async fn set_pending_send_conf(&self, shop_id: &ShopId, pending: &PendingSendConfirm) -> Result<()> {
        let json = serde_json::to_string(pending)?;
        let mut conn = self.pool.raw();
        let _: () = conn.set_ex(Self::pending_send_conf_key(shop_id), json, self.pool.ttl_seconds() as u64).await?;
        Ok(())
    }

    pub async fn clear_pending_send_conf(&self, shop_id: &ShopId) -> Result<()> {
        let mut conn = self.pool.raw();
        let _: () = conn.del(Self::pending_send_conf_key(shop_id)).await?;
        Ok(())
    }

    pub async fn get_pending_delete_otp(&self, shop_id: &ShopId) -> Result<Option<PendingDeleteOtp>> {
        let mut conn = self.pool.raw();
        let key = Self::pending_delete_otp_key(shop_id);
        let raw: Option<String> = conn.get(&key).await?;
        self.touch_shop_key(&key).await?;
        Ok(raw.map(|json| serde_json::from_str(&json)).transpose()?)
    }

    pub async fn set_pending_delete_otp(&self, shop_id: &ShopId, pending: &PendingDeleteOtp) -> Result<()> {
        let json = serde_json::to_string(pending)?;
        let mut conn = self.pool.raw();
        let _: () = conn
            .set_ex(Self::pending_delete_otp_key(shop_id), json, self.pool.ttl_seconds() as u64)
            .await?;
        Ok(())
    }

    pub async fn clear_pending_delete_otp(&self, shop_id: &ShopId) -> Result<()> {
        let mut conn = self.pool.raw();
        let _: () = conn.del(Self::pending_delete_otp_key(shop_id)).await?;
        Ok(())
    }
}
