//! Shop-level pending-invoice-draft operations. At most one
//! draft per customer: `add_draft` evicts any existing draft for the same
//! `customer_id` before inserting.

use crate::error::Result;
use crate::shop_state::{DraftId, InvoiceDraft};
use crate::store::ConversationStore;
use redis::AsyncCommands;
use voice_agent_core::ids::ShopId;

impl ConversationStore {
    async fn read_drafts(&self, shop_id: &ShopId) -> Result<Vec<InvoiceDraft>> {
        let mut conn = self.pool.raw();
        let raw: Option<String> = conn.get(Self::pending_invoices_key(shop_id)).await?;
        self.touch_shop_key(&Self::pending_invoices_key(shop_id)).await?;
        match raw {
            Some(json) => Ok(serde_json::from_str(&json)?),
            None => Ok(Vec::new()),
        }
    }

    async fn write_drafts(&self, shop_id: &ShopId, drafts: &[InvoiceDraft]) -> Result<()> {
        let json = serde_json::to_string(drafts)?;
        let mut conn = self.pool.raw();
        let _: () = conn.set_ex(Self::pending_invoices_key(shop_id), json, self.pool.ttl_seconds() as u64).await?;
        Ok(())
    }

    pub async fn add_draft(&self, shop_id: &ShopId, mut draft: InvoiceDraft) -> Result<DraftId> {
        let mut drafts = self.read_drafts(shop_id).await?;
        drafts.retain(|d| d.customer_id != draft.customer_id);
        draft.draft_id = DraftId::new();
        let id = draft.draft_id;
        drafts.push(draft);
        self.write_drafts(shop_id, &drafts).await?;
        Ok(id)
    }

    pub async fn update_draft(&self, shop_id: &ShopId, draft_id: DraftId, updated: InvoiceDraft) -> Result<()> {
        let mut drafts = self.read_drafts(shop_id).await?;
        if let Some(slot) = drafts.iter_mut().find(|d| d.draft_id == draft_id) {
            *slot = updated;
        }
        self.write_drafts(shop_id, &drafts).await
    }

    pub async fn remove_draft(&self, shop_id: &ShopId, draft_id: DraftId) -> Result<()> {
        let mut drafts = self.read_drafts(shop_id).await?;
        drafts.retain(|d| d.draft_id != draft_id);
        self.write_drafts(shop_id, &drafts).await
    }

    pub async fn list_drafts(&self, shop_id: &ShopId) -> Result<Vec<InvoiceDraft>> {
        self.read_drafts(shop_id).await
    }

    pub async fn first_draft(&self, shop_id: &ShopId) -> Result<Option<InvoiceDraft>> {
        Ok(self.read_drafts(shop_id).await?.into_iter().next())
    }

    pub async fn clear_drafts(&self, shop_id: &ShopId) -> Result<()> {
        let mut conn = self.pool.raw();
        let _: () = conn.del(Self::pending_invoices_key(shop_id)).await?;
        Ok(())
    }
}
