//! Shop-level pending state: `shop:{shopId}:pending_invoices`,
//! `pending_email`, `pending_send_conf`. These survive
//! reconnects — they are keyed by shop, not by session — but carry the
//! same TTL as session memory, refreshed on every access.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use voice_agent_core::ids::CustomerId;
use voice_agent_core::money::Money;
use voice_agent_ledger::{ItemRequest, ResolvedItem};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DraftId(pub Uuid);

impl DraftId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for DraftId {
    fn default() -> Self {
        Self::new()
    }
}

/// One shopkeeper's in-progress invoice: produced by `CREATE_INVOICE`,
/// mutated by `TOGGLE_GST`, consumed by `CONFIRM_INVOICE`. At most one per
/// customer at a time — `add_draft` evicts any existing draft for the same
/// `customer_id`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InvoiceDraft {
    pub draft_id: DraftId,
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub customer_email: Option<String>,
    pub resolved_items: Vec<ResolvedItem>,
    pub input_items: Vec<ItemRequest>,
    pub subtotal: Money,
    pub grand_total: Money,
    pub with_gst: bool,
    pub auto_created_products: Vec<String>,
    pub created_at: DateTime<Utc>,
}

/// A confirmed invoice awaiting a delivery address, keyed under
/// `pending_email`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingEmail {
    pub customer_id: CustomerId,
    pub customer_name: String,
    pub invoice_id: Uuid,
    pub items: Vec<ResolvedItem>,
    pub total: Money,
}

/// A `SEND_INVOICE` request awaiting a "haan/nahi" confirmation turn.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingSendConfirm {
    pub channel: String,
    pub contact: String,
    pub invoice_id: Uuid,
}

/// First call to `DELETE_CUSTOMER_DATA` generates this and emails the code
/// to `adminEmail`; the second call supplies it back as `confirmation`.
/// Stored here rather than in the response payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PendingDeleteOtp {
    pub customer_id: CustomerId,
    pub code: String,
}
