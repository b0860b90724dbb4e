//! Redis-backed multi-turn session memory and shop-level pending-action
//! state.
//!
//! Session keys (`conv:{sessionId}:mem`) die with their 4-hour TTL,
//! refreshed on every write. Shop keys (`shop:{shopId}:pending_*`) survive
//! reconnects and carry the same TTL, refreshed on every access.

mod drafts;
mod error;
mod memory;
mod pending;
mod pool;
mod prompt;
mod session;
mod shop_state;
mod store;

pub use error::{ConversationError, Result};
pub use memory::{ActiveCustomer, CustomerContext, Message, MessageRole, SessionMemory, MAX_CUSTOMER_HISTORY, MAX_MESSAGES};
pub use pool::ConversationPool;
pub use shop_state::{DraftId, InvoiceDraft, PendingDeleteOtp, PendingEmail, PendingSendConfirm};
pub use store::ConversationStore;
