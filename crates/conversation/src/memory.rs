//! Session memory shapes stored under `conv:{sessionId}:mem`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use voice_agent_core::ids::CustomerId;
use voice_agent_core::money::Money;

pub const MAX_MESSAGES: usize = 20;
pub const MAX_CUSTOMER_HISTORY: usize = 10;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageRole {
    User,
    Assistant,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: MessageRole,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub intent: Option<String>,
    #[serde(default)]
    pub entities: HashMap<String, Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ActiveCustomer {
    pub id: CustomerId,
    pub name: String,
}

/// One tracked mention of a named customer within a session, ordered
/// oldest-to-newest in `SessionMemory::customer_history` (the most recent
/// mention is always last).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerContext {
    pub id: Option<CustomerId>,
    pub name: String,
    pub last_mentioned: DateTime<Utc>,
    pub mention_count: u32,
    pub latest_balance: Option<Money>,
    pub latest_amount: Option<Money>,
    pub latest_intent: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionMemory {
    #[serde(default)]
    pub messages: Vec<Message>,
    #[serde(default)]
    pub context: HashMap<String, Value>,
    #[serde(default)]
    pub active_customer: Option<ActiveCustomer>,
    /// Oldest-to-newest; capped at [`MAX_CUSTOMER_HISTORY`]. The spec's
    /// "recent-customers map keyed by lowercase name" is derived from this
    /// on demand rather than stored as a second, independently-mutated copy.
    #[serde(default)]
    pub customer_history: Vec<CustomerContext>,
    #[serde(default)]
    pub turn_count: u64,
}

impl Default for SessionMemory {
    fn default() -> Self {
        Self {
            messages: Vec::new(),
            context: HashMap::new(),
            active_customer: None,
            customer_history: Vec::new(),
            turn_count: 0,
        }
    }
}

impl SessionMemory {
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
        if self.messages.len() > MAX_MESSAGES {
            let overflow = self.messages.len() - MAX_MESSAGES;
            self.messages.drain(0..overflow);
        }
    }

    pub fn recent_messages(&self, n: usize) -> Vec<Message> {
        let start = self.messages.len().saturating_sub(n);
        self.messages[start..].to_vec()
    }

    /// Last 3 tracked customers, most-recently-mentioned last.
    pub fn last_tracked_customers(&self, n: usize) -> &[CustomerContext] {
        let start = self.customer_history.len().saturating_sub(n);
        &self.customer_history[start..]
    }
}
