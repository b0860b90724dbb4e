//! Customer Resolver: given the classified entities, the
//! session, and conversation memory, produce a single resolved customer, a
//! ranked ambiguous candidate set, or `notFound`.
//!
//! Dependency-injected rather than a singleton: the resolver owns only a
//! `dashmap`-backed in-process active-customer cache (mirroring the
//! `DashMap<String, Arc<Session>>` session-manager pattern used elsewhere in
//! this workspace) and borrows the ledger/conversation handles passed in at
//! construction.

use crate::error::{AgentError, Result};
use dashmap::DashMap;
use std::collections::HashMap;
use serde_json::Value;
use voice_agent_core::customer::Customer;
use voice_agent_core::ids::{CustomerId, ShopId};
use voice_agent_conversation::ConversationStore;
use voice_agent_ledger::{CustomerMatch, LedgerStore};

/// Above this score a single top candidate is accepted outright even if
/// other candidates also cleared the search threshold.
const AMBIGUITY_THRESHOLD: f64 = 0.85;

#[derive(Debug, Clone)]
pub enum ResolveOutcome {
    Resolved(Customer),
    Multiple(Vec<CustomerMatch>),
    NotFound(String),
}

pub struct CustomerResolver {
    ledger: LedgerStore,
    conversation: ConversationStore,
    /// session_id -> (customer_id, name), the in-process half of "active
    /// customer"; the conversation store's
    /// persisted `ActiveCustomer` is step 1b, consulted on a cache miss.
    active_cache: DashMap<String, (CustomerId, String)>,
}

impl CustomerResolver {
    pub fn new(ledger: LedgerStore, conversation: ConversationStore) -> Self {
        Self { ledger, conversation, active_cache: DashMap::new() }
    }

    pub async fn resolve(
        &self,
        shop_id: &ShopId,
        session_id: &str,
        entities: &HashMap<String, Value>,
    ) -> Result<ResolveOutcome> {
        let active_ref = crate::entities::is_active_ref(entities);
        let name = crate::entities::customer_name(entities);

        if active_ref || name.is_none() {
            return self.resolve_active(session_id).await;
        }

        let name = name.unwrap();
        let matches = self.ledger.search_customer_ranked(shop_id, name, session_id).await?;
        if matches.is_empty() {
            return Ok(ResolveOutcome::NotFound(name.to_string()));
        }

        let top_score = matches[0].score;
        if matches.len() > 1 && top_score < AMBIGUITY_THRESHOLD {
            return Ok(ResolveOutcome::Multiple(matches.into_iter().take(3).collect()));
        }

        let customer = matches.into_iter().next().unwrap().customer;
        self.set_active(session_id, &customer).await?;
        Ok(ResolveOutcome::Resolved(customer))
    }

    /// Step 1: in-process cache, then the persisted active customer,
    /// hydrated from the ledger and used to warm the cache.
    async fn resolve_active(&self, session_id: &str) -> Result<ResolveOutcome> {
        if let Some(entry) = self.active_cache.get(session_id) {
            let (id, _) = *entry;
            drop(entry);
            match self.ledger.get_customer(id).await {
                Ok(customer) => return Ok(ResolveOutcome::Resolved(customer)),
                Err(voice_agent_ledger::LedgerError::CustomerNotFound) => {
                    self.active_cache.remove(session_id);
                }
                Err(e) => return Err(e.into()),
            }
        }

        let Some(active) = self.conversation.get_active_customer(session_id).await? else {
            return Ok(ResolveOutcome::NotFound(String::new()));
        };
        let customer = self.ledger.get_customer(active.id).await?;
        self.active_cache.insert(session_id.to_string(), (customer.id, customer.name.clone()));
        Ok(ResolveOutcome::Resolved(customer))
    }

    /// Persists `customer` as active in both the in-process cache and the
    /// Conversation Store.
    pub async fn set_active(&self, session_id: &str, customer: &Customer) -> Result<()> {
        self.active_cache.insert(session_id.to_string(), (customer.id, customer.name.clone()));
        self.conversation.set_active_customer(session_id, customer.id, &customer.name).await?;
        Ok(())
    }

    pub fn invalidate_active(&self, session_id: &str) {
        self.active_cache.remove(session_id);
    }
}

/// Maps a resolver outcome onto the `CUSTOMER_NOT_FOUND` / `MULTIPLE_CUSTOMERS`
/// dispatch errors every customer-using intent shares.
pub fn require_resolved(outcome: ResolveOutcome) -> Result<Customer> {
    match outcome {
        ResolveOutcome::Resolved(c) => Ok(c),
        ResolveOutcome::Multiple(candidates) => {
            let customers: Vec<Value> = candidates
                .iter()
                .map(|m| {
                    serde_json::json!({
                        "customerId": m.customer.id.to_string(),
                        "name": m.customer.name,
                        "landmark": m.customer.landmark,
                        "matchScore": m.score,
                    })
                })
                .collect();
            Err(AgentError::MultipleCustomers(serde_json::json!({ "customers": customers })))
        }
        ResolveOutcome::NotFound(q) => Err(AgentError::CustomerNotFound(q)),
    }
}
