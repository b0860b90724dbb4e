//! Session-memory operations: message history, active
//! customer, customer-mention tracking, and the LLM context prompt.

use crate::error::Result;
use crate::memory::{ActiveCustomer, CustomerContext, Message, MessageRole, SessionMemory, MAX_CUSTOMER_HISTORY};
use crate::store::ConversationStore;
use chrono::Utc;
use serde_json::Value;
use std::collections::HashMap;
use voice_agent_core::ids::CustomerId;
use voice_agent_core::money::Money;

impl ConversationStore {
    pub async fn append_user_message(
        &self,
        session_id: &str,
        text: &str,
        intent: Option<&str>,
        entities: HashMap<String, Value>,
    ) -> Result<()> {
        let mut mem = self.load_session(session_id).await?;

        let name = entities
            .get("customer")
            .or_else(|| entities.get("name"))
            .and_then(Value::as_str)
            .map(str::to_string);
        let amount = entities.get("amount").and_then(amount_to_money);

        mem.push_message(Message {
            role: MessageRole::User,
            content: text.to_string(),
            timestamp: Utc::now(),
            intent: intent.map(str::to_string),
            entities: entities.clone(),
        });
        mem.turn_count += 1;

        if let Some(name) = name {
            self.track_customer_mention(&mut mem, None, &name, amount, intent);
        }

        self.save_session(session_id, &mem).await
    }

    pub async fn append_assistant_message(&self, session_id: &str, text: &str) -> Result<()> {
        let mut mem = self.load_session(session_id).await?;
        mem.push_message(Message {
            role: MessageRole::Assistant,
            content: text.to_string(),
            timestamp: Utc::now(),
            intent: None,
            entities: HashMap::new(),
        });
        self.save_session(session_id, &mem).await
    }

    pub async fn get_recent_messages(&self, session_id: &str, n: usize) -> Result<Vec<Message>> {
        let mem = self.load_session(session_id).await?;
        Ok(mem.recent_messages(n))
    }

    pub async fn set_active_customer(&self, session_id: &str, id: CustomerId, name: &str) -> Result<()> {
        let mut mem = self.load_session(session_id).await?;
        mem.active_customer = Some(ActiveCustomer { id, name: name.to_string() });
        self.track_customer_mention(&mut mem, Some(id), name, None, None);
        self.save_session(session_id, &mem).await
    }

    pub async fn get_active_customer(&self, session_id: &str) -> Result<Option<ActiveCustomer>> {
        let mem = self.load_session(session_id).await?;
        Ok(mem.active_customer)
    }

    /// `SWITCH_LANGUAGE` preference, kept in the session's free-form
    /// `context` map.
    pub async fn set_language(&self, session_id: &str, language: &str) -> Result<()> {
        let mut mem = self.load_session(session_id).await?;
        mem.context.insert("language".to_string(), Value::String(language.to_string()));
        self.save_session(session_id, &mem).await
    }

    pub async fn get_language(&self, session_id: &str) -> Result<String> {
        let mem = self.load_session(session_id).await?;
        Ok(mem.context.get("language").and_then(Value::as_str).unwrap_or("hi").to_string())
    }

    /// `START_RECORDING`/`STOP_RECORDING` audio-archival flag.
    pub async fn set_recording(&self, session_id: &str, recording: bool) -> Result<()> {
        let mut mem = self.load_session(session_id).await?;
        mem.context.insert("recording".to_string(), Value::Bool(recording));
        self.save_session(session_id, &mem).await
    }

    pub async fn is_recording(&self, session_id: &str) -> Result<bool> {
        let mem = self.load_session(session_id).await?;
        Ok(mem.context.get("recording").and_then(Value::as_bool).unwrap_or(false))
    }

    /// `switchToPreviousCustomer` — second-to-last entry in history; a
    /// no-op when fewer than two customers have been mentioned.
    pub async fn switch_to_previous_customer(&self, session_id: &str) -> Result<Option<ActiveCustomer>> {
        let mut mem = self.load_session(session_id).await?;
        if mem.customer_history.len() < 2 {
            return Ok(mem.active_customer);
        }
        let previous = mem.customer_history[mem.customer_history.len() - 2].clone();
        let active = ActiveCustomer { id: previous.id.unwrap_or_else(CustomerId::new), name: previous.name.clone() };
        mem.active_customer = Some(active.clone());
        self.save_session(session_id, &mem).await?;
        Ok(Some(active))
    }

    /// `switchToCustomerByName` — exact (case-insensitive) match first,
    /// else fuzzy over stored history names at threshold 0.7.
    pub async fn switch_to_customer_by_name(&self, session_id: &str, query: &str) -> Result<Option<ActiveCustomer>> {
        let mut mem = self.load_session(session_id).await?;

        let exact = mem
            .customer_history
            .iter()
            .find(|c| c.name.eq_ignore_ascii_case(query))
            .cloned();

        let found = match exact {
            Some(c) => Some(c),
            None => {
                let names: Vec<String> = mem.customer_history.iter().map(|c| c.name.clone()).collect();
                self.fuzzy
                    .find_best_match(query, &names, 0.7)
                    .and_then(|(_, matched)| mem.customer_history.iter().find(|c| c.name == matched).cloned())
            }
        };

        let Some(context) = found else { return Ok(None) };
        let active = ActiveCustomer {
            id: context.id.unwrap_or_else(CustomerId::new),
            name: context.name.clone(),
        };
        mem.active_customer = Some(active.clone());
        self.save_session(session_id, &mem).await?;
        Ok(Some(active))
    }

    /// `findMatchingCustomers` — all history entries fuzzy-matching `query`
    /// at or above `threshold`, descending by score.
    pub async fn find_matching_customers(&self, session_id: &str, query: &str, threshold: f64) -> Result<Vec<CustomerContext>> {
        let mem = self.load_session(session_id).await?;
        let names: Vec<String> = mem.customer_history.iter().map(|c| c.name.clone()).collect();
        let matches = self.fuzzy.find_all_matches(query, &names, threshold);
        Ok(matches
            .into_iter()
            .filter_map(|(_, matched)| mem.customer_history.iter().find(|c| c.name == matched).cloned())
            .collect())
    }

    pub async fn update_customer_context(
        &self,
        session_id: &str,
        name: &str,
        balance: Option<Money>,
        amount: Option<Money>,
        intent: Option<&str>,
    ) -> Result<()> {
        let mut mem = self.load_session(session_id).await?;
        self.track_customer_mention(&mut mem, None, name, amount, intent);
        if let Some(balance) = balance {
            if let Some(entry) = mem.customer_history.iter_mut().rev().find(|c| self.fuzzy.is_same_person(&c.name, name)) {
                entry.latest_balance = Some(balance);
            }
        }
        self.save_session(session_id, &mem).await
    }

    /// `trackCustomerMention` — dedupes via `isSamePerson`; a fuzzy-equal
    /// entry has its mention count bumped and is moved to the end
    /// (most-recent); otherwise a fresh entry is appended. History is
    /// capped at [`MAX_CUSTOMER_HISTORY`], oldest evicted first.
    pub(crate) fn track_customer_mention(
        &self,
        mem: &mut SessionMemory,
        id: Option<CustomerId>,
        name: &str,
        amount: Option<Money>,
        intent: Option<&str>,
    ) {
        track_mention(&self.fuzzy, mem, id, name, amount, intent);
    }
}

/// `trackCustomerMention` — dedupes via `isSamePerson`; a fuzzy-equal
/// entry has its mention count bumped and is moved to the end
/// (most-recent); otherwise a fresh entry is appended. History is capped
/// at [`MAX_CUSTOMER_HISTORY`], oldest evicted first. Free function so it
/// can be exercised without a live Redis connection.
fn track_mention(
    fuzzy: &voice_agent_text::FuzzyMatcher,
    mem: &mut SessionMemory,
    id: Option<CustomerId>,
    name: &str,
    amount: Option<Money>,
    intent: Option<&str>,
) {
    let now = Utc::now();
    if let Some(pos) = mem.customer_history.iter().position(|c| fuzzy.is_same_person(&c.name, name)) {
        let mut entry = mem.customer_history.remove(pos);
        entry.mention_count += 1;
        entry.last_mentioned = now;
        if id.is_some() {
            entry.id = id;
        }
        if amount.is_some() {
            entry.latest_amount = amount;
        }
        if intent.is_some() {
            entry.latest_intent = intent.map(str::to_string);
        }
        mem.customer_history.push(entry);
    } else {
        mem.customer_history.push(CustomerContext {
            id,
            name: name.to_string(),
            last_mentioned: now,
            mention_count: 1,
            latest_balance: None,
            latest_amount: amount,
            latest_intent: intent.map(str::to_string),
        });
    }

    if mem.customer_history.len() > MAX_CUSTOMER_HISTORY {
        let overflow = mem.customer_history.len() - MAX_CUSTOMER_HISTORY;
        mem.customer_history.drain(0..overflow);
    }
}

fn amount_to_money(v: &Value) -> Option<Money> {
    match v {
        Value::String(s) => s.parse().ok(),
        Value::Number(n) => n.as_f64().and_then(|f| rust_decimal::Decimal::try_from(f).ok()).map(Money::from_decimal),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use voice_agent_text::FuzzyMatcher;

    fn matcher() -> FuzzyMatcher {
        FuzzyMatcher::new(vec!["ji".to_string(), "bhai".to_string()], std::collections::HashMap::new())
    }

    #[test]
    fn first_mention_inserts_one_entry() {
        let m = matcher();
        let mut mem = SessionMemory::default();
        track_mention(&m, &mut mem, None, "Rahul", None, Some("CHECK_BALANCE"));
        assert_eq!(mem.customer_history.len(), 1);
        assert_eq!(mem.customer_history[0].mention_count, 1);
    }

    #[test]
    fn repeated_mention_dedupes_and_bumps_count() {
        let m = matcher();
        let mut mem = SessionMemory::default();
        track_mention(&m, &mut mem, None, "Rahul bhai", None, None);
        track_mention(&m, &mut mem, None, "Rahul", None, None);
        assert_eq!(mem.customer_history.len(), 1);
        assert_eq!(mem.customer_history[0].mention_count, 2);
    }

    #[test]
    fn history_caps_at_ten_evicting_oldest() {
        let m = matcher();
        let mut mem = SessionMemory::default();
        for i in 0..12 {
            track_mention(&m, &mut mem, None, &format!("Customer{i}"), None, None);
        }
        assert_eq!(mem.customer_history.len(), MAX_CUSTOMER_HISTORY);
        assert_eq!(mem.customer_history.last().unwrap().name, "Customer11");
        assert!(mem.customer_history.iter().all(|c| c.name != "Customer0"));
    }

    #[test]
    fn most_recent_mention_moves_to_end() {
        let m = matcher();
        let mut mem = SessionMemory::default();
        track_mention(&m, &mut mem, None, "Amit", None, None);
        track_mention(&m, &mut mem, None, "Priya", None, None);
        track_mention(&m, &mut mem, None, "Amit", None, None);
        assert_eq!(mem.customer_history.last().unwrap().name, "Amit");
        assert_eq!(mem.customer_history.last().unwrap().mention_count, 2);
    }
}
