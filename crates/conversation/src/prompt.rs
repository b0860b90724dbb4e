//! `formatContextPrompt`: the single string injected into
//! the LLM classifier's prompt ahead of the new transcript.
//!
//! Design note (recorded in DESIGN.md): pending-invoice state lives at the
//! shop level, not the session level, so a shop id is threaded through
//! explicitly rather than smuggled into session memory, since nothing else
//! in this store needs a session-to-shop mapping.

use crate::memory::MessageRole;
use crate::shop_state::InvoiceDraft;
use crate::store::ConversationStore;
use crate::error::Result;
use std::fmt::Write as _;
use voice_agent_core::ids::ShopId;

impl ConversationStore {
    pub async fn format_context_prompt(&self, session_id: &str, shop_id: &ShopId, n: usize) -> Result<String> {
        let mem = self.load_session(session_id).await?;
        let mut out = String::new();

        if !mem.messages.is_empty() {
            out.push_str("Recent conversation:\n");
            for msg in mem.recent_messages(n) {
                let role = match msg.role {
                    MessageRole::User => "User",
                    MessageRole::Assistant => "Assistant",
                };
                let _ = writeln!(out, "{role}: {}", msg.content);
            }
        }

        let tracked = mem.last_tracked_customers(3);
        if !tracked.is_empty() {
            out.push_str("\nRecently discussed customers:\n");
            for c in tracked {
                let is_active = mem.active_customer.as_ref().map(|a| a.name == c.name).unwrap_or(false);
                let flag = if is_active { " (current)" } else { "" };
                let _ = writeln!(out, "- {}{flag}, mentioned {}x", c.name, c.mention_count);
            }
        }

        let drafts = self.list_drafts(shop_id).await?;
        if let Some(hint) = pending_invoice_hint(&drafts) {
            out.push('\n');
            out.push_str(&hint);
        }

        if let Some(pending_email) = self.get_pending_email(shop_id).await? {
            let _ = writeln!(
                out,
                "\nPENDING EMAIL: invoice for {} awaiting an email address — interpret the next utterance as PROVIDE_EMAIL if it contains '@'.",
                pending_email.customer_name
            );
        }

        if let Some(conf) = self.get_pending_send_conf(shop_id).await? {
            let _ = writeln!(
                out,
                "\nPENDING SEND CONFIRMATION: sending invoice via {} to {} — interpret 'haan/confirm/ok' as confirmation, 'nahi/cancel' as decline.",
                conf.channel, conf.contact
            );
        }

        Ok(out)
    }
}

fn pending_invoice_hint(drafts: &[InvoiceDraft]) -> Option<String> {
    if drafts.is_empty() {
        return None;
    }
    if drafts.len() == 1 {
        let d = &drafts[0];
        let items: Vec<String> = d
            .resolved_items
            .iter()
            .map(|i| format!("{}×{}", i.product_name, i.quantity))
            .collect();
        return Some(format!(
            "PENDING INVOICE awaiting confirmation for {}: items {}, total ₹{} — interpret 'haan/confirm/ok' as CONFIRM_INVOICE; 'nahi/cancel' as CANCEL_INVOICE.",
            d.customer_name,
            items.join(", "),
            d.grand_total
        ));
    }
    let names: Vec<&str> = drafts.iter().map(|d| d.customer_name.as_str()).collect();
    Some(format!(
        "MULTIPLE PENDING INVOICES awaiting confirmation: {}. Ask the shopkeeper \"which bill?\" before dispatching CONFIRM_INVOICE.",
        names.join(", ")
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shop_state::DraftId;
    use chrono::Utc;
    use voice_agent_core::ids::CustomerId;
    use voice_agent_core::money::Money;

    fn draft(name: &str) -> InvoiceDraft {
        InvoiceDraft {
            draft_id: DraftId::new(),
            customer_id: CustomerId::new(),
            customer_name: name.to_string(),
            customer_email: None,
            resolved_items: Vec::new(),
            input_items: Vec::new(),
            subtotal: Money::ZERO,
            grand_total: Money::from_rupees(250),
            with_gst: false,
            auto_created_products: Vec::new(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn no_drafts_yields_no_hint() {
        assert!(pending_invoice_hint(&[]).is_none());
    }

    #[test]
    fn single_draft_names_the_customer() {
        let hint = pending_invoice_hint(&[draft("Bharat")]).unwrap();
        assert!(hint.contains("Bharat"));
        assert!(hint.contains("CONFIRM_INVOICE"));
    }

    #[test]
    fn multiple_drafts_ask_which_bill() {
        let hint = pending_invoice_hint(&[draft("Bharat"), draft("Priya")]).unwrap();
        assert!(hint.contains("which bill"));
        assert!(hint.contains("Bharat"));
        assert!(hint.contains("Priya"));
    }
}
