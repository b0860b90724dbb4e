//! Deterministic stand-in for the LLM seam, used in tests and `offline`
//! mode. Matches transcripts against the dispatch
//! table's intents by keyword, and renders a plain Hinglish sentence for
//! `respond` rather than calling out to a model.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use voice_agent_core::{ClassifiedIntent, LanguageModel};

struct Rule {
    intent: &'static str,
    keywords: &'static [&'static str],
}

/// Checked in order; first match wins, so more specific phrasings should
/// precede their more general cousins.
const RULES: &[Rule] = &[
    Rule { intent: "CONFIRM_INVOICE", keywords: &["confirm", "pakka", "confirm karo", "haan bill"] },
    Rule { intent: "TOGGLE_GST", keywords: &["gst hatao", "gst lagao", "toggle gst", "without gst", "with gst"] },
    Rule { intent: "CREATE_INVOICE", keywords: &["bill banao", "invoice banao", "bill bana do", "create invoice"] },
    Rule { intent: "SHOW_PENDING_INVOICE", keywords: &["pending bill dikhao", "draft dikhao", "show pending invoice"] },
    Rule { intent: "SEND_INVOICE", keywords: &["bhej do", "send invoice", "whatsapp kar do", "email kar do"] },
    Rule { intent: "PROVIDE_EMAIL", keywords: &["@"] },
    Rule { intent: "CANCEL_INVOICE", keywords: &["bill cancel", "invoice cancel", "cancel kar do"] },
    Rule { intent: "CREATE_REMINDER", keywords: &["yaad dilana", "reminder laga", "reminder set"] },
    Rule { intent: "CANCEL_REMINDER", keywords: &["reminder hata", "reminder cancel"] },
    Rule { intent: "MODIFY_REMINDER", keywords: &["reminder badal", "reschedule reminder"] },
    Rule { intent: "LIST_REMINDERS", keywords: &["sare reminder", "list reminders", "saare reminders"] },
    Rule { intent: "RECORD_PAYMENT", keywords: &["payment mila", "paisa mila", "record payment", "diya hai"] },
    Rule { intent: "ADD_CREDIT", keywords: &["udhaar de do", "credit add", "udhaar chadhao"] },
    Rule { intent: "CHECK_STOCK", keywords: &["stock kitna", "check stock", "kitna bacha"] },
    Rule { intent: "CREATE_CUSTOMER", keywords: &["naya customer", "customer add karo", "new customer"] },
    Rule { intent: "UPDATE_CUSTOMER", keywords: &["number update", "phone badal", "update customer"] },
    Rule { intent: "GET_CUSTOMER_INFO", keywords: &["customer ki details", "customer info", "details batao"] },
    Rule { intent: "DELETE_CUSTOMER_DATA", keywords: &["data delete karo", "customer delete karo"] },
    Rule { intent: "DAILY_SUMMARY", keywords: &["aaj ka hisaab", "daily summary", "aaj ka summary"] },
    Rule { intent: "LIST_CUSTOMER_BALANCES", keywords: &["sabka balance", "list customer balances", "sab customers ka balance"] },
    Rule { intent: "TOTAL_PENDING_AMOUNT", keywords: &["total pending", "kitna pending hai", "total udhaar"] },
    Rule { intent: "CHECK_BALANCE", keywords: &["balance kitna", "check balance", "kitna baaki"] },
    Rule { intent: "SWITCH_LANGUAGE", keywords: &["language badal", "switch language"] },
    Rule { intent: "START_RECORDING", keywords: &["recording shuru", "start recording"] },
    Rule { intent: "STOP_RECORDING", keywords: &["recording band", "stop recording"] },
];

/// A rule-based `LanguageModel`: cheap, deterministic, and good enough to
/// exercise the dispatcher end to end without a live API key.
pub struct RuleBasedLanguageModel;

impl RuleBasedLanguageModel {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RuleBasedLanguageModel {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl LanguageModel for RuleBasedLanguageModel {
    async fn classify(&self, transcript: &str, _conversation_context: &str) -> voice_agent_core::Result<ClassifiedIntent> {
        let lower = transcript.to_lowercase();
        let intent = RULES
            .iter()
            .find(|rule| rule.keywords.iter().any(|kw| lower.contains(kw)))
            .map(|rule| rule.intent)
            .unwrap_or("UNKNOWN");

        let mut entities = HashMap::new();
        if intent == "PROVIDE_EMAIL" {
            if let Some(email) = transcript.split_whitespace().find(|w| w.contains('@')) {
                entities.insert("email".to_string(), Value::String(email.trim_matches(|c: char| !c.is_alphanumeric() && c != '@' && c != '.').to_string()));
            }
        }

        Ok(ClassifiedIntent { intent: intent.to_string(), entities })
    }

    async fn respond(&self, intent: &str, result_json: &Value) -> voice_agent_core::Result<String> {
        Ok(format!("{intent} poora hua: {result_json}"))
    }

    fn model_name(&self) -> &str {
        "rule-based-stub"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn classifies_known_phrase() {
        let llm = RuleBasedLanguageModel::new();
        let classified = llm.classify("bill banao Rahul ke liye", "").await.unwrap();
        assert_eq!(classified.intent, "CREATE_INVOICE");
    }

    #[tokio::test]
    async fn falls_back_to_unknown() {
        let llm = RuleBasedLanguageModel::new();
        let classified = llm.classify("aaj mausam kaisa hai", "").await.unwrap();
        assert_eq!(classified.intent, "UNKNOWN");
    }

    #[tokio::test]
    async fn extracts_email_entity() {
        let llm = RuleBasedLanguageModel::new();
        let classified = llm.classify("mera email hai rahul@example.com", "").await.unwrap();
        assert_eq!(classified.intent, "PROVIDE_EMAIL");
        assert_eq!(classified.entities["email"], "rahul@example.com");
    }
}
