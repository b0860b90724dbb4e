//! The LLM seam: intent classification and fallback natural-language response
//!
//! Used two ways: as a black-box classifier turning a
//! transcript plus recent conversation context into `(intent, entities)`,
//! and as a fallback responder for intents with no fast-path template.

use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;

/// A classified utterance: the dispatch intent name (matching the dispatch
/// table in, e.g. `"CREATE_INVOICE"`, `"UNKNOWN"`) plus its
/// extracted entities as a loose JSON map — entity shapes vary per intent.
#[derive(Debug, Clone)]
pub struct ClassifiedIntent {
    pub intent: String,
    pub entities: HashMap<String, Value>,
}

#[async_trait]
pub trait LanguageModel: Send + Sync + 'static {
    /// Classify a transcript into an intent and its entities, given the
    /// formatted recent-turn context from the Conversation Store.
    async fn classify(&self, transcript: &str, conversation_context: &str) -> crate::Result<ClassifiedIntent>;

    /// Produce a natural-language Hinglish response for an intent that has
    /// no fast-path template.
    async fn respond(&self, intent: &str, result_json: &Value) -> crate::Result<String>;

    fn model_name(&self) -> &str;
}
