//! `LanguageModel` adapters.
//!
//! Two implementations: an OpenAI-compatible HTTP client for production, and
//! a deterministic rule-based stub used in tests and `offline` mode so the
//! rest of the system never needs a live API key to be exercised.

mod error;
mod openai;
mod rule_based;

pub use error::LlmError;
pub use openai::{OpenAiConfig, OpenAiLanguageModel};
pub use rule_based::RuleBasedLanguageModel;
