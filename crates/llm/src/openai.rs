//! OpenAI-compatible chat-completions client used as the production
//! `LanguageModel`: one call classifies a transcript into `(intent,
//! entities)`, another asks for a free-form Hinglish response when the
//! templater has no fast-path template for the intent.

use crate::error::LlmError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::time::Duration;
use voice_agent_config::LlmConfig;
use voice_agent_core::{ClassifiedIntent, LanguageModel};

/// Runtime configuration for [`OpenAiLanguageModel`], built from
/// [`voice_agent_config::LlmConfig`].
#[derive(Debug, Clone)]
pub struct OpenAiConfig {
    pub endpoint: String,
    pub model: String,
    pub api_key: String,
    pub timeout: Duration,
}

impl From<&LlmConfig> for OpenAiConfig {
    fn from(cfg: &LlmConfig) -> Self {
        Self {
            endpoint: cfg.endpoint.clone(),
            model: cfg.model.clone(),
            api_key: cfg.api_key.clone().unwrap_or_default(),
            timeout: Duration::from_millis(cfg.timeout_ms),
        }
    }
}

pub struct OpenAiLanguageModel {
    http: reqwest::Client,
    config: OpenAiConfig,
}

impl OpenAiLanguageModel {
    pub fn new(config: OpenAiConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .expect("reqwest client build");
        Self { http, config }
    }

    async fn chat(&self, system: &str, user: &str) -> Result<String, LlmError> {
        let body = json!({
            "model": self.config.model,
            "messages": [
                {"role": "system", "content": system},
                {"role": "user", "content": user},
            ],
            "temperature": 0.0,
        });

        let resp = self
            .http
            .post(format!("{}/chat/completions", self.config.endpoint.trim_end_matches('/')))
            .bearer_auth(&self.config.api_key)
            .json(&body)
            .send()
            .await?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(LlmError::Api(format!("{status}: {text}")));
        }

        let parsed: ChatCompletion = resp.json().await.map_err(LlmError::Network)?;
        parsed
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| LlmError::InvalidResponse("no choices in completion".into()))
    }
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize, Serialize)]
struct ChatMessage {
    content: String,
}

const CLASSIFY_SYSTEM_PROMPT: &str = r#"You are the intent classifier for a Hinglish-speaking Indian retail
shop's back-office voice assistant. Given a transcript and recent
conversation context, respond with ONLY a JSON object of the shape
{"intent": "<INTENT_NAME>", "entities": { ... }}. Valid intents:
TOTAL_PENDING_AMOUNT, LIST_CUSTOMER_BALANCES, CHECK_BALANCE, CREATE_INVOICE,
CONFIRM_INVOICE, SHOW_PENDING_INVOICE, TOGGLE_GST, PROVIDE_EMAIL,
SEND_INVOICE, CREATE_REMINDER, RECORD_PAYMENT, ADD_CREDIT, CHECK_STOCK,
CANCEL_INVOICE, CANCEL_REMINDER, LIST_REMINDERS, CREATE_CUSTOMER,
MODIFY_REMINDER, DAILY_SUMMARY, UPDATE_CUSTOMER, GET_CUSTOMER_INFO,
DELETE_CUSTOMER_DATA, SWITCH_LANGUAGE, START_RECORDING, STOP_RECORDING,
UNKNOWN. Use UNKNOWN when nothing else fits. Never include commentary
outside the JSON object."#;

#[async_trait]
impl LanguageModel for OpenAiLanguageModel {
    async fn classify(&self, transcript: &str, conversation_context: &str) -> voice_agent_core::Result<ClassifiedIntent> {
        let user = format!("Conversation so far:\n{conversation_context}\n\nNew utterance: {transcript}");
        let raw = self.chat(CLASSIFY_SYSTEM_PROMPT, &user).await?;
        parse_classification(&raw).map_err(Into::into)
    }

    async fn respond(&self, intent: &str, result_json: &Value) -> voice_agent_core::Result<String> {
        let system = "You produce a short, natural Hinglish sentence confirming the result \
                       of a back-office action to a shopkeeper over voice. Do not mention JSON \
                       or technical fields, just speak the outcome naturally.";
        let user = format!("intent={intent}\nresult={result_json}");
        self.chat(system, &user).await.map_err(Into::into)
    }

    fn model_name(&self) -> &str {
        &self.config.model
    }
}

fn parse_classification(raw: &str) -> Result<ClassifiedIntent, LlmError> {
    let trimmed = extract_json_object(raw);
    let value: Value = serde_json::from_str(trimmed)
        .map_err(|e| LlmError::InvalidResponse(format!("not valid JSON: {e}")))?;

    let intent = value
        .get("intent")
        .and_then(Value::as_str)
        .ok_or_else(|| LlmError::InvalidResponse("missing `intent` field".into()))?
        .to_string();

    let entities = value
        .get("entities")
        .and_then(Value::as_object)
        .map(|map| map.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_else(HashMap::new);

    Ok(ClassifiedIntent { intent, entities })
}

/// Models sometimes wrap the JSON in prose or a code fence despite
/// instructions; take the outermost `{...}` span rather than failing.
fn extract_json_object(raw: &str) -> &str {
    let start = raw.find('{');
    let end = raw.rfind('}');
    match (start, end) {
        (Some(s), Some(e)) if e >= s => &raw[s..=e],
        _ => raw,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_plain_json() {
        let parsed = parse_classification(r#"{"intent":"CHECK_BALANCE","entities":{"customer":"Rahul"}}"#).unwrap();
        assert_eq!(parsed.intent, "CHECK_BALANCE");
        assert_eq!(parsed.entities["customer"], "Rahul");
    }

    #[test]
    fn parses_json_wrapped_in_prose() {
        let raw = "Sure, here you go:\n```json\n{\"intent\":\"UNKNOWN\",\"entities\":{}}\n```";
        let parsed = parse_classification(raw).unwrap();
        assert_eq!(parsed.intent, "UNKNOWN");
    }

    #[test]
    fn rejects_missing_intent() {
        assert!(parse_classification(r#"{"entities":{}}"#).is_err());
    }
}
