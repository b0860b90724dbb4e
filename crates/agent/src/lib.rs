//! Customer Resolver, Intent Dispatcher, and Response Templater — the
//! three stages between a classified utterance and a spoken reply.
//!
//! [`VoiceAgent`] combines all three into the one handle a session loop
//! needs: feed it a transcript (already speech-to-texted) plus the
//! conversation context string, and it classifies, resolves, dispatches,
//! and templates the response in one call.

pub mod dispatcher;
pub mod entities;
pub mod error;
pub mod resolver;
pub mod templater;

pub use dispatcher::{dispatch, check_pending_send_confirmation, DispatchContext, DispatchOutcome};
pub use error::{AgentError, Result};
pub use resolver::{require_resolved, CustomerResolver, ResolveOutcome};
pub use templater::Templater;

use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use voice_agent_core::traits::{ClassifiedIntent, LanguageModel, Notifier};
use voice_agent_core::ids::ShopId;
use voice_agent_conversation::ConversationStore;
use voice_agent_ledger::LedgerStore;

/// Wires a shop's dependency-injected handles into the full turn pipeline.
/// One instance per running shop process; cheap to clone (every field is
/// itself a handle over a pool or a shared trait object).
#[derive(Clone)]
pub struct VoiceAgent {
    ctx: DispatchContext,
    classifier: Arc<dyn LanguageModel>,
    templater: Arc<Templater>,
}

/// One full turn's outcome: the classified intent name, the dispatch
/// result, and the rendered Hinglish reply, all three of which the session
/// loop logs and forwards to the client.
#[derive(Debug, Clone)]
pub struct TurnResult {
    pub intent: String,
    pub entities: HashMap<String, Value>,
    pub outcome: DispatchOutcome,
    pub reply: String,
}

impl VoiceAgent {
    pub fn new(
        ledger: LedgerStore,
        conversation: ConversationStore,
        notifier: Arc<dyn Notifier>,
        classifier: Arc<dyn LanguageModel>,
        responder: Option<Arc<dyn LanguageModel>>,
        shop_id: ShopId,
        admin_email: Option<String>,
    ) -> Self {
        let resolver = Arc::new(CustomerResolver::new(ledger.clone(), conversation.clone()));
        Self {
            ctx: DispatchContext { ledger, conversation, resolver, notifier, shop_id, admin_email },
            classifier,
            templater: Arc::new(Templater::new(responder)),
        }
    }

    pub fn shop_id(&self) -> &ShopId {
        &self.ctx.shop_id
    }

    /// Runs one full turn: classify, dispatch, template. `operator_role`
    /// gates `DELETE_CUSTOMER_DATA` and is supplied by the session's auth
    /// context, never spoken by the user.
    pub async fn handle_turn(
        &self,
        session_id: &str,
        transcript: &str,
        conversation_context: &str,
        operator_role: Option<&str>,
    ) -> Result<TurnResult> {
        if let Some(data) = check_pending_send_confirmation(&self.ctx, transcript).await? {
            let intent = "SEND_INVOICE_CONFIRM".to_string();
            let outcome = DispatchOutcome { success: true, data, error: None };
            let reply = self.templater.render(&intent, &outcome).await;
            return Ok(TurnResult { intent, entities: HashMap::new(), outcome, reply });
        }

        let classified: ClassifiedIntent = self.classifier.classify(transcript, conversation_context).await?;
        let outcome = dispatch(&self.ctx, session_id, &classified, operator_role).await;
        let reply = self.templater.render(&classified.intent, &outcome).await;
        Ok(TurnResult { intent: classified.intent, entities: classified.entities, outcome, reply })
    }
}
