//! `AppState`: the one handle bundle every axum extractor pulls from.
//!
//! A single shop runs per process (per SPEC_FULL's single-tenant-per-process
//! design), so `agent` is one shared `VoiceAgent`, not a per-session map —
//! only `sessions` (WebSocket connection bookkeeping) and `rate_limiters`
//! vary per connection.

use dashmap::DashMap;
use metrics_exporter_prometheus::PrometheusHandle;
use parking_lot::{Mutex, RwLock};
use std::sync::Arc;
use voice_agent_agent::VoiceAgent;
use voice_agent_config::Settings;
use voice_agent_conversation::ConversationStore;
use voice_agent_core::traits::{SpeechToText, TextToSpeech};
use voice_agent_ledger::LedgerStore;

use crate::rate_limit::RateLimiter;
use crate::session::SessionManager;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<Settings>>,
    pub agent: Arc<VoiceAgent>,
    pub ledger: LedgerStore,
    pub conversation: ConversationStore,
    pub sessions: Arc<SessionManager>,
    pub stt: Arc<dyn SpeechToText>,
    pub tts: Arc<dyn TextToSpeech>,
    pub metrics: PrometheusHandle,
    /// One token-bucket rate limiter per live WebSocket connection, keyed by
    /// session id; dropped when the connection's `Session` is removed.
    pub rate_limiters: Arc<DashMap<String, Mutex<RateLimiter>>>,
}

impl AppState {
    pub fn new(
        config: Arc<RwLock<Settings>>,
        agent: Arc<VoiceAgent>,
        ledger: LedgerStore,
        conversation: ConversationStore,
        stt: Arc<dyn SpeechToText>,
        tts: Arc<dyn TextToSpeech>,
        metrics: PrometheusHandle,
    ) -> Self {
        let max_connections = config.read().server.max_connections;
        Self {
            config,
            agent,
            ledger,
            conversation,
            sessions: Arc::new(SessionManager::new(max_connections)),
            stt,
            tts,
            metrics,
            rate_limiters: Arc::new(DashMap::new()),
        }
    }

    pub fn new_rate_limiter(&self) -> RateLimiter {
        let rate_limit = self.config.read().server.rate_limit.clone();
        RateLimiter::new(rate_limit)
    }
}
