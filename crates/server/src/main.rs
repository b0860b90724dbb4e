//! Process entry point: loads settings, connects the Postgres ledger and
//! Redis conversation stores, wires the external collaborators, and serves
//! the HTTP + WebSocket router until Ctrl+C/SIGTERM.

use std::net::SocketAddr;
use std::sync::Arc;

use parking_lot::RwLock;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, Layer};

use voice_agent_agent::VoiceAgent;
use voice_agent_config::{load_settings, Settings, ShopDomainConfig};
use voice_agent_conversation::ConversationStore;
use voice_agent_core::ids::ShopId;
use voice_agent_core::traits::{JobQueue, Notifier, SpeechToText, TextToSpeech};
use voice_agent_ledger::LedgerStore;
use voice_agent_llm::{OpenAiConfig, OpenAiLanguageModel, RuleBasedLanguageModel};
use voice_agent_text::FuzzyMatcher;

use voice_agent_server::adapters::{HttpNotifier, HttpSpeechToText, HttpTextToSpeech, InMemoryJobQueue, LocalObjectStore};
use voice_agent_server::{create_router, init_metrics, AppState};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let env = std::env::var("VOICE_AGENT_ENV").ok();
    let config = match load_settings(env.as_deref()) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("warning: failed to load config ({e}), using defaults");
            Settings::default()
        }
    };

    init_tracing(&config);
    tracing::info!(version = env!("CARGO_PKG_VERSION"), environment = ?config.environment, "starting voice agent server");

    let shop_domain = ShopDomainConfig::load_or_default(&config.shop_config_path);
    tracing::info!(honorifics = shop_domain.honorifics.len(), nicknames = shop_domain.nicknames.len(), "loaded shop domain config");

    let metrics_handle = init_metrics();
    tracing::info!(port = config.observability.metrics_port, "initialized prometheus metrics");

    let ledger_pool = voice_agent_ledger::LedgerPool::connect(voice_agent_ledger::LedgerConfig {
        database_url: config.database.url.clone(),
        max_pool_size: config.database.max_pool_size,
    })
    .await?;
    ledger_pool.run_migrations().await?;

    let conversation_pool = voice_agent_conversation::ConversationPool::connect(config.conversation_store.clone()).await?;

    let fuzzy = Arc::new(FuzzyMatcher::new(shop_domain.honorifics.clone(), shop_domain.nicknames.clone()));
    let job_queue: Arc<dyn JobQueue> = Arc::new(InMemoryJobQueue::new());

    let ledger = LedgerStore::new(ledger_pool, job_queue, fuzzy.clone());
    let conversation = ConversationStore::new(conversation_pool, fuzzy);

    let notifier: Arc<dyn Notifier> = Arc::new(HttpNotifier::new(config.notifications.clone()));
    // Held by the binary for now; invoice PDF generation (not yet wired into
    // the dispatcher) will be the first caller.
    let _object_store = Arc::new(LocalObjectStore::new(&config.object_store));

    let classifier = build_language_model(&config);
    let responder = if config.llm.api_key.is_some() { Some(build_language_model(&config)) } else { None };

    let shop_id = ShopId(config.shop_name.clone());
    let agent = Arc::new(VoiceAgent::new(
        ledger.clone(),
        conversation.clone(),
        notifier,
        classifier,
        responder,
        shop_id,
        config.admin_email.clone(),
    ));

    let stt: Arc<dyn SpeechToText> = Arc::new(HttpSpeechToText::new(config.stt.clone()));
    let tts: Arc<dyn TextToSpeech> = Arc::new(HttpTextToSpeech::new(config.tts.clone()));

    let host = config.server.host.clone();
    let port = config.server.port;
    let shared_config = Arc::new(RwLock::new(config));

    let state = AppState::new(shared_config, agent, ledger, conversation, stt, tts, metrics_handle);
    state.sessions.start_cleanup_task();

    let app = create_router(state);

    let addr: SocketAddr = format!("{host}:{port}").parse()?;
    tracing::info!(%addr, "listening");
    let listener = tokio::net::TcpListener::bind(addr).await?;

    axum::serve(listener, app).with_graceful_shutdown(shutdown_signal()).await?;

    tracing::info!("server shutdown complete");
    Ok(())
}

/// Rule-based classification is the `offline`/test fallback; the moment an
/// LLM API key is configured, the real intent classifier takes over.
fn build_language_model(config: &Settings) -> Arc<dyn voice_agent_core::traits::LanguageModel> {
    if config.llm.api_key.is_some() {
        Arc::new(OpenAiLanguageModel::new(OpenAiConfig::from(&config.llm)))
    } else {
        tracing::warn!("no LLM api_key configured, falling back to the rule-based classifier");
        Arc::new(RuleBasedLanguageModel::new())
    }
}

async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c().await.expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("received SIGTERM, shutting down"),
    }
}

fn init_tracing(config: &Settings) {
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| format!("voice_agent={},tower_http=debug", config.observability.log_level).into());

    let subscriber = tracing_subscriber::registry().with(env_filter);
    let fmt_layer = if config.observability.log_json {
        tracing_subscriber::fmt::layer().json().boxed()
    } else {
        tracing_subscriber::fmt::layer().boxed()
    };
    subscriber.with(fmt_layer).init();
}
