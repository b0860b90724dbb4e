//! Configuration for the voice shop agent
//!
//! Supports loading from `config/{default,<env>}.yaml` overlaid with
//! `VOICE_AGENT__`-prefixed environment variables, plus a separate
//! shop-editable domain data overlay (honorifics, nicknames, GST defaults)
//! under `domain`.

pub mod domain;
mod error;
pub mod settings;

pub use domain::ShopDomainConfig;
pub use error::ConfigError;
pub use settings::{
    load_settings, ConversationStoreConfig, DatabaseConfig, LlmConfig, NotificationConfig,
    ObjectStoreConfig, ObservabilityConfig, RateLimitConfig, RuntimeEnvironment, ServerConfig,
    Settings, SttConfig, SttProvider, TtsConfig, TtsProvider,
};
