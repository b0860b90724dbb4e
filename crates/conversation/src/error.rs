use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConversationError {
    #[error("redis error: {0}")]
    Redis(#[from] redis::RedisError),

    #[error("stored session state is corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

impl ConversationError {
    /// Machine-readable code, mirroring `LedgerError::code`.
    pub fn code(&self) -> &'static str {
        match self {
            ConversationError::Redis(_) => "CONVERSATION_STORE_UNAVAILABLE",
            ConversationError::Corrupt(_) => "CONVERSATION_STATE_CORRUPT",
        }
    }
}

impl From<ConversationError> for voice_agent_core::Error {
    fn from(err: ConversationError) -> Self {
        voice_agent_core::Error::External(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, ConversationError>;
