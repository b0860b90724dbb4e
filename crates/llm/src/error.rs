use thiserror::Error;

#[derive(Error, Debug)]
pub enum LlmError {
    #[error("llm api error: {0}")]
    Api(String),

    #[error("llm network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("llm returned unparseable response: {0}")]
    InvalidResponse(String),

    #[error("llm request timed out")]
    Timeout,
}

impl From<LlmError> for voice_agent_core::Error {
    fn from(err: LlmError) -> Self {
        voice_agent_core::Error::External(err.to_string())
    }
}
