//! Speech-to-text and text-to-speech seams
//!
//! Implementations live outside this crate and call out to Deepgram,
//! ElevenLabs, or OpenAI. This crate knows only the shape of the conversation.

use async_trait::async_trait;

/// A finished or partial transcript from the STT provider.
#[derive(Debug, Clone)]
pub struct Transcript {
    pub text: String,
    pub is_final: bool,
    pub confidence: f32,
}

/// Streaming speech-to-text.
#[async_trait]
pub trait SpeechToText: Send + Sync + 'static {
    /// Feed one chunk of PCM/opus audio, returning a partial or final transcript.
    async fn transcribe_chunk(&self, audio: &[u8]) -> crate::Result<Transcript>;

    /// Name of the backing provider, for logging and the configured
    /// `STT_PROVIDER` selection.
    fn provider_name(&self) -> &str;
}

/// Text-to-speech.
#[async_trait]
pub trait TextToSpeech: Send + Sync + 'static {
    /// Synthesize a Hinglish response string into audio bytes.
    async fn synthesize(&self, text: &str) -> crate::Result<Vec<u8>>;

    fn provider_name(&self) -> &str;
}
