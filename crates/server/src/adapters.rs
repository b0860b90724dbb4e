//! Concrete implementations of the external-collaborator traits
//! (`voice_agent_core::traits`) that the binary wires into `AppState`.
//!
//! None of these talk to a real vendor SDK end to end — each is a thin
//! HTTP (or filesystem, or in-memory) client behind the trait seam, the
//! same shape as `voice_agent_llm::openai::OpenAiLanguageModel`. A shop
//! that needs a different STT/TTS/object-store vendor swaps the adapter,
//! not the rest of the system.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dashmap::DashMap;
use std::path::PathBuf;
use std::time::Duration;
use uuid::Uuid;
use voice_agent_config::{NotificationConfig, ObjectStoreConfig, SttConfig, SttProvider, TtsConfig, TtsProvider};
use voice_agent_core::traits::{
    JobQueue, JobQueueError, Notifier, NotifierError, ObjectStoreError, SpeechToText, TextToSpeech, Transcript,
};

/// In-memory stand-in for the real scheduled-reminder worker. Good enough to
/// exercise `CREATE_REMINDER`/`CANCEL_REMINDER` end to end in this binary;
/// a production deployment points `JobQueue` at an actual worker instead.
pub struct InMemoryJobQueue {
    jobs: DashMap<String, (String, String, DateTime<Utc>)>,
}

impl InMemoryJobQueue {
    pub fn new() -> Self {
        Self { jobs: DashMap::new() }
    }
}

impl Default for InMemoryJobQueue {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl JobQueue for InMemoryJobQueue {
    async fn enqueue(&self, job_name: &str, payload: &str, run_at: DateTime<Utc>) -> Result<String, JobQueueError> {
        let id = Uuid::new_v4().to_string();
        self.jobs.insert(id.clone(), (job_name.to_string(), payload.to_string(), run_at));
        tracing::debug!(job_id = %id, job_name, %run_at, "enqueued job");
        Ok(id)
    }

    async fn cancel(&self, job_id: &str) -> Result<(), JobQueueError> {
        self.jobs.remove(job_id);
        Ok(())
    }
}

/// Sends email over SMTP (`lettre`) and WhatsApp over the Cloud API
/// (`reqwest`) `SEND_INVOICE`/`PROVIDE_EMAIL`/the
/// `DELETE_CUSTOMER_DATA` OTP mail/the daily-summary mail.
pub struct HttpNotifier {
    config: NotificationConfig,
    http: reqwest::Client,
}

impl HttpNotifier {
    pub fn new(config: NotificationConfig) -> Self {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(20))
            .build()
            .expect("reqwest client build");
        Self { config, http }
    }

    fn smtp_transport(&self) -> Result<lettre::AsyncSmtpTransport<lettre::Tokio1Executor>, NotifierError> {
        let host = self
            .config
            .smtp_host
            .as_deref()
            .ok_or_else(|| NotifierError::SendFailed("no smtp_host configured".into()))?;

        let mut builder = lettre::AsyncSmtpTransport::<lettre::Tokio1Executor>::relay(host)
            .map_err(|e| NotifierError::SendFailed(format!("smtp relay: {e}")))?;

        if let (Some(user), Some(pass)) = (&self.config.smtp_username, &self.config.smtp_password) {
            let creds = lettre::transport::smtp::authentication::Credentials::new(user.clone(), pass.clone());
            builder = builder.credentials(creds);
        }

        Ok(builder.build())
    }
}

#[async_trait]
impl Notifier for HttpNotifier {
    async fn send_email(&self, to: &str, subject: &str, body: &str, attachment: Option<(&str, Vec<u8>)>) -> Result<(), NotifierError> {
        use lettre::message::{header::ContentType, Attachment, MultiPart, SinglePart};
        use lettre::{AsyncTransport, Message};

        let from = self.config.smtp_username.as_deref().unwrap_or("no-reply@shop.local");
        let to_mailbox = to.parse().map_err(|_| NotifierError::InvalidRecipient(to.to_string()))?;
        let from_mailbox = from.parse().map_err(|_| NotifierError::SendFailed("invalid from address".into()))?;

        let body_part = SinglePart::builder().header(ContentType::TEXT_PLAIN).body(body.to_string());
        let multipart = match attachment {
            Some((filename, bytes)) => MultiPart::mixed().singlepart(body_part).singlepart(
                Attachment::new(filename.to_string()).body(bytes, ContentType::parse("application/pdf").expect("valid mime type")),
            ),
            None => MultiPart::mixed().singlepart(body_part),
        };

        let message = Message::builder()
            .from(from_mailbox)
            .to(to_mailbox)
            .subject(subject)
            .multipart(multipart)
            .map_err(|e| NotifierError::SendFailed(format!("build message: {e}")))?;

        let transport = self.smtp_transport()?;
        transport.send(message).await.map_err(|e| NotifierError::SendFailed(format!("smtp send: {e}")))?;
        Ok(())
    }

    async fn send_whatsapp(&self, to_phone: &str, body: &str, attachment: Option<(&str, Vec<u8>)>) -> Result<(), NotifierError> {
        let (phone_number_id, token) = match (&self.config.whatsapp_phone_number_id, &self.config.whatsapp_access_token) {
            (Some(id), Some(tok)) => (id, tok),
            _ => return Err(NotifierError::SendFailed("WhatsApp credentials not configured".into())),
        };

        if attachment.is_some() {
            tracing::warn!("WhatsApp attachment upload not wired; sending text body only");
        }

        let url = format!("https://graph.facebook.com/v19.0/{phone_number_id}/messages");
        let payload = serde_json::json!({
            "messaging_product": "whatsapp",
            "to": to_phone,
            "type": "text",
            "text": { "body": body },
        });

        let resp = self
            .http
            .post(url)
            .bearer_auth(token)
            .json(&payload)
            .send()
            .await
            .map_err(|e| NotifierError::SendFailed(format!("whatsapp request: {e}")))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(NotifierError::SendFailed(format!("whatsapp api {status}: {text}")));
        }

        Ok(())
    }
}

/// Stores invoice PDFs on local disk under `config.bucket` (defaulting to
/// `./data/objects`). `public_url` returns a `file://` path rather than a
/// presigned URL — swap this adapter for an S3-compatible one to get real
/// presigned URLs without touching any caller.
pub struct LocalObjectStore {
    root: PathBuf,
}

impl LocalObjectStore {
    pub fn new(config: &ObjectStoreConfig) -> Self {
        let root = config.bucket.clone().unwrap_or_else(|| "./data/objects".to_string());
        Self { root: PathBuf::from(root) }
    }
}

#[async_trait]
impl voice_agent_core::traits::ObjectStore for LocalObjectStore {
    async fn put(&self, key: &str, bytes: Vec<u8>, _content_type: &str) -> Result<(), ObjectStoreError> {
        let path = self.root.join(key);
        if let Some(parent) = path.parent() {
            tokio::fs::create_dir_all(parent).await.map_err(|e| ObjectStoreError::UploadFailed(e.to_string()))?;
        }
        tokio::fs::write(&path, bytes).await.map_err(|e| ObjectStoreError::UploadFailed(e.to_string()))
    }

    async fn public_url(&self, key: &str) -> Result<String, ObjectStoreError> {
        Ok(format!("file://{}", self.root.join(key).display()))
    }
}

/// Thin HTTP client over the configured STT vendor. Deepgram and
/// ElevenLabs both expose a simple "POST raw audio bytes, get back a JSON
/// transcript" endpoint for short utterances; this adapter assumes that
/// shape and is swappable per `SttProvider`.
pub struct HttpSpeechToText {
    http: reqwest::Client,
    config: SttConfig,
}

impl HttpSpeechToText {
    pub fn new(config: SttConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }

    fn endpoint(&self) -> &'static str {
        match self.config.provider {
            SttProvider::Deepgram => "https://api.deepgram.com/v1/listen",
            SttProvider::Elevenlabs => "https://api.elevenlabs.io/v1/speech-to-text",
        }
    }
}

#[async_trait]
impl SpeechToText for HttpSpeechToText {
    async fn transcribe_chunk(&self, audio: &[u8]) -> voice_agent_core::Result<Transcript> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| voice_agent_core::Error::External("no STT api_key configured".into()))?;

        let resp = self
            .http
            .post(self.endpoint())
            .header("Authorization", format!("Token {api_key}"))
            .header("Content-Type", "audio/wav")
            .body(audio.to_vec())
            .send()
            .await
            .map_err(|e| voice_agent_core::Error::External(format!("stt request: {e}")))?;

        if !resp.status().is_success() {
            return Err(voice_agent_core::Error::External(format!("stt api returned {}", resp.status())));
        }

        let body: serde_json::Value = resp.json().await.map_err(|e| voice_agent_core::Error::External(format!("stt response: {e}")))?;
        let text = body
            .pointer("/results/channels/0/alternatives/0/transcript")
            .or_else(|| body.get("text"))
            .and_then(serde_json::Value::as_str)
            .unwrap_or_default()
            .to_string();

        Ok(Transcript { text, is_final: true, confidence: 1.0 })
    }

    fn provider_name(&self) -> &str {
        match self.config.provider {
            SttProvider::Deepgram => "deepgram",
            SttProvider::Elevenlabs => "elevenlabs",
        }
    }
}

/// Thin HTTP client over the configured TTS vendor, returning raw audio
/// bytes.
pub struct HttpTextToSpeech {
    http: reqwest::Client,
    config: TtsConfig,
}

impl HttpTextToSpeech {
    pub fn new(config: TtsConfig) -> Self {
        Self { http: reqwest::Client::new(), config }
    }

    fn endpoint(&self) -> &'static str {
        match self.config.provider {
            TtsProvider::Elevenlabs => "https://api.elevenlabs.io/v1/text-to-speech/default",
            TtsProvider::Openai => "https://api.openai.com/v1/audio/speech",
        }
    }
}

#[async_trait]
impl TextToSpeech for HttpTextToSpeech {
    async fn synthesize(&self, text: &str) -> voice_agent_core::Result<Vec<u8>> {
        let api_key = self
            .config
            .api_key
            .as_deref()
            .ok_or_else(|| voice_agent_core::Error::External("no TTS api_key configured".into()))?;

        let body = match self.config.provider {
            TtsProvider::Elevenlabs => serde_json::json!({ "text": text }),
            TtsProvider::Openai => serde_json::json!({ "model": "tts-1", "voice": "alloy", "input": text }),
        };

        let resp = self
            .http
            .post(self.endpoint())
            .bearer_auth(api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| voice_agent_core::Error::External(format!("tts request: {e}")))?;

        if !resp.status().is_success() {
            return Err(voice_agent_core::Error::External(format!("tts api returned {}", resp.status())));
        }

        resp.bytes().await.map(|b| b.to_vec()).map_err(|e| voice_agent_core::Error::External(format!("tts response: {e}")))
    }

    fn provider_name(&self) -> &str {
        match self.config.provider {
            TtsProvider::Elevenlabs => "elevenlabs",
            TtsProvider::Openai => "openai",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn in_memory_job_queue_enqueue_then_cancel() {
        let queue = InMemoryJobQueue::new();
        let id = queue.enqueue("reminder", "{}", Utc::now()).await.unwrap();
        assert!(!id.is_empty());
        queue.cancel(&id).await.unwrap();
        queue.cancel(&id).await.unwrap();
    }

    #[tokio::test]
    async fn local_object_store_round_trips_a_key() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalObjectStore::new(&ObjectStoreConfig {
            bucket: Some(dir.path().to_string_lossy().to_string()),
            ..Default::default()
        });
        store.put("invoices/2026-27/INV-0001.pdf", vec![1, 2, 3], "application/pdf").await.unwrap();
        let url = voice_agent_core::traits::ObjectStore::public_url(&store, "invoices/2026-27/INV-0001.pdf").await.unwrap();
        assert!(url.starts_with("file://"));
    }
}
