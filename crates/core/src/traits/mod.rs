//! Traits for external collaborators
//!
//! The STT, TTS, LLM, job-queue, object-store, and WhatsApp/email provider
//! are all "out of scope" vendor integrations: this crate only defines the
//! interface each is expected to satisfy, never a concrete client.

mod job_queue;
mod language_model;
mod notifier;
mod object_store;
mod speech;

pub use job_queue::{JobQueue, JobQueueError};
pub use language_model::{ClassifiedIntent, LanguageModel};
pub use notifier::{Notifier, NotifierError};
pub use object_store::{ObjectStore, ObjectStoreError};
pub use speech::{SpeechToText, TextToSpeech, Transcript};
