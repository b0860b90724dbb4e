//! WhatsApp/email notification seam

use async_trait::async_trait;
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NotifierError {
    #[error("send failed: {0}")]
    SendFailed(String),
    #[error("invalid recipient: {0}")]
    InvalidRecipient(String),
}

/// Sends invoice PDFs and reminder/admin notifications over email or
/// WhatsApp.
#[async_trait]
pub trait Notifier: Send + Sync + 'static {
    async fn send_email(&self, to: &str, subject: &str, body: &str, attachment: Option<(&str, Vec<u8>)>) -> Result<(), NotifierError>;

    async fn send_whatsapp(&self, to_phone: &str, body: &str, attachment: Option<(&str, Vec<u8>)>) -> Result<(), NotifierError>;
}
