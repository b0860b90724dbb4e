//! Typed agent errors. The dispatcher never lets a raw
//! storage or infra error reach the templater — everything collapses to a
//! machine-readable `code()` before it crosses that boundary.

use serde_json::Value;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error(transparent)]
    Ledger(#[from] voice_agent_ledger::LedgerError),

    #[error(transparent)]
    Conversation(#[from] voice_agent_conversation::ConversationError),

    #[error(transparent)]
    Domain(#[from] voice_agent_core::Error),

    #[error("missing required field: {0}")]
    MissingField(&'static str),

    /// Carries the ambiguous candidate set so the dispatcher can surface it
    /// as `data.customers` without re-deriving it.
    #[error("more than one customer matches")]
    MultipleCustomers(Value),

    #[error("no customer found for '{0}'")]
    CustomerNotFound(String),

    #[error("not authorised")]
    Unauthorized,

    #[error("deletion OTP has been sent, awaiting confirmation")]
    OtpSent,

    #[error("awaiting confirmation")]
    AwaitingConfirm,

    #[error("awaiting email address")]
    AwaitingEmail,

    #[error("the confirmation code did not match")]
    OtpMismatch,

    #[error("unrecognised intent")]
    UnknownIntent,

    #[error("notification failed: {0}")]
    Notifier(#[from] voice_agent_core::NotifierError),
}

pub type Result<T> = std::result::Result<T, AgentError>;

impl AgentError {
    /// Stable machine-readable code for the `{success:false, error:<code>}`
    /// envelope, including the "multi-step gating" codes that
    /// are returned with `success=false` by convention even though they
    /// are not failures (`OTP_SENT`, `AWAITING_EMAIL`, `AWAITING_CONFIRM`).
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::Ledger(e) => e.code(),
            Self::Conversation(e) => e.code(),
            Self::Domain(_) => "VALIDATION_ERROR",
            Self::MissingField(_) => "MISSING_FIELD",
            Self::MultipleCustomers(_) => "MULTIPLE_CUSTOMERS",
            Self::CustomerNotFound(_) => "CUSTOMER_NOT_FOUND",
            Self::Unauthorized => "UNAUTHORIZED",
            Self::OtpSent => "OTP_SENT",
            Self::AwaitingConfirm => "AWAITING_CONFIRM",
            Self::AwaitingEmail => "AWAITING_EMAIL",
            Self::OtpMismatch => "OTP_MISMATCH",
            Self::UnknownIntent => "UNKNOWN_INTENT",
            Self::Notifier(_) => "NOTIFIER_ERROR",
        }
    }

    /// Extra payload to merge into the `{success:false, ...}` envelope's
    /// `data` field — empty for ordinary failures, populated for the
    /// gating codes the UI inspects (`data.customers`, `data.query`).
    #[must_use]
    pub fn data(&self) -> Value {
        match self {
            Self::MultipleCustomers(v) => v.clone(),
            Self::CustomerNotFound(query) => serde_json::json!({ "query": query }),
            Self::Ledger(voice_agent_ledger::LedgerError::DuplicateFound { suggestions }) => {
                serde_json::json!({ "suggestions": suggestions })
            }
            Self::Ledger(voice_agent_ledger::LedgerError::InsufficientStock { product_name, requested, available }) => {
                serde_json::json!({ "productName": product_name, "requested": requested, "available": available })
            }
            _ => Value::Null,
        }
    }
}
