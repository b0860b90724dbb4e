//! Typed ledger errors, matching the `CUSTOMER_NOT_FOUND` / `INSUFFICIENT_STOCK`
//! / ... machine-readable codes the dispatch boundary expects.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum LedgerError {
    #[error("customer not found")]
    CustomerNotFound,

    #[error("product not found")]
    ProductNotFound,

    #[error("invoice not found")]
    InvoiceNotFound,

    #[error("reminder not found")]
    ReminderNotFound,

    #[error("a customer with this name already exists")]
    Conflict,

    #[error("possible duplicate customer")]
    DuplicateFound { suggestions: Vec<String> },

    #[error("insufficient stock for {product_name}: requested {requested}, available {available}")]
    InsufficientStock { product_name: String, requested: i64, available: i64 },

    #[error("invoice already cancelled")]
    AlreadyCancelled,

    #[error("no invoice found for this customer")]
    NoInvoice,

    #[error("no reminder found")]
    NoReminder,

    #[error("storage error: {0}")]
    Storage(#[from] sqlx::Error),

    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("job queue error: {0}")]
    JobQueue(#[from] voice_agent_core::JobQueueError),

    #[error(transparent)]
    Validation(#[from] voice_agent_core::Error),
}

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Stable machine-readable code for the `{success:false, error:<code>}`
/// envelope requires at every local boundary.
impl LedgerError {
    #[must_use]
    pub fn code(&self) -> &'static str {
        match self {
            Self::CustomerNotFound => "CUSTOMER_NOT_FOUND",
            Self::ProductNotFound => "PRODUCT_NOT_FOUND",
            Self::InvoiceNotFound => "INVOICE_NOT_FOUND",
            Self::ReminderNotFound => "NO_REMINDER",
            Self::Conflict => "CONFLICT",
            Self::DuplicateFound { .. } => "DUPLICATE_FOUND",
            Self::InsufficientStock { .. } => "INSUFFICIENT_STOCK",
            Self::AlreadyCancelled => "ALREADY_CANCELLED",
            Self::NoInvoice => "NO_INVOICE",
            Self::NoReminder => "NO_REMINDER",
            Self::Storage(_) | Self::Migration(_) => "STORAGE_ERROR",
            Self::JobQueue(_) => "JOB_QUEUE_ERROR",
            Self::Validation(_) => "VALIDATION_ERROR",
        }
    }
}
