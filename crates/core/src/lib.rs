//! Core domain types and traits for the voice shop agent
//!
//! This crate provides foundational types used across all other crates:
//! - Domain entities (Customer, Product, Invoice, LedgerEntry, Payment, Reminder)
//! - The `Money` decimal type used everywhere currency appears
//! - Traits for external collaborators (STT, TTS, LLM classifier, job queue,
//!   object store, WhatsApp/email notifier) — this crate never talks to a real
//!   vendor, it only defines the seam
//! - Error types

pub mod customer;
pub mod error;
pub mod ids;
pub mod invoice;
pub mod ledger_entry;
pub mod money;
pub mod payment;
pub mod product;
pub mod reminder;
pub mod traits;

pub use customer::Customer;
pub use error::{Error, Result};
pub use ids::{CustomerId, InvoiceId, PaymentId, ProductId, ReminderId, ShopId};
pub use invoice::{Invoice, InvoiceItem, InvoiceStatus, SupplyType};
pub use ledger_entry::{LedgerEntry, LedgerEntryType};
pub use money::Money;
pub use payment::{Payment, PaymentMethod, PaymentStatus};
pub use product::Product;
pub use reminder::{Reminder, ReminderStatus};

pub use traits::{
    ClassifiedIntent, JobQueue, JobQueueError, LanguageModel, Notifier, NotifierError,
    ObjectStore, ObjectStoreError, SpeechToText, TextToSpeech, Transcript,
};
