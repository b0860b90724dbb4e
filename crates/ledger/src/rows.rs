//! Raw `sqlx` row shapes and their conversion into `voice-agent-core` domain
//! types. Kept separate from the domain types themselves: `Money`, the id
//! newtypes, and the status enums don't derive `sqlx::FromRow` directly, so
//! every query decodes into one of these first.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::FromRow;
use uuid::Uuid;
use voice_agent_core::customer::Customer;
use voice_agent_core::ids::{CustomerId, InvoiceId, PaymentId, ProductId, ReminderId};
use voice_agent_core::invoice::{Invoice, InvoiceItem, InvoiceStatus};
use voice_agent_core::ledger_entry::{LedgerEntry, LedgerEntryType};
use voice_agent_core::money::Money;
use voice_agent_core::payment::{Payment, PaymentMethod, PaymentStatus};
use voice_agent_core::product::Product;
use voice_agent_core::reminder::{Reminder, ReminderStatus};

#[derive(FromRow)]
pub(crate) struct CustomerRow {
    pub id: Uuid,
    pub name: String,
    pub phone: Option<String>,
    pub nickname: Option<String>,
    pub landmark: Option<String>,
    pub email: Option<String>,
    pub balance: Decimal,
    pub total_purchases: Decimal,
    pub visit_count: i64,
    pub last_visit: Option<DateTime<Utc>>,
    pub is_active: bool,
}

impl From<CustomerRow> for Customer {
    fn from(r: CustomerRow) -> Self {
        Customer {
            id: CustomerId::from_uuid(r.id),
            name: r.name,
            phone: r.phone,
            nickname: r.nickname,
            landmark: r.landmark,
            email: r.email,
            balance: Money::from_decimal(r.balance),
            total_purchases: Money::from_decimal(r.total_purchases),
            visit_count: r.visit_count,
            last_visit: r.last_visit,
            is_active: r.is_active,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub unit: String,
    pub price: Decimal,
    pub stock: i64,
    pub hsn_code: Option<String>,
    pub gst_rate: Decimal,
    pub cess_rate: Decimal,
    pub is_gst_exempt: bool,
    pub is_active: bool,
    pub auto_created: bool,
}

impl From<ProductRow> for Product {
    fn from(r: ProductRow) -> Self {
        Product {
            id: ProductId::from_uuid(r.id),
            name: r.name,
            unit: r.unit,
            price: Money::from_decimal(r.price),
            stock: r.stock,
            hsn_code: r.hsn_code,
            gst_rate: r.gst_rate,
            cess_rate: r.cess_rate,
            is_gst_exempt: r.is_gst_exempt,
            is_active: r.is_active,
            auto_created: r.auto_created,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct InvoiceRow {
    pub id: Uuid,
    pub invoice_no: Option<String>,
    pub customer_id: Uuid,
    pub date: DateTime<Utc>,
    pub subtotal: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
    pub cess: Decimal,
    pub total: Decimal,
    pub status: String,
    pub notes: Option<String>,
    pub pdf_object_key: Option<String>,
    pub pdf_url: Option<String>,
}

impl From<InvoiceRow> for Invoice {
    fn from(r: InvoiceRow) -> Self {
        Invoice {
            id: InvoiceId::from_uuid(r.id),
            invoice_no: r.invoice_no,
            customer_id: CustomerId::from_uuid(r.customer_id),
            date: r.date,
            subtotal: Money::from_decimal(r.subtotal),
            cgst: Money::from_decimal(r.cgst),
            sgst: Money::from_decimal(r.sgst),
            igst: Money::from_decimal(r.igst),
            cess: Money::from_decimal(r.cess),
            total: Money::from_decimal(r.total),
            status: parse_invoice_status(&r.status),
            notes: r.notes,
            pdf_object_key: r.pdf_object_key,
            pdf_url: r.pdf_url,
        }
    }
}

pub(crate) fn invoice_status_str(status: InvoiceStatus) -> &'static str {
    match status {
        InvoiceStatus::Pending => "pending",
        InvoiceStatus::Paid => "paid",
        InvoiceStatus::Cancelled => "cancelled",
    }
}

fn parse_invoice_status(s: &str) -> InvoiceStatus {
    match s {
        "paid" => InvoiceStatus::Paid,
        "cancelled" => InvoiceStatus::Cancelled,
        _ => InvoiceStatus::Pending,
    }
}

#[derive(FromRow)]
pub(crate) struct InvoiceItemRow {
    pub invoice_id: Uuid,
    pub product_id: Option<Uuid>,
    pub product_name: String,
    pub unit: String,
    pub hsn_code: Option<String>,
    pub quantity: Decimal,
    pub unit_price: Decimal,
    pub gst_rate: Decimal,
    pub cgst: Decimal,
    pub sgst: Decimal,
    pub igst: Decimal,
    pub cess: Decimal,
    pub subtotal: Decimal,
    pub total: Decimal,
}

impl From<InvoiceItemRow> for InvoiceItem {
    fn from(r: InvoiceItemRow) -> Self {
        InvoiceItem {
            invoice_id: InvoiceId::from_uuid(r.invoice_id),
            product_id: r.product_id.map(ProductId::from_uuid),
            product_name: r.product_name,
            unit: r.unit,
            hsn_code: r.hsn_code,
            quantity: r.quantity,
            unit_price: Money::from_decimal(r.unit_price),
            gst_rate: r.gst_rate,
            cgst: Money::from_decimal(r.cgst),
            sgst: Money::from_decimal(r.sgst),
            igst: Money::from_decimal(r.igst),
            cess: Money::from_decimal(r.cess),
            subtotal: Money::from_decimal(r.subtotal),
            total: Money::from_decimal(r.total),
        }
    }
}

#[derive(FromRow)]
pub(crate) struct LedgerEntryRow {
    pub customer_id: Uuid,
    pub entry_type: String,
    pub amount: Decimal,
    pub description: String,
    pub reference: Option<String>,
    pub payment_mode: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl From<LedgerEntryRow> for LedgerEntry {
    fn from(r: LedgerEntryRow) -> Self {
        LedgerEntry {
            customer_id: CustomerId::from_uuid(r.customer_id),
            entry_type: parse_ledger_entry_type(&r.entry_type),
            amount: Money::from_decimal(r.amount),
            description: r.description,
            reference: r.reference,
            payment_mode: r.payment_mode.as_deref().map(parse_payment_method),
            created_at: r.created_at,
        }
    }
}

pub(crate) fn ledger_entry_type_str(t: LedgerEntryType) -> &'static str {
    match t {
        LedgerEntryType::Debit => "debit",
        LedgerEntryType::Credit => "credit",
        LedgerEntryType::OpeningBalance => "opening_balance",
    }
}

fn parse_ledger_entry_type(s: &str) -> LedgerEntryType {
    match s {
        "credit" => LedgerEntryType::Credit,
        "opening_balance" => LedgerEntryType::OpeningBalance,
        _ => LedgerEntryType::Debit,
    }
}

pub(crate) fn payment_method_str(m: PaymentMethod) -> &'static str {
    match m {
        PaymentMethod::Cash => "cash",
        PaymentMethod::Upi => "upi",
        PaymentMethod::Card => "card",
        PaymentMethod::Other => "other",
    }
}

fn parse_payment_method(s: &str) -> PaymentMethod {
    match s {
        "upi" => PaymentMethod::Upi,
        "card" => PaymentMethod::Card,
        "other" => PaymentMethod::Other,
        _ => PaymentMethod::Cash,
    }
}

#[derive(FromRow)]
pub(crate) struct PaymentRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub amount: Decimal,
    pub method: String,
    pub status: String,
    pub received_at: DateTime<Utc>,
}

impl From<PaymentRow> for Payment {
    fn from(r: PaymentRow) -> Self {
        Payment {
            id: PaymentId::from_uuid(r.id),
            customer_id: CustomerId::from_uuid(r.customer_id),
            amount: Money::from_decimal(r.amount),
            method: parse_payment_method(&r.method),
            status: if r.status == "reversed" { PaymentStatus::Reversed } else { PaymentStatus::Recorded },
            received_at: r.received_at,
        }
    }
}

#[derive(FromRow)]
pub(crate) struct ReminderRow {
    pub id: Uuid,
    pub customer_id: Uuid,
    pub scheduled_time: DateTime<Utc>,
    pub status: String,
    pub notes: String,
    pub external_job_id: Option<String>,
}

impl From<ReminderRow> for Reminder {
    fn from(r: ReminderRow) -> Self {
        Reminder {
            id: ReminderId::from_uuid(r.id),
            customer_id: CustomerId::from_uuid(r.customer_id),
            scheduled_time: r.scheduled_time,
            status: parse_reminder_status(&r.status),
            notes: r.notes,
            external_job_id: r.external_job_id,
        }
    }
}

pub(crate) fn reminder_status_str(s: ReminderStatus) -> &'static str {
    match s {
        ReminderStatus::Scheduled => "scheduled",
        ReminderStatus::Sent => "sent",
        ReminderStatus::Cancelled => "cancelled",
        ReminderStatus::Failed => "failed",
    }
}

fn parse_reminder_status(s: &str) -> ReminderStatus {
    match s {
        "sent" => ReminderStatus::Sent,
        "cancelled" => ReminderStatus::Cancelled,
        "failed" => ReminderStatus::Failed,
        _ => ReminderStatus::Scheduled,
    }
}
