//! Intent Dispatcher: one `dispatch()` entry point, one
//! private handler function per intent. Nothing below `dispatch()` ever
//! panics or lets a raw storage/infra error escape — every handler returns
//! `crate::error::Result<Value>` and `dispatch()` collapses the error into
//! the `{success, data, error}` envelope before it reaches the templater.

use crate::entities;
use crate::error::{AgentError, Result};
use crate::resolver::CustomerResolver;
use chrono::Utc;
use serde::Serialize;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use voice_agent_core::customer::Customer;
use voice_agent_core::ids::ShopId;
use voice_agent_core::invoice::SupplyType;
use voice_agent_core::traits::{ClassifiedIntent, Notifier};
use voice_agent_conversation::{ConversationStore, InvoiceDraft, PendingDeleteOtp, PendingEmail, PendingSendConfirm};
use voice_agent_ledger::{LedgerError, LedgerStore};

/// The dependency-injected handle bundle every executor needs. One instance lives for
/// the whole shop process; `session_id` is threaded through per call
/// instead, since it varies per connection.
#[derive(Clone)]
pub struct DispatchContext {
    pub ledger: LedgerStore,
    pub conversation: ConversationStore,
    pub resolver: Arc<CustomerResolver>,
    pub notifier: Arc<dyn Notifier>,
    pub shop_id: ShopId,
    /// Recipient of deletion-OTP and daily-summary emails.
    pub admin_email: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct DispatchOutcome {
    pub success: bool,
    pub data: Value,
    pub error: Option<&'static str>,
}

impl DispatchOutcome {
    fn ok(data: Value) -> Self {
        Self { success: true, data, error: None }
    }

    fn from_error(e: AgentError) -> Self {
        Self { success: false, data: e.data(), error: Some(e.code()) }
    }
}

/// Routes one classified intent to its handler. Every handler's `Err` is
/// caught here, never propagated — the dispatcher never lets a raw storage
/// error reach the client.
pub async fn dispatch(
    ctx: &DispatchContext,
    session_id: &str,
    intent: &ClassifiedIntent,
    operator_role: Option<&str>,
) -> DispatchOutcome {
    tracing::info!(
        intent = %intent.intent,
        shop_id = %ctx.shop_id,
        conversation_id = %session_id,
        "dispatching intent"
    );

    let result = dispatch_inner(ctx, session_id, intent, operator_role).await;
    match result {
        Ok(data) => DispatchOutcome::ok(data),
        Err(e) => {
            tracing::warn!(intent = %intent.intent, code = e.code(), error = %e, "intent dispatch failed");
            DispatchOutcome::from_error(e)
        }
    }
}

/// Checks whether a raw transcript resolves a shop-level pending
/// send-confirmation ("haan/nahi") before the turn ever reaches the LLM
/// classifier — mirrors the routing hint `formatContextPrompt` embeds for
/// the same state.
pub async fn check_pending_send_confirmation(ctx: &DispatchContext, transcript: &str) -> Result<Option<Value>> {
    let Some(pending) = ctx.conversation.get_pending_send_conf(&ctx.shop_id).await? else {
        return Ok(None);
    };

    if entities::is_affirmative(transcript) {
        let invoice_items = ctx.ledger.get_invoice_items(voice_agent_core::ids::InvoiceId::from_uuid(pending.invoice_id)).await?;
        let body = render_invoice_body(&invoice_items);
        match pending.channel.as_str() {
            "whatsapp" => ctx.notifier.send_whatsapp(&pending.contact, &body, None).await?,
            _ => ctx.notifier.send_email(&pending.contact, "Your invoice", &body, None).await?,
        }
        ctx.conversation.clear_pending_send_conf(&ctx.shop_id).await?;
        Ok(Some(json!({ "sent": true, "channel": pending.channel, "contact": pending.contact })))
    } else if entities::is_negative(transcript) {
        ctx.conversation.clear_pending_send_conf(&ctx.shop_id).await?;
        Ok(Some(json!({ "cancelled": true })))
    } else {
        Ok(None)
    }
}

fn render_invoice_body(items: &[voice_agent_core::invoice::InvoiceItem]) -> String {
    items
        .iter()
        .map(|i| format!("{} x{} = {}", i.product_name, i.quantity, i.total))
        .collect::<Vec<_>>()
        .join("\n")
}

async fn dispatch_inner(
    ctx: &DispatchContext,
    session_id: &str,
    intent: &ClassifiedIntent,
    operator_role: Option<&str>,
) -> Result<Value> {
    let entities = &intent.entities;
    match intent.intent.as_str() {
        "TOTAL_PENDING_AMOUNT" => total_pending_amount(ctx).await,
        "LIST_CUSTOMER_BALANCES" => list_customer_balances(ctx).await,
        "CHECK_BALANCE" => check_balance(ctx, session_id, entities).await,
        "CREATE_INVOICE" => create_invoice(ctx, session_id, entities).await,
        "CONFIRM_INVOICE" => confirm_invoice(ctx, session_id, entities).await,
        "SHOW_PENDING_INVOICE" => show_pending_invoice(ctx, session_id, entities).await,
        "TOGGLE_GST" => toggle_gst(ctx, session_id, entities).await,
        "PROVIDE_EMAIL" => provide_email(ctx, session_id, entities).await,
        "SEND_INVOICE" => send_invoice(ctx, session_id, entities).await,
        "CREATE_REMINDER" => create_reminder(ctx, session_id, entities).await,
        "RECORD_PAYMENT" => record_payment(ctx, session_id, entities).await,
        "ADD_CREDIT" => add_credit(ctx, session_id, entities).await,
        "CHECK_STOCK" => check_stock(ctx, entities).await,
        "CANCEL_INVOICE" => cancel_invoice(ctx, session_id, entities).await,
        "CANCEL_REMINDER" => cancel_reminder(ctx, session_id, entities).await,
        "LIST_REMINDERS" => list_reminders(ctx).await,
        "CREATE_CUSTOMER" => create_customer(ctx, session_id, entities).await,
        "MODIFY_REMINDER" => modify_reminder(ctx, session_id, entities).await,
        "DAILY_SUMMARY" => daily_summary(ctx).await,
        "UPDATE_CUSTOMER" | "UPDATE_CUSTOMER_PHONE" => update_customer(ctx, session_id, entities).await,
        "GET_CUSTOMER_INFO" => get_customer_info(ctx, session_id, entities).await,
        "DELETE_CUSTOMER_DATA" => delete_customer_data(ctx, session_id, entities, operator_role).await,
        "SWITCH_LANGUAGE" => switch_language(ctx, session_id, entities).await,
        "START_RECORDING" => set_recording(ctx, session_id, true).await,
        "STOP_RECORDING" => set_recording(ctx, session_id, false).await,
        _ => Err(AgentError::UnknownIntent),
    }
}

async fn resolve_customer(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Customer> {
    let outcome = ctx.resolver.resolve(&ctx.shop_id, session_id, entities).await?;
    crate::resolver::require_resolved(outcome)
}

async fn total_pending_amount(ctx: &DispatchContext) -> Result<Value> {
    let total = ctx.ledger.get_total_pending_amount(&ctx.shop_id).await?;
    Ok(json!({ "total": total }))
}

async fn list_customer_balances(ctx: &DispatchContext) -> Result<Value> {
    let customers = ctx.ledger.get_all_customers_with_pending_balance(&ctx.shop_id).await?;
    let total = customers.iter().fold(voice_agent_core::money::Money::ZERO, |acc, c| acc + c.balance);
    let list: Vec<Value> = customers.iter().map(|c| json!({ "name": c.name, "balance": c.balance })).collect();
    Ok(json!({ "list": list, "total": total }))
}

async fn check_balance(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let customer = resolve_customer(ctx, session_id, entities).await?;
    let balance = ctx.ledger.get_balance_fast(customer.id).await?;
    ctx.conversation.update_customer_context(session_id, &customer.name, Some(balance), None, Some("CHECK_BALANCE")).await?;
    Ok(json!({ "name": customer.name, "balance": balance }))
}

async fn create_invoice(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let customer = resolve_customer(ctx, session_id, entities).await?;
    let items = entities::items_entity(entities);
    if items.is_empty() {
        return Err(AgentError::MissingField("items"));
    }
    let with_gst = entities::bool_entity(entities, "withGst").unwrap_or(true);

    let preview = ctx.ledger.preview_invoice(&ctx.shop_id, customer.id, &items, with_gst, SupplyType::IntraState).await?;

    let draft = InvoiceDraft {
        draft_id: voice_agent_conversation::DraftId::new(),
        customer_id: customer.id,
        customer_name: customer.name.clone(),
        customer_email: customer.email.clone(),
        resolved_items: preview.resolved_items.clone(),
        input_items: items,
        subtotal: preview.subtotal,
        grand_total: preview.grand_total,
        with_gst: preview.with_gst,
        auto_created_products: preview.auto_created_products.clone(),
        created_at: Utc::now(),
    };
    ctx.conversation.add_draft(&ctx.shop_id, draft).await?;

    Ok(json!({
        "customer": customer.name,
        "resolvedItems": preview.resolved_items,
        "subtotal": preview.subtotal,
        "cgst": preview.cgst,
        "sgst": preview.sgst,
        "igst": preview.igst,
        "cess": preview.cess,
        "grandTotal": preview.grand_total,
        "withGst": preview.with_gst,
        "autoCreatedProducts": preview.auto_created_products,
        "awaitingConfirm": true,
    }))
}

/// Finds the one draft to act on for `CONFIRM_INVOICE`/`TOGGLE_GST`/
/// `SHOW_PENDING_INVOICE`: the active customer's draft when unambiguous,
/// disambiguated by a named customer when several drafts exist.
async fn find_target_draft(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<InvoiceDraft> {
    let drafts = ctx.conversation.list_drafts(&ctx.shop_id).await?;
    if drafts.is_empty() {
        return Err(LedgerError::NoInvoice.into());
    }
    if drafts.len() == 1 {
        return Ok(drafts.into_iter().next().unwrap());
    }

    if let Some(name) = entities::customer_name(entities) {
        let lower = name.to_lowercase();
        if let Some(d) = drafts.iter().find(|d| d.customer_name.to_lowercase() == lower) {
            return Ok(d.clone());
        }
    }

    if let Ok(customer) = resolve_customer(ctx, session_id, entities).await {
        if let Some(d) = drafts.iter().find(|d| d.customer_id == customer.id) {
            return Ok(d.clone());
        }
    }

    let names: Vec<Value> = drafts.iter().map(|d| json!({ "name": d.customer_name })).collect();
    Err(AgentError::MultipleCustomers(json!({ "customers": names })))
}

async fn confirm_invoice(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let draft = find_target_draft(ctx, session_id, entities).await?;
    let invoice = ctx.ledger.confirm_invoice(&ctx.shop_id, draft.customer_id, &draft.resolved_items, None).await?;
    ctx.conversation.remove_draft(&ctx.shop_id, draft.draft_id).await?;

    let customer = ctx.ledger.get_customer(draft.customer_id).await?;
    if let Some(email) = &customer.email {
        let body = render_invoice_body(&ctx.ledger.get_invoice_items(invoice.id).await?);
        ctx.notifier.send_email(email, "Your invoice", &body, None).await?;
        return Ok(json!({
            "invoiceNo": invoice.invoice_no,
            "total": invoice.total,
            "message": "Invoice confirm ho gaya aur email bhej diya gaya.",
        }));
    }

    ctx.conversation
        .set_pending_email(
            &ctx.shop_id,
            &PendingEmail {
                customer_id: draft.customer_id,
                customer_name: draft.customer_name.clone(),
                invoice_id: invoice.id.0,
                items: draft.resolved_items.clone(),
                total: invoice.total,
            },
        )
        .await?;

    Ok(json!({
        "invoiceNo": invoice.invoice_no,
        "total": invoice.total,
        "awaitingEmail": true,
        "message": "Invoice confirm ho gaya. Email address batayein bhejne ke liye.",
    }))
}

async fn show_pending_invoice(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let draft = find_target_draft(ctx, session_id, entities).await?;
    Ok(json!({
        "customer": draft.customer_name,
        "resolvedItems": draft.resolved_items,
        "subtotal": draft.subtotal,
        "grandTotal": draft.grand_total,
        "withGst": draft.with_gst,
        "autoCreatedProducts": draft.auto_created_products,
    }))
}

async fn toggle_gst(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let draft = find_target_draft(ctx, session_id, entities).await?;
    let new_with_gst = !draft.with_gst;
    let preview = ctx
        .ledger
        .preview_invoice(&ctx.shop_id, draft.customer_id, &draft.input_items, new_with_gst, SupplyType::IntraState)
        .await?;

    let updated = InvoiceDraft {
        resolved_items: preview.resolved_items.clone(),
        subtotal: preview.subtotal,
        grand_total: preview.grand_total,
        with_gst: preview.with_gst,
        auto_created_products: preview.auto_created_products.clone(),
        ..draft.clone()
    };
    ctx.conversation.update_draft(&ctx.shop_id, draft.draft_id, updated).await?;

    Ok(json!({
        "customer": draft.customer_name,
        "grandTotal": preview.grand_total,
        "cgst": preview.cgst,
        "sgst": preview.sgst,
        "igst": preview.igst,
        "withGst": preview.with_gst,
    }))
}

async fn provide_email(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let email = entities::str_entity(entities, "email").filter(|e| e.contains('@')).ok_or(AgentError::MissingField("email"))?;

    if let Some(pending) = ctx.conversation.get_pending_email(&ctx.shop_id).await? {
        let body = pending
            .items
            .iter()
            .map(|i| format!("{} x{} = {}", i.product_name, i.quantity, i.total))
            .collect::<Vec<_>>()
            .join("\n");
        ctx.notifier.send_email(email, "Your invoice", &body, None).await?;
        ctx.ledger.update_customer(pending.customer_id, None, Some(email), None, None).await?;
        ctx.conversation.clear_pending_email(&ctx.shop_id).await?;
        return Ok(json!({ "email": email, "customer": pending.customer_name }));
    }

    let customer = resolve_customer(ctx, session_id, entities).await?;
    let updated = ctx.ledger.update_customer(customer.id, None, Some(email), None, None).await?;
    ctx.resolver.set_active(session_id, &updated).await?;
    Ok(json!({ "email": email, "customer": updated.name }))
}

async fn send_invoice(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let channel = entities::str_entity(entities, "channel").ok_or(AgentError::MissingField("channel"))?;
    let contact = entities::str_entity(entities, "contact").ok_or(AgentError::MissingField("contact"))?;
    let customer = resolve_customer(ctx, session_id, entities).await?;
    let invoice = ctx.ledger.get_last_invoice(customer.id).await?.ok_or(LedgerError::NoInvoice)?;

    ctx.conversation
        .set_pending_send_conf(
            &ctx.shop_id,
            &PendingSendConfirm { channel: channel.to_string(), contact: contact.to_string(), invoice_id: invoice.id.0 },
        )
        .await?;

    Ok(json!({ "channel": channel, "contact": contact, "awaitingConfirm": true }))
}

async fn create_reminder(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let customer = resolve_customer(ctx, session_id, entities).await?;
    let amount = entities::money_entity(entities, "amount").filter(|m| m.is_positive()).ok_or(AgentError::MissingField("amount"))?;
    let when = entities::datetime_entity(entities, "datetime").ok_or(AgentError::MissingField("datetime"))?;
    if customer.phone.is_none() {
        return Err(AgentError::MissingField("phone"));
    }

    let reminder = ctx.ledger.schedule_reminder(customer.id, amount, when).await?;
    Ok(json!({ "reminderId": reminder.id, "customer": customer.name, "scheduledTime": reminder.scheduled_time }))
}

async fn record_payment(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let customer = resolve_customer(ctx, session_id, entities).await?;
    let amount = entities::money_entity(entities, "amount").filter(|m| m.is_positive()).ok_or(AgentError::MissingField("amount"))?;
    let method = entities::payment_method_entity(entities);
    let notes = entities::str_entity(entities, "notes");
    let (_, remaining) = ctx.ledger.record_payment(customer.id, amount, method, notes).await?;
    Ok(json!({ "customer": customer.name, "paid": amount, "remaining": remaining }))
}

async fn add_credit(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let customer = resolve_customer(ctx, session_id, entities).await?;
    let amount = entities::money_entity(entities, "amount").filter(|m| m.is_positive()).ok_or(AgentError::MissingField("amount"))?;
    let total = ctx.ledger.add_credit(customer.id, amount, "Credit added via voice assistant").await?;
    Ok(json!({ "customer": customer.name, "added": amount, "total": total }))
}

async fn check_stock(ctx: &DispatchContext, entities: &HashMap<String, Value>) -> Result<Value> {
    let product_name = entities::str_entity(entities, "product").ok_or(AgentError::MissingField("product"))?;
    let m = ctx.ledger.find_product_for_stock_check(&ctx.shop_id, product_name).await?;
    Ok(json!({ "product": m.product.name, "stock": m.product.stock, "unit": m.product.unit }))
}

async fn cancel_invoice(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let customer = resolve_customer(ctx, session_id, entities).await?;
    let invoice = ctx.ledger.get_last_invoice(customer.id).await?.ok_or(LedgerError::NoInvoice)?;
    let cancelled = ctx.ledger.cancel_invoice(invoice.id).await?;
    Ok(json!({ "invoiceId": cancelled.id, "invoiceNo": cancelled.invoice_no }))
}

async fn cancel_reminder(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let customer = resolve_customer(ctx, session_id, entities).await?;
    let reminder = ctx.ledger.cancel_reminder_for_customer(customer.id).await?;
    Ok(json!({ "reminderId": reminder.id }))
}

async fn list_reminders(ctx: &DispatchContext) -> Result<Value> {
    let reminders = ctx.ledger.list_pending_reminders(&ctx.shop_id).await?;
    Ok(json!({ "list": reminders, "count": reminders.len() }))
}

async fn create_customer(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let name = entities::customer_name(entities).ok_or(AgentError::MissingField("name"))?;
    let result = ctx.ledger.create_customer_fast(&ctx.shop_id, name).await?;
    if !result.success {
        return Err(LedgerError::DuplicateFound { suggestions: result.suggestions }.into());
    }
    let mut customer = result.customer.expect("create_customer_fast success implies a customer");

    let phone = entities::str_entity(entities, "phone");
    let nickname = entities::str_entity(entities, "nickname");
    let landmark = entities::str_entity(entities, "landmark");
    if phone.is_some() || nickname.is_some() || landmark.is_some() {
        customer = ctx.ledger.update_customer(customer.id, phone, None, nickname, landmark).await?;
    }

    if let Some(amount) = entities::money_entity(entities, "amount") {
        ctx.ledger.update_balance(customer.id, amount).await?;
    }

    ctx.resolver.set_active(session_id, &customer).await?;
    Ok(json!({ "customerId": customer.id, "name": customer.name }))
}

async fn modify_reminder(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let customer = resolve_customer(ctx, session_id, entities).await?;
    let when = entities::datetime_entity(entities, "datetime").ok_or(AgentError::MissingField("datetime"))?;
    let reminder = ctx.ledger.reschedule_reminder(customer.id, when).await?;
    Ok(json!({ "reminderId": reminder.id, "scheduledTime": reminder.scheduled_time }))
}

async fn daily_summary(ctx: &DispatchContext) -> Result<Value> {
    let today = Utc::now().date_naive();
    let summary = ctx.ledger.get_daily_summary(&ctx.shop_id, today).await?;
    Ok(json!({ "summary": summary }))
}

async fn update_customer(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let customer = resolve_customer(ctx, session_id, entities).await?;
    let phone = entities::str_entity(entities, "phone");
    let email = entities::str_entity(entities, "email");
    let nickname = entities::str_entity(entities, "nickname");
    let landmark = entities::str_entity(entities, "landmark");
    if phone.is_none() && email.is_none() && nickname.is_none() && landmark.is_none() {
        return Err(AgentError::MissingField("phone|email|nickname|landmark"));
    }

    let updated = ctx.ledger.update_customer(customer.id, phone, email, nickname, landmark).await?;
    ctx.resolver.set_active(session_id, &updated).await?;
    Ok(json!({
        "customer": updated.name,
        "phone": updated.phone,
        "email": updated.email,
        "nickname": updated.nickname,
        "landmark": updated.landmark,
    }))
}

async fn get_customer_info(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let customer = resolve_customer(ctx, session_id, entities).await?;
    let invoices = ctx.ledger.get_customer_invoices(customer.id).await?;
    let phone_spoken = customer.phone.as_deref().map(spell_out_digits);
    Ok(json!({
        "customer": customer,
        "phoneSpoken": phone_spoken,
        "recentInvoices": invoices.into_iter().take(5).collect::<Vec<_>>(),
    }))
}

/// Renders a phone number digit-by-digit for TTS: "9876543210" -> "9 8 7 6 5 4 3 2 1 0".
fn spell_out_digits(s: &str) -> String {
    s.chars().filter(|c| c.is_ascii_digit()).map(|c| c.to_string()).collect::<Vec<_>>().join(" ")
}

async fn delete_customer_data(
    ctx: &DispatchContext,
    session_id: &str,
    entities: &HashMap<String, Value>,
    operator_role: Option<&str>,
) -> Result<Value> {
    if operator_role != Some("admin") {
        return Err(AgentError::Unauthorized);
    }
    let customer = resolve_customer(ctx, session_id, entities).await?;
    let confirmation = entities::str_entity(entities, "confirmation");
    let existing = ctx.conversation.get_pending_delete_otp(&ctx.shop_id).await?;

    match (confirmation, existing) {
        (Some(code), Some(pending)) if pending.customer_id == customer.id && pending.code == code => {
            let counts = ctx.ledger.delete_customer_and_all_data(customer.id).await?;
            ctx.conversation.clear_pending_delete_otp(&ctx.shop_id).await?;
            ctx.resolver.invalidate_active(session_id);
            Ok(json!({ "counts": counts }))
        }
        (Some(_), _) => Err(AgentError::OtpMismatch),
        _ => {
            let code = generate_otp();
            ctx.conversation
                .set_pending_delete_otp(&ctx.shop_id, &PendingDeleteOtp { customer_id: customer.id, code: code.clone() })
                .await?;
            if let Some(admin_email) = &ctx.admin_email {
                ctx.notifier
                    .send_email(
                        admin_email,
                        "Customer deletion confirmation code",
                        &format!("Confirmation code for deleting {}: {code}", customer.name),
                        None,
                    )
                    .await?;
            }
            Err(AgentError::OtpSent)
        }
    }
}

/// 6-digit confirmation code, derived from a fresh UUID rather than an RNG
/// dependency — this crate has no `rand` entry in its dependency table.
fn generate_otp() -> String {
    let bytes = uuid::Uuid::new_v4().into_bytes();
    let n = u32::from_be_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]) % 1_000_000;
    format!("{n:06}")
}

async fn switch_language(ctx: &DispatchContext, session_id: &str, entities: &HashMap<String, Value>) -> Result<Value> {
    let language = entities::str_entity(entities, "language").unwrap_or("hi");
    ctx.conversation.set_language(session_id, language).await?;
    Ok(json!({ "language": language }))
}

async fn set_recording(ctx: &DispatchContext, session_id: &str, recording: bool) -> Result<Value> {
    ctx.conversation.set_recording(session_id, recording).await?;
    Ok(json!({ "recording": recording }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn otp_is_always_six_digits() {
        for _ in 0..50 {
            let code = generate_otp();
            assert_eq!(code.len(), 6);
            assert!(code.chars().all(|c| c.is_ascii_digit()));
        }
    }

    #[test]
    fn spells_out_digits_with_spaces() {
        assert_eq!(spell_out_digits("98765-43210"), "9 8 7 6 5 4 3 2 1 0");
    }
}
