//! End-to-end dispatch scenarios against a real Postgres + Redis backend.
//!
//! Requires `DATABASE_URL` (Postgres) and `REDIS_URL` (Redis) to point at
//! reachable instances — the same defaults `LedgerConfig`/
//! `ConversationStoreConfig` fall back to. Ignored by default, matching the
//! convention used for the DB-backed tests elsewhere in this workspace.

use async_trait::async_trait;
use rust_decimal_macros::dec;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use voice_agent_agent::{dispatch, CustomerResolver, DispatchContext};
use voice_agent_config::ShopDomainConfig;
use voice_agent_conversation::{ConversationPool, ConversationStore};
use voice_agent_core::ids::ShopId;
use voice_agent_core::money::Money;
use voice_agent_core::traits::{ClassifiedIntent, JobQueue, JobQueueError, Notifier, NotifierError};
use voice_agent_ledger::{LedgerConfig, LedgerPool, LedgerStore};
use voice_agent_text::FuzzyMatcher;

struct NoopJobQueue;

#[async_trait]
impl JobQueue for NoopJobQueue {
    async fn enqueue(&self, _job_name: &str, _payload: &str, _run_at: chrono::DateTime<chrono::Utc>) -> Result<String, JobQueueError> {
        Ok(uuid::Uuid::new_v4().to_string())
    }

    async fn cancel(&self, _job_id: &str) -> Result<(), JobQueueError> {
        Ok(())
    }
}

/// Captures every send instead of reaching a real SMTP/WhatsApp vendor, so
/// the OTP-email and confirm-without-email scenarios can assert on what
/// was actually sent.
#[derive(Default)]
struct CapturingNotifier {
    emails: Mutex<Vec<(String, String, String)>>,
}

impl CapturingNotifier {
    fn sent_to(&self, to: &str) -> Option<(String, String)> {
        self.emails.lock().unwrap().iter().find(|(t, _, _)| t == to).map(|(_, s, b)| (s.clone(), b.clone()))
    }
}

#[async_trait]
impl Notifier for CapturingNotifier {
    async fn send_email(&self, to: &str, subject: &str, body: &str, _attachment: Option<(&str, Vec<u8>)>) -> Result<(), NotifierError> {
        self.emails.lock().unwrap().push((to.to_string(), subject.to_string(), body.to_string()));
        Ok(())
    }

    async fn send_whatsapp(&self, _to_phone: &str, _body: &str, _attachment: Option<(&str, Vec<u8>)>) -> Result<(), NotifierError> {
        Ok(())
    }
}

async fn test_ledger() -> LedgerStore {
    let pool = LedgerPool::connect(LedgerConfig::default())
        .await
        .expect("DATABASE_URL must point at a reachable Postgres for agent integration tests");
    pool.run_migrations().await.expect("migrations failed");
    let domain = ShopDomainConfig::default();
    let fuzzy = Arc::new(FuzzyMatcher::new(domain.honorifics.clone(), domain.nicknames.clone()));
    LedgerStore::new(pool, Arc::new(NoopJobQueue), fuzzy)
}

async fn test_conversation() -> ConversationStore {
    let pool = ConversationPool::connect(Default::default())
        .await
        .expect("REDIS_URL must point at a reachable Redis for agent integration tests");
    let domain = ShopDomainConfig::default();
    let fuzzy = Arc::new(FuzzyMatcher::new(domain.honorifics, domain.nicknames));
    ConversationStore::new(pool, fuzzy)
}

async fn build_ctx(admin_email: Option<String>) -> (DispatchContext, Arc<CapturingNotifier>, ShopId) {
    let ledger = test_ledger().await;
    let conversation = test_conversation().await;
    let resolver = Arc::new(CustomerResolver::new(ledger.clone(), conversation.clone()));
    let notifier = Arc::new(CapturingNotifier::default());
    let shop_id = ShopId(format!("test-shop-{}", uuid::Uuid::new_v4()));
    let ctx = DispatchContext {
        ledger,
        conversation,
        resolver,
        notifier: notifier.clone(),
        shop_id: shop_id.clone(),
        admin_email,
    };
    (ctx, notifier, shop_id)
}

fn intent(name: &str, entities: HashMap<String, Value>) -> ClassifiedIntent {
    ClassifiedIntent { intent: name.to_string(), entities }
}

fn fresh_session() -> String {
    format!("test-session-{}", uuid::Uuid::new_v4())
}

fn entities(pairs: &[(&str, Value)]) -> HashMap<String, Value> {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

/// Repeated name variants of the same customer dedupe into one history
/// entry with a bumped mention count, not one entry per spelling.
#[tokio::test]
#[ignore]
async fn name_variants_dedupe_in_history() {
    let (ctx, _notifier, shop_id) = build_ctx(None).await;
    let session = fresh_session();
    ctx.ledger.create_customer(&shop_id, "Bharat", None, None, None).await.unwrap();

    let outcome = dispatch(&ctx, &session, &intent("CHECK_BALANCE", entities(&[("customer", json!("Bharat"))])), None).await;
    assert!(outcome.success);

    let outcome = dispatch(&ctx, &session, &intent("CHECK_BALANCE", entities(&[("customer", json!("Bharath"))])), None).await;
    assert!(outcome.success);

    let mem = ctx.conversation.load_session(&session).await.unwrap();
    assert_eq!(mem.customer_history.len(), 1);
    assert_eq!(mem.customer_history[0].name, "Bharat");
    assert_eq!(mem.customer_history[0].mention_count, 2);
}

/// Once several customers have been mentioned in a session, a fuzzy/
/// nickname query switches the active customer without naming them exactly.
#[tokio::test]
#[ignore]
async fn fuzzy_name_switches_active_customer() {
    let (ctx, _notifier, shop_id) = build_ctx(None).await;
    let session = fresh_session();
    for name in ["Deepak", "Sandeep", "Pradeep"] {
        ctx.ledger.create_customer(&shop_id, name, None, None, None).await.unwrap();
        let outcome = dispatch(&ctx, &session, &intent("CHECK_BALANCE", entities(&[("customer", json!(name))])), None).await;
        assert!(outcome.success, "{name}: {outcome:?}");
    }

    let switched = ctx.conversation.switch_to_customer_by_name(&session, "Dipak").await.unwrap();
    assert_eq!(switched.unwrap().name, "Deepak");
}

/// Confirming an invoice for a customer with no email on file sends
/// nothing yet and parks the invoice awaiting one; a follow-up
/// `PROVIDE_EMAIL` turn sends it and clears the pending state.
#[tokio::test]
#[ignore]
async fn confirm_without_email_then_provide_email_sends() {
    let (ctx, notifier, shop_id) = build_ctx(None).await;
    let session = fresh_session();
    ctx.ledger.create_customer(&shop_id, "Rahul", None, None, None).await.unwrap();
    ctx.ledger.create_product(&shop_id, "Chawal", "kg", Money::from_decimal(dec!(50)), 100, None, dec!(5)).await.unwrap();

    let create = dispatch(
        &ctx,
        &session,
        &intent(
            "CREATE_INVOICE",
            entities(&[("customer", json!("Rahul")), ("items", json!([{"product": "Chawal", "quantity": 2}]))]),
        ),
        None,
    )
    .await;
    assert!(create.success, "{create:?}");

    let confirm = dispatch(&ctx, &session, &intent("CONFIRM_INVOICE", entities(&[])), None).await;
    assert!(confirm.success, "{confirm:?}");
    assert_eq!(confirm.data["awaitingEmail"], json!(true));
    assert!(ctx.conversation.get_pending_email(&shop_id).await.unwrap().is_some());

    let provided = dispatch(&ctx, &session, &intent("PROVIDE_EMAIL", entities(&[("email", json!("rahul@example.com"))])), None).await;
    assert!(provided.success, "{provided:?}");
    assert!(notifier.sent_to("rahul@example.com").is_some());
    assert!(ctx.conversation.get_pending_email(&shop_id).await.unwrap().is_none());
}

/// Two customers whose registered names both plausibly answer to the same
/// spoken name, neither a confident-enough match to resolve outright,
/// surface as `MULTIPLE_CUSTOMERS` rather than picking one.
#[tokio::test]
#[ignore]
async fn ambiguous_name_returns_multiple_customers() {
    let (ctx, _notifier, shop_id) = build_ctx(None).await;
    let session = fresh_session();
    ctx.ledger
        .create_customer(&shop_id, "Bharat Chandrashekhar Rao", None, None, Some("Station Road"))
        .await
        .unwrap();
    ctx.ledger
        .create_customer(&shop_id, "Bharat Venkataramakrishnan", None, None, Some("Market Road"))
        .await
        .unwrap();

    let outcome = dispatch(&ctx, &session, &intent("CHECK_BALANCE", entities(&[("customer", json!("Bharat"))])), None).await;
    assert!(!outcome.success);
    assert_eq!(outcome.error, Some("MULTIPLE_CUSTOMERS"));
    assert_eq!(outcome.data["customers"].as_array().unwrap().len(), 2);
}

/// `DELETE_CUSTOMER_DATA` always rejects a non-admin caller, sends a
/// one-time code to the admin on the first admin call, and only deletes
/// once that code comes back as `confirmation`.
#[tokio::test]
#[ignore]
async fn admin_delete_requires_otp_round_trip() {
    let (ctx, notifier, shop_id) = build_ctx(Some("owner@shop.test".to_string())).await;
    let session = fresh_session();
    let customer = ctx.ledger.create_customer(&shop_id, "Suresh", None, None, None).await.unwrap();

    let denied = dispatch(&ctx, &session, &intent("DELETE_CUSTOMER_DATA", entities(&[("customer", json!("Suresh"))])), None).await;
    assert!(!denied.success);
    assert_eq!(denied.error, Some("UNAUTHORIZED"));

    let otp_sent = dispatch(
        &ctx,
        &session,
        &intent("DELETE_CUSTOMER_DATA", entities(&[("customer", json!("Suresh"))])),
        Some("admin"),
    )
    .await;
    assert!(!otp_sent.success);
    assert_eq!(otp_sent.error, Some("OTP_SENT"));
    assert!(notifier.sent_to("owner@shop.test").is_some());

    let pending = ctx.conversation.get_pending_delete_otp(&shop_id).await.unwrap().expect("otp was recorded");
    let code = pending.code;

    let deleted = dispatch(
        &ctx,
        &session,
        &intent("DELETE_CUSTOMER_DATA", entities(&[("customer", json!("Suresh")), ("confirmation", json!(code))])),
        Some("admin"),
    )
    .await;
    assert!(deleted.success, "{deleted:?}");

    let missing = ctx.ledger.get_customer(customer.id).await;
    assert!(missing.is_err());
}
