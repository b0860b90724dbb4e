//! REST surface over the same ledger/conversation handles the WebSocket
//! session loop uses — everything a back-office dashboard or integration
//! needs without going through voice at all.

use axum::extract::{Path, Query, State};
use axum::http::{HeaderValue, Method, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use tower_http::compression::CompressionLayer;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use voice_agent_core::ids::{CustomerId, InvoiceId, ProductId, ReminderId};
use voice_agent_core::invoice::SupplyType;
use voice_agent_core::money::Money;
use voice_agent_core::payment::PaymentMethod;
use voice_agent_ledger::ItemRequest;

use crate::error::{Result, ServerError};
use crate::metrics::{metrics_handler, record_business_operation, record_invoice_operation};
use crate::state::AppState;
use crate::websocket::ws_handler;

pub fn create_router(state: AppState) -> Router {
    let cors_layer = {
        let guard = state.config.read();
        build_cors_layer(&guard.server.cors_origins, guard.server.cors_enabled)
    };
    let ws_path = state.config.read().server.ws_path.clone();

    Router::new()
        .route("/health", get(health_check))
        .route("/ready", get(readiness_check))
        .route("/metrics", get(metrics_handler))
        .route("/api/v1/customers", post(create_customer))
        .route("/api/v1/customers/search", get(search_customers))
        .route("/api/v1/customers/:id", get(get_customer).patch(update_customer))
        .route("/api/v1/products", get(list_products).post(create_product))
        .route("/api/v1/products/low-stock", get(low_stock_products))
        .route("/api/v1/invoices", get(recent_invoices))
        .route("/api/v1/invoices/preview", post(preview_invoice))
        .route("/api/v1/invoices/confirm", post(confirm_invoice))
        .route("/api/v1/invoices/:id/cancel", post(cancel_invoice))
        .route("/api/v1/ledger/payment", post(record_payment))
        .route("/api/v1/ledger/credit", post(add_credit))
        .route("/api/v1/ledger/:customer_id", get(customer_balance))
        .route("/api/v1/reminders", post(schedule_reminder))
        .route("/api/v1/reminders/:id/cancel", post(cancel_reminder))
        .route("/api/v1/summary/daily", get(daily_summary))
        .route(&ws_path, get(ws_handler))
        .layer(axum::middleware::from_fn(crate::auth::auth_middleware))
        .layer(axum::Extension(state.config.clone()))
        .layer(TraceLayer::new_for_http())
        .layer(CompressionLayer::new())
        .layer(cors_layer)
        .with_state(state)
}

/// If `cors_enabled` is false, falls back to a permissive layer (dev only);
/// an empty `cors_origins` list defaults to `localhost:3000` for safety.
fn build_cors_layer(origins: &[String], enabled: bool) -> CorsLayer {
    if !enabled {
        tracing::warn!("CORS is disabled, allowing all origins — not for production");
        return CorsLayer::permissive();
    }

    let parsed: Vec<HeaderValue> = origins.iter().filter_map(|o| o.parse::<HeaderValue>().ok()).collect();
    let parsed = if parsed.is_empty() {
        tracing::info!("no CORS origins configured, defaulting to localhost:3000");
        vec!["http://localhost:3000".parse::<HeaderValue>().expect("valid header value")]
    } else {
        parsed
    };

    CorsLayer::new()
        .allow_origin(parsed)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::OPTIONS])
        .allow_headers(Any)
        .allow_credentials(true)
}

async fn health_check() -> impl IntoResponse {
    Json(serde_json::json!({ "status": "healthy", "version": env!("CARGO_PKG_VERSION") }))
}

async fn readiness_check(State(state): State<AppState>) -> impl IntoResponse {
    Json(serde_json::json!({ "status": "ready", "sessions": state.sessions.count() }))
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    q: String,
}

async fn search_customers(State(state): State<AppState>, Query(q): Query<SearchQuery>) -> Result<impl IntoResponse> {
    let shop_id = state.agent.shop_id().clone();
    let matches = state.ledger.search_customer(&shop_id, &q.q).await.map_err(ServerError::from)?;
    Ok(Json(matches))
}

async fn get_customer(State(state): State<AppState>, Path(id): Path<CustomerId>) -> Result<impl IntoResponse> {
    let customer = state.ledger.get_customer(id).await.map_err(ServerError::from)?;
    Ok(Json(customer))
}

#[derive(Debug, Deserialize)]
struct CreateCustomerRequest {
    name: String,
    phone: Option<String>,
    nickname: Option<String>,
    landmark: Option<String>,
}

async fn create_customer(State(state): State<AppState>, Json(req): Json<CreateCustomerRequest>) -> Result<impl IntoResponse> {
    let shop_id = state.agent.shop_id().clone();
    let customer = state
        .ledger
        .create_customer(&shop_id, &req.name, req.phone.as_deref(), req.nickname.as_deref(), req.landmark.as_deref())
        .await
        .map_err(ServerError::from)?;
    record_business_operation("create_customer", true);
    Ok((StatusCode::CREATED, Json(customer)))
}

#[derive(Debug, Deserialize)]
struct UpdateCustomerRequest {
    phone: Option<String>,
    email: Option<String>,
    nickname: Option<String>,
    landmark: Option<String>,
}

async fn update_customer(
    State(state): State<AppState>,
    Path(id): Path<CustomerId>,
    Json(req): Json<UpdateCustomerRequest>,
) -> Result<impl IntoResponse> {
    let customer = state
        .ledger
        .update_customer(id, req.phone.as_deref(), req.email.as_deref(), req.nickname.as_deref(), req.landmark.as_deref())
        .await
        .map_err(ServerError::from)?;
    Ok(Json(customer))
}

async fn list_products(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let shop_id = state.agent.shop_id().clone();
    let products = state.ledger.list_products(&shop_id).await.map_err(ServerError::from)?;
    Ok(Json(products))
}

#[derive(Debug, Deserialize)]
struct LowStockQuery {
    #[serde(default = "default_low_stock_threshold")]
    threshold: i64,
}

fn default_low_stock_threshold() -> i64 {
    5
}

async fn low_stock_products(State(state): State<AppState>, Query(q): Query<LowStockQuery>) -> Result<impl IntoResponse> {
    let shop_id = state.agent.shop_id().clone();
    let products = state.ledger.list_low_stock(&shop_id, q.threshold).await.map_err(ServerError::from)?;
    Ok(Json(products))
}

#[derive(Debug, Deserialize)]
struct CreateProductRequest {
    name: String,
    unit: String,
    price: Decimal,
    stock: i64,
    hsn_code: Option<String>,
    gst_rate: Decimal,
}

async fn create_product(State(state): State<AppState>, Json(req): Json<CreateProductRequest>) -> Result<impl IntoResponse> {
    let shop_id = state.agent.shop_id().clone();
    let product = state
        .ledger
        .create_product(&shop_id, &req.name, &req.unit, Money::from_decimal(req.price), req.stock, req.hsn_code.as_deref(), req.gst_rate)
        .await
        .map_err(ServerError::from)?;
    Ok((StatusCode::CREATED, Json(product)))
}

async fn recent_invoices(State(state): State<AppState>) -> Result<impl IntoResponse> {
    let shop_id = state.agent.shop_id().clone();
    let invoices = state.ledger.get_recent_invoices(&shop_id, 50).await.map_err(ServerError::from)?;
    Ok(Json(invoices))
}

#[derive(Debug, Deserialize)]
struct InvoiceItemsRequest {
    customer_id: CustomerId,
    items: Vec<ItemRequest>,
    #[serde(default = "default_true")]
    with_gst: bool,
    #[serde(default)]
    inter_state: bool,
}

fn default_true() -> bool {
    true
}

async fn preview_invoice(State(state): State<AppState>, Json(req): Json<InvoiceItemsRequest>) -> Result<impl IntoResponse> {
    let shop_id = state.agent.shop_id().clone();
    let supply_type = if req.inter_state { SupplyType::InterState } else { SupplyType::IntraState };
    let preview = state
        .ledger
        .preview_invoice(&shop_id, req.customer_id, &req.items, req.with_gst, supply_type)
        .await
        .map_err(ServerError::from)?;
    Ok(Json(preview))
}

#[derive(Debug, Deserialize)]
struct ConfirmInvoiceRequest {
    customer_id: CustomerId,
    resolved_items: Vec<voice_agent_ledger::ResolvedItem>,
    notes: Option<String>,
}

async fn confirm_invoice(State(state): State<AppState>, Json(req): Json<ConfirmInvoiceRequest>) -> Result<impl IntoResponse> {
    let shop_id = state.agent.shop_id().clone();
    let invoice = state
        .ledger
        .confirm_invoice(&shop_id, req.customer_id, &req.resolved_items, req.notes.as_deref())
        .await
        .map_err(ServerError::from);
    record_invoice_operation("confirm", invoice.is_ok());
    Ok(Json(invoice?))
}

async fn cancel_invoice(State(state): State<AppState>, Path(id): Path<InvoiceId>) -> Result<impl IntoResponse> {
    let invoice = state.ledger.cancel_invoice(id).await.map_err(ServerError::from);
    record_invoice_operation("cancel", invoice.is_ok());
    Ok(Json(invoice?))
}

#[derive(Debug, Deserialize)]
struct PaymentRequest {
    customer_id: CustomerId,
    amount: Decimal,
    method: PaymentMethod,
    notes: Option<String>,
}

#[derive(Debug, Serialize)]
struct PaymentResponse {
    payment: voice_agent_core::payment::Payment,
    balance: Money,
}

async fn record_payment(State(state): State<AppState>, Json(req): Json<PaymentRequest>) -> Result<impl IntoResponse> {
    let (payment, balance) = state
        .ledger
        .record_payment(req.customer_id, Money::from_decimal(req.amount), req.method, req.notes.as_deref())
        .await
        .map_err(ServerError::from)?;
    record_business_operation("record_payment", true);
    Ok(Json(PaymentResponse { payment, balance }))
}

#[derive(Debug, Deserialize)]
struct CreditRequest {
    customer_id: CustomerId,
    amount: Decimal,
    description: String,
}

async fn add_credit(State(state): State<AppState>, Json(req): Json<CreditRequest>) -> Result<impl IntoResponse> {
    let balance = state
        .ledger
        .add_credit(req.customer_id, Money::from_decimal(req.amount), &req.description)
        .await
        .map_err(ServerError::from)?;
    Ok(Json(serde_json::json!({ "balance": balance })))
}

async fn customer_balance(State(state): State<AppState>, Path(customer_id): Path<CustomerId>) -> Result<impl IntoResponse> {
    let balance = state.ledger.get_balance(customer_id).await.map_err(ServerError::from)?;
    Ok(Json(serde_json::json!({ "balance": balance })))
}

#[derive(Debug, Deserialize)]
struct ScheduleReminderRequest {
    customer_id: CustomerId,
    amount: Decimal,
    scheduled_time: chrono::DateTime<chrono::Utc>,
}

async fn schedule_reminder(State(state): State<AppState>, Json(req): Json<ScheduleReminderRequest>) -> Result<impl IntoResponse> {
    let reminder = state
        .ledger
        .schedule_reminder(req.customer_id, Money::from_decimal(req.amount), req.scheduled_time)
        .await
        .map_err(ServerError::from)?;
    Ok((StatusCode::CREATED, Json(reminder)))
}

async fn cancel_reminder(State(state): State<AppState>, Path(id): Path<ReminderId>) -> Result<impl IntoResponse> {
    let reminder = state.ledger.cancel_reminder(id).await.map_err(ServerError::from)?;
    Ok(Json(reminder))
}

#[derive(Debug, Deserialize)]
struct DailySummaryQuery {
    date: Option<chrono::NaiveDate>,
}

async fn daily_summary(State(state): State<AppState>, Query(q): Query<DailySummaryQuery>) -> Result<impl IntoResponse> {
    let shop_id = state.agent.shop_id().clone();
    let date = q.date.unwrap_or_else(|| chrono::Utc::now().date_naive());
    let summary = state.ledger.get_daily_summary(&shop_id, date).await.map_err(ServerError::from)?;
    Ok(Json(summary))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cors_disabled_is_permissive() {
        let _ = build_cors_layer(&[], false);
    }

    #[test]
    fn cors_empty_origins_defaults_to_localhost() {
        let _ = build_cors_layer(&[], true);
    }

    #[test]
    fn cors_parses_configured_origins() {
        let _ = build_cors_layer(&["https://shop.example.com".to_string()], true);
    }
}
