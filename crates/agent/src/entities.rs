//! Typed accessors over the loose `HashMap<String, Value>` entity bag a
//! `ClassifiedIntent` carries.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde_json::Value;
use std::collections::HashMap;
use voice_agent_core::money::Money;
use voice_agent_core::payment::PaymentMethod;
use voice_agent_ledger::ItemRequest;

pub fn str_entity<'a>(entities: &'a HashMap<String, Value>, key: &str) -> Option<&'a str> {
    entities.get(key).and_then(Value::as_str).filter(|s| !s.trim().is_empty())
}

/// `entities.customer` is preferred, falling back to `entities.name`.
pub fn customer_name(entities: &HashMap<String, Value>) -> Option<&str> {
    str_entity(entities, "customer").or_else(|| str_entity(entities, "name"))
}

pub fn is_active_ref(entities: &HashMap<String, Value>) -> bool {
    str_entity(entities, "customerRef") == Some("active")
}

pub fn decimal_entity(entities: &HashMap<String, Value>, key: &str) -> Option<Decimal> {
    match entities.get(key)? {
        Value::String(s) => s.trim().parse().ok(),
        Value::Number(n) => n.as_f64().and_then(|f| Decimal::try_from(f).ok()),
        _ => None,
    }
}

pub fn money_entity(entities: &HashMap<String, Value>, key: &str) -> Option<Money> {
    decimal_entity(entities, key).map(Money::from_decimal)
}

pub fn bool_entity(entities: &HashMap<String, Value>, key: &str) -> Option<bool> {
    match entities.get(key)? {
        Value::Bool(b) => Some(*b),
        Value::String(s) => match s.to_lowercase().as_str() {
            "true" | "haan" | "yes" | "on" => Some(true),
            "false" | "nahi" | "no" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

pub fn datetime_entity(entities: &HashMap<String, Value>, key: &str) -> Option<DateTime<Utc>> {
    str_entity(entities, key).and_then(|s| DateTime::parse_from_rfc3339(s).ok()).map(|dt| dt.with_timezone(&Utc))
}

/// `entities.items` — an array of `{product, quantity}` objects").
pub fn items_entity(entities: &HashMap<String, Value>) -> Vec<ItemRequest> {
    let Some(Value::Array(items)) = entities.get("items") else { return Vec::new() };
    items
        .iter()
        .filter_map(|item| {
            let obj = item.as_object()?;
            let product_name = obj
                .get("product")
                .or_else(|| obj.get("productName"))
                .or_else(|| obj.get("name"))
                .and_then(Value::as_str)?
                .to_string();
            let quantity = obj
                .get("quantity")
                .and_then(|q| match q {
                    Value::Number(n) => n.as_f64().and_then(|f| Decimal::try_from(f).ok()),
                    Value::String(s) => s.parse().ok(),
                    _ => None,
                })
                .unwrap_or(Decimal::ONE);
            Some(ItemRequest { product_name, quantity })
        })
        .collect()
}

/// `RECORD_PAYMENT` "mode default cash".
pub fn payment_method_entity(entities: &HashMap<String, Value>) -> PaymentMethod {
    match str_entity(entities, "mode").or_else(|| str_entity(entities, "paymentMode")).map(str::to_lowercase).as_deref() {
        Some("upi") => PaymentMethod::Upi,
        Some("card") => PaymentMethod::Card,
        Some("other") => PaymentMethod::Other,
        _ => PaymentMethod::Cash,
    }
}

/// Haan/nahi-style yes/no parsing for confirmation turns.
pub fn is_affirmative(text: &str) -> bool {
    let lower = text.to_lowercase();
    ["haan", "han", "ha", "confirm", "ok", "okay", "pakka", "yes", "theek hai"]
        .iter()
        .any(|w| lower.contains(w))
}

pub fn is_negative(text: &str) -> bool {
    let lower = text.to_lowercase();
    ["nahi", "nahin", "cancel", "no", "mat karo"].iter().any(|w| lower.contains(w))
}
