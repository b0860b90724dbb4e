//! Response Templater: a fast-path `match` over intent and
//! result shape covers the common cases with a fixed Hinglish sentence; an
//! error-code phrasebook covers the common failures; anything else falls
//! through to the configured language model's `respond()`.

use crate::dispatcher::DispatchOutcome;
use once_cell::sync::Lazy;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use voice_agent_core::traits::LanguageModel;

static ERROR_PHRASES: Lazy<HashMap<&'static str, &'static str>> = Lazy::new(|| {
    let mut m = HashMap::new();
    m.insert("CUSTOMER_NOT_FOUND", "Customer nahi mila. Naya customer add karein?");
    m.insert("MULTIPLE_CUSTOMERS", "Ek se zyada customer milte hain. Kaun sa, thoda aur detail batayein.");
    m.insert("INSUFFICIENT_STOCK", "Itna stock nahi hai. Kam quantity try karein ya stock update karein.");
    m.insert("NO_INVOICE", "Koi pending invoice nahi hai.");
    m.insert("NO_REMINDER", "Koi pending reminder nahi hai.");
    m.insert("ALREADY_CANCELLED", "Yeh invoice pehle hi cancel ho chuka hai.");
    m.insert("DUPLICATE_FOUND", "Is naam se milta julta customer pehle se hai.");
    m.insert("UNAUTHORIZED", "Yeh action sirf admin kar sakta hai.");
    m.insert("OTP_SENT", "Confirmation code admin ko bhej diya gaya hai. Code bolein.");
    m.insert("OTP_MISMATCH", "Code match nahi hua. Phir se try karein.");
    m.insert("AWAITING_EMAIL", "Email address batayein.");
    m.insert("AWAITING_CONFIRM", "Haan ya nahi boliye confirm karne ke liye.");
    m.insert("MISSING_FIELD", "Thoda aur detail chahiye, phir se boliye.");
    m.insert("UNKNOWN_INTENT", "Samajh nahi aaya, phir se boliye.");
    m.insert("VALIDATION_ERROR", "Yeh value sahi nahi hai, phir se boliye.");
    m.insert("CONFLICT", "Yeh already ho chuka hai.");
    m.insert("CONVERSATION_STORE_UNAVAILABLE", "System thoda busy hai, ek minute mein phir try karein.");
    m.insert("CONVERSATION_STATE_CORRUPT", "Kuch gadbad ho gaya, session restart karte hain.");
    m
});

const FALLBACK_ERROR_PHRASE: &str = "Kuch problem aa gaya. Phir se try karein.";

pub struct Templater {
    language_model: Option<Arc<dyn LanguageModel>>,
}

impl Templater {
    pub fn new(language_model: Option<Arc<dyn LanguageModel>>) -> Self {
        Self { language_model }
    }

    /// Renders the spoken response for one dispatch outcome. Errors always
    /// take the phrasebook path; successes try the fast template first and
    /// only reach for the language model when no template matches.
    pub async fn render(&self, intent: &str, outcome: &DispatchOutcome) -> String {
        if !outcome.success {
            let code = outcome.error.unwrap_or("UNKNOWN_INTENT");
            return ERROR_PHRASES.get(code).copied().unwrap_or(FALLBACK_ERROR_PHRASE).to_string();
        }

        if let Some(text) = fast_template(intent, &outcome.data) {
            return text;
        }

        if let Some(model) = &self.language_model {
            if let Ok(text) = model.respond(intent, &outcome.data).await {
                return text;
            }
        }

        "Ho gaya.".to_string()
    }
}

fn get_str<'a>(data: &'a Value, key: &str) -> &'a str {
    data.get(key).and_then(Value::as_str).unwrap_or("")
}

/// Renders any JSON scalar as a display string — `Money` fields come
/// through as quoted strings, counts and stock levels as bare numbers.
fn get_any(data: &Value, key: &str) -> String {
    match data.get(key) {
        Some(Value::String(s)) => s.clone(),
        Some(Value::Number(n)) => n.to_string(),
        _ => String::new(),
    }
}

fn fast_template(intent: &str, data: &Value) -> Option<String> {
    match intent {
        "TOTAL_PENDING_AMOUNT" => Some(format!("Total pending amount hai ₹{}.", get_str(data, "total"))),
        "CHECK_BALANCE" => Some(format!("{} ka balance ₹{} hai.", get_str(data, "name"), get_str(data, "balance"))),
        "LIST_CUSTOMER_BALANCES" => {
            let count = data.get("list").and_then(Value::as_array).map(Vec::len).unwrap_or(0);
            Some(format!("{count} customers ka balance pending hai, total ₹{}.", get_str(data, "total")))
        }
        "CREATE_INVOICE" => Some(format!(
            "{} ke liye invoice ready hai, total ₹{}. Confirm karein?",
            get_str(data, "customer"),
            get_str(data, "grandTotal")
        )),
        "CONFIRM_INVOICE" => {
            if data.get("awaitingEmail").and_then(Value::as_bool).unwrap_or(false) {
                Some("Invoice confirm ho gaya. Email address batayein bhejne ke liye.".to_string())
            } else {
                Some(format!("Invoice {} confirm ho gaya, total ₹{}.", get_str(data, "invoiceNo"), get_str(data, "total")))
            }
        }
        "TOGGLE_GST" => Some(format!(
            "{} ab {} hai, naya total ₹{}.",
            get_str(data, "customer"),
            if data.get("withGst").and_then(Value::as_bool).unwrap_or(false) { "GST ke saath" } else { "GST ke bina" },
            get_str(data, "grandTotal")
        )),
        "PROVIDE_EMAIL" => Some(format!("Email {} save ho gaya {} ke liye.", get_str(data, "email"), get_str(data, "customer"))),
        "SEND_INVOICE" => Some(format!("{} pe bhejne se pehle confirm karein, haan ya nahi?", get_str(data, "contact"))),
        "CREATE_REMINDER" => Some(format!("Reminder set ho gaya {} ke liye.", get_str(data, "customer"))),
        "RECORD_PAYMENT" => Some(format!(
            "{} ne ₹{} pay kiya, baaki ₹{} hai.",
            get_str(data, "customer"),
            get_str(data, "paid"),
            get_str(data, "remaining")
        )),
        "ADD_CREDIT" => Some(format!("{} mein ₹{} credit add ho gaya, total ab ₹{} hai.", get_str(data, "customer"), get_str(data, "added"), get_str(data, "total"))),
        "CHECK_STOCK" => Some(format!("{} ka stock {} {} hai.", get_str(data, "product"), get_any(data, "stock"), get_str(data, "unit"))),
        "CANCEL_INVOICE" => Some(format!("Invoice {} cancel ho gaya.", get_str(data, "invoiceNo"))),
        "CANCEL_REMINDER" => Some("Reminder cancel ho gaya.".to_string()),
        "LIST_REMINDERS" => Some(format!("{} reminders pending hain.", get_any(data, "count"))),
        "CREATE_CUSTOMER" => Some(format!("{} add ho gaya customer list mein.", get_str(data, "name"))),
        "MODIFY_REMINDER" => Some("Reminder reschedule ho gaya.".to_string()),
        "UPDATE_CUSTOMER" | "UPDATE_CUSTOMER_PHONE" => Some(format!("{} ki details update ho gayi.", get_str(data, "customer"))),
        "DELETE_CUSTOMER_DATA" => Some("Customer ka data delete ho gaya.".to_string()),
        "SWITCH_LANGUAGE" => Some(format!("Theek hai, ab {} mein baat karte hain.", get_str(data, "language"))),
        "START_RECORDING" => Some("Recording shuru ho gayi.".to_string()),
        "STOP_RECORDING" => Some("Recording band ho gayi.".to_string()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn templater() -> Templater {
        Templater::new(None)
    }

    #[tokio::test]
    async fn renders_fast_path_for_check_balance() {
        let outcome = DispatchOutcome { success: true, data: json!({ "name": "Ramesh", "balance": "150.00" }), error: None };
        let reply = templater().render("CHECK_BALANCE", &outcome).await;
        assert_eq!(reply, "Ramesh ka balance ₹150.00 hai.");
    }

    #[tokio::test]
    async fn renders_numeric_fields_for_check_stock() {
        let outcome = DispatchOutcome { success: true, data: json!({ "product": "Chawal", "stock": 42, "unit": "kg" }), error: None };
        let reply = templater().render("CHECK_STOCK", &outcome).await;
        assert_eq!(reply, "Chawal ka stock 42 kg hai.");
    }

    #[tokio::test]
    async fn error_code_maps_to_phrasebook_entry() {
        let outcome = DispatchOutcome { success: false, data: json!({ "query": "Ramesh" }), error: Some("CUSTOMER_NOT_FOUND") };
        let reply = templater().render("CHECK_BALANCE", &outcome).await;
        assert_eq!(reply, "Customer nahi mila. Naya customer add karein?");
    }

    #[tokio::test]
    async fn unknown_error_code_falls_back_to_generic_phrase() {
        let outcome = DispatchOutcome { success: false, data: Value::Null, error: Some("SOME_NEW_CODE") };
        let reply = templater().render("CHECK_BALANCE", &outcome).await;
        assert_eq!(reply, FALLBACK_ERROR_PHRASE);
    }

    #[tokio::test]
    async fn no_fast_path_and_no_llm_falls_back_to_generic_ok() {
        let outcome = DispatchOutcome { success: true, data: Value::Null, error: None };
        let reply = templater().render("SOME_UNTEMPLATED_INTENT", &outcome).await;
        assert_eq!(reply, "Ho gaya.");
    }
}
