//! Hosted-model extraction through a completion backend.

use async_trait::async_trait;
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde_json::{Map, Value};
use std::result::Result as StdResult;
use std::sync::Arc;
use tracing::{debug, warn};

use super::rules::patterns::{CODE_FENCE, ISO_DATE};
use super::rules::amounts::within_price_range;
use super::rules::{first_price, parse_price, score_confidence, ConfidenceFlags, MAX_QUANTITY};
use super::ExtractionBackend;
use crate::error::ExtractionError;
use crate::models::extraction::{
    ExtractedParty, ExtractionResult, PartyRole, ProviderId, DEFAULT_TAX_RATE,
};
use crate::models::invoice::LineItem;
use tally_completion::{CompletionBackend, CompletionRequest};

/// Description of the item injected when the model returns only unusable items.
pub const REMOTE_DEFAULT_DESCRIPTION: &str = "Professional Consulting Services (Standard Rate)";

/// Days added to today when the model's due date is not `YYYY-MM-DD`.
const INVALID_DUE_DATE_DAYS: u64 = 30;

const SYSTEM_PROMPT: &str = r#"You extract invoice data from free-form descriptions of billable work.
Reply with a single JSON object and nothing else, using exactly this shape:
{
  "client": {"name": string, "email": string, "address": string},
  "items": [{"description": string, "quantity": integer, "unitPrice": number}],
  "taxRate": number,
  "dueDate": "YYYY-MM-DD",
  "notes": string
}
Rules:
- quantity is a whole number of at least 1; unitPrice is the price of one unit.
- taxRate is a percentage (8 means 8%); use 10 when the text names none.
- dueDate is an absolute date; resolve relative terms such as "due in 14 days" against today's date.
- Use empty strings for client fields the text does not mention.
- notes holds any message or payment instructions the text asks to include."#;

/// The user prompt for one extraction.
pub fn user_prompt(text: &str, today: NaiveDate) -> String {
    format!(
        "Today's date is {}.\n\nExtract the invoice details from this text:\n\n{}",
        today.format("%Y-%m-%d"),
        text
    )
}

/// Extraction backend that asks a hosted model.
pub struct RemoteBackend {
    completion: Arc<dyn CompletionBackend>,
    today: NaiveDate,
    temperature: f32,
}

impl RemoteBackend {
    pub fn new(completion: Arc<dyn CompletionBackend>, today: NaiveDate) -> Self {
        Self {
            completion,
            today,
            temperature: 0.1,
        }
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    fn request(&self, text: &str) -> CompletionRequest {
        CompletionRequest::json(SYSTEM_PROMPT, user_prompt(text, self.today))
            .with_temperature(self.temperature)
    }
}

#[async_trait]
impl ExtractionBackend for RemoteBackend {
    fn id(&self) -> ProviderId {
        ProviderId::Remote
    }

    async fn extract(&self, text: &str) -> StdResult<ExtractionResult, ExtractionError> {
        let response = self.completion.complete(&self.request(text)).await?;
        debug!(
            model = %response.model,
            bytes = response.content.len(),
            "Remote completion received"
        );
        parse_response(&response.content, text, self.today)
    }
}

/// Turn model output into an extraction result.
///
/// Content that is not a JSON object, or whose `items` is missing or not an
/// array, is malformed. An empty `items` array means nothing was extracted.
/// Entries are coerced field by field. An entry that is not an object, or
/// whose description is empty and whose price is zero or unusable, is
/// dropped rather than kept as an empty zero-priced item. When no entry
/// survives, one default item is injected.
pub fn parse_response(
    content: &str,
    text: &str,
    today: NaiveDate,
) -> StdResult<ExtractionResult, ExtractionError> {
    let json = strip_code_fence(content);
    let value: Value = serde_json::from_str(json)
        .map_err(|e| ExtractionError::MalformedResponse(format!("invalid JSON: {}", e)))?;

    let Value::Object(object) = value else {
        return Err(ExtractionError::MalformedResponse(
            "expected a JSON object".to_string(),
        ));
    };

    let raw_items = match object.get("items") {
        Some(Value::Array(items)) => items,
        Some(_) => {
            return Err(ExtractionError::MalformedResponse(
                "items is not an array".to_string(),
            ));
        }
        None => {
            return Err(ExtractionError::MalformedResponse(
                "items is missing".to_string(),
            ));
        }
    };

    if raw_items.is_empty() {
        return Err(ExtractionError::NoItems);
    }

    let mut items: Vec<LineItem> = raw_items.iter().filter_map(coerce_item).collect();
    if items.is_empty() {
        warn!(
            received = raw_items.len(),
            "No usable items in remote response, injecting default item"
        );
        items.push(LineItem::new(
            REMOTE_DEFAULT_DESCRIPTION,
            1,
            first_price(text).unwrap_or(Decimal::ONE_HUNDRED),
        ));
    }

    let client_info = coerce_client(object.get("client"));
    let tax_rate = object
        .get("taxRate")
        .and_then(decimal_value)
        .unwrap_or(DEFAULT_TAX_RATE);
    let due_date = coerce_due_date(object.get("dueDate"), today);
    let notes = object
        .get("notes")
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|n| !n.is_empty())
        .map(str::to_string);

    let flags = ConfidenceFlags::from_fields(
        &client_info,
        &items,
        tax_rate,
        due_date.is_some(),
        notes.as_deref(),
    );

    Ok(ExtractionResult {
        items,
        client_info,
        company_info: None,
        tax_rate,
        due_date,
        due_days: None,
        notes,
        confidence: score_confidence(flags),
        provider: ProviderId::Remote,
    })
}

fn strip_code_fence(content: &str) -> &str {
    match CODE_FENCE.captures(content).and_then(|caps| caps.get(1)) {
        Some(inner) => inner.as_str(),
        None => content.trim(),
    }
}

/// Missing fields become `""`, 1 and 0. Non-objects, and entries with
/// neither a description nor a price, are dropped.
fn coerce_item(value: &Value) -> Option<LineItem> {
    let object: &Map<String, Value> = value.as_object()?;

    let description = object
        .get("description")
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_string();
    let quantity = object.get("quantity").map(quantity_value).unwrap_or(1);
    let unit_price = object
        .get("unitPrice")
        .and_then(decimal_value)
        .unwrap_or(Decimal::ZERO);

    if description.is_empty() && unit_price.is_zero() {
        return None;
    }

    Some(LineItem::new(description, quantity, unit_price))
}

/// Whole quantity between one and [`MAX_QUANTITY`]; floats are rounded.
fn quantity_value(value: &Value) -> u32 {
    let quantity = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };

    match quantity {
        Some(q) if q.is_finite() && q >= 1.0 => {
            let rounded = q.round();
            if rounded >= f64::from(MAX_QUANTITY) {
                MAX_QUANTITY
            } else {
                rounded as u32
            }
        }
        _ => 1,
    }
}

/// Numbers, or numeric strings such as `"$1,500"`, within the price range.
fn decimal_value(value: &Value) -> Option<Decimal> {
    let amount = match value {
        Value::Number(n) => match n.as_i64() {
            Some(i) => Some(Decimal::from(i)),
            None => n.as_f64().and_then(|f| Decimal::try_from(f).ok()),
        },
        Value::String(s) => parse_price(s.trim_end_matches('%')),
        _ => None,
    }?;

    within_price_range(amount).then(|| amount.round_dp(2).normalize())
}

fn coerce_client(value: Option<&Value>) -> ExtractedParty {
    let mut client = ExtractedParty::placeholder(PartyRole::Client);
    let Some(object) = value.and_then(Value::as_object) else {
        return client;
    };

    let field = |key: &str| {
        object
            .get(key)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|v| !v.is_empty())
            .map(str::to_string)
    };

    if let Some(name) = field("name") {
        client.name = name;
    }
    if let Some(email) = field("email") {
        client.email = email;
    }
    if let Some(address) = field("address") {
        client.address = address;
    }
    client
}

/// `YYYY-MM-DD` only; anything else becomes today plus 30 days.
fn coerce_due_date(value: Option<&Value>, today: NaiveDate) -> Option<NaiveDate> {
    let raw = match value {
        None | Some(Value::Null) => return None,
        Some(Value::String(s)) if s.trim().is_empty() => return None,
        Some(Value::String(s)) => s.trim(),
        Some(other) => {
            warn!(value = %other, "Remote due date is not a string, using default");
            return today.checked_add_days(Days::new(INVALID_DUE_DATE_DAYS));
        }
    };

    match iso_date(raw) {
        Ok(date) => Some(date),
        Err(err) => {
            warn!(error = %err, "Remote due date is not YYYY-MM-DD, using default");
            today.checked_add_days(Days::new(INVALID_DUE_DATE_DAYS))
        }
    }
}

fn iso_date(raw: &str) -> StdResult<NaiveDate, ExtractionError> {
    ISO_DATE
        .is_match(raw)
        .then(|| NaiveDate::parse_from_str(raw, "%Y-%m-%d").ok())
        .flatten()
        .ok_or_else(|| ExtractionError::InvalidDate(raw.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tally_completion::{CompletionError, CompletionResponse};

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2025, 4, 10).unwrap()
    }

    /// Returns the same content for every request.
    struct CannedBackend(String);

    #[async_trait]
    impl CompletionBackend for CannedBackend {
        async fn complete(
            &self,
            request: &CompletionRequest,
        ) -> tally_completion::Result<CompletionResponse> {
            assert!(request.json_output);
            Ok(CompletionResponse {
                content: self.0.clone(),
                model: "canned".to_string(),
            })
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    struct FailingBackend;

    #[async_trait]
    impl CompletionBackend for FailingBackend {
        async fn complete(
            &self,
            _request: &CompletionRequest,
        ) -> tally_completion::Result<CompletionResponse> {
            Err(CompletionError::MissingCredentials("TALLY_API_KEY".to_string()))
        }

        fn model(&self) -> &str {
            "failing"
        }
    }

    const FULL_RESPONSE: &str = r#"{
        "client": {"name": "Acme Corp", "email": "billing@acme.com", "address": ""},
        "items": [
            {"description": "Website design", "quantity": 1, "unitPrice": 1500},
            {"description": "Content creation", "quantity": 2.6, "unitPrice": "$250.00"}
        ],
        "taxRate": 8,
        "dueDate": "2025-04-24",
        "notes": "Thanks!"
    }"#;

    #[tokio::test]
    async fn test_full_response() {
        let backend = RemoteBackend::new(Arc::new(CannedBackend(FULL_RESPONSE.to_string())), today());
        let result = backend.extract("anything").await.unwrap();

        assert_eq!(result.provider, ProviderId::Remote);
        assert_eq!(result.client_info.name, "Acme Corp");
        assert!(!result.client_info.has_address());
        assert_eq!(result.items.len(), 2);
        assert_eq!(result.items[1].quantity(), 3);
        assert_eq!(result.items[1].amount(), Decimal::from(750));
        assert_eq!(result.tax_rate, Decimal::from(8));
        assert_eq!(result.due_date, NaiveDate::from_ymd_opt(2025, 4, 24));
        assert_eq!(result.notes.as_deref(), Some("Thanks!"));
        assert!((result.confidence - 1.0).abs() < 1e-6);
    }

    #[tokio::test]
    async fn test_completion_error_propagates() {
        let backend = RemoteBackend::new(Arc::new(FailingBackend), today());
        let err = backend.extract("Logo for $300").await.unwrap_err();
        assert!(matches!(err, ExtractionError::Completion(_)));
    }

    #[test]
    fn test_code_fence_unwrapped() {
        let content = "```json\n{\"items\": [{\"description\": \"Logo\", \"quantity\": 1, \"unitPrice\": 300}]}\n```";
        let result = parse_response(content, "", today()).unwrap();
        assert_eq!(result.items[0].description, "Logo");
        assert_eq!(result.tax_rate, DEFAULT_TAX_RATE);
        assert_eq!(result.due_date, None);
    }

    #[test]
    fn test_malformed_shapes() {
        for content in ["not json", "[1, 2]", "{\"client\": {}}", "{\"items\": {\"a\": 1}}"] {
            let err = parse_response(content, "", today()).unwrap_err();
            assert!(matches!(err, ExtractionError::MalformedResponse(_)), "{}", content);
        }
    }

    #[test]
    fn test_empty_items_is_no_items() {
        let err = parse_response("{\"items\": []}", "", today()).unwrap_err();
        assert!(matches!(err, ExtractionError::NoItems));
    }

    #[test]
    fn test_unusable_items_get_default() {
        let content = r#"{"items": [42, {"quantity": 3}, {"description": "", "unitPrice": 0}]}"#;
        let result = parse_response(content, "about $75 of work", today()).unwrap();

        assert_eq!(result.items.len(), 1);
        assert_eq!(result.items[0].description, REMOTE_DEFAULT_DESCRIPTION);
        assert_eq!(result.items[0].unit_price(), Decimal::from(75));
    }

    #[test]
    fn test_missing_item_fields_coerced() {
        let result = parse_response("{\"items\": [{\"unitPrice\": 40}]}", "", today()).unwrap();
        assert_eq!(result.items[0].description, "");
        assert_eq!(result.items[0].quantity(), 1);
        assert_eq!(result.items[0].amount(), Decimal::from(40));
    }

    #[test]
    fn test_out_of_range_numbers_bounded() {
        let content = r#"{
            "items": [
                {"description": "Banners", "quantity": 1e12, "unitPrice": 5000000000000},
                {"description": "Posters", "quantity": "4294967296", "unitPrice": 1e30}
            ],
            "taxRate": 1e20
        }"#;
        let result = parse_response(content, "", today()).unwrap();

        assert_eq!(result.items[0].quantity(), MAX_QUANTITY);
        assert_eq!(result.items[0].unit_price(), Decimal::ZERO);
        assert_eq!(result.items[1].quantity(), MAX_QUANTITY);
        assert_eq!(result.items[1].amount(), Decimal::ZERO);
        assert_eq!(result.tax_rate, DEFAULT_TAX_RATE);
    }

    #[test]
    fn test_invalid_due_date_replaced() {
        let content = "{\"items\": [{\"description\": \"Logo\", \"quantity\": 1, \"unitPrice\": 300}], \"dueDate\": \"24/04/2025\"}";
        let result = parse_response(content, "", today()).unwrap();
        assert_eq!(result.due_date, NaiveDate::from_ymd_opt(2025, 5, 10));

        assert_eq!(iso_date("2025-04-24").ok(), NaiveDate::from_ymd_opt(2025, 4, 24));
        for raw in ["24/04/2025", "2025-02-30", "next week"] {
            assert!(matches!(iso_date(raw), Err(ExtractionError::InvalidDate(ref s)) if s == raw));
        }
    }

    #[test]
    fn test_prompt_carries_today_and_text() {
        let prompt = user_prompt("Logo for $300", today());
        assert!(prompt.contains("2025-04-10"));
        assert!(prompt.ends_with("Logo for $300"));
        assert!(SYSTEM_PROMPT.contains("unitPrice"));
        assert!(SYSTEM_PROMPT.contains("YYYY-MM-DD"));
    }
}
