//! Common regex patterns for work-description extraction.

use lazy_static::lazy_static;
use regex::Regex;

/// `$1500`, `$1,500.00`, `$ 75.5`; group 1 is the number.
const PRICE: &str = r"\$\s?(\d{1,3}(?:,\d{3})+(?:\.\d{1,2})?|\d+(?:\.\d{1,2})?)";

/// Full weekday names; group is the day.
const DAY: &str = r"(sunday|monday|tuesday|wednesday|thursday|friday|saturday)";

/// Numeric date token with `/`, `-` or `.` separators.
const NUMERIC_DATE_TOKEN: &str = r"\d{1,4}[/\-.]\d{1,2}[/\-.]\d{1,4}";

const MONTH: &str = r"(jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)";

const EMAIL_ADDRESS: &str = r"[a-zA-Z0-9._%+-]+@[a-zA-Z0-9.-]+\.[a-zA-Z]{2,}";

lazy_static! {
    // Prices
    pub static ref PRICE_TOKEN: Regex = Regex::new(PRICE).unwrap();

    // Relative due dates
    pub static ref DUE_IN: Regex = Regex::new(
        r"(?i)\b(?:due|payable|payment|pay)\s+(?:in|within)\s+(\d{1,4})\s*(days?|weeks?|months?)\b"
    ).unwrap();

    pub static ref NET_TERMS: Regex = Regex::new(
        r"(?i)\bnet\s*-?\s*(\d{1,3})\b"
    ).unwrap();

    pub static ref PAYMENT_TERMS: Regex = Regex::new(
        r"(?i)\bpayment\s+terms?\s*(?:of|are|is|:)?\s*(\d{1,3})\b"
    ).unwrap();

    // Absolute due date triggers; the date follows the match
    pub static ref DUE_TRIGGER: Regex = Regex::new(
        r"(?i)\b(?:due\s+on|due\s+by|due\s+date(?:\s+is)?|payment\s+(?:is\s+)?due(?:\s+(?:on|by))?|to\s+be\s+paid\s+by|pay\s+by|payable\s+by|deadline(?:\s+is)?)\b"
    ).unwrap();

    pub static ref TRIGGER_FILLER: Regex = Regex::new(
        r"(?i)^[\s:,]*(?:(?:on|the|of)\s+)*"
    ).unwrap();

    // Date tokens
    pub static ref NUMERIC_DATE: Regex = Regex::new(
        r"\b(\d{1,4})[/\-.](\d{1,2})[/\-.](\d{1,4})\b"
    ).unwrap();

    pub static ref MONTH_DAY_DATE: Regex = Regex::new(&format!(
        r"(?i)\b{MONTH}\.?\s+(\d{{1,2}})(?:st|nd|rd|th)?(?:,?\s+(\d{{4}}))?\b"
    )).unwrap();

    pub static ref DAY_MONTH_DATE: Regex = Regex::new(&format!(
        r"(?i)\b(\d{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?{MONTH}\.?(?:,?\s+(\d{{4}}))?\b"
    )).unwrap();

    // Recurring deliveries
    pub static ref DATE_RANGE: Regex = Regex::new(&format!(
        r"(?i)({NUMERIC_DATE_TOKEN})\s*(?:-|–|—|to|until|through|thru)\s*({NUMERIC_DATE_TOKEN})"
    )).unwrap();

    /// "$2.50 on Sundays"
    pub static ref PRICE_ON_WEEKDAY: Regex = Regex::new(&format!(
        r"(?i){PRICE}\s*(?:each\s+|per\s+(?:paper|copy|issue|edition)\s+)?(?:on|for|every)\s+{DAY}s?\b"
    )).unwrap();

    /// "Sunday is $2.50", "Saturdays cost $3"
    pub static ref WEEKDAY_COSTS_PRICE: Regex = Regex::new(&format!(
        r"(?i)\b{DAY}s?(?:'s)?\s*(?:papers?\s+|editions?\s+|deliver(?:y|ies)\s+)?(?:\s(?:is|are|costs?|at)|:|=)\s*{PRICE}"
    )).unwrap();

    /// Capitalised words right before "newspaper"/"paper".
    pub static ref PUBLICATION: Regex = Regex::new(
        r"((?:[A-Z][A-Za-z'&]*\s+)*[A-Z][A-Za-z'&]*)\s+(?i:newspapers?|papers?)\b"
    ).unwrap();

    // Generic line items
    /// "$1500 for website design"
    pub static ref PRICE_FOR_DESCRIPTION: Regex = Regex::new(&format!(
        r"{PRICE}\s+(?i:for|on)\s+([A-Za-z][^,.;\n$]*)"
    )).unwrap();

    /// "Website design for $1500", "Hosting: $20", "Logo costs $350"
    pub static ref DESCRIPTION_FOR_PRICE: Regex = Regex::new(&format!(
        r"([A-Za-z][^,.;:\n$]*?)\s*(?:\b(?i:for|at|costs?|is|was|totals?)\b|:)\s*{PRICE}"
    )).unwrap();

    /// "Logo design - $350", "Hosting – $20"
    pub static ref DESCRIPTION_DASH_PRICE: Regex = Regex::new(&format!(
        r"([A-Za-z][^,.;:\n$–—\-]*?)\s*[–—\-]\s*{PRICE}"
    )).unwrap();

    // Quantity-aware line items
    /// "10 hours of consulting at $120 per hour"
    pub static ref HOURS_OF: Regex = Regex::new(&format!(
        r"(?i)\b(\d{{1,5}})\s*(?:hours?|hrs?)\s+of\s+([a-z][^,.;\n$]*?)\s+(?:at|for|@)\s*{PRICE}(?:\s*(?:per|/|an?|each)\s*(?:hour|hr))?"
    )).unwrap();

    /// "5 banners at $40 each"
    pub static ref UNITS_AT: Regex = Regex::new(&format!(
        r"(?i)\b(\d{{1,5}})\s+([a-z][^,.;\n$\d]*?)\s+(?:at|for|@)\s*{PRICE}(?:\s*(?:each|apiece|per\s+[a-z]+|/\s*[a-z]+))?"
    )).unwrap();

    // Tax
    pub static ref TAX_WITH_VERB: Regex = Regex::new(
        r"(?i)\b(?:apply|applying|add|adding|with|include|including|plus|charge|charging)\s+(?:an?\s+|the\s+)?(\d{1,2}(?:\.\d{1,3})?)\s*%\s*(?:sales\s+tax|tax|gst|vat)\b"
    ).unwrap();

    pub static ref TAX_PERCENT: Regex = Regex::new(
        r"(?i)\b(\d{1,2}(?:\.\d{1,3})?)\s*%\s*(?:sales\s+tax|tax|gst|vat)\b"
    ).unwrap();

    pub static ref TAX_RATE_OF: Regex = Regex::new(
        r"(?i)\b(?:sales\s+tax|tax|gst|vat)(?:\s+rate)?\s*(?:of|is|at|:|=)\s*(\d{1,2}(?:\.\d{1,3})?)\s*%"
    ).unwrap();

    pub static ref TAX_FREE: Regex = Regex::new(
        r"(?i)\b(?:no|without|zero|exempt\s+from)\s+(?:sales\s+)?(?:tax|gst|vat)\b|\b(?:tax|gst|vat)[\s\-](?:free|exempt)\b"
    ).unwrap();

    // Notes
    pub static ref NOTES_LABEL: Regex = Regex::new(
        r"(?i)\b(?:notes?|message|comments?|memo)\s*:\s*([^\n]+)"
    ).unwrap();

    pub static ref PLEASE_ADD_NOTE: Regex = Regex::new(
        r#"(?i)\bplease\s+(?:add|include|put)\s+(?:a\s+|the\s+|this\s+)?(?:notes?|message|comment)\s*(?:saying|that\s+says|stating|reading|:)?\s*["“]?([^"”\n]+?)(?:["”]|\.\s|\.?\s*$|\n)"#
    ).unwrap();

    pub static ref QUOTED_NOTE: Regex = Regex::new(
        r#"(?i)\b(?:should|to|must)\s+(?:say|read|be)\s*:?\s*["“']([^"”'\n]+)["”']"#
    ).unwrap();

    pub static ref PAYMENT_INSTRUCTIONS: Regex = Regex::new(
        r"(?i)\bpayment\s+instructions?\s*:\s*([^\n]+)"
    ).unwrap();

    pub static ref PAY_VIA: Regex = Regex::new(
        r"(?i)\b(pay(?:ment)?\s+(?:via|using|through|with|by\s+(?:bank|direct|card|credit|cheque|check|paypal|transfer|eft|wire))[^.\n;]*)"
    ).unwrap();

    // Parties
    pub static ref EMAIL: Regex = Regex::new(EMAIL_ADDRESS).unwrap();

    /// "Invoice for Acme Corp (billing@acme.com) at 1 Main St"
    pub static ref CLIENT_COMPOUND: Regex = Regex::new(&format!(
        r"\b(?i:for|to|client|customer|bill\s+to)\s*:?\s+([A-Z][^()\n]*?)\s*\(\s*({EMAIL_ADDRESS})\s*\)\s*,?\s*(?i:(?:located|based)\s+at|at|address\s*:?)\s+([^.\n;]+)"
    )).unwrap();

    /// "from Studio Nine (hello@studio9.com) at 4 King St"
    pub static ref COMPANY_COMPOUND: Regex = Regex::new(&format!(
        r"\b(?i:from|company\s*:?|business\s*:?)\s+([A-Z][^()\n]*?)\s*\(\s*({EMAIL_ADDRESS})\s*\)\s*,?\s*(?i:(?:located|based)\s+at|at|address\s*:?)\s+([^.\n;]+)"
    )).unwrap();

    /// Trailing clause an open name capture runs into: "Acme at 1 Main St".
    pub static ref NAME_CUT: Regex = Regex::new(
        r"(?i)\s(?:(?:at|who|located|based)\s|email)"
    ).unwrap();

    pub static ref CLIENT_NAME_LABEL: Regex = Regex::new(
        r"(?i)\b(?:client|customer)(?:'s)?\s+name\s*(?:is|:|=)\s*([^,.;\n(]+)"
    ).unwrap();

    pub static ref CLIENT_LABEL: Regex = Regex::new(
        r"(?i)\b(?:client|customer|bill\s+to|billed\s+to)\s*:\s*([^,.;\n(]+)"
    ).unwrap();

    pub static ref INVOICE_FOR: Regex = Regex::new(
        r"\b(?i:invoice|bill)\s+(?i:for|to)\s+([A-Z][^,.;\n(]*?)(?:\s+(?i:for|at|with|due|regarding|re)\b|\s*[,.;\n(]|$)"
    ).unwrap();

    pub static ref FOR_CAPITALISED: Regex = Regex::new(
        r"\b(?i:for|to)\s+([A-Z][\w&'\-]*(?:\s+[A-Z][\w&'\-]*)*)"
    ).unwrap();

    pub static ref COMPANY_NAME_LABEL: Regex = Regex::new(
        r"(?i)\b(?:company|business)(?:'s)?(?:\s+name)?\s*(?:is|:|=)\s*([^,.;\n(]+)"
    ).unwrap();

    pub static ref FROM_CAPITALISED: Regex = Regex::new(
        r"\b(?i:from)\s+([A-Z][\w&'\-]*(?:\s+[A-Z][\w&'\-]*)*)"
    ).unwrap();

    pub static ref COMPANY_EMAIL_LABEL: Regex = Regex::new(&format!(
        r"(?i)\b(?:my|our|company|business)\s+email(?:\s+address)?\s*(?:is|:)?\s*({EMAIL_ADDRESS})"
    )).unwrap();

    pub static ref ADDRESS_LABEL: Regex = Regex::new(
        r"(?i)\baddress\s*(?:is|:|=)\s*([^.\n;]+)"
    ).unwrap();

    pub static ref COMPANY_ADDRESS_LABEL: Regex = Regex::new(
        r"(?i)\b(?:company|business|our|my)(?:'s)?\s+address\s*(?:is|:|=)\s*([^.\n;]+)"
    ).unwrap();

    pub static ref LOCATED_AT: Regex = Regex::new(
        r"(?i)\b(?:located|based)\s+(?:at|in)\s+([^.\n;]+)"
    ).unwrap();

    /// "at 12 Baker Street" (street number first, so prices never match)
    pub static ref AT_STREET: Regex = Regex::new(
        r"\b(?i:at)\s+(\d+[A-Za-z]?\s+[A-Z][^.\n;]*)"
    ).unwrap();

    pub static ref FROM_AT_STREET: Regex = Regex::new(
        r"\b(?i:from)\s+[A-Z][^\n(.]*?\s+(?i:at)\s+(\d+[A-Za-z]?\s+[A-Z][^.\n;]*)"
    ).unwrap();

    // Assembly
    /// "Tuesday Herald Delivery (Daily Home Delivery Service)"
    pub static ref RECURRING_LABEL: Regex = Regex::new(&format!(
        r"(?i)^\s*{DAY}\s+(.+?)\s+delivery\b"
    )).unwrap();

    /// Remote contract date format.
    pub static ref ISO_DATE: Regex = Regex::new(
        r"^\d{4}-\d{2}-\d{2}$"
    ).unwrap();

    /// Markdown code fence around model output.
    pub static ref CODE_FENCE: Regex = Regex::new(
        r"(?s)^\s*```[A-Za-z]*\s*(.*?)\s*```\s*$"
    ).unwrap();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn price_token_accepts_separators() {
        let caps = PRICE_TOKEN.captures("costs $1,500.00 total").unwrap();
        assert_eq!(&caps[1], "1,500.00");

        let caps = PRICE_TOKEN.captures("only $ 75").unwrap();
        assert_eq!(&caps[1], "75");
    }

    #[test]
    fn compound_pattern_splits_name_email_address() {
        let text = "Invoice for Acme Corp (billing@acme.com) at 1 Main St. Logo design for $350.";
        let caps = CLIENT_COMPOUND.captures(text).unwrap();
        assert_eq!(&caps[1], "Acme Corp");
        assert_eq!(&caps[2], "billing@acme.com");
        assert_eq!(caps[3].trim(), "1 Main St");
    }

    #[test]
    fn invoice_for_requires_capitalised_name() {
        assert!(INVOICE_FOR.captures("invoice for website design").is_none());
        let caps = INVOICE_FOR.captures("Invoice for Blue Fern Studio for branding").unwrap();
        assert_eq!(&caps[1], "Blue Fern Studio");
    }

    #[test]
    fn at_street_ignores_prices() {
        assert!(AT_STREET.captures("5 banners at $40 each").is_none());
        let caps = AT_STREET.captures("delivered at 22 Baker Street, London").unwrap();
        assert_eq!(&caps[1], "22 Baker Street, London");
    }

    #[test]
    fn weekday_price_forms() {
        let caps = PRICE_ON_WEEKDAY.captures("$2.50 on Sundays").unwrap();
        assert_eq!(&caps[1], "2.50");
        assert_eq!(caps[2].to_lowercase(), "sunday");

        let caps = WEEKDAY_COSTS_PRICE.captures("Tuesday is $1.80").unwrap();
        assert_eq!(caps[1].to_lowercase(), "tuesday");
        assert_eq!(&caps[2], "1.80");
    }

    #[test]
    fn name_cut_ignores_case() {
        assert_eq!(NAME_CUT.find("Acme Corp AT 1 Main St").map(|m| m.start()), Some(9));
        assert_eq!(NAME_CUT.find("Jo Email: jo@x.com").map(|m| m.start()), Some(2));
        assert!(NAME_CUT.find("Atlas Whole Foods").is_none());
    }

    #[test]
    fn code_fence_is_stripped() {
        let caps = CODE_FENCE.captures("```json\n{\"a\": 1}\n```").unwrap();
        assert_eq!(&caps[1], "{\"a\": 1}");
    }
}
