//! Invoice data model with derived totals.

use chrono::NaiveDate;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use crate::error::InvoiceError;

/// A single priced line on an invoice.
///
/// `amount` is always `quantity * unit_price`, saturating at `Decimal::MAX`;
/// it is recomputed on every change and on deserialization.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "LineItemRecord")]
pub struct LineItem {
    /// Product/service description.
    pub description: String,
    quantity: u32,
    unit_price: Decimal,
    amount: Decimal,
}

#[derive(Deserialize)]
struct LineItemRecord {
    description: String,
    quantity: u32,
    unit_price: Decimal,
}

impl From<LineItemRecord> for LineItem {
    fn from(record: LineItemRecord) -> Self {
        LineItem::new(record.description, record.quantity, record.unit_price)
    }
}

impl LineItem {
    /// Create a line item, clamping quantity to at least 1 and price to at least 0.
    pub fn new(description: impl Into<String>, quantity: u32, unit_price: Decimal) -> Self {
        let quantity = quantity.max(1);
        let unit_price = unit_price.max(Decimal::ZERO);
        Self {
            description: description.into(),
            quantity,
            unit_price,
            amount: line_amount(quantity, unit_price),
        }
    }

    /// Create a line item from user input, rejecting out-of-range values.
    pub fn try_new(
        description: impl Into<String>,
        quantity: u32,
        unit_price: Decimal,
    ) -> Result<Self, InvoiceError> {
        if quantity == 0 {
            return Err(InvoiceError::InvalidQuantity(quantity));
        }
        if unit_price.is_sign_negative() && !unit_price.is_zero() {
            return Err(InvoiceError::NegativePrice(unit_price));
        }
        Ok(Self::new(description, quantity, unit_price))
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit_price(&self) -> Decimal {
        self.unit_price
    }

    /// Line total (`quantity * unit_price`).
    pub fn amount(&self) -> Decimal {
        self.amount
    }

    pub fn set_quantity(&mut self, quantity: u32) -> Result<(), InvoiceError> {
        if quantity == 0 {
            return Err(InvoiceError::InvalidQuantity(quantity));
        }
        self.quantity = quantity;
        self.amount = line_amount(self.quantity, self.unit_price);
        Ok(())
    }

    pub fn set_unit_price(&mut self, unit_price: Decimal) -> Result<(), InvoiceError> {
        if unit_price.is_sign_negative() && !unit_price.is_zero() {
            return Err(InvoiceError::NegativePrice(unit_price));
        }
        self.unit_price = unit_price;
        self.amount = line_amount(self.quantity, self.unit_price);
        Ok(())
    }
}

fn line_amount(quantity: u32, unit_price: Decimal) -> Decimal {
    Decimal::from(quantity)
        .checked_mul(unit_price)
        .unwrap_or(Decimal::MAX)
}

/// Payment status of an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InvoiceStatus {
    #[default]
    Unpaid,
    Paid,
    Overdue,
}

/// Bank details printed on an invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BankDetails {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub account_number: Option<String>,
    /// BSB, sort code or routing number.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routing_code: Option<String>,
}

impl BankDetails {
    pub fn is_empty(&self) -> bool {
        self.bank_name.is_none()
            && self.account_name.is_none()
            && self.account_number.is_none()
            && self.routing_code.is_none()
    }
}

/// A party (client or issuing company) on the invoice.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PartyDetails {
    pub name: String,
    pub email: String,
    pub address: String,

    /// Tax registration number (ABN, EIN, VAT number...).
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub bank: Option<BankDetails>,
}

/// A complete invoice.
///
/// Subtotal, tax and total are derived from the line items and tax rate and
/// can only change through the editing methods.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "InvoiceRecord")]
pub struct Invoice {
    /// `INV-YYYYMMDD-NNN`.
    pub invoice_number: String,

    /// Issue date.
    pub date: NaiveDate,

    /// Payment due date.
    pub due_date: NaiveDate,

    /// Billed party.
    pub client: PartyDetails,

    /// Issuing business.
    pub company: PartyDetails,

    line_items: Vec<LineItem>,
    subtotal: Decimal,
    tax_rate: Decimal,
    tax_amount: Decimal,
    total: Decimal,

    pub notes: String,

    pub status: InvoiceStatus,

    /// Whether a payment reminder has gone out.
    pub reminder_sent: bool,
}

#[derive(Deserialize)]
struct InvoiceRecord {
    invoice_number: String,
    date: NaiveDate,
    due_date: NaiveDate,
    #[serde(default)]
    client: PartyDetails,
    #[serde(default)]
    company: PartyDetails,
    #[serde(default)]
    line_items: Vec<LineItem>,
    tax_rate: Decimal,
    #[serde(default)]
    notes: String,
    #[serde(default)]
    status: InvoiceStatus,
    #[serde(default)]
    reminder_sent: bool,
}

impl From<InvoiceRecord> for Invoice {
    fn from(record: InvoiceRecord) -> Self {
        let mut invoice = Invoice {
            invoice_number: record.invoice_number,
            date: record.date,
            due_date: record.due_date,
            client: record.client,
            company: record.company,
            line_items: record.line_items,
            subtotal: Decimal::ZERO,
            tax_rate: record.tax_rate.max(Decimal::ZERO),
            tax_amount: Decimal::ZERO,
            total: Decimal::ZERO,
            notes: record.notes,
            status: record.status,
            reminder_sent: record.reminder_sent,
        };
        invoice.recalculate();
        invoice
    }
}

impl Invoice {
    /// Create an unpaid invoice and derive its totals.
    pub fn new(
        invoice_number: impl Into<String>,
        date: NaiveDate,
        due_date: NaiveDate,
        line_items: Vec<LineItem>,
        tax_rate: Decimal,
    ) -> Self {
        let mut invoice = Invoice {
            invoice_number: invoice_number.into(),
            date,
            due_date,
            client: PartyDetails::default(),
            company: PartyDetails::default(),
            line_items,
            subtotal: Decimal::ZERO,
            tax_rate: tax_rate.max(Decimal::ZERO),
            tax_amount: Decimal::ZERO,
            total: Decimal::ZERO,
            notes: String::new(),
            status: InvoiceStatus::Unpaid,
            reminder_sent: false,
        };
        invoice.recalculate();
        invoice
    }

    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Sum of line item amounts.
    pub fn subtotal(&self) -> Decimal {
        self.subtotal
    }

    /// Tax rate as a percentage (8 means 8%).
    pub fn tax_rate(&self) -> Decimal {
        self.tax_rate
    }

    /// `subtotal * tax_rate / 100`.
    pub fn tax_amount(&self) -> Decimal {
        self.tax_amount
    }

    /// `subtotal + tax_amount`.
    pub fn total(&self) -> Decimal {
        self.total
    }

    pub fn add_line_item(&mut self, item: LineItem) {
        self.line_items.push(item);
        self.recalculate();
    }

    pub fn update_line_item(&mut self, index: usize, item: LineItem) -> Result<(), InvoiceError> {
        let len = self.line_items.len();
        let slot = self
            .line_items
            .get_mut(index)
            .ok_or(InvoiceError::LineItemOutOfRange { index, len })?;
        *slot = item;
        self.recalculate();
        Ok(())
    }

    pub fn remove_line_item(&mut self, index: usize) -> Result<LineItem, InvoiceError> {
        let len = self.line_items.len();
        if index >= len {
            return Err(InvoiceError::LineItemOutOfRange { index, len });
        }
        let removed = self.line_items.remove(index);
        self.recalculate();
        Ok(removed)
    }

    pub fn set_tax_rate(&mut self, tax_rate: Decimal) -> Result<(), InvoiceError> {
        if tax_rate.is_sign_negative() && !tax_rate.is_zero() {
            return Err(InvoiceError::NegativeTaxRate(tax_rate));
        }
        self.tax_rate = tax_rate;
        self.recalculate();
        Ok(())
    }

    pub fn mark_paid(&mut self) {
        self.status = InvoiceStatus::Paid;
    }

    pub fn mark_reminder_sent(&mut self) {
        self.reminder_sent = true;
    }

    /// Flip an unpaid invoice to overdue once `today` is past its due date.
    pub fn refresh_status(&mut self, today: NaiveDate) -> InvoiceStatus {
        if self.status == InvoiceStatus::Unpaid && self.due_date < today {
            self.status = InvoiceStatus::Overdue;
        }
        self.status
    }

    /// Validate the invoice data and return any issues found.
    pub fn validate(&self) -> Vec<String> {
        let mut issues = Vec::new();

        if self.invoice_number.is_empty() {
            issues.push("Missing invoice number".to_string());
        }

        if self.client.name.trim().is_empty() || self.client.name == super::extraction::DEFAULT_CLIENT_NAME {
            issues.push("Client name was not provided".to_string());
        }

        if self.client.email == super::extraction::DEFAULT_CLIENT_EMAIL {
            issues.push("Client email was not provided".to_string());
        }

        if self.line_items.is_empty() {
            issues.push("No line items".to_string());
        }

        if self.total.is_zero() {
            issues.push("Total is zero".to_string());
        }

        if self.due_date < self.date {
            issues.push(format!(
                "Due date ({}) is before issue date ({})",
                self.due_date, self.date
            ));
        }

        issues
    }

    /// Totals saturate at `Decimal::MAX` instead of overflowing.
    fn recalculate(&mut self) {
        self.subtotal = self
            .line_items
            .iter()
            .map(LineItem::amount)
            .try_fold(Decimal::ZERO, |sum, amount| sum.checked_add(amount))
            .unwrap_or(Decimal::MAX);
        self.tax_amount = self
            .subtotal
            .checked_mul(self.tax_rate)
            .and_then(|tax| tax.checked_div(Decimal::ONE_HUNDRED))
            .unwrap_or(Decimal::MAX);
        self.total = self
            .subtotal
            .checked_add(self.tax_amount)
            .unwrap_or(Decimal::MAX);
    }
}

/// Format an amount in dollars with thousands separators ($1,234.56).
pub fn format_amount(amount: Decimal) -> String {
    let s = format!("{:.2}", amount.abs().round_dp(2));
    let (integer_part, decimal_part) = s.split_once('.').unwrap_or((s.as_str(), "00"));

    let chars: Vec<char> = integer_part.chars().collect();
    let mut formatted = String::new();

    for (i, c) in chars.iter().enumerate() {
        if i > 0 && (chars.len() - i) % 3 == 0 {
            formatted.push(',');
        }
        formatted.push(*c);
    }

    let sign = if amount.is_sign_negative() && !amount.is_zero() { "-" } else { "" };
    format!("{}${}.{}", sign, formatted, decimal_part)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn sample() -> Invoice {
        Invoice::new(
            "INV-20250401-042",
            date(2025, 4, 1),
            date(2025, 4, 15),
            vec![
                LineItem::new("Website design", 1, Decimal::from(1500)),
                LineItem::new("Content creation", 1, Decimal::from(500)),
            ],
            Decimal::from(8),
        )
    }

    #[test]
    fn test_line_item_amount_is_derived() {
        let mut item = LineItem::new("Consulting", 3, Decimal::new(12550, 2));
        assert_eq!(item.amount(), Decimal::new(37650, 2));

        item.set_quantity(4).unwrap();
        assert_eq!(item.amount(), Decimal::new(50200, 2));

        assert_eq!(item.set_quantity(0), Err(InvoiceError::InvalidQuantity(0)));
        assert_eq!(
            item.set_unit_price(Decimal::from(-1)),
            Err(InvoiceError::NegativePrice(Decimal::from(-1)))
        );
    }

    #[test]
    fn test_line_item_new_clamps() {
        let item = LineItem::new("Odd", 0, Decimal::from(-5));
        assert_eq!(item.quantity(), 1);
        assert_eq!(item.unit_price(), Decimal::ZERO);
    }

    #[test]
    fn test_overflowing_amounts_saturate() {
        let mut item = LineItem::new("Huge", u32::MAX, Decimal::MAX);
        assert_eq!(item.amount(), Decimal::MAX);
        item.set_quantity(1).unwrap();
        assert_eq!(item.amount(), Decimal::MAX);

        let invoice = Invoice::new(
            "INV-1",
            date(2025, 4, 1),
            date(2025, 5, 1),
            vec![item.clone(), item],
            Decimal::from(8),
        );
        assert_eq!(invoice.subtotal(), Decimal::MAX);
        assert_eq!(invoice.tax_amount(), Decimal::MAX);
        assert_eq!(invoice.total(), Decimal::MAX);
        assert_eq!(format_amount(invoice.total()).chars().next(), Some('$'));
    }

    #[test]
    fn test_totals() {
        let invoice = sample();
        assert_eq!(invoice.subtotal(), Decimal::from(2000));
        assert_eq!(invoice.tax_amount(), Decimal::from(160));
        assert_eq!(invoice.total(), Decimal::from(2160));
    }

    #[test]
    fn test_edits_rederive_totals() {
        let mut invoice = sample();

        invoice.add_line_item(LineItem::new("Hosting", 2, Decimal::from(50)));
        assert_eq!(invoice.subtotal(), Decimal::from(2100));

        invoice
            .update_line_item(0, LineItem::new("Website design", 1, Decimal::from(1000)))
            .unwrap();
        assert_eq!(invoice.subtotal(), Decimal::from(1600));

        let removed = invoice.remove_line_item(1).unwrap();
        assert_eq!(removed.description, "Content creation");
        assert_eq!(invoice.subtotal(), Decimal::from(1100));

        invoice.set_tax_rate(Decimal::from(10)).unwrap();
        assert_eq!(invoice.tax_amount(), Decimal::from(110));
        assert_eq!(invoice.total(), Decimal::from(1210));

        assert_eq!(
            invoice.remove_line_item(5),
            Err(InvoiceError::LineItemOutOfRange { index: 5, len: 2 })
        );
    }

    #[test]
    fn test_deserialize_ignores_stored_totals() {
        let json = r#"{
            "invoice_number": "INV-1",
            "date": "2025-04-01",
            "due_date": "2025-05-01",
            "line_items": [
                {"description": "Logo", "quantity": 2, "unit_price": "100", "amount": "999"}
            ],
            "subtotal": "1",
            "tax_rate": "10",
            "tax_amount": "1",
            "total": "1"
        }"#;

        let invoice: Invoice = serde_json::from_str(json).unwrap();
        assert_eq!(invoice.line_items()[0].amount(), Decimal::from(200));
        assert_eq!(invoice.subtotal(), Decimal::from(200));
        assert_eq!(invoice.tax_amount(), Decimal::from(20));
        assert_eq!(invoice.total(), Decimal::from(220));
        assert_eq!(invoice.status, InvoiceStatus::Unpaid);
    }

    #[test]
    fn test_refresh_status() {
        let mut invoice = sample();
        assert_eq!(invoice.refresh_status(date(2025, 4, 15)), InvoiceStatus::Unpaid);
        assert_eq!(invoice.refresh_status(date(2025, 4, 16)), InvoiceStatus::Overdue);

        let mut paid = sample();
        paid.mark_paid();
        assert_eq!(paid.refresh_status(date(2026, 1, 1)), InvoiceStatus::Paid);
    }

    #[test]
    fn test_validate_flags_sentinel_client() {
        let mut invoice = sample();
        invoice.client.name = "Client".to_string();
        invoice.client.email = "client@example.com".to_string();

        let issues = invoice.validate();
        assert!(issues.iter().any(|i| i.contains("Client name")));
        assert!(issues.iter().any(|i| i.contains("Client email")));
    }

    #[test]
    fn test_format_amount() {
        assert_eq!(format_amount(Decimal::new(123456, 2)), "$1,234.56");
        assert_eq!(format_amount(Decimal::from(2160)), "$2,160.00");
        assert_eq!(format_amount(Decimal::from(12345678)), "$12,345,678.00");
        assert_eq!(format_amount(Decimal::from(5)), "$5.00");
    }
}
