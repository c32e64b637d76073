//! Turning an extraction result into an invoice.

use chrono::{Days, Local, NaiveDate, Weekday};
use tracing::debug;
use uuid::Uuid;

use crate::extraction::rules::patterns::RECURRING_LABEL;
use crate::extraction::rules::recurring::day_name;
use crate::extraction::rules::DEFAULT_NOTES;
use crate::models::extraction::{ExtractedParty, ExtractionResult, InvoiceOverrides, PartyRole};
use crate::models::invoice::{Invoice, LineItem, PartyDetails};

/// Days until payment when the extraction resolved no due date.
pub const DEFAULT_DUE_DAYS: u32 = 30;

/// Builds invoices dated `today`.
#[derive(Debug, Clone)]
pub struct InvoiceAssembler {
    today: NaiveDate,
    default_due_days: u32,
}

impl InvoiceAssembler {
    pub fn new(today: NaiveDate) -> Self {
        Self {
            today,
            default_due_days: DEFAULT_DUE_DAYS,
        }
    }

    pub fn with_default_due_days(mut self, days: u32) -> Self {
        self.default_due_days = days;
        self
    }

    /// Assemble an invoice. Overrides win over extracted parties.
    pub fn assemble(&self, extraction: &ExtractionResult, overrides: &InvoiceOverrides) -> Invoice {
        let items = extraction.items.iter().map(normalise_item).collect();

        let mut invoice = Invoice::new(
            invoice_number(self.today),
            self.today,
            self.due_date(extraction),
            items,
            extraction.tax_rate,
        );

        invoice.client = party(&extraction.client_info);
        invoice.company = party(
            extraction
                .company_info
                .as_ref()
                .unwrap_or(&ExtractedParty::placeholder(PartyRole::Company)),
        );
        overrides.apply_to_invoice_parties(&mut invoice.client, &mut invoice.company);

        invoice.notes = extraction
            .notes
            .clone()
            .unwrap_or_else(|| DEFAULT_NOTES.to_string());

        debug!(
            number = %invoice.invoice_number,
            items = invoice.line_items().len(),
            total = %invoice.total(),
            "Invoice assembled"
        );
        invoice
    }

    fn due_date(&self, extraction: &ExtractionResult) -> NaiveDate {
        if let Some(date) = extraction.due_date {
            return date;
        }
        let days = extraction.due_days.unwrap_or(self.default_due_days);
        self.today
            .checked_add_days(Days::new(u64::from(days)))
            .unwrap_or(self.today)
    }
}

impl Default for InvoiceAssembler {
    fn default() -> Self {
        Self::new(Local::now().date_naive())
    }
}

/// Assemble with today's local date.
pub fn assemble_invoice(extraction: &ExtractionResult, overrides: &InvoiceOverrides) -> Invoice {
    InvoiceAssembler::default().assemble(extraction, overrides)
}

/// `INV-YYYYMMDD-NNN` with a random three-digit suffix.
pub fn invoice_number(date: NaiveDate) -> String {
    let suffix = Uuid::new_v4().as_u128() % 1000;
    format!("INV-{}-{:03}", date.format("%Y%m%d"), suffix)
}

fn party(extracted: &ExtractedParty) -> PartyDetails {
    PartyDetails {
        name: extracted.name.clone(),
        email: extracted.email.clone(),
        address: extracted.address.clone(),
        ..Default::default()
    }
}

/// Collapse enriched delivery lines back to "<Day> <Publication> Delivery".
fn normalise_item(item: &LineItem) -> LineItem {
    let Some(caps) = RECURRING_LABEL.captures(&item.description) else {
        return item.clone();
    };

    let weekday = caps[1].parse::<Weekday>().ok();
    let publication = caps[2].trim();
    match weekday {
        Some(day) if !publication.is_empty() => {
            let mut item = item.clone();
            item.description = format!("{} {} Delivery", day_name(day), publication);
            item
        }
        _ => item.clone(),
    }
}
