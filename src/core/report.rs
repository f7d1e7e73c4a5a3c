//! Quote summaries for display.
//!
//! Turns a quote into plain structured lines (numbered rows, VAT breakdown,
//! totals) plus an invoicing progress view. Nothing here touches the
//! calculator; it only reads what the quote already derived.

use crate::{
    core::{
        invoice::Invoice,
        line_item::{LineItem, LineKind},
        money::format_euro,
        quote::{Quote, QuoteStatus},
        store,
    },
    errors::{Error, Result},
};
use rust_decimal::{Decimal, prelude::ToPrimitive};
use sea_orm::DatabaseConnection;

/// One printable row of a quote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportLine {
    /// Hierarchical number (`"1"`, `"1.2"`), `None` for text rows
    pub number: Option<String>,
    /// Row tag, see [`crate::core::line_item::LineKind::tag`]
    pub kind: &'static str,
    /// Heading, row title, or text body
    pub label: String,
    /// `"12 m²"` for billable rows
    pub quantity: Option<String>,
    /// Price per unit for billable rows
    pub unit_price: Option<Decimal>,
    /// Line total for billable rows, subtotal for headings
    pub amount: Option<Decimal>,
}

/// Display data of a quote.
#[derive(Debug, Clone)]
pub struct QuoteReport {
    /// Quote number
    pub number: String,
    /// Lifecycle status
    pub status: QuoteStatus,
    /// Every displayable row, unknown kinds left out
    pub lines: Vec<ReportLine>,
    /// `"TVA 20 %"` with base and tax, one per rate
    pub vat_lines: Vec<(String, Decimal, Decimal)>,
    /// Total before tax
    pub total_excl_tax: Decimal,
    /// Total tax
    pub total_tax: Decimal,
    /// Total including tax
    pub total_incl_tax: Decimal,
    /// Deposit requested
    pub deposit_amount: Decimal,
    /// Invoiced share of the quote, 0-100
    pub billed_percent: Decimal,
}

/// Builds the report of a quote given the invoices issued against it.
#[must_use]
pub fn build_report(quote: &Quote, invoices: &[Invoice]) -> QuoteReport {
    let numbers = quote.display_numbers();
    let lines = quote
        .line_items()
        .iter()
        .zip(numbers)
        .filter(|(item, _)| !matches!(item.kind, LineKind::Unknown))
        .map(|(item, number)| report_line(item, number))
        .collect();

    let vat_lines = quote
        .totals()
        .vat_breakdown
        .iter()
        .map(|bucket| {
            (
                format!("TVA {} %", bucket.rate_percent.normalize()),
                bucket.base_excl_tax,
                bucket.tax,
            )
        })
        .collect();

    let billed: Decimal = invoices.iter().map(|inv| inv.total_incl_tax).sum();

    QuoteReport {
        number: quote.number.clone(),
        status: quote.status(),
        lines,
        vat_lines,
        total_excl_tax: quote.total_excl_tax(),
        total_tax: quote.total_tax(),
        total_incl_tax: quote.total_incl_tax(),
        deposit_amount: quote.deposit_amount(),
        billed_percent: calculate_billed_percent(billed, quote.total_incl_tax()),
    }
}

/// Loads a stored quote with its invoices and builds its report.
///
/// # Errors
/// Returns `Error::QuoteNotFound` if there is no such quote.
pub async fn generate_quote_report(
    db: &DatabaseConnection,
    quote_id: i64,
) -> Result<QuoteReport> {
    let quote = store::load_quote(db, quote_id)
        .await?
        .ok_or(Error::QuoteNotFound { id: quote_id })?;
    let invoices = store::invoices_for_quote(db, quote_id).await?;
    Ok(build_report(&quote, &invoices))
}

fn report_line(item: &LineItem, number: Option<String>) -> ReportLine {
    let billable = item.billable();
    ReportLine {
        number,
        kind: item.kind.tag(),
        label: item.label().to_string(),
        quantity: billable.map(|line| {
            format!("{} {}", line.quantity.normalize(), line.unit)
                .trim_end()
                .to_string()
        }),
        unit_price: billable.map(|line| line.unit_price),
        amount: billable
            .map(|line| line.line_total_excl_tax)
            .or_else(|| item.heading().map(|h| h.section_subtotal)),
    }
}

/// Share of `total` already billed, in percent, rounded to one decimal.
///
/// Returns 0 for an empty quote.
#[must_use]
pub fn calculate_billed_percent(billed: Decimal, total: Decimal) -> Decimal {
    if total.is_zero() {
        return Decimal::ZERO;
    }
    (billed / total * Decimal::ONE_HUNDRED).round_dp(1)
}

/// Text progress bar like `[████████░░] 80.0%`.
#[must_use]
pub fn format_progress_bar(percent: Decimal, bar_length: Option<usize>) -> String {
    let length = bar_length.unwrap_or(10);
    let clamped = percent.clamp(Decimal::ZERO, Decimal::ONE_HUNDRED);
    let filled = (clamped * Decimal::from(length) / Decimal::ONE_HUNDRED)
        .round()
        .to_usize()
        .unwrap_or(0)
        .min(length);
    let empty = length - filled;

    format!(
        "[{}{}] {:.1}%",
        "█".repeat(filled),
        "░".repeat(empty),
        percent
    )
}

/// One text line per row, indented by level.
#[must_use]
pub fn format_report_line(line: &ReportLine) -> String {
    let number = line.number.as_deref().unwrap_or("");
    let indent = match line.kind {
        "title" => "",
        "subtitle" => "  ",
        _ => "    ",
    };
    let amount = line.amount.map(format_euro).unwrap_or_default();

    match (&line.quantity, line.unit_price) {
        (Some(quantity), Some(unit_price)) => format!(
            "{indent}{number} {} | {quantity} x {} | {amount}",
            line.label,
            format_euro(unit_price)
        ),
        _ if line.amount.is_some() => format!("{indent}{number} {} | {amount}", line.label),
        _ => format!("{indent}{}", line.label),
    }
}
