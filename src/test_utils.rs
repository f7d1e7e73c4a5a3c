//! Shared test utilities.
//!
//! This module provides common helper functions for setting up test databases
//! and building quotes with sensible defaults.

use crate::{
    core::{
        line_item::{BillableLine, LineItem},
        quote::{Quote, QuoteStatus},
        store,
    },
    errors::Result,
};
use chrono::NaiveDate;
use rust_decimal_macros::dec;
use sea_orm::DatabaseConnection;

/// Creates an in-memory `SQLite` database with all tables initialized.
/// This is the standard setup for all storage tests.
pub async fn setup_test_db() -> Result<DatabaseConnection> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(db)
}

/// A small, valid, unsaved draft quote for client 1.
///
/// # Rows
/// 1. section "Cloisons et doublages"
/// 2. subsection "Cloisons"
/// 3. work: 24 m² of partition at 38.50, 20 % VAT
/// 4. labor: 16 h at 45.00, 10 % VAT
/// 5. section "Peinture"
/// 6. material: 3 buckets at 62.90, 20 % VAT
/// 7. text
#[must_use]
pub fn sample_quote() -> Quote {
    let issue_date = NaiveDate::from_ymd_opt(2026, 4, 20).unwrap_or_default();
    let mut quote = Quote::new("DEVIS-2026-001", 1, issue_date);
    quote.set_line_items(vec![
        LineItem::section(1, "Cloisons et doublages"),
        LineItem::subsection(2, "Cloisons"),
        LineItem::work(
            3,
            BillableLine::new("Cloison BA13 72/48", dec!(24), "m²", dec!(38.50)),
        ),
        LineItem::labor(
            4,
            BillableLine::new("Pose et bandes", dec!(16), "h", dec!(45))
                .with_tax_rate(dec!(10)),
        ),
        LineItem::section(5, "Peinture"),
        LineItem::material(
            6,
            BillableLine::new("Peinture acrylique 10 L", dec!(3), "u", dec!(62.90))
                .with_body("Blanc mat"),
        ),
        LineItem::text(7, "Nettoyage du chantier inclus"),
    ]);
    quote
}

/// [`sample_quote`] with an id, a deposit percentage and the signed status.
#[must_use]
pub fn signed_quote(id: i64, deposit_percent: u8) -> Quote {
    let mut quote = sample_quote();
    quote.id = Some(id);
    quote.set_deposit_percent(deposit_percent);
    // Draft to signed is always allowed
    let _ = quote.transition_to(QuoteStatus::Signed);
    quote
}

/// Stores a signed [`sample_quote`] and returns it with its id.
pub async fn save_signed_quote(db: &DatabaseConnection, deposit_percent: u8) -> Result<Quote> {
    let mut quote = sample_quote();
    quote.set_deposit_percent(deposit_percent);
    quote.transition_to(QuoteStatus::Signed)?;
    store::save_quote(db, &quote).await
}
