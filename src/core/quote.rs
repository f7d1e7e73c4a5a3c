//! Quote aggregate - line items plus the totals derived from them.
//!
//! The derived amounts are private and have no setters. Every mutation of the
//! rows or of the deposit percentage goes through a method that recomputes
//! them before returning, and a deserialized quote is recomputed on the way
//! in, so stored totals can never drift from the rows.

use crate::{
    core::{
        hierarchy,
        line_item::LineItem,
        money,
        totals::{self, MAX_DEPOSIT_PERCENT, Totals},
    },
    errors::{Error, Result},
};
use chrono::{Days, NaiveDate, Utc};
use rust_decimal::{Decimal, RoundingStrategy, prelude::ToPrimitive};
use serde::{Deserialize, Deserializer, Serialize};
use std::{fmt, str::FromStr};

/// Where a quote is in its commercial life.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuoteStatus {
    /// Being written, freely editable
    #[default]
    Draft,
    /// Sent to the client, awaiting an answer
    Sent,
    /// Accepted by the client; can be invoiced
    Signed,
    /// Declined by the client
    Rejected,
}

impl QuoteStatus {
    /// Stored and wire name.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Sent => "sent",
            Self::Signed => "signed",
            Self::Rejected => "rejected",
        }
    }

    /// Whether a quote in this status may move to `next`. Signed is final.
    #[must_use]
    pub const fn can_transition_to(self, next: Self) -> bool {
        matches!(
            (self, next),
            (Self::Draft, Self::Sent | Self::Signed | Self::Rejected)
                | (Self::Sent, Self::Signed | Self::Rejected | Self::Draft)
                | (Self::Rejected, Self::Draft)
        )
    }
}

impl fmt::Display for QuoteStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for QuoteStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s {
            "draft" => Ok(Self::Draft),
            "sent" => Ok(Self::Sent),
            "signed" => Ok(Self::Signed),
            "rejected" => Ok(Self::Rejected),
            other => Err(Error::InvalidData {
                message: format!("Unknown quote status '{other}'"),
            }),
        }
    }
}

/// A quote ("devis") and its derived totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", from = "QuoteRecord")]
pub struct Quote {
    /// Database id, `None` until first saved
    pub id: Option<i64>,
    /// Client the quote is addressed to
    pub client_id: i64,
    /// Construction project, if any
    pub project_id: Option<i64>,
    /// Quote number (e.g. "DEVIS-2026-001"), empty until assigned
    pub number: String,
    /// Date printed on the quote
    pub issue_date: NaiveDate,
    /// Last day the offer holds
    pub valid_until: Option<NaiveDate>,
    /// Free notes shown below the rows
    pub notes: Option<String>,
    /// Payment and execution conditions
    pub conditions: Option<String>,
    status: QuoteStatus,
    /// Optimistic concurrency stamp, 0 until first saved
    version: i32,
    deposit_percent: u8,
    line_items: Vec<LineItem>,
    #[serde(flatten)]
    totals: Totals,
}

/// Wire shape of a quote. Derived amounts in the payload are ignored.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuoteRecord {
    #[serde(default, deserialize_with = "money::lenient_int::option")]
    id: Option<i64>,
    #[serde(default, deserialize_with = "money::lenient_int::deserialize")]
    client_id: i64,
    #[serde(default, deserialize_with = "money::lenient_int::option")]
    project_id: Option<i64>,
    #[serde(default)]
    number: String,
    #[serde(default)]
    status: QuoteStatus,
    #[serde(default)]
    issue_date: Option<NaiveDate>,
    #[serde(default)]
    valid_until: Option<NaiveDate>,
    #[serde(default)]
    notes: Option<String>,
    #[serde(default)]
    conditions: Option<String>,
    #[serde(default, deserialize_with = "money::lenient_int::deserialize")]
    version: i32,
    #[serde(default, deserialize_with = "lenient_percent")]
    deposit_percent: u8,
    #[serde(default)]
    line_items: Vec<LineItem>,
}

fn lenient_percent<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<u8, D::Error> {
    let value = money::lenient::deserialize(deserializer)?;
    Ok(clamp_percent(value))
}

fn clamp_percent(value: Decimal) -> u8 {
    value
        .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
        .clamp(Decimal::ZERO, Decimal::from(MAX_DEPOSIT_PERCENT))
        .to_u8()
        .unwrap_or_default()
}

impl From<QuoteRecord> for Quote {
    fn from(record: QuoteRecord) -> Self {
        let mut quote = Self {
            id: record.id,
            client_id: record.client_id,
            project_id: record.project_id,
            number: record.number,
            issue_date: record
                .issue_date
                .unwrap_or_else(|| Utc::now().date_naive()),
            valid_until: record.valid_until,
            notes: record.notes,
            conditions: record.conditions,
            status: record.status,
            version: record.version,
            deposit_percent: record.deposit_percent.min(MAX_DEPOSIT_PERCENT),
            line_items: Vec::new(),
            totals: Totals::default(),
        };
        quote.set_line_items(record.line_items);
        quote
    }
}

impl Quote {
    /// Empty draft with no deposit.
    #[must_use]
    pub fn new(number: &str, client_id: i64, issue_date: NaiveDate) -> Self {
        Self {
            id: None,
            client_id,
            project_id: None,
            number: number.to_string(),
            issue_date,
            valid_until: None,
            notes: None,
            conditions: None,
            status: QuoteStatus::Draft,
            version: 0,
            deposit_percent: 0,
            line_items: Vec::new(),
            totals: Totals::default(),
        }
    }

    /// Empty draft with the configured deposit and validity period.
    #[must_use]
    pub fn draft(
        number: &str,
        client_id: i64,
        issue_date: NaiveDate,
        deposit_percent: u8,
        validity_days: u32,
    ) -> Self {
        let mut quote = Self::new(number, client_id, issue_date);
        quote.valid_until = issue_date.checked_add_days(Days::new(u64::from(validity_days)));
        quote.set_deposit_percent(deposit_percent);
        quote
    }

    /// Rebuilds a stored quote; derived amounts are recomputed from `line_items`.
    #[must_use]
    pub(crate) fn restore(
        mut header: Self,
        status: QuoteStatus,
        version: i32,
        line_items: Vec<LineItem>,
    ) -> Self {
        header.status = status;
        header.version = version;
        header.set_line_items(line_items);
        header
    }

    pub(crate) fn mark_saved(&mut self, id: i64, version: i32) {
        self.id = Some(id);
        self.version = version;
    }

    /// Current lifecycle status.
    #[must_use]
    pub const fn status(&self) -> QuoteStatus {
        self.status
    }

    /// Optimistic concurrency stamp, 0 until first saved.
    #[must_use]
    pub const fn version(&self) -> i32 {
        self.version
    }

    /// Deposit requested, in percent.
    #[must_use]
    pub const fn deposit_percent(&self) -> u8 {
        self.deposit_percent
    }

    /// Rows in display order.
    #[must_use]
    pub fn line_items(&self) -> &[LineItem] {
        &self.line_items
    }

    /// Every derived quote-level amount.
    #[must_use]
    pub const fn totals(&self) -> &Totals {
        &self.totals
    }

    /// See [`Totals::total_excl_tax`].
    #[must_use]
    pub const fn total_excl_tax(&self) -> Decimal {
        self.totals.total_excl_tax
    }

    /// See [`Totals::total_tax`].
    #[must_use]
    pub const fn total_tax(&self) -> Decimal {
        self.totals.total_tax
    }

    /// See [`Totals::total_incl_tax`].
    #[must_use]
    pub const fn total_incl_tax(&self) -> Decimal {
        self.totals.total_incl_tax
    }

    /// See [`Totals::deposit_amount`].
    #[must_use]
    pub const fn deposit_amount(&self) -> Decimal {
        self.totals.deposit_amount
    }

    /// Display numbers of the rows, see [`hierarchy::renumber`].
    #[must_use]
    pub fn display_numbers(&self) -> Vec<Option<String>> {
        hierarchy::renumber(&self.line_items)
    }

    /// Replaces every row. Rows are ordered by `position`, then renumbered
    /// 1..=n.
    pub fn set_line_items(&mut self, mut line_items: Vec<LineItem>) {
        hierarchy::sort_by_position(&mut line_items);
        self.line_items = line_items;
        self.refresh();
    }

    /// Appends a row at the end.
    pub fn push_line_item(&mut self, item: LineItem) {
        self.line_items.push(item);
        self.refresh();
    }

    /// Inserts a row before `index` (`index == len` appends).
    ///
    /// # Errors
    /// Returns `Error::IndexOutOfRange` if `index > len`.
    pub fn insert_line_item(&mut self, index: usize, item: LineItem) -> Result<()> {
        self.check_index(index, self.line_items.len() + 1)?;
        self.line_items.insert(index, item);
        self.refresh();
        Ok(())
    }

    /// Removes and returns the row at `index`.
    ///
    /// # Errors
    /// Returns `Error::IndexOutOfRange` if there is no such row.
    pub fn remove_line_item(&mut self, index: usize) -> Result<LineItem> {
        self.check_index(index, self.line_items.len())?;
        let removed = self.line_items.remove(index);
        self.refresh();
        Ok(removed)
    }

    /// Moves the row at `from` so that it ends up at index `to`.
    ///
    /// # Errors
    /// Returns `Error::IndexOutOfRange` if either index is past the end.
    pub fn move_line_item(&mut self, from: usize, to: usize) -> Result<()> {
        self.check_index(from, self.line_items.len())?;
        self.check_index(to, self.line_items.len())?;
        let item = self.line_items.remove(from);
        self.line_items.insert(to, item);
        self.refresh();
        Ok(())
    }

    /// Edits the row at `index` in place, then recomputes.
    ///
    /// # Errors
    /// Returns `Error::IndexOutOfRange` if there is no such row.
    pub fn update_line_item<F>(&mut self, index: usize, edit: F) -> Result<()>
    where
        F: FnOnce(&mut LineItem),
    {
        let len = self.line_items.len();
        let item = self
            .line_items
            .get_mut(index)
            .ok_or(Error::IndexOutOfRange { index, len })?;
        edit(item);
        self.refresh();
        Ok(())
    }

    /// Sets the deposit percentage (clamped to 100) and recomputes.
    pub fn set_deposit_percent(&mut self, deposit_percent: u8) {
        self.deposit_percent = deposit_percent.min(MAX_DEPOSIT_PERCENT);
        self.refresh();
    }

    /// Moves the quote to `next`.
    ///
    /// # Errors
    /// Returns `Error::InvalidStatusTransition` when the move is not allowed.
    pub fn transition_to(&mut self, next: QuoteStatus) -> Result<()> {
        if !self.status.can_transition_to(next) {
            return Err(Error::InvalidStatusTransition {
                from: self.status,
                to: next,
            });
        }
        self.status = next;
        Ok(())
    }

    fn check_index(&self, index: usize, bound: usize) -> Result<()> {
        if index < bound {
            Ok(())
        } else {
            Err(Error::IndexOutOfRange {
                index,
                len: self.line_items.len(),
            })
        }
    }

    /// Positions and derived amounts are computed on the side and swapped in
    /// together.
    fn refresh(&mut self) {
        let mut rows = self.line_items.clone();
        hierarchy::reindex_positions(&mut rows);
        let totals = totals::recalculate(&mut rows, self.deposit_percent);
        self.line_items = rows;
        self.totals = totals;
    }
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::line_item::BillableLine;
    use crate::test_utils::sample_quote;
    use rust_decimal_macros::dec;

    fn material(label: &str, quantity: Decimal, unit_price: Decimal) -> LineItem {
        LineItem::material(0, BillableLine::new(label, quantity, "u", unit_price))
    }

    #[test]
    fn test_mutations_recompute_totals() {
        let issue = NaiveDate::from_ymd_opt(2026, 3, 1).unwrap();
        let mut quote = Quote::new("DEVIS-2026-001", 1, issue);
        quote.push_line_item(LineItem::section(0, "Lot 1"));
        quote.push_line_item(material("Parpaing", dec!(10), dec!(2.5)));
        assert_eq!(quote.total_excl_tax(), dec!(25));
        assert_eq!(quote.total_incl_tax(), dec!(30));

        quote.set_deposit_percent(30);
        assert_eq!(quote.deposit_amount(), dec!(9));

        quote
            .update_line_item(1, |item| {
                if let Some(line) = item.billable_mut() {
                    line.quantity = dec!(20);
                }
            })
            .unwrap();
        assert_eq!(quote.total_excl_tax(), dec!(50));
        assert_eq!(quote.deposit_amount(), dec!(18));
        assert_eq!(quote.line_items()[0].heading().unwrap().section_subtotal, dec!(50));

        quote.remove_line_item(1).unwrap();
        assert_eq!(quote.total_excl_tax(), Decimal::ZERO);
        assert_eq!(quote.deposit_amount(), Decimal::ZERO);
    }

    #[test]
    fn test_positions_are_reindexed() {
        let mut quote = sample_quote();
        quote.insert_line_item(0, LineItem::text(99, "Préambule")).unwrap();
        let positions: Vec<i32> = quote.line_items().iter().map(|i| i.position).collect();
        let expected: Vec<i32> = (1..=i32::try_from(positions.len()).unwrap()).collect();
        assert_eq!(positions, expected);
    }

    #[test]
    fn test_move_changes_attribution_not_totals() {
        let mut quote = Quote::new("Q", 1, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        quote.set_line_items(vec![
            LineItem::section(1, "A"),
            LineItem::section(2, "B"),
            LineItem::material(3, BillableLine::new("x", dec!(1), "u", dec!(100))),
        ]);
        let before = quote.totals().clone();
        assert_eq!(quote.line_items()[1].heading().unwrap().section_subtotal, dec!(100));

        quote.move_line_item(2, 1).unwrap();

        assert_eq!(quote.totals(), &before);
        assert_eq!(quote.line_items()[0].heading().unwrap().section_subtotal, dec!(100));
        assert_eq!(quote.line_items()[2].heading().unwrap().section_subtotal, Decimal::ZERO);
    }

    #[test]
    fn test_out_of_range_indices_are_errors() {
        let mut quote = sample_quote();
        let len = quote.line_items().len();
        assert!(matches!(
            quote.remove_line_item(len),
            Err(Error::IndexOutOfRange { .. })
        ));
        assert!(quote.move_line_item(0, len).is_err());
        assert!(quote.update_line_item(len, |_| {}).is_err());
        assert!(quote.insert_line_item(len, LineItem::text(0, "fin")).is_ok());
        assert!(quote.insert_line_item(len + 5, LineItem::text(0, "x")).is_err());
    }

    #[test]
    fn test_deserialize_ignores_stale_totals() {
        let json = r#"{
            "clientId": 4,
            "number": "DEVIS-2026-010",
            "issueDate": "2026-02-01",
            "depositPercent": "30",
            "totalExclTax": "999999",
            "lineItems": [
                {"type": "title", "title": "Peinture", "position": 1, "subtotal": 12},
                {"type": "work", "title": "Murs", "quantity": "40", "unit": "m²",
                 "unitPrice": "25", "vatRate": "10", "totalHT": "1", "position": 2}
            ]
        }"#;

        let quote: Quote = serde_json::from_str(json).unwrap();

        assert_eq!(quote.deposit_percent(), 30);
        assert_eq!(quote.total_excl_tax(), dec!(1000));
        assert_eq!(quote.total_tax(), dec!(100));
        assert_eq!(quote.total_incl_tax(), dec!(1100));
        assert_eq!(quote.deposit_amount(), dec!(330));
        assert_eq!(quote.line_items()[0].heading().unwrap().section_subtotal, dec!(1000));
    }

    #[test]
    fn test_set_line_items_orders_by_position() {
        let mut quote = Quote::new("Q", 1, NaiveDate::from_ymd_opt(2026, 1, 5).unwrap());
        quote.set_line_items(vec![
            LineItem::material(3, BillableLine::new("x", dec!(1), "u", dec!(100))),
            LineItem::section(1, "A"),
            material("sans position", dec!(1), dec!(5)),
        ]);
        // Position 0 sorts first and stays outside every section
        assert_eq!(quote.line_items()[0].label(), "sans position");
        assert_eq!(quote.line_items()[1].heading().unwrap().section_subtotal, dec!(100));
        assert_eq!(quote.total_excl_tax(), dec!(105));
    }

    #[test]
    fn test_deserialize_accepts_numeric_strings_for_ids() {
        let json = r#"{
            "id": "12",
            "clientId": "4",
            "projectId": null,
            "version": "3",
            "number": "DEVIS-2026-011",
            "issueDate": "2026-02-01",
            "lineItems": [
                {"type": "material", "quantity": "3", "unitPrice": 10, "position": "2"},
                {"type": "title", "title": "Plomberie", "position": "1"}
            ]
        }"#;

        let quote: Quote = serde_json::from_str(json).unwrap();

        assert_eq!(quote.id, Some(12));
        assert_eq!(quote.client_id, 4);
        assert_eq!(quote.project_id, None);
        assert_eq!(quote.version(), 3);
        assert_eq!(quote.line_items()[0].label(), "Plomberie");
        assert_eq!(quote.line_items()[0].heading().unwrap().section_subtotal, dec!(30));
    }

    #[test]
    fn test_deposit_percent_rounds_half_up() {
        let parse = |raw: &str| {
            let json = format!(r#"{{"issueDate": "2026-02-01", "depositPercent": {raw}}}"#);
            serde_json::from_str::<Quote>(&json).unwrap().deposit_percent()
        };
        assert_eq!(parse("\"30.5\""), 31);
        assert_eq!(parse("32.5"), 33);
        assert_eq!(parse("29.4"), 29);
        assert_eq!(parse("\"-5\""), 0);
        assert_eq!(parse("250"), 100);
    }

    #[test]
    fn test_serialized_quote_reloads_identically() {
        let mut quote = sample_quote();
        quote.set_deposit_percent(40);
        let json = serde_json::to_string(&quote).unwrap();
        let back: Quote = serde_json::from_str(&json).unwrap();
        assert_eq!(back, quote);
    }

    #[test]
    fn test_status_transitions() {
        let mut quote = sample_quote();
        assert_eq!(quote.status(), QuoteStatus::Draft);
        quote.transition_to(QuoteStatus::Sent).unwrap();
        quote.transition_to(QuoteStatus::Signed).unwrap();
        assert!(matches!(
            quote.transition_to(QuoteStatus::Draft),
            Err(Error::InvalidStatusTransition {
                from: QuoteStatus::Signed,
                to: QuoteStatus::Draft
            })
        ));

        let mut rejected = sample_quote();
        rejected.transition_to(QuoteStatus::Rejected).unwrap();
        assert!(rejected.transition_to(QuoteStatus::Signed).is_err());
        rejected.transition_to(QuoteStatus::Draft).unwrap();
    }

    #[test]
    fn test_status_parsing() {
        assert_eq!("signed".parse::<QuoteStatus>().unwrap(), QuoteStatus::Signed);
        assert!(matches!(
            "archived".parse::<QuoteStatus>(),
            Err(Error::InvalidData { .. })
        ));
    }

    #[test]
    fn test_draft_uses_defaults() {
        let issue = NaiveDate::from_ymd_opt(2026, 1, 20).unwrap();
        let quote = Quote::draft("DEVIS-2026-002", 3, issue, 30, 30);
        assert_eq!(quote.deposit_percent(), 30);
        assert_eq!(quote.valid_until, NaiveDate::from_ymd_opt(2026, 2, 19));
    }

    #[test]
    fn test_deposit_percent_clamped() {
        let mut quote = sample_quote();
        quote.set_deposit_percent(150);
        assert_eq!(quote.deposit_percent(), 100);
        assert_eq!(quote.deposit_amount(), quote.total_incl_tax());
    }
}
