//! Business-rule checks for the form/API boundary.
//!
//! The totals calculator accepts anything; these checks are what an editor
//! or an API handler runs before accepting a quote as complete. Every problem
//! is reported, not just the first.

use crate::{
    core::{
        line_item::{LineItem, LineKind},
        quote::Quote,
    },
    errors::{Error, Result},
};
use rust_decimal::Decimal;
use serde::Serialize;

/// One problem found in a quote. `position` is the row's position.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[serde(tag = "issue", rename_all = "snake_case")]
pub enum ValidationIssue {
    #[error("quote has no billable line")]
    NothingBillable,

    #[error("row {position}: heading has no title")]
    MissingHeadingLabel { position: i32 },

    #[error("row {position}: quantity must be positive, got {quantity}")]
    NonPositiveQuantity { position: i32, quantity: Decimal },

    #[error("row {position}: unit price cannot be negative, got {unit_price}")]
    NegativeUnitPrice { position: i32, unit_price: Decimal },

    #[error("row {position}: tax rate must be between 0 and 100, got {rate}")]
    TaxRateOutOfRange { position: i32, rate: Decimal },

    #[error("row {position}: unrecognized line type")]
    UnknownKind { position: i32 },
}

/// Checks a single row.
#[must_use]
pub fn validate_line_item(item: &LineItem) -> Vec<ValidationIssue> {
    let position = item.position;
    let mut issues = Vec::new();

    match &item.kind {
        LineKind::Section(heading) | LineKind::Subsection(heading) => {
            if heading.label.trim().is_empty() {
                issues.push(ValidationIssue::MissingHeadingLabel { position });
            }
        }
        LineKind::Unknown => issues.push(ValidationIssue::UnknownKind { position }),
        LineKind::Text(_) => {}
        LineKind::Material(_) | LineKind::Labor(_) | LineKind::Work(_) => {
            let Some(line) = item.billable() else {
                return issues;
            };
            if line.quantity <= Decimal::ZERO {
                issues.push(ValidationIssue::NonPositiveQuantity {
                    position,
                    quantity: line.quantity,
                });
            }
            if line.unit_price < Decimal::ZERO {
                issues.push(ValidationIssue::NegativeUnitPrice {
                    position,
                    unit_price: line.unit_price,
                });
            }
            if line.tax_rate_percent < Decimal::ZERO
                || line.tax_rate_percent > Decimal::ONE_HUNDRED
            {
                issues.push(ValidationIssue::TaxRateOutOfRange {
                    position,
                    rate: line.tax_rate_percent,
                });
            }
        }
    }

    issues
}

/// Checks every row of a quote, plus quote-level rules.
#[must_use]
pub fn validate_quote(quote: &Quote) -> Vec<ValidationIssue> {
    let mut issues: Vec<ValidationIssue> = quote
        .line_items()
        .iter()
        .flat_map(validate_line_item)
        .collect();

    if !quote.line_items().iter().any(LineItem::is_billable) {
        issues.insert(0, ValidationIssue::NothingBillable);
    }
    issues
}

impl Quote {
    /// Fails with every issue found, if any.
    ///
    /// # Errors
    /// Returns `Error::Validation` listing the problems.
    pub fn ensure_valid(&self) -> Result<()> {
        let issues = validate_quote(self);
        if issues.is_empty() {
            Ok(())
        } else {
            Err(Error::Validation { issues })
        }
    }
}
