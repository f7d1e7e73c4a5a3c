//! Totals calculator - line totals, section subtotals, VAT and deposit.
//!
//! [`calculate`] walks the rows once and produces every derived value without
//! touching its input; [`Recalculation::apply`] then writes the line totals
//! and subtotals back in one step. [`recalculate`] does both.
//!
//! Rules:
//! - `line_total_excl_tax = round2(quantity × unit_price)` for billable rows
//! - `total_excl_tax = round2(Σ line totals)`
//! - per-row tax is kept unrounded; `total_tax` is rounded once, on the sum
//! - `total_incl_tax = round2(total_excl_tax + total_tax)`
//! - each heading's subtotal sums the billable rows it owns
//! - `deposit_amount = round2(total_incl_tax × deposit_percent / 100)`
//!
//! Row content never makes the calculator fail. Missing numbers are zero and
//! unknown kinds are skipped. A row whose amounts overflow `Decimal`, or would
//! overflow a running sum, counts as zero.

use crate::core::{
    line_item::{BillableLine, LineItem, LineKind},
    money::{checked_percent_of, round2},
};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Highest accepted deposit percentage; larger values are clamped.
pub const MAX_DEPOSIT_PERCENT: u8 = 100;

/// Taxable base and tax for one VAT rate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VatBucket {
    /// VAT rate, in percent
    pub rate_percent: Decimal,
    /// Sum of line totals at this rate, rounded
    pub base_excl_tax: Decimal,
    /// Tax at this rate, summed unrounded then rounded once
    pub tax: Decimal,
}

/// Quote-level derived amounts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Totals {
    /// Sum of line totals, rounded
    pub total_excl_tax: Decimal,
    /// Sum of unrounded per-row taxes, rounded once
    pub total_tax: Decimal,
    /// `total_excl_tax + total_tax`
    pub total_incl_tax: Decimal,
    /// Share of `total_incl_tax` requested upfront
    pub deposit_amount: Decimal,
    /// Informational breakdown; `total_tax` is not the sum of the bucket taxes
    pub vat_breakdown: Vec<VatBucket>,
}

/// Everything derived from one pass over the rows, not yet written back.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Recalculation {
    /// Per row: line total for billable rows, subtotal for headings
    derived: Vec<Option<Decimal>>,
    totals: Totals,
}

impl Recalculation {
    /// The quote-level amounts of this pass.
    #[must_use]
    pub const fn totals(&self) -> &Totals {
        &self.totals
    }

    /// Derived value of the row at `index`: its line total if billable, its
    /// subtotal if a heading.
    #[must_use]
    pub fn derived(&self, index: usize) -> Option<Decimal> {
        self.derived.get(index).copied().flatten()
    }

    /// Writes line totals and subtotals into `items` and hands back the totals.
    ///
    /// `items` must be the slice this recalculation was computed from; rows
    /// beyond the computed length are left untouched.
    pub fn apply(self, items: &mut [LineItem]) -> Totals {
        for (item, derived) in items.iter_mut().zip(self.derived) {
            let Some(value) = derived else { continue };
            if let Some(line) = item.billable_mut() {
                line.line_total_excl_tax = value;
            } else if let Some(heading) = item.heading_mut() {
                heading.section_subtotal = value;
            }
        }
        self.totals
    }
}

#[derive(Default, Clone, Copy)]
struct TaxAccumulator {
    base: Decimal,
    tax: Decimal,
}

/// Running sums after adding one accepted row.
struct RowSums {
    line_total: Decimal,
    sum_excl_tax: Decimal,
    sum_tax: Decimal,
    bucket: TaxAccumulator,
    owners: [Option<(usize, Decimal)>; 2],
}

/// Rounded line total and unrounded tax of a row.
fn row_amounts(line: &BillableLine) -> Option<(Decimal, Decimal)> {
    let line_total = round2(line.quantity.checked_mul(line.unit_price)?);
    let tax = checked_percent_of(line_total, line.tax_rate_percent)?;
    Some((line_total, tax))
}

/// Computes every derived value of `items` in a single pass.
#[must_use]
pub fn calculate(items: &[LineItem], deposit_percent: u8) -> Recalculation {
    let mut derived = vec![None; items.len()];
    let mut sum_excl_tax = Decimal::ZERO;
    let mut sum_tax = Decimal::ZERO;
    let mut buckets: BTreeMap<Decimal, TaxAccumulator> = BTreeMap::new();

    // Open headings while walking forward. Matches the backward-scan ownership
    // rules of `hierarchy`: a section closes both, a subsection closes only
    // the previous subsection.
    let mut open_section: Option<usize> = None;
    let mut open_subsection: Option<usize> = None;
    let mut subtotals: Vec<Decimal> = vec![Decimal::ZERO; items.len()];

    for (index, item) in items.iter().enumerate() {
        match &item.kind {
            LineKind::Section(_) => {
                open_section = Some(index);
                open_subsection = None;
            }
            LineKind::Subsection(_) => {
                open_subsection = Some(index);
            }
            LineKind::Material(_) | LineKind::Labor(_) | LineKind::Work(_) => {
                let Some(line) = item.billable() else { continue };
                let rate = line.tax_rate_percent.normalize();
                let bucket = buckets.get(&rate).copied().unwrap_or_default();

                let add_row = || -> Option<RowSums> {
                    let (line_total, tax) = row_amounts(line)?;
                    let sum_excl_tax = sum_excl_tax.checked_add(line_total)?;
                    let sum_tax = sum_tax.checked_add(tax)?;
                    // total_incl_tax must fit as well
                    sum_excl_tax.checked_add(sum_tax)?;
                    let bucket = TaxAccumulator {
                        base: bucket.base.checked_add(line_total)?,
                        tax: bucket.tax.checked_add(tax)?,
                    };
                    let mut owners = [None; 2];
                    for (slot, owner) in owners.iter_mut().zip([open_section, open_subsection]) {
                        if let Some(owner) = owner {
                            *slot = Some((owner, subtotals[owner].checked_add(line_total)?));
                        }
                    }
                    Some(RowSums {
                        line_total,
                        sum_excl_tax,
                        sum_tax,
                        bucket,
                        owners,
                    })
                };

                let Some(sums) = add_row() else {
                    derived[index] = Some(Decimal::ZERO);
                    continue;
                };
                derived[index] = Some(sums.line_total);
                sum_excl_tax = sums.sum_excl_tax;
                sum_tax = sums.sum_tax;
                buckets.insert(rate, sums.bucket);
                for (owner, subtotal) in sums.owners.into_iter().flatten() {
                    subtotals[owner] = subtotal;
                }
            }
            LineKind::Text(_) | LineKind::Unknown => {}
        }
    }

    for (index, item) in items.iter().enumerate() {
        if item.heading().is_some() {
            derived[index] = Some(round2(subtotals[index]));
        }
    }

    let total_excl_tax = round2(sum_excl_tax);
    let total_tax = round2(sum_tax);
    // Every accepted row kept the unrounded sum in range
    let total_incl_tax = round2(total_excl_tax.checked_add(total_tax).unwrap_or_default());
    let deposit_percent = Decimal::from(deposit_percent.min(MAX_DEPOSIT_PERCENT));
    let deposit_amount =
        round2(checked_percent_of(total_incl_tax, deposit_percent).unwrap_or_default());

    let vat_breakdown = buckets
        .into_iter()
        .map(|(rate_percent, acc)| VatBucket {
            rate_percent,
            base_excl_tax: round2(acc.base),
            tax: round2(acc.tax),
        })
        .collect();

    Recalculation {
        derived,
        totals: Totals {
            total_excl_tax,
            total_tax,
            total_incl_tax,
            deposit_amount,
            vat_breakdown,
        },
    }
}

/// Computes and writes back every derived value, returning the totals.
pub fn recalculate(items: &mut [LineItem], deposit_percent: u8) -> Totals {
    calculate(items, deposit_percent).apply(items)
}
