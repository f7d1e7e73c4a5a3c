//! Invoices ("factures") derived from signed quotes.
//!
//! A signed quote is billed through any mix of a deposit invoice, intermediate
//! invoices for a share of the work, and a final invoice for whatever has not
//! been billed yet. Amounts are computed from the quote's totals, never from
//! its rows, so an invoice always agrees with the document the client signed.

use crate::{
    core::{
        money::{percent_of, round2},
        quote::{Quote, QuoteStatus},
    },
    errors::{Error, Result},
};
use chrono::{Days, NaiveDate};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use std::{fmt, str::FromStr};

/// What part of the quote an invoice bills.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceKind {
    /// Upfront payment ("acompte")
    Deposit,
    /// Progress billing ("situation")
    Intermediate,
    /// Remaining balance
    Final,
}

/// Payment state of an invoice.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InvoiceStatus {
    /// Issued, not fully settled
    #[default]
    Pending,
    /// Fully settled
    Paid,
}

macro_rules! str_enum {
    ($ty:ty { $($variant:ident => $text:literal),+ $(,)? }) => {
        impl $ty {
            /// Stored and wire name.
            #[must_use]
            pub const fn as_str(self) -> &'static str {
                match self {
                    $(Self::$variant => $text),+
                }
            }
        }

        impl fmt::Display for $ty {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                f.write_str(self.as_str())
            }
        }

        impl FromStr for $ty {
            type Err = Error;

            fn from_str(s: &str) -> Result<Self> {
                match s {
                    $($text => Ok(Self::$variant),)+
                    other => Err(Error::InvalidData {
                        message: format!("Unknown {} '{other}'", stringify!($ty)),
                    }),
                }
            }
        }
    };
}

str_enum!(InvoiceKind {
    Deposit => "deposit",
    Intermediate => "intermediate",
    Final => "final",
});

str_enum!(InvoiceStatus {
    Pending => "pending",
    Paid => "paid",
});

/// Which invoice to issue for a quote.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InvoiceRequest {
    /// Bills the quote's deposit percentage
    Deposit,
    /// Bills `percent` of the quote
    Intermediate { percent: Decimal },
    /// Bills everything not yet invoiced
    Final,
}

/// Settings shared by every invoice built for a quote.
#[derive(Debug, Clone)]
pub struct InvoiceTerms {
    /// Invoice number, already drawn
    pub number: String,
    /// Date printed on the invoice
    pub issue_date: NaiveDate,
    /// Days between issue and due date
    pub payment_terms_days: u32,
}

/// An invoice and its amounts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Invoice {
    /// Database id, `None` until first saved
    pub id: Option<i64>,
    /// Quote this invoice bills
    pub quote_id: i64,
    /// Client of the quote
    pub client_id: i64,
    /// Project of the quote, if any
    pub project_id: Option<i64>,
    /// Invoice number (e.g. "FACT-2026-001")
    pub number: String,
    /// Deposit, intermediate or final
    pub kind: InvoiceKind,
    /// Payment state
    pub status: InvoiceStatus,
    /// Date printed on the invoice
    pub issue_date: NaiveDate,
    /// Payment deadline
    pub due_date: Option<NaiveDate>,
    /// Billed amount before tax
    pub total_excl_tax: Decimal,
    /// Tax part of the billed amount
    pub total_tax: Decimal,
    /// Billed amount including tax
    pub total_incl_tax: Decimal,
    /// Sum of payments received
    pub paid_amount: Decimal,
}

impl Invoice {
    /// Builds the invoice described by `request` for a signed, saved quote.
    ///
    /// `previous` are the invoices already issued; only those belonging to
    /// this quote are taken into account, and only by a final invoice.
    ///
    /// # Errors
    /// - `Error::QuoteNotSigned` if the quote is not signed
    /// - `Error::QuoteNotSaved` if the quote has no id yet
    /// - `Error::InvalidAmount` for a zero deposit or a percentage outside (0, 100]
    pub fn for_quote(
        quote: &Quote,
        request: InvoiceRequest,
        previous: &[Self],
        terms: InvoiceTerms,
    ) -> Result<Self> {
        if quote.status() != QuoteStatus::Signed {
            return Err(Error::QuoteNotSigned {
                number: quote.number.clone(),
            });
        }
        let quote_id = quote.id.ok_or_else(|| Error::QuoteNotSaved {
            number: quote.number.clone(),
        })?;

        let (kind, total_excl_tax, total_incl_tax) = match request {
            InvoiceRequest::Deposit => {
                let percent = Decimal::from(quote.deposit_percent());
                let (excl, incl) = share_of(quote, percent)?;
                (InvoiceKind::Deposit, excl, incl)
            }
            InvoiceRequest::Intermediate { percent } => {
                let (excl, incl) = share_of(quote, percent)?;
                (InvoiceKind::Intermediate, excl, incl)
            }
            InvoiceRequest::Final => {
                let billed = previous.iter().filter(|inv| inv.quote_id == quote_id);
                let (billed_excl, billed_incl) = billed.fold(
                    (Decimal::ZERO, Decimal::ZERO),
                    |(excl, incl), inv| (excl + inv.total_excl_tax, incl + inv.total_incl_tax),
                );
                let excl = (quote.total_excl_tax() - billed_excl).max(Decimal::ZERO);
                let incl = (quote.total_incl_tax() - billed_incl).max(excl);
                (InvoiceKind::Final, excl, incl)
            }
        };

        Ok(Self {
            id: None,
            quote_id,
            client_id: quote.client_id,
            project_id: quote.project_id,
            number: terms.number,
            kind,
            status: InvoiceStatus::Pending,
            issue_date: terms.issue_date,
            due_date: terms
                .issue_date
                .checked_add_days(Days::new(u64::from(terms.payment_terms_days))),
            total_excl_tax,
            total_tax: total_incl_tax - total_excl_tax,
            total_incl_tax,
            paid_amount: Decimal::ZERO,
        })
    }

    /// Amount still owed.
    #[must_use]
    pub fn balance_due(&self) -> Decimal {
        (self.total_incl_tax - self.paid_amount).max(Decimal::ZERO)
    }

    /// Records a payment; the invoice becomes paid once fully settled.
    ///
    /// # Errors
    /// Returns `Error::InvalidAmount` for a zero or negative payment.
    pub fn mark_paid(&mut self, amount: Decimal) -> Result<()> {
        let amount = round2(amount);
        if amount <= Decimal::ZERO {
            return Err(Error::InvalidAmount { value: amount });
        }
        self.paid_amount += amount;
        if self.paid_amount >= self.total_incl_tax {
            self.status = InvoiceStatus::Paid;
        }
        Ok(())
    }
}

/// Rounded (excl. tax, incl. tax) amounts for `percent` of a quote.
fn share_of(quote: &Quote, percent: Decimal) -> Result<(Decimal, Decimal)> {
    if percent <= Decimal::ZERO || percent > Decimal::ONE_HUNDRED {
        return Err(Error::InvalidAmount { value: percent });
    }
    let excl = round2(percent_of(quote.total_excl_tax(), percent));
    let incl = round2(percent_of(quote.total_incl_tax(), percent));
    Ok((excl, incl))
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::signed_quote;
    use rust_decimal_macros::dec;

    fn terms(number: &str) -> InvoiceTerms {
        InvoiceTerms {
            number: number.to_string(),
            issue_date: NaiveDate::from_ymd_opt(2026, 5, 4).unwrap(),
            payment_terms_days: 30,
        }
    }

    #[test]
    fn test_deposit_invoice_matches_quote_deposit() {
        let quote = signed_quote(7, 30);
        let invoice =
            Invoice::for_quote(&quote, InvoiceRequest::Deposit, &[], terms("FACT-2026-001"))
                .unwrap();

        assert_eq!(invoice.kind, InvoiceKind::Deposit);
        assert_eq!(invoice.quote_id, 7);
        assert_eq!(invoice.total_incl_tax, quote.deposit_amount());
        assert_eq!(
            invoice.total_excl_tax + invoice.total_tax,
            invoice.total_incl_tax
        );
        assert_eq!(invoice.due_date, NaiveDate::from_ymd_opt(2026, 6, 3));
        assert_eq!(invoice.status, InvoiceStatus::Pending);
    }

    #[test]
    fn test_deposit_requires_a_percentage() {
        let quote = signed_quote(7, 0);
        let result = Invoice::for_quote(&quote, InvoiceRequest::Deposit, &[], terms("F1"));
        assert!(matches!(result, Err(Error::InvalidAmount { .. })));
    }

    #[test]
    fn test_unsigned_quote_cannot_be_invoiced() {
        let mut quote = crate::test_utils::sample_quote();
        quote.id = Some(1);
        let result = Invoice::for_quote(&quote, InvoiceRequest::Final, &[], terms("F1"));
        assert!(matches!(result, Err(Error::QuoteNotSigned { .. })));
    }

    #[test]
    fn test_unsaved_quote_cannot_be_invoiced() {
        let mut quote = signed_quote(7, 30);
        quote.id = None;
        let result = Invoice::for_quote(&quote, InvoiceRequest::Deposit, &[], terms("F1"));
        assert!(matches!(result, Err(Error::QuoteNotSaved { .. })));
    }

    #[test]
    fn test_intermediate_percent_bounds() {
        let quote = signed_quote(7, 30);
        for percent in [dec!(0), dec!(-5), dec!(100.01)] {
            let result = Invoice::for_quote(
                &quote,
                InvoiceRequest::Intermediate { percent },
                &[],
                terms("F1"),
            );
            assert!(result.is_err());
        }
    }

    #[test]
    fn test_final_invoice_bills_the_remainder() {
        let quote = signed_quote(7, 30);
        let deposit =
            Invoice::for_quote(&quote, InvoiceRequest::Deposit, &[], terms("F1")).unwrap();
        let progress = Invoice::for_quote(
            &quote,
            InvoiceRequest::Intermediate { percent: dec!(40) },
            &[],
            terms("F2"),
        )
        .unwrap();

        let mut unrelated = deposit.clone();
        unrelated.quote_id = 99;

        let previous = [deposit, progress, unrelated];
        let final_invoice =
            Invoice::for_quote(&quote, InvoiceRequest::Final, &previous, terms("F3")).unwrap();

        let billed_incl: Decimal = previous[..2].iter().map(|i| i.total_incl_tax).sum();
        let billed_excl: Decimal = previous[..2].iter().map(|i| i.total_excl_tax).sum();
        assert_eq!(
            billed_incl + final_invoice.total_incl_tax,
            quote.total_incl_tax()
        );
        assert_eq!(
            billed_excl + final_invoice.total_excl_tax,
            quote.total_excl_tax()
        );
    }

    #[test]
    fn test_final_invoice_never_negative() {
        let quote = signed_quote(7, 100);
        let deposit =
            Invoice::for_quote(&quote, InvoiceRequest::Deposit, &[], terms("F1")).unwrap();
        let again = deposit.clone();
        let final_invoice =
            Invoice::for_quote(&quote, InvoiceRequest::Final, &[deposit, again], terms("F2"))
                .unwrap();
        assert_eq!(final_invoice.total_incl_tax, Decimal::ZERO);
        assert_eq!(final_invoice.total_tax, Decimal::ZERO);
    }

    #[test]
    fn test_mark_paid() {
        let quote = signed_quote(7, 30);
        let mut invoice =
            Invoice::for_quote(&quote, InvoiceRequest::Final, &[], terms("F1")).unwrap();
        let total = invoice.total_incl_tax;

        invoice.mark_paid(dec!(100)).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Pending);
        assert_eq!(invoice.balance_due(), total - dec!(100));

        assert!(invoice.mark_paid(dec!(0)).is_err());

        invoice.mark_paid(total).unwrap();
        assert_eq!(invoice.status, InvoiceStatus::Paid);
        assert_eq!(invoice.balance_due(), Decimal::ZERO);
    }

    #[test]
    fn test_kind_and_status_strings() {
        assert_eq!(InvoiceKind::Intermediate.to_string(), "intermediate");
        assert_eq!("final".parse::<InvoiceKind>().unwrap(), InvoiceKind::Final);
        assert_eq!("paid".parse::<InvoiceStatus>().unwrap(), InvoiceStatus::Paid);
        assert!(matches!(
            "void".parse::<InvoiceStatus>(),
            Err(Error::InvalidData { .. })
        ));
    }
}
