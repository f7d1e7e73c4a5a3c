//! Persistence of quotes, invoices and numbering counters.
//!
//! The domain types never see the database: this module maps them to and
//! from the `SeaORM` entities. A quote and its rows are always written in one
//! transaction, and updates are guarded by the quote's version stamp so two
//! editors saving the same quote cannot silently overwrite each other.

use crate::{
    core::{
        invoice::{Invoice, InvoiceRequest, InvoiceTerms},
        line_item::{BillableLine, CompositeLine, Heading, LineItem, LineKind, TextBlock},
        money::{coerce_str, round2},
        numbering::NumberingFormat,
        quote::Quote,
    },
    entities::{
        InvoiceColumn, Invoices, QuoteColumn, QuoteLineItemColumn, QuoteLineItems, Quotes,
        SequenceCounterColumn, SequenceCounters, invoice, quote, quote_line_item,
        sequence_counter,
    },
    errors::{Error, Result},
};
use chrono::{NaiveDate, Utc};
use rust_decimal::Decimal;
use sea_orm::{
    ActiveValue::NotSet, QueryOrder, Set, TransactionTrait, prelude::*, sea_query::Expr,
};
use tracing::{debug, info, instrument, warn};

/// Counter scope of quote numbers.
pub const QUOTE_SCOPE: &str = "quote";
/// Counter scope of invoice numbers.
pub const INVOICE_SCOPE: &str = "invoice";

/// Inserts or updates a quote together with all of its rows.
///
/// A new quote (no id) is inserted at version 1. An existing one is only
/// updated if the stored version still matches `quote.version()`; the
/// version is then bumped. Returns the quote with its id and new version.
///
/// # Errors
/// - `Error::VersionConflict` if someone else saved the quote in between
/// - `Error::QuoteNotFound` if the quote was deleted in between
#[instrument(skip(db, quote), fields(number = %quote.number))]
pub async fn save_quote(db: &DatabaseConnection, quote: &Quote) -> Result<Quote> {
    let txn = db.begin().await?;
    let now = Utc::now();
    let mut header = quote_header(quote);

    let (id, version) = if let Some(id) = quote.id {
        let expected = quote.version();
        header.id = Set(id);
        header.version = Set(expected + 1);

        match Quotes::update(header)
            .filter(QuoteColumn::Version.eq(expected))
            .exec(&txn)
            .await
        {
            Ok(updated) => (updated.id, updated.version),
            Err(DbErr::RecordNotUpdated) => {
                let found = Quotes::find_by_id(id)
                    .one(&txn)
                    .await?
                    .ok_or(Error::QuoteNotFound { id })?;
                warn!(id, expected, found = found.version, "stale quote version");
                return Err(Error::VersionConflict {
                    id,
                    expected,
                    found: found.version,
                });
            }
            Err(e) => return Err(e.into()),
        }
    } else {
        header.version = Set(1);
        header.created_at = Set(now);
        let inserted = header.insert(&txn).await?;
        (inserted.id, inserted.version)
    };

    QuoteLineItems::delete_many()
        .filter(QuoteLineItemColumn::QuoteId.eq(id))
        .exec(&txn)
        .await?;

    let rows = quote
        .line_items()
        .iter()
        .map(|item| line_item_row(id, item))
        .collect::<Result<Vec<_>>>()?;
    let row_count = rows.len();
    if !rows.is_empty() {
        QuoteLineItems::insert_many(rows).exec(&txn).await?;
    }

    txn.commit().await?;
    info!(id, version, rows = row_count, "quote saved");

    let mut saved = quote.clone();
    saved.mark_saved(id, version);
    Ok(saved)
}

/// Loads a quote and its rows. Derived amounts are recomputed from the rows.
#[instrument(skip(db))]
pub async fn load_quote(db: &DatabaseConnection, id: i64) -> Result<Option<Quote>> {
    let Some(row) = Quotes::find_by_id(id).one(db).await? else {
        return Ok(None);
    };
    let items = load_line_items(db, id).await?;
    quote_from_rows(row, items).map(Some)
}

/// All quotes of a client, most recent first.
#[instrument(skip(db))]
pub async fn list_quotes_for_client(
    db: &DatabaseConnection,
    client_id: i64,
) -> Result<Vec<Quote>> {
    let rows = Quotes::find()
        .filter(QuoteColumn::ClientId.eq(client_id))
        .order_by_desc(QuoteColumn::IssueDate)
        .order_by_desc(QuoteColumn::Id)
        .all(db)
        .await?;

    let mut quotes = Vec::with_capacity(rows.len());
    for row in rows {
        let items = load_line_items(db, row.id).await?;
        quotes.push(quote_from_rows(row, items)?);
    }
    Ok(quotes)
}

/// Deletes a quote and its rows.
///
/// # Errors
/// Returns `Error::QuoteNotFound` if there is no such quote.
#[instrument(skip(db))]
pub async fn delete_quote(db: &DatabaseConnection, id: i64) -> Result<()> {
    let txn = db.begin().await?;

    let quote = Quotes::find_by_id(id)
        .one(&txn)
        .await?
        .ok_or(Error::QuoteNotFound { id })?;

    QuoteLineItems::delete_many()
        .filter(QuoteLineItemColumn::QuoteId.eq(id))
        .exec(&txn)
        .await?;
    quote.delete(&txn).await?;

    txn.commit().await?;
    info!(id, "quote deleted");
    Ok(())
}

/// Increments the counter named `key` and returns its new value.
///
/// Counters start at 1. The read and the increment happen in one
/// transaction, so concurrent callers never get the same value.
#[instrument(skip(db))]
pub async fn next_sequence(db: &DatabaseConnection, key: &str) -> Result<u32> {
    let txn = db.begin().await?;
    let now = Utc::now();

    let updated = SequenceCounters::update_many()
        .col_expr(
            SequenceCounterColumn::Value,
            Expr::col(SequenceCounterColumn::Value).add(1),
        )
        .col_expr(SequenceCounterColumn::UpdatedAt, Expr::value(now))
        .filter(SequenceCounterColumn::Key.eq(key))
        .exec(&txn)
        .await?;

    let value = if updated.rows_affected == 0 {
        let counter = sequence_counter::ActiveModel {
            key: Set(key.to_string()),
            value: Set(1),
            updated_at: Set(now),
            ..Default::default()
        };
        counter.insert(&txn).await?.value
    } else {
        SequenceCounters::find()
            .filter(SequenceCounterColumn::Key.eq(key))
            .one(&txn)
            .await?
            .map(|counter| counter.value)
            .ok_or_else(|| Error::InvalidData {
                message: format!("Sequence counter '{key}' vanished during update"),
            })?
    };

    txn.commit().await?;

    let value = u32::try_from(value).map_err(|_| Error::InvalidData {
        message: format!("Sequence counter '{key}' is out of range: {value}"),
    })?;
    debug!(key, value, "sequence advanced");
    Ok(value)
}

/// Draws the next sequence for `scope` and formats it.
#[instrument(skip(db, format))]
pub async fn next_number(
    db: &DatabaseConnection,
    scope: &str,
    format: &NumberingFormat,
    today: NaiveDate,
) -> Result<String> {
    let key = format.counter_key(scope, today);
    let sequence = next_sequence(db, &key).await?;
    Ok(format.format(sequence, today))
}

/// Next quote number, e.g. `DEVIS-2026-008`.
pub async fn next_quote_number(
    db: &DatabaseConnection,
    format: &NumberingFormat,
    today: NaiveDate,
) -> Result<String> {
    next_number(db, QUOTE_SCOPE, format, today).await
}

/// Next invoice number, e.g. `FACT-2026-003`.
pub async fn next_invoice_number(
    db: &DatabaseConnection,
    format: &NumberingFormat,
    today: NaiveDate,
) -> Result<String> {
    next_number(db, INVOICE_SCOPE, format, today).await
}

/// Inserts a new invoice, or updates the payment state of a stored one.
#[instrument(skip(db, invoice), fields(number = %invoice.number))]
pub async fn save_invoice(db: &DatabaseConnection, invoice: &Invoice) -> Result<Invoice> {
    let model = if let Some(id) = invoice.id {
        let row = invoice::ActiveModel {
            id: Set(id),
            status: Set(invoice.status.as_str().to_string()),
            paid_amount: Set(money_column(invoice.paid_amount)),
            ..Default::default()
        };
        match row.update(db).await {
            Err(DbErr::RecordNotUpdated) => return Err(Error::InvoiceNotFound { id }),
            other => other?,
        }
    } else {
        invoice::ActiveModel {
            id: NotSet,
            quote_id: Set(invoice.quote_id),
            client_id: Set(invoice.client_id),
            project_id: Set(invoice.project_id),
            number: Set(invoice.number.clone()),
            kind: Set(invoice.kind.as_str().to_string()),
            status: Set(invoice.status.as_str().to_string()),
            issue_date: Set(invoice.issue_date),
            due_date: Set(invoice.due_date),
            total_excl_tax: Set(money_column(invoice.total_excl_tax)),
            total_tax: Set(money_column(invoice.total_tax)),
            total_incl_tax: Set(money_column(invoice.total_incl_tax)),
            paid_amount: Set(money_column(invoice.paid_amount)),
            created_at: Set(Utc::now()),
        }
        .insert(db)
        .await?
    };
    invoice_from_row(model)
}

/// Invoices issued against a quote, oldest first.
#[instrument(skip(db))]
pub async fn invoices_for_quote(
    db: &DatabaseConnection,
    quote_id: i64,
) -> Result<Vec<Invoice>> {
    Invoices::find()
        .filter(InvoiceColumn::QuoteId.eq(quote_id))
        .order_by_asc(InvoiceColumn::IssueDate)
        .order_by_asc(InvoiceColumn::Id)
        .all(db)
        .await?
        .into_iter()
        .map(invoice_from_row)
        .collect()
}

/// Builds, numbers and stores an invoice for a stored quote.
///
/// The invoice number is only drawn once the invoice is known to be valid,
/// so a refused request does not leave a gap in the numbering.
///
/// # Errors
/// - `Error::QuoteNotFound` if there is no such quote
/// - any error of [`Invoice::for_quote`]
#[instrument(skip(db, numbering))]
pub async fn issue_invoice(
    db: &DatabaseConnection,
    quote_id: i64,
    request: InvoiceRequest,
    numbering: &NumberingFormat,
    issue_date: NaiveDate,
    payment_terms_days: u32,
) -> Result<Invoice> {
    let quote = load_quote(db, quote_id)
        .await?
        .ok_or(Error::QuoteNotFound { id: quote_id })?;
    let previous = invoices_for_quote(db, quote_id).await?;

    let terms = InvoiceTerms {
        number: String::new(),
        issue_date,
        payment_terms_days,
    };
    let mut invoice = Invoice::for_quote(&quote, request, &previous, terms)?;
    invoice.number = next_invoice_number(db, numbering, issue_date).await?;

    let saved = save_invoice(db, &invoice).await?;
    info!(
        number = %saved.number,
        kind = %saved.kind,
        total = %saved.total_incl_tax,
        "invoice issued"
    );
    Ok(saved)
}

/// Records a payment against a stored invoice.
///
/// # Errors
/// - `Error::InvoiceNotFound` if there is no such invoice
/// - `Error::InvalidAmount` for a zero or negative payment
#[instrument(skip(db))]
pub async fn record_payment(
    db: &DatabaseConnection,
    invoice_id: i64,
    amount: Decimal,
) -> Result<Invoice> {
    let txn = db.begin().await?;

    let row = Invoices::find_by_id(invoice_id)
        .one(&txn)
        .await?
        .ok_or(Error::InvoiceNotFound { id: invoice_id })?;
    let mut invoice = invoice_from_row(row)?;
    invoice.mark_paid(amount)?;

    invoice::ActiveModel {
        id: Set(invoice_id),
        status: Set(invoice.status.as_str().to_string()),
        paid_amount: Set(money_column(invoice.paid_amount)),
        ..Default::default()
    }
    .update(&txn)
    .await?;

    txn.commit().await?;
    info!(
        number = %invoice.number,
        balance_due = %invoice.balance_due(),
        "payment recorded"
    );
    Ok(invoice)
}

/// Derived amounts are stored with exactly two decimals.
fn money_column(value: Decimal) -> String {
    format!("{:.2}", round2(value))
}

fn quote_header(quote: &Quote) -> quote::ActiveModel {
    quote::ActiveModel {
        number: Set(quote.number.clone()),
        client_id: Set(quote.client_id),
        project_id: Set(quote.project_id),
        status: Set(quote.status().as_str().to_string()),
        issue_date: Set(quote.issue_date),
        valid_until: Set(quote.valid_until),
        notes: Set(quote.notes.clone()),
        conditions: Set(quote.conditions.clone()),
        deposit_percent: Set(i32::from(quote.deposit_percent())),
        total_excl_tax: Set(money_column(quote.total_excl_tax())),
        total_tax: Set(money_column(quote.total_tax())),
        total_incl_tax: Set(money_column(quote.total_incl_tax())),
        deposit_amount: Set(money_column(quote.deposit_amount())),
        updated_at: Set(Utc::now()),
        ..Default::default()
    }
}

async fn load_line_items<C>(db: &C, quote_id: i64) -> Result<Vec<LineItem>>
where
    C: ConnectionTrait,
{
    QuoteLineItems::find()
        .filter(QuoteLineItemColumn::QuoteId.eq(quote_id))
        .order_by_asc(QuoteLineItemColumn::Position)
        .all(db)
        .await?
        .into_iter()
        .map(line_item_from_row)
        .collect()
}

fn quote_from_rows(row: quote::Model, items: Vec<LineItem>) -> Result<Quote> {
    let status = row.status.parse()?;
    let mut header = Quote::new(&row.number, row.client_id, row.issue_date);
    header.id = Some(row.id);
    header.project_id = row.project_id;
    header.valid_until = row.valid_until;
    header.notes = row.notes;
    header.conditions = row.conditions;
    header.set_deposit_percent(u8::try_from(row.deposit_percent.clamp(0, 100)).unwrap_or(0));

    let quote = Quote::restore(header, status, row.version, items);
    if money_column(quote.total_incl_tax()) != row.total_incl_tax {
        warn!(
            id = row.id,
            stored = %row.total_incl_tax,
            computed = %quote.total_incl_tax(),
            "stored totals were stale, using recomputed values"
        );
    }
    Ok(quote)
}

fn line_item_row(quote_id: i64, item: &LineItem) -> Result<quote_line_item::ActiveModel> {
    let billable = item.billable();
    let heading = item.heading();
    let body = match &item.kind {
        LineKind::Text(text) => text.body.clone(),
        _ => billable.map(|line| line.body.clone()).unwrap_or_default(),
    };
    let label = match &item.kind {
        LineKind::Text(_) => String::new(),
        _ => item.label().to_string(),
    };
    let decimal = |value: Option<Decimal>| value.unwrap_or_default().to_string();

    Ok(quote_line_item::ActiveModel {
        id: NotSet,
        quote_id: Set(quote_id),
        position: Set(item.position),
        kind: Set(item.kind.tag().to_string()),
        label: Set(label),
        body: Set(body),
        quantity: Set(decimal(billable.map(|line| line.quantity))),
        unit: Set(billable.map(|line| line.unit.clone()).unwrap_or_default()),
        unit_price: Set(decimal(billable.map(|line| line.unit_price))),
        tax_rate_percent: Set(decimal(billable.map(|line| line.tax_rate_percent))),
        line_total_excl_tax: Set(money_column(
            billable.map_or(Decimal::ZERO, |line| line.line_total_excl_tax),
        )),
        section_subtotal: Set(money_column(
            heading.map_or(Decimal::ZERO, |h| h.section_subtotal),
        )),
        technical_details: Set(serde_json::to_string(item.technical_details())?),
    })
}

fn line_item_from_row(row: quote_line_item::Model) -> Result<LineItem> {
    let technical_details: Vec<String> = if row.technical_details.trim().is_empty() {
        Vec::new()
    } else {
        serde_json::from_str(&row.technical_details)?
    };
    let heading = Heading {
        label: row.label.clone(),
        section_subtotal: coerce_str(&row.section_subtotal),
    };

    let kind = match row.kind.as_str() {
        "title" => LineKind::Section(heading),
        "subtitle" => LineKind::Subsection(heading),
        "text" => LineKind::Text(TextBlock { body: row.body }),
        tag @ ("material" | "labor" | "work") => {
            let line = BillableLine {
                label: row.label,
                body: row.body,
                quantity: coerce_str(&row.quantity),
                unit: row.unit,
                unit_price: coerce_str(&row.unit_price),
                tax_rate_percent: coerce_str(&row.tax_rate_percent),
                line_total_excl_tax: coerce_str(&row.line_total_excl_tax),
            };
            let composite = CompositeLine {
                line,
                technical_details,
            };
            match tag {
                "labor" => LineKind::Labor(composite.line),
                "work" => LineKind::Work(composite),
                _ => LineKind::Material(composite),
            }
        }
        other => {
            debug!(kind = other, position = row.position, "unrecognized stored row kind");
            LineKind::Unknown
        }
    };

    Ok(LineItem {
        position: row.position,
        kind,
    })
}

fn invoice_from_row(row: invoice::Model) -> Result<Invoice> {
    Ok(Invoice {
        id: Some(row.id),
        quote_id: row.quote_id,
        client_id: row.client_id,
        project_id: row.project_id,
        number: row.number,
        kind: row.kind.parse()?,
        status: row.status.parse()?,
        issue_date: row.issue_date,
        due_date: row.due_date,
        total_excl_tax: coerce_str(&row.total_excl_tax),
        total_tax: coerce_str(&row.total_tax),
        total_incl_tax: coerce_str(&row.total_incl_tax),
        paid_amount: coerce_str(&row.paid_amount),
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::{
        core::{
            invoice::{InvoiceKind, InvoiceStatus},
            numbering::{DateComponent, Separator},
            quote::QuoteStatus,
        },
        test_utils::{sample_quote, save_signed_quote, setup_test_db},
    };
    use rust_decimal_macros::dec;
    use sea_orm::{DatabaseBackend, MockDatabase};

    fn may_2026() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 5, 4).unwrap()
    }

    #[tokio::test]
    async fn test_save_and_load_quote() -> Result<()> {
        let db = setup_test_db().await?;
        let mut quote = sample_quote();
        quote.notes = Some("Accès par la cour".to_string());
        quote
            .update_line_item(2, |item| {
                item.push_technical_detail("Rail R48");
            })
            .unwrap();

        let saved = save_quote(&db, &quote).await?;
        assert!(saved.id.is_some());
        assert_eq!(saved.version(), 1);

        let loaded = load_quote(&db, saved.id.unwrap()).await?.unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(loaded.line_items()[2].technical_details(), ["Rail R48"]);
        Ok(())
    }

    #[tokio::test]
    async fn test_update_bumps_version_and_replaces_rows() -> Result<()> {
        let db = setup_test_db().await?;
        let mut quote = save_quote(&db, &sample_quote()).await?;
        let before = quote.line_items().len();

        quote.remove_line_item(before - 1).unwrap();
        let quote = save_quote(&db, &quote).await?;
        assert_eq!(quote.version(), 2);

        let loaded = load_quote(&db, quote.id.unwrap()).await?.unwrap();
        assert_eq!(loaded.line_items().len(), before - 1);
        assert_eq!(loaded.total_incl_tax(), quote.total_incl_tax());
        Ok(())
    }

    #[tokio::test]
    async fn test_stale_save_is_a_version_conflict() -> Result<()> {
        let db = setup_test_db().await?;
        let original = save_quote(&db, &sample_quote()).await?;

        let mut first = original.clone();
        first.set_deposit_percent(50);
        save_quote(&db, &first).await?;

        let mut second = original;
        second.set_deposit_percent(10);
        let result = save_quote(&db, &second).await;

        assert!(matches!(
            result,
            Err(Error::VersionConflict {
                expected: 1,
                found: 2,
                ..
            })
        ));
        let stored = load_quote(&db, first.id.unwrap()).await?.unwrap();
        assert_eq!(stored.deposit_percent(), 50);
        Ok(())
    }

    #[tokio::test]
    async fn test_list_and_delete() -> Result<()> {
        let db = setup_test_db().await?;
        let a = save_quote(&db, &sample_quote()).await?;
        let mut other = sample_quote();
        other.client_id = 2;
        save_quote(&db, &other).await?;

        let listed = list_quotes_for_client(&db, a.client_id).await?;
        assert_eq!(listed.len(), 1);

        delete_quote(&db, a.id.unwrap()).await?;
        assert!(load_quote(&db, a.id.unwrap()).await?.is_none());
        assert!(matches!(
            delete_quote(&db, a.id.unwrap()).await,
            Err(Error::QuoteNotFound { .. })
        ));

        let orphans = QuoteLineItems::find()
            .filter(QuoteLineItemColumn::QuoteId.eq(a.id.unwrap()))
            .all(&db)
            .await?;
        assert!(orphans.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_sequences_are_per_key() -> Result<()> {
        let db = setup_test_db().await?;
        assert_eq!(next_sequence(&db, "quote:DEVIS:2026").await?, 1);
        assert_eq!(next_sequence(&db, "quote:DEVIS:2026").await?, 2);
        assert_eq!(next_sequence(&db, "quote:DEVIS:2027").await?, 1);
        assert_eq!(next_sequence(&db, "quote:DEVIS:2026").await?, 3);
        Ok(())
    }

    #[tokio::test]
    async fn test_next_numbers() -> Result<()> {
        let db = setup_test_db().await?;
        let quotes = NumberingFormat::quotes();
        assert_eq!(next_quote_number(&db, &quotes, may_2026()).await?, "DEVIS-2026-001");
        assert_eq!(next_quote_number(&db, &quotes, may_2026()).await?, "DEVIS-2026-002");

        let invoices = NumberingFormat {
            separator: Separator::Slash,
            date_component: DateComponent::YearMonth,
            width: 4,
            ..NumberingFormat::invoices()
        };
        assert_eq!(
            next_invoice_number(&db, &invoices, may_2026()).await?,
            "FACT/202605/0001"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_issue_invoices_and_payment() -> Result<()> {
        let db = setup_test_db().await?;
        let quote = save_signed_quote(&db, 30).await?;
        let quote_id = quote.id.unwrap();
        let numbering = NumberingFormat::invoices();

        let deposit =
            issue_invoice(&db, quote_id, InvoiceRequest::Deposit, &numbering, may_2026(), 30)
                .await?;
        assert_eq!(deposit.number, "FACT-2026-001");
        assert_eq!(deposit.total_incl_tax, quote.deposit_amount());

        let last =
            issue_invoice(&db, quote_id, InvoiceRequest::Final, &numbering, may_2026(), 30)
                .await?;
        assert_eq!(last.kind, InvoiceKind::Final);
        assert_eq!(
            deposit.total_incl_tax + last.total_incl_tax,
            quote.total_incl_tax()
        );

        let issued = invoices_for_quote(&db, quote_id).await?;
        assert_eq!(issued, vec![deposit.clone(), last]);

        let paid = record_payment(&db, deposit.id.unwrap(), deposit.total_incl_tax).await?;
        assert_eq!(paid.status, InvoiceStatus::Paid);
        let reloaded = invoices_for_quote(&db, quote_id).await?;
        assert_eq!(reloaded[0].status, InvoiceStatus::Paid);
        assert_eq!(reloaded[0].balance_due(), Decimal::ZERO);
        Ok(())
    }

    #[tokio::test]
    async fn test_refused_invoice_does_not_consume_a_number() -> Result<()> {
        let db = setup_test_db().await?;
        let draft = save_quote(&db, &sample_quote()).await?;
        assert_eq!(draft.status(), QuoteStatus::Draft);
        let numbering = NumberingFormat::invoices();

        let refused = issue_invoice(
            &db,
            draft.id.unwrap(),
            InvoiceRequest::Final,
            &numbering,
            may_2026(),
            30,
        )
        .await;
        assert!(matches!(refused, Err(Error::QuoteNotSigned { .. })));
        assert_eq!(
            next_invoice_number(&db, &numbering, may_2026()).await?,
            "FACT-2026-001"
        );
        Ok(())
    }

    #[tokio::test]
    async fn test_payment_on_missing_invoice() -> Result<()> {
        let db = setup_test_db().await?;
        let result = record_payment(&db, 42, dec!(10)).await;
        assert!(matches!(result, Err(Error::InvoiceNotFound { id: 42 })));
        Ok(())
    }

    #[tokio::test]
    async fn test_load_missing_quote_with_mock() -> Result<()> {
        let db = MockDatabase::new(DatabaseBackend::Sqlite)
            .append_query_results([Vec::<quote::Model>::new()])
            .into_connection();
        assert!(load_quote(&db, 7).await?.is_none());
        Ok(())
    }

    #[test]
    fn test_row_mapping_keeps_every_kind() {
        let quote = sample_quote();
        for item in quote.line_items() {
            let active = line_item_row(1, item).unwrap();
            let row = quote_line_item::Model {
                id: 1,
                quote_id: 1,
                position: active.position.unwrap(),
                kind: active.kind.unwrap(),
                label: active.label.unwrap(),
                body: active.body.unwrap(),
                quantity: active.quantity.unwrap(),
                unit: active.unit.unwrap(),
                unit_price: active.unit_price.unwrap(),
                tax_rate_percent: active.tax_rate_percent.unwrap(),
                line_total_excl_tax: active.line_total_excl_tax.unwrap(),
                section_subtotal: active.section_subtotal.unwrap(),
                technical_details: active.technical_details.unwrap(),
            };
            assert_eq!(&line_item_from_row(row).unwrap(), item);
        }

        let legacy = quote_line_item::Model {
            id: 1,
            quote_id: 1,
            position: 4,
            kind: "promo".to_string(),
            label: String::new(),
            body: String::new(),
            quantity: String::new(),
            unit: String::new(),
            unit_price: String::new(),
            tax_rate_percent: String::new(),
            line_total_excl_tax: String::new(),
            section_subtotal: String::new(),
            technical_details: String::new(),
        };
        assert_eq!(
            line_item_from_row(legacy).unwrap(),
            LineItem {
                position: 4,
                kind: LineKind::Unknown
            }
        );
    }

    #[test]
    fn test_money_column_has_two_decimals() {
        assert_eq!(money_column(dec!(300)), "300.00");
        assert_eq!(money_column(dec!(0.125)), "0.13");
    }
}
