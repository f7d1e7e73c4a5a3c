//! Core business logic - framework-agnostic quote computation and storage.
//!
//! Everything except [`store`] and [`report::generate_quote_report`] is
//! synchronous and pure; the storage layer is the only async boundary.

/// Section hierarchy derived from row order
pub mod hierarchy;
/// Invoices billed against signed quotes
pub mod invoice;
/// Row model and its wire format
pub mod line_item;
/// Decimal rounding, coercion and display
pub mod money;
/// Document number formatting
pub mod numbering;
/// Quote aggregate
pub mod quote;
/// Display summaries
pub mod report;
/// `SeaORM` persistence
pub mod store;
/// Line, section and quote totals
pub mod totals;
/// Business-rule checks
pub mod validation;
