//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables and their relationships.
//! Each entity has a Model struct for data and an Entity struct for operations.

pub mod invoice;
pub mod quote;
pub mod quote_line_item;
pub mod sequence_counter;

// Re-export specific types to avoid conflicts
pub use invoice::{Column as InvoiceColumn, Entity as Invoices, Model as InvoiceModel};
pub use quote::{Column as QuoteColumn, Entity as Quotes, Model as QuoteModel};
pub use quote_line_item::{
    Column as QuoteLineItemColumn, Entity as QuoteLineItems, Model as QuoteLineItemModel,
};
pub use sequence_counter::{
    Column as SequenceCounterColumn, Entity as SequenceCounters, Model as SequenceCounterModel,
};
