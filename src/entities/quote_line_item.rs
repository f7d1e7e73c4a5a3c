//! Quote line item entity - the ordered rows of a quote.
//!
//! Every kind of row shares one table; columns that do not apply to a kind
//! are left empty. Decimal columns are canonical decimal strings.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Line item database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quote_line_items")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// ID of the quote this row belongs to
    pub quote_id: i64,
    /// 1-based order within the quote
    pub position: i32,
    /// Row tag: `"title"`, `"subtitle"`, `"text"`, `"material"`, `"labor"`, `"work"`
    pub kind: String,
    /// Heading or billable title
    pub label: String,
    /// Description, or the content of a text row
    pub body: String,
    pub quantity: String,
    pub unit: String,
    pub unit_price: String,
    pub tax_rate_percent: String,
    pub line_total_excl_tax: String,
    pub section_subtotal: String,
    /// JSON array of component details for material and work rows
    pub technical_details: String,
}

/// Defines relationships between line items and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each line item belongs to one quote
    #[sea_orm(
        belongs_to = "super::quote::Entity",
        from = "Column::QuoteId",
        to = "super::quote::Column::Id",
        on_delete = "Cascade"
    )]
    Quote,
}

impl Related<super::quote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
