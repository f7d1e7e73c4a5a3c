//! Quote entity - one row per quote ("devis").
//!
//! Money columns hold canonical decimal strings (two decimal places) so that
//! amounts survive `SQLite` storage exactly. The totals are a snapshot of what
//! the calculator produced at save time; loading always recomputes them.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Quote database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "quotes")]
pub struct Model {
    /// Unique identifier for the quote
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Document number (e.g. `"DEVIS-2026-007"`)
    pub number: String,
    pub client_id: i64,
    pub project_id: Option<i64>,
    /// `"draft"`, `"sent"`, `"signed"` or `"rejected"`
    pub status: String,
    pub issue_date: Date,
    pub valid_until: Option<Date>,
    pub notes: Option<String>,
    pub conditions: Option<String>,
    /// Deposit percentage, 0 to 100
    pub deposit_percent: i32,
    pub total_excl_tax: String,
    pub total_tax: String,
    pub total_incl_tax: String,
    pub deposit_amount: String,
    /// Optimistic concurrency stamp, bumped on every update
    pub version: i32,
    pub created_at: DateTimeUtc,
    pub updated_at: DateTimeUtc,
}

/// Defines relationships between Quote and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// One quote has many line items
    #[sea_orm(has_many = "super::quote_line_item::Entity")]
    LineItems,
    /// One quote has many invoices
    #[sea_orm(has_many = "super::invoice::Entity")]
    Invoices,
}

impl Related<super::quote_line_item::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::LineItems.def()
    }
}

impl Related<super::invoice::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Invoices.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
