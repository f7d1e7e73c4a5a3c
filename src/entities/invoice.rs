//! Invoice entity - invoices issued against a signed quote.
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Invoice database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "invoices")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub quote_id: i64,
    pub client_id: i64,
    pub project_id: Option<i64>,
    #[sea_orm(unique)]
    pub number: String,
    /// `"deposit"`, `"intermediate"` or `"final"`
    pub kind: String,
    /// `"pending"` or `"paid"`
    pub status: String,
    pub issue_date: Date,
    pub due_date: Option<Date>,
    pub total_excl_tax: String,
    pub total_tax: String,
    pub total_incl_tax: String,
    pub paid_amount: String,
    pub created_at: DateTimeUtc,
}

/// Defines relationships between Invoice and other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    /// Each invoice bills one quote
    #[sea_orm(
        belongs_to = "super::quote::Entity",
        from = "Column::QuoteId",
        to = "super::quote::Column::Id"
    )]
    Quote,
}

impl Related<super::quote::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Quote.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
