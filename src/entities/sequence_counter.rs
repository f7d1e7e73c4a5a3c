//! Sequence counter entity - named counters behind document numbers.
//! Keys look like `"quote:DEVIS:2026"`; each key counts independently.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Counter database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sequence_counters")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Counter name
    #[sea_orm(unique)]
    pub key: String,
    /// Last value handed out
    pub value: i64,
    /// When the counter last moved
    pub updated_at: DateTimeUtc,
}

/// Counters have no relationships with other entities
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
