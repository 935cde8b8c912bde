//! Ingredient entity - Kitchen stock ledger entry.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Ingredient database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "ingredients")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Ingredient name
    pub name: String,
    /// Amount in stock, measured in `unit`
    pub amount: f64,
    /// Unit of measure (kg, l, pcs)
    pub unit: String,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
