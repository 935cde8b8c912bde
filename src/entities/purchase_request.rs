//! Purchase request entity - A chef's request to buy supplies.
//!
//! Created as `Pending`, decided once by an admin.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Purchase request decision state
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum PurchaseStatus {
    /// Waiting for an admin
    #[sea_orm(string_value = "Pending")]
    Pending,
    /// Approved by an admin
    #[sea_orm(string_value = "Approved")]
    Approved,
    /// Rejected by an admin
    #[sea_orm(string_value = "Rejected")]
    Rejected,
}

/// Purchase request database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "purchases")]
pub struct Model {
    /// Unique identifier
    #[sea_orm(primary_key)]
    pub id: i64,
    /// What to buy
    pub item: String,
    /// Quantity as written by the chef (e.g. "10 kg")
    pub qty: String,
    /// Expected cost
    pub price: f64,
    /// Decision state
    pub status: PurchaseStatus,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
