//! Order entity - One purchased (or subscription-redeemed) dish.
//!
//! Orders are created as `Paid` and move to `Issued` once, when the kitchen hands the
//! dish out.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Order lifecycle state
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
pub enum OrderStatus {
    /// Paid for, waiting to be issued
    #[sea_orm(string_value = "Paid")]
    Paid,
    /// Handed out to the student
    #[sea_orm(string_value = "Issued")]
    Issued,
}

/// Order database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "orders")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the order
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Username of the buyer
    #[serde(rename = "user")]
    pub username: String,
    /// Dish name at the time of purchase
    #[serde(rename = "name")]
    pub dish_name: String,
    /// Amount charged; 0 for subscription redemptions
    pub price: f64,
    /// Current state
    pub status: OrderStatus,
    /// Snapshot of the buyer's allergy note
    pub allergies: String,
    /// Set when the order is confirmed
    pub issued_at: Option<DateTimeUtc>,
    /// When the order was placed
    pub created_at: DateTimeUtc,
}

/// Orders reference users and dishes by value, not by foreign key
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
