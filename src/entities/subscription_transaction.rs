//! Subscription transaction entity - Purchase of a recurring meal plan.
//!
//! One row for a (user, type) pair is enough to grant the entitlement; there is no
//! expiry or quantity tracking.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription purchase database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "sub_transactions")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Buyer
    #[serde(rename = "user")]
    pub username: String,
    /// Plan name (e.g. "Breakfasts", "Lunches")
    #[serde(rename = "type")]
    pub sub_type: String,
    /// Amount charged
    pub amount: f64,
    /// When the plan was bought
    #[serde(rename = "time")]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
