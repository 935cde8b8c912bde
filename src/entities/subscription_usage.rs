//! Subscription usage entity - One redemption of a meal plan on a calendar day.
//!
//! At most one row exists per (username, `sub_type`, date). The dispatcher enforces
//! this; the table only carries a non-unique lookup index.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Subscription usage database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "subscription_usage")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Who redeemed
    #[serde(rename = "user")]
    pub username: String,
    /// Plan name
    pub sub_type: String,
    /// Calendar day of the redemption
    pub date: Date,
    /// JSON array of dish names actually issued
    pub dishes_used: Json,
    /// When the redemption happened
    pub created_at: DateTimeUtc,
}

impl Model {
    /// Dish names recorded for this redemption.
    #[must_use]
    pub fn dish_names(&self) -> Vec<String> {
        serde_json::from_value(self.dishes_used.clone()).unwrap_or_default()
    }
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
