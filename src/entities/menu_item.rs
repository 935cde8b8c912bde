//! Menu item entity - A dish on sale with a finite number of portions.
//!
//! `ingredients` is descriptive text only; it is not linked to the ingredient stock.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Menu item database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "menu")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    /// Unique identifier for the dish
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Dish name
    pub name: String,
    /// Price per portion
    pub price: f64,
    /// Portions left; purchases are rejected at zero
    pub portions: i32,
    /// Course (e.g. "Soup", "Main course")
    #[serde(rename = "type")]
    pub dish_type: String,
    /// Meal the dish belongs to (e.g. "Breakfast", "Lunch")
    pub category: String,
    /// Composition as free text
    pub ingredients: String,
    /// When the dish was added
    #[serde(rename = "addedDate")]
    pub created_at: DateTimeUtc,
}

/// Menu items have no foreign-key relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
