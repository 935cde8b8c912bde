//! Menu business logic - Adding dishes and adjusting portions.

use crate::{
    core::notify::{self, Audience, Draft},
    entities::{MenuItem, NotificationKind, Role, menu_item},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ConnectionTrait, QueryOrder, Set, prelude::*};
use tracing::{info, warn};

/// Fields of a dish being added to the menu.
#[derive(Debug, Clone, PartialEq)]
pub struct NewDish {
    /// Dish name
    pub name: String,
    /// Price per portion
    pub price: f64,
    /// Initial number of portions
    pub portions: i32,
    /// Course
    pub dish_type: String,
    /// Meal category
    pub category: String,
    /// Composition text
    pub ingredients: String,
}

/// Inserts a dish and tells every student about it.
///
/// Price and portions are validated by the command layer; this re-checks them so the
/// function is safe to call directly.
pub async fn add_menu_item<C>(db: &C, dish: NewDish, now: DateTime<Utc>) -> Result<menu_item::Model>
where
    C: ConnectionTrait,
{
    if dish.name.trim().is_empty() {
        return Err(Error::validation("Dish name cannot be empty"));
    }
    if !dish.price.is_finite() || dish.price < 0.0 {
        return Err(Error::InvalidAmount { amount: dish.price });
    }
    if dish.portions < 0 {
        return Err(Error::validation("portions cannot be negative"));
    }

    let item = menu_item::ActiveModel {
        name: Set(dish.name.trim().to_string()),
        price: Set(dish.price),
        portions: Set(dish.portions),
        dish_type: Set(dish.dish_type),
        category: Set(dish.category),
        ingredients: Set(dish.ingredients),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    notify::emit(
        db,
        Audience::Role(Role::Student),
        Draft::new(
            NotificationKind::Menu,
            "New dish!",
            format!("Added to the menu: {} ({})", item.name, item.dish_type),
        ),
        now,
    )
    .await?;

    info!(dish_id = item.id, name = %item.name, "dish added");
    Ok(item)
}

/// Overwrites the number of portions left. Zero is allowed, negative is not.
pub async fn update_stock<C>(db: &C, menu_id: i64, portions: i32) -> Result<()>
where
    C: ConnectionTrait,
{
    if portions < 0 {
        return Err(Error::validation("portions cannot be negative"));
    }
    let result = MenuItem::update_many()
        .col_expr(menu_item::Column::Portions, Expr::value(portions))
        .filter(menu_item::Column::Id.eq(menu_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        warn!(menu_id, "stock update for unknown dish");
    } else {
        info!(menu_id, portions, "stock updated");
    }
    Ok(())
}

/// The whole menu, newest dish first.
pub async fn get_menu<C>(db: &C) -> Result<Vec<menu_item::Model>>
where
    C: ConnectionTrait,
{
    MenuItem::find()
        .order_by_desc(menu_item::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
