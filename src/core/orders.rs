//! Order business logic - Buying dishes and handing them out.
//!
//! A purchase debits the buyer, takes one portion and records a `Paid` order in the
//! caller's transaction. Confirmation moves an order from `Paid` to `Issued` once; the
//! owner lookup is only used for the notification and never blocks the status change.

use crate::{
    core::{
        notify::{self, Audience, Draft},
        store,
    },
    entities::{NotificationKind, Order, OrderStatus, order},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ConnectionTrait, QueryOrder, Set, prelude::*};
use tracing::{info, warn};

/// Records a new `Paid` order.
pub async fn create_order<C>(
    db: &C,
    username: &str,
    dish_name: &str,
    price: f64,
    allergies: &str,
    now: DateTime<Utc>,
) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    let order = order::ActiveModel {
        username: Set(username.to_string()),
        dish_name: Set(dish_name.to_string()),
        price: Set(price),
        status: Set(OrderStatus::Paid),
        allergies: Set(allergies.to_string()),
        issued_at: Set(None),
        created_at: Set(now),
        ..Default::default()
    };
    order.insert(db).await.map_err(Into::into)
}

/// Buys one portion of a dish for `username`.
///
/// The balance debit and the portion decrement are both conditional updates, so they
/// either apply together or the function fails before anything else is written. On
/// success a `Paid` order is recorded and the buyer gets a payment notification.
///
/// Rejected with [`Error::InsufficientFundsOrStock`] when the dish or user does not
/// exist, the balance is below the price, or no portions are left. On rejection nothing
/// persists once the caller drops its scope.
///
/// # Arguments
/// * `db` - The caller's open transaction
/// * `username` - The buyer
/// * `menu_id` - The dish to buy
/// * `allergies` - The buyer's allergy note, copied onto the order
/// * `now` - Timestamp for the order and its notification
pub async fn purchase_dish<C>(
    db: &C,
    username: &str,
    menu_id: i64,
    allergies: &str,
    now: DateTime<Utc>,
) -> Result<order::Model>
where
    C: ConnectionTrait,
{
    let Some(dish) = store::find_menu_item(db, menu_id).await? else {
        warn!(menu_id, "purchase of unknown dish");
        return Err(Error::InsufficientFundsOrStock {
            dish: menu_id.to_string(),
        });
    };

    let rejected = || Error::InsufficientFundsOrStock {
        dish: dish.name.clone(),
    };

    // A rejection after the debit is still all-or-nothing: the caller's scope rolls back.
    if dish.portions <= 0 {
        warn!(username, dish = %dish.name, "dish sold out");
        return Err(rejected());
    }
    if !store::debit_balance(db, username, dish.price).await? {
        warn!(username, dish = %dish.name, "balance check failed");
        return Err(rejected());
    }
    if !store::take_portion(db, menu_id).await? {
        return Err(rejected());
    }

    let order = create_order(db, username, &dish.name, dish.price, allergies, now).await?;
    notify::emit(
        db,
        Audience::User(username.to_string()),
        Draft::new(
            NotificationKind::Payment,
            "Payment",
            format!("Order {} accepted", dish.name),
        ),
        now,
    )
    .await?;

    info!(username, dish = %dish.name, order_id = order.id, "dish purchased");
    Ok(order)
}

/// Marks an order as issued.
///
/// A missing or already issued order is not an error: the filtered update matches no
/// row and no notification is sent.
pub async fn confirm_order<C>(db: &C, order_id: i64, now: DateTime<Utc>) -> Result<()>
where
    C: ConnectionTrait,
{
    let existing = Order::find_by_id(order_id).one(db).await?;

    let result = Order::update_many()
        .col_expr(order::Column::Status, Expr::value(OrderStatus::Issued))
        .col_expr(order::Column::IssuedAt, Expr::value(Some(now)))
        .filter(order::Column::Id.eq(order_id))
        .filter(order::Column::Status.eq(OrderStatus::Paid))
        .exec(db)
        .await?;

    match existing {
        Some(order) if result.rows_affected == 1 => {
            notify::emit(
                db,
                Audience::User(order.username.clone()),
                Draft::new(
                    NotificationKind::Order,
                    "Order issued",
                    format!("{}: your order is ready for pickup", order.dish_name),
                ),
                now,
            )
            .await?;
            info!(order_id, username = %order.username, "order issued");
        }
        Some(_) => info!(order_id, "order already issued"),
        None => warn!(order_id, "confirmed order does not exist"),
    }
    Ok(())
}

/// Every order, newest first.
pub async fn get_orders<C>(db: &C) -> Result<Vec<order::Model>>
where
    C: ConnectionTrait,
{
    Order::find()
        .order_by_desc(order::Column::Id)
        .all(db)
        .await
        .map_err(Into::into)
}
