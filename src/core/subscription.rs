//! Subscription business logic - Buying meal plans and redeeming them.
//!
//! Buying a plan records a subscription transaction; any such row for a (user, type)
//! pair is the entitlement. Redemption is capped at once per calendar day per type and
//! issues free (price 0) orders for the selected dishes that still have portions.

use crate::{
    core::{
        notify::{self, Audience, Draft},
        orders, store,
    },
    entities::{
        NotificationKind, SubscriptionTransaction, SubscriptionUsage, subscription_transaction,
        subscription_usage,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Local, NaiveDate, Utc};
use sea_orm::{ConnectionTrait, Set, prelude::*};
use tracing::{debug, info, warn};

/// The calendar day a redemption counts against, in the server's local time zone.
#[must_use]
pub fn calendar_day(now: DateTime<Utc>) -> NaiveDate {
    now.with_timezone(&Local).date_naive()
}

/// A redemption request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redemption {
    /// Who is redeeming
    pub username: String,
    /// Plan type
    pub sub_type: String,
    /// Selected menu ids, in the order they were picked
    pub dishes: Vec<i64>,
    /// Allergy note copied onto each order
    pub allergies: String,
}

/// Debits the plan price and records the purchase.
///
/// Unlike dish purchases this has no stock to check, but the balance rule still holds:
/// an unaffordable plan is rejected with [`Error::InsufficientFunds`].
pub async fn purchase_subscription<C>(
    db: &C,
    username: &str,
    sub_type: &str,
    price: f64,
    now: DateTime<Utc>,
) -> Result<subscription_transaction::Model>
where
    C: ConnectionTrait,
{
    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidAmount { amount: price });
    }
    let buyer = store::require_user(db, username).await?;
    if !store::debit_balance(db, username, price).await? {
        return Err(Error::InsufficientFunds {
            current: buyer.balance,
            required: price,
        });
    }

    let row = subscription_transaction::ActiveModel {
        username: Set(username.to_string()),
        sub_type: Set(sub_type.to_string()),
        amount: Set(price),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    notify::emit(
        db,
        Audience::User(username.to_string()),
        Draft::new(
            NotificationKind::Subscription,
            "Subscription purchased",
            format!("Subscription \"{sub_type}\" paid: {price:.2}"),
        ),
        now,
    )
    .await?;

    info!(username, sub_type, price, "subscription purchased");
    Ok(row)
}

/// Whether the user ever bought a plan of this type.
pub async fn has_entitlement<C>(db: &C, username: &str, sub_type: &str) -> Result<bool>
where
    C: ConnectionTrait,
{
    let row = SubscriptionTransaction::find()
        .filter(subscription_transaction::Column::Username.eq(username))
        .filter(subscription_transaction::Column::SubType.eq(sub_type))
        .one(db)
        .await?;
    Ok(row.is_some())
}

/// The usage row for (user, type, day), if any.
pub async fn find_usage<C>(
    db: &C,
    username: &str,
    sub_type: &str,
    day: NaiveDate,
) -> Result<Option<subscription_usage::Model>>
where
    C: ConnectionTrait,
{
    SubscriptionUsage::find()
        .filter(subscription_usage::Column::Username.eq(username))
        .filter(subscription_usage::Column::SubType.eq(sub_type))
        .filter(subscription_usage::Column::Date.eq(day))
        .one(db)
        .await
        .map_err(Into::into)
}

/// Redeems today's meals under a plan.
///
/// Checks, in order: entitlement ([`Error::NoEntitlement`]), no redemption yet today
/// ([`Error::AlreadyRedeemedToday`]), at least one dish ([`Error::NoDishesSelected`]).
/// Dishes are taken in request order; sold-out or unknown dishes are skipped. The usage
/// row is written even when every dish was skipped, which uses up the day.
///
/// Each issued dish becomes a price-0 order. The user gets one notification listing
/// the dishes that were actually issued.
///
/// # Arguments
/// * `db` - The caller's open transaction
/// * `redemption` - The user and plan, plus the selected dishes in order
/// * `now` - Decides the calendar day via [`calendar_day`] and stamps the new rows
pub async fn redeem_subscription<C>(
    db: &C,
    redemption: &Redemption,
    now: DateTime<Utc>,
) -> Result<subscription_usage::Model>
where
    C: ConnectionTrait,
{
    let Redemption {
        username,
        sub_type,
        dishes,
        allergies,
    } = redemption;

    if !has_entitlement(db, username, sub_type).await? {
        warn!(%username, %sub_type, "redemption without entitlement");
        return Err(Error::NoEntitlement {
            sub_type: sub_type.clone(),
        });
    }

    let today = calendar_day(now);
    if find_usage(db, username, sub_type, today).await?.is_some() {
        warn!(%username, %sub_type, %today, "subscription already used today");
        return Err(Error::AlreadyRedeemedToday {
            sub_type: sub_type.clone(),
        });
    }

    if dishes.is_empty() {
        return Err(Error::NoDishesSelected);
    }

    let mut issued = Vec::with_capacity(dishes.len());
    for &menu_id in dishes {
        let Some(dish) = store::find_menu_item(db, menu_id).await? else {
            debug!(menu_id, "selected dish does not exist, skipping");
            continue;
        };
        if !store::take_portion(db, menu_id).await? {
            debug!(menu_id, dish = %dish.name, "selected dish sold out, skipping");
            continue;
        }
        orders::create_order(db, username, &dish.name, 0.0, allergies, now).await?;
        issued.push(dish.name);
    }

    let usage = subscription_usage::ActiveModel {
        username: Set(username.clone()),
        sub_type: Set(sub_type.clone()),
        date: Set(today),
        dishes_used: Set(serde_json::Value::from(issued.clone())),
        created_at: Set(now),
        ..Default::default()
    }
    .insert(db)
    .await?;

    notify::emit(
        db,
        Audience::User(username.clone()),
        Draft::new(
            NotificationKind::Subscription,
            "Subscription used",
            format!("{sub_type}: {}", issued.join(", ")),
        ),
        now,
    )
    .await?;

    info!(%username, %sub_type, dishes = issued.len(), "subscription redeemed");
    Ok(usage)
}
