//! Kitchen supply business logic - Ingredient stock, purchase requests and reviews.
//!
//! Purchase requests are raised by chefs (admins are notified) and decided once by an
//! admin (chefs are notified). Deciding a request that does not exist, or was already
//! decided, succeeds without a notification.

use crate::{
    core::notify::{self, Audience, Draft},
    entities::{
        Ingredient, NotificationKind, PurchaseRequest, PurchaseStatus, Role, ingredient,
        purchase_request, review,
    },
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ConnectionTrait, Set, prelude::*};
use tracing::{info, warn};

/// Adds an ingredient to the ledger with nothing in stock.
pub async fn add_ingredient<C>(db: &C, name: &str, unit: &str) -> Result<ingredient::Model>
where
    C: ConnectionTrait,
{
    if name.trim().is_empty() {
        return Err(Error::validation("Ingredient name cannot be empty"));
    }
    let row = ingredient::ActiveModel {
        name: Set(name.trim().to_string()),
        amount: Set(0.0),
        unit: Set(unit.trim().to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(ingredient_id = row.id, name = %row.name, "ingredient added");
    Ok(row)
}

/// Overwrites the stocked amount of an ingredient.
pub async fn set_ingredient_amount<C>(db: &C, ingredient_id: i64, amount: f64) -> Result<()>
where
    C: ConnectionTrait,
{
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    let result = Ingredient::update_many()
        .col_expr(ingredient::Column::Amount, Expr::value(amount))
        .filter(ingredient::Column::Id.eq(ingredient_id))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        warn!(ingredient_id, "amount set for unknown ingredient");
    }
    Ok(())
}

/// Appends a review.
pub async fn add_review<C>(db: &C, dish: &str, text: &str, author: &str) -> Result<review::Model>
where
    C: ConnectionTrait,
{
    let row = review::ActiveModel {
        dish: Set(dish.to_string()),
        text: Set(text.to_string()),
        author: Set(author.to_string()),
        ..Default::default()
    }
    .insert(db)
    .await?;
    info!(author, dish, "review added");
    Ok(row)
}

/// Records a pending purchase request and tells the admins.
pub async fn add_purchase_request<C>(
    db: &C,
    item: &str,
    qty: &str,
    price: f64,
    now: DateTime<Utc>,
) -> Result<purchase_request::Model>
where
    C: ConnectionTrait,
{
    if item.trim().is_empty() {
        return Err(Error::validation("item cannot be empty"));
    }
    if !price.is_finite() || price < 0.0 {
        return Err(Error::InvalidAmount { amount: price });
    }

    let request = purchase_request::ActiveModel {
        item: Set(item.trim().to_string()),
        qty: Set(qty.to_string()),
        price: Set(price),
        status: Set(PurchaseStatus::Pending),
        ..Default::default()
    }
    .insert(db)
    .await?;

    notify::emit(
        db,
        Audience::Role(Role::Admin),
        Draft::new(
            NotificationKind::Supply,
            "New purchase request",
            format!(
                "Request: {} ({}) for {:.2}. Awaiting approval.",
                request.item, request.qty, request.price
            ),
        ),
        now,
    )
    .await?;

    info!(request_id = request.id, item = %request.item, "purchase requested");
    Ok(request)
}

/// Approves or rejects a pending purchase request.
///
/// Only a `Pending` request changes state. Deciding an already decided request, or one
/// that does not exist, succeeds without writing anything. The chef role is notified when
/// a request actually changes.
///
/// # Arguments
/// * `db` - The caller's open transaction
/// * `request_id` - The purchase request to decide
/// * `decision` - [`PurchaseStatus::Approved`] or [`PurchaseStatus::Rejected`]; `Pending`
///   is a validation error
/// * `now` - Timestamp for the notification
pub async fn decide_purchase_request<C>(
    db: &C,
    request_id: i64,
    decision: PurchaseStatus,
    now: DateTime<Utc>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if decision == PurchaseStatus::Pending {
        return Err(Error::validation("a purchase request can only be approved or rejected"));
    }

    let existing = PurchaseRequest::find_by_id(request_id).one(db).await?;

    let result = PurchaseRequest::update_many()
        .col_expr(purchase_request::Column::Status, Expr::value(decision))
        .filter(purchase_request::Column::Id.eq(request_id))
        .filter(purchase_request::Column::Status.eq(PurchaseStatus::Pending))
        .exec(db)
        .await?;

    let Some(request) = existing else {
        warn!(request_id, ?decision, "decision on unknown purchase request");
        return Ok(());
    };
    if result.rows_affected == 0 {
        info!(request_id, "purchase request already decided");
        return Ok(());
    }

    let draft = if decision == PurchaseStatus::Approved {
        Draft::new(
            NotificationKind::Supply,
            "Purchase approved",
            format!("{} ({}) for {:.2} approved", request.item, request.qty, request.price),
        )
    } else {
        Draft::new(
            NotificationKind::Supply,
            "Purchase rejected",
            format!("{} ({}) was rejected by the administrator", request.item, request.qty),
        )
    };
    notify::emit(db, Audience::Role(Role::Chef), draft, now).await?;

    info!(request_id, ?decision, "purchase request decided");
    Ok(())
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;

    #[tokio::test]
    async fn test_ingredient_lifecycle() -> Result<()> {
        let store = setup_test_store().await?;
        let scope = store.write().await?;
        let flour = add_ingredient(scope.txn(), "Flour", "kg").await?;
        assert_eq!(flour.amount, 0.0);

        set_ingredient_amount(scope.txn(), flour.id, 12.5).await?;
        let err = set_ingredient_amount(scope.txn(), flour.id, -1.0)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidAmount { .. }));
        scope.commit().await?;

        let stored = Ingredient::find_by_id(flour.id)
            .one(store.connection())
            .await?
            .unwrap();
        assert_eq!(stored.amount, 12.5);
        assert_eq!(stored.unit, "kg");
        Ok(())
    }

    #[tokio::test]
    async fn test_purchase_request_approval_notifies_chefs() -> Result<()> {
        let store = setup_test_store().await?;
        let scope = store.write().await?;
        let request = add_purchase_request(scope.txn(), "Flour", "10 kg", 450.0, Utc::now()).await?;
        assert_eq!(request.status, PurchaseStatus::Pending);
        decide_purchase_request(scope.txn(), request.id, PurchaseStatus::Approved, Utc::now())
            .await?;
        // second decision is a no-op
        decide_purchase_request(scope.txn(), request.id, PurchaseStatus::Rejected, Utc::now())
            .await?;
        scope.commit().await?;

        let stored = PurchaseRequest::find_by_id(request.id)
            .one(store.connection())
            .await?
            .unwrap();
        assert_eq!(stored.status, PurchaseStatus::Approved);
        assert_eq!(notifications_for_role(&store, Role::Admin).await?.len(), 1);
        let chef_notes = notifications_for_role(&store, Role::Chef).await?;
        assert_eq!(chef_notes.len(), 1);
        assert_eq!(chef_notes[0].title, "Purchase approved");
        Ok(())
    }

    #[tokio::test]
    async fn test_decide_missing_request_is_silent() -> Result<()> {
        let store = setup_test_store().await?;
        let scope = store.write().await?;
        decide_purchase_request(scope.txn(), 77, PurchaseStatus::Rejected, Utc::now()).await?;
        scope.commit().await?;
        assert!(notifications_for_role(&store, Role::Chef).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_add_review() -> Result<()> {
        let store = setup_test_store().await?;
        let scope = store.write().await?;
        let review = add_review(scope.txn(), "Borscht", "Tasty", "a").await?;
        scope.commit().await?;
        assert_eq!(review.author, "a");
        Ok(())
    }
}
