//! Read projection - The full state the client renders from.
//!
//! Everything is read inside one scope, so a snapshot never shows half of a committed
//! action. Encrypted user fields are decrypted on the way out and password hashes are
//! never part of the payload.

use crate::{
    core::{crypto::FieldCipher, menu, orders, store::Store},
    entities::{
        Ingredient, Notification, PurchaseRequest, Review, Role, SubscriptionTransaction,
        SubscriptionUsage, User, ingredient, menu_item, notification, order, purchase_request,
        review, subscription_transaction, subscription_usage, user,
    },
    errors::Result,
};
use chrono::{DateTime, NaiveDate, Utc};
use sea_orm::{EntityTrait, QueryOrder};
use serde::Serialize;
use tracing::{debug, instrument};

/// A user as the client sees it.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub username: String,
    pub full_name: String,
    pub role: Role,
    pub school: String,
    pub grade: Option<String>,
    pub phone: String,
    pub email: String,
    pub balance: f64,
    pub allergies: String,
    pub is_approved: bool,
    pub card_number: String,
    pub card_holder: String,
    pub card_expiry: String,
}

impl UserView {
    /// Projects a stored user, decrypting contact and card fields.
    #[must_use]
    pub fn from_model(model: user::Model, cipher: &FieldCipher) -> Self {
        Self {
            phone: cipher.decrypt(&model.phone),
            email: cipher.decrypt(&model.email),
            card_number: cipher.decrypt(&model.card_number),
            card_holder: cipher.decrypt(&model.card_holder),
            username: model.username,
            full_name: model.full_name,
            role: model.role,
            school: model.school,
            grade: model.grade,
            balance: model.balance,
            allergies: model.allergies,
            is_approved: model.is_approved,
            card_expiry: model.card_expiry,
        }
    }
}

/// One subscription redemption, with the issued dishes as a single line of text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageView {
    pub id: i64,
    pub user: String,
    pub sub_type: String,
    pub date: NaiveDate,
    /// Dish names joined with ", "; empty when nothing was issued
    pub dishes_used: String,
    pub created_at: DateTime<Utc>,
}

impl From<subscription_usage::Model> for UsageView {
    fn from(model: subscription_usage::Model) -> Self {
        Self {
            dishes_used: model.dish_names().join(", "),
            id: model.id,
            user: model.username,
            sub_type: model.sub_type,
            date: model.date,
            created_at: model.created_at,
        }
    }
}

/// Every table, keyed the way the client expects.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Snapshot {
    /// Newest first
    pub menu: Vec<menu_item::Model>,
    /// Newest first
    pub orders: Vec<order::Model>,
    pub ingredients: Vec<ingredient::Model>,
    pub users: Vec<UserView>,
    pub reviews: Vec<review::Model>,
    pub purchases: Vec<purchase_request::Model>,
    pub notifications: Vec<notification::Model>,
    pub sub_transactions: Vec<subscription_transaction::Model>,
    pub subscription_usage: Vec<UsageView>,
}

/// Reads the whole store.
#[instrument(skip_all)]
pub async fn snapshot(store: &Store, cipher: &FieldCipher) -> Result<Snapshot> {
    let scope = store.snapshot().await?;
    let db = scope.txn();

    let menu = menu::get_menu(db).await?;
    let orders = orders::get_orders(db).await?;
    let ingredients = Ingredient::find()
        .order_by_asc(ingredient::Column::Id)
        .all(db)
        .await?;
    let users = User::find()
        .order_by_asc(user::Column::Username)
        .all(db)
        .await?
        .into_iter()
        .map(|model| UserView::from_model(model, cipher))
        .collect();
    let reviews = Review::find()
        .order_by_asc(review::Column::Id)
        .all(db)
        .await?;
    let purchases = PurchaseRequest::find()
        .order_by_asc(purchase_request::Column::Id)
        .all(db)
        .await?;
    let notifications = Notification::find()
        .order_by_asc(notification::Column::Id)
        .all(db)
        .await?;
    let sub_transactions = SubscriptionTransaction::find()
        .order_by_asc(subscription_transaction::Column::Id)
        .all(db)
        .await?;
    let subscription_usage = SubscriptionUsage::find()
        .order_by_asc(subscription_usage::Column::Id)
        .all(db)
        .await?
        .into_iter()
        .map(UsageView::from)
        .collect();

    // Read-only; commit just releases the transaction.
    scope.commit().await?;

    debug!(
        menu = menu.len(),
        orders = orders.len(),
        notifications = notifications.len(),
        "snapshot taken"
    );
    Ok(Snapshot {
        menu,
        orders,
        ingredients,
        users,
        reviews,
        purchases,
        notifications,
        sub_transactions,
        subscription_usage,
    })
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::core::{accounts, orders as order_ops, subscription};
    use crate::test_utils::*;
    use chrono::Utc;

    #[tokio::test]
    async fn test_snapshot_orders_newest_first() -> Result<()> {
        let (store, soup) = setup_with_student_and_dish(1000.0, 10.0, 5).await?;
        let tea = create_test_dish(&store, "Tea", 5.0, 5).await?;

        let scope = store.write().await?;
        order_ops::purchase_dish(scope.txn(), "a", soup.id, "", Utc::now()).await?;
        order_ops::purchase_dish(scope.txn(), "a", tea.id, "", Utc::now()).await?;
        scope.commit().await?;

        let snap = snapshot(&store, &test_cipher()).await?;
        assert_eq!(snap.menu[0].name, "Tea");
        assert_eq!(snap.orders[0].dish_name, "Tea");
        assert_eq!(snap.orders[1].dish_name, "Soup");
        assert_eq!(snap.notifications.len(), 2);
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshot_decrypts_and_hides_hash() -> Result<()> {
        let store = setup_test_store().await?;
        let cipher = test_cipher();
        create_test_student(&store, "a", 0.0).await?;

        let card = accounts::CardDetails {
            number: "4111111111111234".to_string(),
            holder: "A B".to_string(),
            expiry: "01/30".to_string(),
        };
        let scope = store.write().await?;
        accounts::save_card(scope.txn(), &cipher, "a", &card).await?;
        scope.commit().await?;

        let snap = snapshot(&store, &cipher).await?;
        assert_eq!(snap.users[0].card_number, "4111111111111234");
        assert_eq!(snap.users[0].card_holder, "A B");

        let json = serde_json::to_value(&snap).unwrap();
        assert!(json.get("subTransactions").is_some());
        assert!(json.get("subscriptionUsage").is_some());
        assert!(json["users"][0].get("passwordHash").is_none());
        assert_eq!(json["users"][0]["cardExpiry"], "01/30");
        Ok(())
    }

    #[tokio::test]
    async fn test_snapshot_uses_client_key_names() -> Result<()> {
        let (store, soup) = setup_with_student_and_dish(1000.0, 10.0, 5).await?;
        let tea = create_test_dish(&store, "Tea", 5.0, 5).await?;
        let now = Utc::now();

        let scope = store.write().await?;
        order_ops::purchase_dish(scope.txn(), "a", soup.id, "", now).await?;
        subscription::purchase_subscription(scope.txn(), "a", "Lunches", 300.0, now).await?;
        let redemption = subscription::Redemption {
            username: "a".to_string(),
            sub_type: "Lunches".to_string(),
            dishes: vec![tea.id, soup.id],
            allergies: String::new(),
        };
        subscription::redeem_subscription(scope.txn(), &redemption, now).await?;
        scope.commit().await?;

        let json = serde_json::to_value(snapshot(&store, &test_cipher()).await?).unwrap();

        let dish = &json["menu"][0];
        assert_eq!(dish["type"], "Main course");
        assert!(dish.get("addedDate").is_some());
        assert!(dish.get("dishType").is_none());

        let placed = &json["orders"][2];
        assert_eq!(placed["user"], "a");
        assert_eq!(placed["name"], "Soup");
        assert_eq!(placed["status"], "Paid");
        assert!(placed.get("issuedAt").is_some());
        assert!(placed.get("username").is_none());

        let note = &json["notifications"][0];
        assert_eq!(note["type"], "payment");
        assert_eq!(note["toUser"], "a");
        assert!(note.get("time").is_some());
        assert!(note.get("kind").is_none());

        let plan = &json["subTransactions"][0];
        assert_eq!(plan["user"], "a");
        assert_eq!(plan["type"], "Lunches");
        assert_eq!(plan["amount"], 300.0);
        assert!(plan.get("time").is_some());

        let usage = &json["subscriptionUsage"][0];
        assert_eq!(usage["user"], "a");
        assert_eq!(usage["subType"], "Lunches");
        assert_eq!(usage["dishesUsed"], "Tea, Soup");
        assert!(usage.get("date").is_some());
        Ok(())
    }
}
