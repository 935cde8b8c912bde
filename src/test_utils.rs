//! Shared test utilities for the canteen backend.
//!
//! This module provides helpers for setting up an in-memory store and creating test
//! entities with sensible defaults.
//!
//! The in-memory database has a single pooled connection. Helpers that write open and
//! commit their own scope; helpers that read use the bare connection, so never call them
//! while a scope is still open.

use crate::{
    core::{crypto::FieldCipher, dispatcher::Dispatcher, store::Store},
    entities::{
        MenuItem, Notification, Order, Role, SubscriptionUsage, menu_item, notification, order,
        subscription_transaction, user,
    },
    errors::{Error, Result},
};
use chrono::Utc;
use sea_orm::{PaginatorTrait, QueryOrder, Set, prelude::*};
use std::sync::Arc;

/// Creates an in-memory `SQLite` store with all tables initialized.
/// This is the standard setup for all integration tests.
pub async fn setup_test_store() -> Result<Store> {
    let db = sea_orm::Database::connect("sqlite::memory:").await?;
    crate::config::database::create_tables(&db).await?;
    Ok(Store::new(db))
}

/// A cipher with a fixed all-zero key.
#[must_use]
pub fn test_cipher() -> FieldCipher {
    FieldCipher::new(&[0u8; 32])
}

/// Installs a test subscriber once; later calls are ignored.
pub fn init_test_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("canteen_backend=debug")
        .with_test_writer()
        .try_init();
}

/// Creates a user with the given role and balance.
///
/// # Defaults
/// * password hash: a placeholder, not verifiable
/// * school: "School 1"
/// * approved: per [`Role::approved_on_registration`]
/// * contact and card fields: empty
pub async fn create_test_user(
    store: &Store,
    username: &str,
    role: Role,
    balance: f64,
) -> Result<user::Model> {
    let scope = store.write().await?;
    let row = user::ActiveModel {
        username: Set(username.to_string()),
        password_hash: Set("not-a-hash".to_string()),
        full_name: Set(format!("Test {username}")),
        role: Set(role),
        school: Set("School 1".to_string()),
        grade: Set((role == Role::Student).then(|| "9A".to_string())),
        phone: Set(String::new()),
        email: Set(String::new()),
        balance: Set(balance),
        allergies: Set(String::new()),
        is_approved: Set(role.approved_on_registration()),
        card_number: Set(String::new()),
        card_holder: Set(String::new()),
        card_expiry: Set(String::new()),
    }
    .insert(scope.txn())
    .await?;
    scope.commit().await?;
    Ok(row)
}

/// Creates a student with the given balance.
pub async fn create_test_student(store: &Store, username: &str, balance: f64) -> Result<user::Model> {
    create_test_user(store, username, Role::Student, balance).await
}

/// Creates a lunch main course without emitting the "new dish" notification.
pub async fn create_test_dish(
    store: &Store,
    name: &str,
    price: f64,
    portions: i32,
) -> Result<menu_item::Model> {
    let scope = store.write().await?;
    let row = menu_item::ActiveModel {
        name: Set(name.to_string()),
        price: Set(price),
        portions: Set(portions),
        dish_type: Set("Main course".to_string()),
        category: Set("Lunch".to_string()),
        ingredients: Set(String::new()),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(scope.txn())
    .await?;
    scope.commit().await?;
    Ok(row)
}

/// A store holding student "a" and one dish named "Soup".
pub async fn setup_with_student_and_dish(
    balance: f64,
    price: f64,
    portions: i32,
) -> Result<(Store, menu_item::Model)> {
    let store = setup_test_store().await?;
    create_test_student(&store, "a", balance).await?;
    let dish = create_test_dish(&store, "Soup", price, portions).await?;
    Ok((store, dish))
}

/// Same as [`setup_with_student_and_dish`], wrapped in a dispatcher.
pub async fn setup_dispatcher_with_dish(
    balance: f64,
    price: f64,
    portions: i32,
) -> Result<(Dispatcher, menu_item::Model)> {
    let (store, dish) = setup_with_student_and_dish(balance, price, portions).await?;
    Ok((Dispatcher::new(store, Arc::new(test_cipher())), dish))
}

/// Records a free plan purchase so the user is entitled to `sub_type`.
pub async fn grant_subscription(store: &Store, username: &str, sub_type: &str) -> Result<()> {
    let scope = store.write().await?;
    subscription_transaction::ActiveModel {
        username: Set(username.to_string()),
        sub_type: Set(sub_type.to_string()),
        amount: Set(0.0),
        created_at: Set(Utc::now()),
        ..Default::default()
    }
    .insert(scope.txn())
    .await?;
    scope.commit().await
}

/// Current balance of a user that must exist.
pub async fn balance_of(store: &Store, username: &str) -> Result<f64> {
    let user = crate::core::store::require_user(store.connection(), username).await?;
    Ok(user.balance)
}

/// Portions left of a dish that must exist.
pub async fn portions_of(store: &Store, menu_id: i64) -> Result<i32> {
    MenuItem::find_by_id(menu_id)
        .one(store.connection())
        .await?
        .map(|dish| dish.portions)
        .ok_or_else(|| Error::NotFound {
            entity: "menu item",
            key: menu_id.to_string(),
        })
}

/// Orders placed by one user, newest first.
pub async fn orders_for_user(store: &Store, username: &str) -> Result<Vec<order::Model>> {
    Ok(Order::find()
        .filter(order::Column::Username.eq(username))
        .order_by_desc(order::Column::Id)
        .all(store.connection())
        .await?)
}

/// Notifications addressed to one user, oldest first.
pub async fn notifications_for_user(
    store: &Store,
    username: &str,
) -> Result<Vec<notification::Model>> {
    Ok(Notification::find()
        .filter(notification::Column::ToUser.eq(username))
        .order_by_asc(notification::Column::Id)
        .all(store.connection())
        .await?)
}

/// Notifications addressed to a role, oldest first.
pub async fn notifications_for_role(store: &Store, role: Role) -> Result<Vec<notification::Model>> {
    Ok(Notification::find()
        .filter(notification::Column::ToRole.eq(role))
        .order_by_asc(notification::Column::Id)
        .all(store.connection())
        .await?)
}

/// Total number of notifications of any audience.
pub async fn notification_count(store: &Store) -> Result<u64> {
    Ok(Notification::find().count(store.connection()).await?)
}

/// Total number of subscription usage rows.
pub async fn usage_count(store: &Store) -> Result<u64> {
    Ok(SubscriptionUsage::find().count(store.connection()).await?)
}
