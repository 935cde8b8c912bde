//! Transactional access to the canteen tables.
//!
//! Every dispatcher action runs inside exactly one [`WriteScope`]: a database transaction
//! held together with the store's write gate. Dropping a scope without calling
//! [`WriteScope::commit`] rolls the transaction back, so an early `?` return leaves no
//! partial writes behind.
//!
//! Balance and portion changes go through conditional single-statement updates
//! (`... WHERE balance >= price`, `... WHERE portions > 0`). The check and the write are
//! one statement, so concurrent actions cannot lose an update even without the gate.

use crate::{
    entities::{MenuItem, User, menu_item, user},
    errors::{Error, Result},
};
use sea_orm::sea_query::Expr;
use sea_orm::{DatabaseTransaction, TransactionTrait, prelude::*};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};
use tracing::debug;

/// Shared handle to the database. Cheap to clone.
#[derive(Debug, Clone)]
pub struct Store {
    db: DatabaseConnection,
    gate: Arc<Mutex<()>>,
}

/// An open transaction plus exclusive access to the store.
///
/// Field order matters: the transaction is dropped (rolled back) before the gate is
/// released.
pub struct WriteScope<'a> {
    txn: DatabaseTransaction,
    _gate: MutexGuard<'a, ()>,
}

impl Store {
    /// Wraps an existing connection.
    #[must_use]
    pub fn new(db: DatabaseConnection) -> Self {
        Self {
            db,
            gate: Arc::new(Mutex::new(())),
        }
    }

    /// The underlying connection, for schema setup and tests.
    #[must_use]
    pub const fn connection(&self) -> &DatabaseConnection {
        &self.db
    }

    /// Opens a write scope. Waits until no other scope is open.
    pub async fn write(&self) -> Result<WriteScope<'_>> {
        let gate = self.gate.lock().await;
        let txn = self.db.begin().await?;
        Ok(WriteScope { txn, _gate: gate })
    }

    /// Opens a read scope. Reads take the gate too, so a snapshot never observes half of
    /// a commit.
    pub async fn snapshot(&self) -> Result<WriteScope<'_>> {
        self.write().await
    }
}

impl WriteScope<'_> {
    /// The transaction all reads and writes of this scope go through.
    #[must_use]
    pub const fn txn(&self) -> &DatabaseTransaction {
        &self.txn
    }

    /// Makes every write of this scope visible at once.
    pub async fn commit(self) -> Result<()> {
        self.txn.commit().await?;
        Ok(())
    }
}

/// Finds a user by username.
pub async fn find_user<C>(db: &C, username: &str) -> Result<Option<user::Model>>
where
    C: ConnectionTrait,
{
    User::find_by_id(username.to_string())
        .one(db)
        .await
        .map_err(Into::into)
}

/// Finds a menu item by id.
pub async fn find_menu_item<C>(db: &C, menu_id: i64) -> Result<Option<menu_item::Model>>
where
    C: ConnectionTrait,
{
    MenuItem::find_by_id(menu_id)
        .one(db)
        .await
        .map_err(Into::into)
}

/// Subtracts `amount` from the user's balance only if the balance covers it.
///
/// Returns `false` (and changes nothing) when the user is missing or cannot afford it.
pub async fn debit_balance<C>(db: &C, username: &str, amount: f64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = User::update_many()
        .col_expr(
            user::Column::Balance,
            Expr::col(user::Column::Balance).sub(amount),
        )
        .filter(user::Column::Username.eq(username))
        .filter(user::Column::Balance.gte(amount))
        .exec(db)
        .await?;
    debug!(username, amount, rows = result.rows_affected, "debit");
    Ok(result.rows_affected == 1)
}

/// Adds `amount` to the user's balance. Returns `false` when the user does not exist.
pub async fn credit_balance<C>(db: &C, username: &str, amount: f64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = User::update_many()
        .col_expr(
            user::Column::Balance,
            Expr::col(user::Column::Balance).add(amount),
        )
        .filter(user::Column::Username.eq(username))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Takes one portion of a dish if any are left. Returns `false` otherwise.
pub async fn take_portion<C>(db: &C, menu_id: i64) -> Result<bool>
where
    C: ConnectionTrait,
{
    let result = MenuItem::update_many()
        .col_expr(
            menu_item::Column::Portions,
            Expr::col(menu_item::Column::Portions).sub(1),
        )
        .filter(menu_item::Column::Id.eq(menu_id))
        .filter(menu_item::Column::Portions.gt(0))
        .exec(db)
        .await?;
    Ok(result.rows_affected == 1)
}

/// Loads a user that must exist, for callers that need the row itself.
pub async fn require_user<C>(db: &C, username: &str) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    find_user(db, username)
        .await?
        .ok_or_else(|| Error::NotFound {
            entity: "user",
            key: username.to_string(),
        })
}
