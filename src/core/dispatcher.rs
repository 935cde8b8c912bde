//! Action dispatcher - Applies one [`Command`] as one atomic transaction.
//!
//! Each arm follows the same shape: validate, mutate, notify. All of it runs in a single
//! [`WriteScope`]; any error returned from an arm drops the scope before `commit`, which
//! rolls back every write the arm made.

use crate::{
    core::{
        accounts::{self, CardDetails},
        command::Command,
        crypto::FieldCipher,
        menu::{self, NewDish},
        orders,
        store::{Store, WriteScope},
        subscription::{self, Redemption},
        supply,
    },
    entities::PurchaseStatus,
    errors::Result,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use tracing::{info, instrument, warn};

/// Success acknowledgment returned to the client.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Ack {
    /// Always `true`; failures are reported as errors instead
    pub ok: bool,
}

impl Ack {
    /// The only acknowledgment there is.
    pub const OK: Self = Self { ok: true };
}

/// Applies commands against the store.
#[derive(Debug, Clone)]
pub struct Dispatcher {
    store: Store,
    cipher: Arc<FieldCipher>,
}

impl Dispatcher {
    /// Creates a dispatcher over `store`, encrypting card data with `cipher`.
    #[must_use]
    pub const fn new(store: Store, cipher: Arc<FieldCipher>) -> Self {
        Self { store, cipher }
    }

    /// The store this dispatcher writes to.
    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    /// Applies `command` at the current time.
    pub async fn apply(&self, command: Command) -> Result<Ack> {
        self.apply_at(command, Utc::now()).await
    }

    /// Applies `command` as if it happened at `now`.
    ///
    /// Field checks run first and need no store access. The command then runs inside
    /// one write scope: it commits on success, and on any error the scope is dropped
    /// and rolled back, so a rejected action leaves no partial writes.
    ///
    /// # Arguments
    /// * `command` - The parsed action
    /// * `now` - Timestamp recorded on every row and notification the action writes
    #[instrument(skip(self, command, now), fields(action = command.kind()))]
    pub async fn apply_at(&self, command: Command, now: DateTime<Utc>) -> Result<Ack> {
        command
            .validate()
            .inspect_err(|e| warn!("rejected before opening a transaction: {}", e))?;

        let scope = self.store.write().await?;
        self.run(&scope, command, now)
            .await
            .inspect_err(|e| warn!("action rolled back: {}", e))?;
        scope.commit().await?;

        info!("action committed");
        Ok(Ack::OK)
    }

    async fn run(&self, scope: &WriteScope<'_>, command: Command, now: DateTime<Utc>) -> Result<()> {
        let db = scope.txn();
        match command {
            Command::PurchaseDish {
                user,
                menu_id,
                allergies,
            } => {
                orders::purchase_dish(db, &user, menu_id, &allergies, now).await?;
            }
            Command::AddMenuItem {
                name,
                price,
                portions,
                dish_type,
                category,
                ingredients,
            } => {
                let dish = NewDish {
                    name,
                    price,
                    portions,
                    dish_type,
                    category,
                    ingredients,
                };
                menu::add_menu_item(db, dish, now).await?;
            }
            Command::PurchaseSubscription {
                user,
                sub_type,
                price,
            } => {
                subscription::purchase_subscription(db, &user, &sub_type, price, now).await?;
            }
            Command::RefillBalance { user, amount } => {
                accounts::refill_balance(db, &user, amount, now).await?;
            }
            Command::ConfirmOrder { id } => orders::confirm_order(db, id, now).await?,
            Command::SaveProfile { user, allergies } => {
                accounts::save_profile(db, &user, &allergies).await?;
            }
            Command::ApproveChef { target } => accounts::approve_chef(db, &target, now).await?,
            Command::RejectChef { target } => accounts::reject_chef(db, &target).await?,
            Command::UpdateStock { id, val } => menu::update_stock(db, id, val).await?,
            Command::AddIngredient { name, unit } => {
                supply::add_ingredient(db, &name, &unit).await?;
            }
            Command::SetIngredientAmount { id, val } => {
                supply::set_ingredient_amount(db, id, val).await?;
            }
            Command::AddReview { dish, text, author } => {
                supply::add_review(db, &dish, &text, &author).await?;
            }
            Command::AddPurchaseRequest { item, qty, price } => {
                supply::add_purchase_request(db, &item, &qty, price, now).await?;
            }
            Command::ApprovePurchaseRequest { id } => {
                supply::decide_purchase_request(db, id, PurchaseStatus::Approved, now).await?;
            }
            Command::RejectPurchaseRequest { id } => {
                supply::decide_purchase_request(db, id, PurchaseStatus::Rejected, now).await?;
            }
            Command::SaveCard {
                user,
                card_number,
                card_holder,
                card_expiry,
            } => {
                let card = CardDetails {
                    number: card_number,
                    holder: card_holder,
                    expiry: card_expiry,
                };
                accounts::save_card(db, &self.cipher, &user, &card).await?;
            }
            Command::RemoveCard { user } => accounts::remove_card(db, &user).await?,
            Command::RedeemSubscription {
                user,
                sub_type,
                dishes,
                allergies,
            } => {
                let redemption = Redemption {
                    username: user,
                    sub_type,
                    dishes,
                    allergies,
                };
                subscription::redeem_subscription(db, &redemption, now).await?;
            }
        }
        Ok(())
    }
}
