//! Account business logic - Balance top-ups, profile, chef approval and saved cards.
//!
//! None of these actions fail on a missing user: the filtered update matches nothing.
//! Notifications are only emitted when a row actually changed.

use crate::{
    core::{
        crypto::FieldCipher,
        notify::{self, Audience, Draft},
        store,
    },
    entities::{NotificationKind, User, user},
    errors::{Error, Result},
};
use chrono::{DateTime, Utc};
use sea_orm::sea_query::Expr;
use sea_orm::{ConnectionTrait, prelude::*};
use tracing::{info, warn};

/// Card details as entered by the user.
#[derive(Clone, PartialEq, Eq)]
pub struct CardDetails {
    /// Full card number
    pub number: String,
    /// Name on the card
    pub holder: String,
    /// Expiry (MM/YY)
    pub expiry: String,
}

impl std::fmt::Debug for CardDetails {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CardDetails")
            .field("number", &mask_card_number(&self.number))
            .field("expiry", &self.expiry)
            .finish_non_exhaustive()
    }
}

/// `**** 1234` style rendering for logs.
#[must_use]
pub fn mask_card_number(number: &str) -> String {
    let digits: Vec<char> = number.chars().filter(char::is_ascii_digit).collect();
    let tail: String = digits[digits.len().saturating_sub(4)..].iter().collect();
    format!("**** {tail}")
}

/// Credits `amount` to the user's balance and tells them.
pub async fn refill_balance<C>(
    db: &C,
    username: &str,
    amount: f64,
    now: DateTime<Utc>,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if !amount.is_finite() || amount <= 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    if !store::credit_balance(db, username, amount).await? {
        warn!(username, "refill for unknown user");
        return Ok(());
    }
    notify::emit(
        db,
        Audience::User(username.to_string()),
        Draft::new(
            NotificationKind::Payment,
            "Balance refilled",
            format!("{amount:.2} credited to your account"),
        ),
        now,
    )
    .await?;
    info!(username, amount, "balance refilled");
    Ok(())
}

/// Replaces the user's allergy notes.
pub async fn save_profile<C>(db: &C, username: &str, allergies: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    User::update_many()
        .col_expr(user::Column::Allergies, Expr::value(allergies))
        .filter(user::Column::Username.eq(username))
        .exec(db)
        .await?;
    info!(username, "profile updated");
    Ok(())
}

/// Marks a chef as approved so they can log in.
pub async fn approve_chef<C>(db: &C, target: &str, now: DateTime<Utc>) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = User::update_many()
        .col_expr(user::Column::IsApproved, Expr::value(true))
        .filter(user::Column::Username.eq(target))
        .exec(db)
        .await?;
    if result.rows_affected == 0 {
        warn!(target, "approval for unknown user");
        return Ok(());
    }
    notify::emit(
        db,
        Audience::User(target.to_string()),
        Draft::new(
            NotificationKind::Account,
            "Account approved",
            "Your chef account has been approved. You can now log in.",
        ),
        now,
    )
    .await?;
    info!(target, "chef approved");
    Ok(())
}

/// Deletes a rejected chef's account.
pub async fn reject_chef<C>(db: &C, target: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    let result = User::delete_by_id(target.to_string()).exec(db).await?;
    info!(target, removed = result.rows_affected, "chef rejected");
    Ok(())
}

/// Encrypts and stores the card, replacing any previous one.
pub async fn save_card<C>(
    db: &C,
    cipher: &FieldCipher,
    username: &str,
    card: &CardDetails,
) -> Result<()>
where
    C: ConnectionTrait,
{
    if card.number.trim().is_empty() {
        return Err(Error::validation("cardNumber cannot be empty"));
    }
    let number = cipher.encrypt(card.number.trim())?;
    let holder = cipher.encrypt(card.holder.trim())?;

    User::update_many()
        .col_expr(user::Column::CardNumber, Expr::value(number))
        .col_expr(user::Column::CardHolder, Expr::value(holder))
        .col_expr(user::Column::CardExpiry, Expr::value(card.expiry.trim()))
        .filter(user::Column::Username.eq(username))
        .exec(db)
        .await?;
    info!(username, card = %mask_card_number(&card.number), "card saved");
    Ok(())
}

/// Clears all card fields.
pub async fn remove_card<C>(db: &C, username: &str) -> Result<()>
where
    C: ConnectionTrait,
{
    User::update_many()
        .col_expr(user::Column::CardNumber, Expr::value(""))
        .col_expr(user::Column::CardHolder, Expr::value(""))
        .col_expr(user::Column::CardExpiry, Expr::value(""))
        .filter(user::Column::Username.eq(username))
        .exec(db)
        .await?;
    info!(username, "card removed");
    Ok(())
}
