//! Action commands accepted by the dispatcher.
//!
//! The client sends a flat JSON object whose `type` field names the action. Each action
//! kind maps to one [`Command`] variant carrying exactly the fields that action needs, so
//! a missing or mistyped field is rejected at parse time instead of halfway through a
//! transaction.
//!
//! Numeric fields accept either a JSON number or a string holding one, since the web
//! client posts form inputs as text.

use crate::errors::{Error, Result};
use serde::{Deserialize, Deserializer, de};
use serde_json::Value;
use std::{fmt::Display, str::FromStr};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText<T> {
    Number(T),
    Text(String),
}

impl<T> NumberOrText<T>
where
    T: FromStr,
    T::Err: Display,
{
    fn into_number<E: de::Error>(self) -> std::result::Result<T, E> {
        match self {
            Self::Number(n) => Ok(n),
            Self::Text(text) => text
                .trim()
                .parse()
                .map_err(|e| E::custom(format!("invalid number '{text}': {e}"))),
        }
    }
}

fn lenient<'de, D, T>(deserializer: D) -> std::result::Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + FromStr,
    T::Err: Display,
{
    NumberOrText::deserialize(deserializer)?.into_number()
}

fn lenient_ids<'de, D>(deserializer: D) -> std::result::Result<Vec<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Vec::<NumberOrText<i64>>::deserialize(deserializer)?
        .into_iter()
        .map(NumberOrText::into_number)
        .collect()
}

fn default_dish_type() -> String {
    "Main course".to_string()
}

fn default_category() -> String {
    "Lunch".to_string()
}

/// One state transition requested by the client.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "type", rename_all_fields = "camelCase")]
pub enum Command {
    /// Buy one portion of a dish with the user's balance.
    #[serde(rename = "buy")]
    PurchaseDish {
        user: String,
        #[serde(deserialize_with = "lenient")]
        menu_id: i64,
        #[serde(default)]
        allergies: String,
    },

    /// Put a new dish on the menu.
    #[serde(rename = "add_menu_item")]
    AddMenuItem {
        name: String,
        #[serde(deserialize_with = "lenient")]
        price: f64,
        #[serde(deserialize_with = "lenient")]
        portions: i32,
        #[serde(default = "default_dish_type")]
        dish_type: String,
        #[serde(default = "default_category")]
        category: String,
        #[serde(default)]
        ingredients: String,
    },

    /// Buy a meal plan.
    #[serde(rename = "buy_sub")]
    PurchaseSubscription {
        user: String,
        sub_type: String,
        #[serde(deserialize_with = "lenient")]
        price: f64,
    },

    /// Top up a balance.
    #[serde(rename = "refill")]
    RefillBalance {
        user: String,
        #[serde(deserialize_with = "lenient")]
        amount: f64,
    },

    /// Mark an order as handed out.
    #[serde(rename = "confirm_order")]
    ConfirmOrder {
        #[serde(deserialize_with = "lenient")]
        id: i64,
    },

    /// Update a user's allergy notes.
    #[serde(rename = "save_profile")]
    SaveProfile { user: String, allergies: String },

    /// Let a chef log in.
    #[serde(rename = "approve_chef")]
    ApproveChef { target: String },

    /// Delete a pending chef account.
    #[serde(rename = "reject_chef")]
    RejectChef { target: String },

    /// Set the number of portions left for a dish.
    #[serde(rename = "update_stock")]
    UpdateStock {
        #[serde(deserialize_with = "lenient")]
        id: i64,
        #[serde(deserialize_with = "lenient")]
        val: i32,
    },

    /// Add an ingredient to the stock ledger with zero amount.
    #[serde(rename = "add_ing")]
    AddIngredient { name: String, unit: String },

    /// Overwrite the amount of an ingredient in stock.
    #[serde(rename = "set_ing")]
    SetIngredientAmount {
        #[serde(deserialize_with = "lenient")]
        id: i64,
        #[serde(deserialize_with = "lenient")]
        val: f64,
    },

    /// Leave feedback on a dish.
    #[serde(rename = "add_review")]
    AddReview {
        dish: String,
        text: String,
        author: String,
    },

    /// Ask an admin to approve a supply purchase.
    #[serde(rename = "add_purchase")]
    AddPurchaseRequest {
        item: String,
        qty: String,
        #[serde(default, deserialize_with = "lenient")]
        price: f64,
    },

    /// Approve a pending purchase request.
    #[serde(rename = "approve_purchase")]
    ApprovePurchaseRequest {
        #[serde(deserialize_with = "lenient")]
        id: i64,
    },

    /// Reject a pending purchase request.
    #[serde(rename = "reject_purchase")]
    RejectPurchaseRequest {
        #[serde(deserialize_with = "lenient")]
        id: i64,
    },

    /// Store (or replace) the user's payment card.
    #[serde(rename = "save_card")]
    SaveCard {
        user: String,
        card_number: String,
        card_holder: String,
        card_expiry: String,
    },

    /// Forget the user's payment card.
    #[serde(rename = "remove_card")]
    RemoveCard { user: String },

    /// Claim today's meals under a subscription.
    #[serde(rename = "use_subscription")]
    RedeemSubscription {
        user: String,
        sub_type: String,
        #[serde(default, deserialize_with = "lenient_ids")]
        dishes: Vec<i64>,
        #[serde(default)]
        allergies: String,
    },
}

impl Command {
    /// Every `type` tag the dispatcher understands.
    pub const KINDS: [&'static str; 18] = [
        "buy",
        "add_menu_item",
        "buy_sub",
        "refill",
        "confirm_order",
        "save_profile",
        "approve_chef",
        "reject_chef",
        "update_stock",
        "add_ing",
        "set_ing",
        "add_review",
        "add_purchase",
        "approve_purchase",
        "reject_purchase",
        "save_card",
        "remove_card",
        "use_subscription",
    ];

    /// Parses a raw request body.
    ///
    /// An unrecognized `type` yields [`Error::UnknownAction`]; a recognized type with
    /// missing or malformed fields yields [`Error::Validation`].
    pub fn from_json(body: Value) -> Result<Self> {
        let Some(kind) = body.get("type").and_then(Value::as_str) else {
            return Err(Error::validation("action 'type' is missing"));
        };
        if !Self::KINDS.contains(&kind) {
            return Err(Error::UnknownAction {
                kind: kind.to_string(),
            });
        }
        serde_json::from_value(body).map_err(|e| Error::validation(e.to_string()))
    }

    /// The wire tag of this command, for logging.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::PurchaseDish { .. } => "buy",
            Self::AddMenuItem { .. } => "add_menu_item",
            Self::PurchaseSubscription { .. } => "buy_sub",
            Self::RefillBalance { .. } => "refill",
            Self::ConfirmOrder { .. } => "confirm_order",
            Self::SaveProfile { .. } => "save_profile",
            Self::ApproveChef { .. } => "approve_chef",
            Self::RejectChef { .. } => "reject_chef",
            Self::UpdateStock { .. } => "update_stock",
            Self::AddIngredient { .. } => "add_ing",
            Self::SetIngredientAmount { .. } => "set_ing",
            Self::AddReview { .. } => "add_review",
            Self::AddPurchaseRequest { .. } => "add_purchase",
            Self::ApprovePurchaseRequest { .. } => "approve_purchase",
            Self::RejectPurchaseRequest { .. } => "reject_purchase",
            Self::SaveCard { .. } => "save_card",
            Self::RemoveCard { .. } => "remove_card",
            Self::RedeemSubscription { .. } => "use_subscription",
        }
    }

    /// Field-level checks that need no database access.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::AddMenuItem {
                name,
                price,
                portions,
                ..
            } => {
                require_text("name", name)?;
                require_price(*price)?;
                if *portions < 0 {
                    return Err(Error::validation("portions cannot be negative"));
                }
            }
            Self::PurchaseSubscription { sub_type, price, .. } => {
                require_text("subType", sub_type)?;
                require_price(*price)?;
            }
            Self::RefillBalance { amount, .. } => {
                if !amount.is_finite() || *amount <= 0.0 {
                    return Err(Error::InvalidAmount { amount: *amount });
                }
            }
            Self::UpdateStock { val, .. } => {
                if *val < 0 {
                    return Err(Error::validation("portions cannot be negative"));
                }
            }
            Self::AddIngredient { name, .. } => require_text("name", name)?,
            Self::SetIngredientAmount { val, .. } => require_price(*val)?,
            Self::AddPurchaseRequest { item, price, .. } => {
                require_text("item", item)?;
                require_price(*price)?;
            }
            Self::SaveCard { card_number, .. } => require_text("cardNumber", card_number)?,
            Self::RedeemSubscription { sub_type, .. } => require_text("subType", sub_type)?,
            _ => {}
        }
        Ok(())
    }
}

fn require_text(field: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(Error::validation(format!("{field} cannot be empty")));
    }
    Ok(())
}

fn require_price(amount: f64) -> Result<()> {
    if !amount.is_finite() || amount < 0.0 {
        return Err(Error::InvalidAmount { amount });
    }
    Ok(())
}
