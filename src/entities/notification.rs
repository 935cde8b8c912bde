//! Notification entity - Messages produced as side effects of actions.
//!
//! A notification targets exactly one of a user (`to_user`) or a role (`to_role`).
//! Rows are append-only; see [`crate::core::notify`] for the only writer.

use super::user::Role;
use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Category of a notification, used by the client for icons and filtering
#[derive(Copy, Clone, Debug, PartialEq, Eq, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum NotificationKind {
    #[sea_orm(string_value = "payment")]
    Payment,
    #[sea_orm(string_value = "menu")]
    Menu,
    #[sea_orm(string_value = "order")]
    Order,
    #[sea_orm(string_value = "account")]
    Account,
    #[sea_orm(string_value = "supply")]
    Supply,
    #[sea_orm(string_value = "subscription")]
    Subscription,
}

/// Notification database model
#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "notifications")]
#[serde(rename_all = "camelCase")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    /// Short headline
    pub title: String,
    /// Message body
    pub text: String,
    /// Category
    #[serde(rename = "type")]
    pub kind: NotificationKind,
    /// Recipient username, when addressed to a single user
    pub to_user: Option<String>,
    /// Recipient role, when broadcast to a role
    pub to_role: Option<Role>,
    /// When the notification was emitted
    #[serde(rename = "time")]
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
