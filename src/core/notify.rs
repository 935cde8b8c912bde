//! Notification emitter.
//!
//! Appends one notification row addressed to a user or to every user of a role. The
//! caller passes its own transaction, so the notification commits or rolls back together
//! with the mutation that produced it.

use crate::{
    entities::{NotificationKind, Role, notification},
    errors::Result,
};
use chrono::{DateTime, Utc};
use sea_orm::{ConnectionTrait, Set, prelude::*};

/// Who a notification is for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Audience {
    /// A single user, by username
    User(String),
    /// Everyone with the given role
    Role(Role),
}

/// The content of a notification, independent of its recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    /// Headline
    pub title: String,
    /// Body
    pub text: String,
    /// Category
    pub kind: NotificationKind,
}

impl Draft {
    /// Builds a draft from borrowed or owned strings.
    pub fn new(kind: NotificationKind, title: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            text: text.into(),
            kind,
        }
    }
}

/// Appends a notification. No validation, no lookups.
pub async fn emit<C>(
    db: &C,
    audience: Audience,
    draft: Draft,
    at: DateTime<Utc>,
) -> Result<notification::Model>
where
    C: ConnectionTrait,
{
    let (to_user, to_role) = match audience {
        Audience::User(username) => (Some(username), None),
        Audience::Role(role) => (None, Some(role)),
    };

    let row = notification::ActiveModel {
        title: Set(draft.title),
        text: Set(draft.text),
        kind: Set(draft.kind),
        to_user: Set(to_user),
        to_role: Set(to_role),
        created_at: Set(at),
        ..Default::default()
    };
    row.insert(db).await.map_err(Into::into)
}
