//! Database configuration module for the canteen backend.
//!
//! This module handles the `SQLite` connection and table creation using `SeaORM`.
//! Tables are generated from the entity definitions with
//! `Schema::create_table_from_entity`, so the schema always matches the Rust models.
//! Creation is idempotent (`IF NOT EXISTS`) because it runs on every start.

use crate::entities::{
    Ingredient, MenuItem, Notification, Order, PurchaseRequest, Review, SubscriptionTransaction,
    SubscriptionUsage, User, subscription_usage,
};
use crate::errors::Result;
use sea_orm::sea_query::Index;
use sea_orm::{ConnectionTrait, Database, DatabaseConnection, EntityTrait, Schema};
use std::path::Path;
use tracing::{debug, info};

const DEFAULT_DATABASE_URL: &str = "sqlite://data/canteen.sqlite?mode=rwc";

/// Gets the database URL from the `DATABASE_URL` environment variable, falling back to
/// a local `SQLite` file.
#[must_use]
pub fn get_database_url() -> String {
    std::env::var("DATABASE_URL").unwrap_or_else(|_| DEFAULT_DATABASE_URL.to_string())
}

/// The directory an `sqlite://` file URL lives in, if it names one.
fn sqlite_parent_dir(database_url: &str) -> Option<&Path> {
    let path = database_url.strip_prefix("sqlite://")?;
    let path = path.split('?').next()?;
    Path::new(path)
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
}

/// Establishes a connection to the database named by [`get_database_url`].
///
/// For a file-backed `SQLite` database the containing directory is created first.
pub async fn create_connection() -> Result<DatabaseConnection> {
    let database_url = get_database_url();
    if let Some(dir) = sqlite_parent_dir(&database_url) {
        std::fs::create_dir_all(dir)?;
    }
    debug!("Connecting to database at {}", database_url);
    Database::connect(&database_url).await.map_err(Into::into)
}

async fn create_table<E>(db: &DatabaseConnection, schema: &Schema, entity: E) -> Result<()>
where
    E: EntityTrait,
{
    let builder = db.get_database_backend();
    let mut statement = schema.create_table_from_entity(entity);
    statement.if_not_exists();
    db.execute(builder.build(&statement)).await?;
    Ok(())
}

/// Creates every table used by the backend, plus the redemption lookup index.
pub async fn create_tables(db: &DatabaseConnection) -> Result<()> {
    let builder = db.get_database_backend();
    let schema = Schema::new(builder);

    create_table(db, &schema, User).await?;
    create_table(db, &schema, MenuItem).await?;
    create_table(db, &schema, Order).await?;
    create_table(db, &schema, Ingredient).await?;
    create_table(db, &schema, Review).await?;
    create_table(db, &schema, PurchaseRequest).await?;
    create_table(db, &schema, Notification).await?;
    create_table(db, &schema, SubscriptionTransaction).await?;
    create_table(db, &schema, SubscriptionUsage).await?;

    // Non-unique: one-redemption-per-day is a dispatcher rule, not a storage constraint.
    let usage_lookup = Index::create()
        .if_not_exists()
        .name("idx_subscription_usage_user_type_date")
        .table(SubscriptionUsage)
        .col(subscription_usage::Column::Username)
        .col(subscription_usage::Column::SubType)
        .col(subscription_usage::Column::Date)
        .to_owned();
    db.execute(builder.build(&usage_lookup)).await?;

    info!("Database tables ensured.");
    Ok(())
}
