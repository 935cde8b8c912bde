//! Entity module - Contains all SeaORM entity definitions for the database.
//! These entities represent the database tables. None of them declare foreign keys:
//! orders, reviews and notifications reference users and dishes by value.

pub mod ingredient;
pub mod menu_item;
pub mod notification;
pub mod order;
pub mod purchase_request;
pub mod review;
pub mod subscription_transaction;
pub mod subscription_usage;
pub mod user;

// Re-export specific types to avoid conflicts
pub use ingredient::{Column as IngredientColumn, Entity as Ingredient, Model as IngredientModel};
pub use menu_item::{Column as MenuItemColumn, Entity as MenuItem, Model as MenuItemModel};
pub use notification::{
    Column as NotificationColumn, Entity as Notification, Model as NotificationModel,
    NotificationKind,
};
pub use order::{Column as OrderColumn, Entity as Order, Model as OrderModel, OrderStatus};
pub use purchase_request::{
    Column as PurchaseRequestColumn, Entity as PurchaseRequest, Model as PurchaseRequestModel,
    PurchaseStatus,
};
pub use review::{Column as ReviewColumn, Entity as Review, Model as ReviewModel};
pub use subscription_transaction::{
    Column as SubscriptionTransactionColumn, Entity as SubscriptionTransaction,
    Model as SubscriptionTransactionModel,
};
pub use subscription_usage::{
    Column as SubscriptionUsageColumn, Entity as SubscriptionUsage,
    Model as SubscriptionUsageModel,
};
pub use user::{Column as UserColumn, Entity as User, Model as UserModel, Role};
