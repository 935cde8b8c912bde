/// Per-user account changes: balance, profile, chef approval, saved cards
pub mod accounts;
/// Login, registration and account seeding
pub mod auth;
/// Action commands parsed from client requests
pub mod command;
/// Field encryption for data stored at rest
pub mod crypto;
/// Applies commands atomically
pub mod dispatcher;
/// Menu management
pub mod menu;
/// Notification records
pub mod notify;
/// Dish purchases and order confirmation
pub mod orders;
/// Database handle, write scopes and atomic balance/portion helpers
pub mod store;
/// Meal plan purchase and daily redemption
pub mod subscription;
/// Ingredient stock, purchase requests and reviews
pub mod supply;
/// Full-state read projection for the client
pub mod sync;
