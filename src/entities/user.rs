//! User entity - Students, chefs and admins.
//!
//! The username is the natural primary key. Phone, email, card number and card holder
//! are stored as ciphertext produced by [`crate::core::crypto::FieldCipher`]; the
//! password is stored only as an argon2 PHC hash.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

/// Account role. Stored as lowercase text.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, EnumIter, DeriveActiveEnum, Serialize, Deserialize)]
#[sea_orm(rs_type = "String", db_type = "Text")]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Buys dishes and subscriptions
    #[sea_orm(string_value = "student")]
    Student,
    /// Runs the kitchen; needs admin approval before logging in
    #[sea_orm(string_value = "chef")]
    Chef,
    /// Approves chefs and purchase requests
    #[sea_orm(string_value = "admin")]
    Admin,
}

impl Role {
    /// Chefs start unapproved, everyone else is approved on registration.
    #[must_use]
    pub const fn approved_on_registration(self) -> bool {
        !matches!(self, Self::Chef)
    }
}

/// User database model
#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "users")]
pub struct Model {
    /// Login name, unique
    #[sea_orm(primary_key, auto_increment = false)]
    pub username: String,
    /// Argon2 PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,
    /// Display name
    pub full_name: String,
    /// Account role
    pub role: Role,
    /// School the user belongs to
    pub school: String,
    /// Class/grade, students only
    pub grade: Option<String>,
    /// Encrypted phone number (empty when not given)
    pub phone: String,
    /// Encrypted email (empty when not given)
    pub email: String,
    /// Current balance; never negative after a successful debit
    pub balance: f64,
    /// Free-text allergy notes
    pub allergies: String,
    /// Chefs may log in only once this is set
    pub is_approved: bool,
    /// Encrypted card number (empty when no card is saved)
    pub card_number: String,
    /// Encrypted card holder name
    pub card_holder: String,
    /// Card expiry as entered by the user (MM/YY)
    pub card_expiry: String,
}

/// Users have no foreign-key relationships
#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
