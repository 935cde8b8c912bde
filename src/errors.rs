//! Unified error type for the canteen backend.
//!
//! Every failure carries a human-readable message (its `Display`) and a stable
//! machine-readable reason returned by [`Error::kind`]. The API layer maps these onto
//! HTTP status codes.

use thiserror::Error;

/// All errors produced by the crate.
#[derive(Debug, Error)]
pub enum Error {
    /// A required field is missing or malformed.
    #[error("Invalid request: {message}")]
    Validation {
        /// What was wrong with the request
        message: String,
    },

    /// A monetary or quantity value is negative, zero where forbidden, or not finite.
    #[error("Invalid amount: {amount}")]
    InvalidAmount {
        /// The rejected value
        amount: f64,
    },

    /// A dish purchase failed the balance or portion check (or referenced nothing).
    #[error("Unable to buy '{dish}': insufficient balance or no portions left")]
    InsufficientFundsOrStock {
        /// Dish name, or the requested menu id when the dish does not exist
        dish: String,
    },

    /// A balance debit other than a dish purchase would overdraw the account.
    #[error("Insufficient funds: balance {current:.2}, required {required:.2}")]
    InsufficientFunds {
        /// Balance at the time of the check
        current: f64,
        /// Amount that was requested
        required: f64,
    },

    /// The user never bought a subscription of this type.
    #[error("You do not have a '{sub_type}' subscription")]
    NoEntitlement {
        /// Subscription type
        sub_type: String,
    },

    /// The subscription was already redeemed today.
    #[error("The '{sub_type}' subscription has already been used today")]
    AlreadyRedeemedToday {
        /// Subscription type
        sub_type: String,
    },

    /// A redemption request selected no dishes.
    #[error("Select at least one dish")]
    NoDishesSelected,

    /// A referenced entity does not exist.
    #[error("{entity} '{key}' not found")]
    NotFound {
        /// Entity name (e.g. "user")
        entity: &'static str,
        /// Lookup key
        key: String,
    },

    /// Registration collided with an existing username.
    #[error("Username '{username}' is already taken")]
    DuplicateUsername {
        /// The username that was requested
        username: String,
    },

    /// Username or password did not match.
    #[error("Invalid username or password")]
    InvalidCredentials,

    /// A chef tried to log in before an admin approved the account.
    #[error("Chef account is awaiting admin approval")]
    ChefNotApproved,

    /// The action `type` is not one the dispatcher knows.
    #[error("Unknown action: '{kind}'")]
    UnknownAction {
        /// The unrecognized tag
        kind: String,
    },

    /// Configuration could not be loaded or is invalid.
    #[error("Configuration error: {message}")]
    Config {
        /// Details
        message: String,
    },

    /// Encryption or password hashing failed.
    #[error("Crypto error: {message}")]
    Crypto {
        /// Details
        message: String,
    },

    /// Database error from `SeaORM`.
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Environment variable error.
    #[error("Environment variable error: {0}")]
    EnvVar(#[from] std::env::VarError),
}

impl Error {
    /// Machine-readable reason, stable across releases.
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::Validation { .. } => "ValidationError",
            Self::InvalidAmount { .. } => "InvalidAmount",
            Self::InsufficientFundsOrStock { .. } => "InsufficientFundsOrStock",
            Self::InsufficientFunds { .. } => "InsufficientFunds",
            Self::NoEntitlement { .. } => "NoEntitlement",
            Self::AlreadyRedeemedToday { .. } => "AlreadyRedeemedToday",
            Self::NoDishesSelected => "NoDishesSelected",
            Self::NotFound { .. } => "NotFound",
            Self::DuplicateUsername { .. } => "DuplicateUsername",
            Self::InvalidCredentials => "InvalidCredentials",
            Self::ChefNotApproved => "ChefNotApproved",
            Self::UnknownAction { .. } => "UnknownAction",
            Self::Config { .. } => "ConfigError",
            Self::Crypto { .. } => "CryptoError",
            Self::Database(_) => "DatabaseError",
            Self::Io(_) => "IoError",
            Self::EnvVar(_) => "EnvVarError",
        }
    }

    pub(crate) fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }
}

/// Convenience `Result` type
pub type Result<T> = std::result::Result<T, Error>;
