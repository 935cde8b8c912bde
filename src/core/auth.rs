//! Authentication - Login, registration and startup account seeding.
//!
//! Passwords are stored as argon2 PHC strings. Chefs register unapproved and cannot log
//! in until an admin approves them; students and admins are approved immediately.
//!
//! Hashing and verification run on the blocking pool and never while a store scope is
//! held, so a slow hash cannot stall actions queued behind the write gate.

use crate::{
    config::seed::{SeedAccount, SeedConfig},
    core::{crypto::FieldCipher, store, store::Store, sync::UserView},
    entities::{Role, user},
    errors::{Error, Result},
};
use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString, rand_core::OsRng},
};
use sea_orm::{ActiveModelTrait, ConnectionTrait, Set};
use serde::Deserialize;
use tracing::{info, instrument, warn};

/// A self-service registration request.
#[derive(Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Registration {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub role: Role,
    pub school: String,
    #[serde(default)]
    pub grade: Option<String>,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
}

impl std::fmt::Debug for Registration {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Registration")
            .field("username", &self.username)
            .field("role", &self.role)
            .field("school", &self.school)
            .finish_non_exhaustive()
    }
}

impl From<&SeedAccount> for Registration {
    fn from(account: &SeedAccount) -> Self {
        Self {
            username: account.username.clone(),
            password: account.password.clone(),
            full_name: account.full_name.clone(),
            role: account.role,
            school: account.school.clone(),
            grade: account.grade.clone(),
            phone: account.phone.clone(),
            email: account.email.clone(),
        }
    }
}

fn hash_blocking(password: &str) -> Result<String> {
    let salt = SaltString::generate(&mut OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| Error::Crypto {
            message: format!("password hashing failed: {e}"),
        })
}

/// Hashes a password into a PHC string with a fresh random salt.
///
/// The work runs on tokio's blocking pool.
pub async fn hash_password(password: &str) -> Result<String> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || hash_blocking(&password))
        .await
        .map_err(|e| Error::Crypto {
            message: format!("password hashing task failed: {e}"),
        })?
}

async fn verify_password(password: &str, stored_hash: String) -> Result<bool> {
    let password = password.to_string();
    tokio::task::spawn_blocking(move || password_matches(&password, &stored_hash))
        .await
        .map_err(|e| Error::Crypto {
            message: format!("password verification task failed: {e}"),
        })
}

fn password_matches(password: &str, stored_hash: &str) -> bool {
    // An unparsable hash can never match
    PasswordHash::new(stored_hash).is_ok_and(|parsed| {
        Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok()
    })
}

/// Checks a username and password.
///
/// Unknown users and wrong passwords both yield [`Error::InvalidCredentials`]. A correct
/// password for an unapproved chef yields [`Error::ChefNotApproved`].
#[instrument(skip(store, cipher, password))]
pub async fn verify_credentials(
    store: &Store,
    cipher: &FieldCipher,
    username: &str,
    password: &str,
) -> Result<UserView> {
    let scope = store.snapshot().await?;
    let found = store::find_user(scope.txn(), username).await?;
    scope.commit().await?;

    let verified = match found {
        Some(account) => verify_password(password, account.password_hash.clone())
            .await?
            .then_some(account),
        None => None,
    };
    let Some(account) = verified else {
        warn!("login rejected");
        return Err(Error::InvalidCredentials);
    };
    if account.role == Role::Chef && !account.is_approved {
        warn!("chef not approved yet");
        return Err(Error::ChefNotApproved);
    }

    info!(role = ?account.role, "login succeeded");
    Ok(UserView::from_model(account, cipher))
}

async fn insert_account<C>(
    db: &C,
    cipher: &FieldCipher,
    registration: &Registration,
    password_hash: String,
    balance: f64,
    approved: bool,
) -> Result<user::Model>
where
    C: ConnectionTrait,
{
    let row = user::ActiveModel {
        username: Set(registration.username.trim().to_string()),
        password_hash: Set(password_hash),
        full_name: Set(registration.full_name.trim().to_string()),
        role: Set(registration.role),
        school: Set(registration.school.trim().to_string()),
        grade: Set(registration.grade.clone().filter(|g| !g.trim().is_empty())),
        phone: Set(cipher.encrypt(registration.phone.trim())?),
        email: Set(cipher.encrypt(registration.email.trim())?),
        balance: Set(balance),
        allergies: Set(String::new()),
        is_approved: Set(approved),
        card_number: Set(String::new()),
        card_holder: Set(String::new()),
        card_expiry: Set(String::new()),
    };
    row.insert(db).await.map_err(Into::into)
}

/// Creates an account with a zero balance.
///
/// The password is hashed before the write scope opens. The username check runs
/// inside the scope, so of two concurrent registrations for one name exactly one wins.
///
/// # Arguments
/// * `store` - The store to write the account into
/// * `cipher` - Encrypts the phone and email fields before they are stored
/// * `registration` - The submitted form; surrounding whitespace is trimmed
///
/// # Returns
/// `Ok(())` once the account is committed. Fails with [`Error::Validation`] for an empty
/// username or password and with [`Error::DuplicateUsername`] when the name is taken.
#[instrument(skip(store, cipher, registration), fields(username = %registration.username, role = ?registration.role))]
pub async fn register_user(
    store: &Store,
    cipher: &FieldCipher,
    registration: Registration,
) -> Result<()> {
    let username = registration.username.trim();
    if username.is_empty() {
        return Err(Error::validation("username cannot be empty"));
    }
    if registration.password.is_empty() {
        return Err(Error::validation("password cannot be empty"));
    }

    let password_hash = hash_password(&registration.password).await?;

    let scope = store.write().await?;
    if store::find_user(scope.txn(), username).await?.is_some() {
        return Err(Error::DuplicateUsername {
            username: username.to_string(),
        });
    }
    let approved = registration.role.approved_on_registration();
    insert_account(scope.txn(), cipher, &registration, password_hash, 0.0, approved).await?;
    scope.commit().await?;

    info!("user registered");
    Ok(())
}

/// Inserts every configured account whose username is still free.
///
/// Seeded accounts are approved regardless of role. Returns how many were created.
pub async fn seed_accounts(store: &Store, cipher: &FieldCipher, config: &SeedConfig) -> Result<usize> {
    let scope = store.snapshot().await?;
    let mut missing = Vec::new();
    for account in &config.accounts {
        if store::find_user(scope.txn(), &account.username).await?.is_none() {
            missing.push(account);
        }
    }
    scope.commit().await?;

    let mut hashed = Vec::with_capacity(missing.len());
    for account in missing {
        hashed.push((account, hash_password(&account.password).await?));
    }

    let scope = store.write().await?;
    let mut created = 0;
    for (account, password_hash) in hashed {
        // Registered in the meantime, or listed twice in the file
        if store::find_user(scope.txn(), &account.username).await?.is_some() {
            continue;
        }
        let registration = Registration::from(account);
        insert_account(scope.txn(), cipher, &registration, password_hash, account.balance, true)
            .await?;
        info!(username = %account.username, role = ?account.role, "seeded account");
        created += 1;
    }
    scope.commit().await?;
    Ok(created)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    #![allow(clippy::float_cmp)]
    use super::*;
    use crate::test_utils::*;
    use std::sync::Arc;

    fn registration(username: &str, role: Role) -> Registration {
        Registration {
            username: username.to_string(),
            password: "secret".to_string(),
            full_name: "Test Person".to_string(),
            role,
            school: "School 1".to_string(),
            grade: None,
            phone: "+7 900 000-00-00".to_string(),
            email: "person@example.com".to_string(),
        }
    }

    #[tokio::test]
    async fn test_hash_is_salted_and_verifiable() {
        let first = hash_password("pw").await.unwrap();
        let second = hash_password("pw").await.unwrap();
        assert_ne!(first, second);
        assert!(verify_password("pw", first.clone()).await.unwrap());
        assert!(!verify_password("wrong", first).await.unwrap());
        assert!(!password_matches("pw", "not-a-hash"));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_registrations_and_actions() -> Result<()> {
        let (dispatcher, dish) = setup_dispatcher_with_dish(1000.0, 150.0, 5).await?;
        let store = dispatcher.store().clone();
        let cipher = Arc::new(test_cipher());

        let mut tasks = Vec::new();
        for username in ["dup", "dup", "other"] {
            let store = store.clone();
            let cipher = Arc::clone(&cipher);
            tasks.push(tokio::spawn(async move {
                register_user(&store, &cipher, registration(username, Role::Student)).await
            }));
        }
        let menu_id = dish.id;
        dispatcher
            .apply(crate::core::command::Command::PurchaseDish {
                user: "a".to_string(),
                menu_id,
                allergies: String::new(),
            })
            .await?;

        let mut registered = 0;
        let mut duplicates = 0;
        for task in tasks {
            match task.await.unwrap() {
                Ok(()) => registered += 1,
                Err(Error::DuplicateUsername { username }) => {
                    assert_eq!(username, "dup");
                    duplicates += 1;
                }
                Err(e) => return Err(e),
            }
        }
        assert_eq!((registered, duplicates), (2, 1));
        assert_eq!(balance_of(&store, "a").await?, 850.0);
        verify_credentials(&store, &cipher, "other", "secret").await?;
        verify_credentials(&store, &cipher, "dup", "secret").await?;
        Ok(())
    }

    #[tokio::test]
    async fn test_register_then_login() -> Result<()> {
        let store = setup_test_store().await?;
        let cipher = test_cipher();
        register_user(&store, &cipher, registration("newbie", Role::Student)).await?;

        let stored = store::find_user(store.connection(), "newbie").await?.unwrap();
        assert_ne!(stored.phone, "+7 900 000-00-00");
        assert_eq!(stored.balance, 0.0);

        let view = verify_credentials(&store, &cipher, "newbie", "secret").await?;
        assert_eq!(view.phone, "+7 900 000-00-00");
        assert_eq!(view.email, "person@example.com");
        assert!(view.is_approved);
        Ok(())
    }

    #[tokio::test]
    async fn test_wrong_password_and_unknown_user() -> Result<()> {
        let store = setup_test_store().await?;
        let cipher = test_cipher();
        register_user(&store, &cipher, registration("newbie", Role::Student)).await?;

        let err = verify_credentials(&store, &cipher, "newbie", "nope")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
        let err = verify_credentials(&store, &cipher, "ghost", "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
        Ok(())
    }

    #[tokio::test]
    async fn test_duplicate_username() -> Result<()> {
        let store = setup_test_store().await?;
        let cipher = test_cipher();
        register_user(&store, &cipher, registration("dup", Role::Student)).await?;
        let err = register_user(&store, &cipher, registration("dup", Role::Admin))
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DuplicateUsername { username } if username == "dup"));
        Ok(())
    }

    #[tokio::test]
    async fn test_chef_needs_approval() -> Result<()> {
        let store = setup_test_store().await?;
        let cipher = test_cipher();
        register_user(&store, &cipher, registration("cook", Role::Chef)).await?;

        let err = verify_credentials(&store, &cipher, "cook", "secret")
            .await
            .unwrap_err();
        assert!(matches!(err, Error::ChefNotApproved));

        let scope = store.write().await?;
        crate::core::accounts::approve_chef(scope.txn(), "cook", chrono::Utc::now()).await?;
        scope.commit().await?;

        let view = verify_credentials(&store, &cipher, "cook", "secret").await?;
        assert_eq!(view.role, Role::Chef);
        Ok(())
    }

    #[tokio::test]
    async fn test_seed_accounts_only_inserts_missing() -> Result<()> {
        let store = setup_test_store().await?;
        let cipher = test_cipher();
        let config: SeedConfig = toml::from_str(
            r#"
            [[accounts]]
            username = "admin"
            password = "123"
            full_name = "Administrator"
            role = "admin"
            school = "School 1"

            [[accounts]]
            username = "a"
            password = "1"
            full_name = "Student A"
            role = "student"
            school = "School 1"
            grade = "9A"
            balance = 1000.0

            [[accounts]]
            username = "aa"
            password = "1"
            full_name = "Chef"
            role = "chef"
            school = "School 1"
            phone = "+7 999 123-45-67"
            "#,
        )
        .unwrap();

        assert_eq!(seed_accounts(&store, &cipher, &config).await?, 3);
        assert_eq!(balance_of(&store, "a").await?, 1000.0);

        // Spending then reseeding keeps the spent balance
        let scope = store.write().await?;
        store::debit_balance(scope.txn(), "a", 400.0).await?;
        scope.commit().await?;
        assert_eq!(seed_accounts(&store, &cipher, &config).await?, 0);
        assert_eq!(balance_of(&store, "a").await?, 600.0);

        verify_credentials(&store, &cipher, "admin", "123").await?;
        // Seeded chefs skip the approval step
        let chef = verify_credentials(&store, &cipher, "aa", "1").await?;
        assert_eq!(chef.phone, "+7 999 123-45-67");
        Ok(())
    }
}
