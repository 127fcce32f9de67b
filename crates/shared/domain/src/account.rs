//! Account domain entity and related types.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::constants::DEFAULT_ACCOUNT_ACTIVE;
use crate::password::DerivedSecret;

/// Account domain entity
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct Account {
    pub id: i32,
    pub username: String,
    #[serde(skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(skip_serializing)]
    pub password_salt: Option<String>,
    #[serde(skip_serializing)]
    pub password_scheme: Option<String>,
    /// Kind of account holder (student, faculty, ...)
    pub user_type_id: Option<i32>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

// Don't expose secret columns in debug output
impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let redacted = |v: &Option<String>| v.as_ref().map(|_| "[REDACTED]");
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("username", &self.username)
            .field("password_hash", &redacted(&self.password_hash))
            .field("password_salt", &redacted(&self.password_salt))
            .field("password_scheme", &self.password_scheme)
            .field("user_type_id", &self.user_type_id)
            .field("is_active", &self.is_active)
            .field("is_deleted", &self.is_deleted)
            .field("created_date", &self.created_date)
            .field("modified_date", &self.modified_date)
            .finish()
    }
}

impl Account {
    /// Create an unsaved account stamped with the current instant.
    ///
    /// The id is left at zero for the store to assign.
    pub fn new(username: String, is_active: bool) -> Self {
        let now = Utc::now();
        Self {
            id: 0,
            username,
            password_hash: None,
            password_salt: None,
            password_scheme: None,
            user_type_id: None,
            is_active,
            is_deleted: false,
            created_date: now,
            modified_date: now,
        }
    }

    /// Attach a derived secret (hash, salt and scheme together).
    pub fn set_secret(&mut self, secret: DerivedSecret) {
        self.password_hash = Some(secret.hash);
        self.password_salt = Some(secret.salt);
        self.password_scheme = Some(secret.scheme);
    }

    /// Replace the secret after creation
    pub fn change_secret(&mut self, secret: DerivedSecret) {
        self.set_secret(secret);
        self.modified_date = Utc::now();
    }

    /// Check if a password secret is stored
    pub fn has_secret(&self) -> bool {
        self.password_hash.is_some() && self.password_salt.is_some() && self.password_scheme.is_some()
    }

    /// Check if the account may sign in
    pub fn can_sign_in(&self) -> bool {
        self.is_active && !self.is_deleted
    }

    /// Mark the account logically deleted
    pub fn soft_delete(&mut self) {
        self.is_deleted = true;
        self.modified_date = Utc::now();
    }
}

/// Signup input
#[derive(Clone, Deserialize)]
pub struct SignupRequest {
    /// Requested username (exact match, case-sensitive)
    pub username: String,
    /// Plaintext password; when absent no secret is derived
    #[serde(default)]
    pub password: Option<String>,
    /// Optional account holder type
    #[serde(default)]
    pub user_type_id: Option<i32>,
    /// Initial activation state
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    DEFAULT_ACCOUNT_ACTIVE
}

impl fmt::Debug for SignupRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SignupRequest")
            .field("username", &self.username)
            .field("password", &self.password.as_ref().map(|_| "[REDACTED]"))
            .field("user_type_id", &self.user_type_id)
            .field("is_active", &self.is_active)
            .finish()
    }
}

impl SignupRequest {
    pub fn new(username: impl Into<String>, password: Option<String>) -> Self {
        Self {
            username: username.into(),
            password,
            user_type_id: None,
            is_active: DEFAULT_ACCOUNT_ACTIVE,
        }
    }

    /// Password to derive from, if one was actually supplied
    pub fn password(&self) -> Option<&str> {
        self.password.as_deref().filter(|p| !p.is_empty())
    }
}

/// Account projection without secret fields (safe to return to callers)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountResponse {
    pub id: i32,
    pub username: String,
    pub has_password: bool,
    pub user_type_id: Option<i32>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_date: DateTime<Utc>,
    pub modified_date: DateTime<Utc>,
}

impl From<&Account> for AccountResponse {
    fn from(account: &Account) -> Self {
        Self {
            id: account.id,
            username: account.username.clone(),
            has_password: account.has_secret(),
            user_type_id: account.user_type_id,
            is_active: account.is_active,
            is_deleted: account.is_deleted,
            created_date: account.created_date,
            modified_date: account.modified_date,
        }
    }
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        AccountResponse::from(&account)
    }
}
