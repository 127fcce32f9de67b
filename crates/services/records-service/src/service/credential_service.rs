//! Credential service - Account signup and password secrets.
//!
//! The only component allowed to write a password secret. Signup runs
//! Validate -> CheckUniqueness -> DeriveSecret -> Persist; any step can reject.
//!
//! The username pre-check is a fast rejection path only. Two concurrent
//! signups for the same name can both pass it; the UNIQUE index on
//! `accounts.username` then turns the losing insert into a
//! `ConstraintViolation`, which is returned unchanged.

use std::sync::Arc;

use async_trait::async_trait;
use sea_orm::{ColumnTrait, Condition};
use tracing::{debug, info};

use common::{AppError, AppResult, OptionExt};
use domain::{Account, CredentialHasher, DerivedSecret, SignupRequest};

use crate::repository::entities::account;
use crate::repository::{Repository, Tracked};

/// Credential service trait for dependency injection.
#[async_trait]
pub trait CredentialService: Send + Sync {
    /// Create an account from a signup request, deriving a secret when a
    /// password is supplied
    async fn create_account(&self, request: Option<SignupRequest>) -> AppResult<Account>;

    /// Check a username/password pair against the stored secret
    async fn verify_password(&self, username: &str, password: &str) -> AppResult<Account>;

    /// Replace the password secret with one derived under a fresh salt
    async fn change_password(&self, id: i32, new_password: String) -> AppResult<Account>;

    /// Logically delete an account; the username stays reserved
    async fn delete_account(&self, id: i32) -> AppResult<Account>;
}

/// Concrete implementation of CredentialService over the account repository.
pub struct CredentialManager {
    accounts: Arc<dyn Repository<account::Entity>>,
    hasher: CredentialHasher,
}

impl CredentialManager {
    /// Create new credential service instance
    pub fn new(accounts: Arc<dyn Repository<account::Entity>>, hasher: CredentialHasher) -> Self {
        Self { accounts, hasher }
    }

    /// Hasher holding the current work factor
    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    fn by_username(username: &str) -> Condition {
        Condition::all().add(account::Column::Username.eq(username))
    }

    fn live_by_id(id: i32) -> Condition {
        Condition::all()
            .add(account::Column::Id.eq(id))
            .add(account::Column::IsDeleted.eq(false))
    }

    /// Derive a secret on the blocking pool; the password is dropped there.
    async fn derive(&self, password: String) -> AppResult<DerivedSecret> {
        let hasher = self.hasher.clone();
        tokio::task::spawn_blocking(move || hasher.derive(&password))
            .await
            .map_err(|e| AppError::internal(format!("Key derivation task failed: {}", e)))?
            .map_err(AppError::from)
    }

    async fn check(&self, account: Option<&Account>, password: &str) -> AppResult<bool> {
        let stored = account.and_then(|a| {
            match (&a.password_hash, &a.password_salt, &a.password_scheme) {
                (Some(hash), Some(salt), Some(scheme)) => {
                    Some((hash.clone(), salt.clone(), scheme.clone()))
                }
                _ => None,
            }
        });
        let password = password.to_owned();
        let hasher = self.hasher.clone();

        tokio::task::spawn_blocking(move || match stored {
            Some((hash, salt, scheme)) => CredentialHasher::verify(&password, &hash, &salt, &scheme),
            None => {
                hasher.dummy_verify(&password);
                Ok(false)
            }
        })
        .await
        .map_err(|e| AppError::internal(format!("Key derivation task failed: {}", e)))?
        .map_err(AppError::from)
    }

    /// Apply `change` to a tracked account and write back only what changed
    async fn save_tracked<F>(
        &self,
        mut tracked: Tracked<account::Model>,
        change: F,
    ) -> AppResult<Account>
    where
        F: FnOnce(&mut Account) + Send,
    {
        let mut account = Account::from(tracked.current().clone());
        change(&mut account);
        *tracked.current_mut() = account.into();

        let updated = self.accounts.update_tracked(tracked).await?;
        Ok(Account::from(updated))
    }
}

#[async_trait]
impl CredentialService for CredentialManager {
    async fn create_account(&self, request: Option<SignupRequest>) -> AppResult<Account> {
        // Validate
        let request =
            request.ok_or_else(|| AppError::invalid_argument("Signup request is required"))?;
        if request.username.trim().is_empty() {
            return Err(AppError::invalid_argument("Username must not be blank"));
        }

        // CheckUniqueness (including deleted accounts, names are never reused)
        if self
            .accounts
            .get(Self::by_username(&request.username))
            .await?
            .is_some()
        {
            info!(username = %request.username, "Signup rejected, username taken");
            return Err(AppError::duplicate_username(request.username));
        }

        // DeriveSecret
        let secret = match request.password() {
            Some(password) => Some(self.derive(password.to_owned()).await?),
            None => None,
        };

        // Persist
        let mut account = Account::new(request.username, request.is_active);
        account.user_type_id = request.user_type_id;
        if let Some(secret) = secret {
            account.set_secret(secret);
        }
        let created = self.accounts.create(account.into()).await?;

        info!(account_id = created.id, username = %created.username, "Account created");
        Ok(Account::from(created))
    }

    async fn verify_password(&self, username: &str, password: &str) -> AppResult<Account> {
        let account = self
            .accounts
            .get(Self::by_username(username))
            .await?
            .map(Account::from)
            .filter(Account::can_sign_in);

        // Always derive once so a missing account costs the same as a wrong password
        if !self.check(account.as_ref(), password).await? {
            debug!(username = %username, "Password verification failed");
            return Err(AppError::InvalidCredentials);
        }
        let mut account = account.ok_or(AppError::InvalidCredentials)?;

        let stale = account
            .password_scheme
            .as_deref()
            .is_some_and(|scheme| self.hasher.needs_rehash(scheme));
        if stale {
            let secret = self.derive(password.to_owned()).await?;
            account.change_secret(secret);
            account = Account::from(self.accounts.update(account.into()).await?);
            info!(account_id = account.id, "Password secret upgraded to current work factor");
        }

        Ok(account)
    }

    async fn change_password(&self, id: i32, new_password: String) -> AppResult<Account> {
        if new_password.is_empty() {
            return Err(AppError::invalid_argument("Password must not be empty"));
        }

        let tracked = self
            .accounts
            .get_tracked(Self::live_by_id(id))
            .await?
            .ok_or_not_found()?;

        let secret = self.derive(new_password).await?;
        let account = self
            .save_tracked(tracked, |account| account.change_secret(secret))
            .await?;

        info!(account_id = account.id, "Password changed");
        Ok(account)
    }

    async fn delete_account(&self, id: i32) -> AppResult<Account> {
        let tracked = self
            .accounts
            .get_tracked(Self::live_by_id(id))
            .await?
            .ok_or_not_found()?;

        let account = self.save_tracked(tracked, Account::soft_delete).await?;

        info!(account_id = account.id, "Account deleted");
        Ok(account)
    }
}
