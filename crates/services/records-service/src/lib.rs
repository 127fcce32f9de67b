//! Records Service Library
//!
//! Campus records data access: a generic repository shared by every entity
//! kind, and the credential service that owns account signup and password
//! secrets.

pub mod config;
pub mod infra;
pub mod repository;
pub mod service;

use std::sync::Arc;

use tracing::info;

use common::AppResult;
use domain::CredentialHasher;

use crate::config::RecordsServiceConfig;
use crate::infra::Database;
use crate::repository::{
    AccountRepository, AccountRoleMappingRepository, RolePrivilegeRepository, RoleRepository,
    StudentRepository, UserTypeRepository,
};
use crate::service::CredentialManager;

/// Explicitly wired repositories and services over one database.
pub struct Records {
    db: Database,
    pub accounts: Arc<AccountRepository>,
    pub roles: Arc<RoleRepository>,
    pub role_privileges: Arc<RolePrivilegeRepository>,
    pub students: Arc<StudentRepository>,
    pub account_roles: Arc<AccountRoleMappingRepository>,
    pub user_types: Arc<UserTypeRepository>,
    pub credentials: Arc<CredentialManager>,
}

impl Records {
    /// Connect, ensure the schema, and wire everything.
    pub async fn connect(config: &RecordsServiceConfig) -> AppResult<Self> {
        let db = Database::connect(&config.database).await?;
        Self::from_database(db, config)
    }

    /// Wire repositories and services over an existing connection.
    pub fn from_database(db: Database, config: &RecordsServiceConfig) -> AppResult<Self> {
        let timeout = config.database.store_timeout();
        let conn = db.get_connection();

        let accounts = Arc::new(AccountRepository::new(conn.clone(), timeout));
        let hasher = CredentialHasher::new(config.kdf.into())?;
        let credentials = Arc::new(CredentialManager::new(accounts.clone(), hasher));

        info!(
            store_timeout = ?timeout,
            kdf = %credentials.hasher().params(),
            "Records service wired"
        );

        Ok(Self {
            accounts,
            roles: Arc::new(RoleRepository::new(conn.clone(), timeout)),
            role_privileges: Arc::new(RolePrivilegeRepository::new(conn.clone(), timeout)),
            students: Arc::new(StudentRepository::new(conn.clone(), timeout)),
            account_roles: Arc::new(AccountRoleMappingRepository::new(conn.clone(), timeout)),
            user_types: Arc::new(UserTypeRepository::new(conn, timeout)),
            credentials,
            db,
        })
    }

    /// Underlying database handle
    pub fn database(&self) -> &Database {
        &self.db
    }
}
