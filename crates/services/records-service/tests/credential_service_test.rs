//! Credential service integration tests against in-memory SQLite.

use std::sync::Arc;

use async_trait::async_trait;
use futures::future::join_all;
use sea_orm::Condition;

use common::{AppError, AppResult};
use domain::{CredentialHasher, KdfParams, SignupRequest};
use records_service_lib::config::RecordsServiceConfig;
use records_service_lib::repository::entities::account;
use records_service_lib::repository::{AccountRepository, Repository, Tracked};
use records_service_lib::service::{CredentialManager, CredentialService};
use records_service_lib::Records;

async fn records() -> Records {
    Records::connect(&RecordsServiceConfig::in_memory())
        .await
        .expect("in-memory database")
}

fn signup(username: &str, password: Option<&str>) -> Option<SignupRequest> {
    Some(SignupRequest::new(username, password.map(str::to_string)))
}

#[tokio::test]
async fn test_signup_with_password() {
    let records = records().await;

    let alice = records
        .credentials
        .create_account(signup("alice", Some("Secr3t!")))
        .await
        .unwrap();

    assert!(alice.id > 0);
    assert_eq!(alice.username, "alice");
    assert!(alice.is_active);
    assert!(!alice.is_deleted);
    assert_eq!(alice.created_date, alice.modified_date);

    let hash = alice.password_hash.as_deref().unwrap();
    let salt = alice.password_salt.as_deref().unwrap();
    let scheme = alice.password_scheme.as_deref().unwrap();
    assert_ne!(hash, "Secr3t!");
    assert_eq!(
        CredentialHasher::rederive("Secr3t!", salt, scheme).unwrap(),
        hash
    );
}

#[tokio::test]
async fn test_signup_without_password() {
    let records = records().await;

    let bob = records
        .credentials
        .create_account(signup("bob", None))
        .await
        .unwrap();

    assert_eq!(bob.username, "bob");
    assert!(!bob.has_secret());
    assert!(bob.password_hash.is_none());
    assert!(bob.password_salt.is_none());

    // No secret means no password can match
    let result = records.credentials.verify_password("bob", "").await;
    assert!(matches!(result, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn test_blank_username_leaves_store_untouched() {
    let records = records().await;

    let result = records
        .credentials
        .create_account(signup("  ", Some("Secr3t!")))
        .await;

    assert!(matches!(result, Err(AppError::InvalidArgument(_))));
    assert!(records.accounts.get_all().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_duplicate_username_rejected() {
    let records = records().await;
    records
        .credentials
        .create_account(signup("alice", Some("Secr3t!")))
        .await
        .unwrap();

    let result = records
        .credentials
        .create_account(signup("alice", Some("other")))
        .await;

    assert!(matches!(result, Err(AppError::DuplicateUsername(name)) if name == "alice"));
    let rows = records.accounts.get_all().await.unwrap();
    assert_eq!(rows.iter().filter(|a| a.username == "alice").count(), 1);
}

#[tokio::test]
async fn test_same_password_yields_distinct_secrets() {
    let records = records().await;

    let first = records
        .credentials
        .create_account(signup("first", Some("Secr3t!")))
        .await
        .unwrap();
    let second = records
        .credentials
        .create_account(signup("second", Some("Secr3t!")))
        .await
        .unwrap();

    assert_ne!(first.password_salt, second.password_salt);
    assert_ne!(first.password_hash, second.password_hash);
}

#[tokio::test]
async fn test_verify_password() {
    let records = records().await;
    let alice = records
        .credentials
        .create_account(signup("alice", Some("Secr3t!")))
        .await
        .unwrap();

    let verified = records
        .credentials
        .verify_password("alice", "Secr3t!")
        .await
        .unwrap();
    assert_eq!(verified.id, alice.id);

    let wrong = records.credentials.verify_password("alice", "secr3t!").await;
    assert!(matches!(wrong, Err(AppError::InvalidCredentials)));

    let unknown = records.credentials.verify_password("mallory", "Secr3t!").await;
    assert!(matches!(unknown, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn test_inactive_account_cannot_sign_in() {
    let records = records().await;
    let mut request = SignupRequest::new("carol", Some("Secr3t!".to_string()));
    request.is_active = false;
    records
        .credentials
        .create_account(Some(request))
        .await
        .unwrap();

    let result = records.credentials.verify_password("carol", "Secr3t!").await;
    assert!(matches!(result, Err(AppError::InvalidCredentials)));
}

#[tokio::test]
async fn test_change_password_replaces_secret() {
    let records = records().await;
    let alice = records
        .credentials
        .create_account(signup("alice", Some("Secr3t!")))
        .await
        .unwrap();

    let changed = records
        .credentials
        .change_password(alice.id, "N3w-pass".to_string())
        .await
        .unwrap();

    assert_ne!(changed.password_salt, alice.password_salt);
    assert_ne!(changed.password_hash, alice.password_hash);
    assert!(changed.modified_date >= alice.modified_date);
    assert_eq!(changed.created_date, alice.created_date);

    let old = records.credentials.verify_password("alice", "Secr3t!").await;
    assert!(matches!(old, Err(AppError::InvalidCredentials)));
    records
        .credentials
        .verify_password("alice", "N3w-pass")
        .await
        .unwrap();
}

#[tokio::test]
async fn test_change_password_of_unknown_account_is_not_found() {
    let records = records().await;

    let result = records
        .credentials
        .change_password(404, "N3w-pass".to_string())
        .await;
    assert!(matches!(result, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_delete_account_keeps_username_reserved() {
    let records = records().await;
    let alice = records
        .credentials
        .create_account(signup("alice", Some("Secr3t!")))
        .await
        .unwrap();

    let deleted = records.credentials.delete_account(alice.id).await.unwrap();
    assert!(deleted.is_deleted);
    assert!(deleted.modified_date >= alice.modified_date);
    assert_eq!(deleted.password_hash, alice.password_hash);

    // The row remains, the name stays taken, and sign-in is refused
    assert_eq!(records.accounts.get_all().await.unwrap().len(), 1);
    let again = records
        .credentials
        .create_account(signup("alice", Some("Secr3t!")))
        .await;
    assert!(matches!(again, Err(AppError::DuplicateUsername(_))));
    let verify = records.credentials.verify_password("alice", "Secr3t!").await;
    assert!(matches!(verify, Err(AppError::InvalidCredentials)));

    // A deleted account cannot be deleted twice
    let twice = records.credentials.delete_account(alice.id).await;
    assert!(matches!(twice, Err(AppError::NotFound)));
}

#[tokio::test]
async fn test_concurrent_signups_create_one_account() {
    let records = records().await;

    let attempts = (0..4).map(|_| {
        records
            .credentials
            .create_account(signup("alice", Some("Secr3t!")))
    });
    let results = join_all(attempts).await;

    assert_eq!(results.iter().filter(|r| r.is_ok()).count(), 1);
    for result in results.iter().filter_map(|r| r.as_ref().err()) {
        assert!(matches!(
            result,
            AppError::DuplicateUsername(_) | AppError::ConstraintViolation(_)
        ));
    }
    assert_eq!(records.accounts.get_all().await.unwrap().len(), 1);
}

/// Account store whose lookups never find anything, as seen by a signup
/// that loses the race between its uniqueness check and its insert.
struct StaleLookups(Arc<AccountRepository>);

#[async_trait]
impl Repository<account::Entity> for StaleLookups {
    async fn get_all(&self) -> AppResult<Vec<account::Model>> {
        self.0.get_all().await
    }

    async fn get(&self, _filter: Condition) -> AppResult<Option<account::Model>> {
        Ok(None)
    }

    async fn get_tracked(&self, _filter: Condition) -> AppResult<Option<Tracked<account::Model>>> {
        Ok(None)
    }

    async fn create(&self, record: account::Model) -> AppResult<account::Model> {
        self.0.create(record).await
    }

    async fn update(&self, record: account::Model) -> AppResult<account::Model> {
        self.0.update(record).await
    }

    async fn update_tracked(&self, record: Tracked<account::Model>) -> AppResult<account::Model> {
        self.0.update_tracked(record).await
    }

    async fn delete(&self, record: account::Model) -> AppResult<bool> {
        self.0.delete(record).await
    }
}

#[tokio::test]
async fn test_unique_index_rejects_signup_that_passed_precheck() {
    let records = records().await;
    records
        .credentials
        .create_account(signup("alice", Some("Secr3t!")))
        .await
        .unwrap();

    let racing = CredentialManager::new(
        Arc::new(StaleLookups(records.accounts.clone())),
        records.credentials.hasher().clone(),
    );
    let result = racing
        .create_account(signup("alice", Some("other")))
        .await;

    assert!(matches!(result, Err(AppError::ConstraintViolation(_))));
    let rows = records.accounts.get_all().await.unwrap();
    assert_eq!(rows.iter().filter(|a| a.username == "alice").count(), 1);
}

#[tokio::test]
async fn test_signup_records_user_type() {
    let records = records().await;
    let faculty = records.user_types.get_all().await.unwrap()[1].clone();

    let mut request = SignupRequest::new("dana", Some("Secr3t!".to_string()));
    request.user_type_id = Some(faculty.id);
    let dana = records
        .credentials
        .create_account(Some(request))
        .await
        .unwrap();

    assert_eq!(dana.user_type_id, Some(faculty.id));
}

#[tokio::test]
async fn test_verify_upgrades_stale_work_factor() {
    let records = records().await;

    let legacy = CredentialManager::new(
        records.accounts.clone(),
        CredentialHasher::new(KdfParams::new(512, 1, 1)).unwrap(),
    );
    let alice = legacy
        .create_account(signup("alice", Some("Secr3t!")))
        .await
        .unwrap();
    assert_eq!(
        alice.password_scheme.as_deref(),
        Some("argon2id$v=19$m=512,t=1,p=1")
    );

    let current: Arc<CredentialManager> = records.credentials.clone();
    let upgraded = current.verify_password("alice", "Secr3t!").await.unwrap();

    let scheme = current.hasher().params().to_string();
    assert_eq!(upgraded.password_scheme.as_deref(), Some(scheme.as_str()));
    assert_ne!(upgraded.password_salt, alice.password_salt);

    // Both the upgraded secret and a fresh lookup still accept the password
    current.verify_password("alice", "Secr3t!").await.unwrap();
    let stored = records.accounts.get_all().await.unwrap();
    assert_eq!(stored[0].password_scheme.as_deref(), Some(scheme.as_str()));
}
