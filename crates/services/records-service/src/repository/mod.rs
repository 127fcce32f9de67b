//! Repository layer - Data access abstraction
//!
//! Every entity kind is served by the same generic repository; the aliases
//! below only name the instantiations.

mod base;
pub mod entities;

pub use base::{Repository, SeaRepository, Tracked};

use entities::{account, account_role_mapping, role, role_privilege, student, user_type};

pub type AccountRepository = SeaRepository<account::Entity>;
pub type RoleRepository = SeaRepository<role::Entity>;
pub type RolePrivilegeRepository = SeaRepository<role_privilege::Entity>;
pub type StudentRepository = SeaRepository<student::Entity>;
pub type AccountRoleMappingRepository = SeaRepository<account_role_mapping::Entity>;
pub type UserTypeRepository = SeaRepository<user_type::Entity>;

#[cfg(any(test, feature = "test-utils"))]
mod mock {
    use async_trait::async_trait;
    use mockall::mock;
    use sea_orm::Condition;

    use super::entities::account;
    use super::{Repository, Tracked};
    use common::AppResult;

    mock! {
        pub AccountRepo {}

        #[async_trait]
        impl Repository<account::Entity> for AccountRepo {
            async fn get_all(&self) -> AppResult<Vec<account::Model>>;
            async fn get(&self, filter: Condition) -> AppResult<Option<account::Model>>;
            async fn get_tracked(&self, filter: Condition) -> AppResult<Option<Tracked<account::Model>>>;
            async fn create(&self, record: account::Model) -> AppResult<account::Model>;
            async fn update(&self, record: account::Model) -> AppResult<account::Model>;
            async fn update_tracked(&self, record: Tracked<account::Model>) -> AppResult<account::Model>;
            async fn delete(&self, record: account::Model) -> AppResult<bool>;
        }
    }
}

// Export mock for tests (both unit and integration)
#[cfg(any(test, feature = "test-utils"))]
pub use mock::MockAccountRepo;
