//! Account database entity for SeaORM.

use sea_orm::entity::prelude::*;

use domain::Account;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    /// Authoritative guard for username uniqueness
    #[sea_orm(unique)]
    pub username: String,
    pub password_hash: Option<String>,
    pub password_salt: Option<String>,
    pub password_scheme: Option<String>,
    pub user_type_id: Option<i32>,
    pub is_active: bool,
    /// Logical delete flag
    pub is_deleted: bool,
    pub created_date: DateTimeUtc,
    pub modified_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::account_role_mapping::Entity")]
    RoleMappings,
    #[sea_orm(
        belongs_to = "super::user_type::Entity",
        from = "Column::UserTypeId",
        to = "super::user_type::Column::Id",
        on_delete = "SetNull"
    )]
    UserType,
}

impl Related<super::account_role_mapping::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::RoleMappings.def()
    }
}

impl Related<super::user_type::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::UserType.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

/// Convert database model to domain entity
impl From<Model> for Account {
    fn from(model: Model) -> Self {
        Account {
            id: model.id,
            username: model.username,
            password_hash: model.password_hash,
            password_salt: model.password_salt,
            password_scheme: model.password_scheme,
            user_type_id: model.user_type_id,
            is_active: model.is_active,
            is_deleted: model.is_deleted,
            created_date: model.created_date,
            modified_date: model.modified_date,
        }
    }
}

/// Convert domain entity to database model
impl From<Account> for Model {
    fn from(account: Account) -> Self {
        Model {
            id: account.id,
            username: account.username,
            password_hash: account.password_hash,
            password_salt: account.password_salt,
            password_scheme: account.password_scheme,
            user_type_id: account.user_type_id,
            is_active: account.is_active,
            is_deleted: account.is_deleted,
            created_date: account.created_date,
            modified_date: account.modified_date,
        }
    }
}
