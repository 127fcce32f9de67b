//! Role database entity for SeaORM.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, Eq, DeriveEntityModel)]
#[sea_orm(table_name = "roles")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub role_name: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub is_deleted: bool,
    pub created_date: DateTimeUtc,
    pub modified_date: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::role_privilege::Entity")]
    Privileges,
    #[sea_orm(has_many = "super::account_role_mapping::Entity")]
    AccountMappings,
}

impl Related<super::role_privilege::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Privileges.def()
    }
}

impl Related<super::account_role_mapping::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::AccountMappings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
