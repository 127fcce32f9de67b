//! Schema bootstrap from the entity definitions.
//!
//! Creates tables, unique keys and foreign keys if they are missing, and seeds
//! the default user types. This is an idempotent bootstrap, not a versioned
//! migration history.

use sea_orm::sea_query::Index;
use sea_orm::{
    ActiveValue::Set, ConnectionTrait, DatabaseConnection, DbErr, EntityTrait, PaginatorTrait,
    Schema,
};

use crate::repository::entities::{
    account, account_role_mapping, role, role_privilege, student, user_type,
};

/// User types every campus starts with (name, description)
const DEFAULT_USER_TYPES: [(&str, &str); 4] = [
    ("Student", "for Students"),
    ("Faculty", "for Faculty"),
    ("Supporting Staff", "for Supporting Staff"),
    ("Parents", "for Parents"),
];

/// Create every table and index that does not exist yet.
///
/// Referenced tables are created before the tables that point at them.
pub async fn ensure(db: &DatabaseConnection) -> Result<(), DbErr> {
    create_table(db, user_type::Entity).await?;
    create_table(db, account::Entity).await?;
    create_table(db, role::Entity).await?;
    create_table(db, role_privilege::Entity).await?;
    create_table(db, student::Entity).await?;
    create_table(db, account_role_mapping::Entity).await?;

    let pair_index = Index::create()
        .name("idx_account_role_mappings_pair")
        .table(account_role_mapping::Entity)
        .col(account_role_mapping::Column::AccountId)
        .col(account_role_mapping::Column::RoleId)
        .unique()
        .if_not_exists()
        .to_owned();
    db.execute(db.get_database_backend().build(&pair_index))
        .await?;

    seed_user_types(db).await
}

async fn create_table<E>(db: &DatabaseConnection, entity: E) -> Result<(), DbErr>
where
    E: EntityTrait,
{
    let backend = db.get_database_backend();
    let mut statement = Schema::new(backend).create_table_from_entity(entity);
    statement.if_not_exists();

    db.execute(backend.build(&statement)).await?;
    tracing::debug!(table = entity.table_name(), "Table ensured");
    Ok(())
}

async fn seed_user_types(db: &DatabaseConnection) -> Result<(), DbErr> {
    if user_type::Entity::find().count(db).await? > 0 {
        return Ok(());
    }

    let rows = DEFAULT_USER_TYPES
        .iter()
        .map(|(name, description)| user_type::ActiveModel {
            name: Set(name.to_string()),
            description: Set(description.to_string()),
            ..Default::default()
        });
    user_type::Entity::insert_many(rows).exec(db).await?;

    tracing::debug!(count = DEFAULT_USER_TYPES.len(), "User types seeded");
    Ok(())
}
