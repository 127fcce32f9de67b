//! Generic repository over any SeaORM entity with a store-assigned key.
//!
//! One trait, [`Repository`], covers CRUD for every entity kind; one
//! implementation, [`SeaRepository`], runs it against a database connection.
//! Entity-specific repositories are type aliases of `SeaRepository<E>`.

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use sea_orm::{
    ActiveModelBehavior, ActiveModelTrait, ColumnTrait, Condition, DatabaseConnection, DbErr,
    EntityTrait, IntoActiveModel, Iterable, ModelTrait, PrimaryKeyToColumn, QueryFilter,
    QueryOrder, Value,
};
use tracing::{debug, warn};

use common::{AppError, AppResult};

/// A record fetched with change tracking.
///
/// The handle owns the snapshot taken at read time; `update_tracked` writes
/// only the columns that differ from it. Dropping the handle detaches the
/// record, nothing is retained by the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct Tracked<M> {
    original: M,
    current: M,
}

impl<M: Clone> Tracked<M> {
    pub fn new(record: M) -> Self {
        Self {
            original: record.clone(),
            current: record,
        }
    }

    /// Row as it was read
    pub fn original(&self) -> &M {
        &self.original
    }

    /// Record with the caller's pending changes
    pub fn current(&self) -> &M {
        &self.current
    }

    pub fn current_mut(&mut self) -> &mut M {
        &mut self.current
    }

    /// Give up tracking and keep the edited record
    pub fn detach(self) -> M {
        self.current
    }

    fn into_parts(self) -> (M, M) {
        (self.original, self.current)
    }
}

/// CRUD contract shared by every entity kind.
#[async_trait]
pub trait Repository<E>: Send + Sync
where
    E: EntityTrait,
{
    /// Every row, ordered by primary key
    async fn get_all(&self) -> AppResult<Vec<E::Model>>;

    /// First row matching `filter`, lowest primary key on multiple matches.
    ///
    /// No match is `Ok(None)`, never an error.
    async fn get(&self, filter: Condition) -> AppResult<Option<E::Model>>;

    /// Like [`Repository::get`], but the row comes back attached to a
    /// change-tracking handle for a later `update_tracked`.
    ///
    /// The caller must not mutate the same record through another handle
    /// while it holds this one.
    async fn get_tracked(&self, filter: Condition) -> AppResult<Option<Tracked<E::Model>>>;

    /// Insert with a store-assigned key and return the persisted row
    async fn create(&self, record: E::Model) -> AppResult<E::Model>;

    /// Replace every non-key column of the row with the record's key
    /// (`NotFound` if absent)
    async fn update(&self, record: E::Model) -> AppResult<E::Model>;

    /// Write only the columns changed since the tracked read
    /// (`NotFound` if the row is gone)
    async fn update_tracked(&self, record: Tracked<E::Model>) -> AppResult<E::Model>;

    /// Remove the row with the record's key; `true` if a row was removed
    async fn delete(&self, record: E::Model) -> AppResult<bool>;
}

/// SeaORM-backed repository for entity `E`.
pub struct SeaRepository<E: EntityTrait> {
    db: DatabaseConnection,
    timeout: Duration,
    _entity: std::marker::PhantomData<fn() -> E>,
}

impl<E> SeaRepository<E>
where
    E: EntityTrait,
    E::Model: Sync + IntoActiveModel<E::ActiveModel>,
    E::ActiveModel: ActiveModelBehavior + Send + 'static,
{
    /// Create new repository instance; every store call is bounded by `timeout`
    pub fn new(db: DatabaseConnection, timeout: Duration) -> Self {
        Self {
            db,
            timeout,
            _entity: std::marker::PhantomData,
        }
    }

    /// Get database connection reference
    pub fn db(&self) -> &DatabaseConnection {
        &self.db
    }

    fn table() -> String {
        E::default().table_name().to_string()
    }

    fn is_key(column: E::Column) -> bool {
        <E::PrimaryKey as PrimaryKeyToColumn>::from_column(column).is_some()
    }

    /// Text form of the record's primary key, for logs
    fn key_of(record: &E::Model) -> String {
        E::PrimaryKey::iter()
            .map(|key| format!("{:?}", record.get(key.into_column())))
            .collect::<Vec<_>>()
            .join(",")
    }

    fn key_condition(record: &E::Model) -> Condition {
        E::PrimaryKey::iter().fold(Condition::all(), |condition, key| {
            let column = key.into_column();
            condition.add(ColumnTrait::eq(&column, record.get(column)))
        })
    }

    /// Active model with every non-key column marked for writing
    fn full_write(record: E::Model) -> E::ActiveModel {
        let mut active: E::ActiveModel = record.into_active_model();
        for column in E::Column::iter() {
            if Self::is_key(column) {
                continue;
            }
            if let Some(value) = active.get(column).into_value() {
                active.set(column, value);
            }
        }
        active
    }

    /// Active model with only the columns that differ from `original` marked
    fn diff_write(original: E::Model, record: &E::Model) -> (E::ActiveModel, usize) {
        let mut changed = 0;
        let mut active: E::ActiveModel = original.clone().into_active_model();
        for column in E::Column::iter() {
            if Self::is_key(column) {
                continue;
            }
            let value: Value = record.get(column);
            if value != original.get(column) {
                active.set(column, value);
                changed += 1;
            }
        }
        (active, changed)
    }

    /// Run a store call under the configured timeout
    async fn bounded<T, F>(&self, operation: &'static str, call: F) -> AppResult<T>
    where
        F: Future<Output = Result<T, DbErr>> + Send,
    {
        match tokio::time::timeout(self.timeout, call).await {
            Ok(result) => result.map_err(AppError::from),
            Err(_) => {
                warn!(table = %Self::table(), operation, timeout = ?self.timeout, "Store call timed out");
                Err(AppError::store_unavailable(format!(
                    "{} on {} timed out after {:?}",
                    operation,
                    Self::table(),
                    self.timeout
                )))
            }
        }
    }

    async fn find_by_key(&self, record: &E::Model) -> AppResult<Option<E::Model>> {
        self.bounded(
            "select",
            E::find().filter(Self::key_condition(record)).one(&self.db),
        )
        .await
    }
}

#[async_trait]
impl<E> Repository<E> for SeaRepository<E>
where
    E: EntityTrait,
    E::Model: Sync + IntoActiveModel<E::ActiveModel>,
    E::ActiveModel: ActiveModelBehavior + Send + 'static,
{
    async fn get_all(&self) -> AppResult<Vec<E::Model>> {
        let mut query = E::find();
        for key in E::PrimaryKey::iter() {
            query = query.order_by_asc(key.into_column());
        }

        self.bounded("select", query.all(&self.db)).await
    }

    async fn get(&self, filter: Condition) -> AppResult<Option<E::Model>> {
        let mut query = E::find().filter(filter);
        for key in E::PrimaryKey::iter() {
            query = query.order_by_asc(key.into_column());
        }

        self.bounded("select", query.one(&self.db)).await
    }

    async fn get_tracked(&self, filter: Condition) -> AppResult<Option<Tracked<E::Model>>> {
        Ok(self.get(filter).await?.map(Tracked::new))
    }

    async fn create(&self, record: E::Model) -> AppResult<E::Model> {
        let mut active = Self::full_write(record);
        for key in E::PrimaryKey::iter() {
            active.not_set(key.into_column());
        }

        let model = self.bounded("insert", active.insert(&self.db)).await?;
        debug!(table = %Self::table(), key = %Self::key_of(&model), "Record created");
        Ok(model)
    }

    async fn update(&self, record: E::Model) -> AppResult<E::Model> {
        let active = Self::full_write(record);
        self.bounded("update", active.update(&self.db)).await
    }

    async fn update_tracked(&self, record: Tracked<E::Model>) -> AppResult<E::Model> {
        let (original, current) = record.into_parts();
        let (active, changed) = Self::diff_write(original, &current);
        if changed == 0 {
            // Nothing to write, but the row must still exist
            return self.find_by_key(&current).await?.ok_or(AppError::NotFound);
        }

        debug!(table = %Self::table(), key = %Self::key_of(&current), changed, "Updating tracked record");
        self.bounded("update", active.update(&self.db)).await
    }

    async fn delete(&self, record: E::Model) -> AppResult<bool> {
        let key = Self::key_of(&record);
        let active: E::ActiveModel = record.into_active_model();
        let result = self.bounded("delete", active.delete(&self.db)).await?;

        debug!(table = %Self::table(), key = %key, rows = result.rows_affected, "Record deleted");
        Ok(result.rows_affected > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::repository::entities::student;

    fn student(name: &str) -> student::Model {
        student::Model {
            id: 1,
            student_name: name.to_string(),
            email: "murad@example.com".to_string(),
            address: None,
        }
    }

    #[tokio::test]
    async fn test_expired_store_call_is_store_unavailable() {
        let repo = SeaRepository::<student::Entity>::new(
            DatabaseConnection::default(),
            Duration::from_millis(1),
        );

        let result = repo
            .bounded("select", std::future::pending::<Result<(), DbErr>>())
            .await;
        assert!(matches!(result, Err(AppError::StoreUnavailable(_))));
    }

    #[tokio::test]
    async fn test_store_error_passes_through_bound() {
        let repo = SeaRepository::<student::Entity>::new(
            DatabaseConnection::default(),
            Duration::from_secs(1),
        );

        let result = repo
            .bounded("update", async { Err::<(), _>(DbErr::RecordNotUpdated) })
            .await;
        assert!(matches!(result, Err(AppError::NotFound)));
    }

    #[test]
    fn test_diff_write_counts_changed_columns_only() {
        let original = student("Murad");
        let mut edited = original.clone();
        edited.student_name = "Murad A.".to_string();

        let (_, changed) = SeaRepository::<student::Entity>::diff_write(original.clone(), &edited);
        assert_eq!(changed, 1);

        let (_, unchanged) = SeaRepository::<student::Entity>::diff_write(original.clone(), &original);
        assert_eq!(unchanged, 0);
    }

    #[test]
    fn test_tracked_handle_keeps_original() {
        let mut tracked = Tracked::new(student("Murad"));
        tracked.current_mut().address = Some("Baku".to_string());

        assert!(tracked.original().address.is_none());
        assert_eq!(tracked.current().address.as_deref(), Some("Baku"));
        assert_eq!(tracked.detach().address.as_deref(), Some("Baku"));
    }
}
