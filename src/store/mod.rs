//! Generic typed access to persisted rows.
//!
//! Every entity kind implements [`Entity`]; inserts and updates go through
//! per-entity row types ([`InsertRow`], [`PatchRow`]) whose column sets are
//! compile-time constants, so there is no per-call dynamic field lookup.
//! Operations either borrow any Postgres executor (pool or open transaction)
//! or require an explicit [`UnitOfWork`] when they take row locks.
//!
//! Concurrency contract: [`update_locked`] (and [`fetch_locked`] +
//! [`update_locked`] inside one unit of work) is the only path safe for
//! read-modify-write sequences such as balance arithmetic. [`update_field`]
//! skips the lock and the re-read, so two concurrent callers computing a new
//! value from a stale read will silently lose one update.

pub mod value;

use chrono::Utc;
use sqlx::postgres::{PgExecutor, PgRow};
use sqlx::{FromRow, Postgres};
use uuid::Uuid;

pub use value::{Criteria, SqlValue};

/// A group of store operations that commit or roll back together. Dropping it
/// without committing rolls back.
pub type UnitOfWork<'a> = sqlx::Transaction<'a, Postgres>;

/// A persisted entity kind: table name, selected column set, row mapping.
pub trait Entity: for<'r> FromRow<'r, PgRow> + Send + Unpin {
    const TABLE: &'static str;
    /// All columns, in `SELECT` order. Must match the `FromRow` mapping.
    const COLUMNS: &'static [&'static str];

    fn id(&self) -> Uuid;

    /// Current value of a column, for changed-field detection in
    /// [`update_locked`]. `None` for columns the entity does not carry.
    fn value_of(&self, column: &str) -> Option<SqlValue>;
}

/// Field set for inserting a new row. The store supplies `id`, `created_at`
/// and `updated_at`; the row type supplies everything else.
pub trait InsertRow: Send + Sync {
    type Entity: Entity;

    fn columns(&self) -> &'static [&'static str];
    fn values(&self) -> Vec<SqlValue>;
}

/// Field set for a locked update. Only fields whose value differs from the
/// current row are written.
pub trait PatchRow: Send + Sync {
    type Entity: Entity;

    fn changes(&self) -> Vec<(&'static str, SqlValue)>;
}

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("row not found")]
    NotFound,
    #[error("criteria matched more than one row")]
    Ambiguous,
    #[error("column \"{0}\" does not exist on this entity")]
    UnknownColumn(&'static str),
    #[error("row shape does not match the entity mapping: {0}")]
    SchemaMismatch(sqlx::Error),
    #[error("lock wait timed out")]
    Busy,
    #[error("storage failure: {0}")]
    Storage(sqlx::Error),
}

impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match &err {
            // 55P03 lock_not_available: the bounded lock wait expired.
            sqlx::Error::Database(db) if db.code().as_deref() == Some("55P03") => StoreError::Busy,
            sqlx::Error::ColumnNotFound(_)
            | sqlx::Error::ColumnDecode { .. }
            | sqlx::Error::Decode(_) => StoreError::SchemaMismatch(err),
            _ => StoreError::Storage(err),
        }
    }
}

fn select<E: Entity>() -> String {
    format!("SELECT {} FROM {}", E::COLUMNS.join(", "), E::TABLE)
}

/// The unique row matching `criteria`, or `None`. More than one match is an
/// [`StoreError::Ambiguous`] error; primary-key lookups cannot hit it.
pub async fn get<E: Entity>(
    executor: impl PgExecutor<'_>,
    criteria: &Criteria,
) -> Result<Option<E>, StoreError> {
    let sql = format!("{}{} LIMIT 2", select::<E>(), criteria.where_clause(1));
    let mut query = sqlx::query_as::<_, E>(&sql);
    for value in criteria.values() {
        query = value::bind_value!(query, value);
    }
    let mut rows = query.fetch_all(executor).await?;
    match rows.len() {
        0 => Ok(None),
        1 => Ok(rows.pop()),
        _ => Err(StoreError::Ambiguous),
    }
}

/// Finite snapshot of the rows matching `criteria`. No ordering promise.
pub async fn get_all_by<E: Entity>(
    executor: impl PgExecutor<'_>,
    criteria: &Criteria,
    limit: Option<i64>,
) -> Result<Vec<E>, StoreError> {
    let mut sql = format!("{}{}", select::<E>(), criteria.where_clause(1));
    if limit.is_some() {
        sql.push_str(&format!(" LIMIT ${}", criteria.values().count() + 1));
    }
    let mut query = sqlx::query_as::<_, E>(&sql);
    for value in criteria.values() {
        query = value::bind_value!(query, value);
    }
    if let Some(limit) = limit {
        query = query.bind(limit);
    }
    Ok(query.fetch_all(executor).await?)
}

/// Unfiltered scan.
pub async fn get_all<E: Entity>(
    executor: impl PgExecutor<'_>,
    limit: Option<i64>,
) -> Result<Vec<E>, StoreError> {
    get_all_by(executor, &Criteria::new(), limit).await
}

/// Persists a new row with a fresh v4 id and both timestamps set to now.
pub async fn create<R: InsertRow>(
    executor: impl PgExecutor<'_>,
    row: &R,
) -> Result<R::Entity, StoreError> {
    let columns = row.columns();
    let values = row.values();
    let placeholders: Vec<String> = (2..2 + columns.len()).map(|i| format!("${i}")).collect();
    let sql = format!(
        "INSERT INTO {} (id, {}, created_at, updated_at) VALUES ($1, {}, ${}, ${}) RETURNING {}",
        R::Entity::TABLE,
        columns.join(", "),
        placeholders.join(", "),
        columns.len() + 2,
        columns.len() + 3,
        R::Entity::COLUMNS.join(", "),
    );

    let now = Utc::now();
    let mut query = sqlx::query_as::<_, R::Entity>(&sql).bind(Uuid::new_v4());
    for value in &values {
        query = value::bind_value!(query, value);
    }
    Ok(query.bind(now).bind(now).fetch_one(executor).await?)
}

/// Batched [`create`] inside the caller's unit of work: either every row
/// persists when the caller commits, or none do.
pub async fn create_many<R: InsertRow>(
    uow: &mut UnitOfWork<'_>,
    rows: &[R],
) -> Result<Vec<R::Entity>, StoreError> {
    let mut created = Vec::with_capacity(rows.len());
    for row in rows {
        created.push(create(&mut **uow, row).await?);
    }
    Ok(created)
}

/// Reads a row under an exclusive `FOR UPDATE` lock held until the unit of
/// work ends. The lock wait is bounded by the transaction's `lock_timeout`.
pub async fn fetch_locked<E: Entity>(
    uow: &mut UnitOfWork<'_>,
    id: Uuid,
) -> Result<Option<E>, StoreError> {
    let sql = format!("{} WHERE id = $1 FOR UPDATE", select::<E>());
    Ok(sqlx::query_as::<_, E>(&sql)
        .bind(id)
        .fetch_optional(&mut **uow)
        .await?)
}

/// Locks the row, re-reads it, writes only the patch fields whose value
/// differs from the current row, and always bumps `updated_at`.
pub async fn update_locked<P: PatchRow>(
    uow: &mut UnitOfWork<'_>,
    id: Uuid,
    patch: &P,
) -> Result<P::Entity, StoreError> {
    let current: P::Entity = fetch_locked(uow, id).await?.ok_or(StoreError::NotFound)?;
    let changed = changed_fields(&current, patch);

    let mut assignments: Vec<String> = changed
        .iter()
        .enumerate()
        .map(|(i, (column, _))| format!("{} = ${}", column, i + 1))
        .collect();
    assignments.push(format!("updated_at = ${}", changed.len() + 1));
    let sql = format!(
        "UPDATE {} SET {} WHERE id = ${} RETURNING {}",
        P::Entity::TABLE,
        assignments.join(", "),
        changed.len() + 2,
        P::Entity::COLUMNS.join(", "),
    );

    let mut query = sqlx::query_as::<_, P::Entity>(&sql);
    for (_, value) in &changed {
        query = value::bind_value!(query, value);
    }
    Ok(query
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&mut **uow)
        .await?)
}

pub(crate) fn changed_fields<P: PatchRow>(
    current: &P::Entity,
    patch: &P,
) -> Vec<(&'static str, SqlValue)> {
    patch
        .changes()
        .into_iter()
        .filter(|(column, value)| {
            current
                .value_of(column)
                .map_or(true, |present| present != *value)
        })
        .collect()
}

/// Single-column update with no lock and no re-read. Returns whether a row
/// was affected. Never use this where the new value was computed from a prior
/// read of the row.
pub async fn update_field<E: Entity>(
    executor: impl PgExecutor<'_>,
    id: Uuid,
    column: &'static str,
    value: impl Into<SqlValue>,
) -> Result<bool, StoreError> {
    if !E::COLUMNS.contains(&column) {
        return Err(StoreError::UnknownColumn(column));
    }
    let sql = format!(
        "UPDATE {} SET {} = $1, updated_at = $2 WHERE id = $3",
        E::TABLE,
        column,
    );
    let value = value.into();
    let result = value::bind_value!(sqlx::query(&sql), &value)
        .bind(Utc::now())
        .bind(id)
        .execute(executor)
        .await?;
    Ok(result.rows_affected() > 0)
}

/// Removes the single row with `id`; returns whether one existed. Dependent
/// rows are the domain layer's explicit job (see the ledger's account delete).
pub async fn delete<E: Entity>(
    executor: impl PgExecutor<'_>,
    id: Uuid,
) -> Result<bool, StoreError> {
    let sql = format!("DELETE FROM {} WHERE id = $1", E::TABLE);
    let result = sqlx::query(&sql).bind(id).execute(executor).await?;
    Ok(result.rows_affected() > 0)
}
