//! Account-specialized wrapper over the entity store.

use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::models::account::{Account, AccountPatch, NewAccount};
use crate::models::transfer::Transfer;
use crate::store::{self, Criteria, Entity, StoreError, UnitOfWork};

#[derive(Debug, thiserror::Error)]
pub enum LedgerError {
    #[error("account not found")]
    NotFound,
    #[error("insufficient funds")]
    InsufficientFunds,
    #[error(transparent)]
    Store(StoreError),
}

impl From<StoreError> for LedgerError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound => LedgerError::NotFound,
            other => LedgerError::Store(other),
        }
    }
}

pub async fn create_account(
    pool: &PgPool,
    owner_name: String,
    balance: Decimal,
) -> Result<Account, LedgerError> {
    let row = NewAccount {
        owner_name,
        balance,
    };
    let account = store::create(pool, &row).await?;
    Ok(account)
}

pub async fn get_account(pool: &PgPool, id: Uuid) -> Result<Option<Account>, LedgerError> {
    let account = store::get(pool, &Criteria::new().eq(Account::ID, id)).await?;
    Ok(account)
}

pub async fn list_accounts(pool: &PgPool, limit: Option<i64>) -> Result<Vec<Account>, LedgerError> {
    let accounts = store::get_all(pool, limit).await?;
    Ok(accounts)
}

/// Point-in-time read, not locked. Fine for display; never the basis for a
/// write decision (see [`adjust_balance`]).
pub async fn get_balance(pool: &PgPool, id: Uuid) -> Result<Decimal, LedgerError> {
    let account = get_account(pool, id).await?.ok_or(LedgerError::NotFound)?;
    Ok(account.balance)
}

/// Applies `delta` (negative for a debit) to the account's balance inside the
/// caller's unit of work. Reads under the row lock, rejects a result below
/// zero, and persists through `update_locked`, so concurrent adjustments to
/// the same account serialize instead of losing one another's update.
pub async fn adjust_balance(
    uow: &mut UnitOfWork<'_>,
    id: Uuid,
    delta: Decimal,
) -> Result<Account, LedgerError> {
    let account: Account = store::fetch_locked(uow, id)
        .await?
        .ok_or(LedgerError::NotFound)?;

    let new_balance = account.balance + delta;
    if new_balance < Decimal::ZERO {
        return Err(LedgerError::InsufficientFunds);
    }

    let account = store::update_locked(uow, id, &AccountPatch::balance(new_balance)).await?;
    Ok(account)
}

/// Removes an account and, in the same unit of work, every transfer it sent
/// or received. The cascade is an explicit step here rather than a storage
/// foreign-key rule so the deletion stays auditable.
pub async fn delete_account(pool: &PgPool, id: Uuid) -> Result<bool, LedgerError> {
    let mut uow = pool.begin().await.map_err(StoreError::from)?;

    let cascade = format!(
        "DELETE FROM {} WHERE {} = $1 OR {} = $1",
        Transfer::TABLE,
        Transfer::FROM_ACCOUNT,
        Transfer::TO_ACCOUNT,
    );
    sqlx::query(&cascade)
        .bind(id)
        .execute(&mut *uow)
        .await
        .map_err(StoreError::from)?;

    let removed = store::delete::<Account>(&mut *uow, id).await?;
    uow.commit().await.map_err(StoreError::from)?;
    Ok(removed)
}
